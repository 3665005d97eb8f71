//! Scene tool
//!
//! Loads a scene (or builds a small demo level), prints its hierarchy,
//! probes it with rays, steps the simulation and saves the result.
//!
//! Usage: `scene_tool [config.toml|config.ron] [scene_name]`

use scene_core::config::PathConfig;
use scene_core::prelude::*;
use scene_core::scene::kinds::{DoorKeyMask, DEFAULT_MATERIAL};
use scene_core::scene::services::SoundType;

const DEMO_SCENE: &str = "demo";
const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAMES: usize = 120;

#[derive(thiserror::Error, Debug)]
enum ToolError {
    #[error("Configuration error: {0}")]
    Config(#[from] scene_core::config::ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

fn load_config(path: Option<&str>) -> Result<RuntimeConfig, ToolError> {
    match path {
        Some(path) => {
            log::info!("Loading runtime config from {path}");
            Ok(RuntimeConfig::load_validated(path)?)
        }
        None => Ok(RuntimeConfig::default().with_paths(PathConfig::new("assets", "user"))),
    }
}

fn build_demo(scene: &mut Scene, ctx: &mut SceneContext) {
    let hall = scene.entity_create("Hall", None);
    if let Some(hall) = hall {
        scene.set_position(hall, &Vec3::new(0.0, 0.0, -10.0));
    }

    if let Some(lamp) = scene.light_create("Hall_Lamp", hall, LightType::Point) {
        scene.set_position(lamp, &Vec3::new(0.0, 4.0, -10.0));
    }
    if let Some(pillar) = scene.static_mesh_create(ctx, "Pillar", hall, "pillar.symbres", DEFAULT_MATERIAL) {
        scene.set_position(pillar, &Vec3::new(0.0, 1.0, -6.0));
    }
    scene.sound_source_create(ctx, "Hum", hall, "hum.wav", SoundType::Wav, true, true);

    if let Some(turret) = scene.enemy_create(ctx, "Turret", None, EnemyType::Turret) {
        scene.set_position(turret, &Vec3::new(3.0, 0.0, -15.0));
    }
    if let Some(trigger) =
        scene.trigger_create("Hall_Entry", None, TriggerType::Toggle, 1, TriggerMask::PLAYER)
    {
        scene.set_position(trigger, &Vec3::new(0.0, 0.0, -1.0));
    }
    if let Some(door) = scene.door_create("Hall_Door", hall, DoorKeyMask::RED) {
        scene.set_position(door, &Vec3::new(0.0, 0.0, -14.0));
    }
    if let Some(key) = scene.pickup_create("Red_Key", None, PickupType::Key) {
        scene.set_position(key, &Vec3::new(-2.0, 0.5, -4.0));
    }
}

fn print_hierarchy(scene: &Scene, handle: EntityHandle, depth: usize) {
    let Some(entity) = scene.entity(handle) else { return };
    let visible = !entity.flags.contains(EntityFlags::HIDE_IN_HIERARCHY);
    if visible {
        let position = scene.absolute_position(handle);
        println!(
            "{:indent$}{} [{}] ({:.2}, {:.2}, {:.2})",
            "",
            entity.name,
            entity.kind,
            position.x,
            position.y,
            position.z,
            indent = depth * 2
        );
    }

    let next = if visible { depth + 1 } else { depth };
    for child in entity.transform.children.clone() {
        print_hierarchy(scene, child, next);
    }
}

fn probe(scene: &Scene) {
    let player = scene.player_handle();
    let ray = Ray::new(scene.absolute_position(player), scene.absolute_forward(player));
    let mask = RayMask::DEFAULT | RayMask::ENEMY | RayMask::PICKUP;

    let hits = scene.ray_intersect(&ray, mask);
    log::info!("Forward ray hit {} entities", hits.len());
    for hit in hits.hits() {
        if let Some(entity) = scene.entity(*hit) {
            log::debug!("  hit {} ({})", entity.name, entity.kind);
        }
    }

    match scene.ray_intersect_closest(&ray, mask).and_then(|hit| scene.entity(hit)) {
        Some(entity) => log::info!("Closest hit: {}", entity.name),
        None => log::info!("Nothing in front of the player"),
    }
}

fn run() -> Result<(), ToolError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let scene_name = args.get(1).map_or(DEMO_SCENE, String::as_str);

    let mut ctx = SceneContext::headless(config);
    let mut scene = Scene::new(&ctx.config);
    scene.init(&mut ctx);

    ctx.events.subscribe(
        EventType::Trigger,
        Box::new(|event: &Event| {
            log::info!("Trigger event {:?} fired", event.get_int("trigger_event"));
            false
        }),
    );

    match scene.load(&mut ctx, scene_name, DirectoryType::Install) {
        Ok(count) => log::info!("Loaded scene '{scene_name}' ({count} records)"),
        Err(e) => {
            log::warn!("Could not load scene '{scene_name}': {e}; building demo level");
            build_demo(&mut scene, &mut ctx);
            scene.run_init_hook(&mut ctx);
        }
    }
    ctx.events.dispatch();

    println!("Scene hierarchy ({} entities):", scene.entity_count());
    print_hierarchy(&scene, scene.root_handle(), 0);

    probe(&scene);

    let walk = PlayerInput {
        forward: true,
        ..PlayerInput::default()
    };
    for _ in 0..FRAMES {
        scene.update(&mut ctx, FRAME_TIME, &walk);
        scene.post_update(&mut ctx);
        ctx.events.dispatch();
    }
    let position = scene.absolute_position(scene.player_handle());
    log::info!(
        "Player after {FRAMES} frames: ({:.2}, {:.2}, {:.2})",
        position.x,
        position.y,
        position.z
    );

    let saved = scene.save(&mut ctx, scene_name, DirectoryType::User)?;
    ctx.events.dispatch();
    log::info!("Saved '{scene_name}' ({saved} records)");

    scene.destroy(&mut ctx);
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting scene tool");

    if let Err(e) = run() {
        log::error!("Scene tool failed: {e}");
        std::process::exit(1);
    }
}
