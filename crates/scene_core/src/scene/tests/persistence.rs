use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::{setup, setup_with, TempDirs};
use crate::config::DirectoryType;
use crate::events::{Event, EventHandler, EventType};
use crate::foundation::math::{utils, Vec3};
use crate::scene::kinds::{EnemyType, LightType, TriggerMask, TriggerType, DEFAULT_MATERIAL};
use crate::scene::{
    EntityFlags, EntityHandle, EntityType, Scene, SceneContext, SceneError, TransformHierarchy,
};

fn build_level(scene: &mut Scene, ctx: &mut SceneContext) {
    let hall = scene.entity_create("Hall", None).unwrap();
    scene.set_position(hall, &Vec3::new(1.0, 2.0, 3.0));

    let lamp = scene.light_create("Lamp", Some(hall), LightType::Spot).unwrap();
    scene.light_mut(lamp).unwrap().intensity = 4.5;
    scene.set_rotation(lamp, &utils::quat_from_axis_angle(&Vec3::y(), 45.0));

    scene
        .static_mesh_create(ctx, "Pillar", Some(hall), "pillar.symbres", DEFAULT_MATERIAL)
        .unwrap();
    scene
        .trigger_create("Alarm", Some(hall), TriggerType::Toggle, 4, TriggerMask::PLAYER | TriggerMask::ENEMY)
        .unwrap();

    scene.render_settings.fog.density = 0.25;
    scene.player_mut().move_speed = 7.0;
}

#[test]
fn test_scene_round_trip() {
    let dirs = TempDirs::new("scene_round_trip");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    build_level(&mut scene, &mut ctx);
    assert_eq!(scene.save(&mut ctx, "level", DirectoryType::User).unwrap(), 4);

    let (mut loaded, mut ctx) = setup_with(dirs.config());
    assert_eq!(loaded.load(&mut ctx, "level", DirectoryType::User).unwrap(), 4);

    let hall = loaded.find("Hall").unwrap();
    assert_relative_eq!(loaded.absolute_position(hall), Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-4);

    let lamp = loaded.find_of_kind(EntityType::Light, "Lamp").unwrap();
    assert_eq!(loaded.entity(lamp).unwrap().transform.parent, Some(hall));
    let light = loaded.light(lamp).unwrap();
    assert_eq!(light.light_type, LightType::Spot);
    assert_relative_eq!(light.intensity, 4.5);
    assert_relative_eq!(
        loaded.absolute_forward(lamp),
        utils::forward(&utils::quat_from_axis_angle(&Vec3::y(), 45.0)),
        epsilon = 1e-4
    );

    let pillar = loaded.find_of_kind(EntityType::StaticMesh, "Pillar").unwrap();
    let mesh = loaded.static_mesh(pillar).unwrap();
    assert_eq!(mesh.geometry_name, "pillar.symbres");
    assert!(mesh.geometry.is_some());

    let alarm = loaded.trigger(loaded.find("Alarm").unwrap()).unwrap();
    assert_eq!(alarm.trigger_type, TriggerType::Toggle);
    assert_eq!(alarm.trigger_event, 4);
    assert_eq!(alarm.trigger_mask, TriggerMask::PLAYER | TriggerMask::ENEMY);

    assert_relative_eq!(loaded.render_settings.fog.density, 0.25);
    assert_relative_eq!(loaded.player().move_speed, 7.0);
    assert!(loaded.find("Player_Camera").is_some());
}

#[test]
fn test_saving_twice_is_byte_identical() {
    let dirs = TempDirs::new("scene_idempotent");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    build_level(&mut scene, &mut ctx);
    let path = ctx.config.paths.scene_path("level", DirectoryType::User);

    scene.save(&mut ctx, "level", DirectoryType::User).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();
    scene.save(&mut ctx, "level", DirectoryType::User).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with("Scene_Config\n{\n"));
    assert!(!first.contains("Player_Mesh"));
    assert!(!first.contains("Editor_Camera"));
}

#[test]
fn test_archetype_is_saved_as_entry_and_reloaded() {
    let dirs = TempDirs::new("archetype");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    let barrel = scene.entity_create("Barrel", None).unwrap();
    scene.entity_create("Barrel_Lid", Some(barrel)).unwrap();
    assert_eq!(scene.entity_save(&ctx, barrel, "barrel", DirectoryType::User).unwrap(), 2);
    scene.remove(&mut ctx, barrel);
    scene.post_update(&mut ctx);

    let instance = scene.entity_load(&mut ctx, "barrel", DirectoryType::Install, None).unwrap();
    scene.set_position(instance, &Vec3::new(0.0, 0.0, -8.0));
    assert_eq!(scene.entity(instance).unwrap().archetype_index, Some(0));
    let lids = scene.children_of_kind(instance, EntityType::Default);
    assert_eq!(lids.len(), 1);
    assert!(scene.entity(lids[0]).unwrap().flags.contains(EntityFlags::TRANSIENT));

    scene.save(&mut ctx, "yard", DirectoryType::User).unwrap();
    let text = std::fs::read_to_string(ctx.config.paths.scene_path("yard", DirectoryType::User)).unwrap();
    assert!(text.contains("Scene_Entity_Entry"));
    assert!(!text.contains("Barrel_Lid"));

    let (mut loaded, mut ctx) = setup_with(dirs.config());
    assert_eq!(loaded.load(&mut ctx, "yard", DirectoryType::User).unwrap(), 1);
    let barrel = loaded.find("Barrel").unwrap();
    assert_relative_eq!(loaded.absolute_position(barrel), Vec3::new(0.0, 0.0, -8.0), epsilon = 1e-4);
    assert_eq!(loaded.children_of_kind(barrel, EntityType::Default).len(), 1);
    assert_eq!(loaded.archetypes(), &["barrel".to_string()]);
}

#[test]
fn test_failed_load_keeps_current_scene() {
    let dirs = TempDirs::new("missing_scene");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    scene.entity_create("Keep", None).unwrap();

    let result = scene.load(&mut ctx, "does_not_exist", DirectoryType::User);
    assert!(matches!(result, Err(SceneError::Parse(_))));
    assert!(scene.find("Keep").is_some());
}

#[test]
fn test_scene_without_usable_records_reports_nothing_loaded() {
    let dirs = TempDirs::new("model_only");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    let path = ctx.config.paths.scene_path("models", DirectoryType::User);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "Model\n{\n\tname : thing\n}\n").unwrap();

    let result = scene.load(&mut ctx, "models", DirectoryType::User);
    assert!(matches!(result, Err(SceneError::NothingLoaded(_))));
}

fn spawn_marker(scene: &mut Scene, _ctx: &mut SceneContext) {
    scene.entity_create("Hook_Marker", None);
}

#[test]
fn test_load_runs_named_init_hook() {
    let dirs = TempDirs::new("hooks");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    ctx.register_hook("level_init", spawn_marker);
    scene.init_hook = "level_init".to_string();
    scene.save(&mut ctx, "hooked", DirectoryType::User).unwrap();

    let (mut loaded, mut ctx) = setup_with(dirs.config());
    ctx.register_hook("level_init", spawn_marker);
    loaded.load(&mut ctx, "hooked", DirectoryType::User).unwrap();
    assert_eq!(loaded.init_hook, "level_init");
    assert!(loaded.find("Hook_Marker").is_some());

    let (mut unhooked, mut ctx) = setup_with(dirs.config());
    unhooked.load(&mut ctx, "hooked", DirectoryType::User).unwrap();
    assert_eq!(unhooked.init_hook, crate::scene::DEFAULT_INIT_HOOK);
    assert!(unhooked.find("Hook_Marker").is_none());
}

#[test]
fn test_duplicate_copies_payload_and_non_transient_subtree() {
    let (mut scene, mut ctx) = setup();
    let post = scene.entity_create("Lamp_Post", None).unwrap();
    scene.set_position(post, &Vec3::new(4.0, 0.0, 0.0));
    let bulb = scene.light_create("Bulb", Some(post), LightType::Point).unwrap();
    scene.light_mut(bulb).unwrap().intensity = 3.0;
    let marker = scene.entity_create("Marker", Some(post)).unwrap();
    scene.entity_flags_insert(marker, EntityFlags::TRANSIENT);

    let copy = scene.entity_duplicate(&mut ctx, post, None).unwrap();
    assert_ne!(copy, post);
    assert_eq!(scene.entity(copy).unwrap().transform.parent, Some(scene.root_handle()));
    assert_relative_eq!(scene.absolute_position(copy), Vec3::new(4.0, 0.0, 0.0), epsilon = 1e-5);

    let bulbs = scene.children_of_kind(copy, EntityType::Light);
    assert_eq!(bulbs.len(), 1);
    assert_ne!(bulbs[0], bulb);
    assert_relative_eq!(scene.light(bulbs[0]).unwrap().intensity, 3.0);
    assert!(scene.children_of_kind(copy, EntityType::Default).is_empty());
}

#[test]
fn test_duplicate_enemy_gets_its_own_children() {
    let (mut scene, mut ctx) = setup();
    let turret = scene.enemy_create(&mut ctx, "Turret", None, EnemyType::Turret).unwrap();
    scene.enemy_mut(turret).unwrap().health = 42;

    let copy = scene.entity_duplicate(&mut ctx, turret, None).unwrap();
    let enemy = scene.enemy(copy).unwrap();
    assert_eq!(enemy.health, 42);
    assert!(enemy.mesh.is_some());
    assert_ne!(enemy.mesh, scene.enemy(turret).unwrap().mesh);
    assert_eq!(scene.children_of_kind(copy, EntityType::StaticMesh).len(), 1);
}

fn save_archetype(scene: &mut Scene, ctx: &mut SceneContext, name: &str) {
    let top = scene.entity_create(name, None).unwrap();
    scene.entity_create(&format!("{name}_Lid"), Some(top)).unwrap();
    scene.entity_save(ctx, top, &name.to_lowercase(), DirectoryType::User).unwrap();
    scene.remove(ctx, top);
    scene.post_update(ctx);
}

#[test]
fn test_entries_sharing_an_archetype_use_one_slot() {
    let dirs = TempDirs::new("shared_archetype");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    save_archetype(&mut scene, &mut ctx, "Barrel");

    let first = scene.entity_load(&mut ctx, "barrel", DirectoryType::User, None).unwrap();
    let second = scene.entity_load(&mut ctx, "barrel", DirectoryType::User, None).unwrap();
    scene.set_position(second, &Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(scene.entity(first).unwrap().archetype_index, Some(0));
    assert_eq!(scene.entity(second).unwrap().archetype_index, Some(0));

    scene.save(&mut ctx, "yard", DirectoryType::User).unwrap();
    let text = std::fs::read_to_string(ctx.config.paths.scene_path("yard", DirectoryType::User)).unwrap();
    assert_eq!(text.matches("Scene_Entity_Entry").count(), 2);

    let (mut loaded, mut ctx) = setup_with(dirs.config());
    assert_eq!(loaded.load(&mut ctx, "yard", DirectoryType::User).unwrap(), 2);
    assert_eq!(loaded.archetypes(), &["barrel".to_string()]);
    let instances: Vec<EntityHandle> = loaded
        .handles_of_kind(EntityType::Default)
        .into_iter()
        .filter(|handle| loaded.entity(*handle).unwrap().archetype_index == Some(0))
        .collect();
    assert_eq!(instances.len(), 2);
}

#[test]
fn test_full_archetype_table_saves_subtree_inline() {
    let dirs = TempDirs::new("archetype_table_full");
    let mut config = dirs.config();
    config.capacities.archetypes = 1;
    let (mut scene, mut ctx) = setup_with(config.clone());
    save_archetype(&mut scene, &mut ctx, "Barrel");
    save_archetype(&mut scene, &mut ctx, "Crate");

    let barrel = scene.entity_load(&mut ctx, "barrel", DirectoryType::User, None).unwrap();
    let crate_top = scene.entity_load(&mut ctx, "crate", DirectoryType::User, None).unwrap();
    assert_eq!(scene.entity(barrel).unwrap().archetype_index, Some(0));
    assert_eq!(scene.entity(crate_top).unwrap().archetype_index, None);
    let lids = scene.children_of_kind(crate_top, EntityType::Default);
    assert_eq!(lids.len(), 1);
    assert!(!scene.entity(lids[0]).unwrap().flags.contains(EntityFlags::TRANSIENT));

    scene.save(&mut ctx, "yard", DirectoryType::User).unwrap();
    let text = std::fs::read_to_string(ctx.config.paths.scene_path("yard", DirectoryType::User)).unwrap();
    assert!(text.contains("Crate_Lid"));
    assert!(!text.contains("Barrel_Lid"));

    let (mut loaded, mut ctx) = setup_with(config);
    loaded.load(&mut ctx, "yard", DirectoryType::User).unwrap();
    let crate_top = loaded.find("Crate").unwrap();
    assert_eq!(loaded.children_of_kind(crate_top, EntityType::Default).len(), 1);
    let barrel = loaded.find("Barrel").unwrap();
    assert_eq!(loaded.children_of_kind(barrel, EntityType::Default).len(), 1);
}

#[test]
fn test_loaded_entity_receives_its_loaded_event() {
    let dirs = TempDirs::new("entity_loaded_event");
    let (mut scene, mut ctx) = setup_with(dirs.config());
    scene.light_create("Lamp", None, LightType::Point).unwrap();
    scene.save(&mut ctx, "lit", DirectoryType::User).unwrap();

    let received: Rc<RefCell<Vec<(EntityHandle, Option<EntityHandle>)>>> = Rc::new(RefCell::new(Vec::new()));
    let (mut loaded, mut ctx) = setup_with(dirs.config());
    let sink = Rc::clone(&received);
    ctx.register_entity_handler(
        EntityType::Light,
        EventType::EntityLoaded,
        Box::new(move |handle: EntityHandle| -> Box<dyn EventHandler> {
            let sink = Rc::clone(&sink);
            Box::new(move |event: &Event| {
                sink.borrow_mut().push((handle, event.sender));
                true
            })
        }),
    );
    let baseline = ctx.events.subscription_count();

    loaded.load(&mut ctx, "lit", DirectoryType::User).unwrap();
    let lamp = loaded.find_of_kind(EntityType::Light, "Lamp").unwrap();
    assert_eq!(received.borrow().as_slice(), &[(lamp, Some(lamp))]);
    assert_eq!(ctx.events.subscription_count(), baseline + 1);

    loaded.remove(&mut ctx, lamp);
    assert_eq!(ctx.events.subscription_count(), baseline);
}
