//! Scene: per-kind arenas, root, player and archetype table
//!
//! Dispatch across kinds is a closed `match` on [`EntityType`] through the
//! `arena_ref!`/`arena_mut!` macros, which bind the matching arena and run
//! the same body for every kind.

use log::{debug, error, info, warn};

use super::arena::Arena;
use super::context::{GameMode, SceneContext, DEFAULT_CLEANUP_HOOK, DEFAULT_INIT_HOOK};
use super::entity::{Entity, EntityFlags, EntityHandle, EntityType};
use super::kinds::{
    Camera, Door, DoorKeyMask, Duplicable, Enemy, EnemyType, Light, LightType, Pickup, PickupType,
    Player, Resettable, SceneObject, SoundSource, StaticMesh, Trigger, TriggerMask, TriggerType,
    DEFAULT_MATERIAL, NO_TRIGGER_EVENT, PLAYER_ID,
};
use super::services::SoundType;
use super::transform::{TransformHierarchy, TransformSpace};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventType};
use crate::foundation::math::{Vec3, Vec4};

/// Bind the arena holding `$kind` as `$arena` and evaluate `$body`
macro_rules! arena_ref {
    ($scene:expr, $kind:expr, $arena:ident => $body:expr, _ => $fallback:expr) => {
        match $kind {
            EntityType::Default => { let $arena = &$scene.entities; $body }
            EntityType::Light => { let $arena = &$scene.lights; $body }
            EntityType::Camera => { let $arena = &$scene.cameras; $body }
            EntityType::StaticMesh => { let $arena = &$scene.static_meshes; $body }
            EntityType::SoundSource => { let $arena = &$scene.sound_sources; $body }
            EntityType::Enemy => { let $arena = &$scene.enemies; $body }
            EntityType::Trigger => { let $arena = &$scene.triggers; $body }
            EntityType::Door => { let $arena = &$scene.doors; $body }
            EntityType::Pickup => { let $arena = &$scene.pickups; $body }
            EntityType::None | EntityType::Player | EntityType::Root => $fallback,
        }
    };
}

/// Mutable counterpart of `arena_ref!`
macro_rules! arena_mut {
    ($scene:expr, $kind:expr, $arena:ident => $body:expr, _ => $fallback:expr) => {
        match $kind {
            EntityType::Default => { let $arena = &mut $scene.entities; $body }
            EntityType::Light => { let $arena = &mut $scene.lights; $body }
            EntityType::Camera => { let $arena = &mut $scene.cameras; $body }
            EntityType::StaticMesh => { let $arena = &mut $scene.static_meshes; $body }
            EntityType::SoundSource => { let $arena = &mut $scene.sound_sources; $body }
            EntityType::Enemy => { let $arena = &mut $scene.enemies; $body }
            EntityType::Trigger => { let $arena = &mut $scene.triggers; $body }
            EntityType::Door => { let $arena = &mut $scene.doors; $body }
            EntityType::Pickup => { let $arena = &mut $scene.pickups; $body }
            EntityType::None | EntityType::Player | EntityType::Root => $fallback,
        }
    };
}

pub(crate) use arena_mut;
pub(crate) use arena_ref;

/// Name of the scene root
pub const ROOT_ENTITY_NAME: &str = "ROOT_ENTITY";

/// Id of the scene root
pub const ROOT_ID: usize = 0;

/// Name of the player
pub const PLAYER_NAME: &str = "Player";

/// Name of the editor camera
pub const EDITOR_CAMERA_NAME: &str = "Editor_Camera";

const PLAYER_MESH_GEOMETRY: &str = "sphere.symbres";
const PLAYER_WEAPON_SOUND: &str = "sounds/bullet_1.wav";

/// Fog falloff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    /// No fog
    None,
    /// Linear between start and max distance
    Linear,
    /// Exponential in distance
    #[default]
    Exponential,
    /// Exponential in squared distance
    ExponentialSquared,
}

impl FogMode {
    /// Mode for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Linear),
            2 => Some(Self::Exponential),
            3 => Some(Self::ExponentialSquared),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Exponential => 2,
            Self::ExponentialSquared => 3,
        }
    }
}

/// Fog parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSettings {
    /// Falloff
    pub mode: FogMode,
    /// Density for the exponential modes
    pub density: f32,
    /// Distance where linear fog starts
    pub start_distance: f32,
    /// Distance of full fog
    pub max_distance: f32,
    /// RGB color
    pub color: Vec3,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            mode: FogMode::Exponential,
            density: 0.1,
            start_distance: 10.0,
            max_distance: 450.0,
            color: Vec3::new(0.9, 0.7, 0.6),
        }
    }
}

/// Scene-wide render parameters kept in the scene config object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Fog
    pub fog: FogSettings,
    /// Ambient light color
    pub ambient_light: Vec3,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fog: FogSettings::default(),
            ambient_light: Vec3::repeat(0.1),
        }
    }
}

/// Every live entity of a running level
#[derive(Debug)]
pub struct Scene {
    pub(crate) root: Entity,
    pub(crate) player: Player,
    pub(crate) entities: Arena<Entity>,
    pub(crate) lights: Arena<Light>,
    pub(crate) cameras: Arena<Camera>,
    pub(crate) static_meshes: Arena<StaticMesh>,
    pub(crate) sound_sources: Arena<SoundSource>,
    pub(crate) enemies: Arena<Enemy>,
    pub(crate) triggers: Arena<Trigger>,
    pub(crate) doors: Arena<Door>,
    pub(crate) pickups: Arena<Pickup>,
    pub(crate) archetypes: Vec<String>,
    pub(crate) archetype_capacity: usize,
    pub(crate) active_camera: Option<EntityHandle>,
    pub(crate) raycast_capacity: usize,
    /// Fog and ambient light
    pub render_settings: RenderSettings,
    /// Hook run after the scene finishes loading
    pub init_hook: String,
    /// Hook run before the scene is destroyed
    pub cleanup_hook: String,
}

macro_rules! typed_access {
    ($($get:ident, $get_mut:ident, $all:ident => $ty:ty;)*) => {
        impl Scene {
            $(
                #[doc = concat!("Live `", stringify!($ty), "` for `handle`")]
                pub fn $get(&self, handle: EntityHandle) -> Option<&$ty> {
                    self.$all.get(handle)
                }

                #[doc = concat!("Live `", stringify!($ty), "` for `handle`, mutably")]
                pub fn $get_mut(&mut self, handle: EntityHandle) -> Option<&mut $ty> {
                    self.$all.get_mut(handle)
                }

                #[doc = concat!("Arena of every `", stringify!($ty), "`")]
                pub const fn $all(&self) -> &Arena<$ty> {
                    &self.$all
                }
            )*
        }
    };
}

typed_access! {
    light, light_mut, lights => Light;
    camera, camera_mut, cameras => Camera;
    static_mesh, static_mesh_mut, static_meshes => StaticMesh;
    sound_source, sound_source_mut, sound_sources => SoundSource;
    enemy, enemy_mut, enemies => Enemy;
    trigger, trigger_mut, triggers => Trigger;
    door, door_mut, doors => Door;
    pickup, pickup_mut, pickups => Pickup;
}

impl Scene {
    /// Allocate every arena at its configured capacity
    ///
    /// The scene is empty until [`init`](Self::init).
    pub fn new(config: &RuntimeConfig) -> Self {
        let capacities = &config.capacities;
        Self {
            root: Entity::new(EntityType::Root, ROOT_ID),
            player: Player::new_slot(PLAYER_ID),
            entities: Arena::new(capacities.entities, "entities"),
            lights: Arena::new(capacities.lights, "lights"),
            cameras: Arena::new(capacities.cameras, "cameras"),
            static_meshes: Arena::new(capacities.static_meshes, "static meshes"),
            sound_sources: Arena::new(capacities.sound_sources, "sound sources"),
            enemies: Arena::new(capacities.enemies, "enemies"),
            triggers: Arena::new(capacities.triggers, "triggers"),
            doors: Arena::new(capacities.doors, "doors"),
            pickups: Arena::new(capacities.pickups, "pickups"),
            archetypes: Vec::with_capacity(capacities.archetypes),
            archetype_capacity: capacities.archetypes,
            active_camera: None,
            raycast_capacity: capacities.raycast_results,
            render_settings: RenderSettings::default(),
            init_hook: DEFAULT_INIT_HOOK.to_string(),
            cleanup_hook: DEFAULT_CLEANUP_HOOK.to_string(),
        }
    }

    /// Activate the root, create the editor camera and the player
    pub fn init(&mut self, ctx: &mut SceneContext) {
        self.root.reset();
        self.root.flags = EntityFlags::ACTIVE;
        self.root.rename(ROOT_ENTITY_NAME);
        let root = self.root_handle();
        self.update_world_matrix(root);

        self.render_settings = RenderSettings::default();
        self.init_hook = DEFAULT_INIT_HOOK.to_string();
        self.cleanup_hook = DEFAULT_CLEANUP_HOOK.to_string();

        let editor_camera = self.camera_create(ctx, EDITOR_CAMERA_NAME, None);
        if let Some(camera) = editor_camera {
            self.entity_flags_insert(camera, EntityFlags::TRANSIENT | EntityFlags::HIDE_IN_HIERARCHY);
            self.translate(camera, &Vec3::new(0.0, 15.0, 30.0), TransformSpace::World);
            self.rotate(camera, &Vec3::new(-1.0, 0.0, 0.0), 20.0, TransformSpace::Local);
            self.camera_refresh(camera);
        }

        self.player_init(ctx);

        self.active_camera = match ctx.game_mode {
            GameMode::Game => self.player.camera,
            GameMode::Editor => editor_camera,
        };
        info!("Scene initialized");
    }

    fn player_init(&mut self, ctx: &mut SceneContext) {
        self.player.apply_config(&ctx.config.player);
        self.player.base.reset();
        self.player.base.flags = EntityFlags::ACTIVE;
        self.player.base.rename(PLAYER_NAME);

        let player = self.player_handle();
        let root = self.root_handle();
        self.child_add(root, player, true);

        let mesh = self.static_mesh_create(ctx, "Player_Mesh", Some(player), PLAYER_MESH_GEOMETRY, DEFAULT_MATERIAL);

        let camera = self.camera_create(ctx, "Player_Camera", Some(player));
        if let Some(camera) = camera {
            if let Some(game_camera) = self.cameras.get_mut(camera) {
                game_camera.clear_color = Vec4::new(0.6, 0.6, 0.9, 1.0);
            }
            self.translate(camera, &Vec3::new(0.0, 20.0, 2.0), TransformSpace::Local);
            self.rotate(camera, &Vec3::new(-1.0, 0.0, 0.0), 85.0, TransformSpace::Local);
            self.camera_refresh(camera);
        }

        let weapon_sound = self.sound_source_create(
            ctx,
            "Player_Weapon_Sound",
            Some(player),
            PLAYER_WEAPON_SOUND,
            SoundType::Wav,
            false,
            false,
        );

        for child in [mesh, camera, weapon_sound].into_iter().flatten() {
            self.entity_flags_insert(child, EntityFlags::TRANSIENT);
        }
        self.player.mesh = mesh;
        self.player.camera = camera;
        self.player.weapon_sound = weapon_sound;
    }

    /// Release every entity and collaborator resource
    ///
    /// Runs the cleanup hook first. The scene must be re-initialised before
    /// further use.
    pub fn destroy(&mut self, ctx: &mut SceneContext) {
        match ctx.hook(&self.cleanup_hook) {
            Some(hook) => hook(self, ctx),
            None => warn!("Cleanup hook '{}' is not registered", self.cleanup_hook),
        }

        for kind in EntityType::ARENA_ORDER {
            for handle in self.handles_of_kind(kind) {
                arena_mut!(self, kind, arena => {
                    if let Some(object) = arena.get_mut(handle) {
                        Resettable::reset(object, &mut ctx.services);
                    }
                }, _ => ());
                ctx.events.unsubscribe_all(handle);
            }
            arena_mut!(self, kind, arena => arena.clear(), _ => ());
        }

        self.player.reset(&mut ctx.services);
        self.player.base.reset();
        self.root.reset();
        self.archetypes.clear();
        self.active_camera = None;
        ctx.events.send(Event::new(EventType::SceneCleared));
        info!("Scene destroyed");
    }

    /// Run the hook named by [`init_hook`](Self::init_hook)
    pub fn run_init_hook(&mut self, ctx: &mut SceneContext) {
        match ctx.hook(&self.init_hook) {
            Some(hook) => hook(self, ctx),
            None => warn!("Init hook '{}' is not registered", self.init_hook),
        }
    }

    /// Handle of the scene root
    pub const fn root_handle(&self) -> EntityHandle {
        self.root.handle()
    }

    /// Handle of the player
    pub const fn player_handle(&self) -> EntityHandle {
        self.player.base.handle()
    }

    /// The player
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// The player, mutably
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Camera views are rendered from
    pub const fn active_camera(&self) -> Option<EntityHandle> {
        self.active_camera
    }

    /// Select the camera views are rendered from
    pub fn set_active_camera(&mut self, camera: EntityHandle) -> bool {
        if self.cameras.get(camera).is_none() {
            warn!("Cannot activate missing camera {camera:?}");
            return false;
        }
        self.active_camera = Some(camera);
        true
    }

    /// Hits a ray query can hold
    pub const fn raycast_capacity(&self) -> usize {
        self.raycast_capacity
    }

    /// Set flags on a live entity
    pub fn entity_flags_insert(&mut self, handle: EntityHandle, flags: EntityFlags) {
        if let Some(entity) = self.entity_mut(handle) {
            entity.flags.insert(flags);
        }
    }

    /// Clear flags on a live entity, never `ACTIVE`
    pub fn entity_flags_remove(&mut self, handle: EntityHandle, flags: EntityFlags) {
        if let Some(entity) = self.entity_mut(handle) {
            entity.flags.remove(flags.difference(EntityFlags::ACTIVE));
        }
    }

    /// Rename a live entity
    pub fn entity_rename(&mut self, handle: EntityHandle, name: &str) {
        if let Some(entity) = self.entity_mut(handle) {
            entity.rename(name);
        }
    }

    fn activate(&mut self, handle: EntityHandle, name: &str, parent: Option<EntityHandle>) {
        if let Some(entity) = self.entity_mut(handle) {
            entity.rename(name);
        }
        let root = self.root_handle();
        let parent = match parent {
            Some(parent) if self.entity(parent).is_some() => parent,
            Some(parent) => {
                warn!("Parent {parent:?} of '{name}' not found, attaching to root");
                root
            }
            None => root,
        };
        if !self.child_add(parent, handle, true) {
            self.update_world_matrix(handle);
        }
        debug!("Created {} '{name}' ({handle:?})", handle.kind);
    }

    /// Create a plain entity under `parent`, or the root
    pub fn entity_create(&mut self, name: &str, parent: Option<EntityHandle>) -> Option<EntityHandle> {
        let handle = self.entities.allocate()?;
        self.activate(handle, name, parent);
        Some(handle)
    }

    /// Create a light with creation defaults for `light_type`
    pub fn light_create(
        &mut self,
        name: &str,
        parent: Option<EntityHandle>,
        light_type: LightType,
    ) -> Option<EntityHandle> {
        let handle = self.lights.allocate()?;
        if let Some(light) = self.lights.get_mut(handle) {
            light.init(light_type);
        }
        self.activate(handle, name, parent);
        Some(handle)
    }

    /// Create a camera sized for the configured viewport
    pub fn camera_create(
        &mut self,
        ctx: &SceneContext,
        name: &str,
        parent: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        let handle = self.cameras.allocate()?;
        self.activate(handle, name, parent);
        let viewport = &ctx.config.viewport;
        if let Some(camera) = self.cameras.get_mut(handle) {
            camera.init(viewport.width, viewport.height);
        }
        Some(handle)
    }

    /// Recompute a camera's view after its transform moved
    pub fn camera_refresh(&mut self, camera: EntityHandle) {
        if let Some(camera) = self.cameras.get_mut(camera) {
            camera.update_view();
        }
    }

    /// Create a static mesh and load its geometry
    pub fn static_mesh_create(
        &mut self,
        ctx: &mut SceneContext,
        name: &str,
        parent: Option<EntityHandle>,
        geometry: &str,
        material: &str,
    ) -> Option<EntityHandle> {
        let handle = self.static_meshes.allocate()?;
        self.activate(handle, name, parent);
        if let Some(mesh) = self.static_meshes.get_mut(handle) {
            material.clone_into(&mut mesh.material);
            mesh.attach_geometry(geometry, &mut ctx.services);
        }
        Some(handle)
    }

    /// Create a sound source and its backend instance
    pub fn sound_source_create(
        &mut self,
        ctx: &mut SceneContext,
        name: &str,
        parent: Option<EntityHandle>,
        filename: &str,
        sound_type: SoundType,
        looping: bool,
        playing: bool,
    ) -> Option<EntityHandle> {
        let handle = self.sound_sources.allocate()?;
        self.activate(handle, name, parent);
        let position = self.absolute_position(handle);
        if let Some(source) = self.sound_sources.get_mut(handle) {
            filename.clone_into(&mut source.source_filename);
            source.sound_type = sound_type;
            source.looping = looping;
            source.playing = playing;
            source.attach_instance(&mut ctx.services, &position);
        }
        Some(handle)
    }

    /// Create an enemy together with its transient mesh and weapon sound
    pub fn enemy_create(
        &mut self,
        ctx: &mut SceneContext,
        name: &str,
        parent: Option<EntityHandle>,
        enemy_type: EnemyType,
    ) -> Option<EntityHandle> {
        let handle = self.enemies.allocate()?;
        self.activate(handle, name, parent);
        let (mesh_name, sound_name) = match self.enemies.get_mut(handle) {
            Some(enemy) => {
                enemy.init(enemy_type);
                (enemy.mesh_name(), enemy.weapon_sound_name())
            }
            None => return None,
        };

        let weapon_sound = self.sound_source_create(
            ctx,
            &sound_name,
            Some(handle),
            enemy_type.weapon_sound(),
            SoundType::Wav,
            false,
            false,
        );
        if weapon_sound.is_none() {
            error!("Failed to add weapon sound for '{name}'");
        }
        let mesh = self.static_mesh_create(ctx, &mesh_name, Some(handle), enemy_type.mesh_geometry(), DEFAULT_MATERIAL);
        if mesh.is_none() {
            error!("Failed to add mesh for '{name}'");
        }

        for child in [weapon_sound, mesh].into_iter().flatten() {
            self.entity_flags_insert(child, EntityFlags::TRANSIENT);
        }
        if let Some(enemy) = self.enemies.get_mut(handle) {
            enemy.mesh = mesh;
            enemy.weapon_sound = weapon_sound;
        }
        Some(handle)
    }

    /// Create a trigger volume
    pub fn trigger_create(
        &mut self,
        name: &str,
        parent: Option<EntityHandle>,
        trigger_type: TriggerType,
        trigger_event: i32,
        trigger_mask: TriggerMask,
    ) -> Option<EntityHandle> {
        let handle = self.triggers.allocate()?;
        if let Some(trigger) = self.triggers.get_mut(handle) {
            trigger.init(trigger_type, trigger_event, trigger_mask);
        }
        self.activate(handle, name, parent);
        Some(handle)
    }

    /// Create a door requiring `door_mask`
    pub fn door_create(
        &mut self,
        name: &str,
        parent: Option<EntityHandle>,
        door_mask: DoorKeyMask,
    ) -> Option<EntityHandle> {
        let handle = self.doors.allocate()?;
        if let Some(door) = self.doors.get_mut(handle) {
            door.init(door_mask);
        }
        self.activate(handle, name, parent);
        Some(handle)
    }

    /// Create a pickup granting `pickup_type`
    pub fn pickup_create(
        &mut self,
        name: &str,
        parent: Option<EntityHandle>,
        pickup_type: PickupType,
    ) -> Option<EntityHandle> {
        let handle = self.pickups.allocate()?;
        if let Some(pickup) = self.pickups.get_mut(handle) {
            pickup.init(pickup_type);
        }
        self.activate(handle, name, parent);
        Some(handle)
    }

    /// Create an entity of `kind` with creation defaults
    ///
    /// The new entity is subscribed with every handler registered for its
    /// kind through [`SceneContext::register_entity_handler`].
    ///
    /// Static meshes and sound sources are created without collaborator
    /// resources; [`attach_resources`](Self::attach_resources) loads them once
    /// the payload is filled in.
    pub fn create_of_kind(
        &mut self,
        ctx: &mut SceneContext,
        kind: EntityType,
        name: &str,
        parent: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        let handle = match kind {
            EntityType::Default => self.entity_create(name, parent),
            EntityType::Light => self.light_create(name, parent, LightType::Point),
            EntityType::Camera => self.camera_create(ctx, name, parent),
            EntityType::StaticMesh => {
                let handle = self.static_meshes.allocate()?;
                self.activate(handle, name, parent);
                Some(handle)
            }
            EntityType::SoundSource => {
                let handle = self.sound_sources.allocate()?;
                self.activate(handle, name, parent);
                Some(handle)
            }
            EntityType::Enemy => self.enemy_create(ctx, name, parent, EnemyType::Turret),
            EntityType::Trigger => {
                self.trigger_create(name, parent, TriggerType::OneShot, NO_TRIGGER_EVENT, TriggerMask::PLAYER)
            }
            EntityType::Door => self.door_create(name, parent, DoorKeyMask::empty()),
            EntityType::Pickup => self.pickup_create(name, parent, PickupType::Health),
            EntityType::None | EntityType::Player | EntityType::Root => {
                warn!("Cannot create an entity of kind {kind}");
                None
            }
        }?;
        ctx.entity_subscribe(handle);
        Some(handle)
    }

    /// (Re)create collaborator resources from the payload
    ///
    /// Loads mesh geometry, creates sound instances and refreshes camera
    /// matrices.
    pub fn attach_resources(&mut self, ctx: &mut SceneContext, handle: EntityHandle) {
        match handle.kind {
            EntityType::StaticMesh => {
                if let Some(mesh) = self.static_meshes.get_mut(handle) {
                    let geometry = mesh.geometry_name.clone();
                    if !geometry.is_empty() {
                        mesh.attach_geometry(&geometry, &mut ctx.services);
                    }
                }
            }
            EntityType::SoundSource => {
                let position = self.absolute_position(handle);
                if let Some(source) = self.sound_sources.get_mut(handle) {
                    source.attach_instance(&mut ctx.services, &position);
                }
            }
            EntityType::Camera => {
                if let Some(camera) = self.cameras.get_mut(handle) {
                    camera.update_proj();
                    camera.update_view();
                }
            }
            _ => {}
        }
    }

    /// Remove a live entity
    ///
    /// Releases collaborator resources, detaches it from its parent and marks
    /// its children for deletion. Removing a stale handle does nothing and
    /// returns false. The root and the player cannot be removed.
    pub fn remove(&mut self, ctx: &mut SceneContext, handle: EntityHandle) -> bool {
        if matches!(handle.kind, EntityType::None | EntityType::Player | EntityType::Root) {
            warn!("Cannot remove the {} entity", handle.kind);
            return false;
        }
        let Some(name) = self.entity(handle).map(|entity| entity.name.clone()) else {
            return false;
        };

        arena_mut!(self, handle.kind, arena => {
            if let Some(object) = arena.get_mut(handle) {
                Resettable::reset(object, &mut ctx.services);
            }
        }, _ => ());
        self.transform_destroy(handle);

        if self.active_camera == Some(handle) {
            self.active_camera = None;
        }
        ctx.events.unsubscribe_all(handle);
        ctx.events.send(Event::new(EventType::EntityRemoved).with_sender(handle));

        let released = arena_mut!(self, handle.kind, arena => arena.release(handle.index), _ => false);
        debug!("Removed {} '{name}'", handle.kind);
        released
    }

    /// First entity named `name`
    ///
    /// Arenas are searched in [`EntityType::ARENA_ORDER`], then the player and
    /// the root.
    pub fn find(&self, name: &str) -> Option<EntityHandle> {
        EntityType::ARENA_ORDER
            .into_iter()
            .find_map(|kind| self.find_of_kind(kind, name))
            .or_else(|| self.find_of_kind(EntityType::Player, name))
            .or_else(|| self.find_of_kind(EntityType::Root, name))
    }

    /// First entity of `kind` named `name`
    pub fn find_of_kind(&self, kind: EntityType, name: &str) -> Option<EntityHandle> {
        match kind {
            EntityType::Root => Some(&self.root),
            EntityType::Player => Some(&self.player.base),
            _ => return arena_ref!(self, kind, arena => arena.find(name), _ => None),
        }
        .filter(|entity| entity.is_active() && entity.name == name)
        .map(Entity::handle)
    }

    /// Active entity occupying slot `id` of `kind`, whatever its generation
    pub fn base_entity_get(&self, id: usize, kind: EntityType) -> Option<&Entity> {
        match kind {
            EntityType::Root => Some(&self.root).filter(|root| id == ROOT_ID && root.is_active()),
            EntityType::Player => {
                Some(&self.player.base).filter(|player| id == PLAYER_ID && player.is_active())
            }
            _ => arena_ref!(self, kind, arena => arena.slot(id).map(|object| object.base()), _ => None),
        }
    }

    /// Handles of every live entity of `kind`, in slot order
    pub fn handles_of_kind(&self, kind: EntityType) -> Vec<EntityHandle> {
        match kind {
            EntityType::Root | EntityType::Player => self
                .entity(if kind == EntityType::Root {
                    self.root_handle()
                } else {
                    self.player_handle()
                })
                .map(Entity::handle)
                .into_iter()
                .collect(),
            _ => arena_ref!(self, kind, arena => arena.handles(), _ => Vec::new()),
        }
    }

    /// Handles of every live arena entity, in lookup order
    pub fn all_handles(&self) -> Vec<EntityHandle> {
        EntityType::ARENA_ORDER
            .into_iter()
            .flat_map(|kind| self.handles_of_kind(kind))
            .collect()
    }

    /// Live entities across every arena
    pub fn entity_count(&self) -> usize {
        EntityType::ARENA_ORDER
            .into_iter()
            .map(|kind| arena_ref!(self, kind, arena => arena.len(), _ => 0))
            .sum()
    }

    /// Direct children of `handle` that are of `kind`
    pub fn children_of_kind(&self, handle: EntityHandle, kind: EntityType) -> Vec<EntityHandle> {
        self.entity(handle)
            .map(|entity| {
                entity
                    .transform
                    .children
                    .iter()
                    .copied()
                    .filter(|child| child.kind == kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Move `child` under `parent`, keeping world matrices current
    pub fn entity_parent_set(&mut self, child: EntityHandle, parent: EntityHandle) -> bool {
        if child.kind == EntityType::Root {
            warn!("The root entity cannot be re-parented");
            return false;
        }
        self.parent_set(child, parent, true)
    }

    /// Move `child` back under the root
    pub fn entity_parent_reset(&mut self, child: EntityHandle) -> bool {
        let root = self.root_handle();
        self.entity_parent_set(child, root)
    }

    /// Index of `filename` in the archetype table, registering it if new
    ///
    /// Returns `None` (logged) when the table is full.
    pub fn entity_archetype_add(&mut self, filename: &str) -> Option<usize> {
        if let Some(index) = self.archetypes.iter().position(|existing| existing == filename) {
            return Some(index);
        }
        if self.archetypes.len() >= self.archetype_capacity {
            warn!(
                "Archetype table full ({}), '{filename}' will be saved inline",
                self.archetype_capacity
            );
            return None;
        }
        self.archetypes.push(filename.to_string());
        Some(self.archetypes.len() - 1)
    }

    /// Filename registered at `index`
    pub fn archetype(&self, index: usize) -> Option<&str> {
        self.archetypes.get(index).map(String::as_str)
    }

    /// Registered archetype filenames
    pub fn archetypes(&self) -> &[String] {
        &self.archetypes
    }

    /// Deep-copy a payload between two entities of the same kind
    pub(crate) fn duplicate_payload(&mut self, target: EntityHandle, source: EntityHandle) {
        if target.kind != source.kind {
            return;
        }
        arena_mut!(self, source.kind, arena => {
            if let Some(payload) = arena.get(source).cloned() {
                if let Some(copy) = arena.get_mut(target) {
                    copy.duplicate_from(&payload);
                }
            }
        }, _ => ());
    }
}

impl TransformHierarchy for Scene {
    fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        match handle.kind {
            EntityType::Root => Some(&self.root),
            EntityType::Player => Some(&self.player.base),
            kind => return arena_ref!(self, kind, arena => arena.get(handle).map(|object| object.base()), _ => None),
        }
        .filter(|entity| entity.is_active() && entity.handle() == handle)
    }

    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        match handle.kind {
            EntityType::Root => Some(&mut self.root),
            EntityType::Player => Some(&mut self.player.base),
            kind => {
                return arena_mut!(self, kind, arena => arena.get_mut(handle).map(|object| object.base_mut()), _ => None)
            }
        }
        .filter(|entity| entity.is_active() && entity.handle() == handle)
    }
}
