//! Entity and scene files
//!
//! Entities are written as `Entity` objects carrying the base keys (`name`,
//! `type`, `parent`, `position`, `scale`, `rotation`) followed by the keys of
//! their kind. A scene file starts with a `Scene_Config` and a `Player`
//! object, then lists every non-transient entity depth-first from the root.
//! Entities loaded from an archetype file that has children are saved as a
//! `Scene_Entity_Entry` pointing back at that file.

use std::path::PathBuf;

use log::{debug, error, info, warn};

use super::arena::Arena;
use super::context::SceneContext;
use super::entity::{EntityFlags, EntityHandle, EntityType};
use super::error::{SceneError, SceneResult};
use super::kinds::{read_tag, Player, Serializable, BASE_KEYS};
use super::scene_graph::{arena_mut, arena_ref, FogMode, Scene, PLAYER_NAME};
use super::transform::TransformHierarchy;
use crate::config::{DirectoryType, PathConfig};
use crate::events::{Event, EventArg, EventType};
use crate::foundation::math::{Quat, Vec3};
use crate::serialization::{load_objects, save_objects, KeyValueStore, ObjectKind, ParsedObject};

const SCENE_CONFIG_KEYS: &[&str] = &[
    "fog_type",
    "fog_density",
    "fog_start_distance",
    "fog_max_distance",
    "fog_color",
    "ambient_light",
    "init_func",
    "cleanup_func",
];

const SCENE_ENTRY_KEYS: &[&str] = &["filename", "name", "parent", "position", "rotation", "scale"];

fn keys_of<T: Serializable>(_arena: &Arena<T>) -> &'static [&'static str] {
    T::KEYS
}

/// `path_of(directory)` when that file exists, else the same file in the other directory
fn resolve_existing(path_of: impl Fn(DirectoryType) -> PathBuf, directory: DirectoryType) -> PathBuf {
    let primary = path_of(directory);
    if primary.exists() {
        return primary;
    }
    let other = match directory {
        DirectoryType::Install => DirectoryType::User,
        DirectoryType::User => DirectoryType::Install,
    };
    let fallback = path_of(other);
    if fallback.exists() {
        debug!("{} not found, using {}", primary.display(), fallback.display());
        fallback
    } else {
        primary
    }
}

fn entity_file(paths: &PathConfig, filename: &str, directory: DirectoryType) -> PathBuf {
    resolve_existing(|dir| paths.entity_path(filename, dir), directory)
}

fn scene_file(paths: &PathConfig, filename: &str, directory: DirectoryType) -> PathBuf {
    resolve_existing(|dir| paths.scene_path(filename, dir), directory)
}

fn write_transform(data: &mut KeyValueStore, position: Vec3, scale: Vec3, rotation: Quat) {
    data.set("position", position);
    data.set("scale", scale);
    data.set("rotation", rotation);
}

impl Scene {
    /// Serialize one live entity, without its children
    pub fn entity_write(&self, handle: EntityHandle) -> Option<ParsedObject> {
        let entity = self.entity(handle)?;
        let kind = if handle.kind == EntityType::Player {
            ObjectKind::Player
        } else {
            ObjectKind::Entity
        };
        let mut object = ParsedObject::new(kind);
        let data = &mut object.data;

        data.set("name", entity.name.as_str());
        data.set("type", entity.kind.as_i32());
        if let Some(parent) = entity.transform.parent.and_then(|parent| self.entity(parent)) {
            data.set("parent", parent.name.as_str());
        }
        write_transform(
            data,
            entity.transform.position,
            entity.transform.scale,
            entity.transform.rotation,
        );

        match handle.kind {
            EntityType::Player => self.player.write_fields(data),
            kind => arena_ref!(self, kind, arena => {
                if let Some(payload) = arena.get(handle) {
                    payload.write_fields(data);
                }
            }, _ => ()),
        }
        Some(object)
    }

    fn resolve_parent(&self, data: &KeyValueStore, loaded: &[EntityHandle]) -> Option<EntityHandle> {
        let mut parent_name = String::new();
        if !data.read_into("parent", &mut parent_name) {
            return None;
        }
        loaded
            .iter()
            .rev()
            .copied()
            .find(|handle| self.entity(*handle).is_some_and(|entity| entity.name == parent_name))
            .or_else(|| self.find(&parent_name))
            .or_else(|| {
                warn!("Parent '{parent_name}' not found, attaching to root");
                None
            })
    }

    fn transform_read(&mut self, handle: EntityHandle, data: &KeyValueStore) {
        let Some(entity) = self.entity_mut(handle) else { return };
        let transform = &mut entity.transform;
        data.read_into("position", &mut transform.position);
        data.read_into("scale", &mut transform.scale);
        data.read_into("rotation", &mut transform.rotation);
        self.update_world_matrix(handle);
    }

    /// Create an entity from an `Entity` object
    ///
    /// `parent` overrides the object's `parent` key. Otherwise the parent is
    /// looked up by name, most recent first, among `loaded` and then in the
    /// whole scene, falling back to the root.
    pub fn entity_read(
        &mut self,
        ctx: &mut SceneContext,
        object: &ParsedObject,
        parent: Option<EntityHandle>,
        loaded: &[EntityHandle],
    ) -> Option<EntityHandle> {
        let data = &object.data;
        let mut name = String::new();
        if !data.read_into("name", &mut name) {
            warn!("{} object without a name, skipped", object.kind);
            return None;
        }

        let mut kind = EntityType::Default;
        read_tag(data, "type", &mut kind, EntityType::from_i32);
        if !EntityType::ARENA_ORDER.contains(&kind) {
            warn!("Entity '{name}' of kind {kind} cannot be loaded, skipped");
            return None;
        }

        let parent = parent.or_else(|| self.resolve_parent(data, loaded));
        let handle = self.create_of_kind(ctx, kind, &name, parent)?;

        let known = arena_mut!(self, kind, arena => {
            if let Some(payload) = arena.get_mut(handle) {
                payload.read_fields(data);
            }
            keys_of(arena)
        }, _ => &[]);
        self.transform_read(handle, data);
        self.attach_resources(ctx, handle);

        let known: Vec<&str> = BASE_KEYS.iter().chain(known).copied().collect();
        data.warn_unknown_keys(&known, &name);

        ctx.events.send_to(handle, &Event::new(EventType::EntityLoaded).with_sender(handle));
        debug!("Loaded {kind} '{name}'");
        Some(handle)
    }

    fn collect_subtree(&self, handle: EntityHandle, out: &mut Vec<ParsedObject>) {
        let Some(entity) = self.entity(handle) else { return };
        if entity.is_transient() {
            return;
        }
        let children = entity.transform.children.clone();
        out.extend(self.entity_write(handle));
        for child in children {
            self.collect_subtree(child, out);
        }
    }

    /// Write `handle` and its non-transient descendants to an entity file
    ///
    /// Returns the number of entities written.
    pub fn entity_save(
        &self,
        ctx: &SceneContext,
        handle: EntityHandle,
        filename: &str,
        directory: DirectoryType,
    ) -> SceneResult<usize> {
        if self.entity(handle).is_none() {
            error!("Cannot save missing entity {handle:?}");
            return Err(SceneError::InvalidEntity(handle));
        }
        let mut objects = Vec::new();
        self.collect_subtree(handle, &mut objects);
        if objects.is_empty() {
            error!("Entity {handle:?} is transient, nothing to save");
            return Err(SceneError::NothingLoaded(filename.to_string()));
        }

        let path = ctx.config.paths.entity_path(filename, directory);
        save_objects(&path, &objects)?;
        info!("Saved {} entities to {}", objects.len(), path.display());
        Ok(objects.len())
    }

    /// Load an entity file under `parent`, or the root
    ///
    /// The first object becomes the returned entity and is registered as an
    /// archetype; the others are marked transient. When the archetype table
    /// is full nothing is marked and the subtree is saved inline. Looks in the other
    /// directory when the file is missing from `directory`.
    pub fn entity_load(
        &mut self,
        ctx: &mut SceneContext,
        filename: &str,
        directory: DirectoryType,
        parent: Option<EntityHandle>,
    ) -> SceneResult<EntityHandle> {
        let path = entity_file(&ctx.config.paths, filename, directory);
        let objects = load_objects(&path)?;
        let root = self.root_handle();

        let mut loaded: Vec<EntityHandle> = Vec::new();
        for object in &objects {
            if object.kind != ObjectKind::Entity {
                warn!("Unexpected {} object in {}, skipped", object.kind, path.display());
                continue;
            }
            let parent = loaded.is_empty().then(|| parent.unwrap_or(root));
            if let Some(handle) = self.entity_read(ctx, object, parent, &loaded) {
                loaded.push(handle);
            }
        }

        let Some((&first, rest)) = loaded.split_first() else {
            error!("No entities loaded from {}", path.display());
            return Err(SceneError::NothingLoaded(path.display().to_string()));
        };
        let archetype = self.entity_archetype_add(filename);
        if let Some(entity) = self.entity_mut(first) {
            entity.archetype_index = archetype;
        }
        if archetype.is_some() {
            for &child in rest {
                self.entity_flags_insert(child, EntityFlags::TRANSIENT);
            }
        }
        info!("Loaded {} entities from {}", loaded.len(), path.display());
        Ok(first)
    }

    fn scene_config_write(&self) -> ParsedObject {
        let mut object = ParsedObject::new(ObjectKind::SceneConfig);
        let data = &mut object.data;
        let fog = &self.render_settings.fog;
        data.set("fog_type", fog.mode.as_i32());
        data.set("fog_density", fog.density);
        data.set("fog_start_distance", fog.start_distance);
        data.set("fog_max_distance", fog.max_distance);
        data.set("fog_color", fog.color);
        data.set("ambient_light", self.render_settings.ambient_light);
        data.set("init_func", self.init_hook.as_str());
        data.set("cleanup_func", self.cleanup_hook.as_str());
        object
    }

    fn scene_config_read(&mut self, ctx: &SceneContext, data: &KeyValueStore) {
        let fog = &mut self.render_settings.fog;
        read_tag(data, "fog_type", &mut fog.mode, FogMode::from_i32);
        data.read_into("fog_density", &mut fog.density);
        data.read_into("fog_start_distance", &mut fog.start_distance);
        data.read_into("fog_max_distance", &mut fog.max_distance);
        data.read_into("fog_color", &mut fog.color);
        data.read_into("ambient_light", &mut self.render_settings.ambient_light);

        for (key, hook) in [("init_func", &mut self.init_hook), ("cleanup_func", &mut self.cleanup_hook)] {
            let mut name = String::new();
            if !data.read_into(key, &mut name) {
                continue;
            }
            if ctx.has_hook(&name) {
                *hook = name;
            } else {
                warn!("Scene hook '{name}' is not registered, keeping '{hook}'");
            }
        }
        data.warn_unknown_keys(SCENE_CONFIG_KEYS, "Scene_Config");
    }

    fn player_read(&mut self, data: &KeyValueStore) {
        self.player.read_fields(data);
        let player = self.player_handle();
        self.transform_read(player, data);

        let known: Vec<&str> = BASE_KEYS.iter().chain(Player::KEYS).copied().collect();
        data.warn_unknown_keys(&known, PLAYER_NAME);
    }

    fn scene_entry_write(&self, handle: EntityHandle, filename: &str) -> Option<ParsedObject> {
        let entity = self.entity(handle)?;
        let mut object = ParsedObject::new(ObjectKind::SceneEntityEntry);
        let data = &mut object.data;
        data.set("filename", filename);
        data.set("name", entity.name.as_str());
        if let Some(parent) = entity.transform.parent.and_then(|parent| self.entity(parent)) {
            data.set("parent", parent.name.as_str());
        }
        write_transform(
            data,
            entity.transform.position,
            entity.transform.scale,
            entity.transform.rotation,
        );
        Some(object)
    }

    fn scene_entry_read(
        &mut self,
        ctx: &mut SceneContext,
        data: &KeyValueStore,
        loaded: &[EntityHandle],
    ) -> Option<EntityHandle> {
        let mut filename = String::new();
        if !data.read_into("filename", &mut filename) {
            warn!("Scene_Entity_Entry without a filename, skipped");
            return None;
        }
        let parent = self.resolve_parent(data, loaded);
        let handle = match self.entity_load(ctx, &filename, DirectoryType::Install, parent) {
            Ok(handle) => handle,
            Err(err) => {
                error!("Failed to load scene entry '{filename}': {err}");
                return None;
            }
        };

        let mut name = String::new();
        if data.read_into("name", &mut name) {
            self.entity_rename(handle, &name);
        }
        self.transform_read(handle, data);
        data.warn_unknown_keys(SCENE_ENTRY_KEYS, &filename);
        Some(handle)
    }

    fn scene_save_walk(&self, handle: EntityHandle, out: &mut Vec<ParsedObject>) {
        let Some(entity) = self.entity(handle) else { return };
        if entity.is_transient() {
            return;
        }

        if handle.kind != EntityType::Player {
            let archetype = entity
                .archetype_index
                .filter(|_| !entity.transform.children.is_empty())
                .and_then(|index| self.archetype(index));
            if let Some(filename) = archetype {
                out.extend(self.scene_entry_write(handle, filename));
                return;
            }
            out.extend(self.entity_write(handle));
        }

        for child in entity.transform.children.clone() {
            self.scene_save_walk(child, out);
        }
    }

    /// Write the scene to a scene file
    ///
    /// Returns the number of entity records written. Saving an unchanged
    /// scene twice produces identical files.
    pub fn save(&self, ctx: &mut SceneContext, filename: &str, directory: DirectoryType) -> SceneResult<usize> {
        let mut objects = vec![self.scene_config_write()];
        objects.extend(self.entity_write(self.player_handle()));
        let header = objects.len();

        let root_children = self
            .entity(self.root_handle())
            .map(|root| root.transform.children.clone())
            .unwrap_or_default();
        for child in root_children {
            self.scene_save_walk(child, &mut objects);
        }

        let count = objects.len() - header;
        let path = ctx.config.paths.scene_path(filename, directory);
        save_objects(&path, &objects)?;
        info!("Saved {count} entities to {}", path.display());

        ctx.events.send(
            Event::new(EventType::SceneSaved)
                .with_arg("filename", EventArg::Name(filename.to_string()))
                .with_arg("count", EventArg::Count(count)),
        );
        Ok(count)
    }

    /// Replace the scene with the contents of a scene file
    ///
    /// The file is parsed before anything is torn down, so a missing or
    /// malformed file leaves the current scene untouched. Returns the number
    /// of entities created from top-level records.
    pub fn load(&mut self, ctx: &mut SceneContext, filename: &str, directory: DirectoryType) -> SceneResult<usize> {
        let path = scene_file(&ctx.config.paths, filename, directory);
        let objects = load_objects(&path)?;

        self.destroy(ctx);
        self.init(ctx);

        let mut loaded: Vec<EntityHandle> = Vec::new();
        let mut records = 0_usize;
        for object in &objects {
            match &object.kind {
                ObjectKind::SceneConfig => {
                    self.scene_config_read(ctx, &object.data);
                    records += 1;
                }
                ObjectKind::Player => {
                    self.player_read(&object.data);
                    records += 1;
                }
                ObjectKind::Entity => {
                    if let Some(handle) = self.entity_read(ctx, object, None, &loaded) {
                        loaded.push(handle);
                        records += 1;
                    }
                }
                ObjectKind::SceneEntityEntry => {
                    if let Some(handle) = self.scene_entry_read(ctx, &object.data, &loaded) {
                        loaded.push(handle);
                        records += 1;
                    }
                }
                other => warn!("Unsupported {other} object in {}, skipped", path.display()),
            }
        }

        if records == 0 {
            error!("Nothing loaded from {}", path.display());
            return Err(SceneError::NothingLoaded(path.display().to_string()));
        }

        self.resolve_links();
        info!("Loaded {} entities from {}", loaded.len(), path.display());
        ctx.events.send(
            Event::new(EventType::SceneLoaded)
                .with_arg("filename", EventArg::Name(filename.to_string()))
                .with_arg("count", EventArg::Count(loaded.len())),
        );
        self.run_init_hook(ctx);
        Ok(loaded.len())
    }

    fn first_child(&self, handle: EntityHandle, kind: EntityType, owner: &str) -> Option<EntityHandle> {
        let child = self.children_of_kind(handle, kind).first().copied();
        if child.is_none() {
            error!("'{owner}' has no {kind} child");
        }
        child
    }

    /// Point doors and pickups at their mesh, sound and trigger children
    pub fn resolve_links(&mut self) {
        for handle in self.handles_of_kind(EntityType::Door) {
            let Some(name) = self.entity(handle).map(|entity| entity.name.clone()) else { continue };
            let mesh = self.first_child(handle, EntityType::StaticMesh, &name);
            let sound = self.first_child(handle, EntityType::SoundSource, &name);
            let trigger = self.first_child(handle, EntityType::Trigger, &name);
            if let Some(door) = self.doors.get_mut(handle) {
                door.mesh = mesh;
                door.sound = sound;
                door.trigger = trigger;
            }
        }
        for handle in self.handles_of_kind(EntityType::Pickup) {
            let Some(name) = self.entity(handle).map(|entity| entity.name.clone()) else { continue };
            let mesh = self.first_child(handle, EntityType::StaticMesh, &name);
            let sound = self.first_child(handle, EntityType::SoundSource, &name);
            let trigger = self.first_child(handle, EntityType::Trigger, &name);
            if let Some(pickup) = self.pickups.get_mut(handle) {
                pickup.mesh = mesh;
                pickup.sound = sound;
                pickup.trigger = trigger;
            }
        }
    }

    /// Deep-copy an entity and its non-transient subtree under `parent`
    ///
    /// `None` keeps the source's parent. An archetype instance with children
    /// is reloaded from its file instead of copied field by field.
    pub fn entity_duplicate(
        &mut self,
        ctx: &mut SceneContext,
        source: EntityHandle,
        parent: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        if matches!(source.kind, EntityType::None | EntityType::Player | EntityType::Root) {
            warn!("Cannot duplicate the {} entity", source.kind);
            return None;
        }
        let Some(entity) = self.entity(source) else {
            warn!("Cannot duplicate missing entity {source:?}");
            return None;
        };
        let name = entity.name.clone();
        let parent = parent.or(entity.transform.parent);
        let archetype_index = entity.archetype_index;
        let children = entity.transform.children.clone();

        let archetype = archetype_index
            .filter(|_| !children.is_empty())
            .and_then(|index| self.archetype(index))
            .map(str::to_string);
        if let Some(filename) = archetype {
            let copy = match self.entity_load(ctx, &filename, DirectoryType::Install, parent) {
                Ok(copy) => copy,
                Err(err) => {
                    error!("Failed to duplicate '{name}' from '{filename}': {err}");
                    return None;
                }
            };
            self.entity_rename(copy, &name);
            self.transform_copy(copy, source, false);
            return Some(copy);
        }

        let copy = self.create_of_kind(ctx, source.kind, &name, parent)?;
        self.duplicate_payload(copy, source);
        self.transform_copy(copy, source, false);
        if let Some(entity) = self.entity_mut(copy) {
            entity.archetype_index = archetype_index;
        }
        self.attach_resources(ctx, copy);

        for child in children {
            if self.entity(child).is_some_and(|entity| !entity.is_transient()) {
                self.entity_duplicate(ctx, child, Some(copy));
            }
        }
        debug!("Duplicated '{name}'");
        Some(copy)
    }
}
