//! Entity base data shared by every kind
//!
//! Every arena slot embeds an [`Entity`]. Handles carry the slot's
//! generation so references to a released slot resolve to nothing.

use bitflags::bitflags;
use log::warn;

use super::transform::Transform;
use crate::spatial::BoundingBox;

/// Longest entity name kept, in bytes
pub const MAX_ENTITY_NAME_LEN: usize = 128;

/// Closed set of entity kinds
///
/// The discriminant is the integer written to files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum EntityType {
    /// Unused slot
    None = 0,
    /// Plain entity without payload
    Default = 1,
    /// The player
    Player = 2,
    /// Scene root
    Root = 3,
    /// Camera
    Camera = 4,
    /// Light
    Light = 5,
    /// Static mesh
    StaticMesh = 6,
    /// Sound source
    SoundSource = 7,
    /// Enemy
    Enemy = 8,
    /// Trigger volume
    Trigger = 9,
    /// Door
    Door = 10,
    /// Pickup
    Pickup = 11,
}

impl EntityType {
    /// Kinds stored in arenas, in lookup order
    pub const ARENA_ORDER: [Self; 9] = [
        Self::Default,
        Self::Light,
        Self::Camera,
        Self::StaticMesh,
        Self::SoundSource,
        Self::Enemy,
        Self::Trigger,
        Self::Door,
        Self::Pickup,
    ];

    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Default,
            2 => Self::Player,
            3 => Self::Root,
            4 => Self::Camera,
            5 => Self::Light,
            6 => Self::StaticMesh,
            7 => Self::SoundSource,
            8 => Self::Enemy,
            9 => Self::Trigger,
            10 => Self::Door,
            11 => Self::Pickup,
            _ => return None,
        })
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Default => "Default",
            Self::Player => "Player",
            Self::Root => "Root",
            Self::Camera => "Camera",
            Self::Light => "Light",
            Self::StaticMesh => "Static Mesh",
            Self::SoundSource => "Sound Source",
            Self::Enemy => "Enemy",
            Self::Trigger => "Trigger",
            Self::Door => "Door",
            Self::Pickup => "Pickup",
        }
    }

    /// Ray mask bit selecting this kind
    pub const fn ray_mask(self) -> RayMask {
        match self {
            Self::Default => RayMask::DEFAULT,
            Self::Player => RayMask::PLAYER,
            Self::Camera => RayMask::CAMERA,
            Self::Light => RayMask::LIGHT,
            Self::StaticMesh => RayMask::STATIC_MESH,
            Self::SoundSource => RayMask::SOUND_SOURCE,
            Self::Enemy => RayMask::ENEMY,
            Self::Trigger => RayMask::TRIGGER,
            Self::Door => RayMask::DOOR,
            Self::Pickup => RayMask::PICKUP,
            Self::None | Self::Root => RayMask::empty(),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Per-entity state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u16 {
        /// Occupies its arena slot
        const ACTIVE = 1 << 0;
        /// Selected in the editor
        const SELECTED_IN_EDITOR = 1 << 1;
        /// Removed during the next post-update
        const MARKED_FOR_DELETION = 1 << 2;
        /// Never written to scene files
        const TRANSIENT = 1 << 3;
        /// Not listed in the editor hierarchy
        const HIDE_IN_HIERARCHY = 1 << 4;
        /// Not drawn
        const SKIP_RENDER = 1 << 5;
        /// Skipped by ray queries
        const IGNORE_RAYCAST = 1 << 6;
        /// Skipped by collision
        const IGNORE_COLLISION = 1 << 7;
        /// Drawn even when culled
        const ALWAYS_RENDER = 1 << 8;
    }
}

bitflags! {
    /// Kinds a ray query considers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RayMask: u16 {
        /// Plain entities
        const DEFAULT = 1 << 0;
        /// The player
        const PLAYER = 1 << 1;
        /// Cameras
        const CAMERA = 1 << 2;
        /// Lights
        const LIGHT = 1 << 3;
        /// Static meshes
        const STATIC_MESH = 1 << 4;
        /// Sound sources
        const SOUND_SOURCE = 1 << 5;
        /// Enemies
        const ENEMY = 1 << 6;
        /// Triggers
        const TRIGGER = 1 << 7;
        /// Doors
        const DOOR = 1 << 8;
        /// Pickups
        const PICKUP = 1 << 9;
        /// Everything
        const ALL = Self::DEFAULT.bits()
            | Self::PLAYER.bits()
            | Self::CAMERA.bits()
            | Self::LIGHT.bits()
            | Self::STATIC_MESH.bits()
            | Self::SOUND_SOURCE.bits()
            | Self::ENEMY.bits()
            | Self::TRIGGER.bits()
            | Self::DOOR.bits()
            | Self::PICKUP.bits();
    }
}

/// Generational reference to an entity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    /// Arena the slot lives in
    pub kind: EntityType,
    /// Slot index, equal to the entity id
    pub index: usize,
    /// Slot generation when the handle was issued
    pub generation: u32,
}

impl EntityHandle {
    /// Create a handle
    pub const fn new(kind: EntityType, index: usize, generation: u32) -> Self {
        Self { kind, index, generation }
    }
}

/// Data every entity carries
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Slot index inside the owning arena
    pub id: usize,
    /// Kind tag
    pub kind: EntityType,
    /// Bumped each time the slot is released
    pub generation: u32,
    /// State bits
    pub flags: EntityFlags,
    /// Display name, at most [`MAX_ENTITY_NAME_LEN`] bytes
    pub name: String,
    /// Local bounds
    pub bounding_box: BoundingBox,
    /// Local bounds re-enveloped in world space
    pub derived_bounding_box: BoundingBox,
    /// Index into the scene archetype table
    pub archetype_index: Option<usize>,
    /// Placement in the hierarchy
    pub transform: Transform,
}

impl Entity {
    /// Inactive entity for slot `id`
    pub fn new(kind: EntityType, id: usize) -> Self {
        Self {
            id,
            kind,
            generation: 0,
            flags: EntityFlags::empty(),
            name: String::new(),
            bounding_box: BoundingBox::unit(),
            derived_bounding_box: BoundingBox::unit(),
            archetype_index: None,
            transform: Transform::default(),
        }
    }

    /// Handle to this entity in its current generation
    pub const fn handle(&self) -> EntityHandle {
        EntityHandle::new(self.kind, self.id, self.generation)
    }

    /// Whether the slot is in use
    pub const fn is_active(&self) -> bool {
        self.flags.contains(EntityFlags::ACTIVE)
    }

    /// Whether scene files skip this entity
    pub const fn is_transient(&self) -> bool {
        self.flags.contains(EntityFlags::TRANSIENT)
    }

    /// Set the name, truncating to [`MAX_ENTITY_NAME_LEN`] bytes
    pub fn rename(&mut self, name: &str) {
        let mut end = name.len().min(MAX_ENTITY_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        if end < name.len() {
            warn!("Entity name '{name}' truncated to {MAX_ENTITY_NAME_LEN} bytes");
        }
        self.name.clear();
        self.name.push_str(&name[..end]);
    }

    /// Rebuild the world-space box from the world matrix
    pub fn update_derived_bounding_box(&mut self) {
        self.derived_bounding_box = self.bounding_box.transformed(&self.transform.world_matrix);
    }

    /// Restore the unit local box
    pub fn bounding_box_reset(&mut self, update_derived: bool) {
        self.bounding_box = BoundingBox::unit();
        if update_derived {
            self.update_derived_bounding_box();
        }
    }

    /// Clear everything except id, kind and generation
    pub fn reset(&mut self) {
        self.flags = EntityFlags::empty();
        self.name.clear();
        self.archetype_index = None;
        self.transform = Transform::default();
        self.bounding_box_reset(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_integer_round_trip() {
        for kind in EntityType::ARENA_ORDER {
            assert_eq!(EntityType::from_i32(kind.as_i32()), Some(kind));
        }
        assert_eq!(EntityType::from_i32(99), None);
    }

    #[test]
    fn test_ray_mask_all_covers_every_kind() {
        for kind in EntityType::ARENA_ORDER {
            assert!(RayMask::ALL.contains(kind.ray_mask()));
        }
        assert!(EntityType::Root.ray_mask().is_empty());
    }

    #[test]
    fn test_rename_truncates() {
        let mut entity = Entity::new(EntityType::Default, 0);
        entity.rename(&"n".repeat(MAX_ENTITY_NAME_LEN + 5));
        assert_eq!(entity.name.len(), MAX_ENTITY_NAME_LEN);
    }

    #[test]
    fn test_reset_keeps_identity() {
        let mut entity = Entity::new(EntityType::Light, 3);
        entity.generation = 2;
        entity.flags = EntityFlags::ACTIVE | EntityFlags::TRANSIENT;
        entity.rename("Lamp");
        entity.archetype_index = Some(1);

        entity.reset();
        assert_eq!(entity.handle(), EntityHandle::new(EntityType::Light, 3, 2));
        assert!(!entity.is_active());
        assert!(entity.name.is_empty());
        assert_eq!(entity.archetype_index, None);
    }
}
