//! Per-kind entity payloads
//!
//! Each kind wraps a base [`Entity`] and implements the capability traits
//! the scene dispatches to when saving, loading, duplicating and removing.

/// Implements [`SceneObject`] for a payload struct with a `base` field
macro_rules! scene_object {
    ($ty:ty, $kind:expr) => {
        impl $crate::scene::kinds::SceneObject for $ty {
            const KIND: $crate::scene::EntityType = $kind;

            fn new_slot(id: usize) -> Self {
                Self::with_base($crate::scene::Entity::new($kind, id))
            }

            fn base(&self) -> &$crate::scene::Entity {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::scene::Entity {
                &mut self.base
            }
        }
    };
}
pub(crate) use scene_object;

mod camera;
mod door;
mod enemy;
mod light;
mod pickup;
mod player;
mod sound_source;
mod static_mesh;
mod trigger;

pub use camera::{Camera, CameraRole};
pub use door::{Door, DoorKeyMask, DoorState};
pub use enemy::{Enemy, EnemyType};
pub use light::{Light, LightType};
pub use pickup::{Pickup, PickupType};
pub use player::{Player, PlayerInput, PLAYER_ID};
pub use sound_source::SoundSource;
pub use static_mesh::{Collision, StaticMesh, DEFAULT_MATERIAL};
pub use trigger::{Trigger, TriggerMask, TriggerType, NO_TRIGGER_EVENT};

use log::warn;

use super::entity::{Entity, EntityType};
use super::services::Services;
use crate::serialization::KeyValueStore;

/// Keys every entity record carries
pub const BASE_KEYS: &[&str] = &["name", "type", "parent", "position", "scale", "rotation"];

/// Something stored in an arena slot
pub trait SceneObject {
    /// Kind tag of every object of this type
    const KIND: EntityType;

    /// Inactive object for slot `id`
    fn new_slot(id: usize) -> Self;

    /// Base entity
    fn base(&self) -> &Entity;

    /// Base entity, mutably
    fn base_mut(&mut self) -> &mut Entity;
}

/// Payload persisted in entity records
pub trait Serializable {
    /// Keys written and understood, besides [`BASE_KEYS`]
    const KEYS: &'static [&'static str];

    /// Write payload fields
    fn write_fields(&self, data: &mut KeyValueStore);

    /// Overwrite payload fields present in `data`
    fn read_fields(&mut self, data: &KeyValueStore);
}

/// Payload that can be deep-copied into a freshly created object
pub trait Duplicable {
    /// Copy payload fields from `source`, leaving the base entity alone
    fn duplicate_from(&mut self, source: &Self);
}

/// Payload that holds collaborator resources
pub trait Resettable {
    /// Release collaborator handles and restore slot defaults
    fn reset(&mut self, services: &mut Services);
}

/// Read an integer-coded enum, keeping `target` when the key is missing or unknown
pub(crate) fn read_tag<T>(
    data: &KeyValueStore,
    key: &str,
    target: &mut T,
    decode: impl Fn(i32) -> Option<T>,
) {
    let mut raw = 0_i32;
    if !data.read_into(key, &mut raw) {
        return;
    }
    match decode(raw) {
        Some(value) => *target = value,
        None => warn!("Unknown {key} value {raw}, keeping the previous one"),
    }
}

impl SceneObject for Entity {
    const KIND: EntityType = EntityType::Default;

    fn new_slot(id: usize) -> Self {
        Self::new(EntityType::Default, id)
    }

    fn base(&self) -> &Entity {
        self
    }

    fn base_mut(&mut self) -> &mut Entity {
        self
    }
}

impl Serializable for Entity {
    const KEYS: &'static [&'static str] = &[];

    fn write_fields(&self, _data: &mut KeyValueStore) {}

    fn read_fields(&mut self, _data: &KeyValueStore) {}
}

impl Duplicable for Entity {
    fn duplicate_from(&mut self, _source: &Self) {}
}

impl Resettable for Entity {
    fn reset(&mut self, _services: &mut Services) {}
}
