//! Pickup payload

use super::{read_tag, scene_object, Duplicable, DoorKeyMask, Resettable, Serializable};
use crate::scene::services::Services;
use crate::scene::{Entity, EntityHandle, EntityType};
use crate::serialization::KeyValueStore;

/// What a pickup grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PickupType {
    /// A door key
    Key,
    /// Health points
    #[default]
    Health,
}

impl PickupType {
    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Key),
            1 => Some(Self::Health),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Key => 0,
            Self::Health => 1,
        }
    }
}

/// Spinning collectible
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    /// Base entity
    pub base: Entity,
    /// What is granted
    pub pickup_type: PickupType,
    /// Mesh spin in degrees per second
    pub spin_speed: f32,
    /// Key granted by [`PickupType::Key`]
    pub key_type: DoorKeyMask,
    /// Health granted by [`PickupType::Health`]
    pub health: i32,
    /// Already collected
    pub picked_up: bool,
    /// Static mesh child, resolved after scene load
    pub mesh: Option<EntityHandle>,
    /// Sound source child, resolved after scene load
    pub sound: Option<EntityHandle>,
    /// Trigger child, resolved after scene load
    pub trigger: Option<EntityHandle>,
}

scene_object!(Pickup, EntityType::Pickup);

impl Pickup {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            pickup_type: PickupType::Health,
            spin_speed: 0.0,
            key_type: DoorKeyMask::empty(),
            health: 0,
            picked_up: false,
            mesh: None,
            sound: None,
            trigger: None,
        }
    }

    /// Configure a freshly created pickup
    pub fn init(&mut self, pickup_type: PickupType) {
        self.pickup_type = pickup_type;
        self.spin_speed = 5.0;
        self.picked_up = false;
        self.key_type = DoorKeyMask::empty();
        self.health = 0;
    }
}

impl Serializable for Pickup {
    const KEYS: &'static [&'static str] =
        &["pickup_type", "pickup_spin_speed", "pickup_key_type", "pickup_health"];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("pickup_type", self.pickup_type.as_i32());
        data.set("pickup_spin_speed", self.spin_speed);
        match self.pickup_type {
            PickupType::Key => data.set("pickup_key_type", self.key_type.bits()),
            PickupType::Health => data.set("pickup_health", self.health),
        }
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        read_tag(data, "pickup_type", &mut self.pickup_type, PickupType::from_i32);
        data.read_into("pickup_spin_speed", &mut self.spin_speed);
        match self.pickup_type {
            PickupType::Key => {
                let mut key = self.key_type.bits();
                if data.read_into("pickup_key_type", &mut key) {
                    self.key_type = DoorKeyMask::from_bits_truncate(key);
                }
            }
            PickupType::Health => {
                data.read_into("pickup_health", &mut self.health);
            }
        }
    }
}

impl Duplicable for Pickup {
    fn duplicate_from(&mut self, source: &Self) {
        self.pickup_type = source.pickup_type;
        self.spin_speed = source.spin_speed;
        self.key_type = source.key_type;
        self.health = source.health;
    }
}

impl Resettable for Pickup {
    fn reset(&mut self, _services: &mut Services) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Pickup, 0));
        *self = Self::with_base(base);
    }
}
