//! Door payload

use bitflags::bitflags;

use super::{read_tag, scene_object, Duplicable, Resettable, Serializable};
use crate::scene::services::Services;
use crate::scene::{Entity, EntityHandle, EntityType};
use crate::serialization::KeyValueStore;

/// Door animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DoorState {
    /// Fully closed
    #[default]
    Closed,
    /// Fully open
    Open,
    /// Moving toward closed
    Closing,
    /// Moving toward open
    Opening,
}

impl DoorState {
    /// State for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            2 => Some(Self::Closing),
            3 => Some(Self::Opening),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Opening => 3,
        }
    }
}

bitflags! {
    /// Keys needed to open a door. Empty opens for anyone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DoorKeyMask: i32 {
        /// Red key
        const RED = 1 << 0;
        /// Green key
        const GREEN = 1 << 1;
        /// Blue key
        const BLUE = 1 << 2;
    }
}

/// Door with optional mesh, sound and trigger children
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    /// Base entity
    pub base: Entity,
    /// Animation state
    pub door_state: DoorState,
    /// Keys required
    pub door_mask: DoorKeyMask,
    /// Opening speed
    pub door_speed: f32,
    /// Static mesh child, resolved after scene load
    pub mesh: Option<EntityHandle>,
    /// Sound source child, resolved after scene load
    pub sound: Option<EntityHandle>,
    /// Trigger child, resolved after scene load
    pub trigger: Option<EntityHandle>,
}

scene_object!(Door, EntityType::Door);

impl Door {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            door_state: DoorState::Closed,
            door_mask: DoorKeyMask::empty(),
            door_speed: 0.0,
            mesh: None,
            sound: None,
            trigger: None,
        }
    }

    /// Configure a freshly created door
    pub fn init(&mut self, door_mask: DoorKeyMask) {
        self.door_mask = door_mask;
        self.door_speed = 20.0;
        self.door_state = DoorState::Closed;
    }

    /// Whether every link found a child
    pub const fn is_linked(&self) -> bool {
        self.mesh.is_some() && self.sound.is_some() && self.trigger.is_some()
    }
}

impl Serializable for Door {
    const KEYS: &'static [&'static str] = &["door_state", "door_mask", "door_speed"];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("door_state", self.door_state.as_i32());
        data.set("door_mask", self.door_mask.bits());
        data.set("door_speed", self.door_speed);
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        read_tag(data, "door_state", &mut self.door_state, DoorState::from_i32);
        let mut mask = self.door_mask.bits();
        if data.read_into("door_mask", &mut mask) {
            self.door_mask = DoorKeyMask::from_bits_truncate(mask);
        }
        data.read_into("door_speed", &mut self.door_speed);
    }
}

impl Duplicable for Door {
    fn duplicate_from(&mut self, source: &Self) {
        self.door_state = source.door_state;
        self.door_mask = source.door_mask;
        self.door_speed = source.door_speed;
    }
}

impl Resettable for Door {
    fn reset(&mut self, _services: &mut Services) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Door, 0));
        *self = Self::with_base(base);
    }
}
