//! Trigger volume payload

use bitflags::bitflags;

use super::{read_tag, scene_object, Duplicable, Resettable, Serializable};
use crate::scene::services::Services;
use crate::scene::{Entity, EntityType};
use crate::serialization::KeyValueStore;

/// Event id meaning "fire nothing"
pub const NO_TRIGGER_EVENT: i32 = -1;

/// Firing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerType {
    /// Fires once, then removes itself
    #[default]
    OneShot,
    /// Fires on entry, re-arms once empty
    Toggle,
    /// Fires every update while occupied
    Continuous,
}

impl TriggerType {
    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::OneShot),
            1 => Some(Self::Toggle),
            2 => Some(Self::Continuous),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::OneShot => 0,
            Self::Toggle => 1,
            Self::Continuous => 2,
        }
    }
}

bitflags! {
    /// Entities a trigger reacts to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TriggerMask: i32 {
        /// The player
        const PLAYER = 1 << 0;
        /// Enemy meshes
        const ENEMY = 1 << 1;
    }
}

/// Box-shaped volume that raises an event when occupied
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Base entity
    pub base: Entity,
    /// Firing behaviour
    pub trigger_type: TriggerType,
    /// User event id sent when firing, [`NO_TRIGGER_EVENT`] for none
    pub trigger_event: i32,
    /// Who can occupy the volume
    pub trigger_mask: TriggerMask,
    /// Occupied as of the last update
    pub triggered: bool,
    /// Times fired
    pub count: u32,
}

scene_object!(Trigger, EntityType::Trigger);

impl Trigger {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            trigger_type: TriggerType::OneShot,
            trigger_event: NO_TRIGGER_EVENT,
            trigger_mask: TriggerMask::PLAYER,
            triggered: false,
            count: 0,
        }
    }

    /// Configure a freshly created trigger
    pub fn init(&mut self, trigger_type: TriggerType, trigger_event: i32, trigger_mask: TriggerMask) {
        self.trigger_type = trigger_type;
        self.trigger_event = trigger_event;
        self.trigger_mask = trigger_mask;
        self.triggered = false;
        self.count = 0;
    }

    /// Advance the occupancy state. Returns whether the trigger fires.
    pub fn evaluate(&mut self, occupied: bool) -> bool {
        if !occupied {
            self.triggered = false;
            return false;
        }

        let fire = match self.trigger_type {
            TriggerType::OneShot | TriggerType::Continuous => true,
            TriggerType::Toggle => !self.triggered,
        };
        self.triggered = true;
        if fire {
            self.count += 1;
        }
        fire
    }

    /// Whether firing should raise an event
    pub const fn has_event(&self) -> bool {
        self.trigger_event != NO_TRIGGER_EVENT
    }
}

impl Serializable for Trigger {
    const KEYS: &'static [&'static str] = &["trigger_type", "trigger_event", "trigger_mask"];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("trigger_type", self.trigger_type.as_i32());
        data.set("trigger_event", self.trigger_event);
        data.set("trigger_mask", self.trigger_mask.bits());
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        read_tag(data, "trigger_type", &mut self.trigger_type, TriggerType::from_i32);
        data.read_into("trigger_event", &mut self.trigger_event);
        let mut mask = self.trigger_mask.bits();
        if data.read_into("trigger_mask", &mut mask) {
            self.trigger_mask = TriggerMask::from_bits_truncate(mask);
        }
    }
}

impl Duplicable for Trigger {
    fn duplicate_from(&mut self, source: &Self) {
        self.init(source.trigger_type, source.trigger_event, source.trigger_mask);
    }
}

impl Resettable for Trigger {
    fn reset(&mut self, _services: &mut Services) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Trigger, 0));
        *self = Self::with_base(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::kinds::SceneObject;

    fn trigger(trigger_type: TriggerType) -> Trigger {
        let mut trigger = Trigger::new_slot(0);
        trigger.init(trigger_type, 7, TriggerMask::PLAYER);
        trigger
    }

    #[test]
    fn test_toggle_rearms_after_empty() {
        let mut toggle = trigger(TriggerType::Toggle);
        assert!(toggle.evaluate(true));
        assert!(!toggle.evaluate(true));
        assert!(!toggle.evaluate(false));
        assert!(toggle.evaluate(true));
        assert_eq!(toggle.count, 2);
    }

    #[test]
    fn test_continuous_fires_every_update() {
        let mut continuous = trigger(TriggerType::Continuous);
        let fired = (0..3).filter(|_| continuous.evaluate(true)).count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_mask_round_trips_as_integer() {
        let mut source = trigger(TriggerType::OneShot);
        source.trigger_mask = TriggerMask::PLAYER | TriggerMask::ENEMY;
        let mut data = KeyValueStore::new();
        source.write_fields(&mut data);

        let mut loaded = Trigger::new_slot(1);
        loaded.read_fields(&data);
        assert_eq!(loaded.trigger_mask, source.trigger_mask);
        assert_eq!(loaded.trigger_event, 7);
    }
}
