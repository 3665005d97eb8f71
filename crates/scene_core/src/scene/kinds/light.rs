//! Light payload

use super::{read_tag, scene_object, Duplicable, Resettable, Serializable};
use crate::foundation::math::Vec3;
use crate::scene::services::Services;
use crate::scene::{Entity, EntityType};
use crate::serialization::KeyValueStore;

/// Light shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    /// Cone
    Spot,
    /// Parallel rays
    Directional,
    /// Omnidirectional
    #[default]
    Point,
    /// Slot holds no usable light
    Invalid,
}

impl LightType {
    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Spot),
            1 => Some(Self::Directional),
            2 => Some(Self::Point),
            3 => Some(Self::Invalid),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Spot => 0,
            Self::Directional => 1,
            Self::Point => 2,
            Self::Invalid => 3,
        }
    }
}

/// Scene light
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Base entity
    pub base: Entity,
    /// Shape
    pub light_type: LightType,
    /// Outer cone angle in degrees
    pub outer_angle: f32,
    /// Inner cone angle in degrees
    pub inner_angle: f32,
    /// Falloff exponent
    pub falloff: f32,
    /// Reach of point and spot lights
    pub radius: f32,
    /// Brightness multiplier
    pub intensity: f32,
    /// Shadow map depth bias
    pub depth_bias: f32,
    /// Contributes to shading
    pub valid: bool,
    /// Renders a shadow map
    pub cast_shadow: bool,
    /// Percentage-closer filtering on shadows
    pub pcf_enabled: bool,
    /// RGB color
    pub color: Vec3,
}

scene_object!(Light, EntityType::Light);

impl Light {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            light_type: LightType::Invalid,
            outer_angle: 0.0,
            inner_angle: 0.0,
            falloff: 0.0,
            radius: 0.0,
            intensity: 10.0,
            depth_bias: 0.0,
            valid: false,
            cast_shadow: false,
            pcf_enabled: false,
            color: Vec3::zeros(),
        }
    }

    /// Apply creation defaults for a light of `light_type`
    pub fn init(&mut self, light_type: LightType) {
        self.light_type = light_type;
        self.valid = true;
        self.cast_shadow = false;
        self.depth_bias = 0.0005;
        self.pcf_enabled = false;
        self.intensity = 1.0;
        self.falloff = 1.5;
        self.outer_angle = 30.0;
        self.inner_angle = 20.0;
        self.radius = 20.0;
        self.color = Vec3::repeat(1.0);
    }
}

impl Serializable for Light {
    const KEYS: &'static [&'static str] = &[
        "light_type",
        "outer_angle",
        "inner_angle",
        "falloff",
        "radius",
        "intensity",
        "depth_bias",
        "valid",
        "cast_shadow",
        "pcf_enabled",
        "color",
    ];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("light_type", self.light_type.as_i32());
        data.set("outer_angle", self.outer_angle);
        data.set("inner_angle", self.inner_angle);
        data.set("falloff", self.falloff);
        data.set("radius", self.radius);
        data.set("intensity", self.intensity);
        data.set("depth_bias", self.depth_bias);
        data.set("valid", self.valid);
        data.set("cast_shadow", self.cast_shadow);
        data.set("pcf_enabled", self.pcf_enabled);
        data.set("color", self.color);
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        read_tag(data, "light_type", &mut self.light_type, LightType::from_i32);
        data.read_into("outer_angle", &mut self.outer_angle);
        data.read_into("inner_angle", &mut self.inner_angle);
        data.read_into("falloff", &mut self.falloff);
        data.read_into("radius", &mut self.radius);
        data.read_into("intensity", &mut self.intensity);
        data.read_into("depth_bias", &mut self.depth_bias);
        data.read_into("valid", &mut self.valid);
        data.read_into("cast_shadow", &mut self.cast_shadow);
        data.read_into("pcf_enabled", &mut self.pcf_enabled);
        data.read_into("color", &mut self.color);
    }
}

impl Duplicable for Light {
    fn duplicate_from(&mut self, source: &Self) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Light, 0));
        *self = Self { base, ..source.clone() };
    }
}

impl Resettable for Light {
    fn reset(&mut self, _services: &mut Services) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Light, 0));
        *self = Self::with_base(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::kinds::SceneObject;
    use approx::assert_relative_eq;

    #[test]
    fn test_init_defaults() {
        let mut light = Light::new_slot(0);
        assert!(!light.valid);
        light.init(LightType::Spot);

        assert!(light.valid);
        assert_relative_eq!(light.depth_bias, 0.0005);
        assert_relative_eq!(light.outer_angle, 30.0);
        assert_relative_eq!(light.inner_angle, 20.0);
        assert_relative_eq!(light.color, Vec3::repeat(1.0));
    }

    #[test]
    fn test_unknown_light_type_keeps_previous() {
        let mut light = Light::new_slot(0);
        light.init(LightType::Directional);
        let mut data = KeyValueStore::new();
        data.set("light_type", "7");
        data.set("radius", "42.0");
        light.read_fields(&data);

        assert_eq!(light.light_type, LightType::Directional);
        assert_relative_eq!(light.radius, 42.0);
    }

    #[test]
    fn test_duplicate_copies_payload_only() {
        let mut source = Light::new_slot(0);
        source.init(LightType::Spot);
        source.intensity = 3.0;
        source.base.rename("Lamp");

        let mut copy = Light::new_slot(5);
        copy.duplicate_from(&source);
        assert_relative_eq!(copy.intensity, 3.0);
        assert_eq!(copy.light_type, LightType::Spot);
        assert_eq!(copy.base.id, 5);
        assert!(copy.base.name.is_empty());
    }
}
