//! Sound source payload

use log::warn;

use super::{read_tag, scene_object, Duplicable, Resettable, Serializable};
use crate::foundation::math::Vec3;
use crate::scene::services::{AttenuationType, Services, SoundHandle, SoundParams, SoundType};
use crate::scene::{Entity, EntityType};
use crate::serialization::KeyValueStore;

/// Positional audio emitter
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSource {
    /// Base entity
    pub base: Entity,
    /// Audio file
    pub source_filename: String,
    /// Container of `source_filename`
    pub sound_type: SoundType,
    /// Currently playing
    pub playing: bool,
    /// Restart when finished
    pub looping: bool,
    /// Playback volume
    pub volume: f32,
    /// Distance where attenuation starts
    pub min_distance: f32,
    /// Distance where attenuation stops
    pub max_distance: f32,
    /// Attenuation strength
    pub rolloff_factor: f32,
    /// Attenuation model
    pub attenuation: AttenuationType,
    /// Live instance in the sound backend
    pub instance: Option<SoundHandle>,
}

scene_object!(SoundSource, EntityType::SoundSource);

impl SoundSource {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            source_filename: String::new(),
            sound_type: SoundType::Wav,
            playing: false,
            looping: false,
            volume: 1.0,
            min_distance: 0.0,
            max_distance: 10.0,
            rolloff_factor: 0.95,
            attenuation: AttenuationType::Inverse,
            instance: None,
        }
    }

    /// Parameters pushed to the backend
    pub const fn params(&self) -> SoundParams {
        SoundParams {
            volume: self.volume,
            looping: self.looping,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            rolloff_factor: self.rolloff_factor,
            attenuation: self.attenuation,
        }
    }

    /// Create a backend instance for `source_filename`
    ///
    /// Replaces any existing instance, then pushes position, parameters and
    /// playing state.
    pub fn attach_instance(&mut self, services: &mut Services, position: &Vec3) -> bool {
        if let Some(previous) = self.instance.take() {
            services.sound.source_release(previous);
        }
        if self.source_filename.is_empty() {
            return false;
        }

        let Some(handle) = services.sound.source_create(&self.source_filename, self.sound_type) else {
            warn!(
                "Failed to create sound instance for '{}' from '{}'",
                self.base.name, self.source_filename
            );
            return false;
        };
        self.instance = Some(handle);
        services.sound.source_update(handle, position, &self.params());
        services.sound.source_set_playing(handle, self.playing);
        true
    }

    /// Start or stop playback
    pub fn set_playing(&mut self, services: &mut Services, playing: bool) {
        self.playing = playing;
        if let Some(handle) = self.instance {
            services.sound.source_set_playing(handle, playing);
        }
    }
}

impl Serializable for SoundSource {
    const KEYS: &'static [&'static str] = &[
        "source_filename",
        "playing",
        "sound_type",
        "loop",
        "volume",
        "sound_min_distance",
        "sound_max_distance",
        "rolloff_factor",
        "sound_attenuation_type",
    ];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("source_filename", self.source_filename.as_str());
        data.set("playing", self.playing);
        data.set("sound_type", self.sound_type.as_i32());
        data.set("loop", self.looping);
        data.set("volume", self.volume);
        data.set("sound_min_distance", self.min_distance);
        data.set("sound_max_distance", self.max_distance);
        data.set("rolloff_factor", self.rolloff_factor);
        data.set("sound_attenuation_type", self.attenuation.as_i32());
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        data.read_into("source_filename", &mut self.source_filename);
        data.read_into("playing", &mut self.playing);
        read_tag(data, "sound_type", &mut self.sound_type, SoundType::from_i32);
        data.read_into("loop", &mut self.looping);
        data.read_into("volume", &mut self.volume);
        data.read_into("sound_min_distance", &mut self.min_distance);
        data.read_into("sound_max_distance", &mut self.max_distance);
        data.read_into("rolloff_factor", &mut self.rolloff_factor);
        read_tag(data, "sound_attenuation_type", &mut self.attenuation, AttenuationType::from_i32);
    }
}

impl Duplicable for SoundSource {
    fn duplicate_from(&mut self, source: &Self) {
        self.source_filename.clone_from(&source.source_filename);
        self.sound_type = source.sound_type;
        self.playing = source.playing;
        self.looping = source.looping;
        self.volume = source.volume;
        self.min_distance = source.min_distance;
        self.max_distance = source.max_distance;
        self.rolloff_factor = source.rolloff_factor;
        self.attenuation = source.attenuation;
    }
}

impl Resettable for SoundSource {
    fn reset(&mut self, services: &mut Services) {
        if let Some(handle) = self.instance.take() {
            services.sound.source_release(handle);
        }
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::SoundSource, 0));
        *self = Self::with_base(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::kinds::SceneObject;
    use approx::assert_relative_eq;

    #[test]
    fn test_creation_defaults() {
        let source = SoundSource::new_slot(0);
        assert_relative_eq!(source.volume, 1.0);
        assert_relative_eq!(source.max_distance, 10.0);
        assert_relative_eq!(source.rolloff_factor, 0.95);
        assert_eq!(source.attenuation, AttenuationType::Inverse);
    }

    #[test]
    fn test_attach_needs_a_filename() {
        let mut services = Services::null();
        let mut source = SoundSource::new_slot(0);
        assert!(!source.attach_instance(&mut services, &Vec3::zeros()));

        source.source_filename = "sounds/bullet_1.wav".to_string();
        assert!(source.attach_instance(&mut services, &Vec3::zeros()));
        assert!(source.instance.is_some());
    }

    #[test]
    fn test_loop_key_maps_to_looping() {
        let mut data = KeyValueStore::new();
        data.set("loop", "true");
        data.set("sound_attenuation_type", "2");
        let mut source = SoundSource::new_slot(0);
        source.read_fields(&data);

        assert!(source.looping);
        assert_eq!(source.attenuation, AttenuationType::Linear);
    }

    #[test]
    fn test_reset_drops_instance() {
        let mut services = Services::null();
        let mut source = SoundSource::new_slot(2);
        source.source_filename = "a.wav".to_string();
        source.attach_instance(&mut services, &Vec3::zeros());
        source.reset(&mut services);

        assert_eq!(source.instance, None);
        assert!(source.source_filename.is_empty());
        assert_eq!(source.base.id, 2);
    }
}
