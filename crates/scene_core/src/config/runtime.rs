//! Runtime configuration for the scene core
//!
//! Arena capacities, file locations, event limits and gameplay tunables.
//! Every section has defaults so partial TOML/RON files load cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError};

/// Base directory selector for scene and entity files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectoryType {
    /// Read-only assets shipped with the game
    Install,
    /// Per-user writable data
    User,
}

/// Fixed capacity of every entity arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaCapacities {
    /// Plain entities
    pub entities: usize,
    /// Lights
    pub lights: usize,
    /// Cameras, including the editor camera and the player camera
    pub cameras: usize,
    /// Static meshes
    pub static_meshes: usize,
    /// Sound sources
    pub sound_sources: usize,
    /// Enemies
    pub enemies: usize,
    /// Triggers
    pub triggers: usize,
    /// Doors
    pub doors: usize,
    /// Pickups
    pub pickups: usize,
    /// Archetype filenames registered per scene
    pub archetypes: usize,
    /// Maximum hits collected by a single ray query
    pub raycast_results: usize,
}

impl Default for ArenaCapacities {
    fn default() -> Self {
        Self {
            entities: 32,
            lights: 30,
            cameras: 2,
            static_meshes: 1024,
            sound_sources: 128,
            enemies: 64,
            triggers: 64,
            doors: 32,
            pickups: 64,
            archetypes: 32,
            raycast_results: 256,
        }
    }
}

impl ArenaCapacities {
    /// Validate capacities
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("entities", self.entities),
            ("lights", self.lights),
            ("static_meshes", self.static_meshes),
            ("sound_sources", self.sound_sources),
            ("enemies", self.enemies),
            ("triggers", self.triggers),
            ("doors", self.doors),
            ("pickups", self.pickups),
            ("archetypes", self.archetypes),
            ("raycast_results", self.raycast_results),
        ];
        if let Some((name, _)) = named.iter().find(|(_, capacity)| *capacity == 0) {
            return Err(format!("Capacity '{name}' must be at least 1"));
        }

        // Editor camera plus the player camera
        if self.cameras < 2 {
            return Err("Capacity 'cameras' must be at least 2".to_string());
        }
        Ok(())
    }
}

/// File locations for scenes and entity archetypes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Base directory for [`DirectoryType::Install`]
    pub install_dir: PathBuf,
    /// Base directory for [`DirectoryType::User`]
    pub user_dir: PathBuf,
    /// Sub-directory holding entity files
    pub entities_dir: String,
    /// Sub-directory holding scene files
    pub scenes_dir: String,
    /// Extension appended to entity and scene names
    pub extension: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("assets"),
            user_dir: PathBuf::from("user"),
            entities_dir: "entities".to_string(),
            scenes_dir: "scenes".to_string(),
            extension: "symtres".to_string(),
        }
    }
}

impl PathConfig {
    /// Create a path config rooted at the given install and user directories
    pub fn new(install_dir: impl Into<PathBuf>, user_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            user_dir: user_dir.into(),
            ..Default::default()
        }
    }

    /// Base directory for a directory type
    pub fn base_dir(&self, directory: DirectoryType) -> &Path {
        match directory {
            DirectoryType::Install => &self.install_dir,
            DirectoryType::User => &self.user_dir,
        }
    }

    /// Full path of an entity file, `<base>/entities/<name>.<ext>`
    pub fn entity_path(&self, name: &str, directory: DirectoryType) -> PathBuf {
        self.resolve(&self.entities_dir, name, directory)
    }

    /// Full path of a scene file, `<base>/scenes/<name>.<ext>`
    pub fn scene_path(&self, name: &str, directory: DirectoryType) -> PathBuf {
        self.resolve(&self.scenes_dir, name, directory)
    }

    fn resolve(&self, sub_dir: &str, name: &str, directory: DirectoryType) -> PathBuf {
        let mut path = self.base_dir(directory).join(sub_dir).join(name);
        if path.extension().map_or(true, |ext| ext != self.extension.as_str()) {
            path.as_mut_os_string().push(format!(".{}", self.extension));
        }
        path
    }

    /// Validate paths
    pub fn validate(&self) -> Result<(), String> {
        if self.extension.is_empty() {
            return Err("File extension cannot be empty".to_string());
        }
        if self.extension.starts_with('.') {
            return Err("File extension must not start with '.'".to_string());
        }
        Ok(())
    }
}

/// Limits for the event manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLimits {
    /// Events that can wait in the queue between dispatches
    pub max_events: usize,
    /// Concurrent subscriptions
    pub max_subscriptions: usize,
}

impl Default for EventLimits {
    fn default() -> Self {
        Self {
            max_events: 128,
            max_subscriptions: 2048,
        }
    }
}

/// Player movement tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Units per second
    pub move_speed: f32,
    /// Multiplier applied while sprinting
    pub move_speed_multiplier: f32,
    /// Degrees per second
    pub turn_speed: f32,
    /// Initial upward speed of a jump
    pub jump_speed: f32,
    /// Downward acceleration
    pub gravity: f32,
    /// Ground probe distance
    pub min_downward_distance: f32,
    /// Wall probe distance
    pub min_forward_distance: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            move_speed_multiplier: 2.0,
            turn_speed: 50.0,
            jump_speed: 50.0,
            gravity: -50.0,
            min_downward_distance: 1.0,
            min_forward_distance: 1.0,
        }
    }
}

/// Drawable size used to derive camera aspect ratios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Arena capacities
    pub capacities: ArenaCapacities,
    /// File locations
    pub paths: PathConfig,
    /// Event manager limits
    pub events: EventLimits,
    /// Player tunables
    pub player: PlayerConfig,
    /// Viewport size
    pub viewport: ViewportConfig,
}

impl Config for RuntimeConfig {}

impl RuntimeConfig {
    /// Replace the file locations
    pub fn with_paths(mut self, paths: PathConfig) -> Self {
        self.paths = paths;
        self
    }

    /// Replace the arena capacities
    pub fn with_capacities(mut self, capacities: ArenaCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    /// Load from file and validate
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.capacities.validate()?;
        self.paths.validate()?;

        if self.events.max_events == 0 || self.events.max_subscriptions == 0 {
            return Err("Event limits must be at least 1".to_string());
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err("Viewport dimensions must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scene_core_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir.join(name)
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = RuntimeConfig::default();
        config.capacities.lights = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("lights"));
    }

    #[test]
    fn test_camera_capacity_needs_room_for_builtin_cameras() {
        let mut config = RuntimeConfig::default();
        config.capacities.cameras = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_entity_path_appends_extension_once() {
        let paths = PathConfig::new("install", "user");
        assert_eq!(
            paths.entity_path("door", DirectoryType::Install),
            PathBuf::from("install").join("entities").join("door.symtres")
        );
        assert_eq!(
            paths.scene_path("level.symtres", DirectoryType::User),
            PathBuf::from("user").join("scenes").join("level.symtres")
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_file("runtime.toml");
        let mut config = RuntimeConfig::default();
        config.capacities.entities = 8;
        config.player.move_speed = 3.5;

        config.save_to_file(path.to_str().unwrap()).unwrap();
        let loaded = RuntimeConfig::load_validated(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_ron_round_trip() {
        let path = temp_file("runtime.ron");
        let config = RuntimeConfig::default().with_paths(PathConfig::new("a", "b"));

        config.save_to_file(path.to_str().unwrap()).unwrap();
        let loaded = RuntimeConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.paths, config.paths);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RuntimeConfig = toml::from_str("[capacities]\nentities = 4\n").unwrap();
        assert_eq!(config.capacities.entities, 4);
        assert_eq!(config.capacities.lights, 30);
        assert_eq!(config.paths.extension, "symtres");
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_file("runtime.json");
        let result = RuntimeConfig::default().save_to_file(path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }
}
