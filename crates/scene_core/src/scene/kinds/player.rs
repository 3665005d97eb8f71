//! Player payload

use super::{scene_object, Duplicable, Resettable, Serializable};
use crate::config::PlayerConfig;
use crate::foundation::math::Vec3;
use crate::scene::services::Services;
use crate::scene::{Entity, EntityHandle, EntityType};
use crate::serialization::KeyValueStore;

/// Id the player always occupies
pub const PLAYER_ID: usize = 1;

/// Movement intent sampled once per update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInput {
    /// Move along -Z
    pub forward: bool,
    /// Move along +Z
    pub backward: bool,
    /// Move along -X
    pub left: bool,
    /// Move along +X
    pub right: bool,
    /// Apply the speed multiplier
    pub sprint: bool,
    /// Start a jump when grounded
    pub jump: bool,
    /// Yaw input, -1 turns right and 1 turns left
    pub turn: f32,
}

impl PlayerInput {
    /// Local-space horizontal direction of the requested move, unscaled
    pub fn direction(&self) -> Vec3 {
        let axis = |negative: bool, positive: bool| {
            f32::from(u8::from(positive)) - f32::from(u8::from(negative))
        };
        Vec3::new(axis(self.left, self.right), 0.0, axis(self.forward, self.backward))
    }
}

/// The player character
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Base entity
    pub base: Entity,
    /// Units per second
    pub move_speed: f32,
    /// Applied while sprinting
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
    /// Standing on something
    pub grounded: bool,
    /// Current vertical speed
    pub vertical_velocity: f32,
    /// Transient `Player_Mesh` child
    pub mesh: Option<EntityHandle>,
    /// Game camera, renamed `Player_Camera`
    pub camera: Option<EntityHandle>,
    /// Transient `Player_Weapon_Sound` child
    pub weapon_sound: Option<EntityHandle>,
}

scene_object!(Player, EntityType::Player);

impl Player {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self::from_config(base, &PlayerConfig::default())
    }

    fn from_config(base: Entity, config: &PlayerConfig) -> Self {
        Self {
            base,
            move_speed: config.move_speed,
            move_speed_multiplier: config.move_speed_multiplier,
            turn_speed: config.turn_speed,
            jump_speed: config.jump_speed,
            gravity: config.gravity,
            min_downward_distance: config.min_downward_distance,
            min_forward_distance: config.min_forward_distance,
            grounded: true,
            vertical_velocity: 0.0,
            mesh: None,
            camera: None,
            weapon_sound: None,
        }
    }

    /// Take tunables from config
    pub fn apply_config(&mut self, config: &PlayerConfig) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Player, PLAYER_ID));
        *self = Self::from_config(base, config);
    }

    /// Horizontal speed for this input
    pub fn speed_for(&self, input: &PlayerInput) -> f32 {
        if input.sprint {
            self.move_speed * self.move_speed_multiplier
        } else {
            self.move_speed
        }
    }
}

impl Serializable for Player {
    const KEYS: &'static [&'static str] = &[
        "player_move_speed",
        "player_move_speed_multiplier",
        "player_turn_speed",
        "player_jump_speed",
        "player_gravity",
    ];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("player_move_speed", self.move_speed);
        data.set("player_move_speed_multiplier", self.move_speed_multiplier);
        data.set("player_turn_speed", self.turn_speed);
        data.set("player_jump_speed", self.jump_speed);
        data.set("player_gravity", self.gravity);
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        data.read_into("player_move_speed", &mut self.move_speed);
        data.read_into("player_move_speed_multiplier", &mut self.move_speed_multiplier);
        data.read_into("player_turn_speed", &mut self.turn_speed);
        data.read_into("player_jump_speed", &mut self.jump_speed);
        data.read_into("player_gravity", &mut self.gravity);
    }
}

impl Duplicable for Player {
    fn duplicate_from(&mut self, source: &Self) {
        self.move_speed = source.move_speed;
        self.move_speed_multiplier = source.move_speed_multiplier;
        self.turn_speed = source.turn_speed;
        self.jump_speed = source.jump_speed;
        self.gravity = source.gravity;
    }
}

impl Resettable for Player {
    fn reset(&mut self, _services: &mut Services) {
        self.mesh = None;
        self.camera = None;
        self.weapon_sound = None;
        self.grounded = true;
        self.vertical_velocity = 0.0;
    }
}
