//! Enemy payload

use super::{read_tag, scene_object, Duplicable, Resettable, Serializable};
use crate::scene::services::Services;
use crate::scene::{Entity, EntityHandle, EntityType};
use crate::serialization::KeyValueStore;

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnemyType {
    /// Stationary gun that turns toward the player
    #[default]
    Turret,
}

impl EnemyType {
    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Turret),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Turret => 0,
        }
    }

    /// Geometry of the mesh child
    pub const fn mesh_geometry(self) -> &'static str {
        match self {
            Self::Turret => "suzanne.symbres",
        }
    }

    /// Audio file of the weapon sound child
    pub const fn weapon_sound(self) -> &'static str {
        match self {
            Self::Turret => "sounds/bullet_1.wav",
        }
    }
}

/// Hostile entity
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    /// Base entity
    pub base: Entity,
    /// Variant
    pub enemy_type: EnemyType,
    /// Remaining health
    pub health: i32,
    /// Damage per hit
    pub damage: i32,
    /// Turret turn rate in degrees per second
    pub turn_speed: f32,
    /// Transient `<name>_Mesh` child
    pub mesh: Option<EntityHandle>,
    /// Transient `<name>_Weapon_Sound` child
    pub weapon_sound: Option<EntityHandle>,
}

scene_object!(Enemy, EntityType::Enemy);

impl Enemy {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            enemy_type: EnemyType::Turret,
            health: 0,
            damage: 0,
            turn_speed: 0.0,
            mesh: None,
            weapon_sound: None,
        }
    }

    /// Apply the variant's starting stats
    pub fn init(&mut self, enemy_type: EnemyType) {
        self.enemy_type = enemy_type;
        match enemy_type {
            EnemyType::Turret => {
                self.turn_speed = 10.0;
                self.health = 100;
                self.damage = 10;
            }
        }
    }

    /// Name of the mesh child
    pub fn mesh_name(&self) -> String {
        format!("{}_Mesh", self.base.name)
    }

    /// Name of the weapon sound child
    pub fn weapon_sound_name(&self) -> String {
        format!("{}_Weapon_Sound", self.base.name)
    }
}

impl Serializable for Enemy {
    const KEYS: &'static [&'static str] = &["enemy_type", "health", "damage", "turn_speed"];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("enemy_type", self.enemy_type.as_i32());
        data.set("health", self.health);
        data.set("damage", self.damage);
        match self.enemy_type {
            EnemyType::Turret => data.set("turn_speed", self.turn_speed),
        }
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        read_tag(data, "enemy_type", &mut self.enemy_type, EnemyType::from_i32);
        data.read_into("health", &mut self.health);
        data.read_into("damage", &mut self.damage);
        match self.enemy_type {
            EnemyType::Turret => {
                data.read_into("turn_speed", &mut self.turn_speed);
            }
        }
    }
}

impl Duplicable for Enemy {
    fn duplicate_from(&mut self, source: &Self) {
        self.enemy_type = source.enemy_type;
        self.health = source.health;
        self.damage = source.damage;
        self.turn_speed = source.turn_speed;
    }
}

impl Resettable for Enemy {
    fn reset(&mut self, _services: &mut Services) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Enemy, 0));
        *self = Self::with_base(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::kinds::SceneObject;

    #[test]
    fn test_turret_stats() {
        let mut enemy = Enemy::new_slot(0);
        enemy.base.rename("Turret_A");
        enemy.init(EnemyType::Turret);

        assert_eq!(enemy.health, 100);
        assert_eq!(enemy.damage, 10);
        assert_eq!(enemy.mesh_name(), "Turret_A_Mesh");
        assert_eq!(enemy.weapon_sound_name(), "Turret_A_Weapon_Sound");
    }

    #[test]
    fn test_read_overrides_stats() {
        let mut data = KeyValueStore::new();
        data.set("enemy_type", "0");
        data.set("health", "35");
        data.set("turn_speed", "4.5");

        let mut enemy = Enemy::new_slot(0);
        enemy.init(EnemyType::Turret);
        enemy.read_fields(&data);
        assert_eq!(enemy.health, 35);
        assert_eq!(enemy.damage, 10);
        assert!((enemy.turn_speed - 4.5).abs() < f32::EPSILON);
    }
}
