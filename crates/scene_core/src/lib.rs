//! # Scene Core
//!
//! A scene-graph runtime for a small 3D game.
//!
//! ## Features
//!
//! - **Tagged values and key/value stores**: typed entity properties with text forms
//! - **Object-text files**: block-structured entity and scene files
//! - **Bounding volumes**: box, sphere, ray and frustum tests
//! - **Transform hierarchy**: parent/child transforms with eager world matrices
//! - **Entity arenas**: fixed-capacity generational storage per entity kind
//! - **Scene persistence**: load and save scenes, archetypes and entity files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut ctx = SceneContext::headless(RuntimeConfig::default());
//!     let mut scene = Scene::new(&ctx.config);
//!     scene.init(&mut ctx);
//!
//!     let _sun = scene.light_create("Sun", None, LightType::Directional);
//!     scene.post_update(&mut ctx);
//!     scene.save(&mut ctx, "level_1", DirectoryType::User)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod scene;
pub mod serialization;
pub mod spatial;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        config::{Config, DirectoryType, RuntimeConfig},
        events::{Event, EventArg, EventManager, EventType},
        foundation::math::{Mat4, Quat, Vec3, Vec4},
        scene::{
            kinds::{EnemyType, LightType, PickupType, PlayerInput, TriggerMask, TriggerType},
            Entity, EntityFlags, EntityHandle, EntityType, GameMode, RayMask, Scene, SceneContext,
            SceneError, TransformHierarchy, TransformSpace,
        },
        serialization::{KeyValueStore, Value, ValueKind},
        spatial::{BoundingBox, Ray},
    };
}
