//! Scene graph
//!
//! Entities live in fixed-capacity per-kind arenas owned by a [`Scene`].
//! Hierarchy edges are generational [`EntityHandle`]s, so a handle to a
//! removed entity simply stops resolving. Everything outside the arenas
//! (config, events, collaborators, hooks) comes in through a
//! [`SceneContext`].

pub mod arena;
pub mod context;
pub mod entity;
pub mod error;
pub mod kinds;
pub mod scene_graph;
pub mod services;
pub mod transform;

mod persistence;
mod queries;
mod simulation;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use context::{
    EntityHandlerFactory, GameMode, SceneContext, SceneHook, DEFAULT_CLEANUP_HOOK, DEFAULT_INIT_HOOK,
};
pub use entity::{Entity, EntityFlags, EntityHandle, EntityType, RayMask, MAX_ENTITY_NAME_LEN};
pub use error::{SceneError, SceneResult};
pub use scene_graph::{
    FogMode, FogSettings, RenderSettings, Scene, EDITOR_CAMERA_NAME, PLAYER_NAME, ROOT_ENTITY_NAME,
    ROOT_ID,
};
pub use services::Services;
pub use transform::{Transform, TransformHierarchy, TransformSpace};
