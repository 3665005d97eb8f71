//! Explicit runtime context
//!
//! Everything the scene needs beyond its own arenas is passed in through a
//! [`SceneContext`]: configuration, the event manager, collaborator services
//! and the registry of named scene hooks.

use std::collections::HashMap;

use log::{info, warn};

use super::entity::{EntityHandle, EntityType};
use super::scene_graph::Scene;
use super::services::Services;
use crate::config::RuntimeConfig;
use crate::events::{EventHandler, EventManager, EventType};

/// Hook run when a scene starts or is torn down
pub type SceneHook = fn(&mut Scene, &mut SceneContext);

/// Name of the hook run when a scene config names none
pub const DEFAULT_INIT_HOOK: &str = "scene_init_stub";

/// Name of the cleanup hook run when a scene config names none
pub const DEFAULT_CLEANUP_HOOK: &str = "scene_cleanup_stub";

/// Which camera drives the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    /// Player camera
    #[default]
    Game,
    /// Editor camera
    Editor,
}

/// Builds the handler a newly created entity subscribes with
pub type EntityHandlerFactory = Box<dyn Fn(EntityHandle) -> Box<dyn EventHandler>>;

struct EntityHandlerEntry {
    kind: EntityType,
    event_type: EventType,
    factory: EntityHandlerFactory,
}

impl std::fmt::Debug for EntityHandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandlerEntry")
            .field("kind", &self.kind)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

fn init_stub(_scene: &mut Scene, _ctx: &mut SceneContext) {
    info!("Scene init stub called");
}

fn cleanup_stub(_scene: &mut Scene, _ctx: &mut SceneContext) {
    info!("Scene cleanup stub called");
}

/// State shared by every scene entry point
#[derive(Debug)]
pub struct SceneContext {
    /// Runtime configuration
    pub config: RuntimeConfig,
    /// Event manager
    pub events: EventManager,
    /// Geometry, physics and sound collaborators
    pub services: Services,
    /// Active camera selection
    pub game_mode: GameMode,
    hooks: HashMap<String, SceneHook>,
    entity_handlers: Vec<EntityHandlerEntry>,
}

impl SceneContext {
    /// Context with the given config and services
    pub fn new(config: RuntimeConfig, services: Services) -> Self {
        let events = EventManager::with_limits(config.events.clone());
        let mut ctx = Self {
            config,
            events,
            services,
            game_mode: GameMode::Game,
            hooks: HashMap::new(),
            entity_handlers: Vec::new(),
        };
        ctx.register_hook(DEFAULT_INIT_HOOK, init_stub);
        ctx.register_hook(DEFAULT_CLEANUP_HOOK, cleanup_stub);
        ctx
    }

    /// Context with null collaborators
    pub fn headless(config: RuntimeConfig) -> Self {
        Self::new(config, Services::null())
    }

    /// Register `hook` under `name`, replacing any previous one
    pub fn register_hook(&mut self, name: &str, hook: SceneHook) {
        if self.hooks.insert(name.to_string(), hook).is_some() {
            warn!("Scene hook '{name}' replaced");
        }
    }

    /// Hook registered under `name`
    pub fn hook(&self, name: &str) -> Option<SceneHook> {
        self.hooks.get(name).copied()
    }

    /// Subscribe every future entity of `kind` to `event_type`
    ///
    /// `factory` builds the handler for each entity as it is created. The
    /// subscription is owned by the entity and dropped when it is removed.
    pub fn register_entity_handler(
        &mut self,
        kind: EntityType,
        event_type: EventType,
        factory: EntityHandlerFactory,
    ) {
        self.entity_handlers.push(EntityHandlerEntry {
            kind,
            event_type,
            factory,
        });
    }

    /// Subscribe `handle` with the handlers registered for its kind
    pub(crate) fn entity_subscribe(&mut self, handle: EntityHandle) {
        for entry in self.entity_handlers.iter().filter(|entry| entry.kind == handle.kind) {
            let handler = (entry.factory)(handle);
            if self
                .events
                .subscribe_filtered(entry.event_type, Some(handle), None, handler)
                .is_none()
            {
                warn!("Entity {handle:?} could not subscribe to {:?}", entry.event_type);
            }
        }
    }

    /// Whether a hook is registered under `name`
    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::headless(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(_scene: &mut Scene, _ctx: &mut SceneContext) {}

    #[test]
    fn test_default_hooks_registered() {
        let ctx = SceneContext::default();
        assert!(ctx.has_hook(DEFAULT_INIT_HOOK));
        assert!(ctx.has_hook(DEFAULT_CLEANUP_HOOK));
        assert!(ctx.hook("level_1_init").is_none());
    }

    #[test]
    fn test_register_custom_hook() {
        let mut ctx = SceneContext::default();
        ctx.register_hook("level_1_init", custom);
        assert!(ctx.hook("level_1_init").is_some());
    }
}
