//! Scenario tests that drive a whole scene

mod persistence;

use std::path::PathBuf;

use super::{Scene, SceneContext};
use crate::config::{PathConfig, RuntimeConfig};
use crate::foundation::logging;

/// Initialised scene with null collaborators
pub(super) fn setup() -> (Scene, SceneContext) {
    setup_with(RuntimeConfig::default())
}

pub(super) fn setup_with(config: RuntimeConfig) -> (Scene, SceneContext) {
    logging::init_for_tests();
    let mut ctx = SceneContext::headless(config);
    let mut scene = Scene::new(&ctx.config);
    scene.init(&mut ctx);
    (scene, ctx)
}

/// Install and user directories under a unique temp root, removed on drop
pub(super) struct TempDirs {
    root: PathBuf,
}

impl TempDirs {
    pub(super) fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("scene_core_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        Self { root }
    }

    pub(super) fn config(&self) -> RuntimeConfig {
        RuntimeConfig::default().with_paths(PathConfig::new(self.root.join("install"), self.root.join("user")))
    }
}

impl Drop for TempDirs {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
