pub mod analyze;
pub mod config;
pub mod explain;
pub mod feedback;
pub mod guide;
pub mod recommend;
pub mod rules;
pub mod scenarios;
pub mod simulate;
pub mod tree;

use anyhow::Context;
use router_core::config::RoutingConfig;
use router_core::engine::RoutingEngine;
use router_core::paths;
use std::path::Path;

/// Resolved locations shared by the commands that need a project.
pub struct Workspace<'a> {
    pub root: &'a Path,
    pub framework: &'a Path,
}

impl Workspace<'_> {
    /// Engine for this project with any saved learning state applied.
    pub fn engine(&self) -> anyhow::Result<RoutingEngine> {
        let config = RoutingConfig::load(self.root).context("failed to load config")?;
        let mut engine = RoutingEngine::new(self.framework, self.root, config);
        engine.load_model(&paths::model_path(self.root));
        Ok(engine)
    }
}
