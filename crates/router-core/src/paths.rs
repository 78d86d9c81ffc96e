use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ROUTER_DIR: &str = ".router";
pub const CONFIG_FILE: &str = ".router/config.yaml";
pub const MODEL_FILE: &str = ".router/model.json";

/// Default framework directory, relative to the project root.
pub const FRAMEWORK_DIR: &str = ".claude";
/// Command templates live here, relative to the framework directory.
pub const COMMANDS_DIR: &str = "commands";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn model_path(root: &Path) -> PathBuf {
    root.join(MODEL_FILE)
}

pub fn default_framework_dir(root: &Path) -> PathBuf {
    root.join(FRAMEWORK_DIR)
}

pub fn commands_dir(framework: &Path) -> PathBuf {
    framework.join(COMMANDS_DIR)
}
