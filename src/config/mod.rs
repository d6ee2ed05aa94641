//! Configuration file parsing for settle
//!
//! Supports:
//! - `.settle/config.toml` - Retry policy and log source settings

pub mod settings;
pub mod types;

pub use settings::{init_config_dir, load_settings, CONFIG_FILENAME, SETTLE_DIR};
pub use types::*;
