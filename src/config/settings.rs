//! Settings parser for .settle/config.toml

use super::types::Settings;
use settle_core::prelude::*;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const SETTLE_DIR: &str = ".settle";

/// Load settings from `.settle/config.toml`
///
/// Missing, unreadable or malformed files fall back to defaults.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = project_path.join(SETTLE_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create a default config file in the .settle/ directory
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let settle_dir = project_path.join(SETTLE_DIR);

    if !settle_dir.exists() {
        std::fs::create_dir_all(&settle_dir)
            .map_err(|e| Error::config(format!("Failed to create .settle dir: {}", e)))?;
    }

    let config_path = settle_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# settle configuration

[poll]
# Maximum number of fetch/evaluate attempts
max_attempts = 5
# Wait between attempts, in milliseconds
interval_ms = 1000

[source]
# "command" runs a program and reads its stdout; "file" re-reads a log file
kind = "command"
program = "adb"
args = ["logcat", "-v", "brief", "-d"]
# "logcat" appends TAG:I filter specs; "client" filters output locally
filter = "logcat"
# Command used to write separators (tag and token are appended)
mark_args = ["shell", "log", "-t"]
# path = "device.log"
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{PollSettings, SourceKind};
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(dir.path());
        assert_eq!(settings.poll, PollSettings::default());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(SETTLE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(SETTLE_DIR).join(CONFIG_FILENAME),
            r#"
[poll]
max_attempts = 10
interval_ms = 200

[source]
kind = "file"
path = "device.log"
"#,
        )
        .unwrap();

        let settings = load_settings(dir.path());
        assert_eq!(settings.poll.max_attempts, 10);
        assert_eq!(settings.poll.interval_ms, 200);
        assert_eq!(settings.source.kind, SourceKind::File);
    }

    #[test]
    fn test_malformed_config_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(SETTLE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(SETTLE_DIR).join(CONFIG_FILENAME),
            "[poll\nmax_attempts = ",
        )
        .unwrap();

        let settings = load_settings(dir.path());
        assert_eq!(settings.poll, PollSettings::default());
    }

    #[test]
    fn test_init_config_dir_writes_loadable_defaults() {
        let dir = tempdir().unwrap();
        init_config_dir(dir.path()).unwrap();

        let path = dir.path().join(SETTLE_DIR).join(CONFIG_FILENAME);
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Settings = toml::from_str(&content).unwrap();
        assert_eq!(parsed.poll, PollSettings::default());
        assert_eq!(parsed.source, crate::config::SourceSettings::default());
    }

    #[test]
    fn test_init_config_dir_keeps_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(SETTLE_DIR)).unwrap();
        let path = dir.path().join(SETTLE_DIR).join(CONFIG_FILENAME);
        std::fs::write(&path, "[poll]\nmax_attempts = 2\n").unwrap();

        init_config_dir(dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[poll]\nmax_attempts = 2\n"
        );
    }
}
