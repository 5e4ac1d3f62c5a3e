//! Service configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{LecternError, LecternResult};

/// Prefix for environment variables overriding file settings,
/// e.g. `LECTERN_ARCHIVE_DIR`.
const ENV_PREFIX: &str = "LECTERN";

/// Configuration read from `config.toml` (or `config.json`).
///
/// All keys are required. Relative paths are resolved against the directory
/// containing the config file and always come out absolute.
#[derive(Deserialize, Clone, Debug)]
pub struct LecternConfig {
    /// Directory holding one subdirectory per event.
    pub archive_dir: PathBuf,

    /// Service log file.
    pub log: PathBuf,

    /// Shell command receiving uploaded video on stdin.
    pub streaming_command: String,

    /// Shell command used instead when a client asks for `testOnly=true`.
    pub test_command: String,
}

impl LecternConfig {
    /// Default location: ~/.config/lectern/config.toml
    pub fn default_path() -> LecternResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LecternError::Config("Could not determine config directory".into()))?
            .join("lectern");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> LecternResult<Self> {
        if !path.exists() {
            return Err(LecternError::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }

        let config: LecternConfig = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| LecternError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| LecternError::Config(e.to_string()))?;

        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let base = std::path::absolute(base).map_err(|e| LecternError::Config(e.to_string()))?;
        Ok(config.resolved_against(&base))
    }

    fn resolved_against(self, base: &Path) -> Self {
        LecternConfig {
            archive_dir: resolve(base, &self.archive_dir),
            log: resolve(base, &self.log),
            ..self
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resolves_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
archive_dir = "archive"
log = "/var/log/lectern.log"
streaming_command = "ffmpeg -i - -c copy \"$talk_filename\""
test_command = "cat > /dev/null"
"#,
        )
        .unwrap();

        let config = LecternConfig::load(&path).unwrap();
        assert_eq!(config.archive_dir, tmp.path().join("archive"));
        assert_eq!(config.log, PathBuf::from("/var/log/lectern.log"));
        assert_eq!(config.test_command, "cat > /dev/null");
    }

    #[test]
    fn test_load_relative_config_path_gives_absolute_paths() {
        let tmp = tempfile::tempdir_in(".").unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "archive_dir = \"archive\"\nlog = \"lectern.log\"\nstreaming_command = \"s\"\ntest_command = \"t\"\n",
        )
        .unwrap();

        let relative = PathBuf::from(tmp.path().file_name().unwrap()).join("config.toml");
        let config = LecternConfig::load(&relative).unwrap();
        assert!(config.archive_dir.is_absolute());
        assert!(config.archive_dir.ends_with("archive"));
        assert!(config.log.is_absolute());
    }

    #[test]
    fn test_load_json_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"archive_dir": "a", "log": "l.log", "streaming_command": "s", "test_command": "t"}"#,
        )
        .unwrap();

        let config = LecternConfig::load(&path).unwrap();
        assert_eq!(config.streaming_command, "s");
        assert_eq!(config.log, tmp.path().join("l.log"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "archive_dir = \"archive\"\nlog = \"x.log\"\n").unwrap();

        assert!(matches!(LecternConfig::load(&path), Err(LecternError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = LecternConfig::load(&tmp.path().join("config.toml"));
        assert!(matches!(result, Err(LecternError::Config(_))));
    }
}
