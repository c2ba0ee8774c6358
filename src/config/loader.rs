// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::Result;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; defaults are applied by `serde`
/// and the `Default` impls in [`model`](crate::config::model).
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load configuration, tolerating a missing default file.
///
/// - If `path` is given, the file must exist and parse.
/// - If not, `Fanout.toml` in the current directory is used when present;
///   otherwise built-in defaults apply.
pub fn load_or_default(path: Option<&str>) -> Result<ConfigFile> {
    match path {
        Some(p) => load_from_path(p),
        None => {
            let default = default_config_path();
            if default.is_file() {
                load_from_path(default)
            } else {
                debug!("no config file found; using built-in defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Default config path: `Fanout.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Fanout.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nworkers = 6\nmax_retries = 1").unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.scheduler.workers, Some(6));
        assert_eq!(cfg.scheduler.max_retries, 1);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_or_default(Some("/does/not/exist.toml")).is_err());
    }
}
