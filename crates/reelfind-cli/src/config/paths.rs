//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// File name inside a config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming the config file directly.
const CONFIG_PATH_ENV: &str = "REELFIND_CONFIG";

/// Resolves the config file path, first match wins:
///
/// 1. `{dir}/config.toml` when `--dir` is given
/// 2. `$REELFIND_CONFIG`
/// 3. `$XDG_CONFIG_HOME/reelfind/config.toml`
/// 4. `$HOME/.config/reelfind/config.toml`
///
/// Blank variables count as unset.
///
/// # Errors
///
/// Returns an error if none of the above yields a location.
pub fn resolve_config_path<F>(dir: Option<&Path>, env: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }

    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    if let Some(file) = var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(file));
    }

    let base = match (var("XDG_CONFIG_HOME"), var("HOME")) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => PathBuf::from(home).join(".config"),
        (None, None) => {
            bail!("cannot locate config: set HOME, XDG_CONFIG_HOME or {CONFIG_PATH_ENV}")
        }
    };
    Ok(base.join("reelfind").join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_dir_wins_over_env() {
        // Arrange
        let env = env_of(&[(CONFIG_PATH_ENV, "/etc/reelfind.toml"), ("HOME", "/home/u")]);

        // Act
        let path = resolve_config_path(Some(Path::new("/srv/reelfind")), env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/srv/reelfind/config.toml"));
    }

    #[test]
    fn test_explicit_file_from_env() {
        // Arrange
        let env = env_of(&[(CONFIG_PATH_ENV, "/etc/reelfind.toml"), ("HOME", "/home/u")]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/etc/reelfind.toml"));
    }

    #[test]
    fn test_xdg_config_home_before_home() {
        // Arrange
        let env = env_of(&[("XDG_CONFIG_HOME", "/home/u/.cfg"), ("HOME", "/home/u")]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.cfg/reelfind/config.toml"));
    }

    #[test]
    fn test_blank_vars_fall_through_to_home() {
        // Arrange
        let env = env_of(&[
            (CONFIG_PATH_ENV, "  "),
            ("XDG_CONFIG_HOME", ""),
            ("HOME", "/home/u"),
        ]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.config/reelfind/config.toml"));
    }

    #[test]
    fn test_no_location_is_an_error() {
        // Arrange & Act
        let err = resolve_config_path(None, env_of(&[])).unwrap_err();

        // Assert
        assert!(err.to_string().contains("cannot locate config"));
    }
}
