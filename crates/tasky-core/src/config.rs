use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::DEFAULT_COMMENT_MARKER;
use crate::coerce::Coercer;

pub const DEFAULT_ACTOR: &str = "Anonymous";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskyConfig {
    /// Directory holding `tasks.json`, relative to the config file's directory.
    pub root_dir: Option<String>,
    /// Name recorded on created tasks and mutation events.
    pub actor: Option<String>,
    /// Editor command used to capture descriptions (split like a shell would).
    pub editor: Option<String>,
    /// Year that abbreviated `DDMM` due dates resolve into.
    /// Unset means the current calendar year.
    pub reference_year: Option<i32>,
    pub comment_marker: Option<String>,
}

impl TaskyConfig {
    /// Fields set in `self` win over `fallback`.
    pub fn merged_over(self, fallback: TaskyConfig) -> TaskyConfig {
        TaskyConfig {
            root_dir: self.root_dir.or(fallback.root_dir),
            actor: self.actor.or(fallback.actor),
            editor: self.editor.or(fallback.editor),
            reference_year: self.reference_year.or(fallback.reference_year),
            comment_marker: self.comment_marker.or(fallback.comment_marker),
        }
    }
}

/// Project config names checked in each directory, first match wins.
const PROJECT_CONFIG_NAMES: [&str; 2] = [".tasky.toml", ".taskyrc"];
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// A parsed config file and the directory its relative paths resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub base: PathBuf,
    pub config: TaskyConfig,
}

impl LoadedConfig {
    fn root_dir(&self) -> Option<PathBuf> {
        self.config.root_dir.as_ref().map(|dir| self.base.join(dir))
    }
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    non_empty_env("HOME")
        .or_else(|| non_empty_env("USERPROFILE"))
        .map(PathBuf::from)
}

pub fn resolve_tasky_home_dir() -> Option<PathBuf> {
    non_empty_env("TASKY_HOME")
        .map(PathBuf::from)
        .or_else(|| resolve_user_home_dir().map(|home| home.join(".tasky")))
}

fn read_config(path: &Path) -> Result<TaskyConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// Reads the project config kept directly in `dir`, if any.
pub fn load_config(dir: &Path) -> Result<Option<TaskyConfig>, ConfigError> {
    PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .map(|path| read_config(&path))
        .transpose()
}

/// Nearest project config in `start` or one of its ancestors.
pub fn discover_project_config(start: &Path) -> Result<Option<LoadedConfig>, ConfigError> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    for dir in start.ancestors() {
        if let Some(config) = load_config(dir)? {
            return Ok(Some(LoadedConfig {
                base: dir.to_path_buf(),
                config,
            }));
        }
    }
    Ok(None)
}

/// `config.toml` in the tasky home. Its `root_dir` is relative to that home.
pub fn load_global_config() -> Result<Option<LoadedConfig>, ConfigError> {
    let Some(home) = resolve_tasky_home_dir() else {
        return Ok(None);
    };
    let path = home.join(GLOBAL_CONFIG_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(LoadedConfig {
        config: read_config(&path)?,
        base: home,
    }))
}

/// Saves `config` as `.tasky.toml` in `dir`.
pub fn write_config(dir: &Path, config: &TaskyConfig) -> Result<PathBuf, ConfigError> {
    let path = dir.join(PROJECT_CONFIG_NAMES[0]);
    fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}

/// Command-line values that take precedence over any config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub actor: Option<String>,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub root: PathBuf,
    pub actor: String,
    pub editor: Option<String>,
    pub reference_year: Option<i32>,
    pub comment_marker: String,
}

impl Settings {
    /// Flags, then `TASKY_USER`, then project config, then global config,
    /// then built-in defaults.
    pub fn resolve(start: &Path, overrides: Overrides) -> Result<Settings, ConfigError> {
        let project = discover_project_config(start)?;
        let global = load_global_config()?;

        let root = overrides
            .root
            .or_else(|| project.as_ref().and_then(LoadedConfig::root_dir))
            .or_else(|| global.as_ref().and_then(LoadedConfig::root_dir))
            .or_else(resolve_tasky_home_dir)
            .unwrap_or_else(|| start.join(".tasky"));

        let config = project
            .map(|loaded| loaded.config)
            .unwrap_or_default()
            .merged_over(global.map(|loaded| loaded.config).unwrap_or_default());

        let actor = overrides
            .actor
            .or_else(|| non_empty_env("TASKY_USER"))
            .or(config.actor)
            .or_else(|| non_empty_env("USER"))
            .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

        Ok(Settings {
            root,
            actor,
            editor: config.editor,
            reference_year: config.reference_year,
            comment_marker: config
                .comment_marker
                .unwrap_or_else(|| DEFAULT_COMMENT_MARKER.to_string()),
        })
    }

    pub fn coercer(&self) -> Coercer {
        match self.reference_year {
            Some(year) => Coercer::new(year),
            None => Coercer::for_current_year(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
        let _guard = crate::test_env::lock();
        f()
    }

    struct EnvGuard {
        saved: Vec<(&'static str, Option<OsString>)>,
    }

    impl EnvGuard {
        fn capture() -> Self {
            let saved = ["TASKY_HOME", "TASKY_USER", "USER"]
                .into_iter()
                .map(|key| (key, std::env::var_os(key)))
                .collect();
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn write_and_read_config() {
        let temp = TempDir::new().expect("tempdir");
        let config = TaskyConfig {
            root_dir: Some("store".to_string()),
            actor: Some("alice".to_string()),
            editor: Some("nano -w".to_string()),
            reference_year: Some(2022),
            comment_marker: None,
        };
        write_config(temp.path(), &config).expect("write config");
        let loaded = load_config(temp.path()).expect("load").expect("config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn discovery_walks_up_and_remembers_the_base() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join(".taskyrc"), "root_dir = \"data\"\n").expect("write");
        let nested = temp.path().join("x").join("y");
        fs::create_dir_all(&nested).expect("nested");

        let loaded = discover_project_config(&nested)
            .expect("discover")
            .expect("config");
        let base = temp.path().canonicalize().expect("canonical");
        assert_eq!(loaded.base, base);
        assert_eq!(loaded.root_dir(), Some(base.join("data")));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join(".tasky.toml"), "reference_year = \"soon\"\n")
            .expect("write");
        assert!(matches!(load_config(temp.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn resolve_prefers_flags_then_project_then_global() {
        with_env_lock(|| {
            let _env = EnvGuard::capture();
            let repo = TempDir::new().expect("repo");
            let home = TempDir::new().expect("home");
            std::env::set_var("TASKY_HOME", home.path());
            std::env::remove_var("TASKY_USER");
            std::env::set_var("USER", "shell-user");

            // Nothing configured: store under TASKY_HOME, actor from $USER.
            let settings = Settings::resolve(repo.path(), Overrides::default()).expect("resolve");
            assert_eq!(settings.root, home.path());
            assert_eq!(settings.actor, "shell-user");
            assert_eq!(settings.comment_marker, "#");
            assert_eq!(settings.reference_year, None);

            fs::write(
                home.path().join("config.toml"),
                "actor = \"global\"\nreference_year = 2022\n",
            )
            .expect("global config");
            let settings = Settings::resolve(repo.path(), Overrides::default()).expect("resolve");
            assert_eq!(settings.actor, "global");
            assert_eq!(settings.coercer().reference_year(), 2022);

            fs::write(
                repo.path().join(".tasky.toml"),
                "actor = \"project\"\nroot_dir = \"store\"\n",
            )
            .expect("project config");
            let nested = repo.path().join("a").join("b");
            fs::create_dir_all(&nested).expect("nested");
            let settings = Settings::resolve(&nested, Overrides::default()).expect("resolve");
            assert_eq!(settings.actor, "project");
            assert_eq!(settings.reference_year, Some(2022));
            assert!(settings.root.ends_with("store"));

            std::env::set_var("TASKY_USER", "env-user");
            let settings = Settings::resolve(&nested, Overrides::default()).expect("resolve");
            assert_eq!(settings.actor, "env-user");

            let flags = Overrides {
                root: Some(PathBuf::from("/tmp/elsewhere")),
                actor: Some("flag-user".to_string()),
            };
            let settings = Settings::resolve(&nested, flags).expect("resolve");
            assert_eq!(settings.actor, "flag-user");
            assert_eq!(settings.root, PathBuf::from("/tmp/elsewhere"));
        });
    }
}
