//! Named command presets loaded from a JSON config file.
//!
//! ```json
//! {
//!   "presets": {
//!     "build": { "program": "cargo", "working_dir": "~/src/app", "args": "build --release" },
//!     "hello": { "program": "echo", "args": "hello", "env": { "LANG": "C" } }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::ProcessWrapper;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV_VAR: &str = "CMDLINE_CONFIG";

const CONFIG_DIR: &str = "cmdline";
const CONFIG_FILE: &str = "config.json";

/// Top-level config file contents.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Presets by name.
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

/// A stored command invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    /// Program to run.
    pub program: String,
    /// Working directory; relative paths resolve against the caller's current directory.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// Default argument string.
    #[serde(default)]
    pub args: String,
    /// Extra environment variables.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Preset {
    /// Build a wrapper for this preset, without callbacks.
    pub fn wrapper(&self) -> ProcessWrapper {
        ProcessWrapper::new(&self.program, expand_home(&self.working_dir)).envs(self.env.clone())
    }
}

impl Config {
    /// Load the config file.
    ///
    /// Priority order:
    /// 1. `explicit` path (must exist)
    /// 2. `CMDLINE_CONFIG` environment variable (must exist)
    /// 3. `<config dir>/cmdline/config.json` (empty config if absent)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and parse a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Default config location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets.get(name).with_context(|| {
            let known: Vec<&str> = self.presets.keys().map(String::as_str).collect();
            format!("Unknown preset '{name}' (known: {})", known.join(", "))
        })
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_presets_with_defaults() {
        let file = write_config(
            r#"{
                "presets": {
                    "hello": { "program": "echo", "args": "hello world" },
                    "build": {
                        "program": "cargo",
                        "working_dir": "/tmp",
                        "env": { "RUSTFLAGS": "-Dwarnings" }
                    }
                }
            }"#,
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.presets.len(), 2);

        let hello = config.preset("hello").unwrap();
        assert_eq!(hello.program, "echo");
        assert_eq!(hello.args, "hello world");
        assert_eq!(hello.working_dir, PathBuf::from("."));
        assert!(hello.env.is_empty());

        let build = config.preset("build").unwrap();
        assert_eq!(build.args, "");
        assert_eq!(build.env["RUSTFLAGS"], "-Dwarnings");
    }

    #[test]
    fn test_empty_object_has_no_presets() {
        let file = write_config("{}");
        let config = Config::load_from(file.path()).unwrap();
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_unknown_preset_lists_known() {
        let file = write_config(r#"{ "presets": { "a": { "program": "true" } } }"#);
        let config = Config::load_from(file.path()).unwrap();

        let err = config.preset("b").unwrap_err();
        assert!(err.to_string().contains("known: a"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let file = write_config("{ not json");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_preset_wrapper() {
        let preset = Preset {
            program: "echo".to_string(),
            working_dir: PathBuf::from("/tmp"),
            args: "hi".to_string(),
            env: HashMap::new(),
        };

        let wrapper = preset.wrapper();
        assert_eq!(wrapper.program(), "echo");
        assert_eq!(wrapper.working_dir(), Path::new("/tmp"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/src")), home.join("src"));
        }
    }
}
