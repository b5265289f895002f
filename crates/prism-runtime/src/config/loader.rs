//! Layered configuration loading with figment.
//!
//! Layers, later ones winning:
//!
//! 1. [`PrismConfig::default`]
//! 2. Programmatic merges ([`ConfigLoader::merge`])
//! 3. The main file, `prism.toml`, `prism.yaml` or `prism.yml`
//! 4. The profile file next to it (e.g. `prism.production.toml`) when a
//!    profile is set through [`ConfigLoader::profile`] or `PRISM_PROFILE`
//! 5. `PRISM_*` environment variables, with `__` between nested keys:
//!    `PRISM_LOGGING__LEVEL=debug`, `PRISM_LOGGING__FILTERS__PRISM_CORE=trace`
//!
//! Pipelines are lists and therefore only come from files or merges.
//!
//! Without explicit search paths the main file is looked up in the current
//! directory, then in `<user config dir>/prism`; the first hit wins. The
//! `toml-config` and `yaml-config` features select the recognised
//! extensions.
//!
//! ```rust,ignore
//! use prism_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("deploy/prism.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::PrismConfig;

const ENV_PREFIX: &str = "PRISM_";
const PROFILE_VAR: &str = "PRISM_PROFILE";
const FILE_STEM: &str = "prism";

/// Main file extensions, in lookup order.
const EXTENSIONS: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "toml",
    #[cfg(feature = "yaml-config")]
    "yaml",
    #[cfg(feature = "yaml-config")]
    "yml",
];

/// Builds a [`PrismConfig`] from defaults, files, merges and the environment.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Option<String>,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader reading `PRISM_PROFILE` and the environment.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: std::env::var(PROFILE_VAR).ok().filter(|p| !p.is_empty()),
            search_paths: Vec::new(),
            file: None,
            env: true,
        }
    }

    /// Selects the profile file merged over the main file.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Adds a directory to look for the main file in.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Loads this file instead of searching; it must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `PRISM_*` variables (the default).
    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    /// Ignores `PRISM_*` variables.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Merges a configuration built in code over the defaults.
    pub fn merge(mut self, config: PrismConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads the configuration.
    pub fn load(self) -> ConfigResult<PrismConfig> {
        let profile = self.profile.clone();
        let config: PrismConfig = self
            .figment()?
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(
            profile = profile.as_deref().unwrap_or("none"),
            logging_level = %config.logging.level,
            pipelines = config.pipelines.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let mut figment =
            Figment::from(Serialized::defaults(PrismConfig::default())).merge(self.overrides);

        let main = match self.file {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::FileNotFound(path)),
            None => find_main_file(&self.search_paths),
        };

        match main {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_file(figment, &path)?;

                if let Some(profile_path) = self
                    .profile
                    .as_deref()
                    .and_then(|profile| profile_file(&path, profile))
                    .filter(|profile_path| profile_path.exists())
                {
                    debug!(path = %profile_path.display(), "Loading profile configuration");
                    figment = merge_file(figment, &profile_path)?;
                }
            }
            None => warn!("No configuration file found, using defaults"),
        }

        if self.env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment)
    }
}

/// Returns the first `prism.<ext>` found in the search paths.
fn find_main_file(search_paths: &[PathBuf]) -> Option<PathBuf> {
    let defaults;
    let search_paths = if search_paths.is_empty() {
        defaults = std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(FILE_STEM)))
            .collect::<Vec<_>>();
        &defaults
    } else {
        search_paths
    };

    search_paths
        .iter()
        .flat_map(|dir| {
            EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{FILE_STEM}.{ext}")))
        })
        .find(|path| path.exists())
}

/// `dir/prism.toml` with profile `production` gives `dir/prism.production.toml`.
fn profile_file(main: &Path, profile: &str) -> Option<PathBuf> {
    let stem = main.file_stem()?.to_str()?;
    let ext = main.extension()?.to_str()?;
    Some(main.with_file_name(format!("{stem}.{profile}.{ext}")))
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations and `PRISM_*` variables.
pub fn load_config() -> ConfigResult<PrismConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file plus `PRISM_*` variables.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<PrismConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new()
            .search_path(std::env::temp_dir().join("prism-missing-dir"))
            .without_env()
    }

    #[test]
    fn test_default_config() {
        let config = isolated().load().unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.pipelines.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = isolated().file("does-not-exist.toml").load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = scratch_dir("ini");
        let path = dir.join("prism.ini");
        std::fs::write(&path, "level = debug\n").unwrap();

        let result = isolated().file(&path).load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut overrides = PrismConfig::default();
        overrides.logging.level = LogLevel::Warn;

        let config = isolated().merge(overrides).load().unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_profile_file_name() {
        assert_eq!(
            profile_file(Path::new("conf/prism.toml"), "production"),
            Some(PathBuf::from("conf/prism.production.toml"))
        );
        assert_eq!(profile_file(Path::new("prism"), "production"), None);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_overrides_main_file() {
        let dir = scratch_dir("profile");
        std::fs::write(
            dir.join("prism.toml"),
            "[logging]\nlevel = \"debug\"\n\n[[pipelines]]\nname = \"ingest\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("prism.production.toml"), "[logging]\nlevel = \"error\"\n")
            .unwrap();

        let base = ConfigLoader::new()
            .search_path(&dir)
            .without_env()
            .load()
            .unwrap();
        let production = ConfigLoader::new()
            .search_path(&dir)
            .profile("production")
            .without_env()
            .load()
            .unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(base.logging.level, LogLevel::Debug);
        assert_eq!(production.logging.level, LogLevel::Error);
        assert_eq!(production.pipelines[0].name, "ingest");
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_load_yaml_file() {
        let dir = scratch_dir("yaml");
        let path = dir.join("prism.yaml");
        std::fs::write(
            &path,
            "pipelines:\n  - name: ingest\n    transformers:\n      \
             - type: delete-extension\n        name: internal\n",
        )
        .unwrap();

        let config = load_config_from_file(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.pipelines[0].name, "ingest");
    }
}
