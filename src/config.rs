use eyre::{Context, Result, bail};
use loopos::flow::{DEFAULT_LOOP_DEPTH, LoopConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `loop.deep_mode`.
pub const ENV_DEEP_MODE: &str = "LOOPOS_DEEP_MODE";
/// Environment variable overriding `loop.loop_depth`.
pub const ENV_LOOP_DEPTH: &str = "LOOPOS_LOOP_DEPTH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "loop")]
    pub loop_settings: LoopSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    pub deep_mode: bool,
    pub loop_depth: u8,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            deep_mode: false,
            loop_depth: DEFAULT_LOOP_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply `LOOPOS_*` overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply overrides looked up by variable name; malformed values are errors
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DEEP_MODE) {
            self.loop_settings.deep_mode = parse_bool(&raw).context(format!("Invalid {}", ENV_DEEP_MODE))?;
            log::debug!("{} override: {}", ENV_DEEP_MODE, self.loop_settings.deep_mode);
        }
        if let Some(raw) = lookup(ENV_LOOP_DEPTH) {
            self.loop_settings.loop_depth = raw
                .trim()
                .parse()
                .context(format!("Invalid {}: {:?}", ENV_LOOP_DEPTH, raw))?;
            log::debug!("{} override: {}", ENV_LOOP_DEPTH, self.loop_settings.loop_depth);
        }
        Ok(())
    }

    /// Build the validated loop configuration, with CLI flags taking precedence
    pub fn loop_config(&self, deep: Option<bool>, depth: Option<u8>) -> Result<LoopConfig> {
        let deep_mode = deep.unwrap_or(self.loop_settings.deep_mode);
        let loop_depth = depth.unwrap_or(self.loop_settings.loop_depth);
        LoopConfig::new(deep_mode, loop_depth).context("Invalid loop configuration")
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}
