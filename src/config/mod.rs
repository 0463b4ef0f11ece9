use crate::models::{ProfilesConfig, ToolProfile, UserSettings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two primary configuration files:
/// - Profiles (`Outsift Profiles.yaml`): named parser chains and their options
/// - Settings (`Outsift Settings.yaml`): user preferences such as the default
///   profile and the streaming chunk size
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    profiles_path: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "Outsift Data")
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            profiles_path: config_dir.join("Outsift Profiles.yaml"),
            settings_path: config_dir.join("Outsift Settings.yaml"),
            config_dir,
        })
    }

    /// Load the profiles file.
    ///
    /// # Returns
    /// The loaded ProfilesConfig, or the built-in defaults if the file
    /// doesn't exist
    pub fn load_profiles(&self) -> Result<ProfilesConfig> {
        if !self.profiles_path.exists() {
            tracing::warn!(
                "Profiles file not found at {}, using defaults",
                self.profiles_path
            );
            return Ok(Self::create_default_profiles());
        }

        let file_contents = fs::read_to_string(&self.profiles_path)
            .with_context(|| format!("Failed to read profiles: {}", self.profiles_path))?;

        let config: ProfilesConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse profiles: {}", self.profiles_path))?;

        tracing::info!("Loaded profiles from {}", self.profiles_path);
        Ok(config)
    }

    /// Save the profiles file.
    ///
    /// # Arguments
    /// * `config` - The ProfilesConfig to save
    pub fn save_profiles(&self, config: &ProfilesConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize profiles to YAML")?;

        fs::write(&self.profiles_path, yaml_string)
            .with_context(|| format!("Failed to write profiles: {}", self.profiles_path))?;

        tracing::info!("Saved profiles to {}", self.profiles_path);
        Ok(())
    }

    /// Load the user settings file.
    ///
    /// # Returns
    /// The loaded UserSettings, or defaults if the file doesn't exist
    pub fn load_settings(&self) -> Result<UserSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(UserSettings::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let config: UserSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(config)
    }

    /// Save the user settings file.
    ///
    /// # Arguments
    /// * `config` - The UserSettings to save
    pub fn save_settings(&self, config: &UserSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Create the built-in default profiles.
    ///
    /// This is used when the profiles file doesn't exist.
    fn create_default_profiles() -> ProfilesConfig {
        use indexmap::IndexMap;

        let mut profiles = IndexMap::new();

        profiles.insert(
            "gcc".to_string(),
            ToolProfile {
                parsers: vec!["gcc".to_string()],
                ..Default::default()
            },
        );
        profiles.insert(
            "clang".to_string(),
            ToolProfile {
                parsers: vec!["clang".to_string()],
                ..Default::default()
            },
        );
        profiles.insert(
            "make".to_string(),
            ToolProfile {
                parsers: vec!["make".to_string()],
                ..Default::default()
            },
        );
        // Full build logs: compiler diagnostics plus make's directory
        // tracking, with the compiler parser watching for 2>&1 redirection.
        profiles.insert(
            "gcc-make".to_string(),
            ToolProfile {
                parsers: vec!["gcc".to_string(), "make".to_string()],
                search_dirs: Vec::new(),
                redirection_detector: Some("gcc".to_string()),
            },
        );

        ProfilesConfig { profiles }
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
