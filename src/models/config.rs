use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Profile configuration from `Outsift Profiles.yaml`
///
/// Maps profile names to parser stacks, so common tool combinations can be
/// selected by name instead of spelled out on every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(rename = "Outsift_Profiles")]
    pub profiles: IndexMap<String, ToolProfile>,
}

/// A named parser chain definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolProfile {
    /// Parser names in chain order, head first.
    #[serde(rename = "Parsers", default)]
    pub parsers: Vec<String>,

    /// Directories to resolve relative diagnostic paths against.
    #[serde(rename = "Search Dirs", default)]
    pub search_dirs: Vec<String>,

    /// Name of the parser to designate as the chain's redirection detector.
    /// Must be one of the entries in `parsers`.
    #[serde(rename = "Redirection Detector", default)]
    pub redirection_detector: Option<String>,
}

/// User settings from `Outsift Settings.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Outsift_Settings")]
    pub settings: SiftSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiftSettings {
    /// Profile used when neither `--tool` nor `--profile` is given.
    #[serde(rename = "Default Profile", default = "default_profile_name")]
    pub default_profile: String,

    #[serde(rename = "Stat Logging", default)]
    pub stat_logging: bool,

    /// Read size for streaming input, in bytes.
    #[serde(rename = "Chunk Size", default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SiftSettings {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            stat_logging: true,
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            settings: SiftSettings::default(),
        }
    }
}

fn default_profile_name() -> String {
    "gcc-make".to_string()
}

fn default_chunk_size() -> usize {
    8192
}

impl ProfilesConfig {
    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Option<&ToolProfile> {
        self.profiles.get(name)
    }

    /// Iterate profile names in file order
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sift_settings_defaults() {
        let settings = SiftSettings::default();
        assert_eq!(settings.default_profile, "gcc-make");
        assert_eq!(settings.chunk_size, 8192);
        assert!(settings.stat_logging);
    }

    #[test]
    fn test_user_settings_default() {
        let config = UserSettings::default();
        assert_eq!(config.settings.default_profile, "gcc-make");
    }

    #[test]
    fn test_get_profile() {
        let mut profiles = IndexMap::new();
        profiles.insert(
            "gcc".to_string(),
            ToolProfile {
                parsers: vec!["gcc".to_string()],
                ..Default::default()
            },
        );
        let config = ProfilesConfig { profiles };

        assert!(config.get_profile("gcc").is_some());
        assert!(config.get_profile("msvc").is_none());
        assert_eq!(config.profile_names().collect::<Vec<_>>(), vec!["gcc"]);
    }
}
