//! Configuration types and parsing.
//!
//! The `[cluster]` table holds the fixed layout resources of the signal
//! cluster (style, paddings, two-bar subscriptions). The `[colors]` table
//! holds the five raw color settings; these are the only values that change
//! at runtime and are fed through the theme fallback ladder.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::Table;

use crate::error::{Error, Result};
use crate::registry::SubscriptionId;
use crate::resolver::{LayoutMetrics, StyleMode};
use crate::theme::{SettingKey, SettingsSnapshot, SettingsSource, parse_hex_color};

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Signal cluster layout resources.
    pub cluster: ClusterConfig,

    /// Raw icon color settings.
    pub colors: ColorSettings,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Load configuration from a TOML string, merging with embedded defaults.
    ///
    /// Both documents are parsed as tables and deep-merged (user values win)
    /// before deserializing.
    pub fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// If `explicit_path` is `Some`, that path is used directly and an error
    /// is returned if it doesn't exist or can't be parsed (no fallback).
    ///
    /// Otherwise searches, in order:
    /// 1. `$XDG_CONFIG_HOME/signalbar/config.toml`
    /// 2. `~/.config/signalbar/config.toml`
    /// 3. `./config.toml`
    ///
    /// A config file that exists but fails to load is an error. Only when no
    /// file exists at all are the embedded defaults used.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        let search_paths = Self::config_search_paths();

        for path in &search_paths {
            if !path.exists() {
                continue;
            }
            return match Self::load(path) {
                Ok(config) => Ok(ConfigLoadResult {
                    config,
                    source: Some(path.clone()),
                    used_defaults: false,
                }),
                Err(e) => {
                    tracing::error!("Config file {:?} exists but failed to load: {}", path, e);
                    Err(e)
                }
            };
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("signalbar/config.toml"));
        }

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/signalbar/config.toml"));
        }

        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, returning every invalid value at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        for key in SettingKey::ALL {
            if let Some(value) = self.colors.raw(key)
                && parse_hex_color(value).is_none()
            {
                errors.push(format!(
                    "colors.{}: invalid value '{}', expected a hex color like '#ffffff' or '#80ffffff'",
                    key.name(),
                    value
                ));
            }
        }

        let mut seen = HashSet::new();
        for id in &self.cluster.show_voice_and_data_for_sub {
            if id.0 < 0 {
                errors.push(format!(
                    "cluster.show_voice_and_data_for_sub: invalid subscription id {}",
                    id
                ));
            }
            if !seen.insert(*id) {
                errors.push(format!(
                    "cluster.show_voice_and_data_for_sub: subscription {} listed twice",
                    id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Non-fatal issues that likely indicate a mistake.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.cluster.show_voice_and_data_for_sub.is_empty()
            && self.cluster.style != StyleMode::DataVoice
        {
            warnings.push(format!(
                "cluster.show_voice_and_data_for_sub: has no effect with style '{}' \
                 (only 'data_voice' draws two bars)",
                self.cluster.style.name()
            ));
        }

        warnings
    }

    /// Human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Cluster:".to_string());
        lines.push(format!("  style: {}", self.cluster.style.name()));
        lines.push(format!(
            "  wide_type_icon_start_padding: {}px",
            self.cluster.wide_type_icon_start_padding
        ));
        lines.push(format!(
            "  secondary_telephony_padding: {}px",
            self.cluster.secondary_telephony_padding
        ));
        lines.push(format!(
            "  show_mobile_activity: {}",
            self.cluster.show_mobile_activity
        ));
        if !self.cluster.show_voice_and_data_for_sub.is_empty() {
            lines.push(format!(
                "  show_voice_and_data_for_sub: {:?}",
                self.cluster
                    .show_voice_and_data_for_sub
                    .iter()
                    .map(|id| id.0)
                    .collect::<Vec<_>>()
            ));
        }

        lines.push("\nColors:".to_string());
        for key in SettingKey::ALL {
            lines.push(format!(
                "  {}: {}",
                key.name(),
                self.colors.raw(key).unwrap_or("(unset)")
            ));
        }

        lines.join("\n")
    }
}

impl SettingsSource for Config {
    fn snapshot(&self) -> SettingsSnapshot {
        self.colors.to_snapshot()
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// For nested tables, recursively merges. For arrays and other values,
/// the overlay value completely replaces the base value.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Signal cluster layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Status bar style.
    pub style: StyleMode,

    /// Subscriptions drawn with separate voice and data bars
    /// (only in the `data_voice` style).
    pub show_voice_and_data_for_sub: Vec<SubscriptionId>,

    /// Start padding of the strength icon when the type icon is wide (pixels).
    pub wide_type_icon_start_padding: u32,

    /// Padding between a mobile group and the visible group before it (pixels).
    pub secondary_telephony_padding: u32,

    /// Show activity arrows per subscription. When false the shared
    /// data-activity indicator carries the activity instead.
    pub show_mobile_activity: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            style: StyleMode::AndroidDefault,
            show_voice_and_data_for_sub: Vec::new(),
            wide_type_icon_start_padding: 2,
            secondary_telephony_padding: 4,
            show_mobile_activity: true,
        }
    }
}

impl ClusterConfig {
    pub fn metrics(&self) -> LayoutMetrics {
        LayoutMetrics {
            wide_type_icon_start_padding: self.wide_type_icon_start_padding,
            secondary_telephony_padding: self.secondary_telephony_padding,
        }
    }
}

/// Raw icon color settings, as hex strings. Unset keys use the fallback ladder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorSettings {
    pub network_icons_normal_color: Option<String>,
    pub network_icons_fully_color: Option<String>,
    pub network_activity_icons_normal_color: Option<String>,
    pub network_activity_icons_fully_color: Option<String>,
    pub airplane_mode_icon_color: Option<String>,
}

impl ColorSettings {
    /// Raw string value of a setting.
    pub fn raw(&self, key: SettingKey) -> Option<&str> {
        let value = match key {
            SettingKey::NetworkIconsNormalColor => &self.network_icons_normal_color,
            SettingKey::NetworkIconsFullyColor => &self.network_icons_fully_color,
            SettingKey::NetworkActivityIconsNormalColor => {
                &self.network_activity_icons_normal_color
            }
            SettingKey::NetworkActivityIconsFullyColor => &self.network_activity_icons_fully_color,
            SettingKey::AirplaneModeIconColor => &self.airplane_mode_icon_color,
        };
        value.as_deref()
    }

    /// Parse into a settings snapshot. Unparseable values count as unset.
    pub fn to_snapshot(&self) -> SettingsSnapshot {
        let mut snapshot = SettingsSnapshot::default();
        for key in SettingKey::ALL {
            let Some(raw) = self.raw(key) else {
                continue;
            };
            match parse_hex_color(raw) {
                Some(color) => snapshot.set(key, Some(color)),
                None => tracing::warn!("colors.{}: ignoring invalid color '{}'", key.name(), raw),
            }
        }
        snapshot
    }
}
