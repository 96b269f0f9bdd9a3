//! Icon theming for the signal cluster.
//!
//! `ThemeColors` is the single source of truth for indicator tints. It is
//! derived from five raw color settings through a fixed fallback ladder and
//! recomputed whenever the settings source reports a change.

use std::fmt;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use crate::signal::InetCondition;

/// Network icon color when nothing is configured (opaque white).
pub const DEFAULT_COLOR: Color = Color(0xffff_ffff);

/// Activity arrow color when nothing is configured (opaque black).
pub const DEFAULT_ACTIVITY_COLOR: Color = Color(0xff00_0000);

/// A packed ARGB color, applied to icons as a multiply filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Format as `#aarrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:08x}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Parse a hex color string. Returns None if invalid.
///
/// Accepts `#rgb`, `#rrggbb` (opaque) and `#aarrggbb`; the leading `#` is optional.
pub fn parse_hex_color(color: &str) -> Option<Color> {
    let color = color.trim().trim_start_matches('#');

    if !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    // Expand shorthand (e.g., "fff" -> "ffffff")
    let color = if color.len() == 3 {
        color.chars().flat_map(|c| [c, c]).collect::<String>()
    } else {
        color.to_string()
    };

    match color.len() {
        6 => u32::from_str_radix(&color, 16)
            .ok()
            .map(|rgb| Color(0xff00_0000 | rgb)),
        8 => u32::from_str_radix(&color, 16).ok().map(Color),
        _ => None,
    }
}

/// The five raw color settings the cluster observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    NetworkIconsNormalColor,
    NetworkIconsFullyColor,
    NetworkActivityIconsNormalColor,
    NetworkActivityIconsFullyColor,
    AirplaneModeIconColor,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::NetworkIconsNormalColor,
        SettingKey::NetworkIconsFullyColor,
        SettingKey::NetworkActivityIconsNormalColor,
        SettingKey::NetworkActivityIconsFullyColor,
        SettingKey::AirplaneModeIconColor,
    ];

    /// Storage name of the setting, matching the `[colors]` config table.
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::NetworkIconsNormalColor => "network_icons_normal_color",
            SettingKey::NetworkIconsFullyColor => "network_icons_fully_color",
            SettingKey::NetworkActivityIconsNormalColor => "network_activity_icons_normal_color",
            SettingKey::NetworkActivityIconsFullyColor => "network_activity_icons_fully_color",
            SettingKey::AirplaneModeIconColor => "airplane_mode_icon_color",
        }
    }
}

/// Raw color settings as read from the settings backend.
///
/// `None` means the key is unset, not "transparent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub network_normal: Option<Color>,
    pub network_fully: Option<Color>,
    pub activity_normal: Option<Color>,
    pub activity_fully: Option<Color>,
    pub airplane: Option<Color>,
}

impl SettingsSnapshot {
    pub fn get(&self, key: SettingKey) -> Option<Color> {
        match key {
            SettingKey::NetworkIconsNormalColor => self.network_normal,
            SettingKey::NetworkIconsFullyColor => self.network_fully,
            SettingKey::NetworkActivityIconsNormalColor => self.activity_normal,
            SettingKey::NetworkActivityIconsFullyColor => self.activity_fully,
            SettingKey::AirplaneModeIconColor => self.airplane,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: Option<Color>) {
        let slot = match key {
            SettingKey::NetworkIconsNormalColor => &mut self.network_normal,
            SettingKey::NetworkIconsFullyColor => &mut self.network_fully,
            SettingKey::NetworkActivityIconsNormalColor => &mut self.activity_normal,
            SettingKey::NetworkActivityIconsFullyColor => &mut self.activity_fully,
            SettingKey::AirplaneModeIconColor => &mut self.airplane,
        };
        *slot = value;
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, key: SettingKey, value: Color) -> Self {
        self.set(key, Some(value));
        self
    }
}

/// Supplies the current raw color settings.
///
/// Change notifications are delivered separately, through
/// `ClusterHandle::notify_settings_changed`, as one batch for all five keys.
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> SettingsSnapshot;
}

impl SettingsSource for SettingsSnapshot {
    fn snapshot(&self) -> SettingsSnapshot {
        *self
    }
}

impl SettingsSource for RwLock<SettingsSnapshot> {
    fn snapshot(&self) -> SettingsSnapshot {
        *self.read()
    }
}

/// Effective indicator colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeColors {
    pub normal: Color,
    pub full: Color,
    pub activity_normal: Color,
    pub activity_full: Color,
    pub airplane: Color,
}

impl ThemeColors {
    /// Derive effective colors from raw settings.
    ///
    /// The ladder is evaluated top to bottom and every fallback refers to the
    /// already-resolved upstream value:
    ///
    /// 1. network normal: setting, else [`DEFAULT_COLOR`]
    /// 2. network fully: setting, else (1)
    /// 3. activity normal: setting, else [`DEFAULT_ACTIVITY_COLOR`]
    /// 4. activity fully: setting, else (3)
    /// 5. airplane: setting, else (1)
    pub fn resolve(raw: &SettingsSnapshot) -> Self {
        let normal = raw.network_normal.unwrap_or(DEFAULT_COLOR);
        let full = raw.network_fully.unwrap_or(normal);
        let activity_normal = raw.activity_normal.unwrap_or(DEFAULT_ACTIVITY_COLOR);
        let activity_full = raw.activity_fully.unwrap_or(activity_normal);
        let airplane = raw.airplane.unwrap_or(normal);

        Self {
            normal,
            full,
            activity_normal,
            activity_full,
            airplane,
        }
    }

    /// Network icon tint for the given connectivity.
    pub fn network_color(&self, inet: InetCondition) -> Color {
        match inet {
            InetCondition::Limited => self.normal,
            InetCondition::Full => self.full,
        }
    }

    /// Activity arrow tint for the given connectivity.
    pub fn activity_color(&self, inet: InetCondition) -> Color {
        match inet {
            InetCondition::Limited => self.activity_normal,
            InetCondition::Full => self.activity_full,
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::resolve(&SettingsSnapshot::default())
    }
}
