//! Latest values reported by the non-cellular signal sources.
//!
//! `SignalState` holds wifi, VPN, airplane mode, no-SIM and the shared
//! data-activity indicator. Every field is written through a setter; each
//! setter is a plain last-write-wins assignment. Description strings are the
//! only validated input: an absent description rejects the whole update and
//! the previously stored values stay in place.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Opaque icon selector handed over by the radio layer. `0` means "no icon".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconId(pub u32);

impl IconId {
    pub const NONE: IconId = IconId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

/// Whether connectivity has been validated.
///
/// Selects between the "normal" and "fully connected" theme colors for every
/// indicator at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InetCondition {
    #[default]
    Limited,
    Full,
}

impl From<i32> for InetCondition {
    fn from(value: i32) -> Self {
        if value == 0 {
            InetCondition::Limited
        } else {
            InetCondition::Full
        }
    }
}

/// Horizontal layout direction of the host bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Wifi report from the radio layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiIndicators {
    pub visible: bool,
    pub strength_icon: IconId,
    pub inet_condition: InetCondition,
    pub activity_icon: IconId,
    pub description: Option<String>,
}

/// Airplane mode report from the radio layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirplaneIndicators {
    pub enabled: bool,
    pub icon: IconId,
    pub description: Option<String>,
}

/// Reject an absent description, logging which field it was.
pub(crate) fn require_description(field: &'static str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| {
        warn!("Rejecting signal update: {} is missing", field);
        Error::InvalidSignalData { field }
    })
}

/// Latest wifi/VPN/airplane/no-SIM values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalState {
    wifi_visible: bool,
    wifi_strength_icon: IconId,
    wifi_activity_icon: IconId,
    wifi_description: String,
    vpn_visible: bool,
    airplane_mode: bool,
    airplane_icon: IconId,
    airplane_description: String,
    no_sim_visible: bool,
    no_sim_icon: IconId,
    inet_condition: InetCondition,
    data_visible: bool,
    data_activity_icon: IconId,
    layout_direction: LayoutDirection,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_wifi(&mut self, wifi: WifiIndicators) -> Result<()> {
        let description = require_description("wifi.description", wifi.description)?;

        self.wifi_visible = wifi.visible;
        self.wifi_strength_icon = wifi.strength_icon;
        self.inet_condition = wifi.inet_condition;
        self.wifi_activity_icon = wifi.activity_icon;
        self.wifi_description = description;
        Ok(())
    }

    pub fn set_vpn(&mut self, visible: bool) {
        self.vpn_visible = visible;
    }

    pub fn set_airplane(&mut self, airplane: AirplaneIndicators) -> Result<()> {
        let description = require_description("airplane.description", airplane.description)?;

        self.airplane_mode = airplane.enabled;
        self.airplane_icon = airplane.icon;
        self.airplane_description = description;
        Ok(())
    }

    pub fn set_no_sim(&mut self, visible: bool) {
        self.no_sim_visible = visible;
    }

    pub fn set_no_sim_icon(&mut self, icon: IconId) {
        self.no_sim_icon = icon;
    }

    pub fn set_inet_condition(&mut self, inet: InetCondition) {
        self.inet_condition = inet;
    }

    /// Set the data-activity indicator shared by all subscriptions.
    pub fn set_mobile_aggregate(&mut self, visible: bool, activity_icon: IconId) {
        self.data_visible = visible;
        self.data_activity_icon = activity_icon;
    }

    pub fn set_layout_direction(&mut self, direction: LayoutDirection) {
        self.layout_direction = direction;
    }

    pub fn wifi_visible(&self) -> bool {
        self.wifi_visible
    }

    pub fn wifi_strength_icon(&self) -> IconId {
        self.wifi_strength_icon
    }

    pub fn wifi_activity_icon(&self) -> IconId {
        self.wifi_activity_icon
    }

    pub fn wifi_description(&self) -> &str {
        &self.wifi_description
    }

    pub fn vpn_visible(&self) -> bool {
        self.vpn_visible
    }

    pub fn airplane_mode(&self) -> bool {
        self.airplane_mode
    }

    pub fn airplane_icon(&self) -> IconId {
        self.airplane_icon
    }

    pub fn airplane_description(&self) -> &str {
        &self.airplane_description
    }

    pub fn no_sim_visible(&self) -> bool {
        self.no_sim_visible
    }

    pub fn no_sim_icon(&self) -> IconId {
        self.no_sim_icon
    }

    pub fn inet_condition(&self) -> InetCondition {
        self.inet_condition
    }

    pub fn data_visible(&self) -> bool {
        self.data_visible
    }

    pub fn data_activity_icon(&self) -> IconId {
        self.data_activity_icon
    }

    pub fn layout_direction(&self) -> LayoutDirection {
        self.layout_direction
    }
}
