//! Visibility resolution ("apply").
//!
//! [`resolve`] turns the signal store, the subscription registry and the
//! theme into a complete [`ClusterRenderState`]. It keeps no state between
//! calls: identical inputs always produce identical output.
//!
//! Rules, in evaluation order:
//!
//! 1. VPN visible iff VPN is on.
//! 2. Wifi group visible iff wifi is visible; strength tinted with the network
//!    color, activity with the activity color.
//! 3. Each subscription, in registry order, visible iff it is visible and
//!    airplane mode is off. Wide type icons push the strength icon over.
//! 4. Every visible group after the first gets the secondary padding.
//! 5. Airplane icon visible iff airplane mode is on.
//! 6. Wifi/airplane spacer visible iff airplane mode and wifi are both shown.
//! 7. Wifi/signal spacer visible iff wifi is shown and either a visible mobile
//!    group has a type icon or the no-SIM indicator is on.
//! 8. The type icon follows the style: in `AndroidDefault` it shows when
//!    roaming or typed and wifi is hidden; every other style hides it.
//! 9. Airplane mode hides every mobile and no-SIM group.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::registry::{MobileIndicators, SubscriptionId, SubscriptionRegistry};
use crate::render::{ClusterRenderState, MobileRenderState, SlotState};
use crate::signal::SignalState;
use crate::theme::ThemeColors;

/// Status bar style. Only `AndroidDefault` shows the mobile type icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleMode {
    #[default]
    #[serde(rename = "android_default")]
    AndroidDefault,
    #[serde(rename = "cdma_1x_combined")]
    Cdma1xCombined,
    #[serde(rename = "default_data")]
    DefaultData,
    #[serde(rename = "data_voice")]
    DataVoice,
}

impl StyleMode {
    pub fn name(self) -> &'static str {
        match self {
            StyleMode::AndroidDefault => "android_default",
            StyleMode::Cdma1xCombined => "cdma_1x_combined",
            StyleMode::DefaultData => "default_data",
            StyleMode::DataVoice => "data_voice",
        }
    }
}

/// Fixed paddings used by the cluster layout, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub wide_type_icon_start_padding: u32,
    pub secondary_telephony_padding: u32,
}

/// Everything a resolution pass reads.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInputs<'a> {
    pub signals: &'a SignalState,
    pub registry: &'a SubscriptionRegistry,
    pub theme: &'a ThemeColors,
    pub style: StyleMode,
    pub two_bar_subscriptions: &'a [SubscriptionId],
    pub metrics: LayoutMetrics,
}

/// Resolve the complete render state.
///
/// Missing optional data never fails the pass; it resolves to hidden slots.
/// The only error is `InconsistentState`, when the registry holds the same
/// subscription twice.
pub fn resolve(inputs: &ResolverInputs<'_>) -> Result<ClusterRenderState> {
    inputs.registry.check_consistency()?;

    let signals = inputs.signals;
    let theme = inputs.theme;
    let inet = signals.inet_condition();
    let network_color = theme.network_color(inet);
    let activity_color = theme.activity_color(inet);
    let airplane_mode = signals.airplane_mode();
    let wifi_visible = signals.wifi_visible();

    let vpn = SlotState::shown_if(signals.vpn_visible());
    debug!("vpn: {}", if signals.vpn_visible() { "VISIBLE" } else { "GONE" });

    let (wifi_group, wifi_strength, wifi_activity) = if wifi_visible {
        (
            SlotState::shown().with_description(signals.wifi_description()),
            SlotState::icon(signals.wifi_strength_icon(), network_color),
            SlotState::icon(signals.wifi_activity_icon(), activity_color),
        )
    } else {
        (SlotState::hidden(), SlotState::hidden(), SlotState::hidden())
    };
    debug!(
        "wifi: {} sig={} act={}",
        if wifi_visible { "VISIBLE" } else { "GONE" },
        signals.wifi_strength_icon().0,
        signals.wifi_activity_icon().0
    );

    let mut mobiles = Vec::with_capacity(inputs.registry.len());
    let mut any_mobile_visible = false;
    let mut any_typed_mobile_visible = false;

    for entry in inputs.registry.iter() {
        let visible = entry.visible && !airplane_mode;
        // Secondary means some earlier group is already on screen
        let secondary = any_mobile_visible;

        let state = if visible {
            resolve_mobile(inputs, entry, secondary, wifi_visible)
        } else {
            MobileRenderState::hidden(entry.sub_id)
        };

        debug!(
            "mobile {}: {} sig={} typ={} secondary={}",
            entry.sub_id,
            if visible { "VISIBLE" } else { "GONE" },
            entry.strength_icon.0,
            entry.type_icon.0,
            secondary
        );

        if visible {
            any_mobile_visible = true;
            any_typed_mobile_visible |= entry.type_icon.is_some();
        }
        mobiles.push(state);
    }

    let data_activity = if signals.data_visible() && any_mobile_visible {
        SlotState::icon(signals.data_activity_icon(), activity_color)
    } else {
        SlotState::hidden()
    };

    let no_sim = if signals.no_sim_visible() && !airplane_mode {
        SlotState::icon(signals.no_sim_icon(), network_color)
    } else {
        SlotState::hidden()
    };

    let airplane = if airplane_mode {
        SlotState::icon(signals.airplane_icon(), theme.airplane)
            .with_visible(true)
            .with_description(signals.airplane_description())
    } else {
        SlotState::hidden()
    };

    let wifi_airplane_spacer = SlotState::shown_if(airplane_mode && wifi_visible);
    let wifi_signal_spacer = SlotState::shown_if(
        wifi_visible && (any_typed_mobile_visible || signals.no_sim_visible()),
    );

    Ok(ClusterRenderState {
        generation: inputs.registry.generation(),
        layout_direction: signals.layout_direction(),
        vpn,
        wifi_group,
        wifi_strength,
        wifi_activity,
        mobiles,
        data_activity,
        no_sim,
        airplane,
        wifi_airplane_spacer,
        wifi_signal_spacer,
    })
}

/// Resolve one visible subscription group.
fn resolve_mobile(
    inputs: &ResolverInputs<'_>,
    entry: &MobileIndicators,
    secondary: bool,
    wifi_visible: bool,
) -> MobileRenderState {
    let inet = inputs.signals.inet_condition();
    let network_color = inputs.theme.network_color(inet);
    let activity_color = inputs.theme.activity_color(inet);
    let metrics = inputs.metrics;

    let group = SlotState::shown()
        .with_description(entry.content_description())
        .with_padding_start(if secondary {
            metrics.secondary_telephony_padding
        } else {
            0
        });

    let strength = SlotState::icon(entry.strength_icon, network_color).with_padding_start(
        if entry.wide_type_icon {
            metrics.wide_type_icon_start_padding
        } else {
            0
        },
    );

    let type_icon = SlotState::icon(entry.type_icon, network_color).with_visible(
        type_icon_visible(inputs.style, entry, wifi_visible),
    );

    MobileRenderState {
        sub_id: entry.sub_id,
        group,
        strength,
        type_icon,
        activity: SlotState::icon(entry.activity_icon, activity_color),
        roaming: SlotState::shown_if(entry.roaming),
        two_bars: inputs.style == StyleMode::DataVoice
            && inputs.two_bar_subscriptions.contains(&entry.sub_id),
    }
}

/// Type icon visibility: the per-entry default (typed) is always overridden
/// by the style rule.
fn type_icon_visible(style: StyleMode, entry: &MobileIndicators, wifi_visible: bool) -> bool {
    match style {
        StyleMode::AndroidDefault => {
            (entry.roaming || entry.type_icon.is_some()) && !wifi_visible
        }
        StyleMode::Cdma1xCombined | StyleMode::DefaultData | StyleMode::DataVoice => false,
    }
}
