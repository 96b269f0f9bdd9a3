//! Resolved render state handed to the drawing backend.
//!
//! A `ClusterRenderState` is always complete: every slot is present in every
//! pass, hidden slots included. The renderer is expected to diff against what
//! it last drew.

use serde::Serialize;

use crate::registry::SubscriptionId;
use crate::signal::{IconId, LayoutDirection};
use crate::theme::Color;

/// Resolved state of one indicator slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotState {
    pub visible: bool,
    pub icon: IconId,
    /// Multiply filter applied to the icon, if any.
    pub color_filter: Option<Color>,
    pub content_description: Option<String>,
    pub padding_start: u32,
}

impl SlotState {
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Visible slot with no icon of its own (groups, spacers).
    pub fn shown() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    /// Visible only when `visible` holds; used for spacers.
    pub fn shown_if(visible: bool) -> Self {
        Self {
            visible,
            ..Self::default()
        }
    }

    /// Icon tinted with `color`. An unset icon leaves the slot hidden.
    pub fn icon(icon: IconId, color: Color) -> Self {
        Self {
            visible: icon.is_some(),
            icon,
            color_filter: Some(color),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.content_description = Some(description.into());
        self
    }

    pub fn with_padding_start(mut self, padding: u32) -> Self {
        self.padding_start = padding;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Resolved state of one subscription's indicator group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MobileRenderState {
    pub sub_id: SubscriptionId,
    /// The group container: visibility, combined description and the
    /// secondary padding separating it from the previous visible group.
    pub group: SlotState,
    /// Signal strength; its start padding makes room for a wide type icon.
    pub strength: SlotState,
    pub type_icon: SlotState,
    pub activity: SlotState,
    pub roaming: SlotState,
    /// Drawn with separate voice and data bars.
    pub two_bars: bool,
}

impl MobileRenderState {
    pub fn hidden(sub_id: SubscriptionId) -> Self {
        Self {
            sub_id,
            group: SlotState::hidden(),
            strength: SlotState::hidden(),
            type_icon: SlotState::hidden(),
            activity: SlotState::hidden(),
            roaming: SlotState::hidden(),
            two_bars: false,
        }
    }
}

/// Complete output of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRenderState {
    /// Registry generation the pass was computed from.
    pub generation: u64,
    pub layout_direction: LayoutDirection,
    pub vpn: SlotState,
    pub wifi_group: SlotState,
    pub wifi_strength: SlotState,
    pub wifi_activity: SlotState,
    /// One entry per registered subscription, in registry order.
    pub mobiles: Vec<MobileRenderState>,
    /// Data-activity indicator shared by all subscriptions.
    pub data_activity: SlotState,
    pub no_sim: SlotState,
    pub airplane: SlotState,
    pub wifi_airplane_spacer: SlotState,
    pub wifi_signal_spacer: SlotState,
}

impl ClusterRenderState {
    /// Content descriptions of visible groups, wifi first, then mobiles in
    /// registry order.
    ///
    /// Computed lazily from this state on every call.
    pub fn content_descriptions(&self) -> impl Iterator<Item = &str> + '_ {
        let wifi = Some(&self.wifi_group)
            .filter(|slot| slot.visible)
            .and_then(|slot| slot.content_description.as_deref());

        let mobiles = self
            .mobiles
            .iter()
            .filter(|m| m.group.visible)
            .filter_map(|m| m.group.content_description.as_deref());

        wifi.into_iter().chain(mobiles)
    }

    pub fn mobile(&self, sub_id: SubscriptionId) -> Option<&MobileRenderState> {
        self.mobiles.iter().find(|m| m.sub_id == sub_id)
    }

    pub fn visible_mobile_count(&self) -> usize {
        self.mobiles.iter().filter(|m| m.group.visible).count()
    }
}

/// Sink for resolved state. Called once per resolution pass, on the
/// resolution thread, with the complete state.
pub trait Renderer: Send {
    fn render(&mut self, state: &ClusterRenderState);
}

impl<F> Renderer for F
where
    F: FnMut(&ClusterRenderState) + Send,
{
    fn render(&mut self, state: &ClusterRenderState) {
        self(state)
    }
}
