//! The cluster model: signal store, subscription registry and theme behind
//! one mutable value.
//!
//! Every radio-side report lands here. The bridge wraps a `ClusterModel` in a
//! single mutex so that each report is applied as one writer section and a
//! resolution pass never sees a half-applied update.

use tracing::debug;

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::registry::{MobileUpdate, SubscriptionId, SubscriptionRegistry};
use crate::render::ClusterRenderState;
use crate::resolver::{self, ResolverInputs};
use crate::signal::{
    AirplaneIndicators, IconId, InetCondition, LayoutDirection, SignalState, WifiIndicators,
    require_description,
};
use crate::theme::{SettingsSnapshot, ThemeColors};

/// One mobile report from the radio provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileReport {
    pub sub_id: SubscriptionId,
    pub visible: bool,
    pub strength_icon: IconId,
    pub inet_condition: InetCondition,
    pub activity_icon: IconId,
    pub type_icon: IconId,
    pub description: Option<String>,
    pub type_description: Option<String>,
    pub roaming: bool,
    pub wide_type_icon: bool,
    pub no_sim_icon: IconId,
}

/// Mutable state read by every resolution pass.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    config: ClusterConfig,
    signals: SignalState,
    registry: SubscriptionRegistry,
    theme: ThemeColors,
}

impl ClusterModel {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            signals: SignalState::new(),
            registry: SubscriptionRegistry::new(),
            theme: ThemeColors::default(),
        }
    }

    pub fn report_wifi(&mut self, wifi: WifiIndicators) -> Result<()> {
        self.signals.set_wifi(wifi)
    }

    /// Apply a mobile report, registering the subscription if it is new.
    ///
    /// Nothing is written when either description is missing.
    pub fn report_mobile(&mut self, report: MobileReport) -> Result<()> {
        let description = require_description("mobile.description", report.description)?;
        let type_description =
            require_description("mobile.type_description", report.type_description)?;

        self.signals.set_inet_condition(report.inet_condition);
        self.signals.set_no_sim_icon(report.no_sim_icon);

        let activity_icon = if self.config.show_mobile_activity {
            self.signals.set_mobile_aggregate(false, IconId::NONE);
            report.activity_icon
        } else {
            self.signals
                .set_mobile_aggregate(report.activity_icon.is_some(), report.activity_icon);
            IconId::NONE
        };

        self.registry.get_or_create(report.sub_id).apply(MobileUpdate {
            visible: report.visible,
            strength_icon: report.strength_icon,
            type_icon: report.type_icon,
            activity_icon,
            description: Some(description),
            type_description: Some(type_description),
            roaming: report.roaming,
            wide_type_icon: report.wide_type_icon,
        })
    }

    /// Update an already registered subscription. Unknown ids are rejected.
    pub fn update_subscription(&mut self, id: SubscriptionId, update: MobileUpdate) -> Result<()> {
        self.registry.update_subscription(id, update)
    }

    pub fn report_no_sims(&mut self, visible: bool) {
        self.signals.set_no_sim(visible);
    }

    pub fn report_subscriptions(&mut self, ids: &[SubscriptionId]) {
        self.registry.replace_subscriptions(ids);
    }

    pub fn report_airplane_mode(&mut self, airplane: AirplaneIndicators) -> Result<()> {
        self.signals.set_airplane(airplane)
    }

    pub fn set_vpn(&mut self, enabled: bool) {
        self.signals.set_vpn(enabled);
    }

    /// Re-derive the theme from fresh settings.
    pub fn apply_settings(&mut self, raw: &SettingsSnapshot) {
        self.theme = ThemeColors::resolve(raw);
        debug!("Theme updated: {:?}", self.theme);
    }

    pub fn set_layout_direction(&mut self, direction: LayoutDirection) {
        self.signals.set_layout_direction(direction);
    }

    /// Run one resolution pass over the current state.
    pub fn resolve(&self) -> Result<ClusterRenderState> {
        resolver::resolve(&ResolverInputs {
            signals: &self.signals,
            registry: &self.registry,
            theme: &self.theme,
            style: self.config.style,
            two_bar_subscriptions: &self.config.show_voice_and_data_for_sub,
            metrics: self.config.metrics(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn signals(&self) -> &SignalState {
        &self.signals
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn theme(&self) -> &ThemeColors {
        &self.theme
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut SubscriptionRegistry {
        &mut self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::theme::{Color, SettingKey};

    fn report(sub: i32, visible: bool) -> MobileReport {
        MobileReport {
            sub_id: SubscriptionId(sub),
            visible,
            strength_icon: IconId(20),
            inet_condition: InetCondition::Full,
            activity_icon: IconId(21),
            type_icon: IconId(22),
            description: Some("3 bars".to_string()),
            type_description: Some("LTE".to_string()),
            roaming: false,
            wide_type_icon: false,
            no_sim_icon: IconId(23),
        }
    }

    #[test]
    fn test_report_mobile_registers_lazily() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        model.report_mobile(report(7, true)).unwrap();

        let entry = model.registry().get(SubscriptionId(7)).unwrap();
        assert!(entry.visible);
        assert_eq!(entry.content_description(), "LTE 3 bars");
        assert_eq!(model.signals().inet_condition(), InetCondition::Full);
        assert_eq!(model.signals().no_sim_icon(), IconId(23));
    }

    #[test]
    fn test_report_mobile_missing_description_writes_nothing() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        let mut bad = report(7, true);
        bad.description = None;

        let err = model.report_mobile(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidSignalData { field: "mobile.description" }));
        assert!(model.registry().is_empty());
        assert_eq!(model.signals().inet_condition(), InetCondition::Limited);
        assert_eq!(model.signals().no_sim_icon(), IconId::NONE);
    }

    #[test]
    fn test_activity_per_subscription_by_default() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        model.report_mobile(report(1, true)).unwrap();

        assert_eq!(model.registry().get(SubscriptionId(1)).unwrap().activity_icon, IconId(21));
        assert!(!model.signals().data_visible());
    }

    #[test]
    fn test_activity_moves_to_shared_indicator() {
        let config = ClusterConfig {
            show_mobile_activity: false,
            ..ClusterConfig::default()
        };
        let mut model = ClusterModel::new(config);
        model.report_mobile(report(1, true)).unwrap();

        assert_eq!(
            model.registry().get(SubscriptionId(1)).unwrap().activity_icon,
            IconId::NONE
        );
        assert!(model.signals().data_visible());
        assert_eq!(model.signals().data_activity_icon(), IconId(21));

        let mut idle = report(1, true);
        idle.activity_icon = IconId::NONE;
        model.report_mobile(idle).unwrap();
        assert!(!model.signals().data_visible());
    }

    #[test]
    fn test_shared_activity_leaves_no_empty_slots() {
        let config = ClusterConfig {
            show_mobile_activity: false,
            ..ClusterConfig::default()
        };
        let mut model = ClusterModel::new(config);
        model.report_no_sims(true);
        let mut first = report(1, true);
        first.no_sim_icon = IconId::NONE;
        model.report_mobile(first).unwrap();

        let state = model.resolve().unwrap();
        assert!(!state.no_sim.visible);
        assert!(!state.mobiles[0].activity.visible);
        assert!(state.data_activity.visible);
        assert_eq!(state.data_activity.icon, IconId(21));
    }

    #[test]
    fn test_update_unknown_subscription() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        model.report_subscriptions(&[SubscriptionId(1)]);
        let err = model
            .update_subscription(SubscriptionId(5), MobileUpdate::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSubscription(SubscriptionId(5))));
    }

    #[test]
    fn test_apply_settings_rederives_theme() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        let red = Color(0xffff_0000);
        let raw = SettingsSnapshot::default().with(SettingKey::NetworkIconsNormalColor, red);
        model.apply_settings(&raw);

        assert_eq!(model.theme().normal, red);
        assert_eq!(model.theme().full, red);
        assert_eq!(model.theme().airplane, red);
        assert_eq!(model.theme().activity_normal, crate::theme::DEFAULT_ACTIVITY_COLOR);
    }

    #[test]
    fn test_resolve_uses_config_style() {
        let config = ClusterConfig {
            style: crate::resolver::StyleMode::DefaultData,
            ..ClusterConfig::default()
        };
        let mut model = ClusterModel::new(config);
        model.report_mobile(report(1, true)).unwrap();

        let state = model.resolve().unwrap();
        assert!(state.mobiles[0].group.visible);
        assert!(!state.mobiles[0].type_icon.visible);
    }

    #[test]
    fn test_layout_direction_carried_into_state() {
        let mut model = ClusterModel::new(ClusterConfig::default());
        model.set_layout_direction(LayoutDirection::Rtl);
        assert_eq!(model.resolve().unwrap().layout_direction, LayoutDirection::Rtl);
    }
}
