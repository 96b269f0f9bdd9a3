//! End-to-end tests: reports in through a `ClusterHandle`, render states out
//! through a channel renderer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use parking_lot::RwLock;
use signalbar_core::{
    AirplaneIndicators, ClusterConfig, ClusterHandle, ClusterRenderState, Color, IconId,
    InetCondition, LayoutDirection, MobileReport, SettingKey, SettingsSnapshot, SignalCluster,
    StyleMode, SubscriptionId, WifiIndicators,
};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    handle: ClusterHandle,
    rendered: Receiver<ClusterRenderState>,
    settings: Arc<RwLock<SettingsSnapshot>>,
    vpn: Arc<AtomicBool>,
}

impl Harness {
    fn start(config: ClusterConfig) -> Self {
        let settings = Arc::new(RwLock::new(SettingsSnapshot::default()));
        let vpn = Arc::new(AtomicBool::new(false));
        let (tx, rendered) = channel();

        let handle = SignalCluster::start(
            config,
            settings.clone(),
            vpn.clone(),
            move |state: &ClusterRenderState| {
                let _ = tx.send(state.clone());
            },
        )
        .unwrap();

        Self {
            handle,
            rendered,
            settings,
            vpn,
        }
    }

    /// Stop the cluster and return the state of the last pass.
    fn finish(self) -> ClusterRenderState {
        self.handle.shutdown();
        self.rendered
            .try_iter()
            .last()
            .expect("at least one pass rendered")
    }
}

fn mobile(sub: i32, type_icon: u32) -> MobileReport {
    MobileReport {
        sub_id: SubscriptionId(sub),
        visible: true,
        strength_icon: IconId(10 + sub as u32),
        inet_condition: InetCondition::Full,
        activity_icon: IconId(30),
        type_icon: IconId(type_icon),
        description: Some(format!("{} bars", sub + 2)),
        type_description: Some("LTE".to_string()),
        roaming: false,
        wide_type_icon: false,
        no_sim_icon: IconId(40),
    }
}

#[test]
fn test_initial_pass_renders_empty_cluster() {
    let harness = Harness::start(ClusterConfig::default());
    let first = harness.rendered.recv_timeout(TIMEOUT).unwrap();

    assert!(!first.vpn.visible);
    assert!(!first.wifi_group.visible);
    assert!(first.mobiles.is_empty());
    assert!(!first.airplane.visible);
    assert_eq!(first.content_descriptions().count(), 0);
}

#[test]
fn test_dual_sim_cluster() {
    let harness = Harness::start(ClusterConfig::default());
    let handle = &harness.handle;

    handle
        .report_subscriptions(&[SubscriptionId(1), SubscriptionId(2)])
        .unwrap();
    handle.report_mobile(mobile(1, 5)).unwrap();
    handle.report_mobile(mobile(2, 6)).unwrap();

    let state = harness.finish();
    let first = state.mobile(SubscriptionId(1)).unwrap();
    let second = state.mobile(SubscriptionId(2)).unwrap();

    assert!(first.type_icon.visible);
    assert!(second.type_icon.visible);
    assert_eq!(first.group.padding_start, 0);
    assert_eq!(second.group.padding_start, 4);
    assert_eq!(
        state.content_descriptions().collect::<Vec<_>>(),
        vec!["LTE 3 bars", "LTE 4 bars"]
    );
}

#[test]
fn test_wifi_with_no_sim() {
    let harness = Harness::start(ClusterConfig::default());
    let handle = &harness.handle;

    handle
        .report_wifi(WifiIndicators {
            visible: true,
            strength_icon: IconId(3),
            inet_condition: InetCondition::Limited,
            activity_icon: IconId(4),
            description: Some("Home-5G".to_string()),
        })
        .unwrap();
    handle.report_no_sims(true).unwrap();
    // The radio supplies the no-SIM icon with its mobile reports
    handle
        .report_mobile(MobileReport {
            no_sim_icon: IconId(60),
            ..mobile(1, 0)
        })
        .unwrap();
    handle.report_subscriptions(&[]).unwrap();

    let state = harness.finish();
    assert!(state.wifi_group.visible);
    assert!(state.mobiles.is_empty());
    assert!(state.no_sim.visible);
    assert_eq!(state.no_sim.icon, IconId(60));
    assert!(state.wifi_signal_spacer.visible);
}

#[test]
fn test_no_sim_hidden_until_icon_known() {
    let harness = Harness::start(ClusterConfig::default());
    harness.handle.report_no_sims(true).unwrap();

    let state = harness.finish();
    assert!(!state.no_sim.visible);
    assert_eq!(state.no_sim.icon, IconId::NONE);
}

#[test]
fn test_airplane_mode_hides_mobiles() {
    let harness = Harness::start(ClusterConfig::default());
    let handle = &harness.handle;

    handle.report_mobile(mobile(1, 5)).unwrap();
    handle.report_no_sims(true).unwrap();
    handle
        .report_airplane_mode(AirplaneIndicators {
            enabled: true,
            icon: IconId(50),
            description: Some("Airplane mode".to_string()),
        })
        .unwrap();

    let state = harness.finish();
    assert_eq!(state.visible_mobile_count(), 0);
    assert!(!state.no_sim.visible);
    assert!(state.airplane.visible);
    assert_eq!(state.airplane.icon, IconId(50));
}

#[test]
fn test_settings_and_vpn_changes_are_picked_up() {
    let harness = Harness::start(ClusterConfig::default());
    harness.handle.report_mobile(mobile(1, 5)).unwrap();

    let teal = Color(0xff00_8080);
    harness
        .settings
        .write()
        .set(SettingKey::NetworkIconsFullyColor, Some(teal));
    harness.handle.notify_settings_changed().unwrap();

    harness.vpn.store(true, Ordering::SeqCst);
    harness.handle.notify_vpn_changed().unwrap();

    let state = harness.finish();
    assert!(state.vpn.visible);
    assert_eq!(state.mobiles[0].strength.color_filter, Some(teal));
}

#[test]
fn test_layout_direction_change_triggers_pass() {
    let harness = Harness::start(ClusterConfig::default());
    harness.rendered.recv_timeout(TIMEOUT).unwrap();

    harness
        .handle
        .layout_direction_changed(LayoutDirection::Rtl)
        .unwrap();
    let state = harness.rendered.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(state.layout_direction, LayoutDirection::Rtl);
}

#[test]
fn test_data_voice_marks_two_bar_subscriptions() {
    let config = ClusterConfig {
        style: StyleMode::DataVoice,
        show_voice_and_data_for_sub: vec![SubscriptionId(2)],
        ..ClusterConfig::default()
    };
    let harness = Harness::start(config);
    harness.handle.report_mobile(mobile(1, 5)).unwrap();
    harness.handle.report_mobile(mobile(2, 5)).unwrap();

    let state = harness.finish();
    assert!(!state.mobile(SubscriptionId(1)).unwrap().two_bars);
    assert!(state.mobile(SubscriptionId(2)).unwrap().two_bars);
    assert!(state.mobiles.iter().all(|m| !m.type_icon.visible));
}

#[test]
fn test_handle_usable_from_many_threads() {
    let harness = Harness::start(ClusterConfig::default());

    let workers: Vec<_> = (1..=4)
        .map(|sub| {
            let handle = harness.handle.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    handle.report_mobile(mobile(sub, 5)).unwrap();
                    handle.notify_settings_changed().unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let state = harness.finish();
    assert_eq!(state.mobiles.len(), 4);
    assert_eq!(state.visible_mobile_count(), 4);
    let padded = state
        .mobiles
        .iter()
        .filter(|m| m.group.padding_start == 4)
        .count();
    assert_eq!(padded, 3);
}
