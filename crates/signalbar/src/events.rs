//! JSON-lines signal feed.
//!
//! Each input line is one event object tagged by `type`:
//!
//! ```text
//! {"type":"subscriptions","ids":[1,2]}
//! {"type":"mobile","sub_id":1,"visible":true,"strength_icon":12,"type_icon":4,
//!  "description":"3 bars","type_description":"LTE"}
//! {"type":"wifi","visible":true,"strength_icon":7,"description":"Home-5G"}
//! {"type":"vpn","enabled":true}
//! ```
//!
//! Icon ids are plain integers, `0` meaning "no icon". Omitted booleans and
//! icons default to false/0. Omitted descriptions are rejected, as a missing
//! description is invalid signal data.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::{debug, warn};

use signalbar_core::{
    AirplaneIndicators, ClusterHandle, Error, IconId, InetCondition, LayoutDirection,
    MobileReport, SubscriptionId, WifiIndicators,
};

/// One line of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalEvent {
    Wifi {
        #[serde(default)]
        visible: bool,
        #[serde(default)]
        strength_icon: IconId,
        #[serde(default)]
        inet_condition: InetCondition,
        #[serde(default)]
        activity_icon: IconId,
        description: Option<String>,
    },
    Mobile {
        sub_id: SubscriptionId,
        #[serde(default)]
        visible: bool,
        #[serde(default)]
        strength_icon: IconId,
        #[serde(default)]
        inet_condition: InetCondition,
        #[serde(default)]
        activity_icon: IconId,
        #[serde(default)]
        type_icon: IconId,
        description: Option<String>,
        type_description: Option<String>,
        #[serde(default)]
        roaming: bool,
        #[serde(default)]
        wide_type_icon: bool,
        #[serde(default)]
        no_sim_icon: IconId,
    },
    NoSims {
        visible: bool,
    },
    Subscriptions {
        ids: Vec<SubscriptionId>,
    },
    AirplaneMode {
        enabled: bool,
        #[serde(default)]
        icon: IconId,
        description: Option<String>,
    },
    Vpn {
        enabled: bool,
    },
    LayoutDirection {
        direction: LayoutDirection,
    },
}

impl SignalEvent {
    /// Deliver the event to the cluster.
    ///
    /// VPN events update `vpn` (the security source) and then notify; the
    /// cluster reads the new value inside its resolution context.
    pub fn apply(self, handle: &ClusterHandle, vpn: &AtomicBool) -> signalbar_core::Result<()> {
        match self {
            SignalEvent::Wifi {
                visible,
                strength_icon,
                inet_condition,
                activity_icon,
                description,
            } => handle.report_wifi(WifiIndicators {
                visible,
                strength_icon,
                inet_condition,
                activity_icon,
                description,
            }),
            SignalEvent::Mobile {
                sub_id,
                visible,
                strength_icon,
                inet_condition,
                activity_icon,
                type_icon,
                description,
                type_description,
                roaming,
                wide_type_icon,
                no_sim_icon,
            } => handle.report_mobile(MobileReport {
                sub_id,
                visible,
                strength_icon,
                inet_condition,
                activity_icon,
                type_icon,
                description,
                type_description,
                roaming,
                wide_type_icon,
                no_sim_icon,
            }),
            SignalEvent::NoSims { visible } => handle.report_no_sims(visible),
            SignalEvent::Subscriptions { ids } => handle.report_subscriptions(&ids),
            SignalEvent::AirplaneMode {
                enabled,
                icon,
                description,
            } => handle.report_airplane_mode(AirplaneIndicators {
                enabled,
                icon,
                description,
            }),
            SignalEvent::Vpn { enabled } => {
                vpn.store(enabled, Ordering::SeqCst);
                handle.notify_vpn_changed()
            }
            SignalEvent::LayoutDirection { direction } => {
                handle.layout_direction_changed(direction)
            }
        }
    }
}

/// Counters for one run of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

/// Read events until EOF.
///
/// Blank lines and lines starting with `#` are skipped. Malformed lines and
/// rejected events are logged and counted; only a stopped cluster or a read
/// error ends the feed early.
pub fn run_feed<R: BufRead>(
    reader: R,
    handle: &ClusterHandle,
    vpn: &AtomicBool,
) -> anyhow::Result<FeedStats> {
    let mut stats = FeedStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read input line {}", line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: SignalEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                warn!("Line {}: malformed event: {}", line_no, e);
                stats.malformed += 1;
                continue;
            }
        };
        debug!("Line {}: {:?}", line_no, event);

        match event.apply(handle, vpn) {
            Ok(()) => stats.applied += 1,
            Err(Error::BridgeStopped) => bail!("signal cluster stopped at input line {}", line_no),
            Err(e) => {
                warn!("Line {}: event rejected: {}", line_no, e);
                stats.rejected += 1;
            }
        }
    }

    Ok(stats)
}
