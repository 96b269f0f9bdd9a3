//! Signal cluster state resolution for status bars.
//!
//! Radio, security and settings sources report into a [`ClusterHandle`];
//! every change produces one complete [`ClusterRenderState`] delivered to a
//! [`Renderer`] from a single resolution thread.

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod signal;
pub mod theme;

pub use bridge::{BridgeState, ClusterHandle, SecuritySource, SignalCluster};
pub use config::{ClusterConfig, ColorSettings, Config, ConfigLoadResult, DEFAULT_CONFIG_TOML};
pub use error::{Error, Result};
pub use model::{ClusterModel, MobileReport};
pub use registry::{MobileIndicators, MobileUpdate, SubscriptionId, SubscriptionRegistry};
pub use render::{ClusterRenderState, MobileRenderState, Renderer, SlotState};
pub use resolver::{LayoutMetrics, ResolverInputs, StyleMode, resolve};
pub use signal::{
    AirplaneIndicators, IconId, InetCondition, LayoutDirection, SignalState, WifiIndicators,
};
pub use theme::{Color, SettingKey, SettingsSnapshot, SettingsSource, ThemeColors};
