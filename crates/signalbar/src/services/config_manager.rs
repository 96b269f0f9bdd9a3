//! Configuration manager with live reload support.
//!
//! This service owns the loaded configuration, exposes the `[colors]` table
//! as the cluster's settings source, and watches the config file for changes.
//!
//! ## Architecture
//!
//! - A file watcher thread monitors `config.toml` for modifications.
//! - On change, the new config is parsed and validated.
//! - If valid, the color settings are swapped and the cluster is notified
//!   once for the whole batch. The next resolution pass re-derives the theme.
//! - Invalid reloads are logged and the previous settings stay in effect.
//!
//! ## Supported Live Reload
//!
//! - `colors.*`: all five color keys.
//! - `cluster.*` is fixed when the cluster starts; changes are reported and
//!   take effect on restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use signalbar_core::{ClusterConfig, ClusterHandle, Config, SettingsSnapshot, SettingsSource};

/// Debounce interval (in ms) for file change events. Editors often trigger
/// multiple events for a single save; this batches them into one reload.
const FILE_CHANGE_DEBOUNCE_MS: u64 = 300;

/// Outcome of reloading the config file.
#[derive(Debug)]
pub enum ConfigMessage {
    /// A new valid config was loaded.
    Reloaded(Box<Config>),
    /// Config file changed but failed to load/validate.
    Error(String),
}

/// Manages configuration state and live reload.
pub struct ConfigManager {
    /// Current configuration.
    config: RwLock<Config>,
    /// Color settings read by the resolution context.
    settings: Arc<RwLock<SettingsSnapshot>>,
    /// Path to the config file being watched (if any).
    config_path: Option<PathBuf>,
    /// Shutdown flag for the file watcher thread.
    shutdown_flag: Arc<AtomicBool>,
}

impl ConfigManager {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Arc<Self> {
        let settings = Arc::new(RwLock::new(config.snapshot()));
        Arc::new(Self {
            config: RwLock::new(config),
            settings,
            config_path,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Cluster layout the cluster should be started with.
    pub fn cluster_config(&self) -> ClusterConfig {
        self.config.read().cluster.clone()
    }

    /// Settings source handed to the cluster.
    pub fn settings_source(&self) -> Arc<dyn SettingsSource> {
        self.settings.clone()
    }

    /// Start watching the config file for changes.
    ///
    /// This spawns a background thread that monitors the config file. Valid
    /// changes are applied and reported to `handle`.
    ///
    /// Does nothing if no config file path is set (using defaults).
    pub fn start_watching(self: &Arc<Self>, handle: ClusterHandle) {
        let Some(path) = self.config_path.clone() else {
            info!("No config file to watch (using defaults)");
            return;
        };

        if !path.exists() {
            warn!(
                "Config file does not exist, cannot watch: {}",
                path.display()
            );
            return;
        }

        info!("Starting config file watcher for: {}", path.display());

        let manager = Arc::clone(self);
        thread::spawn(move || {
            manager.run_file_watcher(path, handle);
        });
    }

    /// Run the file watcher loop (called on a background thread).
    fn run_file_watcher(self: Arc<Self>, path: PathBuf, handle: ClusterHandle) {
        // Debounce events to avoid multiple reloads for a single save
        let debounce_duration = Duration::from_millis(FILE_CHANGE_DEBOUNCE_MS);

        // Canonicalize the path so we can compare with absolute paths from notify
        let canonical_path = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to canonicalize config path: {}", e);
                return;
            }
        };

        let path_for_handler = canonical_path.clone();
        let manager = Arc::clone(&self);
        let mut debouncer =
            match new_debouncer(debounce_duration, move |res: DebounceEventResult| match res {
                Ok(events) => {
                    if events.iter().any(|e| e.path == path_for_handler) {
                        debug!("Config file change detected");
                        let msg = reload(&path_for_handler);
                        manager.handle_config_message(msg, &handle);
                    }
                }
                Err(err) => {
                    error!("File watcher error: {}", err);
                }
            }) {
                Ok(d) => d,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

        // Watch the parent directory (more reliable than watching the file directly)
        let watch_dir = canonical_path.parent().unwrap_or(&canonical_path);
        if let Err(e) = debouncer
            .watcher()
            .watch(watch_dir, RecursiveMode::NonRecursive)
        {
            error!("Failed to watch config directory: {}", e);
            return;
        }

        info!("File watcher started, watching: {}", watch_dir.display());

        // Short sleeps keep shutdown responsive
        while !self.shutdown_flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(500));
        }

        debug!("Config file watcher thread shutting down");
    }

    /// Handle the result of a reload.
    pub fn handle_config_message(&self, msg: ConfigMessage, handle: &ClusterHandle) {
        match msg {
            ConfigMessage::Reloaded(new_config) => {
                self.apply_config(*new_config, handle);
            }
            ConfigMessage::Error(err) => {
                // Keep using the old config
                error!("Config reload error: {}", err);
            }
        }
    }

    /// Apply a new configuration.
    ///
    /// Returns whether the cluster was asked to recompute.
    fn apply_config(&self, new_config: Config, handle: &ClusterHandle) -> bool {
        let mut config = self.config.write();

        if cluster_changed(&config, &new_config) {
            warn!("[cluster] changes take effect after restart");
        }

        if !colors_changed(&config, &new_config) {
            debug!("Color settings unchanged");
            return false;
        }

        info!("Color settings changed, updating theme...");
        *self.settings.write() = new_config.snapshot();
        config.colors = new_config.colors;

        if let Err(e) = handle.notify_settings_changed() {
            warn!("Could not notify cluster of new settings: {}", e);
            return false;
        }
        true
    }

    /// Stop watching the config file.
    pub fn stop_watching(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        debug!("Config watcher stopped");
    }
}

/// Reload config from file and validate it.
fn reload(path: &Path) -> ConfigMessage {
    match Config::load(path) {
        Ok(new_config) => {
            if let Err(e) = new_config.validate() {
                let msg = format!("Config validation failed: {}", e);
                warn!("{}", msg);
                return ConfigMessage::Error(msg);
            }

            for warning in new_config.warnings() {
                warn!("{}", warning);
            }
            info!("Config reloaded successfully from: {}", path.display());
            ConfigMessage::Reloaded(Box::new(new_config))
        }
        Err(e) => {
            let msg = format!("Failed to reload config: {}", e);
            warn!("{}", msg);
            ConfigMessage::Error(msg)
        }
    }
}

/// Check if any color setting has changed.
fn colors_changed(old: &Config, new: &Config) -> bool {
    old.colors != new.colors
}

/// Check if the cluster layout has changed.
fn cluster_changed(old: &Config, new: &Config) -> bool {
    if old.cluster.style != new.cluster.style {
        debug!(
            "cluster.style changed ({} -> {})",
            old.cluster.style.name(),
            new.cluster.style.name()
        );
        return true;
    }

    old.cluster != new.cluster
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbar_core::{ClusterRenderState, SettingKey, SignalCluster};

    fn start_cluster(manager: &ConfigManager) -> ClusterHandle {
        SignalCluster::start(
            manager.cluster_config(),
            manager.settings_source(),
            Arc::new(AtomicBool::new(false)),
            |_: &ClusterRenderState| {},
        )
        .unwrap()
    }

    fn config_with_normal(color: &str) -> Config {
        let mut config = Config::default();
        config.colors.network_icons_normal_color = Some(color.to_string());
        config
    }

    #[test]
    fn test_colors_changed() {
        let old = Config::default();
        let mut new = Config::default();
        assert!(!colors_changed(&old, &new));

        new.colors.airplane_mode_icon_color = Some("#ff0000".to_string());
        assert!(colors_changed(&old, &new));
    }

    #[test]
    fn test_cluster_changed() {
        let old = Config::default();
        let mut new = Config::default();
        assert!(!cluster_changed(&old, &new));

        new.cluster.secondary_telephony_padding = 9;
        assert!(cluster_changed(&old, &new));
    }

    #[test]
    fn test_initial_settings_from_config() {
        let manager = ConfigManager::new(config_with_normal("#00ff00"), None);
        let snapshot = manager.settings_source().snapshot();
        assert_eq!(
            snapshot.get(SettingKey::NetworkIconsNormalColor).map(|c| c.0),
            Some(0xff00_ff00)
        );
    }

    #[test]
    fn test_reload_swaps_colors_and_notifies() {
        let manager = ConfigManager::new(Config::default(), None);
        let handle = start_cluster(&manager);

        let applied = manager.apply_config(config_with_normal("#0000ff"), &handle);
        assert!(applied);
        let snapshot = manager.settings_source().snapshot();
        assert_eq!(
            snapshot.get(SettingKey::NetworkIconsNormalColor).map(|c| c.0),
            Some(0xff00_00ff)
        );
        handle.shutdown();
    }

    #[test]
    fn test_reload_without_color_change_is_quiet() {
        let manager = ConfigManager::new(Config::default(), None);
        let handle = start_cluster(&manager);

        let mut new = Config::default();
        new.cluster.wide_type_icon_start_padding = 7;
        assert!(!manager.apply_config(new, &handle));
        // Cluster layout is not swapped live
        assert_eq!(manager.cluster_config().wide_type_icon_start_padding, 2);
        handle.shutdown();
    }

    #[test]
    fn test_reload_error_keeps_settings() {
        let manager = ConfigManager::new(config_with_normal("#00ff00"), None);
        let handle = start_cluster(&manager);

        manager.handle_config_message(ConfigMessage::Error("bad".to_string()), &handle);
        assert!(
            manager
                .settings_source()
                .snapshot()
                .get(SettingKey::NetworkIconsNormalColor)
                .is_some()
        );
        handle.shutdown();
    }

    #[test]
    fn test_reload_rejects_invalid_file() {
        let dir = std::env::temp_dir().join(format!("signalbar-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[colors]\nnetwork_icons_normal_color = \"teal\"\n").unwrap();

        assert!(matches!(reload(&path), ConfigMessage::Error(_)));

        std::fs::write(&path, "[colors]\nnetwork_icons_normal_color = \"#008080\"\n").unwrap();
        assert!(matches!(reload(&path), ConfigMessage::Reloaded(_)));
    }

    #[test]
    fn test_start_watching_without_path_is_noop() {
        let manager = ConfigManager::new(Config::default(), None);
        let handle = start_cluster(&manager);
        manager.start_watching(handle.clone());
        manager.stop_watching();
        handle.shutdown();
    }
}
