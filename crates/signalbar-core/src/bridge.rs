//! Serialized resolution context for the signal cluster.
//!
//! ## Architecture
//!
//! - Reports and notifications may arrive on any thread. Each report is
//!   applied to the [`ClusterModel`] under one mutex, then a "recompute
//!   needed" token is offered to a channel of depth one.
//! - A single worker thread owns the [`Renderer`]. For every token it runs one
//!   full pass: pick up pending settings/VPN refreshes, resolve under the model
//!   lock, release the lock, render.
//! - Coalescing: while a token is already queued, `try_send` fails with `Full`
//!   and the notification folds into the queued pass, which reads the freshest
//!   state when it runs.
//! - Settings and VPN notifications only set a flag. The worker reads the
//!   [`SettingsSource`] and [`SecuritySource`] itself, so those values are
//!   always applied inside the resolution context.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::model::{ClusterModel, MobileReport};
use crate::registry::{MobileUpdate, SubscriptionId};
use crate::render::Renderer;
use crate::signal::{AirplaneIndicators, LayoutDirection, WifiIndicators};
use crate::theme::SettingsSource;

/// Supplies the current VPN state.
pub trait SecuritySource: Send + Sync {
    fn is_vpn_enabled(&self) -> bool;
}

impl SecuritySource for AtomicBool {
    fn is_vpn_enabled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Resolution context state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    #[default]
    Idle,
    Resolving,
}

/// Refreshes requested since the last pass started.
#[derive(Debug, Clone, Copy, Default)]
struct PendingWork {
    settings: bool,
    vpn: bool,
}

/// State shared between handles and the worker.
struct Shared {
    model: Mutex<ClusterModel>,
    pending: Mutex<PendingWork>,
    state: Mutex<BridgeState>,
    passes: AtomicU64,
    settings: Arc<dyn SettingsSource>,
    security: Arc<dyn SecuritySource>,
}

impl Shared {
    /// Run one full pass.
    fn run_pass(&self, renderer: &mut dyn Renderer) {
        *self.state.lock() = BridgeState::Resolving;

        let pending = std::mem::take(&mut *self.pending.lock());
        let settings = pending.settings.then(|| self.settings.snapshot());
        let vpn = pending.vpn.then(|| self.security.is_vpn_enabled());

        let resolved = {
            let mut model = self.model.lock();
            if let Some(raw) = settings {
                model.apply_settings(&raw);
            }
            if let Some(enabled) = vpn {
                debug!("VPN state refreshed: {}", enabled);
                model.set_vpn(enabled);
            }
            model.resolve()
        };

        match resolved {
            Ok(state) => {
                renderer.render(&state);
                let passes = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
                trace!("Resolution pass {} rendered", passes);
            }
            Err(e) => error!("Resolution pass skipped: {}", e),
        }

        *self.state.lock() = BridgeState::Idle;
    }
}

/// Worker loop: one pass per token, until every sender is gone.
fn resolution_loop(shared: Arc<Shared>, rx: Receiver<()>, mut renderer: Box<dyn Renderer>) {
    debug!("Resolution context running");
    while rx.recv().is_ok() {
        shared.run_pass(renderer.as_mut());
    }
    debug!("Resolution context stopped");
}

/// Entry point for starting a cluster.
pub struct SignalCluster;

impl SignalCluster {
    /// Start the resolution context and schedule the initial pass.
    ///
    /// The initial pass reads both the settings source and the security
    /// source, so the first render already carries the configured colors and
    /// the current VPN state.
    pub fn start<R>(
        config: ClusterConfig,
        settings: Arc<dyn SettingsSource>,
        security: Arc<dyn SecuritySource>,
        renderer: R,
    ) -> Result<ClusterHandle>
    where
        R: Renderer + 'static,
    {
        info!("Starting signal cluster (style {})", config.style.name());

        let shared = Arc::new(Shared {
            model: Mutex::new(ClusterModel::new(config)),
            pending: Mutex::new(PendingWork {
                settings: true,
                vpn: true,
            }),
            state: Mutex::new(BridgeState::Idle),
            passes: AtomicU64::new(0),
            settings,
            security,
        });

        let (tx, rx) = sync_channel(1);
        let worker_shared = Arc::clone(&shared);
        let renderer: Box<dyn Renderer> = Box::new(renderer);
        let worker = thread::Builder::new()
            .name("signalbar-resolve".into())
            .spawn(move || resolution_loop(worker_shared, rx, renderer))?;

        let handle = ClusterHandle {
            inner: Arc::new(HandleInner {
                shared,
                sender: Mutex::new(Some(tx)),
                worker: Mutex::new(Some(worker)),
            }),
        };
        handle.schedule()?;
        Ok(handle)
    }
}

struct HandleInner {
    shared: Arc<Shared>,
    sender: Mutex<Option<SyncSender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HandleInner {
    fn shutdown(&self) {
        // Dropping the sender lets the worker drain the queued token and exit
        if self.sender.lock().take().is_none() {
            return;
        }

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            // Last handle dropped from inside a render call
            return;
        }
        if worker.join().is_err() {
            error!("Resolution context panicked");
        }
        info!("Signal cluster stopped");
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Cloneable, thread-safe handle to a running cluster.
#[derive(Clone)]
pub struct ClusterHandle {
    inner: Arc<HandleInner>,
}

impl ClusterHandle {
    /// Apply `f` to the model as one writer section, then schedule a pass.
    ///
    /// Rejected reports leave the model as it was and schedule nothing.
    fn mutate<T>(&self, f: impl FnOnce(&mut ClusterModel) -> Result<T>) -> Result<T> {
        let sender = self.inner.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return Err(Error::BridgeStopped);
        };
        let value = f(&mut self.inner.shared.model.lock())?;
        offer(tx)?;
        Ok(value)
    }

    /// Mark work pending and schedule a pass.
    fn notify(&self, mark: impl FnOnce(&mut PendingWork)) -> Result<()> {
        let sender = self.inner.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return Err(Error::BridgeStopped);
        };
        mark(&mut self.inner.shared.pending.lock());
        offer(tx)
    }

    fn schedule(&self) -> Result<()> {
        self.notify(|_| {})
    }

    pub fn report_wifi(&self, wifi: WifiIndicators) -> Result<()> {
        self.mutate(|model| model.report_wifi(wifi))
    }

    pub fn report_mobile(&self, report: MobileReport) -> Result<()> {
        self.mutate(|model| model.report_mobile(report))
    }

    pub fn update_subscription(&self, id: SubscriptionId, update: MobileUpdate) -> Result<()> {
        self.mutate(|model| model.update_subscription(id, update))
    }

    pub fn report_no_sims(&self, visible: bool) -> Result<()> {
        self.mutate(|model| {
            model.report_no_sims(visible);
            Ok(())
        })
    }

    /// Replace the subscription list. A pass sees either the old list or the
    /// new one, never a mix.
    pub fn report_subscriptions(&self, ids: &[SubscriptionId]) -> Result<()> {
        self.mutate(|model| {
            model.report_subscriptions(ids);
            Ok(())
        })
    }

    pub fn report_airplane_mode(&self, airplane: AirplaneIndicators) -> Result<()> {
        self.mutate(|model| model.report_airplane_mode(airplane))
    }

    /// The settings source changed; the next pass re-derives the theme.
    pub fn notify_settings_changed(&self) -> Result<()> {
        self.notify(|pending| pending.settings = true)
    }

    /// The security source changed; the next pass re-reads the VPN state.
    pub fn notify_vpn_changed(&self) -> Result<()> {
        self.notify(|pending| pending.vpn = true)
    }

    pub fn layout_direction_changed(&self, direction: LayoutDirection) -> Result<()> {
        self.mutate(|model| {
            model.set_layout_direction(direction);
            Ok(())
        })
    }

    pub fn state(&self) -> BridgeState {
        *self.inner.shared.state.lock()
    }

    /// Number of passes rendered so far.
    pub fn passes(&self) -> u64 {
        self.inner.shared.passes.load(Ordering::SeqCst)
    }

    /// Resolve the current state on the calling thread, without rendering.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Result<crate::render::ClusterRenderState> {
        self.inner.shared.model.lock().resolve()
    }

    /// Stop accepting reports, let queued work finish and join the worker.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

/// Offer a token; a full queue means a pass is already pending.
fn offer(tx: &SyncSender<()>) -> Result<()> {
    match tx.try_send(()) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(())) => {
            trace!("Pass already pending, coalescing");
            Ok(())
        }
        Err(TrySendError::Disconnected(())) => Err(Error::BridgeStopped),
    }
}
