//! Observable license/settings holder and license activation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{ActivateLicense, AppSettings, LicensePlan, LicenseState};
use crate::store::{StorageGateway, StoreResult};
use crate::util::{now_millis, year_of};

const MIN_LICENSE_KEY_LEN: usize = 8;

/// What the gate and navigation read: the license record plus the
/// branding settings shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseSnapshot {
    pub license: LicenseState,
    pub settings: AppSettings,
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    /// The persisted store was changed by another process or context.
    StorageChanged,
    /// A settings or license write was made in this process.
    SettingsUpdated,
}

struct Inner {
    gateway: Arc<dyn StorageGateway>,
    tx: watch::Sender<LicenseSnapshot>,
    signals: mpsc::UnboundedSender<RefreshSignal>,
    signal_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<RefreshSignal>>>,
}

/// Holds the latest [`LicenseSnapshot`] and keeps it reconciled with the
/// store. Cheap to clone.
#[derive(Clone)]
pub struct LicenseWatch {
    inner: Arc<Inner>,
}

impl LicenseWatch {
    /// Read the current license and settings and build the holder.
    pub async fn load(gateway: Arc<dyn StorageGateway>) -> StoreResult<Self> {
        let snapshot = read_snapshot(gateway.as_ref()).await?;
        let (tx, _) = watch::channel(snapshot);
        let (signals, signal_rx) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(Inner {
                gateway,
                tx,
                signals,
                signal_rx: std::sync::Mutex::new(Some(signal_rx)),
            }),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<LicenseSnapshot> {
        self.inner.tx.subscribe()
    }

    pub fn current(&self) -> LicenseSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn gateway(&self) -> &Arc<dyn StorageGateway> {
        &self.inner.gateway
    }

    /// Re-read license and settings from the store and publish them if they
    /// changed. Every refresh trigger goes through here.
    pub async fn refresh(&self) -> StoreResult<()> {
        let snapshot = read_snapshot(self.inner.gateway.as_ref()).await?;
        self.inner.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        Ok(())
    }

    /// Ask the reconciler for a refresh. Dropped silently once it stopped.
    pub fn notify(&self, signal: RefreshSignal) {
        let _ = self.inner.signals.send(signal);
    }

    /// Run the reconciler: refresh on every signal and every `poll`. Only
    /// one reconciler can run per holder; later calls return None.
    pub fn spawn_reconciler(&self, poll: Duration, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let mut signals = self
            .inner
            .signal_rx
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())?;
        let watch = self.clone();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; the snapshot is already fresh.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                    signal = signals.recv() => match signal {
                        Some(signal) => tracing::debug!("License refresh requested: {:?}", signal),
                        None => break,
                    },
                }

                if let Err(e) = watch.refresh().await {
                    tracing::warn!("License refresh failed: {}", e);
                }
            }
            tracing::debug!("License reconciler stopped");
        }))
    }
}

async fn read_snapshot(gateway: &dyn StorageGateway) -> StoreResult<LicenseSnapshot> {
    Ok(LicenseSnapshot {
        license: gateway.get_license_state().await?,
        settings: gateway.get_settings().await?,
    })
}

/// Apply a license key to `state` at time `now` (ms).
///
/// A key already redeemed in a different calendar year is rejected;
/// re-applying it within the same year is allowed.
pub fn apply_license_key(state: &mut LicenseState, input: &ActivateLicense, now: i64) -> Result<()> {
    let key = input.license_key.trim();
    if key.chars().count() < MIN_LICENSE_KEY_LEN {
        return Err(AppError::Validation(format!(
            "License key must have at least {} characters",
            MIN_LICENSE_KEY_LEN
        )));
    }
    if input.plan_type == LicensePlan::Trial {
        return Err(AppError::Validation("Choose a paid plan to activate".into()));
    }

    let year = year_of(now);
    if let Some(&used_in) = state.key_history.get(key)
        && used_in != year
    {
        return Err(AppError::Validation(format!(
            "License key already used in {}",
            used_in
        )));
    }

    state.key_history.insert(key.to_string(), year);
    state.license_key = key.to_string();
    state.is_active = true;
    state.is_trial = false;
    state.plan_type = input.plan_type;
    state.activation_date = Some(now);
    Ok(())
}

/// Activate a license key against the stored record and publish the result.
pub async fn activate(watch: &LicenseWatch, input: &ActivateLicense) -> Result<LicenseState> {
    let gateway = watch.gateway();
    let mut state = gateway.get_license_state().await?;
    apply_license_key(&mut state, input, now_millis())?;
    gateway.save_license_state(&state).await?;

    tracing::info!("License activated with plan {}", state.plan_type.as_ref());
    watch.refresh().await?;
    Ok(state)
}

/// Restart the trial window from `now`. Dev mode only.
pub async fn reset_trial(watch: &LicenseWatch) -> Result<LicenseState> {
    let gateway = watch.gateway();
    let mut state = gateway.get_license_state().await?;
    state.trial_start_date = now_millis();
    gateway.save_license_state(&state).await?;

    tracing::info!("Trial window reset");
    watch.refresh().await?;
    Ok(state)
}
