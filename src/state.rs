use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::gate::AccessGate;
use crate::license::LicenseWatch;
use crate::models::LicenseState;
use crate::store::{StorageGateway, StoreResult};
use crate::trial::{TrialStatus, TrialTimer};
use crate::util::now_millis;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn StorageGateway>,
    pub license: LicenseWatch,
    /// Published countdown, ticking once a second
    pub trial: watch::Receiver<TrialStatus>,
    pub trial_window_ms: i64,
    pub dev_mode: bool,
}

impl AppState {
    /// Load the license record and start the countdown and reconciler
    /// tasks. Both stop when `cancel` fires.
    pub async fn start(
        gateway: Arc<dyn StorageGateway>,
        config: &Config,
        cancel: &CancellationToken,
    ) -> StoreResult<Self> {
        let license = LicenseWatch::load(gateway.clone()).await?;
        license.spawn_reconciler(config.license_poll, cancel.child_token());
        let trial_window_ms = config.trial_window_ms();
        let trial = TrialTimer::spawn(license.subscribe(), trial_window_ms, cancel.child_token());

        Ok(Self {
            gateway,
            license,
            trial,
            trial_window_ms,
            dev_mode: config.dev_mode,
        })
    }

    /// Trial status of `license` as of now.
    pub fn trial_status(&self, license: &LicenseState) -> TrialStatus {
        TrialStatus::at(license.trial_start_date, self.trial_window_ms, now_millis())
    }

    /// Evaluate the gate against the latest license.
    pub fn gate(&self) -> AccessGate {
        let snapshot = self.license.current();
        AccessGate::new(&snapshot.license, &self.trial_status(&snapshot.license))
    }
}
