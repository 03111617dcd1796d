use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LicensePlan {
    Trial,
    Monthly,
    Yearly,
    Lifetime,
}

/// The installation's single trial/license record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseState {
    /// Milliseconds since epoch when the trial began
    pub trial_start_date: i64,
    /// Empty while unlicensed
    #[serde(default)]
    pub license_key: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_trial: bool,
    pub plan_type: LicensePlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<i64>,
    /// License key -> year it was redeemed
    #[serde(default)]
    pub key_history: BTreeMap<String, i32>,
}

fn default_true() -> bool {
    true
}

impl LicenseState {
    /// A fresh, unlicensed trial starting at `started_at` (ms).
    pub fn new_trial(started_at: i64) -> Self {
        Self {
            trial_start_date: started_at,
            license_key: String::new(),
            is_active: false,
            is_trial: true,
            plan_type: LicensePlan::Trial,
            activation_date: None,
            key_history: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivateLicense {
    pub license_key: String,
    pub plan_type: LicensePlan,
}
