//! Persistence gateway
//!
//! Record shapes for the `walking` table, the stores that hold them, sign-in
//! and the small amount of state kept between runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GatewayError, VitalRsError};
use crate::models::MetricType;
use crate::session::ActivitySummary;

pub mod auth;
pub mod rest;
pub mod settings;
pub mod sqlite;

pub use auth::{AuthClient, RestAuthClient};
pub use rest::RestRecordStore;
pub use settings::LocalSettings;
pub use sqlite::SqliteRecordStore;

/// Row about to be inserted. Field names match the backend columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityRecord {
    pub created_at: DateTime<Utc>,
    pub calories: String,
    pub distance: String,
    #[serde(rename = "heartRate")]
    pub heart_rate: String,
    pub breathing: String,
    pub duration: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Stored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewActivityRecord,
}

/// Somewhere activity records are kept
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: &NewActivityRecord) -> Result<(), GatewayError>;

    /// Every stored record, oldest first
    async fn select_all(&self) -> Result<Vec<ActivityRecord>, GatewayError>;
}

/// Values typed on the manual entry form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntry {
    pub calories: String,
    pub distance: String,
    pub heart_rate: String,
    pub breathing: String,
    pub duration: String,
}

impl ManualEntry {
    /// Turn the form into a record. Every field must be filled in.
    pub fn into_record(
        self,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<NewActivityRecord, VitalRsError> {
        let missing: Vec<&str> = [
            ("calories", &self.calories),
            ("distance", &self.distance),
            ("heart rate", &self.heart_rate),
            ("breathing", &self.breathing),
            ("duration", &self.duration),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            warn!(missing = ?missing, "Please enter all values to insert");
            return Err(VitalRsError::Validation(format!(
                "missing values: {}",
                missing.join(", ")
            )));
        }

        Ok(NewActivityRecord {
            created_at,
            calories: self.calories.trim().to_string(),
            distance: self.distance.trim().to_string(),
            heart_rate: self.heart_rate.trim().to_string(),
            breathing: self.breathing.trim().to_string(),
            duration: self.duration.trim().to_string(),
            user_id: user_id.to_string(),
        })
    }
}

impl ActivitySummary {
    /// Record for this session, stamped with its end time
    pub fn to_record(&self, user_id: &str) -> NewActivityRecord {
        let metric = |m: MetricType| self.metrics.get(m);
        NewActivityRecord {
            created_at: self.ended_at,
            calories: format!("{:.0}", metric(MetricType::Calories)),
            distance: format!("{:.2}", metric(MetricType::Distance)),
            heart_rate: format!("{:.0}", metric(MetricType::HeartRate)),
            breathing: format!("{:.0}", metric(MetricType::BreathingRate)),
            duration: format!("{:.1}", self.duration_minutes()),
            user_id: user_id.to_string(),
        }
    }
}

/// Save a finished session for the signed-in user
pub async fn persist_summary(
    store: &dyn RecordStore,
    settings: &LocalSettings,
    summary: &ActivitySummary,
) -> Result<NewActivityRecord, VitalRsError> {
    let user_id = settings.active_user().ok_or(GatewayError::NotLoggedIn)?;
    let record = summary.to_record(user_id);
    store.insert(&record).await?;
    info!(activity = %summary.activity, user = user_id, "Activity saved");
    Ok(record)
}
