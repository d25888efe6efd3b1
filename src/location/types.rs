use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Source of a location report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provider {
    Gps,
    Network,
    Passive,
}

/// A single location report as delivered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal uncertainty radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub provider: Provider,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, provider: Provider, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            provider,
            timestamp,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy = Some(accuracy_m);
        self
    }

    /// Finite latitude in [-90, 90] and longitude in [-180, 180].
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Reported accuracy, or `None` when it is missing or not a usable radius.
    pub fn known_accuracy(&self) -> Option<f64> {
        self.accuracy.filter(|a| a.is_finite() && *a >= 0.0)
    }
}
