// Projection health as reported by the admin surface and the health endpoint.

use crate::shared::core::primitives::Position;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagThresholds {
    pub warning: Duration,
    pub critical: Duration,
}

impl Default for LagThresholds {
    fn default() -> Self {
        Self {
            warning: Duration::from_secs(30),
            critical: Duration::from_secs(300),
        }
    }
}

impl LagThresholds {
    pub fn classify(&self, lag: Duration) -> Health {
        if lag > self.critical {
            Health::Critical
        } else if lag > self.warning {
            Health::Warning
        } else {
            Health::Ok
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCounts {
    pub catching_up: usize,
    pub current: usize,
    pub stalled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionStatus {
    pub projector: String,
    pub cursor: Position,
    pub head: Position,
    pub lag_events: u64,
    pub lag_seconds: f64,
    pub health: Health,
    pub subjects: PhaseCounts,
    pub stalled: Vec<String>,
    pub dead_letters: usize,
}
