use serde::{Deserialize, Serialize};

use crate::domain::CounterSet;

pub const SERVICE_NAME: &str = "telegram-bot";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub bot_running: bool,
}

impl HealthResponse {
    pub fn healthy(timestamp: f64, bot_running: bool) -> Self {
        Self {
            status: "healthy".into(),
            service: SERVICE_NAME.into(),
            timestamp,
            bot_running,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub status: String,
    pub button_stats: CounterSet,
    pub total_requests: u64,
    pub timestamp: f64,
}

impl StatsResponse {
    pub fn running(button_stats: CounterSet, total_requests: u64, timestamp: f64) -> Self {
        Self {
            status: "running".into(),
            button_stats,
            total_requests,
            timestamp,
        }
    }
}
