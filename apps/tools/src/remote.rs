use std::collections::HashMap;

use anyhow::{Context, Result};
use dispatch::StatusSummary;
use reqwest::Client;
use serde::Deserialize;
use storage::CounterSchema;
use url::Url;

#[derive(Debug, Deserialize)]
struct StatsBody {
    button_stats: HashMap<String, u64>,
    total_requests: u64,
}

/// Talks to a running status server, which owns the live counters.
pub struct StatsClient {
    base: Url,
    client: Client,
}

impl StatsClient {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: Client::new(),
        }
    }

    pub async fn fetch(&self, schema: &CounterSchema) -> Result<StatusSummary> {
        let url = self.base.join("stats")?;
        let body: StatsBody = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .json()
            .await?;
        Ok(into_summary(body, schema))
    }

    pub async fn reset(&self, schema: &CounterSchema) -> Result<StatusSummary> {
        let url = self.base.join("stats/reset")?;
        let body: StatsBody = self
            .client
            .post(url.clone())
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()?
            .json()
            .await?;
        Ok(into_summary(body, schema))
    }
}

// Counts come back in map order; lay them out in menu order again.
fn into_summary(body: StatsBody, schema: &CounterSchema) -> StatusSummary {
    let mut counts = schema.zeroed();
    for (label, count) in &body.button_stats {
        counts.set(label, *count);
    }
    StatusSummary {
        counts,
        total: body.total_requests,
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
