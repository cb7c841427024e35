use std::fmt::Write as _;

use shared::domain::CounterSet;
use storage::CounterStore;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub counts: CounterSet,
    pub total: u64,
}

/// Read side of the counters, shared with the status server.
#[derive(Clone)]
pub struct StatusAccessor {
    store: CounterStore,
}

impl StatusAccessor {
    pub fn new(store: CounterStore) -> Self {
        Self { store }
    }

    pub fn summary(&self) -> StatusSummary {
        let counts = self.store.snapshot();
        let total = counts.total();
        StatusSummary { counts, total }
    }

    pub fn reset_all(&self) {
        self.store.reset();
        info!("interaction counters reset");
    }

    /// Report sent in reply to the stats command.
    pub fn render_summary(&self) -> String {
        let summary = self.summary();
        let mut text = String::from("<b>📊 Статистика обращений:</b>\n\n");
        for (label, count) in summary.counts.iter() {
            let _ = writeln!(text, "• {label}: {count}");
        }
        let _ = write!(text, "\nВсего: {}", summary.total);
        text
    }
}
