use std::sync::Arc;

use shared::domain::{DispatchResult, ReplyPayload};
use storage::CounterStore;
use tracing::{error, info};

pub mod catalog;
pub mod command;
pub mod status;

pub use catalog::{Catalog, MenuEntry};
pub use command::Command;
pub use status::{StatusAccessor, StatusSummary};

/// Routes inbound text to catalog replies and bumps the matching counter.
///
/// Holds no per-user state. All failures are logged and turn into an empty
/// reply list so the transport loop can carry on with the next event.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    store: CounterStore,
    status: StatusAccessor,
}

impl Dispatcher {
    pub fn new(catalog: Arc<Catalog>, store: CounterStore) -> Self {
        let status = StatusAccessor::new(store.clone());
        Self {
            catalog,
            store,
            status,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn status(&self) -> &StatusAccessor {
        &self.status
    }

    pub fn handle(&self, text: &str) -> DispatchResult {
        if let Some(command) = Command::parse(text) {
            return self.handle_command(command);
        }

        let Some(entry) = self.catalog.lookup(text) else {
            return DispatchResult::unmatched(vec![self.catalog.fallback().clone()]);
        };

        // Counted before the replies go out; a lost reply keeps its count.
        match self.store.increment(entry.label.as_str()) {
            Some(count) => {
                info!(label = %entry.label, count, "menu item selected");
                DispatchResult {
                    label: Some(entry.label.clone()),
                    replies: entry.replies.clone(),
                }
            }
            None => {
                error!(label = %entry.label, "menu label has no counter; dropping reply");
                DispatchResult::silent()
            }
        }
    }

    fn handle_command(&self, command: Command) -> DispatchResult {
        match command {
            Command::Start => {
                info!("user started the bot");
                DispatchResult::unmatched(vec![self.catalog.welcome().clone()])
            }
            Command::Stat => {
                DispatchResult::unmatched(vec![ReplyPayload::rich(self.status.render_summary())])
            }
            Command::StatReset => {
                self.status.reset_all();
                DispatchResult::unmatched(vec![ReplyPayload::plain(catalog::RESET_DONE_TEXT)])
            }
            Command::Unknown(name) => {
                info!(command = %name, "ignoring unknown command");
                DispatchResult::silent()
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
