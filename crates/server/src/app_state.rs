use std::sync::{atomic::AtomicBool, Arc};

use dispatch::StatusAccessor;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) status: StatusAccessor,
    pub(crate) bot_running: Arc<AtomicBool>,
}
