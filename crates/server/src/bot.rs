use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use dispatch::Dispatcher;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, warn};

use crate::transport::{InboundMessage, Transport};

const INBOUND_BUFFER: usize = 64;

/// Runs the transport listener and handles inbound messages one at a time.
///
/// `running` is raised while the loop is live and lowered when it stops.
pub async fn run(
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(INBOUND_BUFFER);
    let listener = {
        let transport = transport.clone();
        tokio::spawn(async move { transport.listen(tx).await })
    };

    running.store(true, Ordering::SeqCst);
    info!(transport = transport.name(), "bot started");

    while let Some(inbound) = rx.recv().await {
        deliver(&dispatcher, transport.as_ref(), inbound).await;
    }

    running.store(false, Ordering::SeqCst);
    warn!(transport = transport.name(), "bot stopped");
    listener.await.context("transport listener panicked")?
}

/// Dispatches one message and sends its replies in order. Returns how many
/// replies were delivered.
pub async fn deliver(
    dispatcher: &Dispatcher,
    transport: &dyn Transport,
    inbound: InboundMessage,
) -> usize {
    let InboundMessage {
        user_id,
        chat_id,
        text,
    } = inbound;

    let span = info_span!("inbound", user_id = ?user_id, chat_id);
    let handler = dispatcher.clone();
    let result =
        match tokio::task::spawn_blocking(move || span.in_scope(|| handler.handle(&text))).await {
            Ok(result) => result,
            Err(error) => {
                error!(?user_id, chat_id, %error, "message handler failed");
                return 0;
            }
        };

    let mut delivered = 0;
    for reply in &result.replies {
        if let Err(error) = transport.send(chat_id, reply).await {
            // The counter already moved; the remaining parts are dropped.
            error!(
                ?user_id,
                chat_id,
                label = result.label.as_ref().map(|l| l.as_str()),
                %error,
                "failed to deliver reply"
            );
            break;
        }
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
#[path = "tests/bot_tests.rs"]
mod tests;
