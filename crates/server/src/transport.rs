use async_trait::async_trait;
use shared::domain::ReplyPayload;
use thiserror::Error;
use tokio::sync::mpsc;

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: Option<i64>,
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat api rejected the call: {0}")]
    Rejected(String),
}

/// Chat platform seam used by the dispatch loop.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Forwards inbound messages until the receiver is dropped.
    async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> anyhow::Result<()>;

    async fn send(&self, chat_id: i64, reply: &ReplyPayload) -> Result<(), TransportError>;
}
