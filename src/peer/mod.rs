pub mod connection;
pub mod data_channel;
pub mod types;

use crate::error::Result;
use crate::signaling::SessionDescription;
use async_trait::async_trait;

pub use connection::WebRtcPeer;
pub use types::{ConnectionState, PeerEvent, ServerConfig};

/// Тонкая обёртка над WebRTC-движком, всё что нужно оркестратору.
///
/// `create_offer` / `create_answer` не меняют состояние соединения до
/// `set_local_description`. `add_remote_candidate` с пустой строкой - no-op.
#[async_trait]
pub trait PeerAdapter: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: &str) -> Result<()>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
