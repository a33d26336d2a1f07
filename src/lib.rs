pub mod candidates;
pub mod config;
pub mod error;
pub mod handshake;
pub mod logger;
pub mod peer;
pub mod signaling;
pub mod utils;

pub use candidates::CandidateBuffer;
pub use config::SessionConfig;
pub use error::{Result, SignalError};
pub use handshake::{Handshake, Role};
pub use peer::{PeerAdapter, PeerEvent, WebRtcPeer};
pub use signaling::{
    DocumentTransport, FileTransport, MemoryDocument, SessionDescription, SignalingTransport, Slot,
    SlotValue,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Одна сессия через файловый бэкенд: чистим свои слоты, поднимаем peer,
/// прогоняем обмен и ждём, пока соединение живо.
pub async fn run_file_session(
    role: Role,
    config: &SessionConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let transport = FileTransport::new(&config.root_path)
        .with_poll_interval(config.poll_interval)
        .with_cancellation(cancel.clone());

    // offerer открывает сессию и чистит всё; answerer только свои слоты,
    // чтобы не стереть уже опубликованный offer
    match role {
        Role::Offerer => transport.reset().await?,
        Role::Answerer => transport.reset_slots(role.produced_slots()).await?,
    }
    info!(root = %transport.root().display(), %role, "file signaling ready");

    let buffer = Arc::new(CandidateBuffer::new());
    let (peer, events) = WebRtcPeer::new(role, config, buffer.clone()).await?;
    let peer = Arc::new(peer);
    let transport = Arc::new(transport);

    let handshake = Handshake::new(role, transport.clone(), peer.clone(), buffer)
        .with_gather_grace(config.gather_grace)
        .with_cancellation(cancel);

    let result = handshake.run(events).await;

    transport.close().await;
    if let Err(e) = peer.close().await {
        tracing::warn!(error = %e, "closing the peer connection");
    }
    result
}
