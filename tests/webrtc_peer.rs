use rtcpair_lib::peer::ConnectionState;
use rtcpair_lib::{
    CandidateBuffer, DocumentTransport, Handshake, MemoryDocument, PeerAdapter, PeerEvent, Role,
    SessionConfig, WebRtcPeer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Без STUN: только host-кандидаты, соединение внутри одного процесса
fn local_config() -> SessionConfig {
    SessionConfig {
        ice_servers: vec![],
        ..SessionConfig::default()
    }
}

struct RealSide {
    handshake: Handshake,
    peer: Arc<WebRtcPeer>,
    buffer: Arc<CandidateBuffer>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
}

async fn real_side(role: Role, doc: &MemoryDocument) -> RealSide {
    let buffer = Arc::new(CandidateBuffer::new());
    let (peer, events) = WebRtcPeer::new(role, &local_config(), buffer.clone())
        .await
        .unwrap();
    let peer = Arc::new(peer);
    let transport = Arc::new(DocumentTransport::new(doc.clone()).unwrap());
    let handshake = Handshake::new(role, transport, peer.clone(), buffer.clone());
    RealSide {
        handshake,
        peer,
        buffer,
        events,
    }
}

#[derive(Debug, Default)]
struct Seen {
    connected: bool,
    opened: bool,
    greeting: Option<String>,
}

/// Читаем события, пока не открылся канал и не пришло приветствие
async fn collect(events: &mut mpsc::UnboundedReceiver<PeerEvent>) -> Seen {
    let mut seen = Seen::default();
    while let Some(ev) = events.recv().await {
        match ev {
            PeerEvent::StateChanged(ConnectionState::Connected) => seen.connected = true,
            PeerEvent::ChannelOpened { .. } => seen.opened = true,
            PeerEvent::Message { text, .. } => seen.greeting = Some(text),
            _ => {}
        }
        if seen.connected && seen.opened && seen.greeting.is_some() {
            break;
        }
    }
    seen
}

#[tokio::test]
async fn two_engines_connect_and_greet() {
    let doc = MemoryDocument::new();
    let mut offerer = real_side(Role::Offerer, &doc).await;
    let mut answerer = real_side(Role::Answerer, &doc).await;

    let (o, a) = timeout(Duration::from_secs(10), async {
        tokio::join!(offerer.handshake.negotiate(), answerer.handshake.negotiate())
    })
    .await
    .expect("negotiation finished");
    o.unwrap();
    a.unwrap();

    // offerer собирает до применения answer, answerer - уже после offer
    assert!(!offerer.buffer.drain_pending().is_empty());
    assert!(answerer.buffer.drain_pending().is_empty());
    assert!(!answerer.buffer.drain_final().is_empty());

    let snapshot = doc.snapshot();
    assert_eq!(snapshot["offerSdp"]["type"], "offer");
    assert_eq!(snapshot["answerSdp"]["type"], "answer");

    let (o_seen, a_seen) = timeout(Duration::from_secs(10), async {
        tokio::join!(collect(&mut offerer.events), collect(&mut answerer.events))
    })
    .await
    .expect("data channel opened on both sides");

    assert!(o_seen.connected && o_seen.opened);
    assert!(a_seen.connected && a_seen.opened);
    assert_eq!(o_seen.greeting.as_deref(), Some(Role::Answerer.greeting()));
    assert_eq!(a_seen.greeting.as_deref(), Some(Role::Offerer.greeting()));

    offerer.peer.close().await.unwrap();
    answerer.peer.close().await.unwrap();
}

#[tokio::test]
async fn engine_ignores_empty_remote_candidate() {
    let buffer = Arc::new(CandidateBuffer::new());
    let (peer, _events) = WebRtcPeer::new(Role::Answerer, &local_config(), buffer)
        .await
        .unwrap();
    peer.add_remote_candidate("   ").await.unwrap();
    peer.close().await.unwrap();
}
