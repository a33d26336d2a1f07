use serde::{Deserialize, Serialize};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Конфигурация ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub id: String,
    pub r#type: String, // 'stun' or 'turn'
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl ServerConfig {
    pub fn stun(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            r#type: "stun".into(),
            url: url.into(),
            username: None,
            credential: None,
        }
    }

    /// Тип по схеме URL: `turn:`/`turns:` получает учётные данные, остальное - STUN
    pub fn from_url(
        id: impl Into<String>,
        url: impl Into<String>,
        username: Option<String>,
        credential: Option<String>,
    ) -> Self {
        let url = url.into();
        if url.starts_with("turn:") || url.starts_with("turns:") {
            Self {
                id: id.into(),
                r#type: "turn".into(),
                url,
                username,
                credential,
            }
        } else {
            Self::stun(id, url)
        }
    }
}

/// Состояние соединения без привязки к движку
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
    Unspecified,
}

impl ConnectionState {
    pub fn is_terminal_failure(self) -> bool {
        self == ConnectionState::Failed
    }
}

impl From<RTCPeerConnectionState> for ConnectionState {
    fn from(st: RTCPeerConnectionState) -> Self {
        match st {
            RTCPeerConnectionState::New => ConnectionState::New,
            RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
            RTCPeerConnectionState::Connected => ConnectionState::Connected,
            RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
            RTCPeerConnectionState::Failed => ConnectionState::Failed,
            RTCPeerConnectionState::Closed => ConnectionState::Closed,
            RTCPeerConnectionState::Unspecified => ConnectionState::Unspecified,
        }
    }
}

/// События движка, передаваемые оркестратору через канал
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    StateChanged(ConnectionState),
    ChannelOpened { label: String },
    Message { label: String, text: String },
    ChannelClosed { label: String },
}
