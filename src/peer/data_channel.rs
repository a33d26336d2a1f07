use crate::handshake::Role;
use crate::peer::types::PeerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use webrtc::data_channel::{data_channel_message::DataChannelMessage, RTCDataChannel};

/// общий обработчик data-channel: приветствие при открытии, сообщения в канал событий
pub fn attach_dc(dc: &Arc<RTCDataChannel>, role: Role, events: mpsc::UnboundedSender<PeerEvent>) {
    let label = dc.label().to_string();

    dc.on_open(Box::new({
        let dc = dc.clone();
        let events = events.clone();
        let label = label.clone();
        move || {
            info!(%label, "data channel connected");
            let _ = events.send(PeerEvent::ChannelOpened {
                label: label.clone(),
            });
            let dc = dc.clone();
            tokio::spawn(async move {
                if let Err(e) = dc.send_text(role.greeting().to_string()).await {
                    warn!(error = %e, "failed to send greeting");
                }
            });
            Box::pin(async {})
        }
    }));

    dc.on_message(Box::new({
        let events = events.clone();
        let label = label.clone();
        move |msg: DataChannelMessage| {
            let text = String::from_utf8_lossy(&msg.data).to_string();
            info!(%label, %text, "message received from data channel");
            let _ = events.send(PeerEvent::Message {
                label: label.clone(),
                text,
            });
            Box::pin(async {})
        }
    }));

    dc.on_close(Box::new(move || {
        info!(%label, "data channel closed");
        let _ = events.send(PeerEvent::ChannelClosed {
            label: label.clone(),
        });
        Box::pin(async {})
    }));
}
