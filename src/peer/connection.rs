use crate::candidates::CandidateBuffer;
use crate::config::SessionConfig;
use crate::error::{Result, SignalError};
use crate::handshake::Role;
use crate::logger::{dump_candidate, dump_selected_pair};
use crate::peer::data_channel::attach_dc;
use crate::peer::types::{ConnectionState, PeerEvent};
use crate::peer::PeerAdapter;
use crate::signaling::{SdpType, SessionDescription};
use crate::utils::to_ice_servers;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::{
    api::APIBuilder,
    data_channel::{data_channel_init::RTCDataChannelInit, RTCDataChannel},
    peer_connection::{
        configuration::RTCConfiguration, peer_connection_state::RTCPeerConnectionState,
        sdp::session_description::RTCSessionDescription, RTCPeerConnection,
    },
};

/// Peer connection на движке `webrtc`
pub struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
}

impl WebRtcPeer {
    /// создаём Peer; offerer сам делает data-channel, answerer его принимает.
    /// Локальные кандидаты уходят в `buffer`, события - в возвращаемый канал.
    pub async fn new(
        role: Role,
        config: &SessionConfig,
        buffer: Arc<CandidateBuffer>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PeerEvent>)> {
        let api = APIBuilder::new().build();
        let rtc_config = RTCConfiguration {
            ice_servers: to_ice_servers(&config.ice_servers),
            ..Default::default()
        };
        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| SignalError::Setup(format!("new peer connection: {e}")))?,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // Колбэк движка только классифицирует кандидата, никакого I/O
        pc.on_ice_candidate(Box::new(move |cand: Option<RTCIceCandidate>| {
            match cand {
                Some(c) => {
                    dump_candidate("LOCAL", &c);
                    match c.to_json() {
                        Ok(init) => {
                            buffer.on_local_candidate(Some(&init.candidate));
                        }
                        Err(e) => warn!(error = %e, "failed to serialize local candidate"),
                    }
                }
                None => {
                    buffer.on_local_candidate(None);
                }
            }
            Box::pin(async {})
        }));

        pc.on_ice_gathering_state_change(Box::new(move |state| {
            debug!(?state, "ICE gathering state changed");
            Box::pin(async {})
        }));

        let pc_stats = Arc::downgrade(&pc);
        let state_tx = events_tx.clone();
        pc.on_peer_connection_state_change(Box::new(move |st: RTCPeerConnectionState| {
            info!(state = %st, "peer connection state has changed");
            let state = ConnectionState::from(st);
            let _ = state_tx.send(PeerEvent::StateChanged(state));

            if state == ConnectionState::Connected {
                if let Some(pc) = pc_stats.upgrade() {
                    tokio::spawn(async move {
                        dump_selected_pair(&pc, "CONNECTED").await;
                    });
                }
            }
            Box::pin(async {})
        }));

        match role {
            Role::Offerer => {
                let dc = pc
                    .create_data_channel(
                        &config.data_channel_label,
                        Some(RTCDataChannelInit::default()),
                    )
                    .await
                    .map_err(|e| SignalError::Setup(format!("create data channel: {e}")))?;
                attach_dc(&dc, role, events_tx);
            }
            Role::Answerer => {
                pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
                    info!(label = dc.label(), id = dc.id(), "new data channel");
                    attach_dc(&dc, role, events_tx.clone());
                    Box::pin(async {})
                }));
            }
        }

        Ok((Self { pc }, events_rx))
    }

    pub fn connection(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

#[async_trait]
impl PeerAdapter for WebRtcPeer {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.pc.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.pc.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc.set_local_description(to_rtc(desc)?).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc.set_remote_description(to_rtc(desc)?).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: &str) -> Result<()> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Ok(());
        }
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}
