use crate::candidates::CandidateBuffer;
use crate::config::DEFAULT_GATHER_GRACE;
use crate::error::{Result, SignalError};
use crate::peer::{PeerAdapter, PeerEvent};
use crate::signaling::{SessionDescription, SignalingTransport, Slot, SlotValue};
use crate::utils::{analyze_candidates, random_id};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

/// Роль процесса в обмене
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

impl Role {
    pub fn local_sdp(self) -> Slot {
        match self {
            Role::Offerer => Slot::OfferSdp,
            Role::Answerer => Slot::AnswerSdp,
        }
    }

    pub fn remote_sdp(self) -> Slot {
        self.peer().local_sdp()
    }

    pub fn local_candidates(self) -> Slot {
        match self {
            Role::Offerer => Slot::OfferCandidates,
            Role::Answerer => Slot::AnswerCandidates,
        }
    }

    pub fn remote_candidates(self) -> Slot {
        self.peer().local_candidates()
    }

    pub fn local_final_candidates(self) -> Slot {
        match self {
            Role::Offerer => Slot::OfferFinalCandidates,
            Role::Answerer => Slot::AnswerFinalCandidates,
        }
    }

    pub fn remote_final_candidates(self) -> Slot {
        self.peer().local_final_candidates()
    }

    /// Слоты, которые пишет эта роль
    pub fn produced_slots(self) -> [Slot; 3] {
        [
            self.local_sdp(),
            self.local_candidates(),
            self.local_final_candidates(),
        ]
    }

    pub fn peer(self) -> Role {
        match self {
            Role::Offerer => Role::Answerer,
            Role::Answerer => Role::Offerer,
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            Role::Offerer => "Hello from offer",
            Role::Answerer => "Hello from answer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offer"),
            Role::Answerer => f.write_str("answer"),
        }
    }
}

/// Одна сторона обмена offer/answer + два раунда кандидатов.
/// Знает только `SignalingTransport` и `PeerAdapter`.
pub struct Handshake {
    role: Role,
    session: String,
    transport: Arc<dyn SignalingTransport>,
    peer: Arc<dyn PeerAdapter>,
    buffer: Arc<CandidateBuffer>,
    gather_grace: Duration,
    cancel: CancellationToken,
}

impl Handshake {
    pub fn new(
        role: Role,
        transport: Arc<dyn SignalingTransport>,
        peer: Arc<dyn PeerAdapter>,
        buffer: Arc<CandidateBuffer>,
    ) -> Self {
        Self {
            role,
            session: random_id(),
            transport,
            peer,
            buffer,
            gather_grace: DEFAULT_GATHER_GRACE,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_gather_grace(mut self, grace: Duration) -> Self {
        self.gather_grace = grace;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Полный цикл: обмен, затем бесконечное ожидание.
    ///
    /// Завершается ошибкой `ConnectionFailed`, как только движок сообщает
    /// `Failed` (в том числе посреди обмена), `Cancelled` при отмене во время
    /// обмена, `Ok` при отмене или закрытии потока событий после обмена.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<PeerEvent>) -> Result<()> {
        let span = tracing::info_span!("handshake", role = %self.role, session = %self.session);
        async {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(SignalError::Cancelled),
                _ = wait_for_failure(&mut events) => {
                    error!("peer connection has gone to failed during signaling");
                    return Err(SignalError::ConnectionFailed);
                }
                res = self.negotiate() => res?,
            }

            info!("signaling complete, idling");
            self.idle(&mut events).await
        }
        .instrument(span)
        .await
    }

    /// Только обмен, без ожидания после него
    pub async fn negotiate(&self) -> Result<()> {
        let role = self.role;

        // описания: answerer применяет remote до создания своего
        match role {
            Role::Offerer => {
                let offer = self.peer.create_offer().await?;
                info!("created an offer");
                self.peer.set_local_description(offer.clone()).await?;
                self.publish_description(offer).await?;

                let answer = self.transport.await_description(role.remote_sdp()).await?;
                self.apply_remote(answer).await?;
            }
            Role::Answerer => {
                let offer = self.transport.await_description(role.remote_sdp()).await?;
                self.apply_remote(offer).await?;

                let answer = self.peer.create_answer().await?;
                info!("created an answer");
                self.peer.set_local_description(answer.clone()).await?;
                self.publish_description(answer).await?;
            }
        }

        // первый раунд: offerer отправляет pending первым
        match role {
            Role::Offerer => {
                self.send_pending().await?;
                self.receive_candidates(role.remote_candidates()).await?;
            }
            Role::Answerer => {
                self.receive_candidates(role.remote_candidates()).await?;
                self.send_pending().await?;
            }
        }

        // второй раунд: обе стороны сначала отдают final
        let finals = self.buffer.drain_final();
        analyze_candidates("final", &finals);
        self.publish_candidates(role.local_final_candidates(), finals)
            .await?;
        self.receive_candidates(role.remote_final_candidates())
            .await?;
        Ok(())
    }

    async fn apply_remote(&self, desc: SessionDescription) -> Result<()> {
        self.peer.set_remote_description(desc).await?;
        self.buffer.mark_remote_description_set();
        info!("remote description applied");
        Ok(())
    }

    async fn publish_description(&self, desc: SessionDescription) -> Result<()> {
        self.transport
            .publish(self.role.local_sdp(), &SlotValue::Description(desc))
            .await
    }

    async fn send_pending(&self) -> Result<()> {
        // даём движку досыпать кандидатов перед сбросом pending
        tokio::time::sleep(self.gather_grace).await;
        let pending = self.buffer.drain_pending();
        analyze_candidates("pending", &pending);
        info!(count = pending.len(), "signaling all the pending candidates");
        self.publish_candidates(self.role.local_candidates(), pending)
            .await
    }

    async fn publish_candidates(&self, slot: Slot, candidates: Vec<String>) -> Result<()> {
        self.transport
            .publish(slot, &SlotValue::Candidates(candidates))
            .await
    }

    async fn receive_candidates(&self, slot: Slot) -> Result<usize> {
        let remote = self.transport.await_candidates(slot).await?;
        for candidate in &remote {
            self.peer.add_remote_candidate(candidate).await?;
        }
        info!(%slot, count = remote.len(), "added remote ICE candidates");
        Ok(remote.len())
    }

    async fn idle(&self, events: &mut mpsc::UnboundedReceiver<PeerEvent>) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("session cancelled");
                    return Ok(());
                }
                ev = events.recv() => match ev {
                    Some(PeerEvent::StateChanged(state)) if state.is_terminal_failure() => {
                        error!("peer connection has gone to failed");
                        return Err(SignalError::ConnectionFailed);
                    }
                    Some(ev) => log_event(&ev),
                    None => {
                        info!("peer event feed closed");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Читает события во время обмена; возвращается только на `Failed`
async fn wait_for_failure(events: &mut mpsc::UnboundedReceiver<PeerEvent>) {
    while let Some(ev) = events.recv().await {
        if let PeerEvent::StateChanged(state) = &ev {
            if state.is_terminal_failure() {
                return;
            }
        }
        log_event(&ev);
    }
    // источник событий закрыт - провалиться соединение уже не может
    std::future::pending::<()>().await
}

fn log_event(ev: &PeerEvent) {
    match ev {
        PeerEvent::StateChanged(state) => info!(?state, "connection state"),
        PeerEvent::ChannelOpened { label } => info!(%label, "data channel open"),
        PeerEvent::Message { label, text } => info!(%label, %text, "data channel message"),
        PeerEvent::ChannelClosed { label } => info!(%label, "data channel closed"),
    }
}
