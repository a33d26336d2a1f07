pub mod codec;
pub mod document;
pub mod file;
pub mod wait_token;

use crate::error::{Result, SignalError};
use async_trait::async_trait;
use std::fmt;

pub use codec::{SdpType, SessionDescription};
pub use document::{DocumentStore, DocumentTransport, MemoryDocument, SignalingDocument};
pub use file::FileTransport;
pub use wait_token::WaitToken;

/// Именованное поле в общем документе / файл в общей директории
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    OfferSdp,
    AnswerSdp,
    OfferCandidates,
    AnswerCandidates,
    OfferFinalCandidates,
    AnswerFinalCandidates,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::OfferSdp,
        Slot::AnswerSdp,
        Slot::OfferCandidates,
        Slot::AnswerCandidates,
        Slot::OfferFinalCandidates,
        Slot::AnswerFinalCandidates,
    ];

    /// Имя файла для файлового бэкенда
    pub fn file_name(self) -> &'static str {
        match self {
            Slot::OfferSdp => "offer.sdp",
            Slot::AnswerSdp => "answer.sdp",
            Slot::OfferCandidates => "offer.candidates",
            Slot::AnswerCandidates => "answer.candidates",
            Slot::OfferFinalCandidates => "offer.desc",
            Slot::AnswerFinalCandidates => "answer.desc",
        }
    }

    /// Имя поля в общем документе
    pub fn field_name(self) -> &'static str {
        match self {
            Slot::OfferSdp => "offerSdp",
            Slot::AnswerSdp => "answerSdp",
            Slot::OfferCandidates => "offerCandidates",
            Slot::AnswerCandidates => "answerCandidates",
            Slot::OfferFinalCandidates => "offerFinalCandidates",
            Slot::AnswerFinalCandidates => "answerFinalCandidates",
        }
    }

    pub fn holds_description(self) -> bool {
        matches!(self, Slot::OfferSdp | Slot::AnswerSdp)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::OfferSdp => "offer-SDP",
            Slot::AnswerSdp => "answer-SDP",
            Slot::OfferCandidates => "offer-candidates",
            Slot::AnswerCandidates => "answer-candidates",
            Slot::OfferFinalCandidates => "offer-final-candidates",
            Slot::AnswerFinalCandidates => "answer-final-candidates",
        };
        f.write_str(name)
    }
}

/// Значение слота: описание сессии или список кандидатов
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    Description(SessionDescription),
    Candidates(Vec<String>),
}

impl SlotValue {
    fn kind_matches(&self, slot: Slot) -> bool {
        match self {
            SlotValue::Description(_) => slot.holds_description(),
            SlotValue::Candidates(_) => !slot.holds_description(),
        }
    }
}

/// Канал обмена сигнальными данными между двумя процессами.
///
/// `publish` делает значение видимым для другой стороны, `await_and_read`
/// блокируется до появления слота без таймаута. Оркестратор знает только
/// этот интерфейс.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn publish(&self, slot: Slot, value: &SlotValue) -> Result<()>;

    async fn await_and_read(&self, slot: Slot) -> Result<SlotValue>;

    /// Останавливает фоновые задачи транспорта
    async fn close(&self) {}

    async fn await_description(&self, slot: Slot) -> Result<SessionDescription> {
        match self.await_and_read(slot).await? {
            SlotValue::Description(desc) => Ok(desc),
            SlotValue::Candidates(_) => Err(SignalError::SlotKind {
                slot,
                expected: "session description",
            }),
        }
    }

    async fn await_candidates(&self, slot: Slot) -> Result<Vec<String>> {
        match self.await_and_read(slot).await? {
            SlotValue::Candidates(list) => Ok(list),
            SlotValue::Description(_) => Err(SignalError::SlotKind {
                slot,
                expected: "candidate list",
            }),
        }
    }
}

/// Проверка соответствия значения слоту перед записью
pub(crate) fn check_kind(slot: Slot, value: &SlotValue) -> Result<()> {
    if value.kind_matches(slot) {
        Ok(())
    } else if slot.holds_description() {
        Err(SignalError::SlotKind {
            slot,
            expected: "session description",
        })
    } else {
        Err(SignalError::SlotKind {
            slot,
            expected: "candidate list",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_are_unique() {
        let mut files: Vec<_> = Slot::ALL.iter().map(|s| s.file_name()).collect();
        let mut fields: Vec<_> = Slot::ALL.iter().map(|s| s.field_name()).collect();
        files.sort();
        files.dedup();
        fields.sort();
        fields.dedup();
        assert_eq!(files.len(), 6);
        assert_eq!(fields.len(), 6);
    }

    #[test]
    fn check_kind_rejects_mismatch() {
        let list = SlotValue::Candidates(vec![]);
        assert!(check_kind(Slot::OfferCandidates, &list).is_ok());
        assert!(matches!(
            check_kind(Slot::OfferSdp, &list),
            Err(SignalError::SlotKind { slot: Slot::OfferSdp, .. })
        ));
    }
}
