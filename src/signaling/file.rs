use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::{Result, SignalError};
use crate::signaling::codec::{
    decode_candidate_lines, decode_description, encode_candidate_lines, encode_description,
};
use crate::signaling::{check_kind, SignalingTransport, Slot, SlotValue};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Файловый транспорт: каждый слот - файл в общей директории.
/// Ожидание - опрос существования файла с интервалом `poll_interval`.
pub struct FileTransport {
    root: PathBuf,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Отмена родительского токена прерывает ожидания; `close` родителя не трогает
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel.child_token();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, slot: Slot) -> PathBuf {
        self.root.join(slot.file_name())
    }

    /// Удаляем все файлы прошлой сессии; отсутствующие файлы - не ошибка
    pub async fn reset(&self) -> Result<()> {
        self.reset_slots(Slot::ALL).await
    }

    pub async fn reset_slots(&self, slots: impl IntoIterator<Item = Slot>) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| SignalError::Setup(format!("create {}: {e}", self.root.display())))?;

        for slot in slots {
            match fs::remove_file(self.path_for(slot)).await {
                Ok(()) => debug!(%slot, "removed stale slot file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(SignalError::Io { slot, source }),
            }
        }
        Ok(())
    }

    fn encode(slot: Slot, value: &SlotValue) -> Result<String> {
        check_kind(slot, value)?;
        match value {
            SlotValue::Description(desc) => {
                let mut raw = encode_description(slot, desc)?;
                raw.push('\n');
                Ok(raw)
            }
            SlotValue::Candidates(list) => Ok(encode_candidate_lines(list)),
        }
    }

    fn decode(slot: Slot, raw: &str) -> Result<SlotValue> {
        if slot.holds_description() {
            decode_description(slot, raw).map(SlotValue::Description)
        } else {
            decode_candidate_lines(slot, raw).map(SlotValue::Candidates)
        }
    }
}

#[async_trait]
impl SignalingTransport for FileTransport {
    async fn publish(&self, slot: Slot, value: &SlotValue) -> Result<()> {
        let raw = Self::encode(slot, value)?;
        let path = self.path_for(slot);
        // пишем во временный файл и переименовываем: читатель не увидит половину
        let tmp = self.root.join(format!("{}.tmp", slot.file_name()));
        fs::write(&tmp, raw.as_bytes())
            .await
            .map_err(|source| SignalError::Io { slot, source })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| SignalError::Io { slot, source })?;
        info!(%slot, path = %path.display(), "published");
        Ok(())
    }

    async fn await_and_read(&self, slot: Slot) -> Result<SlotValue> {
        let path = self.path_for(slot);
        info!(%slot, path = %path.display(), "waiting for slot");

        let raw = loop {
            match fs::read_to_string(&path).await {
                Ok(raw) => break raw,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(SignalError::Io { slot, source }),
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(SignalError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        };

        info!(%slot, "slot detected");
        Self::decode(slot, &raw)
    }

    async fn close(&self) {
        self.cancel.cancel();
    }
}
