use crate::error::{Result, SignalError};
use crate::signaling::codec::{decode_candidate_array, description_value};
use crate::signaling::{check_kind, SignalingTransport, Slot, SlotValue, WaitToken};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Снимок общего документа: поле на каждый слот
pub type SignalingDocument = serde_json::Map<String, Value>;

/// Хранилище общего документа (облачный документ или его локальная замена).
/// `subscribe` отдаёт поток снимков после каждого изменения.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn update_field(&self, field: &str, value: Value) -> Result<()>;

    fn subscribe(&self) -> watch::Receiver<SignalingDocument>;
}

/// Документ в памяти процесса; клоны указывают на один документ
#[derive(Clone)]
pub struct MemoryDocument {
    tx: Arc<watch::Sender<SignalingDocument>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SignalingDocument::new());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SignalingDocument {
        self.tx.borrow().clone()
    }

    /// Очистка документа перед новой сессией
    pub fn reset(&self) {
        self.tx.send_replace(SignalingDocument::new());
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocument {
    async fn update_field(&self, field: &str, value: Value) -> Result<()> {
        self.tx.send_modify(|doc| {
            doc.insert(field.to_string(), value);
        });
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<SignalingDocument> {
        self.tx.subscribe()
    }
}

/// Транспорт поверх общего документа. Фоновая задача следит за снимками,
/// кэширует последний и взводит `WaitToken` каждого заполненного поля.
pub struct DocumentTransport<S: DocumentStore> {
    store: Arc<S>,
    tokens: Arc<HashMap<Slot, WaitToken>>,
    latest: Arc<RwLock<SignalingDocument>>,
    cancel: CancellationToken,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl<S: DocumentStore> DocumentTransport<S> {
    /// Требует запущенный tokio runtime
    pub fn new(store: S) -> Result<Self> {
        Self::with_cancellation(store, CancellationToken::new())
    }

    pub fn with_cancellation(store: S, cancel: CancellationToken) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SignalError::Setup(format!("document watch needs a runtime: {e}")))?;

        let store = Arc::new(store);
        let tokens: Arc<HashMap<Slot, WaitToken>> =
            Arc::new(Slot::ALL.iter().map(|s| (*s, WaitToken::new())).collect());
        let latest = Arc::new(RwLock::new(SignalingDocument::new()));
        let cancel = cancel.child_token();

        let handle = runtime.spawn(watch_document(
            store.subscribe(),
            tokens.clone(),
            latest.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            store,
            tokens,
            latest,
            cancel,
            watcher: Mutex::new(Some(handle)),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn decode(&self, slot: Slot) -> Result<SlotValue> {
        let doc = self.latest.read();
        let value = doc
            .get(slot.field_name())
            .filter(|v| !v.is_null())
            .ok_or_else(|| SignalError::Decode {
                slot,
                reason: "field vanished from snapshot".into(),
            })?;

        if slot.holds_description() {
            serde_json::from_value(value.clone())
                .map(SlotValue::Description)
                .map_err(|e| SignalError::Decode {
                    slot,
                    reason: e.to_string(),
                })
        } else {
            decode_candidate_array(slot, value).map(SlotValue::Candidates)
        }
    }
}

/// Фоновый цикл: снимок -> кэш -> сигнал токенам
async fn watch_document(
    mut rx: watch::Receiver<SignalingDocument>,
    tokens: Arc<HashMap<Slot, WaitToken>>,
    latest: Arc<RwLock<SignalingDocument>>,
    cancel: CancellationToken,
) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        apply_snapshot(snapshot, &tokens, &latest);

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("document watch cancelled");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    warn!("stopped watching: document feed closed");
                    break;
                }
            }
        }
    }
}

fn apply_snapshot(
    snapshot: SignalingDocument,
    tokens: &HashMap<Slot, WaitToken>,
    latest: &RwLock<SignalingDocument>,
) {
    // кэш обновляется до сигнала, чтобы проснувшийся читатель увидел значение
    let present: Vec<Slot> = Slot::ALL
        .into_iter()
        .filter(|s| snapshot.get(s.field_name()).is_some_and(|v| !v.is_null()))
        .collect();
    *latest.write() = snapshot;

    for slot in present {
        if let Some(token) = tokens.get(&slot) {
            if token.signal() {
                debug!(%slot, "slot populated");
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> SignalingTransport for DocumentTransport<S> {
    async fn publish(&self, slot: Slot, value: &SlotValue) -> Result<()> {
        check_kind(slot, value)?;
        let encoded = match value {
            SlotValue::Description(desc) => description_value(slot, desc)?,
            SlotValue::Candidates(list) => Value::from(list.clone()),
        };
        self.store.update_field(slot.field_name(), encoded).await?;
        info!(%slot, field = slot.field_name(), "published");
        Ok(())
    }

    async fn await_and_read(&self, slot: Slot) -> Result<SlotValue> {
        let token = self
            .tokens
            .get(&slot)
            .ok_or_else(|| SignalError::Setup(format!("no wait token for {slot}")))?;

        info!(%slot, "waiting for slot");
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(SignalError::Cancelled),
            _ = token.wait() => {}
        }
        info!(%slot, "slot detected");
        self.decode(slot)
    }

    async fn close(&self) {
        self.cancel.cancel();
        let handle = self.watcher.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl<S: DocumentStore> Drop for DocumentTransport<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
