use parking_lot::Mutex;
use tracing::debug;

#[derive(Default)]
struct Inner {
    remote_set: bool,
    pending: Vec<String>,
    finals: Vec<String>,
}

/// Локальные ICE-кандидаты: до установки remote description - в pending,
/// после - в final. Проверка и добавление под одним мьютексом.
#[derive(Default)]
pub struct CandidateBuffer {
    inner: Mutex<Inner>,
}

/// Куда попал кандидат
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Pending,
    Final,
    Ignored,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` или пустая строка - конец сбора, игнорируем
    pub fn on_local_candidate(&self, candidate: Option<&str>) -> Classified {
        let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
            debug!("end of candidate gathering");
            return Classified::Ignored;
        };

        let mut inner = self.inner.lock();
        if inner.remote_set {
            inner.finals.push(candidate.to_string());
            debug!(total = inner.finals.len(), "added ICE candidate to the final list");
            Classified::Final
        } else {
            inner.pending.push(candidate.to_string());
            debug!(total = inner.pending.len(), "added ICE candidate to the pending list");
            Classified::Pending
        }
    }

    /// Граница классификации: всё, что придёт после, уходит в final
    pub fn mark_remote_description_set(&self) {
        self.inner.lock().remote_set = true;
    }

    pub fn remote_description_set(&self) -> bool {
        self.inner.lock().remote_set
    }

    /// Копия pending; список не очищается
    pub fn drain_pending(&self) -> Vec<String> {
        self.inner.lock().pending.clone()
    }

    pub fn drain_final(&self) -> Vec<String> {
        self.inner.lock().finals.clone()
    }
}
