use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::draft::{DraftId, DraftQuote};
use crate::errors::ApplicationError;

/// Persistence boundary for drafts; the backend assigns ids on first save.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: &DraftQuote) -> Result<DraftQuote, ApplicationError>;
    fn load(&self, id: &DraftId) -> Result<Option<DraftQuote>, ApplicationError>;
    fn discard(&self, id: &DraftId) -> Result<bool, ApplicationError>;
}

#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    drafts: Arc<Mutex<HashMap<DraftId, DraftQuote>>>,
}

impl InMemoryDraftStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<DraftId, DraftQuote>>, ApplicationError> {
        self.drafts
            .lock()
            .map_err(|_| ApplicationError::Persistence("draft store lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|drafts| drafts.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, draft: &DraftQuote) -> Result<DraftQuote, ApplicationError> {
        let mut saved = draft.clone();
        let id = saved.id.get_or_insert_with(|| DraftId(Uuid::new_v4().to_string())).clone();
        self.lock()?.insert(id, saved.clone());
        Ok(saved)
    }

    fn load(&self, id: &DraftId) -> Result<Option<DraftQuote>, ApplicationError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn discard(&self, id: &DraftId) -> Result<bool, ApplicationError> {
        Ok(self.lock()?.remove(id).is_some())
    }
}
