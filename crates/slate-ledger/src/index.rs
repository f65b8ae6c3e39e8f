//! In-memory takes kept sorted by id.

use crate::error::LedgerError;
use slate_core::{Take, TakeId};

const INIT_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeIndex {
    takes: Vec<Take>,
}

impl Default for TakeIndex {
    fn default() -> Self {
        Self {
            takes: Vec::with_capacity(INIT_CAPACITY),
        }
    }
}

impl TakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    /// All takes in id order.
    pub fn list(&self) -> &[Take] {
        &self.takes
    }

    pub fn get(&self, id: &TakeId) -> Result<&Take, LedgerError> {
        match self.search(id) {
            Ok(i) => Ok(&self.takes[i]),
            Err(_) => Err(LedgerError::NotFound { id: id.clone() }),
        }
    }

    pub fn insert(&mut self, take: Take) -> Result<(), LedgerError> {
        match self.search(&take.id) {
            Ok(_) => Err(LedgerError::Exists { id: take.id }),
            Err(i) => {
                self.takes.insert(i, take);
                Ok(())
            }
        }
    }

    /// Replace the take at `id`. If `take.id` differs the take is moved,
    /// which fails if the new id is already taken.
    pub fn update(&mut self, id: &TakeId, take: Take) -> Result<(), LedgerError> {
        let i = self
            .search(id)
            .map_err(|_| LedgerError::NotFound { id: id.clone() })?;
        if *id == take.id {
            self.takes[i] = take;
            return Ok(());
        }
        if self.search(&take.id).is_ok() {
            return Err(LedgerError::Exists { id: take.id });
        }
        self.takes.remove(i);
        let (Ok(j) | Err(j)) = self.search(&take.id);
        self.takes.insert(j, take);
        Ok(())
    }

    pub fn delete(&mut self, id: &TakeId) -> Result<Take, LedgerError> {
        match self.search(id) {
            Ok(i) => Ok(self.takes.remove(i)),
            Err(_) => Err(LedgerError::NotFound { id: id.clone() }),
        }
    }

    /// Replace the take with the same id, or insert it.
    pub fn upsert(&mut self, take: Take) {
        match self.search(&take.id) {
            Ok(i) => self.takes[i] = take,
            Err(i) => self.takes.insert(i, take),
        }
    }

    /// Remove `id` if present.
    pub fn remove(&mut self, id: &TakeId) -> Option<Take> {
        self.search(id).ok().map(|i| self.takes.remove(i))
    }

    fn search(&self, id: &TakeId) -> Result<usize, usize> {
        self.takes.binary_search_by(|t| t.id.cmp(id))
    }
}
