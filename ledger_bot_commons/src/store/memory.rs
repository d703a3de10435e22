use serenity::all::MessageId;
use tokio::sync::Mutex;

use super::{push_unique, update_first, RecordStore, StoreError};
use crate::record::TrackedRecord;

/// Records kept in memory only. Gone when the process is.
pub struct MemoryStore<R> {
    records: Mutex<Vec<R>>,
}

impl<R: TrackedRecord> MemoryStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    #[must_use]
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl<R: TrackedRecord> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TrackedRecord> RecordStore<R> for MemoryStore<R> {
    async fn append(&self, record: R) -> Result<(), StoreError> {
        push_unique(&mut *self.records.lock().await, record)
    }

    async fn load_all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn find_and_update<F>(
        &self,
        message_id: MessageId,
        mutator: F,
    ) -> Result<Option<R>, StoreError>
    where
        F: FnOnce(&mut R) + Send,
    {
        Ok(update_first(
            &mut self.records.lock().await,
            message_id,
            mutator,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DummyRecord;

    #[tokio::test]
    async fn same_contract_as_the_file() {
        let store = MemoryStore::with_records(vec![DummyRecord::new(1, "a", false)]);

        assert!(matches!(
            store.append(DummyRecord::new(1, "again", false)).await,
            Err(StoreError::DuplicateMessage(1))
        ));
        store.append(DummyRecord::new(2, "b", false)).await.unwrap();

        assert_eq!(
            store
                .find_and_update(MessageId::new(9), |r| r.setado = true)
                .await
                .unwrap(),
            None
        );
        store
            .find_and_update(MessageId::new(1), |r| r.setado = true)
            .await
            .unwrap();

        assert_eq!(
            store.load_all().await.unwrap(),
            vec![DummyRecord::new(1, "a", true), DummyRecord::new(2, "b", false)]
        );
    }
}
