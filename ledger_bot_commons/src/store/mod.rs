mod json_file;
mod memory;

use std::future::Future;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
use serenity::all::MessageId;

use crate::record::TrackedRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("records file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("records file is not a valid record list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("a record for message {0} already exists")]
    DuplicateMessage(u64),
}

/// Storage for records, keyed by the ID of the message each was parsed from.
pub trait RecordStore<R: TrackedRecord>: Send + Sync {
    /// Add a record at the end.
    ///
    /// # Errors
    ///
    /// Errors with [`StoreError::DuplicateMessage`] if a record from the same
    /// message is already stored, or if the storage itself fails.
    fn append(&self, record: R) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All records, oldest first.
    fn load_all(&self) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;

    /// Apply `mutator` to the record parsed from this message and save it.
    /// Returns the updated record, or [`None`] without touching anything if
    /// there is no such record.
    fn find_and_update<F>(
        &self,
        message_id: MessageId,
        mutator: F,
    ) -> impl Future<Output = Result<Option<R>, StoreError>> + Send
    where
        F: FnOnce(&mut R) + Send;
}

/// Shared guts of [`RecordStore::append`] for stores that hold a `Vec`.
fn push_unique<R: TrackedRecord>(records: &mut Vec<R>, record: R) -> Result<(), StoreError> {
    let id = record.source_message_id();
    if records.iter().any(|r| r.source_message_id() == id) {
        return Err(StoreError::DuplicateMessage(id));
    }
    records.push(record);
    Ok(())
}

/// Shared guts of [`RecordStore::find_and_update`] for stores that hold a `Vec`.
fn update_first<R: TrackedRecord>(
    records: &mut [R],
    message_id: MessageId,
    mutator: impl FnOnce(&mut R),
) -> Option<R> {
    let record = records
        .iter_mut()
        .find(|r| r.source_message_id() == message_id.get())?;
    mutator(record);
    Some(record.clone())
}
