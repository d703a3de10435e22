use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serenity::all::MessageId;
use tokio::sync::Mutex;

use super::{push_unique, update_first, RecordStore, StoreError};
use crate::record::TrackedRecord;

/// Records kept as a pretty-printed JSON array in a single file.
///
/// Every operation reads the whole file and, if it changes anything, rewrites
/// the whole file. Nothing is cached. Cycles within this process are
/// serialized; other processes writing the same file are not guarded against.
pub struct JsonFileStore<R> {
    path: PathBuf,
    rmw_mutex: Mutex<()>,
    _records: PhantomData<fn() -> R>,
}

impl<R: TrackedRecord> JsonFileStore<R> {
    /// Open the store at `path`, creating it with an empty list if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Errors if the file can't be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        match tokio::fs::metadata(&path).await {
            Ok(_) => (),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("Creating empty records file {}", path.display());
                write_records::<R>(&path, &[]).await?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            rmw_mutex: Mutex::new(()),
            _records: PhantomData,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<R>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Python-`json.dump(indent=4)`-alike: 4 spaces, non-ASCII kept as is.
fn to_pretty_json<R: Serialize>(records: &[R]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;
    Ok(buffer)
}

async fn write_records<R: Serialize>(path: &Path, records: &[R]) -> Result<(), StoreError> {
    let bytes = to_pretty_json(records)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

impl<R: TrackedRecord> RecordStore<R> for JsonFileStore<R> {
    async fn append(&self, record: R) -> Result<(), StoreError> {
        let _guard = self.rmw_mutex.lock().await;

        let mut records = self.read().await?;
        push_unique(&mut records, record)?;
        write_records(&self.path, &records).await?;

        log::debug!(
            "Saved records to {}, {} total",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<R>, StoreError> {
        let _guard = self.rmw_mutex.lock().await;
        self.read().await
    }

    async fn find_and_update<F>(
        &self,
        message_id: MessageId,
        mutator: F,
    ) -> Result<Option<R>, StoreError>
    where
        F: FnOnce(&mut R) + Send,
    {
        let _guard = self.rmw_mutex.lock().await;

        let mut records = self.read().await?;
        let Some(updated) = update_first(&mut records, message_id, mutator) else {
            // Nothing to write back.
            return Ok(None);
        };
        write_records(&self.path, &records).await?;

        Ok(Some(updated))
    }
}
