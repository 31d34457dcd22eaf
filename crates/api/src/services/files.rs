//! User file uploads into the object store.

use examhall_core::files::{sanitize_file_name, storage_key};
use examhall_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::error::AppResult;
use crate::storage::ObjectStore;

/// Where an upload ended up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Public URL devices download the file from.
    pub file_url: String,
    /// Object key, `{owner}/{unix_millis}_{sanitized}`.
    pub file_name: String,
    pub original_name: String,
    pub sanitized_name: String,
}

/// Store `bytes` for `owner_id` under a sanitized, timestamped key.
pub async fn store_upload(
    objects: &dyn ObjectStore,
    owner_id: DbId,
    original_name: &str,
    bytes: &[u8],
    now: Timestamp,
) -> AppResult<StoredFile> {
    let sanitized_name = sanitize_file_name(original_name);
    let key = storage_key(owner_id, now.timestamp_millis(), &sanitized_name);
    objects.put(&key, bytes).await?;

    tracing::info!(owner_id = %owner_id, key = %key, size = bytes.len(), "File uploaded");
    Ok(StoredFile {
        file_url: objects.public_url(&key),
        file_name: key,
        original_name: original_name.to_string(),
        sanitized_name,
    })
}
