//! Listing entries returned by [`ObjectStoreClient::list`](super::ObjectStoreClient::list).

use jiff::Timestamp;
use object_store::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Metadata for a single stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Full object key within the bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    /// Entity tag, if the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

impl From<ObjectMeta> for ObjectInfo {
    fn from(meta: ObjectMeta) -> Self {
        // chrono DateTime to jiff Timestamp
        let last_modified = Timestamp::from_second(meta.last_modified.timestamp()).ok();

        Self {
            key: meta.location.to_string(),
            size: meta.size,
            last_modified,
            e_tag: meta.e_tag,
        }
    }
}
