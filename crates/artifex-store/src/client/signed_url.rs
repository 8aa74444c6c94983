//! Time-scoped access URLs handed to external workers.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use url::Url;

/// Access granted by a signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ObjectAccess {
    /// Download only.
    Read,
    /// Upload only.
    Write,
    /// Both download and upload.
    ReadWrite,
}

impl ObjectAccess {
    /// Whether a download URL is needed.
    #[inline]
    pub fn allows_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Whether an upload URL is needed.
    #[inline]
    pub fn allows_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// HTTP verb a single signature is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SignMethod {
    /// Download with `GET`.
    Get,
    /// Upload with `PUT`.
    Put,
}

/// One or two presigned URLs for a single object key.
///
/// Stores issue one signature per HTTP verb, so [`ObjectAccess::ReadWrite`]
/// carries both a download and an upload URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    /// Access the URLs were issued for.
    pub access: ObjectAccess,
    /// Download URL, present for read access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<Url>,
    /// Upload URL, present for write access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<Url>,
    /// Instant after which the store rejects the URLs.
    pub expires_at: Timestamp,
}
