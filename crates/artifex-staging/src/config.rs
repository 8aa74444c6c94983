//! Staging configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// Default values
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const MIN_SIGNED_URL_TTL_SECS: u64 = 60;
const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 3600;

/// Tunables of the [`StagingCoordinator`].
///
/// [`StagingCoordinator`]: crate::StagingCoordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StagingConfig {
    /// Lifetime of signed URLs handed to the pipeline, in seconds (60 to 604800)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "signed-url-ttl",
            env = "STAGING_SIGNED_URL_TTL",
            default_value_t = DEFAULT_SIGNED_URL_TTL_SECS
        )
    )]
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
}

fn default_signed_url_ttl() -> u64 {
    DEFAULT_SIGNED_URL_TTL_SECS
}

impl StagingConfig {
    /// Set the signed URL lifetime.
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl_secs = ttl.as_secs();
        self
    }

    /// Returns the signed URL lifetime.
    #[inline]
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }

    /// Checks that every value is within its accepted range.
    pub fn validate(&self) -> Result<()> {
        let range = MIN_SIGNED_URL_TTL_SECS..=MAX_SIGNED_URL_TTL_SECS;
        if !range.contains(&self.signed_url_ttl_secs) {
            return Err(Error::configuration(format!(
                "signed URL ttl must be between {MIN_SIGNED_URL_TTL_SECS} and \
                 {MAX_SIGNED_URL_TTL_SECS} seconds, got {}",
                self.signed_url_ttl_secs
            )));
        }
        Ok(())
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }
}
