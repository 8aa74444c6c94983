//! HMAC-SHA256 URL signer for stores without native presigning.

use std::time::Duration;

use hmac::{Hmac, Mac};
use jiff::{SignedDuration, Timestamp};
use sha2::Sha256;
use url::Url;

use super::UrlSigner;
use crate::client::SignMethod;
use crate::{Error, Result, TRACING_TARGET};

type HmacSha256 = Hmac<Sha256>;

const QUERY_METHOD: &str = "method";
const QUERY_EXPIRES: &str = "expires";
const QUERY_SIGNATURE: &str = "signature";

/// Signs URLs of the form `{base}/{key}?method=..&expires=..&signature=..`.
///
/// The signature is `HMAC-SHA256(secret, "{METHOD}\n{key}\n{expires}")`
/// rendered as lowercase hex, where `expires` is a unix timestamp in seconds.
/// Whatever serves the objects behind `base` checks requests with
/// [`HmacSigner::verify`].
#[derive(Clone)]
pub struct HmacSigner {
    base_url: Url,
    secret: Vec<u8>,
}

impl HmacSigner {
    /// Creates a signer issuing URLs below `base_url`.
    pub fn new(base_url: Url, secret: impl Into<Vec<u8>>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::configuration("signing secret must not be empty"));
        }
        if base_url.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "signing base URL '{base_url}' cannot be a base"
            )));
        }

        Ok(Self { base_url, secret })
    }

    /// Returns the base URL objects are served under.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Checks that `url` is a valid, unexpired signature for `key` and `method`.
    pub fn verify(&self, url: &Url, key: &str, method: SignMethod, now: Timestamp) -> Result<()> {
        let mut signed_method = None;
        let mut expires = None;
        let mut signature = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                QUERY_METHOD => signed_method = Some(value.into_owned()),
                QUERY_EXPIRES => expires = Some(value.into_owned()),
                QUERY_SIGNATURE => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        let (Some(signed_method), Some(expires), Some(signature)) =
            (signed_method, expires, signature)
        else {
            return Err(Error::signing(key, "missing signature parameters"));
        };

        if signed_method != method.as_ref() {
            return Err(Error::signing(
                key,
                format!("URL was signed for {signed_method}, not {method}"),
            ));
        }

        let expires_secs: i64 = expires
            .parse()
            .map_err(|_| Error::signing(key, format!("invalid expiry '{expires}'")))?;
        if now.as_second() > expires_secs {
            return Err(Error::signing(key, "URL has expired"));
        }

        let signature = hex::decode(&signature)
            .map_err(|e| Error::signing(key, format!("invalid signature encoding: {e}")))?;
        self.mac(key, method, expires_secs)?
            .verify_slice(&signature)
            .map_err(|_| Error::signing(key, "signature mismatch"))
    }

    fn mac(&self, key: &str, method: SignMethod, expires: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::signing(key, e.to_string()))?;
        mac.update(method.as_ref().as_bytes());
        mac.update(b"\n");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

#[async_trait::async_trait]
impl UrlSigner for HmacSigner {
    async fn sign(&self, key: &str, method: SignMethod, ttl: Duration) -> Result<Url> {
        let ttl = SignedDuration::try_from(ttl)
            .map_err(|e| Error::signing(key, format!("invalid ttl: {e}")))?;
        let expires = Timestamp::now()
            .checked_add(ttl)
            .map_err(|e| Error::signing(key, format!("invalid ttl: {e}")))?
            .as_second();

        let signature = hex::encode(self.mac(key, method, expires)?.finalize().into_bytes());

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::signing(key, "base URL cannot be a base"))?
            .pop_if_empty()
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair(QUERY_METHOD, method.as_ref())
            .append_pair(QUERY_EXPIRES, &expires.to_string())
            .append_pair(QUERY_SIGNATURE, &signature);

        tracing::trace!(
            target: TRACING_TARGET,
            key = %key,
            method = %method,
            expires,
            "Signed URL issued"
        );

        Ok(url)
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
