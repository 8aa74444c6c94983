//! Deterministic content hashing of parameter documents.
//!
//! The hash is a compatibility boundary: any consumer holding the same
//! parameters must be able to recompute it. It is defined as the uppercase
//! hex SHA-256 digest of the canonical JSON encoding of the document:
//!
//! - object members sorted by the UTF-8 bytes of their names, at every depth
//! - no whitespace between tokens
//! - strings escaped the way `serde_json` writes them
//! - integral numbers written without a fraction (`1.0` becomes `1`)
//!
//! A parameters document is an object mapping parameter names to parameter
//! objects, each of which carries at least a string `value`.
//!
//! Canonical keys written by older deployments carry 40 character uppercase
//! SHA-1 digests. Those are not accepted as a [`ContentHash`]: a project
//! committed under the legacy digest is regenerated rather than reused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

const DIGEST_HEX_LEN: usize = 64;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Identifies one generated version of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes a parsed parameters document.
    pub fn of(document: &Value) -> Result<Self> {
        let canonical = canonicalize(document)?;
        Ok(Self(hex::encode_upper(Sha256::digest(&canonical))))
    }

    /// Parses and hashes a serialized parameters document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::hash_input(format!("not valid JSON: {e}")))?;
        Self::of(&document)
    }

    /// Returns the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == DIGEST_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
        if !valid {
            return Err(Error::hash_input(format!(
                "'{s}' is not a {DIGEST_HEX_LEN} character uppercase hex digest"
            )));
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Validates `document` and returns its canonical encoding.
pub fn canonicalize(document: &Value) -> Result<Vec<u8>> {
    validate(document)?;

    let mut out = Vec::new();
    write_canonical(document, &mut out)?;
    Ok(out)
}

fn validate(document: &Value) -> Result<()> {
    let Value::Object(parameters) = document else {
        return Err(Error::hash_input(format!(
            "expected an object of parameters, found {}",
            type_name(document)
        )));
    };

    for (name, parameter) in parameters {
        let Value::Object(fields) = parameter else {
            return Err(Error::hash_input(format!(
                "parameter '{name}' must be an object, found {}",
                type_name(parameter)
            )));
        };
        match fields.get("value") {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(Error::hash_input(format!(
                    "parameter '{name}' has a {} value, expected a string",
                    type_name(other)
                )));
            }
            None => {
                return Err(Error::hash_input(format!(
                    "parameter '{name}' is missing its value"
                )));
            }
        }
    }

    Ok(())
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => serde_json::to_writer(&mut *out, value)?,
        Value::Number(number) => write_number(number, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(members) => write_object(members, out)?,
    }
    Ok(())
}

fn write_object(members: &Map<String, Value>, out: &mut Vec<u8>) -> Result<()> {
    let mut sorted: Vec<_> = members.iter().collect();
    sorted.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    out.push(b'{');
    for (i, (name, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut *out, name)?;
        out.push(b':');
        write_canonical(value, out)?;
    }
    out.push(b'}');
    Ok(())
}

fn write_number(number: &Number, out: &mut Vec<u8>) {
    let text = match number.as_f64() {
        Some(f) if !number.is_i64() && !number.is_u64() && is_exact_integer(f) => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    };
    out.extend_from_slice(text.as_bytes());
}

fn is_exact_integer(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
