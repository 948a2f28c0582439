//! Byte encodings for keys and records.
//!
//! Ids are 8-byte big-endian so that lexicographic key order equals numeric
//! order; relationship keys concatenate two ids so a prefix scan over the
//! parent yields children in ascending id order.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::ports::RepositoryError;

/// Width of an encoded id.
pub const ID_LEN: usize = 8;

/// Width of a relationship key.
pub const RELATION_KEY_LEN: usize = ID_LEN * 2;

/// Encode an id as a sortable key.
#[must_use]
pub const fn encode_id(id: u64) -> [u8; ID_LEN] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian id.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] when `bytes` is not exactly
/// [`ID_LEN`] long.
pub fn decode_id(bytes: &[u8]) -> Result<u64, RepositoryError> {
    let raw: [u8; ID_LEN] = bytes.try_into().map_err(|_| {
        RepositoryError::substrate(format!(
            "expected {ID_LEN}-byte id, found {} bytes",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}

/// Build the `parent ‖ child` key of a relationship index entry.
#[must_use]
pub fn relation_key(parent: u64, child: u64) -> [u8; RELATION_KEY_LEN] {
    let mut key = [0_u8; RELATION_KEY_LEN];
    key[..ID_LEN].copy_from_slice(&encode_id(parent));
    key[ID_LEN..].copy_from_slice(&encode_id(child));
    key
}

/// Split a relationship key into `(parent, child)`.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] for keys of the wrong width.
pub fn split_relation_key(key: &[u8]) -> Result<(u64, u64), RepositoryError> {
    if key.len() != RELATION_KEY_LEN {
        return Err(RepositoryError::substrate(format!(
            "expected {RELATION_KEY_LEN}-byte relation key, found {} bytes",
            key.len()
        )));
    }
    let (parent, child) = key.split_at(ID_LEN);
    Ok((decode_id(parent)?, decode_id(child)?))
}

pub(crate) fn encode_record<T: Serialize>(entity: &str, record: &T) -> Result<Vec<u8>, RepositoryError> {
    rmp_serde::to_vec_named(record)
        .map_err(|err| RepositoryError::substrate(format!("encode {entity}: {err}")))
}

pub(crate) fn decode_record<T: DeserializeOwned>(
    entity: &str,
    bytes: &[u8],
) -> Result<T, RepositoryError> {
    rmp_serde::from_slice(bytes)
        .map_err(|err| RepositoryError::substrate(format!("decode {entity}: {err}")))
}
