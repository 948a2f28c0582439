//! Persistence shared by every entity: id assignment, timestamps,
//! validation, encoding.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::ports::RepositoryError;

use super::bucket::Bucket;
use super::codec::{decode_record, encode_id, encode_record};
use super::db::Tx;

/// An entity stored as one encoded value under its id.
pub(crate) trait Record: Serialize + DeserializeOwned {
    /// Bucket holding records of this type.
    const BUCKET: Bucket;
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    fn raw_id(&self) -> u64;
    fn assign_raw_id(&mut self, id: u64);
    fn stamp_created(&mut self, now: DateTime<Utc>);
    fn stamp_updated(&mut self, now: DateTime<Utc>);

    /// Check required fields and foreign keys against `tx`.
    fn validate(&self, tx: &Tx) -> Result<(), RepositoryError>;
}

/// Validate, number, stamp and write a new record.
///
/// The record is mutated in place so the caller sees the assigned id and
/// timestamps. Nothing is written if validation fails.
pub(crate) fn create<R: Record>(tx: &Tx, record: &mut R) -> Result<u64, RepositoryError> {
    record.validate(tx)?;
    let id = tx.next_sequence(R::BUCKET)?;
    let now = tx.now();
    record.assign_raw_id(id);
    record.stamp_created(now);
    record.stamp_updated(now);
    write(tx, record)?;
    Ok(id)
}

/// Validate, stamp and overwrite an existing record.
pub(crate) fn save<R: Record>(tx: &Tx, record: &mut R) -> Result<(), RepositoryError> {
    if record.raw_id() == 0 {
        return Err(RepositoryError::validation(format!("{} id", R::ENTITY)));
    }
    record.validate(tx)?;
    record.stamp_updated(tx.now());
    write(tx, record)
}

pub(crate) fn find_by_id<R: Record>(tx: &Tx, id: u64) -> Result<Option<R>, RepositoryError> {
    tx.get(R::BUCKET, &encode_id(id))?
        .map(|bytes| decode_record(R::ENTITY, &bytes))
        .transpose()
}

pub(crate) fn exists<R: Record>(tx: &Tx, id: u64) -> Result<bool, RepositoryError> {
    tx.contains(R::BUCKET, &encode_id(id))
}

fn write<R: Record>(tx: &Tx, record: &R) -> Result<(), RepositoryError> {
    let bytes = encode_record(R::ENTITY, record)?;
    tx.put(R::BUCKET, &encode_id(record.raw_id()), &bytes)
}

/// Reject empty required text.
pub(crate) fn require_text(value: &str, field: &str) -> Result<(), RepositoryError> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation(field));
    }
    Ok(())
}

/// Reject an unset foreign key, then one that points nowhere.
pub(crate) fn require_reference<R: Record>(
    tx: &Tx,
    id: u64,
    field: &str,
) -> Result<(), RepositoryError> {
    if id == 0 {
        return Err(RepositoryError::validation(field));
    }
    if !exists::<R>(tx, id)? {
        return Err(RepositoryError::reference_not_found(R::ENTITY, id));
    }
    Ok(())
}
