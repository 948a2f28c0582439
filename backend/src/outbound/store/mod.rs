//! Embedded persistence on an ordered, byte-keyed transactional store.
//!
//! # Architecture
//!
//! - **Substrate** (`db`): redb database wrapped as [`Store`]/[`Tx`], with
//!   per-bucket sequences committed alongside the data.
//! - **Records** (`record`): one generic create/save/find path that assigns
//!   ids, stamps timestamps and validates foreign keys before any write.
//! - **Indexes** (`index`): unique value→id maps and ordered parent/child
//!   relations, always written in the caller's transaction.
//! - **Queue** (`job_queue`): FIFO of job ids with scan-and-skip dequeue and
//!   start-up recovery.
//! - **Services** (`services`): async domain port implementations, one
//!   transaction per call.
//!
//! Entity functions take `&Tx` so callers can compose several operations
//! into one atomic unit:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use peapod::domain::{Job, PlaylistId, User};
//! use peapod::outbound::store::{Store, jobs, users};
//!
//! let store = Store::in_memory(Arc::new(mockable::DefaultClock)).expect("store");
//! let job = store
//!     .update(|tx| {
//!         let user = users::create_user(tx, User::new("5550001"))?;
//!         jobs::create_job(tx, Job::from_text(user.id(), PlaylistId::UNASSIGNED, "hello"))
//!     })
//!     .expect("committed");
//! assert!(job.id().is_assigned());
//! ```

mod bucket;
pub mod codec;
mod db;
pub mod index;
pub mod job_queue;
pub mod jobs;
pub mod playlists;
mod record;
mod services;
pub mod tracks;
pub mod users;

pub use bucket::Bucket;
pub use db::{Entry, Store, Tx};
pub use services::{StoreJobQueue, StorePlaylistService, StoreTrackService, StoreUserService};
