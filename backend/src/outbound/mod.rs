//! Outbound adapters implementing domain ports for infrastructure.
//!
//! - **store**: embedded redb persistence, indexes and the job queue
//! - **file_store**: media files on local disk
//! - **sms**: log-only SMS sender
//! - **media_source**: placeholder URL/TTS sources
//!
//! Adapters translate between domain types and infrastructure; business
//! rules live in the domain or, for integrity checks that must share a
//! transaction, in the store's entity functions.

pub mod file_store;
pub mod media_source;
pub mod sms;
pub mod store;

pub use file_store::LocalFileStore;
pub use media_source::UnconfiguredMediaSource;
pub use sms::TracingSmsSender;
