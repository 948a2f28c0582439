//! Peapod: playlists of audio tracks produced by background media jobs.
//!
//! The [`domain`] module holds entities, ports and the job pipeline;
//! [`outbound`] provides the embedded store and other adapters.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
