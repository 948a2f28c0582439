//! Named key spaces inside the redb file.

use redb::TableDefinition;

/// Raw byte table used for every bucket.
pub(crate) type RawTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// Every key space the store creates at open.
///
/// Record buckets map an 8-byte big-endian id to an encoded record. Unique
/// indexes map a value's bytes to an 8-byte id. Relationship indexes store
/// 16-byte `parent ‖ child` keys with empty values. The queue maps an 8-byte
/// sequence to an 8-byte job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// User records.
    Users,
    /// Playlist records.
    Playlists,
    /// Track records.
    Tracks,
    /// Job records.
    Jobs,
    /// Mobile number to user id.
    UsersMobileNumber,
    /// Feed token to playlist id.
    PlaylistsToken,
    /// Owner to playlist relation.
    UsersPlaylists,
    /// Playlist to track relation.
    PlaylistsTracks,
    /// Pending work in insertion order.
    JobQueue,
}

impl Bucket {
    /// Every bucket, in creation order.
    pub const ALL: [Self; 9] = [
        Self::Users,
        Self::Playlists,
        Self::Tracks,
        Self::Jobs,
        Self::UsersMobileNumber,
        Self::PlaylistsToken,
        Self::UsersPlaylists,
        Self::PlaylistsTracks,
        Self::JobQueue,
    ];

    /// Table name inside the database file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Playlists => "Playlists",
            Self::Tracks => "Tracks",
            Self::Jobs => "Jobs",
            Self::UsersMobileNumber => "Users.MobileNumber",
            Self::PlaylistsToken => "Playlists.Token",
            Self::UsersPlaylists => "Users.Playlists",
            Self::PlaylistsTracks => "Playlists.Tracks",
            Self::JobQueue => "JobQueue",
        }
    }

    pub(crate) const fn definition(self) -> RawTable {
        TableDefinition::new(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn bucket_names_are_distinct() {
        let names: HashSet<_> = Bucket::ALL.iter().map(|bucket| bucket.name()).collect();
        assert_eq!(names.len(), Bucket::ALL.len());
    }
}
