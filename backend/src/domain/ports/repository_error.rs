//! Error taxonomy shared by every store-backed port.

use super::define_port_error;

define_port_error! {
    /// Failures raised by repositories and the services layered on them.
    ///
    /// Everything except [`RepositoryError::Substrate`] is detected before the
    /// enclosing transaction writes anything, so retrying is only useful for
    /// substrate failures.
    pub enum RepositoryError {
        /// A required field is missing or empty.
        Validation {
            /// Name of the missing field.
            field: String,
        } => "{field} required",
        /// A foreign key does not resolve to an existing record.
        ReferenceNotFound {
            /// Kind of record the reference points at.
            entity: String,
            /// Identifier that resolved to nothing.
            id: u64,
        } => "{entity} not found: id={id}",
        /// A unique index already maps the value to another record.
        DuplicateValue {
            /// Index name, for example `Users.MobileNumber`.
            index: String,
            /// Value already taken.
            value: String,
        } => "duplicate value in {index}: {value}",
        /// A mutation addressed a record that does not exist.
        NotFound {
            /// Kind of record addressed.
            entity: String,
            /// Identifier of the absent record.
            id: u64,
        } => "{entity} not found: id={id}",
        /// A job status change outside the state machine.
        InvalidTransition {
            /// Current status.
            from: String,
            /// Requested status.
            to: String,
        } => "invalid job status transition: {from} -> {to}",
        /// The key-value store failed or returned undecodable bytes.
        Substrate {
            /// Underlying store error text.
            message: String,
        } => "storage failure: {message}",
    }
}

impl RepositoryError {
    /// Whether retrying the whole operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Substrate { .. })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RepositoryError::validation("mobile number"), false)]
    #[case(RepositoryError::reference_not_found("user", 9_u64), false)]
    #[case(RepositoryError::duplicate_value("Users.MobileNumber", "555"), false)]
    #[case(RepositoryError::substrate("disk full"), true)]
    fn only_substrate_failures_are_retryable(
        #[case] error: RepositoryError,
        #[case] retryable: bool,
    ) {
        assert_eq!(error.is_retryable(), retryable);
    }

    #[rstest]
    fn messages_name_the_offending_value() {
        assert_eq!(
            RepositoryError::validation("playlist name").to_string(),
            "playlist name required"
        );
        assert_eq!(
            RepositoryError::invalid_transition("pending", "completed").to_string(),
            "invalid job status transition: pending -> completed"
        );
    }
}
