//! Port for the component that performs a job's actual work.

use async_trait::async_trait;

use crate::domain::Job;

use super::define_port_error;

define_port_error! {
    /// Errors recorded on a job when execution fails.
    ///
    /// The display form is stored verbatim in the job's `error` field.
    pub enum JobExecutionError {
        /// The job's payload cannot be executed.
        InvalidJob {
            /// Why the payload was rejected.
            message: String,
        } => "invalid job: {message}",
        /// A collaborator failed while the job was running.
        Failed {
            /// Failure text recorded on the job.
            message: String,
        } => "{message}",
    }
}

/// Executes a claimed job.
///
/// Jobs may be retried after a crash, so implementations must tolerate being
/// run more than once for the same job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run `job` to completion.
    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError>;
}
