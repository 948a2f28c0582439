//! Log-only [`SmsSender`] used when no SMS gateway is configured.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{Sms, SmsError, SmsSender};

/// Writes each outbound message to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSmsSender;

impl TracingSmsSender {
    /// Create a new sender.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SmsSender for TracingSmsSender {
    async fn send_sms(&self, message: &Sms) -> Result<(), SmsError> {
        info!(to = %message.to, body = %message.body, "sms not delivered; no gateway configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn logging_sender_accepts_messages() {
        let sms = Sms {
            to: "5550001".to_owned(),
            body: "hello".to_owned(),
        };
        assert!(TracingSmsSender::new().send_sms(&sms).await.is_ok());
    }
}
