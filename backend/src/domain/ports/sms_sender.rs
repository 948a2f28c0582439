//! Port for outbound text messages.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by SMS gateway adapters.
    pub enum SmsError {
        /// The gateway refused or failed to deliver the message.
        Delivery {
            /// Gateway error text.
            message: String,
        } => "sms delivery failed: {message}",
    }
}

/// A text message addressed to a user's phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sms {
    /// Recipient mobile number.
    pub to: String,
    /// Message body.
    pub body: String,
}

/// Sends text messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver `message`.
    async fn send_sms(&self, message: &Sms) -> Result<(), SmsError>;
}
