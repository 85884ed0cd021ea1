use super::domain::AccessToken;

/// Outbound HTML message handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub sender: String,
}

/// Trait describing outbound mail delivery (e.g. Graph `sendMail` or SMTP adapters).
pub trait Mailer {
    fn send(&self, token: &AccessToken, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Mail dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("mail rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
