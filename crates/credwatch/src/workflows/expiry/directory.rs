use super::domain::{AccessToken, ApplicationRecord, DirectoryIdentity};

/// Read access to the identity directory. Implementations are expected to be
/// synchronous; every call of a run happens on the caller's thread.
pub trait DirectoryClient {
    fn acquire_token(&self) -> Result<AccessToken, DirectoryError>;

    /// Every application registration, following pagination until exhausted.
    fn list_applications(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<ApplicationRecord>, DirectoryError>;

    /// First owner registered for the application, if any.
    fn primary_owner(
        &self,
        token: &AccessToken,
        application_id: &str,
    ) -> Result<Option<DirectoryIdentity>, OwnerLookupError>;
}

/// Failures that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("token acquisition failed: {0}")]
    Auth(String),
    #[error("application listing failed: {0}")]
    Transport(String),
}

/// Owner lookup failure; contained to the application it concerns.
#[derive(Debug, thiserror::Error)]
#[error("owner lookup for application {application_id} failed: {reason}")]
pub struct OwnerLookupError {
    pub application_id: String,
    pub reason: String,
}
