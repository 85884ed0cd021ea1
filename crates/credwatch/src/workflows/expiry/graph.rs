use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::debug;

use super::directory::{DirectoryClient, DirectoryError, OwnerLookupError};
use super::domain::{
    AccessToken, ApplicationRecord, CredentialEntry, CredentialKind, DirectoryIdentity,
};
use super::mailer::{DeliveryError, Mailer, OutboundMessage};

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const APPLICATION_FIELDS: &str =
    "id,appId,displayName,identifierUris,keyCredentials,passwordCredentials";

/// Connection settings for the Microsoft Graph adapters.
#[derive(Clone)]
pub struct GraphSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub graph_base_url: String,
    pub authority_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for GraphSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("graph_base_url", &self.graph_base_url)
            .field("authority_url", &self.authority_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GraphSetupError {
    #[error("graph runtime unavailable: {0}")]
    Runtime(String),
    #[error("graph http client unavailable: {0}")]
    Http(String),
}

/// Thin wrapper around an async reqwest client that lets the synchronous audit
/// talk to Graph without exposing async details. One client serves both the
/// directory reads and `sendMail`.
pub struct GraphClient {
    http: reqwest::Client,
    runtime: Runtime,
    settings: GraphSettings,
}

impl GraphClient {
    pub fn new(http: reqwest::Client, runtime: Runtime, settings: GraphSettings) -> Self {
        Self {
            http,
            runtime,
            settings,
        }
    }

    pub fn with_runtime(settings: GraphSettings) -> Result<Self, GraphSetupError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| GraphSetupError::Runtime(err.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| GraphSetupError::Http(err.to_string()))?;
        Ok(Self::new(http, runtime, settings))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.graph_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, token: &AccessToken) -> Result<T, String> {
        self.runtime.block_on(async {
            let response = self
                .http
                .get(url)
                .bearer_auth(token.secret())
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|err| err.to_string())?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!("{status}: {body}"));
            }

            response.json::<T>().await.map_err(|err| err.to_string())
        })
    }
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DirectoryClient for GraphClient {
    fn acquire_token(&self) -> Result<AccessToken, DirectoryError> {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.settings.authority_url.trim_end_matches('/'),
            self.settings.tenant_id
        );
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("scope", GRAPH_SCOPE),
            ("client_secret", self.settings.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let token = self.runtime.block_on(async {
            let response = self
                .http
                .post(&token_url)
                .form(&form)
                .send()
                .await
                .map_err(|err| DirectoryError::Auth(err.to_string()))?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(DirectoryError::Auth(format!("{status}: {body}")));
            }

            response
                .json::<TokenResponse>()
                .await
                .map_err(|err| DirectoryError::Auth(format!("invalid token response: {err}")))
        })?;

        Ok(AccessToken::new(token.access_token))
    }

    fn list_applications(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<ApplicationRecord>, DirectoryError> {
        let mut next = Some(self.endpoint(&format!("applications?$select={APPLICATION_FIELDS}")));
        let mut applications = Vec::new();

        while let Some(url) = next.take() {
            let page: GraphPage<GraphApplication> = self
                .get_json(&url, token)
                .map_err(DirectoryError::Transport)?;
            debug!(count = page.value.len(), "application page fetched");

            applications.extend(page.value.into_iter().map(ApplicationRecord::from));
            next = page.next_link;
        }

        Ok(applications)
    }

    fn primary_owner(
        &self,
        token: &AccessToken,
        application_id: &str,
    ) -> Result<Option<DirectoryIdentity>, OwnerLookupError> {
        let url = self.endpoint(&format!(
            "applications/{application_id}/owners?$select=mail,displayName"
        ));
        let page: GraphPage<DirectoryIdentity> =
            self.get_json(&url, token).map_err(|reason| OwnerLookupError {
                application_id: application_id.to_string(),
                reason,
            })?;
        Ok(page.value.into_iter().next())
    }
}

impl Mailer for GraphClient {
    fn send(&self, token: &AccessToken, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let url = self.endpoint(&format!("users/{}/sendMail", message.sender));
        let payload = SendMailRequest::from(message);

        self.runtime.block_on(async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(token.secret())
                .json(&payload)
                .send()
                .await
                .map_err(|err| DeliveryError::Transport(err.to_string()))?;

            let status = response.status();
            if status == StatusCode::ACCEPTED {
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(DeliveryError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphApplication {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    identifier_uris: Option<Vec<String>>,
    #[serde(default)]
    key_credentials: Option<Vec<GraphCredential>>,
    #[serde(default)]
    password_credentials: Option<Vec<GraphCredential>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphCredential {
    #[serde(default)]
    key_id: Option<String>,
    #[serde(default)]
    end_date_time: Option<String>,
}

impl GraphCredential {
    fn into_entry(self, kind: CredentialKind) -> CredentialEntry {
        CredentialEntry {
            key_id: self.key_id,
            kind,
            expires_at: self.end_date_time,
        }
    }
}

impl From<GraphApplication> for ApplicationRecord {
    fn from(app: GraphApplication) -> Self {
        let certificates = app
            .key_credentials
            .unwrap_or_default()
            .into_iter()
            .map(|credential| credential.into_entry(CredentialKind::Certificate));
        let secrets = app
            .password_credentials
            .unwrap_or_default()
            .into_iter()
            .map(|credential| credential.into_entry(CredentialKind::Secret));

        Self {
            id: app.id,
            app_id: app.app_id,
            display_name: app.display_name,
            identifier_uris: app.identifier_uris.unwrap_or_default(),
            credentials: certificates.chain(secrets).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: MailMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailMessage<'a> {
    subject: &'a str,
    body: MailBody<'a>,
    to_recipients: Vec<MailRecipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailRecipient<'a> {
    email_address: MailAddress<'a>,
}

#[derive(Debug, Serialize)]
struct MailAddress<'a> {
    address: &'a str,
}

impl<'a> From<&'a OutboundMessage> for SendMailRequest<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        Self {
            message: MailMessage {
                subject: &message.subject,
                body: MailBody {
                    content_type: "HTML",
                    content: &message.html_body,
                },
                to_recipients: message
                    .recipients
                    .iter()
                    .map(|address| MailRecipient {
                        email_address: MailAddress { address },
                    })
                    .collect(),
            },
            save_to_sent_items: true,
        }
    }
}
