//! HTTP Gateway Implementation
//!
//! Concrete [`WhatsAppGateway`] over reqwest. One fixed base URL per gateway
//! handle; fleet-level endpoints send the `admintoken` header, instance
//! endpoints send the per-instance `token` header. No retry or backoff —
//! failure semantics are the orchestrator's concern.

use super::error::{GatewayError, Result};
use super::types::*;
use super::WhatsAppGateway;
use crate::config::GatewaySettings;
use crate::utils::truncate_str;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Event set every instance webhook subscribes to.
const WEBHOOK_EVENTS: [&str; 3] = ["messages", "connection", "messages_update"];

/// Messages the gateway filters out before posting to the webhook —
/// suppresses the echo of messages this system sent itself.
const WEBHOOK_EXCLUDES: [&str; 1] = ["wasSentByApi"];

/// reqwest-backed gateway client.
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    admin_token: String,
    client: Client,
}

impl HttpGateway {
    /// Build a gateway handle from explicit settings. Configuration is passed
    /// in rather than read from ambient process state so tests can point the
    /// handle at a local double.
    pub fn new(settings: &GatewaySettings) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            admin_token: settings.admin_token.clone(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pass the response through, converting any non-2xx into
    /// [`GatewayError::Status`] with the upstream body preserved.
    async fn ok_or_error(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            "gateway: HTTP {} from upstream: {}",
            status,
            truncate_str(&body, 300)
        );
        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl WhatsAppGateway for HttpGateway {
    async fn create_instance(&self, name: &str) -> Result<CreatedInstance> {
        tracing::debug!("gateway: creating instance {}", name);
        let response = self
            .client
            .post(self.url("/instance/init"))
            .header("admintoken", &self.admin_token)
            .json(&InitRequest { name })
            .send()
            .await?;
        let body: InitResponse = Self::ok_or_error(response).await?.json().await?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("instance/init returned no token".into()))?;
        Ok(CreatedInstance {
            name: body.name.unwrap_or_else(|| name.to_string()),
            token,
        })
    }

    async fn configure_webhook(&self, token: &str, url: &str) -> Result<()> {
        tracing::debug!("gateway: configuring webhook -> {}", url);
        let response = self
            .client
            .post(self.url("/webhook"))
            .header("token", token)
            .json(&WebhookRequest {
                url,
                events: &WEBHOOK_EVENTS,
                exclude_messages: &WEBHOOK_EXCLUDES,
            })
            .send()
            .await?;
        Self::ok_or_error(response).await?;
        Ok(())
    }

    async fn connect(&self, token: &str) -> Result<ConnectionAttempt> {
        let response = self
            .client
            .post(self.url("/instance/connect"))
            .header("token", token)
            .send()
            .await?;
        let body: ConnectResponse = Self::ok_or_error(response).await?.json().await?;
        Ok(ConnectionAttempt {
            qrcode: body.qrcode.filter(|q| !q.is_empty()),
            pairing_code: body.paircode.filter(|p| !p.is_empty()),
        })
    }

    async fn get_status(&self, token: &str) -> Result<ObservedInstance> {
        // The gateway has no per-token status endpoint: list the fleet under
        // the admin token and match client-side.
        let response = self
            .client
            .get(self.url("/instance/all"))
            .header("admintoken", &self.admin_token)
            .send()
            .await?;
        let listed: Vec<ListedInstance> = Self::ok_or_error(response).await?.json().await?;

        let observed = listed
            .into_iter()
            .find(|entry| entry.token.as_deref() == Some(token))
            .map(|entry| ObservedInstance {
                status: InstanceStatus::from_gateway(entry.status.as_deref().unwrap_or_default()),
                phone_number: entry.phone.filter(|p| !p.is_empty()),
            })
            // Not listed yet: the instance is not visible remotely, which
            // reads as disconnected rather than an error.
            .unwrap_or(ObservedInstance {
                status: InstanceStatus::Disconnected,
                phone_number: None,
            });
        Ok(observed)
    }

    async fn disconnect(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/instance/disconnect"))
            .header("token", token)
            .send()
            .await?;
        Self::ok_or_error(response).await?;
        Ok(())
    }

    async fn delete_instance(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/instance"))
            .header("token", token)
            .send()
            .await?;
        Self::ok_or_error(response).await?;
        Ok(())
    }

    async fn send_text(&self, token: &str, number: &str, text: &str) -> Result<SendReceipt> {
        tracing::debug!("gateway: sending text to {}", number);
        let response = self
            .client
            .post(self.url("/send/text"))
            .header("token", token)
            .json(&SendTextRequest { number, text })
            .send()
            .await?;
        let body: SendResponse = Self::ok_or_error(response).await?.json().await?;
        Ok(SendReceipt {
            message_id: body.id,
        })
    }

    async fn send_media(
        &self,
        token: &str,
        number: &str,
        media: &OutgoingMedia,
    ) -> Result<SendReceipt> {
        tracing::debug!("gateway: sending {} to {}", media.kind.as_str(), number);
        let response = self
            .client
            .post(self.url("/send/media"))
            .header("token", token)
            .json(&SendMediaRequest {
                number,
                kind: media.kind.as_str(),
                file: &media.file,
                caption: media.caption.as_deref(),
                doc_name: media.filename.as_deref(),
            })
            .send()
            .await?;
        let body: SendResponse = Self::ok_or_error(response).await?.json().await?;
        Ok(SendReceipt {
            message_id: body.id,
        })
    }

    async fn contacts(&self, token: &str) -> Result<Vec<Contact>> {
        let response = self
            .client
            .get(self.url("/contacts"))
            .header("token", token)
            .send()
            .await?;
        let listed: Vec<ContactEntry> = Self::ok_or_error(response).await?.json().await?;
        Ok(listed
            .into_iter()
            .map(|entry| Contact {
                // JIDs come back as "5511999999999@s.whatsapp.net"
                number: entry
                    .number
                    .split('@')
                    .next()
                    .unwrap_or(&entry.number)
                    .to_string(),
                name: entry.name,
            })
            .collect())
    }

    async fn download_profile(&self, token: &str, number: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/misc/downProfile"))
            .header("token", token)
            .json(&ProfileRequest { number })
            .send()
            .await?;
        let body: ProfileResponse = Self::ok_or_error(response).await?.json().await?;
        Ok(body.url.filter(|u| !u.is_empty()))
    }

    async fn download_message(&self, token: &str, message_id: &str) -> Result<DownloadedMedia> {
        let response = self
            .client
            .post(self.url("/message/download"))
            .header("token", token)
            .json(&DownloadRequest { id: message_id })
            .send()
            .await?;
        let body: DownloadResponse = Self::ok_or_error(response).await?.json().await?;
        if body.base64.is_none() && body.url.is_none() {
            return Err(GatewayError::InvalidResponse(
                "message/download returned neither content nor URL".into(),
            ));
        }
        Ok(DownloadedMedia {
            base64: body.base64,
            url: body.url,
            mimetype: body.mimetype,
        })
    }
}

// Gateway wire formats

#[derive(Serialize)]
struct InitRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct InitResponse {
    name: Option<String>,
    token: Option<String>,
}

#[derive(Serialize)]
struct WebhookRequest<'a> {
    url: &'a str,
    events: &'a [&'a str],
    #[serde(rename = "excludeMessages")]
    exclude_messages: &'a [&'a str],
}

#[derive(Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    qrcode: Option<String>,
    #[serde(default, alias = "pairingCode")]
    paircode: Option<String>,
}

#[derive(Deserialize)]
struct ListedInstance {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "owner")]
    phone: Option<String>,
}

#[derive(Serialize)]
struct SendTextRequest<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct SendMediaRequest<'a> {
    number: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(rename = "docName", skip_serializing_if = "Option::is_none")]
    doc_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ContactEntry {
    #[serde(alias = "jid")]
    number: String,
    #[serde(default, alias = "pushName")]
    name: Option<String>,
}

#[derive(Serialize)]
struct ProfileRequest<'a> {
    number: &'a str,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct DownloadRequest<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    base64: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    mimetype: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn gateway_for(server: &mockito::Server) -> HttpGateway {
        HttpGateway::new(&GatewaySettings {
            base_url: server.url(),
            admin_token: "admin-secret".to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_instance_uses_admin_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/instance/init")
            .match_header("admintoken", "admin-secret")
            .match_body(Matcher::PartialJson(json!({ "name": "org_T1" })))
            .with_status(200)
            .with_body(r#"{"name":"org_T1","token":"tok123"}"#)
            .create_async()
            .await;

        let created = gateway_for(&server)
            .create_instance("org_T1")
            .await
            .expect("create should succeed");
        assert_eq!(created.name, "org_T1");
        assert_eq!(created.token, "tok123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_instance_collision_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/instance/init")
            .with_status(409)
            .with_body("name already in use")
            .create_async()
            .await;

        let err = gateway_for(&server)
            .create_instance("org_T1")
            .await
            .expect_err("collision should fail");
        assert!(
            matches!(&err, GatewayError::Status { status: 409, body } if body.contains("already in use")),
            "expected Status error, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_create_instance_empty_token_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/instance/init")
            .with_status(200)
            .with_body(r#"{"name":"org_T1","token":""}"#)
            .create_async()
            .await;

        let err = gateway_for(&server)
            .create_instance("org_T1")
            .await
            .expect_err("empty token should fail");
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_configure_webhook_subscribes_event_set() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_header("token", "tok123")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://app.example.com/api/webhooks/whatsapp",
                "events": ["messages", "connection", "messages_update"],
                "excludeMessages": ["wasSentByApi"],
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        gateway_for(&server)
            .configure_webhook("tok123", "https://app.example.com/api/webhooks/whatsapp")
            .await
            .expect("webhook config should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connect_returns_codes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/instance/connect")
            .match_header("token", "tok123")
            .with_status(200)
            .with_body(r#"{"qrcode":"data:image/png;base64,AAAA","paircode":"ABCD-1234"}"#)
            .create_async()
            .await;

        let attempt = gateway_for(&server)
            .connect("tok123")
            .await
            .expect("connect should succeed");
        assert_eq!(attempt.qrcode.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(attempt.pairing_code.as_deref(), Some("ABCD-1234"));
    }

    #[tokio::test]
    async fn test_get_status_matches_token_in_listing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/instance/all")
            .match_header("admintoken", "admin-secret")
            .with_status(200)
            .with_body(
                r#"[
                    {"name":"other","token":"tok999","status":"connecting"},
                    {"name":"org_T1","token":"tok123","status":"connected","phone":"5511999999999"}
                ]"#,
            )
            .create_async()
            .await;

        let observed = gateway_for(&server)
            .get_status("tok123")
            .await
            .expect("status should succeed");
        assert_eq!(observed.status, InstanceStatus::Connected);
        assert_eq!(observed.phone_number.as_deref(), Some("5511999999999"));
    }

    #[tokio::test]
    async fn test_get_status_missing_instance_reads_disconnected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/instance/all")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let observed = gateway_for(&server)
            .get_status("tok123")
            .await
            .expect("empty listing is not an error");
        assert_eq!(observed.status, InstanceStatus::Disconnected);
        assert_eq!(observed.phone_number, None);
    }

    #[tokio::test]
    async fn test_send_text_uses_instance_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send/text")
            .match_header("token", "tok123")
            .match_body(Matcher::PartialJson(
                json!({ "number": "5511988887777", "text": "oi" }),
            ))
            .with_status(200)
            .with_body(r#"{"id":"msg-1"}"#)
            .create_async()
            .await;

        let receipt = gateway_for(&server)
            .send_text("tok123", "5511988887777", "oi")
            .await
            .expect("send should succeed");
        assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_media_serializes_kind_and_caption() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send/media")
            .match_body(Matcher::PartialJson(json!({
                "number": "5511988887777",
                "type": "image",
                "file": "YWJj",
                "caption": "look",
            })))
            .with_status(200)
            .with_body(r#"{"id":"msg-2"}"#)
            .create_async()
            .await;

        let media = OutgoingMedia::from_bytes(MediaKind::Image, b"abc").with_caption("look");
        gateway_for(&server)
            .send_media("tok123", "5511988887777", &media)
            .await
            .expect("media send should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_contacts_strips_jid_suffix() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/contacts")
            .match_header("token", "tok123")
            .with_status(200)
            .with_body(r#"[{"jid":"5511999999999@s.whatsapp.net","name":"Ana"}]"#)
            .create_async()
            .await;

        let contacts = gateway_for(&server)
            .contacts("tok123")
            .await
            .expect("contacts should succeed");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].number, "5511999999999");
        assert_eq!(contacts[0].name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_download_profile_returns_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/misc/downProfile")
            .match_header("token", "tok123")
            .match_body(Matcher::PartialJson(json!({ "number": "5511999999999" })))
            .with_status(200)
            .with_body(r#"{"url":"https://cdn.example.com/profile.jpg"}"#)
            .create_async()
            .await;

        let url = gateway_for(&server)
            .download_profile("tok123", "5511999999999")
            .await
            .expect("profile lookup should succeed");
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/profile.jpg"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_profile_empty_url_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/misc/downProfile")
            .with_status(200)
            .with_body(r#"{"url":""}"#)
            .create_async()
            .await;

        let url = gateway_for(&server)
            .download_profile("tok123", "5511999999999")
            .await
            .expect("hidden picture is not an error");
        assert_eq!(url, None);
    }

    #[tokio::test]
    async fn test_download_message_requires_content_or_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/message/download")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = gateway_for(&server)
            .download_message("tok123", "msg-1")
            .await
            .expect_err("empty download should fail");
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_disconnect_propagates_upstream_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/instance/disconnect")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let err = gateway_for(&server)
            .disconnect("tok123")
            .await
            .expect_err("500 should surface");
        assert!(matches!(err, GatewayError::Status { status: 500, .. }));
    }
}
