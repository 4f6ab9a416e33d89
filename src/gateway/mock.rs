//! Scripted gateway double for orchestrator and dispatcher tests.
//!
//! Records every call and fails individual operations on demand, so tests can
//! assert convergence behavior without a live gateway.

use super::error::{GatewayError, Result};
use super::types::*;
use super::WhatsAppGateway;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub(crate) struct MockGateway {
    token: String,
    pub fail_create: AtomicBool,
    pub fail_webhook: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_status: AtomicBool,
    pub fail_disconnect: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_send: AtomicBool,
    pub observed: Mutex<ObservedInstance>,
    pub calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            fail_create: AtomicBool::new(false),
            fail_webhook: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            observed: Mutex::new(ObservedInstance {
                status: InstanceStatus::Connecting,
                phone_number: None,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_observed(&self, status: InstanceStatus, phone: Option<&str>) {
        *self.observed.lock().expect("observed lock") = ObservedInstance {
            status,
            phone_number: phone.map(str::to_string),
        };
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().expect("calls lock").push(call.to_string());
    }

    fn gate(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 500,
                body: format!("mock {op} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WhatsAppGateway for MockGateway {
    async fn create_instance(&self, name: &str) -> Result<CreatedInstance> {
        self.record("create_instance");
        self.gate(&self.fail_create, "create_instance")?;
        Ok(CreatedInstance {
            name: name.to_string(),
            token: self.token.clone(),
        })
    }

    async fn configure_webhook(&self, _token: &str, _url: &str) -> Result<()> {
        self.record("configure_webhook");
        self.gate(&self.fail_webhook, "configure_webhook")
    }

    async fn connect(&self, _token: &str) -> Result<ConnectionAttempt> {
        self.record("connect");
        self.gate(&self.fail_connect, "connect")?;
        Ok(ConnectionAttempt {
            qrcode: Some("data:image/png;base64,MOCK".to_string()),
            pairing_code: Some("MOCK-CODE".to_string()),
        })
    }

    async fn get_status(&self, _token: &str) -> Result<ObservedInstance> {
        self.record("get_status");
        self.gate(&self.fail_status, "get_status")?;
        Ok(self.observed.lock().expect("observed lock").clone())
    }

    async fn disconnect(&self, _token: &str) -> Result<()> {
        self.record("disconnect");
        self.gate(&self.fail_disconnect, "disconnect")
    }

    async fn delete_instance(&self, _token: &str) -> Result<()> {
        self.record("delete_instance");
        self.gate(&self.fail_delete, "delete_instance")
    }

    async fn send_text(&self, _token: &str, number: &str, _text: &str) -> Result<SendReceipt> {
        self.record(&format!("send_text:{number}"));
        self.gate(&self.fail_send, "send_text")?;
        Ok(SendReceipt {
            message_id: Some(format!("mock-{number}")),
        })
    }

    async fn send_media(
        &self,
        _token: &str,
        number: &str,
        _media: &OutgoingMedia,
    ) -> Result<SendReceipt> {
        self.record(&format!("send_media:{number}"));
        self.gate(&self.fail_send, "send_media")?;
        Ok(SendReceipt {
            message_id: Some(format!("mock-{number}")),
        })
    }

    async fn contacts(&self, _token: &str) -> Result<Vec<Contact>> {
        self.record("contacts");
        Ok(vec![Contact {
            number: "5511999999999".to_string(),
            name: Some("Mock Contact".to_string()),
        }])
    }

    async fn download_profile(&self, _token: &str, _number: &str) -> Result<Option<String>> {
        self.record("download_profile");
        Ok(Some("https://cdn.example.com/profile.jpg".to_string()))
    }

    async fn download_message(&self, _token: &str, _message_id: &str) -> Result<DownloadedMedia> {
        self.record("download_message");
        Ok(DownloadedMedia {
            base64: Some("AAAA".to_string()),
            url: None,
            mimetype: Some("image/jpeg".to_string()),
        })
    }
}
