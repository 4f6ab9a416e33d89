//! Instance Record Types

use crate::gateway::InstanceStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stored state of one organization's WhatsApp instance.
///
/// Deliberately not serializable: `token` authenticates this server to the
/// gateway and must never reach a tenant-facing response. API payloads are
/// built from [`StatusReport`] / [`ConnectReport`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub org_id: String,
    pub instance_name: String,
    pub token: String,
    pub status: InstanceStatus,
    pub phone_number: Option<String>,
    pub webhook_configured: bool,
    pub created_at: DateTime<Utc>,
    pub last_connected_at: Option<DateTime<Utc>>,
}

/// Tenant-facing view of instance state.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub configured: bool,
    pub status: InstanceStatus,
    pub phone_number: Option<String>,
    /// True when the gateway could not be reached and the status shown is
    /// the last-known stored state, not a fresh observation.
    pub degraded: bool,
}

/// Tenant-facing result of provision/reconnect, carrying fresh pairing codes.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectReport {
    pub configured: bool,
    pub status: InstanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<String>,
    #[serde(rename = "pairingCode", skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_shape() {
        let report = StatusReport {
            configured: true,
            status: InstanceStatus::Connected,
            phone_number: Some("5511999999999".to_string()),
            degraded: false,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["configured"], true);
        assert_eq!(json["status"], "connected");
        assert_eq!(json["phone_number"], "5511999999999");
        // The instance token has no path into this payload
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_connect_report_omits_absent_codes() {
        let report = ConnectReport {
            configured: true,
            status: InstanceStatus::Connected,
            qrcode: None,
            pairing_code: None,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert!(json.get("qrcode").is_none());
        assert!(json.get("pairingCode").is_none());
    }

    #[test]
    fn test_connect_report_renames_pairing_code() {
        let report = ConnectReport {
            configured: true,
            status: InstanceStatus::Connecting,
            qrcode: Some("data:image/png;base64,AAAA".to_string()),
            pairing_code: Some("ABCD-1234".to_string()),
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["pairingCode"], "ABCD-1234");
    }
}
