//! ZapGate - WhatsApp Instance Lifecycle Service
//!
//! The WhatsApp connectivity layer of a multi-tenant CRM: each organization
//! owns at most one instance at an external HTTP gateway, and this crate
//! provisions it, keeps its stored status reconciled with the gateway's view,
//! sends messages through it, and tears it down.
//!
//! ## Features
//!
//! - **Typed gateway client:** instance provisioning, pairing, status, sends
//! - **Durable instance records:** one SQLite row per organization
//! - **Lifecycle orchestration:** provision / reconnect / status / disconnect
//!   / delete with best-effort remote compensation
//! - **Webhook event model:** connection updates reconciled into the store
//! - **Campaign dispatch:** throttled sequential batch sends
//!
//! ## Quick Start
//!
//! ```bash
//! # Write the default config, then set tenant.org_id and ZAPGATE_ADMIN_TOKEN
//! zapgate init
//!
//! # Provision and pair
//! zapgate instance provision
//! zapgate instance status
//!
//! # Send once connected
//! zapgate send text 5511988887777 "oi"
//! ```

pub mod campaign;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod instance;
pub mod logging;
pub mod tenant;
pub mod utils;
pub mod webhook;

// Re-export commonly used types
pub use error::{ErrorCode, ZapgateError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
