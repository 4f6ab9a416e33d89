//! CLI Command Handlers
//!
//! Builds the service stack from configuration and executes subcommands.
//! The CLI is the operator surface: it acts as the configured organization's
//! owner, which passes every role gate.

use super::{CampaignCommands, DbCommands, InstanceCommands, SendCommands};
use crate::campaign::{CampaignDispatcher, CampaignStore};
use crate::config::Config;
use crate::gateway::{HttpGateway, MediaKind, OutgoingMedia, WhatsAppGateway};
use crate::instance::{InstanceLifecycle, InstanceStore};
use crate::tenant::{Caller, MemberRole};
use crate::utils::{mask_secret, truncate_str};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Shared handles for commands that talk to the gateway and store.
pub(crate) struct AppContext {
    pool: sqlx::SqlitePool,
    gateway: Arc<dyn WhatsAppGateway>,
    instances: InstanceStore,
    lifecycle: InstanceLifecycle,
    caller: Caller,
}

pub(crate) async fn app_context(config: Config) -> Result<AppContext> {
    let org_id = config
        .tenant
        .org_id
        .clone()
        .context("no organization configured — set tenant.org_id in config.toml or ZAPGATE_ORG_ID")?;
    if config.gateway.admin_token.is_empty() {
        bail!("no gateway admin token configured — set ZAPGATE_ADMIN_TOKEN or gateway.admin_token");
    }

    let pool = crate::db::open_pool(&config.database.path)
        .await
        .with_context(|| format!("opening database {}", config.database.path))?;
    let gateway: Arc<dyn WhatsAppGateway> = Arc::new(HttpGateway::new(&config.gateway));
    let instances = InstanceStore::new(pool.clone());
    let webhook_url = crate::webhook::resolve_callback_url(config.webhook.public_url.as_deref());
    let lifecycle = InstanceLifecycle::new(gateway.clone(), instances.clone(), webhook_url);
    let caller = Caller::new(config.tenant.operator.clone(), org_id, MemberRole::Owner);

    Ok(AppContext {
        pool,
        gateway,
        instances,
        lifecycle,
        caller,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::config::default_config_path);
    let written = Config::write_default(&target, force)?;
    println!("Wrote {}", written.display());
    println!("Set tenant.org_id and ZAPGATE_ADMIN_TOKEN before provisioning.");
    Ok(())
}

pub(crate) fn show_config(path: Option<&Path>) -> Result<()> {
    let mut config = Config::load(path)?;
    if !config.gateway.admin_token.is_empty() {
        config.gateway.admin_token = mask_secret(&config.gateway.admin_token);
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub(crate) async fn instance_command(ctx: &AppContext, operation: InstanceCommands) -> Result<()> {
    let caller = Some(&ctx.caller);
    match operation {
        InstanceCommands::Provision => {
            let report = ctx.lifecycle.provision(caller).await?;
            if let Some(ref code) = report.pairing_code {
                println!("Pairing code: {code}");
            }
            print_json(&report)
        }
        InstanceCommands::Status => {
            let report = ctx.lifecycle.status(caller).await?;
            print_json(&report)
        }
        InstanceCommands::Connect => {
            let report = ctx.lifecycle.reconnect(caller).await?;
            print_json(&report)
        }
        InstanceCommands::Disconnect => {
            ctx.lifecycle.disconnect(caller).await?;
            println!("Instance disconnected.");
            Ok(())
        }
        InstanceCommands::Delete => {
            ctx.lifecycle.delete(caller).await?;
            println!("Instance deleted.");
            Ok(())
        }
    }
}

pub(crate) async fn send_command(ctx: &AppContext, operation: SendCommands) -> Result<()> {
    let caller = Some(&ctx.caller);
    match operation {
        SendCommands::Text { to, message } => {
            let receipt = ctx.lifecycle.send_text(caller, &to, &message).await?;
            print_json(&receipt)
        }
        SendCommands::Media {
            to,
            file,
            kind,
            caption,
        } => {
            let kind = MediaKind::parse(&kind)
                .with_context(|| format!("unknown media kind '{kind}' (image, video, audio, document)"))?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut media = OutgoingMedia::from_bytes(kind, &bytes);
            if let Some(caption) = caption {
                media = media.with_caption(caption);
            }
            if let Some(name) = file.file_name() {
                media = media.with_filename(name.to_string_lossy());
            }
            let receipt = ctx.lifecycle.send_media(caller, &to, &media).await?;
            print_json(&receipt)
        }
    }
}

pub(crate) async fn contacts_command(ctx: &AppContext) -> Result<()> {
    let contacts = ctx.lifecycle.contacts(Some(&ctx.caller)).await?;
    print_json(&contacts)
}

pub(crate) async fn campaign_command(ctx: &AppContext, operation: CampaignCommands) -> Result<()> {
    let store = CampaignStore::new(ctx.pool.clone());
    match operation {
        CampaignCommands::Queue { to, message } => {
            let queued = store.queue(&ctx.caller.org_id, &to, &message).await?;
            println!("Queued {} -> {}", queued.id, queued.to_number);
            Ok(())
        }
        CampaignCommands::Run => {
            let dispatcher =
                CampaignDispatcher::new(ctx.gateway.clone(), ctx.instances.clone(), store);
            let summary = dispatcher.run_once(&ctx.caller.org_id).await?;
            print_json(&summary)
        }
        CampaignCommands::List => {
            let messages = store.list(&ctx.caller.org_id).await?;
            for message in &messages {
                println!(
                    "{}  {:<12}  {}  {}{}",
                    message.id,
                    message.status.as_str(),
                    message.to_number,
                    truncate_str(&message.body, 40),
                    message
                        .last_error
                        .as_deref()
                        .map(|e| format!("  [{}]", truncate_str(e, 60)))
                        .unwrap_or_default(),
                );
            }
            println!("{} message(s)", messages.len());
            Ok(())
        }
    }
}

pub(crate) async fn db_command(ctx: &AppContext, operation: DbCommands) -> Result<()> {
    match operation {
        DbCommands::Init => {
            // Migrations already ran when the pool opened
            println!("Database ready.");
            Ok(())
        }
        DbCommands::Stats => {
            let stats = crate::db::stats(&ctx.pool).await?;
            print_json(&stats)
        }
    }
}
