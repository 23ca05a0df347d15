//! Outbound delay alerts and the subscriber list they go to.

pub mod sms;

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::error::{DelayError, Result};
use crate::post::SubscriptionList;

pub use sms::SmsNotifier;

/// Delivery contract for a single text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable identifier used in logs (e.g. `sms`, `dry-run`).
    fn id(&self) -> &'static str;

    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

/// Logs each message instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    fn id(&self) -> &'static str {
        "dry-run"
    }

    async fn send(&self, to: &str, body: &str) -> Result<()> {
        info!(to, body, "dry run: message not sent");
        Ok(())
    }
}

/// Read the subscriber phone numbers, in file order.
pub async fn load_subscriptions(path: &Path) -> Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DelayError::io(path, e))?;
    parse_subscriptions(path, &raw)
}

fn parse_subscriptions(path: &Path, raw: &str) -> Result<Vec<String>> {
    let list: SubscriptionList =
        serde_json::from_str(raw).map_err(|e| DelayError::subscriptions(path, e.to_string()))?;
    Ok(list.numbers())
}
