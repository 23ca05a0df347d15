use async_trait::async_trait;
use std::time::Duration;

use super::Notifier;
use crate::config::SmsConfig;
use crate::error::{DelayError, Result};

/// Twilio-style REST messaging adapter.
///
/// Each message is one form-encoded `POST {api_base}/Accounts/{sid}/Messages.json`
/// carrying `To`, `From` and `Body`, authenticated with the account sid and token.
#[derive(Clone)]
pub struct SmsNotifier {
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl SmsNotifier {
    pub fn new(
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_base: api_base.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            client,
        }
    }

    /// Build from config, reading the auth token from the configured env var.
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        let auth_token = config.auth_token()?;
        if config.account_sid.trim().is_empty() {
            return Err(DelayError::config("sms.account_sid is empty"));
        }
        if config.from_number.trim().is_empty() {
            return Err(DelayError::config("sms.from_number is empty"));
        }
        Ok(Self::new(
            config.api_base.clone(),
            config.account_sid.clone(),
            auth_token,
            config.from_number.clone(),
        ))
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn id(&self) -> &'static str {
        "sms"
    }

    async fn send(&self, to: &str, body: &str) -> Result<()> {
        if to.trim().is_empty() {
            return Err(DelayError::Notify("recipient number is empty".into()));
        }

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| DelayError::Notify(format!("send to {to} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(DelayError::Notify(format!(
                "messaging API returned {status} for {to}: {detail}"
            )));
        }

        Ok(())
    }
}
