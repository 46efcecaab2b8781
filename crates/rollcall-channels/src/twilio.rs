//! Twilio WhatsApp channel.
//!
//! Sends through the Twilio Messages API using a WhatsApp-enabled sender.
//! Requires: Account SID + Auth Token, and a `whatsapp:+…` sender address.

use async_trait::async_trait;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::MessageGateway;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio credentials and sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender, e.g. `whatsapp:+14155238886`.
    pub from: String,
}

pub struct TwilioGateway {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{API_BASE}/Accounts/{}/Messages.json", self.config.account_sid)
    }
}

/// Twilio wants WhatsApp recipients as `whatsapp:+<number>`.
pub fn whatsapp_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with("whatsapp:") {
        address.to_string()
    } else {
        format!("whatsapp:{address}")
    }
}

#[async_trait]
impl MessageGateway for TwilioGateway {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{API_BASE}/Accounts/{}.json", self.config.account_sid);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await
            .map_err(|e| RollcallError::Gateway(format!("Twilio verification failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RollcallError::Gateway(format!(
                "Twilio credential check failed {status}: {text}"
            )));
        }
        tracing::info!("Twilio: connected (sender={})", self.config.from);
        Ok(())
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        let to = whatsapp_address(to);
        let form = [
            ("From", self.config.from.as_str()),
            ("To", to.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| RollcallError::Gateway(format!("Twilio request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RollcallError::Gateway(format!(
                "Twilio API error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RollcallError::Gateway(format!("Invalid Twilio response: {e}")))?;

        let sid = result["sid"].as_str().unwrap_or("unknown").to_string();
        tracing::debug!("Twilio message queued: {} → {}", sid, to);
        Ok(sid)
    }
}
