//! WhatsApp Business Cloud API channel.
//!
//! Uses the official WhatsApp Business Platform (Cloud API) for messaging.
//! Requires: Access Token + Phone Number ID from Meta Business Suite.

use async_trait::async_trait;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::MessageGateway;
use serde::{Deserialize, Serialize};

const GRAPH_API: &str = "https://graph.facebook.com/v21.0";

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudApiConfig {
    /// Facebook Graph API access token
    pub access_token: String,
    /// WhatsApp Phone Number ID
    pub phone_number_id: String,
}

pub struct CloudApiGateway {
    config: CloudApiConfig,
    client: reqwest::Client,
}

impl CloudApiGateway {
    pub fn new(config: CloudApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// The Cloud API takes bare international digits: no `+`, no `whatsapp:` prefix.
pub fn cloud_recipient(address: &str) -> String {
    let address = address.trim();
    let address = address.strip_prefix("whatsapp:").unwrap_or(address);
    address.trim_start_matches('+').to_string()
}

#[async_trait]
impl MessageGateway for CloudApiGateway {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{GRAPH_API}/{}", self.config.phone_number_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.access_token))
            .send()
            .await
            .map_err(|e| RollcallError::Gateway(format!("WhatsApp verification failed: {e}")))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RollcallError::Gateway(format!(
                "WhatsApp token verification failed: {text}"
            )));
        }
        tracing::info!(
            "WhatsApp Business: connected (phone_id={})",
            self.config.phone_number_id
        );
        Ok(())
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        let url = format!("{GRAPH_API}/{}/messages", self.config.phone_number_id);
        let to = cloud_recipient(to);

        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": body
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.access_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| RollcallError::Gateway(format!("WhatsApp API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RollcallError::Gateway(format!(
                "WhatsApp API error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RollcallError::Gateway(format!("Invalid WhatsApp response: {e}")))?;

        let msg_id = result["messages"][0]["id"]
            .as_str()
            .unwrap_or("unknown")
            .to_string();

        tracing::debug!("WhatsApp message sent: {} → {}", msg_id, to);
        Ok(msg_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_recipient() {
        assert_eq!(cloud_recipient("+919800000000"), "919800000000");
        assert_eq!(cloud_recipient("whatsapp:+919800000000"), "919800000000");
        assert_eq!(cloud_recipient(" 919800000000 "), "919800000000");
    }
}
