//! # Rollcall Channels
//! WhatsApp messaging gateways and the `Notifier` that isolates their failures.

pub mod dry_run;
pub mod notifier;
pub mod twilio;
pub mod whatsapp;

pub use notifier::{DeliveryRecord, DeliveryStats, Notifier, SendOutcome};

use rollcall_core::config::GatewayConfig;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::MessageGateway;

/// Create the configured messaging gateway.
pub fn create_gateway(config: &GatewayConfig) -> Result<Box<dyn MessageGateway>> {
    match config.provider.as_str() {
        "twilio" => Ok(Box::new(twilio::TwilioGateway::new(twilio::TwilioConfig {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
        }))),
        "cloud_api" => Ok(Box::new(whatsapp::CloudApiGateway::new(
            whatsapp::CloudApiConfig {
                access_token: config.access_token.clone(),
                phone_number_id: config.phone_number_id.clone(),
            },
        ))),
        "log" => Ok(Box::new(dry_run::LogGateway)),
        other => Err(RollcallError::Config(format!(
            "unknown gateway provider '{other}'"
        ))),
    }
}
