//! Rollcall configuration system.
//!
//! Values come from an optional TOML file, then environment variables on top.
//! Credentials are normally supplied only through the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RollcallError};
use crate::types::SubjectSource;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollcallConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Subject tables, in the order their marks are reported.
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
}

fn default_subjects() -> Vec<String> {
    [
        "advance_engineering_mathematics_i",
        "data_structures_and_algorithms",
        "data_structures_and_algorithms_lab",
        "digital_electronics",
        "digital_electronics_lab",
        "object_oriented_programming",
        "object_oriented_programming_lab",
        "software_engineering",
        "software_engineering_lab",
        "technical_communication",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RollcallConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            subjects: default_subjects(),
        }
    }
}

impl RollcallConfig {
    /// Load from `path` if given, else from `rollcall.toml` in the working
    /// directory if it exists, else defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => {
                let fallback = Self::default_path();
                if fallback.exists() {
                    Self::load_from(&fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RollcallError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RollcallError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("rollcall.toml")
    }

    /// Overlay environment variables. `lookup` is injected so tests need not
    /// touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SUPABASE_URL") {
            self.store.url = v;
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.store.key = v;
        }
        if let Some(v) = get("TWILIO_ACCOUNT_SID") {
            self.gateway.account_sid = v;
        }
        if let Some(v) = get("TWILIO_AUTH_TOKEN") {
            self.gateway.auth_token = v;
        }
        if let Some(v) = get("TWILIO_WHATSAPP_NUMBER") {
            self.gateway.from = v;
        }
        if let Some(v) = get("WHATSAPP_ACCESS_TOKEN") {
            self.gateway.access_token = v;
        }
        if let Some(v) = get("WHATSAPP_PHONE_NUMBER_ID") {
            self.gateway.phone_number_id = v;
        }
        if let Some(v) = get("ROLLCALL_GATEWAY") {
            self.gateway.provider = v;
        }
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(v) = get("ROLLCALL_UTC_OFFSET") {
            self.scheduler.utc_offset = Some(v);
        }
    }

    /// Check that everything required at startup is present.
    pub fn validate(&self) -> Result<()> {
        self.validate_store()?;
        self.validate_without_store()
    }

    /// Startup checks for a run whose records do not come from Supabase
    /// (`--fixtures`): gateway credentials and the subject list.
    pub fn validate_without_store(&self) -> Result<()> {
        self.validate_gateway()?;
        if self.subjects.is_empty() {
            return Err(RollcallError::Config("no subject tables configured".into()));
        }
        Ok(())
    }

    fn validate_store(&self) -> Result<()> {
        require(&self.store.url, "SUPABASE_URL")?;
        require(&self.store.key, "SUPABASE_KEY")
    }

    fn validate_gateway(&self) -> Result<()> {
        match self.gateway.provider.as_str() {
            "twilio" => {
                require(&self.gateway.account_sid, "TWILIO_ACCOUNT_SID")?;
                require(&self.gateway.auth_token, "TWILIO_AUTH_TOKEN")?;
                require(&self.gateway.from, "TWILIO_WHATSAPP_NUMBER")
            }
            "cloud_api" => {
                require(&self.gateway.access_token, "WHATSAPP_ACCESS_TOKEN")?;
                require(&self.gateway.phone_number_id, "WHATSAPP_PHONE_NUMBER_ID")
            }
            "log" => Ok(()),
            other => Err(RollcallError::Config(format!(
                "unknown gateway provider '{other}' (expected twilio, cloud_api or log)"
            ))),
        }
    }

    /// Configured subject sources with their lab/theory tags.
    pub fn subject_sources(&self) -> Vec<SubjectSource> {
        self.subjects.iter().map(|k| SubjectSource::new(k)).collect()
    }
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(RollcallError::Config(format!("{name} is not set")))
    } else {
        Ok(())
    }
}

/// Record store (Supabase) connection and identity-table layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_identity_table")]
    pub identity_table: String,
    #[serde(default = "default_roll_column")]
    pub roll_column: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_address_column")]
    pub address_column: String,
}

fn default_identity_table() -> String { "studentsrecord".into() }
fn default_roll_column() -> String { "Roll_No".into() }
fn default_name_column() -> String { "Name".into() }
fn default_address_column() -> String { "whatsapp_no".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            identity_table: default_identity_table(),
            roll_column: default_roll_column(),
            name_column: default_name_column(),
            address_column: default_address_column(),
        }
    }
}

/// Messaging gateway selection and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `twilio`, `cloud_api` or `log`.
    #[serde(default = "default_gateway_provider")]
    pub provider: String,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Twilio sender, e.g. `whatsapp:+14155238886`.
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub phone_number_id: String,
}

fn default_gateway_provider() -> String { "twilio".into() }
fn default_from() -> String { "whatsapp:+14155238886".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_gateway_provider(),
            account_sid: String::new(),
            auth_token: String::new(),
            from: default_from(),
            access_token: String::new(),
            phone_number_id: String::new(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 10000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Daily broadcast schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_morning_at")]
    pub morning_at: String,
    #[serde(default = "default_evening_at")]
    pub evening_at: String,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    /// Pause after each send, for gateway rate limits.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Fixed UTC offset such as `+05:30`. Unset means server local time.
    #[serde(default)]
    pub utc_offset: Option<String>,
}

fn default_morning_at() -> String { "07:00".into() }
fn default_evening_at() -> String { "16:00".into() }
fn default_poll_secs() -> u64 { 60 }
fn default_pacing_ms() -> u64 { 1000 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            morning_at: default_morning_at(),
            evening_at: default_evening_at(),
            poll_secs: default_poll_secs(),
            pacing_ms: default_pacing_ms(),
            utc_offset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RollcallConfig::default();
        assert_eq!(config.subjects.len(), 10);
        assert_eq!(config.store.identity_table, "studentsrecord");
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.scheduler.morning_at, "07:00");
        assert_eq!(config.scheduler.evening_at, "16:00");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            subjects = ["physics", "physics_lab"]

            [store]
            url = "https://example.supabase.co"
            key = "anon"

            [scheduler]
            morning_at = "06:30"
            utc_offset = "+05:30"
        "#;
        let config = RollcallConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.subjects, vec!["physics", "physics_lab"]);
        assert_eq!(config.store.url, "https://example.supabase.co");
        assert_eq!(config.store.roll_column, "Roll_No");
        assert_eq!(config.scheduler.morning_at, "06:30");
        assert_eq!(config.scheduler.evening_at, "16:00");
        assert_eq!(config.scheduler.utc_offset.as_deref(), Some("+05:30"));
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config = RollcallConfig::from_toml("").unwrap();
        assert_eq!(config.gateway.provider, "twilio");
        assert_eq!(config.gateway.from, "whatsapp:+14155238886");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SUPABASE_URL", "https://db.example"),
            ("SUPABASE_KEY", "secret"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("PORT", "8080"),
            ("ROLLCALL_UTC_OFFSET", ""),
        ]
        .into_iter()
        .collect();
        let mut config = RollcallConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.url, "https://db.example");
        assert_eq!(config.server.port, 8080);
        assert!(config.scheduler.utc_offset.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let config = RollcallConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL"));

        let mut config = RollcallConfig::default();
        config.store.url = "https://db.example".into();
        config.store.key = "k".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TWILIO_ACCOUNT_SID"));

        config.gateway.provider = "log".into();
        assert!(config.validate().is_ok());

        config.gateway.provider = "carrier_pigeon".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_subject_list_is_rejected() {
        let toml_str = r#"
            subjects = []

            [store]
            url = "https://db.example"
            key = "k"

            [gateway]
            provider = "log"
        "#;
        let config = RollcallConfig::from_toml(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no subject tables"));
        assert!(config.validate_without_store().is_err());
    }

    #[test]
    fn test_validate_without_store_skips_credentials() {
        let mut config = RollcallConfig::default();
        config.gateway.provider = "log".into();
        assert!(config.validate().is_err());
        assert!(config.validate_without_store().is_ok());

        config.gateway.provider = "twilio".into();
        assert!(config.validate_without_store().is_err());
    }

    #[test]
    fn test_subject_sources_keep_order() {
        let config = RollcallConfig::default();
        let sources = config.subject_sources();
        assert_eq!(sources[0].key, "advance_engineering_mathematics_i");
        assert_eq!(sources[2].kind, crate::types::SubjectKind::Lab);
    }
}
