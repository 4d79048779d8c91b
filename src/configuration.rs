use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::{deserialize_bool_from_anything, deserialize_number_from_string};

use crate::domain::Flow;

/// Prefix marking a configuration value the operator never replaced with a
/// real one. Such values make the service answer 500 instead of relaying
/// submissions with broken credentials.
const PLACEHOLDER_PREFIX: &str = "REPLACE_WITH_";

pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mail: MailSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct MailSettings {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub refresh_token: Secret<String>,
    pub account_id: String,
    /// Provider data-center code, e.g. `com`, `in`, `eu`.
    pub region: String,
    /// Explicit endpoint overrides; tests point these at a mock server.
    #[serde(default)]
    pub accounts_base_url: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    pub contact: FlowRoutingSettings,
    #[serde(default)]
    pub event: EventRoutingSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct FlowRoutingSettings {
    pub from_address: String,
    pub to_address: String,
    #[serde(default)]
    pub cc_address: String,
    #[serde(default)]
    pub acknowledgement: AckSettings,
}

/// Event routing is optional in the configuration; unset fields fall back
/// to the contact flow's values.
#[derive(serde::Deserialize, Clone, Default)]
pub struct EventRoutingSettings {
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub cc_address: Option<String>,
    #[serde(default)]
    pub acknowledgement: Option<AckSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct AckSettings {
    #[serde(
        default = "default_ack_enabled",
        deserialize_with = "deserialize_bool_from_anything"
    )]
    pub enabled: bool,
    #[serde(default)]
    pub from_address: String,
    /// Subject template; event flows substitute `{{event_title}}`.
    #[serde(default)]
    pub subject: String,
}

impl Default for AckSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            from_address: String::new(),
            subject: String::new(),
        }
    }
}

fn default_ack_enabled() -> bool {
    true
}

#[derive(serde::Deserialize, Clone)]
pub struct RateLimitSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_seconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_requests: u64,
    /// Directory for the file-backed store. Defaults to a path under the
    /// system temp directory when unset.
    #[serde(default)]
    pub store_dir: Option<std::path::PathBuf>,
}

/// The addresses and acknowledgement settings a flow actually sends with,
/// after event-to-contact fallback has been applied.
pub struct EffectiveRouting {
    pub from_address: String,
    pub to_address: String,
    pub cc_address: String,
    pub acknowledgement: AckSettings,
}

impl MailSettings {
    pub fn accounts_base(&self) -> String {
        self.accounts_base_url
            .clone()
            .unwrap_or_else(|| format!("https://accounts.zoho.{}", self.region))
    }

    pub fn api_base(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| format!("https://mail.zoho.{}", self.region))
    }

    pub fn routing(&self, flow: Flow) -> EffectiveRouting {
        match flow {
            Flow::Contact => EffectiveRouting {
                from_address: self.contact.from_address.clone(),
                to_address: self.contact.to_address.clone(),
                cc_address: self.contact.cc_address.clone(),
                acknowledgement: self.contact.acknowledgement.clone(),
            },
            Flow::Event => EffectiveRouting {
                from_address: fall_back(&self.event.from_address, &self.contact.from_address),
                to_address: fall_back(&self.event.to_address, &self.contact.to_address),
                cc_address: fall_back(&self.event.cc_address, &self.contact.cc_address),
                acknowledgement: self
                    .event
                    .acknowledgement
                    .clone()
                    .unwrap_or_else(|| self.contact.acknowledgement.clone()),
            },
        }
    }

    /// Check that every value a flow needs to reach the provider is present
    /// and not a placeholder. The offending key is only named in the error
    /// chain, never in the caller-facing response.
    pub fn ensure_serviceable(&self, flow: Flow) -> Result<(), anyhow::Error> {
        required("mail.client_id", &self.client_id)?;
        required("mail.client_secret", self.client_secret.expose_secret())?;
        required("mail.refresh_token", self.refresh_token.expose_secret())?;
        required("mail.account_id", &self.account_id)?;
        required("mail.region", &self.region)?;
        let routing = self.routing(flow);
        required("from_address", &routing.from_address)?;
        required("to_address", &routing.to_address)?;
        Ok(())
    }
}

fn fall_back(specific: &Option<String>, general: &str) -> String {
    match specific.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => general.to_string(),
    }
}

fn required(key: &'static str, value: &str) -> Result<(), anyhow::Error> {
    let value = value.trim();
    if value.is_empty() || is_placeholder(value) {
        anyhow::bail!("required configuration value `{}` is missing or still a placeholder", key);
    }
    Ok(())
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let mut settings = config::Config::default();
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;

    // e.g. APP__MAIL__ACCOUNT_ID=... overrides mail.account_id
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    settings.try_into()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
