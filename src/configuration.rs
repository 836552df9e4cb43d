use config::ConfigError;
use uuid::Uuid;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    pub email: EmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// Process-wide signing secret. Optional in the file: when absent one is
    /// generated at startup and logged once, which invalidates tokens from
    /// previous runs. Set it explicitly in any real deployment.
    pub secret: Option<String>,
    /// Session token lifetime in seconds (e.g. 3600 for one hour)
    pub session_ttl_seconds: i64,
}

impl AuthSettings {
    /// Resolve the signing secret, generating a random one if not configured.
    ///
    /// The generated value is logged exactly once so operators can recover
    /// it; rotation invalidates all previously issued tokens by design.
    pub fn resolve_secret(&self) -> String {
        match &self.secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => {
                let generated = Uuid::new_v4().to_string();
                tracing::warn!(
                    secret = %generated,
                    "no signing secret configured; generated one for this process"
                );
                generated
            }
        }
    }
}

/// Outbound mail relay settings
#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    pub base_url: String,
    pub api_key: String,
    /// Base URL embedded in reset links sent to users
    pub reset_link_base: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
