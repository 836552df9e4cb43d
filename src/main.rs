use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use api_guard::auth::PermissionRegistry;
use api_guard::configuration::get_configuration;
use api_guard::email::EmailClient;
use api_guard::startup::run;
use api_guard::store::AppStores;
use api_guard::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "configuration error",
            ));
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("failed to create connection pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "database error")
        })?;

    tracing::info!("database connection pool created");

    let stores = AppStores::postgres(pool);
    let notifier = Arc::new(EmailClient::new(
        configuration.email.base_url.clone(),
        configuration.email.api_key.clone(),
        configuration.email.reset_link_base.clone(),
        reqwest::Client::new(),
    ));

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("server listening on {}", address);

    let server = run(
        listener,
        stores,
        notifier,
        PermissionRegistry::standard(),
        configuration.auth.clone(),
    )?;

    server.await
}
