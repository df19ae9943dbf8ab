use newsletter_admin::configuration::{Settings, PORT_ENV_VAR};
use newsletter_admin::startup::Application;
use newsletter_admin::telemetry::config_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::get_configuration()?;

    config_tracing(&settings.application);

    if std::env::var(PORT_ENV_VAR).map_or(true, |port| port.trim().is_empty()) {
        tracing::info!(
            "No global port has been defined, using default {}",
            settings.application.port
        );
    }

    let application = match Application::build(settings).await {
        Ok(application) => application,
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to start the server"
            );
            return Err(e);
        }
    };
    application.run_until_stopped().await?;
    Ok(())
}
