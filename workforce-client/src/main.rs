use client_core::observability::init_tracing;
use tracing::info;
use workforce_client::build_auth_provider;
use workforce_client::config::get_configuration;

/// Restore (or establish) a session against the configured backend and
/// report who is signed in. `sign-out` as the first argument clears it.
///
/// Credentials for a fresh sign-in come from `WORKFORCE_EMAIL` and
/// `WORKFORCE_PASSWORD`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "workforce-client",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    let provider = build_auth_provider(&configuration)?;

    if let Some(refresh) = provider.initialize().await {
        refresh.await?;
    }

    if std::env::args().nth(1).as_deref() == Some("sign-out") {
        provider.sign_out().await;
        return Ok(());
    }

    if !provider.is_authenticated() {
        match (
            std::env::var("WORKFORCE_EMAIL"),
            std::env::var("WORKFORCE_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => {
                provider.sign_in(&email, &password).await.map_err(|e| {
                    tracing::error!("Sign-in failed: {}", e.user_message());
                    anyhow::anyhow!("Sign-in failed: {}", e.user_message())
                })?;
            }
            _ => {
                info!("No session; set WORKFORCE_EMAIL and WORKFORCE_PASSWORD to sign in");
                return Ok(());
            }
        }
    }

    let snapshot = provider.snapshot();
    if let Some(user) = snapshot.user() {
        info!(
            user_id = %user.id,
            name = %user.display_name(),
            initials = %user.initials(),
            role = user.role.as_deref().unwrap_or("-"),
            permissions = ?snapshot.permissions().unwrap_or_default(),
            elevated = provider.is_elevated(),
            privileged_roles = ?provider.policy().roles,
            "Signed in"
        );
    }

    Ok(())
}
