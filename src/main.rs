//! Billing Reconciler server
//!
//! Loads configuration, connects the record store, plan catalog and
//! notification channels, then serves the webhook endpoint until a
//! shutdown signal arrives.

use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billing_reconciler::adapters::http::{app_router, WebhookAppState};
use billing_reconciler::adapters::identity::{HttpIdentityGroups, IdentityAdminConfig};
use billing_reconciler::adapters::memory::StaticPlanCatalog;
use billing_reconciler::adapters::notify::{RedisAlertPublisher, ResendEmailSender};
use billing_reconciler::adapters::postgres::{PostgresPlanCatalog, PostgresUserRecordStore};
use billing_reconciler::adapters::stripe::{StripeBillingAdapter, StripeConfig};
use billing_reconciler::application::handlers::billing::{
    AlertSubjects, NotificationSettings, Notifier, UserLocks,
};
use billing_reconciler::config::AppConfig;
use billing_reconciler::domain::billing::{ReconcilePolicy, StripeWebhookVerifier};
use billing_reconciler::ports::PlanCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting billing reconciler"
    );

    // Database
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        tracing::info!("Database migrations applied");
    }

    // Alert channel
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).context("invalid redis URL")?;
    let redis_conn = tokio::time::timeout(
        config.redis.timeout(),
        redis_client.get_multiplexed_tokio_connection(),
    )
    .await
    .context("timed out connecting to redis")?
    .context("failed to connect to redis")?;

    let plan_catalog: Arc<dyn PlanCatalog> = match &config.features.plan_catalog_file {
        Some(path) => {
            tracing::info!(path = %path, "Loading plan catalog from file");
            Arc::new(StaticPlanCatalog::from_yaml_file(path)?)
        }
        None => Arc::new(PostgresPlanCatalog::new(pool.clone())),
    };

    let billing_provider = StripeBillingAdapter::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_timeout(config.payment.request_timeout()),
    )?;
    if config.payment.is_test_mode() {
        tracing::warn!("Stripe API key is a test-mode key");
    }

    let identity_groups = HttpIdentityGroups::new(IdentityAdminConfig {
        base_url: config.identity.admin_base_url.clone(),
        api_token: SecretString::new(config.identity.admin_api_token.clone()),
        user_pool_id: config.identity.user_pool_id.clone(),
        timeout: config.identity.timeout(),
    })?;

    let email_sender = ResendEmailSender::new(
        SecretString::new(config.email.resend_api_key.clone()),
        config.email.from_header(),
        config.email.timeout(),
    )?;

    let notifier = Notifier::new(
        Arc::new(RedisAlertPublisher::new(
            redis_conn,
            config.notifications.alert_channel.clone(),
        )),
        Arc::new(email_sender),
        NotificationSettings {
            subjects: AlertSubjects {
                success: config.notifications.success_subject.clone(),
                subscription_deleted: config.notifications.subscription_deleted_subject.clone(),
                signature_error: config.notifications.signature_error_subject.clone(),
                exception: config.notifications.exception_subject.clone(),
            },
            dashboard_link: config.email.dashboard_link.clone(),
            confirmation_template: config.email.confirmation_template.clone(),
        },
    );

    let verifier = StripeWebhookVerifier::new(SecretString::new(
        config.payment.stripe_webhook_secret.clone(),
    ))
    .with_tolerance_secs(config.payment.webhook_tolerance_secs);

    let user_locks = if config.features.serialize_per_user {
        UserLocks::new()
    } else {
        UserLocks::disabled()
    };

    let state = WebhookAppState {
        user_store: Arc::new(PostgresUserRecordStore::new(pool.clone())),
        plan_catalog,
        billing_provider: Arc::new(billing_provider),
        identity_groups: Arc::new(identity_groups),
        notifier: Arc::new(notifier),
        verifier: Arc::new(verifier),
        policy: ReconcilePolicy {
            preserve_plan_on_healthy_update: config.features.preserve_plan_on_healthy_update,
        },
        user_locks: Arc::new(user_locks),
        processing_timeout: config.server.request_timeout(),
    };

    let app = app_router(state);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
