use crate::auth::{password, RoleCode, TokenService};
use crate::config::AppConfig;
use crate::services::notifications::{LogNotifier, Notifier};
use anyhow::{Context, Result};
use billing_service::BillingService;
use database_layer::DatabasePool;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct YatraServer {
    /// Server configuration
    pub config: Arc<AppConfig>,
    /// Database connection pool
    pub db_pool: PgPool,
    /// Access token signer/verifier
    pub tokens: TokenService,
    /// Invoice and allocation rules
    pub billing: BillingService,
    /// Outbound customer notifications
    pub notifier: Arc<dyn Notifier>,
}

impl YatraServer {
    /// Connect to the database described by the configuration
    ///
    /// # Errors
    /// Fails when the pool cannot be created or migrations fail.
    pub async fn new(config: AppConfig, run_migrations: bool) -> Result<Self> {
        let db = DatabasePool::new(&config.database.url, &config.database.pool_settings())
            .await
            .context("Failed to connect to database")?;

        if run_migrations {
            db.run_migrations()
                .await
                .context("Failed to apply database migrations")?;
        }

        let server = Self::new_with_pool_and_config(db.pool().clone(), config);
        server.bootstrap_admin().await?;
        Ok(server)
    }

    /// Create a server around an existing pool with default configuration
    ///
    /// Useful for tests with lazily connected pools.
    #[must_use]
    pub fn new_with_pool(db_pool: PgPool) -> Self {
        Self::new_with_pool_and_config(db_pool, AppConfig::default())
    }

    #[must_use]
    pub fn new_with_pool_and_config(db_pool: PgPool, config: AppConfig) -> Self {
        if config.uses_development_secret() {
            warn!("Using the built-in development JWT secret; set YATRA__AUTH__JWT_SECRET");
        }

        let tokens = TokenService::from_config(&config.auth);
        let billing =
            BillingService::new().with_default_gst_rate(config.billing.default_gst_rate);
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new(
            config.notifications.email_enabled,
            config.notifications.from_email.clone(),
        ));

        Self {
            config: Arc::new(config),
            db_pool,
            tokens,
            billing,
            notifier,
        }
    }

    /// Replace the notifier (tests, alternative transports)
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Create the configured admin account if no active admin exists yet
    async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(email), Some(secret)) = (
            self.config.auth.bootstrap_admin_email.as_deref(),
            self.config.auth.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let has_admin: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role_code = 'ADM' AND is_active)",
        )
        .fetch_one(&self.db_pool)
        .await
        .context("Failed to check for an admin account")?;

        if has_admin {
            return Ok(());
        }

        let hash = password::hash_password(secret)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap admin password: {e}"))?;

        sqlx::query(
            r"
            INSERT INTO users (email, password_hash, full_name, user_type, role_code)
            VALUES ($1, $2, 'Administrator', $3, $4)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(email.to_lowercase())
        .bind(hash)
        .bind(RoleCode::Adm.user_type().as_str())
        .bind(RoleCode::Adm.as_str())
        .execute(&self.db_pool)
        .await
        .context("Failed to create bootstrap admin")?;

        info!(email = %email, "Bootstrap admin account created");
        Ok(())
    }
}
