use deadpool_postgres::Pool;
use crate::config::Config;
use crate::error::Result;
use crate::token::authority::TokenAuthority;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The token authority, holding the injected signing secret.
    pub tokens: TokenAuthority,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized");

        let tokens = TokenAuthority::new(&config.jwt_secret);
        tracing::info!("Token authority initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            tokens,
        })
    }
}
