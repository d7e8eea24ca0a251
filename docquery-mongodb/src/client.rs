//! Process-wide MongoDB client handle.

use mongodb::Client;
use tokio::sync::OnceCell;
use tracing::{error, info};

use docquery_core::error::{DocQueryError, DocQueryResult};

use crate::config::MongoConfig;

/// Connects a new client with the settings in `config`.
///
/// # Errors
///
/// Returns [`DocQueryError::Initialization`] if the connection string is invalid or the client
/// cannot be created.
pub async fn connect(config: &MongoConfig) -> DocQueryResult<Client> {
    let options = config.client_options().await?;

    let client = Client::with_options(options).map_err(|e| {
        error!(error = %e, "failed to connect to MongoDB");
        DocQueryError::Initialization(e.to_string())
    })?;

    info!(database = %config.database, "connected to MongoDB");

    Ok(client)
}

/// A client created at most once and shared by every caller afterwards.
///
/// The first successful [`SharedClient::get_or_connect`] call decides the settings; later calls
/// return the same client regardless of the configuration they pass. A failed connection attempt
/// leaves the cell empty so a later call can retry.
///
/// ```ignore
/// static CLIENT: LazyLock<SharedClient> = LazyLock::new(SharedClient::new);
///
/// let client = CLIENT.get_or_connect(&config).await?;
/// ```
#[derive(Debug, Default)]
pub struct SharedClient {
    cell: OnceCell<Client>,
}

impl SharedClient {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the shared client, connecting it on first use.
    pub async fn get_or_connect(&self, config: &MongoConfig) -> DocQueryResult<Client> {
        self.cell
            .get_or_try_init(|| connect(config))
            .await
            .cloned()
    }

    /// Returns the client if it has been connected.
    pub fn get(&self) -> Option<&Client> {
        self.cell.get()
    }
}
