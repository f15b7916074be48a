//! Application context and HTTP server lifecycle
//!
//! [`AppContext`] is built once at startup: it opens the store, resolves the
//! schema, and imports the file. After that it is immutable and shared by
//! every request handler. [`Server`] binds the listener, serves the query
//! router, and on shutdown gives in-flight requests a bounded grace period.

pub mod http;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::error::{CsvServeError, QueryError, Result};
use crate::query::{Filter, Record, ResultProjector};
use crate::schema::{Schema, SchemaResolver};
use crate::sqlite::{CsvImporter, SqliteStore};

pub use http::{create_query_router, ApiError, QueryApiState};

/// Everything a request needs, frozen after the import.
pub struct AppContext {
    store: Arc<SqliteStore>,
    schema: Arc<Schema>,
    projector: ResultProjector,
    rows_imported: u64,
}

impl AppContext {
    /// Open the store, resolve the schema, and load the configured file.
    ///
    /// Any failure here is fatal: a partially loaded store is never returned.
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        info!("*** Processing CSV file ***");

        let store = SqliteStore::open_in_memory(config.reader_connections)?;

        let resolver = SchemaResolver::new(&config.input);
        let mut reader = resolver.open()?;
        let resolved = resolver.resolve(&mut reader)?;
        resolved.install(&store)?;

        let rows_imported = CsvImporter::new(&store, &resolved.schema).import(&mut reader)?;

        Ok(Self {
            store: Arc::new(store),
            schema: Arc::new(resolved.schema),
            projector: ResultProjector::new(config.parse_numbers),
            rows_imported,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn rows_imported(&self) -> u64 {
        self.rows_imported
    }

    /// Translate, execute and project one filter. Blocks on store I/O.
    pub fn query(&self, filter: &Filter) -> std::result::Result<Vec<Record>, QueryError> {
        let query = filter.to_sql(&self.schema)?;
        debug!(sql = %query.sql, args = ?query.args, "Executing query");
        let result = self.store.query(&query.sql, &query.args)?;
        Ok(self.projector.project(&result))
    }
}

/// The query HTTP server.
pub struct Server {
    context: Arc<AppContext>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Load the file described by `config` and prepare to serve it.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let context = AppContext::load(config)?;
        Ok(Self::with_context(Arc::new(context), config.shutdown_timeout))
    }

    pub fn with_context(context: Arc<AppContext>, shutdown_timeout: Duration) -> Self {
        Self {
            context,
            shutdown_timeout,
        }
    }

    /// Bind `addr` and serve until Ctrl-C.
    pub async fn run(self, addr: std::net::SocketAddr) -> Result<()> {
        info!("*** Starting HTTP server ***");
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                CsvServeError::Server(format!(
                    "HTTP port {} is already in use. \
                     Fix: Use --http-addr to pick a different address, \
                     or stop the existing process.",
                    addr.port()
                ))
            } else {
                CsvServeError::server(&format!("bind HTTP server to {}", addr), e)
            }
        })?;

        self.serve(listener, async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Serve on `listener` until `shutdown` resolves, then drain.
    ///
    /// In-flight requests get `shutdown_timeout` to finish; after that the
    /// server task is aborted.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| CsvServeError::server("read listener address", e))?;
        info!(addr = %local_addr, rows = self.context.rows_imported(), "Serving query API");

        let app = create_query_router(self.context.clone());
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let mut server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            result = &mut server_task => {
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(CsvServeError::server("serve HTTP", e)),
                    Err(e) => Err(CsvServeError::server("HTTP server task", e)),
                };
            }
            _ = shutdown => {
                info!("*** Shutting down ***");
            }
        }

        info!(
            timeout_secs = self.shutdown_timeout.as_secs(),
            "Stopping HTTP server"
        );
        let _ = stop_tx.send(());
        match tokio::time::timeout(self.shutdown_timeout, &mut server_task).await {
            Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "HTTP server stopped with error"),
            Ok(Err(e)) => warn!(error = %e, "HTTP server task failed"),
            Err(_) => {
                warn!("Graceful shutdown timed out, forcing closure");
                server_task.abort();
            }
        }

        info!("Closing SQLite store");
        Ok(())
    }
}
