//! Server implementation

use crate::config::ServerConfig;
use crate::http_server::{self, AppState};
use harvest_core::{Error, Result};
use harvest_protocol::CodecRegistry;
use harvest_query::{CatalogSource, Dataset, Evaluator, MemoryEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct HttpHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Harvest evaluator server
pub struct Server {
    /// Server configuration
    config: ServerConfig,

    /// Shared request state
    state: AppState,

    /// Running state
    running: AtomicBool,

    /// HTTP listener task
    http: Mutex<Option<HttpHandle>>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let dataset = match &config.data_file {
            Some(path) => Dataset::from_path(path)?,
            None => {
                info!("No data file configured, using the sample dataset");
                Dataset::sample()
            }
        };

        let engine = Arc::new(MemoryEngine::new(dataset));
        let catalog = engine.catalog();
        let evaluator = Evaluator::new(engine).with_max_depth(config.max_depth);

        Ok(Self {
            config,
            state: AppState::new(evaluator, catalog, CodecRegistry::default()),
            running: AtomicBool::new(false),
            http: Mutex::new(None),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared request state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the HTTP listener is bound to, once started
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.http.lock().await.as_ref().map(|http| http.addr)
    }

    /// Start the server
    pub async fn start(&self) -> Result<()> {
        let mut http = self.http.lock().await;
        if self.is_running() {
            return Err(Error::Configuration("Server already running".to_string()));
        }

        info!("Starting Harvest evaluator...");
        info!(
            "Maximum expression depth: {}, body limit: {} bytes",
            self.config.max_depth, self.config.body_limit_bytes
        );

        let router = http_server::create_router(self.state.clone(), self.config.body_limit_bytes);
        let listener = tokio::net::TcpListener::bind(self.config.addr()).await?;
        let addr = listener.local_addr()?;

        info!("HTTP server listening on {}", addr);

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;
            if let Err(e) = result {
                warn!("HTTP server error: {}", e);
            }
        });

        *http = Some(HttpHandle {
            addr,
            shutdown,
            task,
        });
        self.running.store(true, Ordering::SeqCst);

        info!("Harvest evaluator started successfully");
        Ok(())
    }

    /// Stop the server, waiting for in-flight requests to finish
    pub async fn stop(&self) -> Result<()> {
        let mut http = self.http.lock().await;
        let Some(handle) = http.take() else {
            return Err(Error::Configuration("Server not running".to_string()));
        };

        info!("Stopping Harvest evaluator...");

        let _ = handle.shutdown.send(());
        if let Err(e) = handle.task.await {
            warn!("HTTP server task ended abnormally: {}", e);
        }

        self.running.store(false, Ordering::SeqCst);

        info!("Harvest evaluator stopped");
        Ok(())
    }

    /// Get server version
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
