//! Site registry
//!
//! The site collects (model, handler, prefix) registrations and turns them into
//! one URL configuration: a route group per registration, mounted at
//! `{app_label}/{model_name}/` or `{app_label}/{model_name}/{prefix}/`.

use crate::config::SiteConfig;
use crate::core::{ConfigError, DataSource, Model, ModelMeta, SourceRegistry, StarkError};
use crate::handler::{AdminHandler, HandlerConfig, StarkHandler};
use crate::server::urls::{RouteGroup, SiteUrls};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// One registration
struct Registration {
    model: &'static ModelMeta,
    prefix: Option<String>,
    handler: Arc<dyn AdminHandler>,
}

/// Registry of model admins
///
/// # Example
///
/// ```ignore
/// let mut site = StarkSite::new();
/// site.register::<Host>(InMemorySource::new())?;
/// site.register_handler(
///     StarkHandler::new(hosts, HandlerConfig::new().list_display(["name", "ip"])),
///     Some("private"),
/// )?;
/// site.serve("127.0.0.1:8000").await?;
/// ```
pub struct StarkSite {
    config: SiteConfig,
    registry: Vec<Registration>,
    sources: SourceRegistry,
}

impl Default for StarkSite {
    fn default() -> Self {
        Self::new()
    }
}

impl StarkSite {
    pub fn new() -> Self {
        Self::with_config(SiteConfig::default())
    }

    pub fn with_config(config: SiteConfig) -> Self {
        Self {
            config,
            registry: Vec::new(),
            sources: SourceRegistry::new(),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Register a model with the default handler configuration
    pub fn register<M: Model>(
        &mut self,
        source: impl DataSource<M> + 'static,
    ) -> Result<&mut Self, StarkError> {
        self.register_handler(StarkHandler::new(source, HandlerConfig::new()), None)
    }

    /// Register a configured handler under an optional URL prefix
    ///
    /// The same model may be registered several times as long as each
    /// registration uses a different prefix.
    pub fn register_handler<M: Model>(
        &mut self,
        mut handler: StarkHandler<M>,
        prefix: Option<&str>,
    ) -> Result<&mut Self, StarkError> {
        let meta = M::meta();
        let prefix = prefix.map(str::to_string);
        if self
            .registry
            .iter()
            .any(|r| r.model.key() == meta.key() && r.prefix == prefix)
        {
            return Err(ConfigError::DuplicateRegistration {
                model: meta.key(),
                prefix,
            }
            .into());
        }

        if self.sources.get(&meta.key()).is_none() {
            self.sources.insert::<M>(handler.source().clone());
        }
        handler.bind(prefix.clone(), &self.config);

        tracing::info!(
            model = %meta.key(),
            prefix = prefix.as_deref().unwrap_or(""),
            "registered admin handler"
        );
        self.registry.push(Registration {
            model: meta,
            prefix,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Make a model available to relation facets without serving its views
    pub fn add_source<M: Model>(&mut self, source: impl DataSource<M> + 'static) -> &mut Self {
        let source: Arc<dyn DataSource<M>> = Arc::new(source);
        self.sources.insert::<M>(source);
        self
    }

    /// One route group per registration, in registration order
    pub fn get_urls(&self) -> Vec<RouteGroup> {
        self.registry
            .iter()
            .map(|registration| {
                let meta = registration.model;
                let prefix = match &registration.prefix {
                    Some(prefix) => format!("{}/{}/{}/", meta.app_label, meta.model_name, prefix),
                    None => format!("{}/{}/", meta.app_label, meta.model_name),
                };
                RouteGroup::new(prefix, registration.handler.clone().get_urls())
            })
            .collect()
    }

    /// Compiled URL configuration of every registration
    pub fn urls(&self) -> Result<Arc<SiteUrls>, StarkError> {
        Ok(Arc::new(SiteUrls::new(
            &self.config,
            self.get_urls(),
            self.sources.clone(),
        )?))
    }

    /// Axum router serving the admin
    pub fn router(&self) -> Result<Router, StarkError> {
        Ok(self.urls()?.router())
    }

    /// Serve the admin with graceful shutdown
    ///
    /// Binds to the provided address and handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(&self, addr: &str) -> Result<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Admin listening on {}{}", addr, self.config.mount_path);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
