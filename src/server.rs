use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::{
    error::ErrorVerbosity,
    repository::{BookRepository, DatabaseConfig},
    route,
    state::ApiState,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{path}`")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file `{path}`")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    socket_address: SocketAddr,
    error_verbosity: ErrorVerbosity,
    #[serde(default)]
    trace_response_body: bool,
    database: DatabaseConfig,
}

impl ServerConfig {
    pub async fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Replaces the database url read from the config file.
    pub fn with_database_url(mut self, url: String) -> Self {
        self.database.url = url;
        self
    }
}

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let books = BookRepository::connect(&self.config.database)
            .await
            .context("Failed to connect to database")?;

        books.migrate().await.context("Migration failed")?;

        let state = ApiState::new(
            self.config.error_verbosity,
            self.config.trace_response_body,
            books.clone(),
        );

        let app = route::app(state);

        tracing::info!(addr = %self.config.socket_address, "Starting server");

        let listener = TcpListener::bind(&self.config.socket_address)
            .await
            .context("Bind failed")?;

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

        books.close().await;

        tracing::info!("Database connections closed");

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("CTRL+C received"),
            Err(err) => {
                tracing::error!(%err, "Failed to install CTRL+C signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;

                tracing::info!("SIGTERM received");
            }
            Err(err) => {
                tracing::error!(%err, "Failed to install SIGTERM signal handler");
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

    tracing::info!("Shutting down");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_defaults_are_applied() {
        let config: ServerConfig = serde_yaml::from_str(
            r#"
            socket_address: 0.0.0.0:8080
            error_verbosity: Message
            database:
              url: "sqlite::memory:"
            "#,
        )
        .expect("Config is parsable");

        assert_eq!(config.socket_address, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.error_verbosity, ErrorVerbosity::Message);
        assert!(!config.trace_response_body);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn database_url_can_be_overridden() {
        let config: ServerConfig = serde_yaml::from_str(
            r#"
            socket_address: 127.0.0.1:5000
            error_verbosity: Full
            trace_response_body: true
            database:
              url: sqlite://books.db
              max_connections: 2
            "#,
        )
        .expect("Config is parsable");

        let config = config.with_database_url("sqlite://other.db".to_string());

        assert_eq!(config.database.url, "sqlite://other.db");
        assert_eq!(config.database.max_connections, 2);
        assert!(config.trace_response_body);
    }
}
