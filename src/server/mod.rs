//! The sentry gRPC server and its lifecycle.
//!
//! [`start`] binds the listener, serves the [`SentryService`] and returns once
//! the cancellation token fires and in-flight requests have drained.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use sentry_ca::ca::Signer;
//! use sentry_ca::validator::{InsecureValidator, ValidatorKind};
//! use sentry_ca::ServerBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(ca: Arc<dyn Signer>) -> Result<(), Box<dyn std::error::Error>> {
//! let options = ServerBuilder::new()
//!     .with_validator(ValidatorKind::Insecure, Arc::new(InsecureValidator))
//!     .default_validator(ValidatorKind::Insecure)
//!     .ca(ca)
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let shutdown = cancel.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     shutdown.cancel();
//! });
//!
//! sentry_ca::server::start(cancel, options).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::ServerError;
use crate::prelude::{error, info, warn};
use crate::proto::ca_server::CaServer;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

pub mod builder;
pub mod service;

pub use builder::{ServerBuilder, ServerOptions};
pub use service::SentryService;

/// Binds the listener described by `options` and serves until `cancel` fires.
///
/// # Errors
///
/// - [`ServerError::Bind`] if the listener cannot be bound. Nothing is retried.
/// - [`ServerError::Serve`] if the serve loop fails.
/// - [`ServerError::ShutdownTimeout`] if draining exceeds the configured bound.
pub async fn start(cancel: CancellationToken, options: ServerOptions) -> Result<(), ServerError> {
    Server::bind(options).await?.serve(cancel).await
}

/// A bound, not yet serving sentry server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: SentryService,
    request_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
}

impl Server {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(options: ServerOptions) -> Result<Self, ServerError> {
        let addr = options.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            local_addr,
            service: SentryService::from_options(&options),
            request_timeout: options.request_timeout,
            shutdown_timeout: options.shutdown_timeout,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until `cancel` fires, then stops accepting connections
    /// and waits for in-flight requests to finish.
    ///
    /// Whichever comes first, a serve-loop failure or the end of the drain,
    /// determines the result.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Serve`] if the serve loop fails.
    /// - [`ServerError::ShutdownTimeout`] if draining exceeds the configured bound.
    /// - [`ServerError::Join`] if the serve task panics.
    pub async fn serve(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let mut transport = tonic::transport::Server::builder();
        if let Some(timeout) = self.request_timeout {
            transport = transport.timeout(timeout);
        }
        let router = transport.add_service(CaServer::new(self.service));
        let incoming = TcpListenerStream::new(self.listener);

        info!("Running gRPC server on {}", self.local_addr);

        let signal = cancel.clone();
        let mut serving = tokio::spawn(async move {
            router
                .serve_with_incoming_shutdown(incoming, async move { signal.cancelled().await })
                .await
        });

        tokio::select! {
            res = &mut serving => {
                let res = res?;
                if let Err(e) = &res {
                    error!("gRPC server stopped unexpectedly: {}", e);
                }
                return res.map_err(ServerError::from);
            }
            () = cancel.cancelled() => {}
        }

        info!("Shutting down gRPC server");

        let res = match self.shutdown_timeout {
            None => serving.await,
            Some(timeout) => match tokio::time::timeout(timeout, &mut serving).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(
                        "In-flight requests did not drain within {}ms; aborting",
                        timeout.as_millis()
                    );
                    serving.abort();
                    return Err(ServerError::ShutdownTimeout);
                }
            },
        };

        res??;
        Ok(())
    }
}
