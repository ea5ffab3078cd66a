//! HTTP(S) listener: accepts connections and turns router results into
//! responses.
//!
//! Every connection runs on its own task. The router is shared through an
//! `Arc` and holds no mutable state, so requests never contend.

use std::borrow::Cow;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RouteError;
use crate::resolver::Resolve;
use crate::router::{RedirectTarget, Router};
use crate::SrvError;

/// How long in-flight connections may run after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Pause after a failed `accept` so persistent errors (EMFILE) do not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound listener ready to serve redirects.
pub struct Server<R> {
    listener: TcpListener,
    router: Arc<Router<R>>,
    tls: Option<TlsAcceptor>,
}

impl<R: Resolve + 'static> Server<R> {
    /// Bind `addr`. TLS is terminated here when an acceptor is given.
    pub async fn bind(
        addr: SocketAddr,
        router: Router<R>,
        tls: Option<TlsAcceptor>,
    ) -> crate::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SrvError::Server(format!("TCP bind {addr}: {e}")))?;

        Ok(Self {
            listener,
            router: Arc::new(router),
            tls,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> crate::Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes. Open connections are then asked to
    /// close once their in-flight request is answered, within a short grace
    /// period.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> crate::Result<()> {
        let addr = self.local_addr()?;
        info!(
            addr = %addr,
            tls = self.tls.is_some(),
            mappings = self.router.mappings().len(),
            "ip4p redirector listening"
        );

        let mut connections = JoinSet::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    break;
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            accept_failed(&e).await;
                            continue;
                        }
                    };
                    let router = Arc::clone(&self.router);
                    let tls = self.tls.clone();
                    let stop = stop_rx.clone();
                    connections.spawn(handle_connection(stream, peer, router, tls, stop));
                }
            }
        }

        // Idle keep-alive connections close right away; busy ones finish
        // their current response first.
        let _ = stop_tx.send(true);
        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!(
                open = connections.len(),
                "grace period elapsed, dropping open connections"
            );
        }

        Ok(())
    }
}

/// Build resolver-independent pieces from config and bind the listener.
///
/// Loads TLS material before binding so a bad certificate never leaves a
/// half-started server behind.
pub async fn bind_from_config<R: Resolve + 'static>(
    config: &Config,
    resolver: R,
) -> crate::Result<Server<R>> {
    let tls = config
        .server
        .tls()
        .map(|files| crate::tls::acceptor(&files))
        .transpose()?;

    let router = Router::new(config.mapping_table(), resolver);
    Server::bind(config.server.listen(), router, tls).await
}

async fn accept_failed(error: &std::io::Error) {
    warn!(error = %error, "accept failed, backing off");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler, serving until killed");
        std::future::pending::<()>().await;
    }
}

async fn handle_connection<R: Resolve + 'static>(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router<R>>,
    tls: Option<TlsAcceptor>,
    stop: watch::Receiver<bool>,
) {
    match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(stream) => serve_http(stream, peer, router, stop).await,
            Err(e) => debug!(peer = %peer, error = %e, "TLS handshake failed"),
        },
        None => serve_http(stream, peer, router, stop).await,
    }
}

async fn serve_http<S, R>(
    stream: S,
    peer: SocketAddr,
    router: Arc<Router<R>>,
    mut stop: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    R: Resolve + 'static,
{
    let service = service_fn(move |request: Request<hyper::body::Incoming>| {
        let router = Arc::clone(&router);
        async move {
            let path = request.uri().path();
            let response = respond(&router, path).await;
            debug!(
                peer = %peer,
                method = %request.method(),
                path,
                status = response.status().as_u16(),
                "request handled"
            );
            Ok::<_, Infallible>(response)
        }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = stopped(&mut stop) => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!(peer = %peer, error = %e, "connection error");
    }
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    // A dropped sender also means the server is going away.
    let _ = stop.wait_for(|stop| *stop).await;
}

/// Identifier carried by a request path: everything after the leading `/`,
/// percent-decoded.
///
/// Fails with [`RouteError::InvalidIdentifier`] when the decoded bytes are not
/// UTF-8. Malformed escapes such as `%zz` are kept as literal text.
pub fn identifier_from_path(path: &str) -> Result<Cow<'_, str>, RouteError> {
    percent_decode_str(path.strip_prefix('/').unwrap_or(path))
        .decode_utf8()
        .map_err(|_| RouteError::InvalidIdentifier)
}

/// Route a request path and build the HTTP response. Method-agnostic.
pub async fn respond<R: Resolve>(router: &Router<R>, path: &str) -> Response<Full<Bytes>> {
    let routed = match identifier_from_path(path) {
        Ok(identifier) => router.route(&identifier).await,
        Err(e) => {
            debug!(path, "request path is not valid UTF-8");
            Err(e)
        }
    };

    match routed {
        Ok(target) => redirect(&target),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            plain_text(status, e.public_message())
        }
    }
}

fn redirect(target: &RedirectTarget) -> Response<Full<Bytes>> {
    match HeaderValue::from_str(target.location()) {
        Ok(location) => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(e) => {
            warn!(location = target.location(), error = %e, "redirect target is not a valid header");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, "invalid redirect target")
        }
    }
}

fn plain_text(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("{message}\n"))));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
