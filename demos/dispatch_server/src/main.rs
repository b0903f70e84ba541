//! Drone dispatch HTTP server
//!
//! Serves the fleet API over HTTP/1 and runs the battery audit and
//! auto-advance sweeps in the background.
//!
//! Usage: `dispatch_server [config.ron]` (default `config/dispatch.ron`).
//! Log verbosity follows `RUST_LOG`, defaulting to `info`.

use dispatch_server::{Api, ApiError, Reply, ServerConfig, TokioScheduler};
use dronefleet_db::Store;
use dronefleet_hub::{FleetHub, FleetSweep};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

async fn handle_request(
    api: Arc<Api<Store>>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return Ok(Reply::from_error(&ApiError::Body(e.to_string())).into_response()),
    };

    let method = parts.method.as_str().to_string();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_string);

    let reply = tokio::task::spawn_blocking(move || {
        api.handle(&method, &path, query.as_deref(), &body)
    })
    .await
    .unwrap_or_else(|e| {
        Reply::from_error(&ApiError::Internal(format!("handler task failed: {}", e)))
    });

    info!(
        method = %parts.method,
        path = %parts.uri.path(),
        status = reply.status.as_u16(),
        "request"
    );
    Ok(reply.into_response())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/dispatch.ron".to_string());
    info!(path = %config_path, "loading configuration");
    let config = ServerConfig::load_or_default(&config_path)?;

    let store = match &config.database {
        Some(path) => {
            info!(path = %path, "opening database");
            Store::open(path)?
        }
        None => {
            warn!("no database configured, using an in-memory store");
            Store::in_memory()?
        }
    };

    let hub = Arc::new(FleetHub::new(Arc::new(store), config.fleet.clone()));
    let sweep = Arc::new(FleetSweep::new(Arc::clone(&hub)));
    sweep.schedule(&TokioScheduler::current());
    info!(
        audit_secs = config.fleet.battery_audit_interval().as_secs(),
        advance_secs = config.fleet.auto_transition_interval().as_secs(),
        "fleet sweep scheduled"
    );

    let api = Arc::new(Api::new(hub));
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept error");
                continue;
            }
        };

        let api = Arc::clone(&api);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle_request(Arc::clone(&api), req));

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!(remote = %remote_addr, error = %e, "connection error");
            }
        });
    }
}
