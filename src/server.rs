//! The HTTP listener: fixed CORS headers, routing and JSON responses.

use crate::{
    collections::Collections,
    config::{Config, Database, UnmatchedRoute},
    document::Item,
    error::{Error, InternalError, Result},
    file_store::FileStore,
    json_store::JsonStore,
    memory_store::MemoryStore,
    router::{Route, Router},
};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, info};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;

pub type SharedCollections = Arc<Collections<Box<dyn JsonStore>>>;

#[derive(Clone)]
pub struct AppState {
    collections: SharedCollections,
    router: Arc<Router>,
    unmatched: UnmatchedRoute,
}

impl AppState {
    pub fn new(store: Box<dyn JsonStore>, router: Router, unmatched: UnmatchedRoute) -> Self {
        AppState {
            collections: Arc::new(Collections::new(store)),
            router: Arc::new(router),
            unmatched,
        }
    }

    pub fn from_config(cfg: &Config) -> std::result::Result<Self, InternalError> {
        let store = open_store(cfg)?;
        let router = Router::new(cfg.uri_prefix.clone(), cfg.route_match);
        Ok(AppState::new(store, router, cfg.unmatched))
    }
}

/// Opens the store selected by `DB_FILE`.
pub fn open_store(cfg: &Config) -> std::result::Result<Box<dyn JsonStore>, InternalError> {
    Ok(match &cfg.database {
        Database::File(path) => Box::new(FileStore::open_with_cfg(path, cfg.store)?),
        Database::Memory => Box::new(MemoryStore::default()),
    })
}

/// Builds the service. Every request, whatever its path, goes through
/// [`dispatch`].
pub fn app(state: AppState) -> axum::Router {
    axum::Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
}

/// The body is only buffered for appends, after routing, and without a size
/// limit.
async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let route = state.router.route(&method, &path);
    debug!("{method} {path} -> {route:?}");
    let collections = &state.collections;
    let res = match route {
        Route::Preflight => StatusCode::OK.into_response(),
        Route::Unmatched => unmatched(state.unmatched),
        Route::List(name) => respond(blocking(collections, move |c| c.list(&name)).await),
        Route::Append(name) => respond(append(collections, name, req.into_body()).await),
        Route::Remove(name, id) => respond(
            blocking(collections, move |c| c.remove_by_id(&name, id.as_deref())).await,
        ),
    };
    debug!("{method} {path} <- {}", res.status());
    res
}

fn respond(res: Result<Vec<Value>>) -> Response {
    match res {
        Ok(items) => Json(items).into_response(),
        Err(err) => err.into_response(),
    }
}

fn unmatched(policy: UnmatchedRoute) -> Response {
    match policy {
        UnmatchedRoute::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Not Found" })),
        )
            .into_response(),
        UnmatchedRoute::Null => Json(Value::Null).into_response(),
    }
}

async fn append(collections: &SharedCollections, name: String, body: Body) -> Result<Vec<Value>> {
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(InternalError::Body)?;
    let item: Item = serde_json::from_slice(&bytes)?;
    blocking(collections, move |c| c.append(&name, item)).await
}

/// Runs a store operation on the blocking pool.
async fn blocking<F>(collections: &SharedCollections, op: F) -> Result<Vec<Value>>
where
    F: FnOnce(&Collections<Box<dyn JsonStore>>) -> Result<Vec<Value>> + Send + 'static,
{
    let c = Arc::clone(collections);
    match tokio::task::spawn_blocking(move || op(&c)).await {
        Ok(res) => res,
        Err(err) => Err(Error::Internal(InternalError::Join(err.to_string()))),
    }
}

/// Binds the listener and serves until Ctrl-C or SIGTERM.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&cfg)?;
    info!(
        "Serving {} from {} under {} ({} routing)",
        match cfg.database {
            Database::Memory => "an in-memory store",
            Database::File(_) => "a file store",
        },
        cfg.database,
        cfg.uri_prefix,
        cfg.route_match
    );
    let listener = TcpListener::bind((cfg.host.as_str(), cfg.port)).await?;
    let addr = listener.local_addr()?;
    info!("Listening on {addr}");
    if !cfg.prod {
        println!("Server started. You can use it at http://localhost:{}", cfg.port);
        println!("Press CTRL+C to stop the server");
    }
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("Unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
