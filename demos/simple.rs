use std::{net::SocketAddr, sync::Arc};

use admin_auth::{
    build_api_route_filter, handle_auth_errors, with_auth, Auth, AuthConfig, ClaimSet,
    MemoryStore, TokenConfig, TracingNotifier,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use warp::{path, Filter};

// ADMIN_AUTH_TOKEN_SECRET=change-me cargo run --example simple
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuthConfig {
        token: TokenConfig::from_env()?,
        credential_store: Arc::new(MemoryStore::new()),
        notifier: Arc::new(TracingNotifier),
    };

    let auth = Auth::new(config)?;

    let auth_routes = build_api_route_filter(&auth);

    let unsecured_homepage =
        warp::path::end().then(|| async move { warp::reply::html("hello, world!") });

    let secure_page = path!("check_user_id")
        .and(with_auth(&auth))
        .then(|claims: ClaimSet| async move {
            warp::reply::json(&json!({
                "principal id": claims.principal_id,
                "username": claims.username,
            }))
        });

    let all_routes = unsecured_homepage
        .or(secure_page)
        .or(auth_routes)
        .recover(handle_auth_errors)
        .with(warp::trace::request());

    let addr: SocketAddr = "127.0.0.1:4000".parse()?;
    warp::serve(all_routes).run(addr).await;

    Ok(())
}
