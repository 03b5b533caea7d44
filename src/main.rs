use axum::{Router, middleware};
use log::info;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use messenger_sync::state::AppState;
use messenger_sync::{auth, channel, conversation, integration, message};

#[tokio::main]
async fn main() {
    let config = integration::Config::default();
    let state = AppState::init(&config).await;

    let api = Router::new()
        .merge(conversation::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(channel::api(state.clone()))
        .layer(middleware::from_fn_with_state(
            state,
            auth::middleware::authenticate,
        ));

    let app = Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(config.env.allow_origin())
                    .allow_methods(config.env.allow_methods())
                    .allow_headers(config.env.allow_headers()),
            ),
    );

    let addr = config.env.addr();
    info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .await
        .expect("failed to start server");
}
