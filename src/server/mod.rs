mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::Error;
use crate::server::handlers::{bookings, chat, profiles, rides};

pub use extract::SESSION_COOKIE;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rides", post(rides::create).get(rides::search))
        .route("/pricing/ceiling", get(rides::price_ceiling))
        .route(
            "/rides/:id",
            get(rides::find).put(rides::update).delete(rides::delete),
        )
        .route("/rides/:id/rating", post(rides::rate))
        .route("/bookings", post(bookings::create).get(bookings::list))
        .route(
            "/bookings/:id",
            put(bookings::respond).delete(bookings::cancel),
        )
        .route(
            "/chat/conversations",
            post(chat::open_conversation).get(chat::list_conversations),
        )
        .route(
            "/chat/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/profile", get(profiles::me).put(profiles::update))
        .route("/profiles/:id", get(profiles::find))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            Error::unexpected_error()
        })
}

async fn health() -> &'static str {
    "ok"
}
