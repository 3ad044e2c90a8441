use axum::routing::{delete, post};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

// Each route is also served with a trailing slash, which existing clients send.
pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(photo_upload_routes(config.storage.max_photo_size))
        .merge(photo_routes())
        .merge(background_routes())
}

fn photo_upload_routes(max_photo_size: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::photo::add_photo))
        .route("/add-photo/", post(handlers::photo::add_photo))
        .layer(handlers::photo::upload_body_limit(max_photo_size))
}

fn photo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::photo::remove_photo))
        .route("/remove-photo/", delete(handlers::photo::remove_photo))
}

fn background_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::background::generate_background))
        .route(
            "/generate-background/",
            post(handlers::background::generate_background),
        )
}
