use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    clean_backups_handler, create_backup_handler, create_link_handler, delete_backup_handler,
    delete_link_handler, download_backup_handler, get_link_handler, health_handler,
    list_backups_handler, list_links_handler, redirect_handler, restore_backup_handler,
    update_link_handler,
};
use crate::middleware::maintenance_gate;
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        let links = Router::new()
            .route("/", get(list_links_handler).post(create_link_handler))
            .route(
                "/{short_code}",
                get(get_link_handler)
                    .put(update_link_handler)
                    .delete(delete_link_handler),
            )
            .route_layer(from_fn_with_state(state.clone(), maintenance_gate));

        let backups = Router::new()
            .route("/", get(list_backups_handler).post(create_backup_handler))
            .route("/restore", post(restore_backup_handler))
            .route("/clean", post(clean_backups_handler))
            .route("/{filename}", delete(delete_backup_handler))
            .route("/{filename}/download", get(download_backup_handler));

        Router::new()
            .route("/health", get(health_handler))
            .nest("/api/links", links)
            .nest("/api/backups", backups)
            .route(
                "/{short_code}",
                get(redirect_handler)
                    .route_layer(from_fn_with_state(state.clone(), maintenance_gate)),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
