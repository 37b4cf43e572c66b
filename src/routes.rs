use super::{controllers, middleware, models, relay};
use axum::{
    middleware::from_fn,
    routing::{any, delete, get, post, Router},
};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    let screens = Router::new()
        .route("/", get(controllers::root))
        .route("/notes", get(controllers::list_notes))
        .route("/note", post(controllers::create_note))
        .route("/note/new", get(controllers::new_note_form))
        .route("/note/:id", get(controllers::edit_note_form))
        .route("/note/:id", post(controllers::save_note))
        .route("/note/:id", delete(controllers::delete_note))
        .route("/note/:id/view", get(controllers::view_note))
        .route("/note/:id/toggle", post(controllers::toggle_note))
        .route("/tags", get(controllers::list_tags))
        .route("/tag", get(controllers::tagged_notes))
        .route("/tasks", get(controllers::tasks))
        .route_layer(from_fn(middleware::html_headers));

    Router::new()
        .merge(screens)
        .route("/api/send-notification", any(relay::send_notification))
        .route("/health", get(controllers::health))
}
