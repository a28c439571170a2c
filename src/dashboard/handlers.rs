use axum::{response::Html, routing::get, Router};
use tracing::{debug, instrument};

use crate::{auth::extractors::AuthUser, state::AppState, views};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(show_dashboard))
}

#[instrument(skip_all)]
pub async fn show_dashboard(AuthUser(user): AuthUser) -> Html<String> {
    debug!(user_id = %user.id, "dashboard rendered");
    Html(views::dashboard_page(&user.name))
}
