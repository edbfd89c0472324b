use axum::extract::State;
use axum::response::Html;

use super::views::{render_admin_page, render_booking_page};
use super::AppState;
use crate::error::Result;

pub(crate) async fn home_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_booking_page(&state.business_name))
}

pub(crate) async fn admin_handler(State(state): State<AppState>) -> Result<Html<String>> {
    let appointments = state.service.list().await?;
    let settings = state.service.settings().await?;
    Ok(Html(render_admin_page(
        &state.business_name,
        &appointments,
        &settings,
    )))
}
