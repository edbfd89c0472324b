use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::Result;
use crate::models::{Appointment, AppointmentUpdate, BookingRequest, Settings};

#[derive(Deserialize)]
pub(crate) struct SlotsQuery {
    data: String,
}

/// `GET /orari-disponibili?data=YYYY-MM-DD`
pub(crate) async fn free_slots(
    State(state): State<AppState>,
    query: std::result::Result<Query<SlotsQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(q) = query?;
    let day = state.service.free_slots(&q.data).await?;
    let body = match day.closure {
        Some(closure) => json!({ "orari": [], "message": closure.reason() }),
        None => json!({ "orari": day.slots }),
    };
    Ok(Json(body))
}

/// `POST /prenota`
pub(crate) async fn book(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let appt = state.service.book(req).await?;
    Ok(Json(json!({
        "status": "successo",
        "messaggio": format!(
            "Prenotata sessione per {} il {} alle {}",
            appt.client, appt.date, appt.time
        ),
        "id": appt.id,
    })))
}

/// `GET /lista_appuntamenti`
pub(crate) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Appointment>>> {
    Ok(Json(state.service.list().await?))
}

/// `PUT /modifica/{id}`
pub(crate) async fn update(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<AppointmentUpdate>, JsonRejection>,
) -> Result<Json<Appointment>> {
    let Path(id) = id?;
    let Json(upd) = payload?;
    Ok(Json(state.service.update(id, upd).await?))
}

/// `DELETE /cancella/{id}`
pub(crate) async fn cancel(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    state.service.cancel(id).await?;
    Ok(Json(json!({
        "status": "successo",
        "messaggio": "Appuntamento rimosso correttamente",
    })))
}

pub(crate) async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(state.service.settings().await?))
}

pub(crate) async fn put_settings(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Settings>, JsonRejection>,
) -> Result<Json<Settings>> {
    let Json(settings) = payload?;
    Ok(Json(state.service.replace_settings(settings).await?))
}
