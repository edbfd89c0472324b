pub mod api;
pub mod auth;
pub mod dashboard;
pub mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::booking::BookingService;
use crate::error::BookingError;
use crate::ledger::Ledger;
use crate::models::{AdminConfig, Config};
use crate::notify;
use crate::settings::JsonFileSettings;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: BookingService,
    pub(crate) admin: Arc<AdminConfig>,
    pub(crate) business_name: Arc<str>,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::InvalidInput(_)
            | BookingError::ClosedDay(_)
            | BookingError::SlotConflict { .. } => StatusCode::BAD_REQUEST,
            BookingError::NotFound(id) => {
                debug!("Appointment {} not found", id);
                StatusCode::NOT_FOUND
            }
            BookingError::Database(_) | BookingError::Settings(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let detail = if self.is_client_error() {
            self.to_string()
        } else {
            error!("Request failed: {}", self);
            "Errore interno del server".to_string()
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::invalid(format!("Richiesta non valida: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::invalid(format!("Parametri non validi: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for BookingError {
    fn from(rejection: PathRejection) -> Self {
        BookingError::invalid(format!("Percorso non valido: {}", rejection.body_text()))
    }
}

pub(crate) fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin", get(dashboard::admin_handler))
        .route("/lista_appuntamenti", get(api::list))
        .route("/modifica/{id}", put(api::update))
        .route("/cancella/{id}", delete(api::cancel))
        .route("/settings", get(api::get_settings).post(api::put_settings))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(dashboard::home_handler))
        .route("/orari-disponibili", get(api::free_slots))
        .route("/prenota", post(api::book))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, addr: &str) -> Result<()> {
    let ledger = Ledger::connect(&config.storage.database_url)
        .await
        .with_context(|| format!("Failed to open {}", config.storage.database_url))?;
    let settings = Arc::new(JsonFileSettings::new(&config.storage.settings_path));
    let notifier = notify::from_config(config.telegram.as_ref())?;
    let service = BookingService::new(ledger, settings, notifier, config.booking.slot_minutes);

    let state = AppState {
        service,
        admin: Arc::new(config.admin),
        business_name: Arc::from(config.booking.business_name.as_str()),
    };

    let app = router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Booking service listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::tests::Recorder;
    use crate::settings::MemorySettings;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
    use axum::http::{Method, Request};
    use base64::prelude::*;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app() -> Router {
        let ledger = Ledger::in_memory().await.unwrap();
        let service = BookingService::new(
            ledger,
            Arc::new(MemorySettings::default()),
            Arc::new(Recorder::default()),
            30,
        );
        router(AppState {
            service,
            admin: Arc::new(AdminConfig {
                username: "admin".into(),
                password: "password123".into(),
            }),
            business_name: Arc::from("Salone Test"),
        })
    }

    fn admin_auth() -> String {
        format!("Basic {}", BASE64_STANDARD.encode("admin:password123"))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: Method, uri: &str, body: Value, auth: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if auth {
            builder = builder.header(AUTHORIZATION, admin_auth());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn admin_get(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header(AUTHORIZATION, admin_auth())
            .body(Body::empty())
            .unwrap()
    }

    fn booking(date: &str, time: &str) -> Value {
        json!({
            "nome": "Anna",
            "telefono": "3331234567",
            "servizio": "Taglio",
            "data": date,
            "ora": time,
        })
    }

    #[tokio::test]
    async fn test_free_slots_open_day() {
        let app = app().await;
        let (status, body) = send(&app, get("/orari-disponibili?data=2024-06-04")).await;
        assert_eq!(status, StatusCode::OK);
        let slots = body["orari"].as_array().unwrap();
        assert_eq!(slots.len(), 20);
        assert_eq!(slots[0], "09:00");
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_free_slots_holiday_message() {
        let app = app().await;
        let settings = json!({
            "weekly": serde_json::to_value(crate::models::Settings::default().weekly).unwrap(),
            "holidays": ["2024-06-04"],
        });
        let (status, _) = send(&app, json_req(Method::POST, "/settings", settings, true)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get("/orari-disponibili?data=2024-06-04")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "orari": [], "message": "Chiuso per ferie" }));
    }

    #[tokio::test]
    async fn test_free_slots_invalid_date() {
        let app = app().await;
        let (status, body) = send(&app, get("/orari-disponibili?data=domani")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("Data non valida"));
    }

    #[tokio::test]
    async fn test_book_and_conflict() {
        let app = app().await;
        let (status, body) = send(
            &app,
            json_req(Method::POST, "/prenota", booking("2024-06-04", "10:00"), false),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "successo");

        let (status, body) = send(
            &app,
            json_req(Method::POST, "/prenota", booking("2024-06-04", "10:00"), false),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("già occupato"));

        let (_, body) = send(&app, get("/orari-disponibili?data=2024-06-04")).await;
        let slots = body["orari"].as_array().unwrap();
        assert_eq!(slots.len(), 19);
        assert!(!slots.contains(&json!("10:00")));
    }

    #[tokio::test]
    async fn test_book_missing_field_is_400_with_detail() {
        let app = app().await;
        let body = json!({ "nome": "Anna", "servizio": "Taglio", "data": "2024-06-04" });
        let (status, body) = send(&app, json_req(Method::POST, "/prenota", body, false)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("ora"));
    }

    #[tokio::test]
    async fn test_book_malformed_json_is_400_with_detail() {
        let app = app().await;
        let req = Request::post("/prenota")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Richiesta non valida"));
    }

    #[tokio::test]
    async fn test_free_slots_missing_date_is_400_with_detail() {
        let app = app().await;
        let (status, body) = send(&app, get("/orari-disponibili")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("data"));
    }

    #[tokio::test]
    async fn test_update_bad_id_and_body_are_400_with_detail() {
        let app = app().await;
        let (status, body) = send(
            &app,
            json_req(Method::PUT, "/modifica/abc", json!({ "nome": "Bea" }), true),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, body) = send(
            &app,
            json_req(Method::PUT, "/modifica/1", json!({ "nome": 42 }), true),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_book_closed_day() {
        let app = app().await;
        let (status, body) = send(
            &app,
            json_req(Method::POST, "/prenota", booking("2024-06-03", "10:00"), false),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Chiuso in questo giorno");
    }

    #[tokio::test]
    async fn test_admin_routes_require_credentials() {
        let app = app().await;
        for uri in ["/lista_appuntamenti", "/settings", "/admin"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(resp.headers()[WWW_AUTHENTICATE], "Basic");
        }

        let bad = Request::get("/lista_appuntamenti")
            .header(
                AUTHORIZATION,
                format!("Basic {}", BASE64_STANDARD.encode("admin:nope")),
            )
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, bad).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Credenziali errate");
    }

    #[tokio::test]
    async fn test_public_routes_open() {
        let app = app().await;
        let resp = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let app = app().await;
        for (date, time) in [("2024-06-05", "09:00"), ("2024-06-04", "15:00"), ("2024-06-04", "09:30")] {
            let (status, _) =
                send(&app, json_req(Method::POST, "/prenota", booking(date, time), false)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send(&app, admin_get("/lista_appuntamenti")).await;
        assert_eq!(status, StatusCode::OK);
        let order: Vec<String> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| format!("{} {}", a["data"].as_str().unwrap(), a["ora"].as_str().unwrap()))
            .collect();
        assert_eq!(
            order,
            vec!["2024-06-04 09:30", "2024-06-04 15:00", "2024-06-05 09:00"]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app().await;
        let (_, body) = send(
            &app,
            json_req(Method::POST, "/prenota", booking("2024-06-04", "10:00"), false),
        )
        .await;
        let id = body["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_req(
                Method::PUT,
                &format!("/modifica/{id}"),
                json!({ "ora": "11:00", "note": "colore" }),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ora"], "11:00");
        assert_eq!(body["note"], "colore");

        let del = Request::delete(format!("/cancella/{id}"))
            .header(AUTHORIZATION, admin_auth())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, del).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messaggio"], "Appuntamento rimosso correttamente");

        let del = Request::delete(format!("/cancella/{id}"))
            .header(AUTHORIZATION, admin_auth())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, del).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Appuntamento non trovato");
    }

    #[tokio::test]
    async fn test_update_unknown_is_404() {
        let app = app().await;
        let (status, _) = send(
            &app,
            json_req(Method::PUT, "/modifica/99", json!({ "nome": "Bea" }), true),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let app = app().await;
        let (status, body) = send(&app, admin_get("/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weekly"]["tuesday"]["start"], "09:00");

        let mut updated = body.clone();
        updated["weekly"]["monday"] = json!({ "open": true, "start": "10:00", "end": "12:00" });
        updated["holidays"] = json!(["2024-12-25"]);
        let (status, _) = send(&app, json_req(Method::POST, "/settings", updated, true)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get("/orari-disponibili?data=2024-06-03")).await;
        assert_eq!(body["orari"], json!(["10:00", "10:30", "11:00", "11:30"]));
    }

    #[tokio::test]
    async fn test_admin_page_renders() {
        let app = app().await;
        let resp = app.clone().oneshot(admin_get("/admin")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Salone Test"));
    }
}
