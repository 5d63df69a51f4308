use crate::backend::AppointmentBackend;
use crate::business_rules::BusinessRules;
use crate::configuration::Configuration;
use crate::error::AppError;
use crate::types::{Appointment, AppointmentRequest, MessageResponse};
use crate::validation::{validate_request, ValidationError};
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::{
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState<T: AppointmentBackend> {
    pub backend: T,
    pub rules: BusinessRules,
}

#[derive(Debug, Clone, Deserialize)]
struct DeleteAppointmentQuery {
    id: Option<String>,
}

/// JSON body extractor answering malformed bodies with a `400 {error}`.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ValidationError::MalformedBody(rejection.body_text()).into()),
        }
    }
}

pub fn create_app<T: AppointmentBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    let state = AppState {
        backend,
        rules: configuration.business_rules(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/appointments",
            get(list_appointments::<T>)
                .post(create_appointment::<T>)
                .put(update_appointment_from_body::<T>)
                .delete(delete_appointment_from_query::<T>),
        )
        .route(
            "/appointments/:id",
            put(update_appointment::<T>).delete(delete_appointment::<T>),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_appointments<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let mut appointments = state.backend.appointments()?;
    appointments.sort_by_key(|appointment| (appointment.start, appointment.created_at));
    Ok(Json(appointments))
}

async fn create_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let draft = validate_request(request, &state.rules)?;
    let appointment = state.backend.add_appointment(draft)?;
    info!(id = %appointment.id, start = %appointment.start, "Created appointment");
    Ok(Json(appointment))
}

async fn update_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    store_update(&state, &id, request)
}

async fn update_appointment_from_body<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let Some(id) = request.id.clone().filter(|id| !id.trim().is_empty()) else {
        return Err(ValidationError::MissingId.into());
    };
    store_update(&state, &id, request)
}

async fn delete_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    store_remove(&state, &id)
}

async fn delete_appointment_from_query<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Query(query): Query<DeleteAppointmentQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let Some(id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return Err(ValidationError::MissingId.into());
    };
    store_remove(&state, &id)
}

fn store_update<T: AppointmentBackend>(
    state: &AppState<T>,
    id: &str,
    request: AppointmentRequest,
) -> Result<Json<Appointment>, AppError> {
    let draft = validate_request(request, &state.rules)?;
    let id = parse_id(id)?;
    let appointment = state.backend.update_appointment(id, draft)?;
    info!(%id, start = %appointment.start, "Updated appointment");
    Ok(Json(appointment))
}

fn store_remove<T: AppointmentBackend>(
    state: &AppState<T>,
    id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(id)?;
    state.backend.remove_appointment(id)?;
    info!(%id, "Deleted appointment");
    Ok(Json(MessageResponse {
        message: "Appointment deleted successfully".into(),
    }))
}

/// Identifiers that are no UUID can't match any stored appointment.
fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::NotFound)
}
