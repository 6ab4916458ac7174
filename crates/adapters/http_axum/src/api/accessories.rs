//! JSON handlers for accessories, their switches and their delay.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use occupancy_timer_app::ports::{EventPublisher, SwitchInput};
use occupancy_timer_domain::accessory::AccessoryStatus;
use occupancy_timer_domain::characteristic::Capability;
use occupancy_timer_domain::error::{NotFoundError, OccupancyError};
use occupancy_timer_domain::id::AccessoryId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for actuating a switch.
#[derive(Deserialize)]
pub struct SetSwitchRequest {
    pub on: bool,
    /// Defaults to the capability the accessory exposes for its mode.
    #[serde(default)]
    pub capability: Option<Capability>,
}

/// Response body after actuating a switch.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetSwitchResponse {
    pub on: bool,
}

/// Request and response body for the release delay.
#[derive(Debug, Serialize, Deserialize)]
pub struct DelayBody {
    pub delay_seconds: i64,
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(id: &str) -> Result<AccessoryId, ApiError> {
    AccessoryId::from_str(id).map_err(|_| {
        ApiError::from(OccupancyError::from(NotFoundError {
            entity: "Accessory",
            id: id.to_string(),
        }))
    })
}

/// `GET /api/accessories`
pub async fn list<S, P>(
    State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<AccessoryStatus>>, ApiError>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let accessories = state.accessory_service.list().await?;
    Ok(Json(accessories))
}

/// `GET /api/accessories/{id}`
pub async fn get<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<String>,
) -> Result<Json<AccessoryStatus>, ApiError>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let accessory = state.accessory_service.get(id).await?;
    Ok(Json(accessory))
}

/// `DELETE /api/accessories/{id}`
pub async fn delete<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state.accessory_service.remove(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `PUT /api/accessories/{id}/switches/{index}`
pub async fn set_switch<S, P>(
    State(state): State<AppState<S, P>>,
    Path((id, index)): Path<(String, usize)>,
    Json(req): Json<SetSwitchRequest>,
) -> Result<Json<SetSwitchResponse>, ApiError>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let on = state
        .accessory_service
        .set_switch(id, index, req.capability, req.on)?;
    Ok(Json(SetSwitchResponse { on }))
}

/// `PUT /api/accessories/{id}/delay`
///
/// Responds with the delay actually applied after clamping.
pub async fn set_delay<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<String>,
    Json(req): Json<DelayBody>,
) -> Result<Json<DelayBody>, ApiError>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let applied = state
        .accessory_service
        .reconfigure(id, req.delay_seconds)
        .await?;
    Ok(Json(DelayBody {
        delay_seconds: i64::from(applied.seconds()),
    }))
}
