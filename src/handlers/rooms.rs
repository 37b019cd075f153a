use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{AdminUser, AuthUser, StaffUser},
    db::PropertyScope,
    handlers::{created, filter_value, ApiError, MessageResponse, PageQuery},
    models::*,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Room visible to `scope`, 404 otherwise
pub(crate) async fn scoped_room(state: &AppState, scope: PropertyScope, id: i64) -> Result<Room, ApiError> {
    state
        .store
        .get_room(id)
        .await?
        .filter(|r| scope.allows(r.property_id))
        .ok_or_else(|| ApiError::not_found("Room"))
}

pub async fn list_rooms(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<RoomListQuery>,
) -> Result<Json<RoomList>, ApiError> {
    let filter = RoomFilter {
        search: filter_value(q.search.as_deref()).map(str::to_string),
        status: filter_value(q.status.as_deref())
            .map(str::parse::<RoomStatus>)
            .transpose()
            .map_err(|_| ApiError::bad_request("Invalid room status"))?,
        room_type: filter_value(q.room_type.as_deref())
            .map(str::parse::<RoomType>)
            .transpose()
            .map_err(|_| ApiError::bad_request("Invalid room type"))?,
    };
    let (page, limit, offset) = PageQuery { page: q.page, limit: q.limit }.resolve(10);

    let (rooms, total) = state.store.list_rooms(auth.scope(), &filter, limit, offset).await?;
    Ok(Json(RoomList {
        rooms,
        page: PageMeta::new(total, page, limit),
    }))
}

pub async fn room_stats(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoomStats>, ApiError> {
    let stats = state.store.room_stats(auth.scope()).await?;
    Ok(Json(stats))
}

pub async fn get_room(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Room>, ApiError> {
    let room = scoped_room(&state, auth.scope(), id).await?;
    Ok(Json(room))
}

pub async fn create_room(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = state
        .store
        .create_room(auth.scope().owning_property(), &req)
        .await?;
    tracing::info!("Room {} created (property {:?})", room.number, room.property_id);
    Ok(created(room))
}

pub async fn update_room(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    scoped_room(&state, auth.scope(), id).await?;
    let room = state.store.update_room(id, &req).await?;
    Ok(Json(room))
}

pub async fn delete_room(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let room = scoped_room(&state, auth.scope(), id).await?;
    state.store.delete_room(id).await?;
    tracing::info!("Room {} deleted", room.number);
    Ok(MessageResponse::new("Room removed"))
}
