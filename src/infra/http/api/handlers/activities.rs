//! Activity group handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;

use super::{
    activity_to_api, json_rejection_to_api, path_rejection_to_api, query_rejection_to_api,
};
use crate::application::activities::{CreateActivityCommand, UpdateActivityCommand};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_activities(
    State(state): State<ApiState>,
    query: Result<Query<ActivityListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(query_rejection_to_api)?;
    let activities = state
        .activities
        .list(query.email)
        .await
        .map_err(activity_to_api)?;
    Ok(ApiResponse::ok(activities))
}

pub async fn get_activity(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    let activity = state.activities.get(id).await.map_err(activity_to_api)?;
    Ok(ApiResponse::ok(activity))
}

pub async fn create_activity(
    State(state): State<ApiState>,
    payload: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let activity = state
        .activities
        .create(CreateActivityCommand::try_from(payload)?)
        .await
        .map_err(activity_to_api)?;
    Ok(ApiResponse::created(activity))
}

pub async fn update_activity(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateActivityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let activity = state
        .activities
        .update(id, UpdateActivityCommand::try_from(payload)?)
        .await
        .map_err(activity_to_api)?;
    Ok(ApiResponse::ok(activity))
}

pub async fn delete_activity(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    state.activities.delete(id).await.map_err(activity_to_api)?;
    Ok(ApiResponse::ok(Empty::default()))
}
