//! Todo item handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;

use super::{json_rejection_to_api, path_rejection_to_api, query_rejection_to_api, todo_to_api};
use crate::application::todos::{CreateTodoCommand, UpdateTodoCommand};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_todos(
    State(state): State<ApiState>,
    query: Result<Query<TodoListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(query_rejection_to_api)?;
    let todos = state
        .todos
        .list(query.activity_group_id()?)
        .await
        .map_err(todo_to_api)?;
    Ok(ApiResponse::ok(todos))
}

pub async fn get_todo(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    let todo = state.todos.get(id).await.map_err(todo_to_api)?;
    Ok(ApiResponse::ok(todo))
}

pub async fn create_todo(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let todo = state
        .todos
        .create(CreateTodoCommand::try_from(payload)?)
        .await
        .map_err(todo_to_api)?;
    Ok(ApiResponse::created(todo))
}

pub async fn update_todo(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let todo = state
        .todos
        .update(id, UpdateTodoCommand::try_from(payload)?)
        .await
        .map_err(todo_to_api)?;
    Ok(ApiResponse::ok(todo))
}

pub async fn delete_todo(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(path_rejection_to_api)?;
    state.todos.delete(id).await.map_err(todo_to_api)?;
    Ok(ApiResponse::ok(Empty::default()))
}
