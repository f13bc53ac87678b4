use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::activities::{CreateActivityCommand, UpdateActivityCommand};
use crate::application::todos::{CreateTodoCommand, UpdateTodoCommand};

use super::error::ApiError;

const SUCCESS: &str = "Success";

/// Success envelope: `{"status": "Success", "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Response {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status(status: StatusCode, data: T) -> Response {
        (
            status,
            Json(Self {
                status: SUCCESS,
                data,
            }),
        )
            .into_response()
    }
}

/// Payload of a delete response.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityListQuery {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoListQuery {
    pub activity_group_id: Option<String>,
}

impl TodoListQuery {
    /// An empty value means no filter.
    pub fn activity_group_id(&self) -> Result<Option<i64>, ApiError> {
        match self.activity_group_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| invalid_type("activity_group_id", "number")),
        }
    }
}

// Request bodies keep raw JSON values so a wrongly typed field gets a per-field message
// instead of a deserializer error. JSON `null` reads as absent.

#[derive(Debug, Default, Deserialize)]
pub struct CreateActivityRequest {
    pub title: Option<Value>,
    pub email: Option<Value>,
}

impl TryFrom<CreateActivityRequest> for CreateActivityCommand {
    type Error = ApiError;

    fn try_from(request: CreateActivityRequest) -> Result<Self, Self::Error> {
        let email = string_field("email", request.email)?;
        let title = string_field("title", request.title)?;
        Ok(Self { title, email })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateActivityRequest {
    pub title: Option<Value>,
    pub email: Option<Value>,
}

impl TryFrom<UpdateActivityRequest> for UpdateActivityCommand {
    type Error = ApiError;

    fn try_from(request: UpdateActivityRequest) -> Result<Self, Self::Error> {
        let email = string_field("email", request.email)?;
        let title = string_field("title", request.title)?;
        Ok(Self { title, email })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub activity_group_id: Option<Value>,
    pub title: Option<Value>,
    pub is_active: Option<Value>,
    pub priority: Option<Value>,
}

impl TryFrom<CreateTodoRequest> for CreateTodoCommand {
    type Error = ApiError;

    fn try_from(request: CreateTodoRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: string_field("title", request.title)?,
            activity_group_id: number_field("activity_group_id", request.activity_group_id)?,
            is_active: boolean_field("is_active", request.is_active)?,
            priority: string_field("priority", request.priority)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub activity_group_id: Option<Value>,
    pub title: Option<Value>,
    pub is_active: Option<Value>,
    pub priority: Option<Value>,
}

impl TryFrom<UpdateTodoRequest> for UpdateTodoCommand {
    type Error = ApiError;

    fn try_from(request: UpdateTodoRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: string_field("title", request.title)?,
            activity_group_id: number_field("activity_group_id", request.activity_group_id)?,
            is_active: boolean_field("is_active", request.is_active)?,
            priority: string_field("priority", request.priority)?,
        })
    }
}

fn invalid_type(field: &str, kind: &str) -> ApiError {
    ApiError::bad_request(format!("Parameter '{field}' must be a {kind}"))
}

fn string_field(field: &str, value: Option<Value>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(invalid_type(field, "string")),
    }
}

/// Integers, or strings holding one.
fn number_field(field: &str, value: Option<Value>) -> Result<Option<i64>, ApiError> {
    match value {
        None => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid_type(field, "number")),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid_type(field, "number")),
        Some(_) => Err(invalid_type(field, "number")),
    }
}

/// Booleans, or the strings `true` and `false`.
fn boolean_field(field: &str, value: Option<Value>) -> Result<Option<bool>, ApiError> {
    match value {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(Value::String(text)) => match text.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid_type(field, "boolean")),
        },
        Some(_) => Err(invalid_type(field, "boolean")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_todo(body: Value) -> Result<CreateTodoCommand, ApiError> {
        let request: CreateTodoRequest = serde_json::from_value(body).unwrap();
        CreateTodoCommand::try_from(request)
    }

    #[test]
    fn wrong_types_name_the_field() {
        let cases = [
            (json!({ "title": 5 }), "Parameter 'title' must be a string"),
            (json!({ "activity_group_id": "x" }), "Parameter 'activity_group_id' must be a number"),
            (json!({ "is_active": 1 }), "Parameter 'is_active' must be a boolean"),
            (json!({ "priority": ["low"] }), "Parameter 'priority' must be a string"),
        ];
        for (body, message) in cases {
            let err = create_todo(body).unwrap_err();
            assert_eq!(err.message(), message);
        }
    }

    #[test]
    fn lenient_scalars_are_converted() {
        let command = create_todo(json!({
            "title": "Mop",
            "activity_group_id": "3",
            "is_active": "false",
            "priority": null,
        }))
        .unwrap();
        assert_eq!(command.activity_group_id, Some(3));
        assert_eq!(command.is_active, Some(false));
        assert_eq!(command.priority, None);
    }

    #[test]
    fn empty_list_filter_is_no_filter() {
        let query = TodoListQuery {
            activity_group_id: Some(String::new()),
        };
        assert_eq!(query.activity_group_id().unwrap(), None);

        let query = TodoListQuery {
            activity_group_id: Some("abc".into()),
        };
        assert_eq!(
            query.activity_group_id().unwrap_err().message(),
            "Parameter 'activity_group_id' must be a number"
        );
    }
}
