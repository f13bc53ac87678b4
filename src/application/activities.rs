use std::sync::Arc;

use thiserror::Error;
use validator::{Validate, ValidateEmail};

use crate::application::repos::{
    ActivityFilter, ActivityStore, ActivityWhere, CreateActivityParams, RepoError,
    UpdateActivityParams,
};
use crate::application::todos::TodoRepository;
use crate::cache::CachedRepository;
use crate::application::validation;
use crate::domain::activities::Activity;

pub type ActivityRepository = CachedRepository<ActivityStore>;

/// Page size of the activity list.
pub const ACTIVITY_LIST_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("{0}")]
    Validation(String),
    #[error("Activity with ID {id} Not Found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

const INVALID_EMAIL: &str = "Parameter 'email' must be a valid email";

/// Fields are checked in this order; the first violation is reported.
const FIELD_ORDER: [&str; 2] = ["email", "title"];

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateActivityCommand {
    #[validate(
        required(message = "title cannot be null"),
        length(min = 1, message = "Parameter 'title' is not allowed to be empty")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Parameter 'email' is required"),
        length(min = 1, message = "Parameter 'email' is not allowed to be empty"),
        email(message = "Parameter 'email' must be a valid email")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateActivityCommand {
    #[validate(length(min = 1, message = "Parameter 'title' is not allowed to be empty"))]
    pub title: Option<String>,
    #[validate(
        length(min = 1, message = "Parameter 'email' is not allowed to be empty"),
        email(message = "Parameter 'email' must be a valid email")
    )]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct ActivityService {
    activities: Arc<ActivityRepository>,
    todos: Arc<TodoRepository>,
}

impl ActivityService {
    /// `todos` is invalidated alongside activities on delete: the database cascades the
    /// removal to the activity's todos.
    pub fn new(activities: Arc<ActivityRepository>, todos: Arc<TodoRepository>) -> Self {
        Self { activities, todos }
    }

    /// An empty `email` means no filter.
    pub async fn list(&self, email: Option<String>) -> Result<Vec<Activity>, ActivityError> {
        let email = email.filter(|email| !email.is_empty());
        if email.as_ref().is_some_and(|email| !email.validate_email()) {
            return Err(ActivityError::Validation(INVALID_EMAIL.into()));
        }

        let filter = ActivityFilter::take(ACTIVITY_LIST_LIMIT).with_conditions(ActivityWhere {
            email,
            title: None,
        });
        self.activities
            .get_all(Some(&filter))
            .await
            .map_err(ActivityError::from)
    }

    pub async fn get(&self, id: i64) -> Result<Activity, ActivityError> {
        self.activities
            .get_by_id(id)
            .await?
            .ok_or(ActivityError::NotFound { id })
    }

    pub async fn create(&self, command: CreateActivityCommand) -> Result<Activity, ActivityError> {
        validation::check(&command, &FIELD_ORDER).map_err(ActivityError::Validation)?;
        let (Some(title), Some(email)) = (command.title, command.email) else {
            return Err(ActivityError::Validation(
                "title and email are required".into(),
            ));
        };

        self.activities
            .create(CreateActivityParams { title, email })
            .await
            .map_err(ActivityError::from)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateActivityCommand,
    ) -> Result<Activity, ActivityError> {
        validation::check(&command, &FIELD_ORDER).map_err(ActivityError::Validation)?;

        let current = self.get(id).await?;
        self.activities
            .update(
                &current,
                UpdateActivityParams {
                    title: command.title,
                    email: command.email,
                },
            )
            .await
            .map_err(ActivityError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<Activity, ActivityError> {
        let current = self.get(id).await?;
        let deleted = self.activities.delete(current).await?;
        self.todos.invalidate().await;
        Ok(deleted)
    }
}
