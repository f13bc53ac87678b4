use std::sync::Arc;

use thiserror::Error;
use validator::Validate;

use crate::application::activities::ActivityRepository;
use crate::application::repos::{
    CreateTodoParams, RepoError, TodoFilter, TodoStore, TodoWhere, UpdateTodoParams,
};
use crate::application::validation;
use crate::cache::CachedRepository;
use crate::domain::todos::{Priority, Todo};

pub type TodoRepository = CachedRepository<TodoStore>;

/// Page size of the todo list.
pub const TODO_LIST_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),
    #[error("Todo with ID {id} Not Found")]
    NotFound { id: i64 },
    #[error("Activity with ID {id} Not Found")]
    ActivityNotFound { id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Fields are checked in this order; the first violation is reported. Priority is
/// checked last, against [`Priority::ALL`].
const FIELD_ORDER: [&str; 2] = ["title", "activity_group_id"];

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateTodoCommand {
    #[validate(required(message = "activity_group_id cannot be null"))]
    pub activity_group_id: Option<i64>,
    #[validate(
        required(message = "title cannot be null"),
        length(min = 1, message = "Parameter 'title' is not allowed to be empty")
    )]
    pub title: Option<String>,
    pub is_active: Option<bool>,
    /// Raw priority text; checked against [`Priority::ALL`].
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateTodoCommand {
    pub activity_group_id: Option<i64>,
    #[validate(length(min = 1, message = "Parameter 'title' is not allowed to be empty"))]
    pub title: Option<String>,
    pub is_active: Option<bool>,
    pub priority: Option<String>,
}

#[derive(Clone)]
pub struct TodoService {
    todos: Arc<TodoRepository>,
    activities: Arc<ActivityRepository>,
}

impl TodoService {
    pub fn new(todos: Arc<TodoRepository>, activities: Arc<ActivityRepository>) -> Self {
        Self { todos, activities }
    }

    pub async fn list(&self, activity_group_id: Option<i64>) -> Result<Vec<Todo>, TodoError> {
        let filter = TodoFilter::take(TODO_LIST_LIMIT).with_conditions(TodoWhere {
            activity_group_id,
            ..TodoWhere::default()
        });
        self.todos
            .get_all(Some(&filter))
            .await
            .map_err(TodoError::from)
    }

    pub async fn get(&self, id: i64) -> Result<Todo, TodoError> {
        self.todos
            .get_by_id(id)
            .await?
            .ok_or(TodoError::NotFound { id })
    }

    pub async fn create(&self, command: CreateTodoCommand) -> Result<Todo, TodoError> {
        validation::check(&command, &FIELD_ORDER).map_err(TodoError::Validation)?;
        let (Some(title), Some(activity_group_id)) = (command.title, command.activity_group_id)
        else {
            return Err(TodoError::Validation(
                "title and activity_group_id are required".into(),
            ));
        };
        let priority = parse_priority(command.priority.as_deref())?.unwrap_or_default();

        self.ensure_activity_exists(activity_group_id).await?;

        self.todos
            .create(CreateTodoParams {
                activity_group_id,
                title,
                is_active: command.is_active.unwrap_or(true),
                priority,
            })
            .await
            .map_err(TodoError::from)
    }

    pub async fn update(&self, id: i64, command: UpdateTodoCommand) -> Result<Todo, TodoError> {
        validation::check(&command, &FIELD_ORDER).map_err(TodoError::Validation)?;
        let priority = parse_priority(command.priority.as_deref())?;
        let current = self.get(id).await?;

        if let Some(activity_group_id) = command.activity_group_id {
            self.ensure_activity_exists(activity_group_id).await?;
        }

        self.todos
            .update(
                &current,
                UpdateTodoParams {
                    activity_group_id: command.activity_group_id,
                    title: command.title,
                    is_active: command.is_active,
                    priority,
                },
            )
            .await
            .map_err(TodoError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<Todo, TodoError> {
        let current = self.get(id).await?;
        self.todos.delete(current).await.map_err(TodoError::from)
    }

    async fn ensure_activity_exists(&self, id: i64) -> Result<(), TodoError> {
        match self.activities.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(TodoError::ActivityNotFound { id }),
        }
    }
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, TodoError> {
    raw.map(|value| {
        value.parse::<Priority>().map_err(|_| {
            let allowed = Priority::ALL
                .iter()
                .map(|priority| priority.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            TodoError::Validation(format!(
                "Parameter 'priority' is not valid, possible value is {allowed}"
            ))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_error_lists_every_value() {
        let err = parse_priority(Some("urgent")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter 'priority' is not valid, possible value is very-high, high, normal, low, very-low"
        );
    }

    #[test]
    fn absent_priority_is_accepted() {
        assert_eq!(parse_priority(None).unwrap(), None);
        assert_eq!(parse_priority(Some("low")).unwrap(), Some(Priority::Low));
    }
}
