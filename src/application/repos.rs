//! Repository traits describing persistence adapters.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::cache::{FilterMap, FilterValue, ToFilter};
use crate::domain::activities::Activity;
use crate::domain::todos::{Priority, Todo};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Authoritative store behind a cached repository.
///
/// `update` and `destroy` act on an entity previously returned by this store.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    type Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Id: fmt::Display + Copy + Send + Sync + 'static;
    type Create: Send + 'static;
    type Update: Send + 'static;
    type Filter: ToFilter + Send + Sync + 'static;

    async fn create(&self, params: Self::Create) -> Result<Self::Entity, RepoError>;

    async fn find_all(
        &self,
        options: Option<&Self::Filter>,
    ) -> Result<Vec<Self::Entity>, RepoError>;

    async fn find_by_pk(&self, id: Self::Id) -> Result<Option<Self::Entity>, RepoError>;

    async fn update(
        &self,
        entity: &Self::Entity,
        params: Self::Update,
    ) -> Result<Self::Entity, RepoError>;

    async fn destroy(&self, entity: &Self::Entity) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sortable column of a resource.
pub trait OrderField: Copy + Send + Sync {
    fn column(self) -> &'static str;
}

/// List options shared by every resource: conditions, paging and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions<W, F> {
    pub conditions: Option<W>,
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub order_by: Vec<(F, SortDirection)>,
}

impl<W, F> Default for FindOptions<W, F> {
    fn default() -> Self {
        Self {
            conditions: None,
            skip: None,
            take: None,
            order_by: Vec::new(),
        }
    }
}

impl<W, F> FindOptions<W, F> {
    pub fn take(limit: u32) -> Self {
        Self {
            take: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_conditions(mut self, conditions: W) -> Self {
        self.conditions = Some(conditions);
        self
    }
}

impl<W: ToFilter, F: OrderField> ToFilter for FindOptions<W, F> {
    fn to_filter(&self) -> FilterMap {
        let mut filter = FilterMap::new();
        let conditions = self
            .conditions
            .as_ref()
            .map(ToFilter::to_filter)
            .filter(|conditions| !conditions.is_empty());
        filter.insert_some("where", conditions);
        filter.insert_some("skip", self.skip);
        filter.insert_some("take", self.take);
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(field, direction)| FilterValue::from(vec![field.column(), direction.as_str()]))
                .collect::<Vec<_>>();
            filter.insert("orderBy", order);
        }
        filter
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateActivityParams {
    pub title: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateActivityParams {
    pub title: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityWhere {
    pub email: Option<String>,
    pub title: Option<String>,
}

impl ToFilter for ActivityWhere {
    fn to_filter(&self) -> FilterMap {
        let mut filter = FilterMap::new();
        filter.insert_some("email", self.email.clone());
        filter.insert_some("title", self.title.clone());
        filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityField {
    Id,
    Title,
    Email,
    CreatedAt,
    UpdatedAt,
}

impl OrderField for ActivityField {
    fn column(self) -> &'static str {
        match self {
            ActivityField::Id => "id",
            ActivityField::Title => "title",
            ActivityField::Email => "email",
            ActivityField::CreatedAt => "created_at",
            ActivityField::UpdatedAt => "updated_at",
        }
    }
}

pub type ActivityFilter = FindOptions<ActivityWhere, ActivityField>;

pub type ActivityStore = dyn ResourceStore<
        Entity = Activity,
        Id = i64,
        Create = CreateActivityParams,
        Update = UpdateActivityParams,
        Filter = ActivityFilter,
    >;

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateTodoParams {
    pub activity_group_id: i64,
    pub title: String,
    pub is_active: bool,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTodoParams {
    pub activity_group_id: Option<i64>,
    pub title: Option<String>,
    pub is_active: Option<bool>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoWhere {
    pub activity_group_id: Option<i64>,
    pub is_active: Option<bool>,
    pub priority: Option<Priority>,
}

impl ToFilter for TodoWhere {
    fn to_filter(&self) -> FilterMap {
        let mut filter = FilterMap::new();
        filter.insert_some("activity_group_id", self.activity_group_id);
        filter.insert_some("is_active", self.is_active);
        filter.insert_some("priority", self.priority.map(Priority::as_str));
        filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoField {
    Id,
    ActivityGroupId,
    Title,
    IsActive,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl OrderField for TodoField {
    fn column(self) -> &'static str {
        match self {
            TodoField::Id => "id",
            TodoField::ActivityGroupId => "activity_group_id",
            TodoField::Title => "title",
            TodoField::IsActive => "is_active",
            TodoField::Priority => "priority",
            TodoField::CreatedAt => "created_at",
            TodoField::UpdatedAt => "updated_at",
        }
    }
}

pub type TodoFilter = FindOptions<TodoWhere, TodoField>;

pub type TodoStore = dyn ResourceStore<
        Entity = Todo,
        Id = i64,
        Create = CreateTodoParams,
        Update = UpdateTodoParams,
        Filter = TodoFilter,
    >;

#[cfg(test)]
mod tests {
    use crate::cache::{KeyInput, encode_key};

    use super::*;

    #[test]
    fn activity_filter_encodes_where_before_take() {
        let filter = ActivityFilter::take(10).with_conditions(ActivityWhere {
            email: Some("a@b.com".to_string()),
            title: None,
        });

        assert_eq!(
            encode_key(
                "activity-repository",
                "get-activities",
                KeyInput::Filter(&filter.to_filter())
            ),
            "activity-repository-get-activities?where=email=a@b.com+take=10"
        );
    }

    #[test]
    fn empty_conditions_are_omitted() {
        let filter = TodoFilter::take(10).with_conditions(TodoWhere::default());
        assert_eq!(
            encode_key("todo-repository", "get-todos", KeyInput::Filter(&filter.to_filter())),
            "todo-repository-get-todos?take=10"
        );
    }

    #[test]
    fn todo_conditions_encode_group_id() {
        let filter = TodoFilter::default().with_conditions(TodoWhere {
            activity_group_id: Some(1),
            ..Default::default()
        });
        assert_eq!(
            encode_key("todo-repository", "get-todos", KeyInput::Filter(&filter.to_filter())),
            "todo-repository-get-todos?where=activity_group_id=1"
        );
    }

    #[test]
    fn ordering_flattens_into_pairs() {
        let filter = TodoFilter {
            order_by: vec![
                (TodoField::Priority, SortDirection::Desc),
                (TodoField::Id, SortDirection::Asc),
            ],
            ..Default::default()
        };
        assert_eq!(
            encode_key("todo-repository", "get-todos", KeyInput::Filter(&filter.to_filter())),
            "todo-repository-get-todos?orderby=priority,desc,id,asc"
        );
    }

    #[test]
    fn equal_filters_share_a_key() {
        let a = TodoFilter::take(10).with_conditions(TodoWhere {
            activity_group_id: Some(3),
            is_active: Some(true),
            priority: None,
        });
        let b = TodoFilter {
            conditions: Some(TodoWhere {
                is_active: Some(true),
                activity_group_id: Some(3),
                priority: None,
            }),
            take: Some(10),
            ..Default::default()
        };
        assert_eq!(
            encode_key("ns", "op", KeyInput::Filter(&a.to_filter())),
            encode_key("ns", "op", KeyInput::Filter(&b.to_filter()))
        );
    }
}
