use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateTodoParams, RepoError, ResourceStore, TodoFilter, UpdateTodoParams},
    domain::todos::{Priority, Todo},
};

use super::{PostgresRepositories, map_sqlx_error, push_paging};

const TODO_COLUMNS: &str =
    "id, activity_group_id, title, is_active, priority, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i64,
    activity_group_id: i64,
    title: String,
    is_active: bool,
    priority: Priority,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            activity_group_id: row.activity_group_id,
            title: row.title,
            is_active: row.is_active,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresTodoStore {
    repos: PostgresRepositories,
}

impl PostgresTodoStore {
    pub fn new(repos: PostgresRepositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl ResourceStore for PostgresTodoStore {
    type Entity = Todo;
    type Id = i64;
    type Create = CreateTodoParams;
    type Update = UpdateTodoParams;
    type Filter = TodoFilter;

    async fn create(&self, params: CreateTodoParams) -> Result<Todo, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "INSERT INTO todos (activity_group_id, title, is_active, priority) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(params.activity_group_id)
        .bind(params.title)
        .bind(params.is_active)
        .bind(params.priority)
        .fetch_one(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_all(&self, options: Option<&TodoFilter>) -> Result<Vec<Todo>, RepoError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE TRUE"));

        let default_options = TodoFilter::default();
        let options = options.unwrap_or(&default_options);

        if let Some(conditions) = options.conditions.as_ref() {
            if let Some(activity_group_id) = conditions.activity_group_id {
                qb.push(" AND activity_group_id = ");
                qb.push_bind(activity_group_id);
            }
            if let Some(is_active) = conditions.is_active {
                qb.push(" AND is_active = ");
                qb.push_bind(is_active);
            }
            if let Some(priority) = conditions.priority {
                qb.push(" AND priority = ");
                qb.push_bind(priority);
            }
        }
        push_paging(&mut qb, options);

        let rows = qb
            .build_query_as::<TodoRow>()
            .fetch_all(self.repos.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Todo>, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Todo::from))
    }

    async fn update(&self, entity: &Todo, params: UpdateTodoParams) -> Result<Todo, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "UPDATE todos SET \
                activity_group_id = COALESCE($2, activity_group_id), \
                title = COALESCE($3, title), \
                is_active = COALESCE($4, is_active), \
                priority = COALESCE($5, priority), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(entity.id)
        .bind(params.activity_group_id)
        .bind(params.title)
        .bind(params.is_active)
        .bind(params.priority)
        .fetch_one(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn destroy(&self, entity: &Todo) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(entity.id)
            .execute(self.repos.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
