use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        ActivityFilter, CreateActivityParams, RepoError, ResourceStore, UpdateActivityParams,
    },
    domain::activities::Activity,
};

use super::{PostgresRepositories, map_sqlx_error, push_paging};

const ACTIVITY_COLUMNS: &str = "id, title, email, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    title: String,
    email: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresActivityStore {
    repos: PostgresRepositories,
}

impl PostgresActivityStore {
    pub fn new(repos: PostgresRepositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl ResourceStore for PostgresActivityStore {
    type Entity = Activity;
    type Id = i64;
    type Create = CreateActivityParams;
    type Update = UpdateActivityParams;
    type Filter = ActivityFilter;

    async fn create(&self, params: CreateActivityParams) -> Result<Activity, RepoError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            "INSERT INTO activities (title, email) VALUES ($1, $2) RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(params.title)
        .bind(params.email)
        .fetch_one(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_all(&self, options: Option<&ActivityFilter>) -> Result<Vec<Activity>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE TRUE"
        ));

        let default_options = ActivityFilter::default();
        let options = options.unwrap_or(&default_options);

        if let Some(conditions) = options.conditions.as_ref() {
            if let Some(email) = conditions.email.as_ref() {
                qb.push(" AND email = ");
                qb.push_bind(email.clone());
            }
            if let Some(title) = conditions.title.as_ref() {
                qb.push(" AND title = ");
                qb.push_bind(title.clone());
            }
        }
        push_paging(&mut qb, options);

        let rows = qb
            .build_query_as::<ActivityRow>()
            .fetch_all(self.repos.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Activity>, RepoError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Activity::from))
    }

    async fn update(
        &self,
        entity: &Activity,
        params: UpdateActivityParams,
    ) -> Result<Activity, RepoError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            "UPDATE activities \
             SET title = COALESCE($2, title), email = COALESCE($3, email), updated_at = now() \
             WHERE id = $1 \
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(entity.id)
        .bind(params.title)
        .bind(params.email)
        .fetch_one(self.repos.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn destroy(&self, entity: &Activity) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
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
