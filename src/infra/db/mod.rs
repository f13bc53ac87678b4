//! Postgres-backed resource stores.

mod activities;
mod todos;
mod util;

pub use activities::PostgresActivityStore;
pub use todos::PostgresTodoStore;
pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
};

use crate::application::repos::{FindOptions, OrderField};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub fn activities(&self) -> PostgresActivityStore {
        PostgresActivityStore::new(self.clone())
    }

    pub fn todos(&self) -> PostgresTodoStore {
        PostgresTodoStore::new(self.clone())
    }
}

/// Append `ORDER BY`, `LIMIT` and `OFFSET` for the given options. Rows fall back to id order so
/// paging stays stable.
fn push_paging<W, F: OrderField>(
    qb: &mut QueryBuilder<'_, Postgres>,
    options: &FindOptions<W, F>,
) {
    qb.push(" ORDER BY ");
    for (field, direction) in &options.order_by {
        qb.push(field.column());
        qb.push(" ");
        qb.push(direction.as_str());
        qb.push(", ");
    }
    qb.push("id ASC");

    if let Some(take) = options.take {
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(take));
    }
    if let Some(skip) = options.skip {
        qb.push(" OFFSET ");
        qb.push_bind(i64::from(skip));
    }
}
