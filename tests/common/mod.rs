//! In-memory backing stores and cache doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;
use todo_service::application::repos::{
    ActivityFilter, CreateActivityParams, CreateTodoParams, FindOptions, RepoError, ResourceStore,
    TodoFilter, UpdateActivityParams, UpdateTodoParams,
};
use todo_service::cache::{CacheError, CacheStore};
use todo_service::domain::activities::Activity;
use todo_service::domain::todos::Todo;

const CREATED_AT: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

#[derive(Default)]
pub struct CallCounts {
    pub create: AtomicUsize,
    pub find_all: AtomicUsize,
    pub find_by_pk: AtomicUsize,
    pub update: AtomicUsize,
    pub destroy: AtomicUsize,
}

impl CallCounts {
    pub fn find_all(&self) -> usize {
        self.find_all.load(Ordering::SeqCst)
    }

    pub fn find_by_pk(&self) -> usize {
        self.find_by_pk.load(Ordering::SeqCst)
    }
}

fn page<T, W, F>(rows: Vec<T>, options: Option<&FindOptions<W, F>>) -> Vec<T> {
    let skip = options.and_then(|o| o.skip).unwrap_or(0) as usize;
    let take = options
        .and_then(|o| o.take)
        .map_or(usize::MAX, |take| take as usize);
    rows.into_iter().skip(skip).take(take).collect()
}

#[derive(Default)]
pub struct InMemoryActivityStore {
    rows: Mutex<Vec<Activity>>,
    next_id: AtomicI64,
    pub calls: CallCounts,
}

#[async_trait]
impl ResourceStore for InMemoryActivityStore {
    type Entity = Activity;
    type Id = i64;
    type Create = CreateActivityParams;
    type Update = UpdateActivityParams;
    type Filter = ActivityFilter;

    async fn create(&self, params: CreateActivityParams) -> Result<Activity, RepoError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let activity = Activity {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: params.title,
            email: params.email,
            created_at: CREATED_AT,
            updated_at: CREATED_AT,
        };
        self.rows.lock().unwrap().push(activity.clone());
        Ok(activity)
    }

    async fn find_all(&self, options: Option<&ActivityFilter>) -> Result<Vec<Activity>, RepoError> {
        self.calls.find_all.fetch_add(1, Ordering::SeqCst);
        let conditions = options.and_then(|o| o.conditions.clone()).unwrap_or_default();
        let rows = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| conditions.email.as_ref().is_none_or(|email| &row.email == email))
            .filter(|row| conditions.title.as_ref().is_none_or(|title| &row.title == title))
            .cloned()
            .collect();
        Ok(page(rows, options))
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Activity>, RepoError> {
        self.calls.find_by_pk.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn update(
        &self,
        entity: &Activity,
        params: UpdateActivityParams,
    ) -> Result<Activity, RepoError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            row.title = title;
        }
        if let Some(email) = params.email {
            row.email = email;
        }
        Ok(row.clone())
    }

    async fn destroy(&self, entity: &Activity) -> Result<(), RepoError> {
        self.calls.destroy.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != entity.id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTodoStore {
    rows: Mutex<Vec<Todo>>,
    next_id: AtomicI64,
    pub calls: CallCounts,
}

#[async_trait]
impl ResourceStore for InMemoryTodoStore {
    type Entity = Todo;
    type Id = i64;
    type Create = CreateTodoParams;
    type Update = UpdateTodoParams;
    type Filter = TodoFilter;

    async fn create(&self, params: CreateTodoParams) -> Result<Todo, RepoError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let todo = Todo {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            activity_group_id: params.activity_group_id,
            title: params.title,
            is_active: params.is_active,
            priority: params.priority,
            created_at: CREATED_AT,
            updated_at: CREATED_AT,
        };
        self.rows.lock().unwrap().push(todo.clone());
        Ok(todo)
    }

    async fn find_all(&self, options: Option<&TodoFilter>) -> Result<Vec<Todo>, RepoError> {
        self.calls.find_all.fetch_add(1, Ordering::SeqCst);
        let conditions = options.and_then(|o| o.conditions.clone()).unwrap_or_default();
        let rows = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                conditions
                    .activity_group_id
                    .is_none_or(|id| row.activity_group_id == id)
            })
            .filter(|row| conditions.is_active.is_none_or(|flag| row.is_active == flag))
            .filter(|row| conditions.priority.is_none_or(|p| row.priority == p))
            .cloned()
            .collect();
        Ok(page(rows, options))
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Todo>, RepoError> {
        self.calls.find_by_pk.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn update(&self, entity: &Todo, params: UpdateTodoParams) -> Result<Todo, RepoError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        if let Some(activity_group_id) = params.activity_group_id {
            row.activity_group_id = activity_group_id;
        }
        if let Some(title) = params.title {
            row.title = title;
        }
        if let Some(is_active) = params.is_active {
            row.is_active = is_active;
        }
        if let Some(priority) = params.priority {
            row.priority = priority;
        }
        Ok(row.clone())
    }

    async fn destroy(&self, entity: &Todo) -> Result<(), RepoError> {
        self.calls.destroy.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != entity.id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Delegates to an inner store but cannot enumerate keys.
pub struct NoKeysCache<C>(pub C);

#[async_trait]
impl<C: CacheStore> CacheStore for NoKeysCache<C> {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.0.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.0.del(key).await
    }
}

/// Every operation fails.
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    fn fail<T>(&self) -> Result<T, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }
}

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
        self.fail()
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        self.fail()
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.fail()
    }
}

/// Delegates to an inner store; the first `failures` deletes fail.
pub struct FlakyDeleteCache<C> {
    inner: C,
    failures: AtomicUsize,
}

impl<C> FlakyDeleteCache<C> {
    pub fn new(inner: C, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl<C: CacheStore> CacheStore for FlakyDeleteCache<C> {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let remaining = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(CacheError::backend("delete rejected"));
        }
        self.inner.del(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }
}
