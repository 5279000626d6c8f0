use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::de::DeserializeOwned;
use shared::{MonthlyAnalytics, Task};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskChanges, TaskDraft, TaskFilter, TaskStore};

const CREATION_INDEX: &str = "tasks:created";
const SEQUENCE_KEY: &str = "tasks:sequence";
const ANALYTICS_HASH: &str = "analytics:monthly";

/// Redis-backed store.
///
/// Each task is a JSON string under `task:{id}`; the sorted set
/// `tasks:created` scores ids by an insert counter (`tasks:sequence`), and
/// listings are then stably sorted by `createdAt`, so equal timestamps keep
/// insertion order. Analytics rows live in one hash keyed by `YYYY-MM`.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub fn open(url: &str) -> StoreResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
        })
    }

    async fn connection(&self) -> StoreResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Round-trips a PING so startup fails fast on a bad URL.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn load_task(conn: &mut MultiplexedConnection, id: Uuid) -> StoreResult<Option<Task>> {
        let key = task_key(id);
        let json: Option<String> = conn.get(&key).await?;
        json.map(|json| decode(&key, &json)).transpose()
    }

    /// `SET .. XX`: overwrites an existing record only. Returns `false` when
    /// the key is gone, so a concurrent delete is never undone.
    async fn replace_task(conn: &mut MultiplexedConnection, task: &Task) -> StoreResult<bool> {
        let json = serde_json::to_string(task).map_err(StoreError::Encode)?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(task_key(task.id))
            .arg(json)
            .arg("XX")
            .query_async(conn)
            .await?;
        Ok(reply.is_some())
    }
}

fn task_key(id: Uuid) -> String {
    format!("task:{id}")
}

fn period_field(record: &MonthlyAnalytics) -> String {
    format!("{:04}-{:02}", record.year, record.month)
}

fn decode<T: DeserializeOwned>(key: &str, json: &str) -> StoreResult<T> {
    serde_json::from_str(json).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })
}

#[async_trait]
impl TaskStore for RedisStore {
    async fn find_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.zrange(CREATION_INDEX, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("task:{id}")).collect();
        let values: Vec<Option<String>> = conn.mget(&keys).await?;

        let mut tasks = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            match value {
                Some(json) => {
                    let task: Task = decode(key, &json)?;
                    if filter.matches(&task) {
                        tasks.push(task);
                    }
                }
                None => warn!(%key, "creation index points at a missing task"),
            }
        }
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut conn = self.connection().await?;
        Self::load_task(&mut conn, id).await
    }

    async fn insert_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        let task = draft.into_task(Uuid::new_v4(), Utc::now());
        let json = serde_json::to_string(&task).map_err(StoreError::Encode)?;

        let mut conn = self.connection().await?;
        let sequence: i64 = conn.incr(SEQUENCE_KEY, 1).await?;
        redis::pipe()
            .atomic()
            .set(task_key(task.id), json)
            .ignore()
            .zadd(CREATION_INDEX, task.id.to_string(), sequence)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(id = %task.id, "task stored");
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut conn = self.connection().await?;
        let Some(mut task) = Self::load_task(&mut conn, id).await? else {
            return Ok(None);
        };
        changes.apply(&mut task, Utc::now());
        if !Self::replace_task(&mut conn, &task).await? {
            debug!(%id, "task deleted during update");
            return Ok(None);
        }
        Ok(Some(task))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut conn = self.connection().await?;
        let Some(task) = Self::load_task(&mut conn, id).await? else {
            return Ok(None);
        };
        redis::pipe()
            .atomic()
            .del(task_key(id))
            .ignore()
            .zrem(CREATION_INDEX, id.to_string())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(Some(task))
    }

    async fn clear_tasks(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.zrange(CREATION_INDEX, 0, -1).await?;
        let mut keys: Vec<String> = ids.iter().map(|id| format!("task:{id}")).collect();
        keys.push(CREATION_INDEX.to_string());
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn monthly_analytics(&self) -> StoreResult<Vec<MonthlyAnalytics>> {
        let mut conn = self.connection().await?;
        let values: Vec<String> = conn.hvals(ANALYTICS_HASH).await?;
        values
            .iter()
            .map(|json| decode(ANALYTICS_HASH, json))
            .collect()
    }

    async fn upsert_monthly_analytics(&self, record: MonthlyAnalytics) -> StoreResult<()> {
        let json = serde_json::to_string(&record).map_err(StoreError::Encode)?;
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(ANALYTICS_HASH, period_field(&record), json)
            .await?;
        Ok(())
    }

    async fn clear_monthly_analytics(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(ANALYTICS_HASH).await?;
        Ok(())
    }
}
