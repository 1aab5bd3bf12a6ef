//! 任务存储
//!
//! 以注入的存储接口替代进程级全局任务表

use crate::task::{AnalysisTask, TaskFilter, TaskStatus};
use async_trait::async_trait;
use oral_core::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 任务存储接口
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 写入或覆盖任务记录
    async fn put(&self, task: AnalysisTask) -> Result<()>;

    /// 仅当已存储的记录仍处于 `expected` 状态时写入，返回是否写入
    async fn put_if_status(&self, task: AnalysisTask, expected: TaskStatus) -> Result<bool>;

    /// 获取任务记录
    async fn get(&self, task_id: &str) -> Result<Option<AnalysisTask>>;

    /// 删除任务记录，返回被删除的记录
    async fn delete(&self, task_id: &str) -> Result<Option<AnalysisTask>>;

    /// 按条件列出任务，按创建时间倒序
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<AnalysisTask>>;
}

/// 内存任务存储
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, AnalysisTask>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn put(&self, task: AnalysisTask) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.task_id.clone(), task);
        Ok(())
    }

    async fn put_if_status(&self, task: AnalysisTask, expected: TaskStatus) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&task.task_id) {
            Some(current) if current.status == expected => {
                tasks.insert(task.task_id.clone(), task);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, task_id: &str) -> Result<Option<AnalysisTask>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(task_id).cloned())
    }

    async fn delete(&self, task_id: &str) -> Result<Option<AnalysisTask>> {
        let mut tasks = self.tasks.write().await;
        let removed = tasks.remove(task_id);
        if removed.is_some() {
            tracing::info!("Deleted analysis task {}", task_id);
        }
        Ok(removed)
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<AnalysisTask>> {
        let tasks = self.tasks.read().await;
        let mut matched: Vec<AnalysisTask> = tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });

        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use oral_core::AnalysisType;

    fn task(id: &str, patient: &str, minutes_ago: i64) -> AnalysisTask {
        let mut task = AnalysisTask::new(
            id.to_string(),
            AnalysisType::PanoramicSegmentation,
            patient.to_string(),
            None,
        );
        task.created_at = Utc::now() - Duration::minutes(minutes_ago);
        task
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemoryTaskStore::new();
        store.put(task("t1", "P001", 0)).await.unwrap();

        let fetched = store.get("t1").await.unwrap().unwrap();
        assert_eq!(fetched.patient_id, "P001");
        assert!(store.get("missing").await.unwrap().is_none());

        let removed = store.delete("t1").await.unwrap();
        assert!(removed.is_some());
        assert!(store.list(&TaskFilter::default()).await.unwrap().is_empty());
        assert!(store.delete("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryTaskStore::new();
        let mut record = task("t1", "P001", 0);
        store.put(record.clone()).await.unwrap();

        record.status = TaskStatus::Completed;
        store.put(record).await.unwrap();

        assert_eq!(store.list(&TaskFilter::default()).await.unwrap().len(), 1);
        assert_eq!(
            store.get("t1").await.unwrap().unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_put_if_status_only_replaces_expected_state() {
        let store = InMemoryTaskStore::new();
        let mut record = task("t1", "P001", 0);
        assert!(!store
            .put_if_status(record.clone(), TaskStatus::Processing)
            .await
            .unwrap());

        store.put(record.clone()).await.unwrap();
        record.status = TaskStatus::Completed;
        assert!(store
            .put_if_status(record.clone(), TaskStatus::Processing)
            .await
            .unwrap());

        record.status = TaskStatus::Failed;
        assert!(!store
            .put_if_status(record, TaskStatus::Processing)
            .await
            .unwrap());
        assert_eq!(
            store.get("t1").await.unwrap().unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_list_sorted_and_limited() {
        let store = InMemoryTaskStore::new();
        store.put(task("old", "P001", 30)).await.unwrap();
        store.put(task("new", "P001", 1)).await.unwrap();
        store.put(task("mid", "P002", 10)).await.unwrap();

        let all = store.list(&TaskFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        let filtered = store
            .list(&TaskFilter {
                patient_id: Some("P001".to_string()),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].task_id, "new");
    }
}
