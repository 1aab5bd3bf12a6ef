//! 分析任务模型与状态机
//!
//! 管理分析任务从提交到完成或失败的生命周期

use chrono::{DateTime, Utc};
use oral_core::{AnalysisType, OralError, Result};
use oral_interpret::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// 任务状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing, // 处理中
    Completed,  // 已完成
    Failed,     // 失败
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskEvent {
    Succeeded,
    Failed,
}

/// 任务状态机
#[derive(Debug)]
pub struct TaskStateMachine {
    transitions: HashMap<(TaskStatus, TaskEvent), TaskStatus>,
}

impl TaskStateMachine {
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        transitions.insert((TaskStatus::Processing, TaskEvent::Succeeded), TaskStatus::Completed);
        transitions.insert((TaskStatus::Processing, TaskEvent::Failed), TaskStatus::Failed);

        Self { transitions }
    }

    /// 执行状态转换
    pub fn transition(&self, from: TaskStatus, event: TaskEvent) -> Result<TaskStatus> {
        self.transitions
            .get(&(from, event))
            .copied()
            .ok_or_else(|| OralError::InvalidStateTransition {
                from: from.to_string(),
                event: format!("{:?}", event),
            })
    }
}

impl Default for TaskStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// 分析任务记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisTask {
    pub task_id: String,
    pub analysis_type: AnalysisType,
    pub patient_id: String,
    pub examination_id: Option<String>,
    pub status: TaskStatus,
    pub third_party_result: Option<Value>, // 第三方AI原始结果
    pub interpreted_report: Option<Report>,
    pub error_message: Option<String>,
    pub processing_time: Option<f64>, // 秒
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisTask {
    /// 创建处理中的任务
    pub fn new(
        task_id: String,
        analysis_type: AnalysisType,
        patient_id: String,
        examination_id: Option<String>,
    ) -> Self {
        Self {
            task_id,
            analysis_type,
            patient_id,
            examination_id,
            status: TaskStatus::Processing,
            third_party_result: None,
            interpreted_report: None,
            error_message: None,
            processing_time: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// 任务查询过滤器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub patient_id: Option<String>,
    pub analysis_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn matches(&self, task: &AnalysisTask) -> bool {
        if let Some(patient_id) = &self.patient_id {
            if &task.patient_id != patient_id {
                return false;
            }
        }
        if let Some(analysis_type) = &self.analysis_type {
            if task.analysis_type.as_str() != analysis_type {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = TaskStateMachine::new();
        assert_eq!(
            sm.transition(TaskStatus::Processing, TaskEvent::Succeeded).unwrap(),
            TaskStatus::Completed
        );
        assert_eq!(
            sm.transition(TaskStatus::Processing, TaskEvent::Failed).unwrap(),
            TaskStatus::Failed
        );
    }

    #[test]
    fn test_terminal_states_reject_events() {
        let sm = TaskStateMachine::new();
        assert!(sm.transition(TaskStatus::Completed, TaskEvent::Failed).is_err());
        assert!(sm.transition(TaskStatus::Failed, TaskEvent::Succeeded).is_err());
        assert!(matches!(
            sm.transition(TaskStatus::Completed, TaskEvent::Succeeded),
            Err(OralError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_filter_matching() {
        let task = AnalysisTask::new(
            "t1".to_string(),
            AnalysisType::LesionDetection,
            "P001".to_string(),
            None,
        );

        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter {
            patient_id: Some("P001".to_string()),
            analysis_type: Some("lesion_detection".to_string()),
            status: Some(TaskStatus::Processing),
            limit: None,
        }
        .matches(&task));
        assert!(!TaskFilter {
            status: Some(TaskStatus::Failed),
            ..Default::default()
        }
        .matches(&task));
        assert!(!TaskFilter {
            patient_id: Some("P002".to_string()),
            ..Default::default()
        }
        .matches(&task));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
