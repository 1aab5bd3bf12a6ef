//! 分析任务处理
//!
//! 为每个上传资产创建任务记录，调用报告解读并把成功或失败结果写回存储

use crate::store::TaskStore;
use crate::task::{AnalysisTask, TaskEvent, TaskFilter, TaskStateMachine, TaskStatus};
use chrono::Utc;
use oral_core::utils::{generate_task_id, is_valid_patient_id};
use oral_core::{AnalysisType, OralError, PatientInfo, Result};
use oral_interpret::ReportInterpreter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// 分析提交请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub analysis_type: String,
    pub patient_id: String,
    pub patient_age: Option<u32>,
    pub examination_id: Option<String>,
}

impl AnalysisRequest {
    pub fn patient_info(&self) -> PatientInfo {
        PatientInfo::new(self.patient_id.clone(), self.patient_age)
    }
}

/// 分析任务处理器
pub struct AnalysisProcessor {
    store: Arc<dyn TaskStore>,
    interpreter: Arc<ReportInterpreter>,
    state_machine: TaskStateMachine,
    default_list_limit: usize,
}

impl AnalysisProcessor {
    pub fn new(store: Arc<dyn TaskStore>, interpreter: Arc<ReportInterpreter>) -> Self {
        Self {
            store,
            interpreter,
            state_machine: TaskStateMachine::new(),
            default_list_limit: 50,
        }
    }

    pub fn with_default_list_limit(mut self, limit: usize) -> Self {
        self.default_list_limit = limit;
        self
    }

    pub fn interpreter(&self) -> &ReportInterpreter {
        &self.interpreter
    }

    /// 提交分析任务，返回处理中的任务记录
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisTask> {
        if request.patient_id.trim().is_empty() {
            return Err(OralError::Validation("患者ID不能为空".to_string()));
        }
        if !is_valid_patient_id(&request.patient_id) {
            return Err(OralError::Validation(format!(
                "患者ID只能包含字母、数字、'-'和'_': {}",
                request.patient_id
            )));
        }

        let analysis_type = AnalysisType::parse(&request.analysis_type);
        let task = AnalysisTask::new(
            generate_task_id(&analysis_type, &request.patient_id),
            analysis_type,
            request.patient_id.clone(),
            request.examination_id.clone(),
        );

        self.store.put(task.clone()).await?;
        tracing::info!(
            "启动分析任务: {}, 类型: {}",
            task.task_id,
            task.analysis_type
        );
        Ok(task)
    }

    /// 使用第三方结果完成任务
    ///
    /// 解读失败不会向调用方返回错误，而是记录为失败状态的任务。
    pub async fn complete(
        &self,
        task_id: &str,
        raw_result: Value,
        patient: &PatientInfo,
    ) -> Result<AnalysisTask> {
        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or_else(|| OralError::NotFound(format!("分析任务 {} 不存在", task_id)))?;

        let previous = task.status;
        let start = Instant::now();
        let outcome = self
            .interpreter
            .build_report(&raw_result, task.analysis_type.as_str(), patient);
        let processing_time = start.elapsed().as_secs_f64();

        let event = match outcome {
            Ok(report) => {
                task.interpreted_report = Some(report);
                TaskEvent::Succeeded
            }
            Err(e) => {
                task.error_message = Some(e.to_string());
                TaskEvent::Failed
            }
        };
        task.status = self.state_machine.transition(previous, event)?;
        task.third_party_result = Some(raw_result);
        task.processing_time = Some(processing_time);
        task.completed_at = Some(Utc::now());

        // 读取与写回之间任务可能已被其他调用完成
        if !self.store.put_if_status(task.clone(), previous).await? {
            return Err(OralError::InvalidStateTransition {
                from: previous.to_string(),
                event: format!("{:?}", event),
            });
        }

        match &task.error_message {
            None => tracing::info!(
                "分析任务完成: {}, 耗时: {:.3}秒",
                task_id,
                processing_time
            ),
            Some(e) => tracing::error!("分析任务失败: {}, 错误: {}", task_id, e),
        }
        Ok(task)
    }

    /// 提交并立即完成任务
    pub async fn process(
        &self,
        request: &AnalysisRequest,
        raw_result: Value,
    ) -> Result<AnalysisTask> {
        let task = self.submit(request).await?;
        self.complete(&task.task_id, raw_result, &request.patient_info())
            .await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<AnalysisTask> {
        self.store
            .get(task_id)
            .await?
            .ok_or_else(|| OralError::NotFound(format!("分析任务 {} 不存在", task_id)))
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<AnalysisTask> {
        self.store
            .delete(task_id)
            .await?
            .ok_or_else(|| OralError::NotFound(format!("分析任务 {} 不存在", task_id)))
    }

    /// 列出任务，未指定条数时使用默认上限
    pub async fn list_tasks(&self, mut filter: TaskFilter) -> Result<Vec<AnalysisTask>> {
        if filter.limit.is_none() {
            filter.limit = Some(self.default_list_limit);
        }
        self.store.list(&filter).await
    }

    /// 统计各状态的任务数
    pub async fn count_by_status(&self, status: TaskStatus) -> Result<usize> {
        let filter = TaskFilter {
            status: Some(status),
            ..Default::default()
        };
        Ok(self.store.list(&filter).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use oral_core::config::InterpreterConfig;
    use oral_core::RiskLevel;
    use serde_json::json;

    fn processor() -> AnalysisProcessor {
        AnalysisProcessor::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(ReportInterpreter::new(&InterpreterConfig::default())),
        )
    }

    fn request(analysis_type: &str) -> AnalysisRequest {
        AnalysisRequest {
            analysis_type: analysis_type.to_string(),
            patient_id: "P001".to_string(),
            patient_age: Some(8),
            examination_id: Some("E001".to_string()),
        }
    }

    #[tokio::test]
    async fn test_successful_processing() {
        let processor = processor();
        let raw = json!({"data": {"teeth": {
            "15": {"condition": "deep_caries", "confidence": 0.9}
        }}});

        let task = processor
            .process(&request("panoramic_segmentation"), raw.clone())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.task_id.starts_with("2d_panoramic_segmentation_"));
        assert_eq!(task.third_party_result, Some(raw));
        assert!(task.completed_at.is_some());
        assert!(task.error_message.is_none());

        let report = task.interpreted_report.as_ref().unwrap();
        assert_eq!(report.summary.overall_risk, RiskLevel::High);

        let stored = processor.get_task(&task.task_id).await.unwrap();
        assert_eq!(stored, task);
    }

    #[tokio::test]
    async fn test_malformed_result_marks_task_failed() {
        let processor = processor();
        let task = processor
            .process(&request("lesion_detection"), json!([1, 2]))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.interpreted_report.is_none());
        assert!(task.error_message.as_ref().unwrap().contains("JSON对象"));
        assert_eq!(processor.count_by_status(TaskStatus::Failed).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_completed_task_cannot_be_completed_again() {
        let processor = processor();
        let task = processor
            .process(&request("oral_classification"), json!({"data": {"confidence": 0.9}}))
            .await
            .unwrap();

        let err = processor
            .complete(&task.task_id, json!({}), &PatientInfo::new("P001", None))
            .await
            .unwrap_err();
        assert!(matches!(err, OralError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_unknown_task_and_delete() {
        let processor = processor();
        assert!(matches!(
            processor.get_task("missing").await,
            Err(OralError::NotFound(_))
        ));

        let task = processor.submit(&request("teeth_features")).await.unwrap();
        assert!(task.task_id.starts_with("3d_teeth_features_"));
        assert_eq!(task.status, TaskStatus::Processing);

        processor.delete_task(&task.task_id).await.unwrap();
        assert!(processor.delete_task(&task.task_id).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_patient_id_rejected() {
        let processor = processor();
        let mut req = request("lesion_detection");
        req.patient_id = "  ".to_string();
        assert!(matches!(
            processor.submit(&req).await,
            Err(OralError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_patient_id_with_path_characters_rejected() {
        let processor = processor();
        for patient_id in ["../a/b c", "P001/extra", "P 001"] {
            let mut req = request("lesion_detection");
            req.patient_id = patient_id.to_string();
            assert!(matches!(
                processor.submit(&req).await,
                Err(OralError::Validation(_))
            ));
        }
        assert!(processor
            .list_tasks(TaskFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_completion_succeeds_once() {
        let processor = processor();
        let task = processor.submit(&request("lesion_detection")).await.unwrap();
        let patient = PatientInfo::new("P001", Some(8));
        let raw = json!({"data": {"lesions": []}});

        let (first, second) = tokio::join!(
            processor.complete(&task.task_id, raw.clone(), &patient),
            processor.complete(&task.task_id, raw.clone(), &patient),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(OralError::InvalidStateTransition { .. }))));
        assert_eq!(
            processor.get_task(&task.task_id).await.unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_list_uses_default_limit() {
        let processor = processor().with_default_list_limit(2);
        for _ in 0..3 {
            processor.submit(&request("lesion_detection")).await.unwrap();
        }
        let tasks = processor.list_tasks(TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);
    }
}
