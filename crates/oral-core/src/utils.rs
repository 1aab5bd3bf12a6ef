//! 通用工具函数

use crate::models::AnalysisType;
use chrono::Utc;
use uuid::Uuid;

/// 生成分析任务ID
///
/// 格式: `{2d|3d}_{分析类型}_{时间戳}_{患者ID}_{随机后缀}`
pub fn generate_task_id(analysis_type: &AnalysisType, patient_id: &str) -> String {
    let dimension = if analysis_type.is_3d() { "3d" } else { "2d" };
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}_{}",
        dimension,
        analysis_type.as_str(),
        Utc::now().format("%Y%m%d_%H%M%S"),
        patient_id,
        &suffix[..8]
    )
}

/// 验证患者ID格式
pub fn is_valid_patient_id(patient_id: &str) -> bool {
    !patient_id.is_empty()
        && patient_id.len() <= 64
        && patient_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
