//! # 报告解读模块
//!
//! 将第三方AI分析结果转换为结构化的风险评估报告：
//! - 发现项提取：按分析类型解读原始结果
//! - 风险评估：根据严重程度聚合整体风险等级
//! - 建议生成：风险等级与具体发现驱动的诊疗建议
//! - 报告组装：串联以上步骤并计算质量指标

pub mod extractor;
pub mod recommendation;
pub mod report;
pub mod risk;

// 重新导出主要类型
pub use extractor::{FindingExtractor, DEFAULT_CONFIDENCE_THRESHOLD};
pub use recommendation::RecommendationEngine;
pub use report::{
    QualityMetrics, Report, ReportInterpreter, ReportMetadata, ReportSummary,
    RiskAssessmentSection, SummaryOverview, INTERPRETER_VERSION,
};
pub use risk::RiskAssessor;
