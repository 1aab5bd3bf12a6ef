//! 报告组装
//!
//! 串联发现项提取、风险评估和建议生成，输出结构化的解读报告

use crate::extractor::FindingExtractor;
use crate::recommendation::RecommendationEngine;
use crate::risk::RiskAssessor;
use chrono::{DateTime, Utc};
use oral_core::config::InterpreterConfig;
use oral_core::{AnalysisType, Finding, PatientInfo, Recommendation, Result, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 解读器版本
pub const INTERPRETER_VERSION: &str = "2.0.0";

/// 报告摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub overall_risk: RiskLevel,
    pub key_findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub followup_needed: bool,
    pub emergency_referral: bool,
}

/// 摘要概览（序列化形式）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryOverview {
    pub overall_risk: RiskLevel,
    pub key_findings_count: usize,
    pub recommendations_count: usize,
    pub followup_needed: bool,
    pub emergency_referral: bool,
}

impl From<&ReportSummary> for SummaryOverview {
    fn from(summary: &ReportSummary) -> Self {
        Self {
            overall_risk: summary.overall_risk,
            key_findings_count: summary.key_findings.len(),
            recommendations_count: summary.recommendations.len(),
            followup_needed: summary.followup_needed,
            emergency_referral: summary.emergency_referral,
        }
    }
}

/// 风险评估段落
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessmentSection {
    pub overall_level: RiskLevel,
    pub factors: Vec<String>,
}

/// 质量指标
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub confidence_score: f64,
    pub data_completeness: f64,
}

/// 报告元数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    pub interpreter_version: String,
    pub processing_time: DateTime<Utc>,
}

/// 解读报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub analysis_type: AnalysisType,
    pub patient_id: String,
    pub analysis_date: DateTime<Utc>,
    pub summary: SummaryOverview,
    pub detailed_findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub risk_assessment: RiskAssessmentSection,
    pub quality_metrics: QualityMetrics,
    pub metadata: ReportMetadata,
}

/// 报告解读器
///
/// 无内部可变状态，可通过 `Arc` 在多个任务间共享。
#[derive(Debug, Clone, Default)]
pub struct ReportInterpreter {
    extractor: FindingExtractor,
    risk_assessor: RiskAssessor,
    recommendation_engine: RecommendationEngine,
}

impl ReportInterpreter {
    /// 创建新的解读器
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            extractor: FindingExtractor::new(config.confidence_threshold),
            risk_assessor: RiskAssessor::new(),
            recommendation_engine: RecommendationEngine::new(),
        }
    }

    /// 解读分析结果并生成报告
    pub fn build_report(
        &self,
        raw_result: &Value,
        analysis_type: &str,
        patient: &PatientInfo,
    ) -> Result<Report> {
        let analysis_type = AnalysisType::parse(analysis_type);
        tracing::info!("开始解读分析结果: {}", analysis_type);

        let summary = match self.summarize(raw_result, &analysis_type, patient) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("报告解读失败: {}", e);
                return Err(e);
            }
        };

        let now = Utc::now();
        let report = Report {
            analysis_type: analysis_type.clone(),
            patient_id: patient.id.clone(),
            analysis_date: now,
            summary: SummaryOverview::from(&summary),
            risk_assessment: RiskAssessmentSection {
                overall_level: summary.overall_risk,
                factors: self.risk_assessor.risk_factors(&summary.key_findings),
            },
            quality_metrics: QualityMetrics {
                confidence_score: average_confidence(&summary.key_findings),
                data_completeness: data_completeness(raw_result),
            },
            metadata: ReportMetadata {
                interpreter_version: INTERPRETER_VERSION.to_string(),
                processing_time: Utc::now(),
            },
            detailed_findings: summary.key_findings,
            recommendations: summary.recommendations,
        };

        tracing::info!(
            "报告解读完成: {} (risk={}, findings={}, recommendations={})",
            analysis_type,
            report.summary.overall_risk,
            report.summary.key_findings_count,
            report.summary.recommendations_count
        );
        Ok(report)
    }

    /// 生成报告摘要
    pub fn summarize(
        &self,
        raw_result: &Value,
        analysis_type: &AnalysisType,
        patient: &PatientInfo,
    ) -> Result<ReportSummary> {
        let findings = self.extractor.extract(raw_result, analysis_type, patient)?;
        let overall_risk = self.risk_assessor.assess(&findings);
        let recommendations = self
            .recommendation_engine
            .recommend(&findings, overall_risk, patient);

        Ok(ReportSummary {
            overall_risk,
            followup_needed: findings.iter().any(|f| f.severity.is_high_risk()),
            emergency_referral: findings
                .iter()
                .any(|f| f.severity == oral_core::Severity::Critical),
            key_findings: findings,
            recommendations,
        })
    }
}

/// 平均置信度，无发现项时为0
pub fn average_confidence(findings: &[Finding]) -> f64 {
    if findings.is_empty() {
        return 0.0;
    }
    findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64
}

/// 数据完整性评估
pub fn data_completeness(raw_result: &Value) -> f64 {
    match raw_result.get("data") {
        Some(data) if is_present(data) => 0.9,
        _ => 0.5,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
