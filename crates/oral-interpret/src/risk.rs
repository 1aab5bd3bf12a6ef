//! 风险评估
//!
//! 根据发现项严重程度的最高分和总分推导整体风险等级

use oral_core::{Finding, RiskLevel};

/// 风险评估器
#[derive(Debug, Clone, Default)]
pub struct RiskAssessor;

impl RiskAssessor {
    pub fn new() -> Self {
        Self
    }

    /// 评估整体风险等级
    pub fn assess(&self, findings: &[Finding]) -> RiskLevel {
        let max_score = findings
            .iter()
            .map(|f| f.severity.score())
            .max()
            .unwrap_or(0);
        let total_score: u32 = findings.iter().map(|f| f.severity.score()).sum();

        if max_score >= 4 {
            RiskLevel::Critical
        } else if max_score >= 3 || total_score >= 6 {
            RiskLevel::High
        } else if max_score >= 2 || total_score >= 3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// 提取风险因素（高或严重发现项）
    pub fn risk_factors(&self, findings: &[Finding]) -> Vec<String> {
        findings
            .iter()
            .filter(|f| f.severity.is_high_risk())
            .map(|f| format!("{}: {}", f.category, f.description))
            .collect()
    }
}
