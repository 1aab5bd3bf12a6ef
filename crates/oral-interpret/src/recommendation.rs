//! 建议生成
//!
//! 结合风险等级和具体发现项生成有序的诊疗建议

use oral_core::{
    Finding, PatientInfo, Recommendation, RecommendationPriority, RecommendationType, RiskLevel,
    Severity,
};

/// 建议生成引擎
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成建议
    ///
    /// 顺序固定：风险等级驱动的转诊建议、逐项发现建议、通用随访建议。
    pub fn recommend(
        &self,
        findings: &[Finding],
        risk: RiskLevel,
        patient: &PatientInfo,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if risk == RiskLevel::Critical {
            recommendations.push(Recommendation::new(
                RecommendationType::Referral,
                RecommendationPriority::Urgent,
                "建议立即转诊至专科医院进行进一步评估和治疗",
                Some("立即"),
            ));
        }

        for finding in findings {
            recommendations.extend(self.finding_recommendations(finding, patient));
        }

        if matches!(risk, RiskLevel::Medium | RiskLevel::High) {
            recommendations.push(Recommendation::new(
                RecommendationType::Followup,
                RecommendationPriority::Medium,
                "建议3-6个月后复查，监测病情进展",
                Some("3-6个月"),
            ));
        }

        recommendations
    }

    fn finding_recommendations(
        &self,
        finding: &Finding,
        _patient: &PatientInfo,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if finding.description.contains("龋齿")
            || finding.description.to_lowercase().contains("caries")
        {
            recommendations.push(Recommendation::new(
                RecommendationType::Treatment,
                RecommendationPriority::Medium,
                "建议及时进行充填治疗，防止龋坏进一步发展",
                Some("2-4周内"),
            ));
        }

        if finding.description.contains("缺失") {
            recommendations.push(Recommendation::new(
                RecommendationType::Treatment,
                RecommendationPriority::Low,
                "评估是否需要间隙维持或修复治疗",
                Some("1-3个月内"),
            ));
        }

        if finding.severity == Severity::Critical {
            recommendations.push(Recommendation::new(
                RecommendationType::Referral,
                RecommendationPriority::High,
                format!("针对{}问题，建议转诊专科医生", finding.category),
                Some("1-2周内"),
            ));
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> PatientInfo {
        PatientInfo::new("P001", Some(8))
    }

    #[test]
    fn test_low_risk_without_triggers_is_empty() {
        let findings = vec![Finding::new("图像质量", "识别为正面图像", Severity::Info, 0.9)];
        let recs = RecommendationEngine::new().recommend(&findings, RiskLevel::Low, &patient());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_critical_ordering() {
        let findings = vec![Finding::new(
            "病变检测",
            "在未指定位置发现caries",
            Severity::Critical,
            0.9,
        )];
        let recs =
            RecommendationEngine::new().recommend(&findings, RiskLevel::Critical, &patient());

        let kinds: Vec<_> = recs
            .iter()
            .map(|r| (r.recommendation_type, r.priority))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (RecommendationType::Referral, RecommendationPriority::Urgent),
                (RecommendationType::Treatment, RecommendationPriority::Medium),
                (RecommendationType::Referral, RecommendationPriority::High),
            ]
        );
        assert_eq!(recs[2].description, "针对病变检测问题，建议转诊专科医生");
    }

    #[test]
    fn test_multiple_triggers_and_followup() {
        let findings = vec![
            Finding::new("牙齿状况", "牙齿15: Caries", Severity::Medium, 0.9),
            Finding::new("牙齿缺失", "检测到2颗缺失牙: 11, 21", Severity::Medium, 0.9),
            Finding::new("口腔检查", "疑似龋齿且缺失邻牙", Severity::Medium, 0.9),
        ];
        let recs = RecommendationEngine::new().recommend(&findings, RiskLevel::High, &patient());

        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].timeline.as_deref(), Some("2-4周内"));
        assert_eq!(recs[1].timeline.as_deref(), Some("1-3个月内"));
        assert_eq!(recs[2].recommendation_type, RecommendationType::Treatment);
        assert_eq!(recs[3].priority, RecommendationPriority::Low);
        assert_eq!(recs[4].recommendation_type, RecommendationType::Followup);
    }

    #[test]
    fn test_medium_risk_gets_followup_only() {
        let findings = vec![Finding::new(
            "颅面关系",
            "SNA角度偏大(90°)，提示上颌前突",
            Severity::Medium,
            0.9,
        )];
        let recs = RecommendationEngine::new().recommend(&findings, RiskLevel::Medium, &patient());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].recommendation_type, RecommendationType::Followup);
        assert_eq!(recs[0].timeline.as_deref(), Some("3-6个月"));
    }
}
