//! 核心数据模型定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 发现项严重程度
///
/// 第三方返回的严重程度字符串在解读阶段映射到这六个固定标签之一，
/// 无法映射的值使用保守的默认值，不会被丢弃。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    #[serde(rename = "信息")]
    Info,
    #[serde(rename = "注意")]
    Caution,
    #[serde(rename = "低")]
    Low,
    #[serde(rename = "中等")]
    Medium,
    #[serde(rename = "高")]
    High,
    #[serde(rename = "严重")]
    Critical,
}

impl Severity {
    /// 显示标签
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "信息",
            Severity::Caution => "注意",
            Severity::Low => "低",
            Severity::Medium => "中等",
            Severity::High => "高",
            Severity::Critical => "严重",
        }
    }

    /// 风险评分
    pub fn score(&self) -> u32 {
        match self {
            Severity::Info => 0,
            Severity::Caution | Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// 是否属于高风险（高或严重）
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 整体风险等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    #[serde(rename = "低风险")]
    Low,
    #[serde(rename = "中等风险")]
    Medium,
    #[serde(rename = "高风险")]
    High,
    #[serde(rename = "严重风险")]
    Critical,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "低风险",
            RiskLevel::Medium => "中等风险",
            RiskLevel::High => "高风险",
            RiskLevel::Critical => "严重风险",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 测量数据，用于追溯发现项的数值依据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub name: String,         // 测量项名称 (SNA, SNB, ANB)
    pub value: f64,           // 测量值
    pub normal_range: String, // 正常范围
}

/// 发现项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub confidence: f64,
    pub location: Option<String>,
    pub measurement: Option<Measurement>,
}

impl Finding {
    /// 创建发现项，置信度会被限制在 [0, 1] 区间内
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            severity,
            confidence: clamp_confidence(confidence),
            location: None,
            measurement: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = Some(measurement);
        self
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// 建议类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Treatment, // 治疗
    Followup,  // 随访
    Referral,  // 转诊
}

/// 建议优先级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Urgent, // 紧急
    High,   // 高
    Medium, // 中
    Low,    // 低
}

/// 建议项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub priority: RecommendationPriority,
    pub description: String,
    pub timeline: Option<String>,
}

impl Recommendation {
    pub fn new(
        recommendation_type: RecommendationType,
        priority: RecommendationPriority,
        description: impl Into<String>,
        timeline: Option<&str>,
    ) -> Self {
        Self {
            recommendation_type,
            priority,
            description: description.into(),
            timeline: timeline.map(str::to_string),
        }
    }
}

/// 分析类型
///
/// 每个已知类型对应一个解读策略，未知类型保留原始字符串并使用通用解读。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnalysisType {
    OralClassification,
    Cephalometric17,
    Cephalometric57,
    PanoramicSegmentation,
    LesionDetection,
    StlSegmentation,
    GrowthDirection,
    ModelDownsamplingDisplay,
    ModelDownsamplingSegmentation,
    TeethFeatures,
    Other(String),
}

impl AnalysisType {
    pub fn parse(value: &str) -> Self {
        match value {
            "oral_classification" => AnalysisType::OralClassification,
            "cephalometric_17" => AnalysisType::Cephalometric17,
            "cephalometric_57" => AnalysisType::Cephalometric57,
            "panoramic_segmentation" => AnalysisType::PanoramicSegmentation,
            "lesion_detection" => AnalysisType::LesionDetection,
            "stl_segmentation" => AnalysisType::StlSegmentation,
            "growth_direction" => AnalysisType::GrowthDirection,
            "model_downsampling_display" => AnalysisType::ModelDownsamplingDisplay,
            "model_downsampling_segmentation" => AnalysisType::ModelDownsamplingSegmentation,
            "teeth_features" => AnalysisType::TeethFeatures,
            other => AnalysisType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AnalysisType::OralClassification => "oral_classification",
            AnalysisType::Cephalometric17 => "cephalometric_17",
            AnalysisType::Cephalometric57 => "cephalometric_57",
            AnalysisType::PanoramicSegmentation => "panoramic_segmentation",
            AnalysisType::LesionDetection => "lesion_detection",
            AnalysisType::StlSegmentation => "stl_segmentation",
            AnalysisType::GrowthDirection => "growth_direction",
            AnalysisType::ModelDownsamplingDisplay => "model_downsampling_display",
            AnalysisType::ModelDownsamplingSegmentation => "model_downsampling_segmentation",
            AnalysisType::TeethFeatures => "teeth_features",
            AnalysisType::Other(value) => value,
        }
    }

    /// 是否为3D模型分析
    pub fn is_3d(&self) -> bool {
        matches!(
            self,
            AnalysisType::StlSegmentation
                | AnalysisType::ModelDownsamplingDisplay
                | AnalysisType::ModelDownsamplingSegmentation
                | AnalysisType::TeethFeatures
        )
    }

    /// 服务支持的2D分析类型
    pub fn supported_2d() -> Vec<AnalysisType> {
        vec![
            AnalysisType::OralClassification,
            AnalysisType::Cephalometric17,
            AnalysisType::Cephalometric57,
            AnalysisType::PanoramicSegmentation,
            AnalysisType::LesionDetection,
        ]
    }

    /// 服务支持的3D分析类型
    pub fn supported_3d() -> Vec<AnalysisType> {
        vec![
            AnalysisType::ModelDownsamplingDisplay,
            AnalysisType::ModelDownsamplingSegmentation,
            AnalysisType::TeethFeatures,
            AnalysisType::StlSegmentation,
        ]
    }
}

impl From<String> for AnalysisType {
    fn from(value: String) -> Self {
        AnalysisType::parse(&value)
    }
}

impl From<AnalysisType> for String {
    fn from(value: AnalysisType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 患者上下文
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    pub id: String,
    pub age: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PatientInfo {
    pub fn new(id: impl Into<String>, age: Option<u32>) -> Self {
        Self {
            id: id.into(),
            age,
            extra: serde_json::Map::new(),
        }
    }
}
