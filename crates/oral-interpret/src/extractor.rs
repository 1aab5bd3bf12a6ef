//! 发现项提取
//!
//! 按分析类型选择解读策略，将第三方AI返回的原始结果转换为统一的发现项列表

use oral_core::{AnalysisType, Finding, Measurement, OralError, PatientInfo, Result, Severity};
use serde_json::{Map, Value};

/// 默认最低置信度阈值
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// 口腔分类图像质量下限
const IMAGE_QUALITY_FLOOR: f64 = 0.8;

/// 头影测量角度规则
struct AngleRule {
    name: &'static str,
    lower: f64,
    upper: f64,
    normal_range: &'static str,
    category: &'static str,
    severity: Severity,
    confidence: f64,
    below: (&'static str, &'static str), // (措辞, 提示)
    above: (&'static str, &'static str),
}

const CEPHALOMETRIC_RULES: [AngleRule; 3] = [
    AngleRule {
        name: "SNA",
        lower: 78.0,
        upper: 84.0,
        normal_range: "78-84°",
        category: "颅面关系",
        severity: Severity::Medium,
        confidence: 0.9,
        below: ("偏小", "上颌后退"),
        above: ("偏大", "上颌前突"),
    },
    AngleRule {
        name: "SNB",
        lower: 76.0,
        upper: 82.0,
        normal_range: "76-82°",
        category: "颅面关系",
        severity: Severity::Medium,
        confidence: 0.9,
        below: ("偏小", "下颌后退"),
        above: ("偏大", "下颌前突"),
    },
    AngleRule {
        name: "ANB",
        lower: 0.0,
        upper: 6.0,
        normal_range: "2-4°",
        category: "颌骨关系",
        severity: Severity::High,
        confidence: 0.95,
        below: ("为负值", "III类骨性关系"),
        above: ("偏大", "II类骨性关系"),
    },
];

/// 发现项提取器
#[derive(Debug, Clone)]
pub struct FindingExtractor {
    confidence_threshold: f64,
}

impl FindingExtractor {
    /// 创建新的提取器
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// 提取发现项
    ///
    /// 仅当原始结果不是JSON对象时返回错误；缺失的可选字段不产生发现项。
    pub fn extract(
        &self,
        raw_result: &Value,
        analysis_type: &AnalysisType,
        patient: &PatientInfo,
    ) -> Result<Vec<Finding>> {
        let results = raw_result.as_object().ok_or_else(|| {
            OralError::MalformedInput(format!(
                "{} 分析结果必须是JSON对象",
                analysis_type
            ))
        })?;

        tracing::debug!(
            "Extracting findings for {} (patient {}, age {:?})",
            analysis_type,
            patient.id,
            patient.age
        );

        let data = results.get("data").and_then(Value::as_object);

        let findings = match analysis_type {
            AnalysisType::OralClassification => {
                data.map(|d| self.oral_classification(d, patient)).unwrap_or_default()
            }
            AnalysisType::Cephalometric17 | AnalysisType::Cephalometric57 => {
                data.map(|d| self.cephalometric(d, patient)).unwrap_or_default()
            }
            AnalysisType::PanoramicSegmentation => {
                data.map(|d| self.panoramic_segmentation(d, patient)).unwrap_or_default()
            }
            AnalysisType::LesionDetection => {
                data.map(|d| self.lesion_detection(d, patient)).unwrap_or_default()
            }
            AnalysisType::StlSegmentation
            | AnalysisType::GrowthDirection
            | AnalysisType::ModelDownsamplingDisplay
            | AnalysisType::ModelDownsamplingSegmentation
            | AnalysisType::TeethFeatures
            | AnalysisType::Other(_) => self.generic(results, patient),
        };

        tracing::debug!("Extracted {} findings for {}", findings.len(), analysis_type);
        Ok(findings)
    }

    /// 口腔图像分类
    fn oral_classification(
        &self,
        data: &Map<String, Value>,
        _patient: &PatientInfo,
    ) -> Vec<Finding> {
        let confidence = number(data.get("confidence")).unwrap_or(0.0);
        let image_type = text(data.get("image_type")).unwrap_or_else(|| "未知".to_string());
        let posture = text(data.get("posture")).unwrap_or_else(|| "未知".to_string());

        let mut findings = vec![Finding::new(
            "图像质量",
            format!("识别为{}图像，姿态为{}", image_type, posture),
            Severity::Info,
            confidence,
        )];

        if confidence < IMAGE_QUALITY_FLOOR {
            findings.push(Finding::new(
                "图像质量",
                "图像质量需要改进，可能影响分析准确性",
                Severity::Caution,
                confidence,
            ));
        }

        findings
    }

    /// 头颅侧位片测量（17点与57点共用同一套角度规则）
    fn cephalometric(&self, data: &Map<String, Value>, _patient: &PatientInfo) -> Vec<Finding> {
        let Some(measurements) = data.get("measurements").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut findings = Vec::new();
        for rule in &CEPHALOMETRIC_RULES {
            // 缺失或为0的测量值不参与判断
            let Some(value) = number(measurements.get(rule.name)).filter(|v| *v != 0.0) else {
                continue;
            };

            let (wording, hint) = if value < rule.lower {
                rule.below
            } else if value > rule.upper {
                rule.above
            } else {
                continue;
            };

            findings.push(
                Finding::new(
                    rule.category,
                    format!("{}角度{}({}°)，提示{}", rule.name, wording, value, hint),
                    rule.severity,
                    rule.confidence,
                )
                .with_measurement(Measurement {
                    name: rule.name.to_string(),
                    value,
                    normal_range: rule.normal_range.to_string(),
                }),
            );
        }

        findings
    }

    /// 全景片分割
    fn panoramic_segmentation(
        &self,
        data: &Map<String, Value>,
        _patient: &PatientInfo,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(teeth) = data.get("teeth").and_then(Value::as_object) {
            for (tooth_number, tooth_info) in teeth {
                let condition =
                    text(tooth_info.get("condition")).unwrap_or_else(|| "normal".to_string());
                let confidence = number(tooth_info.get("confidence")).unwrap_or(0.0);

                if condition == "normal" || confidence <= self.confidence_threshold {
                    continue;
                }

                findings.push(
                    Finding::new(
                        "牙齿状况",
                        format!("牙齿{}: {}", tooth_number, condition),
                        map_condition_to_severity(&condition),
                        confidence,
                    )
                    .with_location(format!("牙位{}", tooth_number)),
                );
            }
        }

        let missing_teeth: Vec<String> = data
            .get("missing_teeth")
            .and_then(Value::as_array)
            .map(|teeth| teeth.iter().filter_map(|t| text(Some(t))).collect())
            .unwrap_or_default();

        if !missing_teeth.is_empty() {
            findings.push(Finding::new(
                "牙齿缺失",
                format!(
                    "检测到{}颗缺失牙: {}",
                    missing_teeth.len(),
                    missing_teeth.join(", ")
                ),
                Severity::Medium,
                0.9,
            ));
        }

        findings
    }

    /// 病变检测
    fn lesion_detection(&self, data: &Map<String, Value>, _patient: &PatientInfo) -> Vec<Finding> {
        let Some(lesions) = data.get("lesions").and_then(Value::as_array) else {
            return Vec::new();
        };

        lesions
            .iter()
            .filter_map(|lesion| {
                let confidence = number(lesion.get("confidence")).unwrap_or(0.0);
                if confidence <= self.confidence_threshold {
                    return None;
                }

                let lesion_type =
                    text(lesion.get("type")).unwrap_or_else(|| "未知病变".to_string());
                let location =
                    text(lesion.get("location")).unwrap_or_else(|| "未指定位置".to_string());
                let severity =
                    text(lesion.get("severity")).unwrap_or_else(|| "unknown".to_string());

                Some(
                    Finding::new(
                        "病变检测",
                        format!("在{}发现{}", location, lesion_type),
                        map_lesion_severity(&severity),
                        confidence,
                    )
                    .with_location(location),
                )
            })
            .collect()
    }

    /// 通用解读
    fn generic(&self, results: &Map<String, Value>, _patient: &PatientInfo) -> Vec<Finding> {
        let confidence = number(results.get("confidence")).unwrap_or(0.5);
        vec![Finding::new(
            "分析结果",
            "AI分析已完成，请查看详细数据",
            Severity::Info,
            confidence,
        )]
    }
}

impl Default for FindingExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

/// 映射牙齿状况到严重程度
pub fn map_condition_to_severity(condition: &str) -> Severity {
    match condition.to_lowercase().as_str() {
        "caries" => Severity::Medium,
        "deep_caries" | "pulpitis" => Severity::High,
        "periapical" => Severity::Critical,
        "crown" | "filling" | "root_canal" => Severity::Info,
        other => {
            tracing::warn!("Unmapped tooth condition '{}', defaulting to caution", other);
            Severity::Caution
        }
    }
}

/// 映射病变严重程度
pub fn map_lesion_severity(severity: &str) -> Severity {
    match severity.to_lowercase().as_str() {
        "mild" => Severity::Low,
        "moderate" => Severity::Medium,
        "severe" => Severity::High,
        "critical" => Severity::Critical,
        other => {
            tracing::warn!("Unmapped lesion severity '{}', defaulting to medium", other);
            Severity::Medium
        }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
