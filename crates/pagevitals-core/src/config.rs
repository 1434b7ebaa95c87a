//! 런타임 설정 구조체.
//!
//! 리포트 기본 옵션, INP 추정기 파라미터, 어트리뷰션 상관 분석 파라미터를 정의한다.
//! JSON 파일 또는 문자열에서 로드하며, 누락된 섹션은 기본값으로 채운다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::CoreError;

/// 최상위 런타임 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsConfig {
    /// 리포트 기본 옵션
    #[serde(default)]
    pub report: ReportConfig,
    /// INP 추정기 설정
    #[serde(default)]
    pub inp: InpConfig,
    /// 어트리뷰션 상관 분석 설정
    #[serde(default)]
    pub attribution: AttributionConfig,
}

// ============================================================
// 리포트 설정
// ============================================================

/// 리포트 기본 옵션: `ReportOpts`가 지정하지 않은 경우에 사용
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 값이 바뀔 때마다 보고 (기본: 확정 시점에만)
    #[serde(default)]
    pub report_all_changes: bool,
    /// 어트리뷰션 빌드 사용
    #[serde(default)]
    pub attribution: bool,
}

// ============================================================
// INP 설정
// ============================================================

/// INP 추정기 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InpConfig {
    /// `event` 구독 최소 지속 시간 (ms)
    #[serde(default = "default_duration_threshold_ms")]
    pub duration_threshold_ms: f64,
    /// 추적할 최악 상호작용 수
    #[serde(default = "default_max_interactions")]
    pub max_interactions: usize,
    /// 후보 인덱스가 1 증가하는 상호작용 수 (p98 근사)
    #[serde(default = "default_interactions_per_step")]
    pub interactions_per_step: u64,
}

impl Default for InpConfig {
    fn default() -> Self {
        Self {
            duration_threshold_ms: default_duration_threshold_ms(),
            max_interactions: default_max_interactions(),
            interactions_per_step: default_interactions_per_step(),
        }
    }
}

fn default_duration_threshold_ms() -> f64 {
    40.0
}

fn default_max_interactions() -> usize {
    10
}

fn default_interactions_per_step() -> u64 {
    50
}

// ============================================================
// 어트리뷰션 설정
// ============================================================

/// 어트리뷰션 상관 분석 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// 같은 프레임으로 묶을 렌더 시각 허용 오차 (ms).
    /// `duration`이 8ms 단위로 반올림되므로 기본 8ms.
    #[serde(default = "default_render_time_tolerance_ms")]
    pub render_time_tolerance_ms: f64,
    /// 보관할 최근 프레임 그룹 / LoAF 엔트리 수
    #[serde(default = "default_max_previous_frames")]
    pub max_previous_frames: usize,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            render_time_tolerance_ms: default_render_time_tolerance_ms(),
            max_previous_frames: default_max_previous_frames(),
        }
    }
}

fn default_render_time_tolerance_ms() -> f64 {
    8.0
}

fn default_max_previous_frames() -> usize {
    50
}

// ============================================================
// 호출별 옵션
// ============================================================

/// `on_*` 호출별 리포트 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReportOpts {
    /// 값이 바뀔 때마다 보고
    pub report_all_changes: bool,
    /// INP 전용: `event` 최소 지속 시간 (None이면 설정값)
    pub duration_threshold: Option<f64>,
    /// 어트리뷰션 포함
    pub attribution: bool,
}

impl ReportOpts {
    /// 모든 변화 보고
    pub fn all_changes() -> Self {
        Self {
            report_all_changes: true,
            ..Self::default()
        }
    }

    /// 어트리뷰션 포함
    pub fn with_attribution(mut self) -> Self {
        self.attribution = true;
        self
    }

    /// INP 최소 지속 시간 지정
    pub fn with_duration_threshold(mut self, threshold: f64) -> Self {
        self.duration_threshold = Some(threshold);
        self
    }
}

impl VitalsConfig {
    /// 설정 기본값이 적용된 리포트 옵션
    pub fn report_opts(&self) -> ReportOpts {
        ReportOpts {
            report_all_changes: self.report.report_all_changes,
            duration_threshold: None,
            attribution: self.report.attribution,
        }
    }

    /// JSON 문자열에서 로드 후 검증
    pub fn from_json_str(content: &str) -> Result<Self, CoreError> {
        let config: VitalsConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// JSON 파일에서 로드 후 검증
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&content)?;
        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.inp.duration_threshold_ms.is_nan() || self.inp.duration_threshold_ms < 0.0 {
            return Err(CoreError::validation(
                "inp.duration_threshold_ms",
                "0 이상이어야 합니다",
            ));
        }
        if self.inp.max_interactions == 0 {
            return Err(CoreError::validation(
                "inp.max_interactions",
                "1 이상이어야 합니다",
            ));
        }
        if self.inp.interactions_per_step == 0 {
            return Err(CoreError::validation(
                "inp.interactions_per_step",
                "1 이상이어야 합니다",
            ));
        }
        let tolerance = self.attribution.render_time_tolerance_ms;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(CoreError::validation(
                "attribution.render_time_tolerance_ms",
                "0 이상이어야 합니다",
            ));
        }
        if self.attribution.max_previous_frames == 0 {
            return Err(CoreError::validation(
                "attribution.max_previous_frames",
                "1 이상이어야 합니다",
            ));
        }
        Ok(())
    }
}
