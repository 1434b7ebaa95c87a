//! 메트릭 레코드 모델.
//!
//! 측정 에피소드마다 하나씩 생성되어 값/엔트리가 제자리에서 갱신되고,
//! 리포트 시점에 delta/rating이 채워진 스냅샷이 콜백으로 전달된다.

use serde::{Deserialize, Serialize};

use crate::models::attribution::Attribution;
use crate::models::entry::PerformanceEntry;

/// 메트릭 이름 (고정 열거)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricName {
    /// Cumulative Layout Shift (단위 없는 점수)
    Cls,
    /// First Contentful Paint
    Fcp,
    /// First Input Delay (레거시)
    Fid,
    /// Interaction to Next Paint
    Inp,
    /// Largest Contentful Paint
    Lcp,
    /// Time to First Byte
    Ttfb,
}

impl MetricName {
    /// 표기 문자열 ("CLS", "INP" 등)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cls => "CLS",
            Self::Fcp => "FCP",
            Self::Fid => "FID",
            Self::Inp => "INP",
            Self::Lcp => "LCP",
            Self::Ttfb => "TTFB",
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 등급 (두 임계값으로 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

/// 등급 임계값 `[good, poor]`
///
/// `value <= good` → good, `good < value <= poor` → needs-improvement, 그 외 poor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

impl Thresholds {
    pub const fn new(good: f64, poor: f64) -> Self {
        Self { good, poor }
    }

    /// 값에 대한 등급 계산
    pub fn rate(&self, value: f64) -> Rating {
        if value > self.poor {
            Rating::Poor
        } else if value > self.good {
            Rating::NeedsImprovement
        } else {
            Rating::Good
        }
    }
}

pub const CLS_THRESHOLDS: Thresholds = Thresholds::new(0.1, 0.25);
pub const FCP_THRESHOLDS: Thresholds = Thresholds::new(1800.0, 3000.0);
pub const FID_THRESHOLDS: Thresholds = Thresholds::new(100.0, 300.0);
pub const INP_THRESHOLDS: Thresholds = Thresholds::new(200.0, 500.0);
pub const LCP_THRESHOLDS: Thresholds = Thresholds::new(2500.0, 4000.0);
pub const TTFB_THRESHOLDS: Thresholds = Thresholds::new(800.0, 1800.0);

/// 페이지 방문이 시작된 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationType {
    #[default]
    Navigate,
    Reload,
    /// 내비게이션 타이밍의 `back_forward` 표기도 허용
    #[serde(alias = "back_forward")]
    BackForward,
    /// bfcache 복원 에피소드
    BackForwardCache,
    Prerender,
    /// 폐기(discard) 후 복원된 탭
    Restore,
}

/// 메트릭 레코드: 콜백으로 전달되는 값 객체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// 메트릭 이름
    pub name: MetricName,
    /// 측정값 (ms, CLS는 점수). 음수는 "아직 측정 안 됨" 센티널
    pub value: f64,
    /// 등급
    pub rating: Rating,
    /// 같은 `id`의 직전 리포트 대비 변화량 (첫 리포트는 `value`와 동일)
    pub delta: f64,
    /// 측정 에피소드 고유 ID
    pub id: String,
    /// 값을 뒷받침하는 원본 엔트리 (비어 있을 수 있음)
    pub entries: Vec<PerformanceEntry>,
    /// 방문 유형
    pub navigation_type: NavigationType,
    /// 디버깅용 어트리뷰션 (어트리뷰션 빌드에서만 채워짐)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl Metric {
    /// 새 메트릭 레코드 생성
    pub fn new(
        name: MetricName,
        value: f64,
        id: impl Into<String>,
        navigation_type: NavigationType,
    ) -> Self {
        Self {
            name,
            value,
            rating: Rating::Good,
            delta: 0.0,
            id: id.into(),
            entries: Vec::new(),
            navigation_type,
            attribution: None,
        }
    }

    /// 측정값이 존재하는지 (센티널 -1이 아닌지)
    pub fn is_measured(&self) -> bool {
        self.value >= 0.0
    }
}
