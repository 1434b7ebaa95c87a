//! # pagevitals-attribution
//!
//! 확정된 메트릭의 원본 엔트리를 보조 엔트리 스트림(긴 애니메이션 프레임,
//! 내비게이션/리소스 타이밍)과 상관 분석하여 디버깅용 구간 분해를 만든다.
//! 상관 데이터가 없으면 해당 필드를 비워 두고 메트릭 값은 그대로 보고된다.

pub mod cls;
pub mod fcp;
pub mod fid;
pub mod inp;
pub mod lcp;
pub mod load_state;
pub mod ttfb;

#[cfg(test)]
pub(crate) mod test_page;

use pagevitals_core::models::attribution::Attribution;
use pagevitals_core::models::metric::Metric;
use pagevitals_core::ports::page::PageHost;

pub use inp::InpAttributor;

/// 어트리뷰션 계산에 필요한 입력
pub struct AttributionSources<'a> {
    /// 현재 페이지 상태
    pub page: &'a dyn PageHost,
    /// INP 프레임 그룹/LoAF 버퍼 (INP 엔진에서만 제공)
    pub frames: Option<&'a InpAttributor>,
    /// 마지막 bfcache 복원 시각
    pub restore_time: Option<f64>,
}

impl<'a> AttributionSources<'a> {
    pub fn new(page: &'a dyn PageHost) -> Self {
        Self {
            page,
            frames: None,
            restore_time: None,
        }
    }
}

/// 메트릭별 어트리뷰션 빌더 함수
pub type AttributeFn = fn(&AttributionSources<'_>, &Metric) -> Option<Attribution>;
