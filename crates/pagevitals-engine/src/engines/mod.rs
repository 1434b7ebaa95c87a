//! 메트릭별 엔진.
//!
//! 각 엔진은 동기 리듀서다: 런타임이 [`Signal`]을 전달하면 상태를 갱신하고
//! 리포트할 메트릭 스냅샷을 [`Outcome`]으로 돌려준다.
//! 콜백 호출과 구독 해제는 엔진 처리가 끝난 뒤 런타임이 수행한다.

pub mod cls;
pub mod fcp;
pub mod fid;
pub mod inp;
pub mod lcp;
pub mod ttfb;

use pagevitals_attribution::InpAttributor;
use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::models::lifecycle::InputKind;
use pagevitals_core::models::metric::{Metric, MetricName};
use pagevitals_core::ports::entry_source::ObserveOptions;

use crate::context::PageView;

pub use cls::ClsEngine;
pub use fcp::FcpEngine;
pub use fid::FidEngine;
pub use inp::InpEngine;
pub use lcp::LcpEngine;
pub use ttfb::TtfbEngine;

/// 엔진이 필요로 하는 엔트리 구독
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRequest {
    pub kind: EntryKind,
    pub options: ObserveOptions,
    /// 미지원이면 엔진 전체가 비활성화되는지
    pub required: bool,
}

impl EntryRequest {
    pub fn required(kind: EntryKind, options: ObserveOptions) -> Self {
        Self {
            kind,
            options,
            required: true,
        }
    }

    pub fn optional(kind: EntryKind, options: ObserveOptions) -> Self {
        Self {
            kind,
            options,
            required: false,
        }
    }
}

/// 런타임 → 엔진 신호
#[derive(Debug, Clone, Copy)]
pub enum Signal<'a> {
    /// 구독 완료 후 (프리렌더면 활성화 후) 한 번
    Start,
    /// 구독 엔트리 배치
    Entries(EntryKind, &'a [PerformanceEntry]),
    /// 페이지 숨김. 런타임이 미전달 엔트리를 먼저 전달한 뒤 보낸다.
    Hidden,
    /// 사용자 입력
    Input { kind: InputKind, time_stamp: f64 },
    /// bfcache 복원 (새 에피소드 시작)
    Restore { time_stamp: f64 },
    /// 다음 태스크 턴
    Turn,
    /// `load` 완료
    Loaded,
}

/// 신호 처리 결과
#[derive(Debug, Default)]
pub struct Outcome {
    /// 콜백으로 전달할 스냅샷 (순서대로)
    pub reports: Vec<Metric>,
    /// 모든 엔트리 구독 해제
    pub disconnect: bool,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn report(metric: Option<Metric>) -> Self {
        Self {
            reports: metric.into_iter().collect(),
            disconnect: false,
        }
    }

    pub fn push(&mut self, metric: Option<Metric>) {
        self.reports.extend(metric);
    }
}

/// 메트릭 엔진 공통 인터페이스
pub trait MetricEngine {
    fn name(&self) -> MetricName;

    /// 시작 시 열어야 할 엔트리 구독
    fn requests(&self) -> Vec<EntryRequest>;

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome;

    /// 페이지 전체 상호작용 수가 필요한지
    fn counts_interactions(&self) -> bool {
        false
    }

    /// INP 프레임 그룹 버퍼 (어트리뷰션용)
    fn frames(&self) -> Option<&InpAttributor> {
        None
    }
}
