//! 성능 엔트리 관찰 포트.
//!
//! 구현: 호스트 바인딩 (`PerformanceObserver`), `pagevitals-replay`의 스크립트 호스트

use serde::{Deserialize, Serialize};

use crate::models::entry::{EntryKind, PerformanceEntry};

/// 호스트 수준 구독 핸들
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// 구독 필터 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObserveOptions {
    /// 구독 이전에 버퍼된 엔트리도 재생
    pub buffered: bool,
    /// `event` 엔트리의 최소 지속 시간 (ms)
    pub duration_threshold: Option<f64>,
}

impl ObserveOptions {
    /// 버퍼 재생 구독
    pub fn buffered() -> Self {
        Self {
            buffered: true,
            duration_threshold: None,
        }
    }

    /// 최소 지속 시간 지정
    pub fn with_duration_threshold(mut self, threshold: f64) -> Self {
        self.duration_threshold = Some(threshold);
        self
    }
}

/// 성능 엔트리 관찰 소스
///
/// 관찰된 엔트리는 `HostEvent::Entries`로 비동기 전달된다.
/// 같은 종류의 엔트리는 시간순으로 전달되지만, 종류 간 순서는 보장되지 않는다.
pub trait EntrySource {
    /// 구독 시작. 런타임이 해당 종류를 지원하지 않으면 `None`.
    fn observe(&mut self, kind: EntryKind, options: &ObserveOptions) -> Option<SubscriptionId>;

    /// 큐에 쌓였지만 아직 전달되지 않은 엔트리를 꺼내서 반환 (`takeRecords`)
    fn take_records(&mut self, subscription: SubscriptionId) -> Vec<PerformanceEntry>;

    /// 구독 종료
    fn disconnect(&mut self, subscription: SubscriptionId);
}
