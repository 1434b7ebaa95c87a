//! 페이지 상태 조회 포트.
//!
//! 구현: 호스트 바인딩 (`document`, `performance`), `pagevitals-replay`의 스크립트 호스트

use crate::models::entry::{NavigationTiming, ResourceTiming};
use crate::models::lifecycle::{ReadyState, VisibilityState};

/// 현재 페이지 상태 조회 인터페이스
pub trait PageHost {
    /// 현재 시각 (`performance.now()`)
    fn now(&self) -> f64;

    /// 현재 가시성 상태
    fn visibility_state(&self) -> VisibilityState;

    /// 프리렌더링 중인지 (`document.prerendering`)
    fn is_prerendering(&self) -> bool;

    /// 폐기 후 복원된 탭인지 (`document.wasDiscarded`)
    fn was_discarded(&self) -> bool;

    /// 문서 로드 상태
    fn ready_state(&self) -> ReadyState;

    /// 현재 문서의 내비게이션 타이밍 (미지원 시 None)
    fn navigation_entry(&self) -> Option<NavigationTiming>;

    /// URL에 해당하는 리소스 타이밍 조회
    fn resource_timing(&self, url: &str) -> Option<ResourceTiming>;

    /// 네이티브 상호작용 카운터 (`performance.interactionCount`).
    ///
    /// 미지원 시 `None`: 런타임이 `event` 엔트리로 추정한다.
    fn interaction_count(&self) -> Option<u64>;

    /// 프리렌더 활성화 시각 (프리렌더가 아니면 0)
    fn activation_start(&self) -> f64 {
        self.navigation_entry()
            .map(|nav| nav.activation_start)
            .unwrap_or(0.0)
    }

    /// 현재 숨김 상태인지
    fn is_hidden(&self) -> bool {
        self.visibility_state() == VisibilityState::Hidden
    }
}
