//! 페이지 라이프사이클 모델.
//!
//! 호스트 런타임이 `VitalsRuntime::dispatch`로 전달하는 이벤트와
//! 페이지 상태 값(가시성, 로드 상태, 입력 유형)을 정의.

use serde::{Deserialize, Serialize};

use crate::models::entry::PerformanceEntry;
use crate::ports::entry_source::SubscriptionId;

/// 문서 가시성 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

/// `document.readyState`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// 사용자 입력 이벤트 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    KeyDown,
    Click,
    PointerDown,
    MouseDown,
    TouchStart,
    Scroll,
}

impl InputKind {
    /// DOM 이벤트 타입 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyDown => "keydown",
            Self::Click => "click",
            Self::PointerDown => "pointerdown",
            Self::MouseDown => "mousedown",
            Self::TouchStart => "touchstart",
            Self::Scroll => "scroll",
        }
    }

    /// LCP 관찰을 종료시키는 입력 (keydown / click)
    pub fn ends_largest_paint(&self) -> bool {
        matches!(self, Self::KeyDown | Self::Click)
    }

    /// 최초 입력 지연 측정 대상이 되는 개별 입력
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Self::KeyDown | Self::MouseDown | Self::PointerDown | Self::TouchStart
        )
    }
}

/// 호스트 런타임 → 메트릭 런타임 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// 구독으로 관찰된 엔트리 배치 (같은 종류 안에서는 시간순)
    Entries {
        subscription: SubscriptionId,
        entries: Vec<PerformanceEntry>,
    },
    /// `visibilitychange`
    VisibilityChange {
        state: VisibilityState,
        time_stamp: f64,
    },
    /// `pagehide` (언로드 또는 bfcache 진입)
    PageHide { persisted: bool, time_stamp: f64 },
    /// `pageshow`: `persisted`면 bfcache 복원
    PageShow { persisted: bool, time_stamp: f64 },
    /// `prerenderingchange`: 프리렌더 페이지 활성화
    PrerenderingChange { time_stamp: f64 },
    /// 사용자 입력 (캡처 단계 리스너)
    Input { kind: InputKind, time_stamp: f64 },
    /// `load` 이벤트 완료
    Load,
    /// 호스트의 다음 태스크 턴 (`setTimeout(0)` / 다음 애니메이션 프레임)
    Tick,
}
