//! 성능 엔트리 모델.
//!
//! 호스트 런타임이 관찰 구독을 통해 전달하는 원본 타이밍 레코드.
//! 모든 시각은 내비게이션 시작 기준 밀리초(`DOMHighResTimeStamp`)이다.
//! DOM 노드는 호스트가 미리 계산한 셀렉터 문자열로 전달된다.

use serde::{Deserialize, Serialize};

use crate::models::metric::NavigationType;

/// 관찰 가능한 엔트리 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Paint,
    LargestContentfulPaint,
    LayoutShift,
    Event,
    FirstInput,
    Navigation,
    LongAnimationFrame,
    Resource,
}

impl EntryKind {
    /// 브라우저 `entryType` 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paint => "paint",
            Self::LargestContentfulPaint => "largest-contentful-paint",
            Self::LayoutShift => "layout-shift",
            Self::Event => "event",
            Self::FirstInput => "first-input",
            Self::Navigation => "navigation",
            Self::LongAnimationFrame => "long-animation-frame",
            Self::Resource => "resource",
        }
    }
}

/// 원본 성능 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    Paint(PaintTiming),
    LargestContentfulPaint(LargestContentfulPaint),
    LayoutShift(LayoutShift),
    Event(EventTiming),
    FirstInput(EventTiming),
    Navigation(NavigationTiming),
    LongAnimationFrame(LongAnimationFrame),
    Resource(ResourceTiming),
}

impl PerformanceEntry {
    /// 엔트리 종류
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Paint(_) => EntryKind::Paint,
            Self::LargestContentfulPaint(_) => EntryKind::LargestContentfulPaint,
            Self::LayoutShift(_) => EntryKind::LayoutShift,
            Self::Event(_) => EntryKind::Event,
            Self::FirstInput(_) => EntryKind::FirstInput,
            Self::Navigation(_) => EntryKind::Navigation,
            Self::LongAnimationFrame(_) => EntryKind::LongAnimationFrame,
            Self::Resource(_) => EntryKind::Resource,
        }
    }

    /// 엔트리 시작 시각
    pub fn start_time(&self) -> f64 {
        match self {
            Self::Paint(e) => e.start_time,
            Self::LargestContentfulPaint(e) => e.start_time,
            Self::LayoutShift(e) => e.start_time,
            Self::Event(e) | Self::FirstInput(e) => e.start_time,
            Self::Navigation(e) => e.start_time,
            Self::LongAnimationFrame(e) => e.start_time,
            Self::Resource(e) => e.start_time,
        }
    }

    /// 엔트리 지속 시간 (지속 개념이 없는 종류는 0)
    pub fn duration(&self) -> f64 {
        match self {
            Self::Event(e) | Self::FirstInput(e) => e.duration,
            Self::Navigation(e) => e.duration,
            Self::LongAnimationFrame(e) => e.duration,
            Self::Resource(e) => e.duration,
            Self::Paint(_) | Self::LargestContentfulPaint(_) | Self::LayoutShift(_) => 0.0,
        }
    }

    /// 이벤트 타이밍 엔트리 (`event` / `first-input`)
    pub fn as_event_timing(&self) -> Option<&EventTiming> {
        match self {
            Self::Event(e) | Self::FirstInput(e) => Some(e),
            _ => None,
        }
    }
}

/// `paint` 엔트리 (`first-paint`, `first-contentful-paint`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintTiming {
    pub name: String,
    pub start_time: f64,
}

/// `largest-contentful-paint` 후보 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LargestContentfulPaint {
    /// renderTime이 있으면 renderTime, 없으면 loadTime
    pub start_time: f64,
    pub render_time: f64,
    pub load_time: f64,
    /// 요소 면적 (px²)
    pub size: u64,
    /// 이미지 요소의 리소스 URL (텍스트면 빈 문자열)
    pub url: String,
    /// 요소 셀렉터
    pub element: Option<String>,
    pub id: String,
}

/// `layout-shift` 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutShift {
    pub start_time: f64,
    /// 이동 점수
    pub value: f64,
    /// 최근 500ms 내 사용자 입력 직후 발생 여부 (CLS에서 제외)
    #[serde(default)]
    pub had_recent_input: bool,
    #[serde(default)]
    pub sources: Vec<LayoutShiftSource>,
}

/// 레이아웃 이동을 일으킨 노드
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutShiftSource {
    /// 노드 셀렉터 (요소가 아닌 노드거나 이미 제거된 경우 None)
    pub node: Option<String>,
    pub previous_rect: DomRect,
    pub current_rect: DomRect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 이벤트 타이밍 엔트리 (`event`, `first-input`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTiming {
    /// 이벤트 타입 (`pointerdown`, `keydown`, `click` ...)
    pub name: String,
    pub start_time: f64,
    /// 8ms 단위로 반올림된 입력 → 다음 페인트 지속 시간
    pub duration: f64,
    pub processing_start: f64,
    pub processing_end: f64,
    /// 상호작용 그룹 키 (0 = 상호작용에 속하지 않음)
    #[serde(default)]
    pub interaction_id: u64,
    /// 이벤트 대상 셀렉터
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub cancelable: bool,
}

impl EventTiming {
    /// 다음 페인트 시각 (`startTime + duration`)
    pub fn render_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// `navigation` 엔트리 (Navigation Timing Level 2)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    /// 문서 URL
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub navigation_type: NavigationType,
    /// 프리렌더 활성화 시각 (프리렌더가 아니면 0)
    pub activation_start: f64,
    pub worker_start: f64,
    pub fetch_start: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub secure_connection_start: f64,
    pub connect_end: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded_event_start: f64,
    pub dom_content_loaded_event_end: f64,
    pub dom_complete: f64,
    pub load_event_start: f64,
    pub load_event_end: f64,
}

/// `long-animation-frame` 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LongAnimationFrame {
    pub start_time: f64,
    pub duration: f64,
    pub render_start: f64,
    pub style_and_layout_start: f64,
    pub blocking_duration: f64,
    pub first_ui_event_timestamp: f64,
    pub scripts: Vec<ScriptTiming>,
}

impl LongAnimationFrame {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// 긴 애니메이션 프레임 안에서 실행된 스크립트
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptTiming {
    pub start_time: f64,
    pub duration: f64,
    pub execution_start: f64,
    pub forced_style_and_layout_duration: f64,
    pub pause_duration: f64,
    /// 호출자 (예: `BUTTON#submit.onclick`)
    pub invoker: String,
    /// 호출자 유형 (`event-listener`, `user-callback` ...)
    pub invoker_type: String,
    pub source_url: String,
    pub source_function_name: String,
    pub source_char_position: i64,
}

/// `resource` 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceTiming {
    /// 리소스 URL
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    pub initiator_type: String,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
}
