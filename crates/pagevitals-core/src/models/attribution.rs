//! 어트리뷰션 모델.
//!
//! 확정된 메트릭 값이 "왜" 그 값인지 설명하는 디버깅용 부가 정보.
//! 상관 데이터가 없으면 해당 필드는 `None`으로 남는다.

use serde::{Deserialize, Serialize};

use crate::models::entry::{
    EventTiming, LargestContentfulPaint, LayoutShift, LayoutShiftSource, LongAnimationFrame,
    NavigationTiming, PaintTiming, ResourceTiming, ScriptTiming,
};

/// 특정 시각의 문서 로드 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    Loading,
    DomInteractive,
    DomContentLoaded,
    Complete,
}

/// 메트릭별 어트리뷰션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "UPPERCASE")]
pub enum Attribution {
    Cls(ClsAttribution),
    Fcp(FcpAttribution),
    Fid(FidAttribution),
    Inp(InpAttribution),
    Lcp(LcpAttribution),
    Ttfb(TtfbAttribution),
}

/// CLS 어트리뷰션: 가장 큰 단일 이동 기준
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClsAttribution {
    pub largest_shift_target: Option<String>,
    pub largest_shift_time: Option<f64>,
    pub largest_shift_value: Option<f64>,
    pub largest_shift_entry: Option<LayoutShift>,
    pub largest_shift_source: Option<LayoutShiftSource>,
    pub load_state: Option<LoadState>,
}

/// FCP 어트리뷰션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcpAttribution {
    pub time_to_first_byte: f64,
    #[serde(rename = "firstByteToFCP")]
    pub first_byte_to_fcp: f64,
    pub load_state: LoadState,
    pub navigation_entry: Option<NavigationTiming>,
    pub fcp_entry: Option<PaintTiming>,
}

/// FID 어트리뷰션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FidAttribution {
    pub event_target: Option<String>,
    pub event_type: String,
    pub event_time: f64,
    pub event_entry: EventTiming,
    pub load_state: LoadState,
}

/// 상호작용 입력 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionType {
    Pointer,
    Keyboard,
}

/// 가장 긴 스크립트가 겹친 INP 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptSubpart {
    InputDelay,
    ProcessingDuration,
    PresentationDelay,
}

/// 상호작용 구간과 가장 길게 겹친 스크립트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongestScript {
    pub entry: ScriptTiming,
    pub subpart: ScriptSubpart,
    pub intersecting_duration: f64,
}

/// INP 어트리뷰션
///
/// `input_delay + processing_duration + presentation_delay`는
/// `next_paint_time - interaction_time`과 같다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpAttribution {
    pub interaction_target: Option<String>,
    pub interaction_type: InteractionType,
    pub interaction_time: f64,
    pub next_paint_time: f64,
    pub processed_event_entries: Vec<EventTiming>,
    pub long_animation_frame_entries: Vec<LongAnimationFrame>,
    pub input_delay: f64,
    pub processing_duration: f64,
    pub presentation_delay: f64,
    pub load_state: LoadState,
    pub longest_script: Option<LongestScript>,
    pub total_script_duration: Option<f64>,
    pub total_style_and_layout_duration: Option<f64>,
    pub total_paint_duration: Option<f64>,
    pub total_unattributed_duration: Option<f64>,
}

/// LCP 어트리뷰션: 네 구간의 합이 LCP 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcpAttribution {
    pub target: Option<String>,
    pub url: Option<String>,
    pub time_to_first_byte: f64,
    pub resource_load_delay: f64,
    pub resource_load_duration: f64,
    pub element_render_delay: f64,
    pub navigation_entry: Option<NavigationTiming>,
    pub lcp_resource_entry: Option<ResourceTiming>,
    pub lcp_entry: Option<LargestContentfulPaint>,
}

/// TTFB 어트리뷰션: 다섯 구간의 합이 TTFB 값
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtfbAttribution {
    pub waiting_duration: f64,
    pub cache_duration: f64,
    pub dns_duration: f64,
    pub connection_duration: f64,
    pub request_duration: f64,
    pub navigation_entry: Option<NavigationTiming>,
}
