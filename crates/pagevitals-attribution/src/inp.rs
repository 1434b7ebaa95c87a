//! INP 어트리뷰션.
//!
//! 이벤트 엔트리를 렌더 시각 기준 프레임 그룹으로 묶고, 긴 애니메이션 프레임(LoAF)
//! 엔트리를 버퍼링해 두었다가 INP 확정 시점에 교차 구간을 계산한다.
//! 두 스트림은 서로 순서가 보장되지 않으므로 최근 N개 프레임 범위 안에서만 보관한다.

use std::collections::{HashMap, HashSet};

use pagevitals_core::config::AttributionConfig;
use pagevitals_core::models::attribution::{
    Attribution, InpAttribution, InteractionType, LongestScript, ScriptSubpart,
};
use pagevitals_core::models::entry::{EventTiming, LongAnimationFrame, PerformanceEntry};
use pagevitals_core::models::metric::Metric;
use tracing::trace;

use crate::load_state::load_state_at;
use crate::AttributionSources;

/// 같은 프레임에서 렌더링된 이벤트 엔트리 묶음
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGroup {
    id: u64,
    pub start_time: f64,
    pub processing_start: f64,
    pub processing_end: f64,
    pub render_time: f64,
    pub entries: Vec<EventTiming>,
}

impl FrameGroup {
    fn from_entry(id: u64, entry: &EventTiming) -> Self {
        Self {
            id,
            start_time: entry.start_time,
            processing_start: entry.processing_start,
            processing_end: entry.processing_end,
            render_time: entry.render_time(),
            entries: vec![entry.clone()],
        }
    }

    fn absorb(&mut self, entry: &EventTiming) {
        self.start_time = self.start_time.min(entry.start_time);
        self.processing_start = self.processing_start.min(entry.processing_start);
        self.processing_end = self.processing_end.max(entry.processing_end);
        self.entries.push(entry.clone());
    }

    /// 버퍼에서 이미 제거된 경우 메트릭 엔트리만으로 그룹 재구성
    fn from_metric_entries(entries: &[&EventTiming]) -> Option<Self> {
        let (first, rest) = entries.split_first()?;
        let mut group = Self::from_entry(0, first);
        for entry in rest {
            group.absorb(entry);
            group.render_time = group.render_time.max(entry.render_time());
        }
        Some(group)
    }
}

/// 엔트리 → 프레임 그룹 매핑 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EntryKey {
    interaction_id: u64,
    start_time_bits: u64,
}

impl EntryKey {
    fn of(entry: &EventTiming) -> Self {
        Self {
            interaction_id: entry.interaction_id,
            start_time_bits: entry.start_time.to_bits(),
        }
    }
}

/// INP 상관 분석 버퍼 (INP 엔진 인스턴스마다 하나)
#[derive(Debug, Clone)]
pub struct InpAttributor {
    tolerance_ms: f64,
    max_previous_frames: usize,
    groups: Vec<FrameGroup>,
    entry_groups: HashMap<EntryKey, u64>,
    interaction_targets: HashMap<u64, String>,
    pending_frames: Vec<LongAnimationFrame>,
    latest_processing_end: f64,
    next_group_id: u64,
}

impl InpAttributor {
    pub fn new(config: &AttributionConfig) -> Self {
        Self {
            tolerance_ms: config.render_time_tolerance_ms,
            max_previous_frames: config.max_previous_frames,
            groups: Vec::new(),
            entry_groups: HashMap::new(),
            interaction_targets: HashMap::new(),
            pending_frames: Vec::new(),
            latest_processing_end: 0.0,
            next_group_id: 1,
        }
    }

    /// `event` / `first-input` 엔트리 관찰.
    ///
    /// 상호작용 대상 셀렉터를 저장하고, 렌더 시각이 허용 오차 안인 그룹에 합친다.
    pub fn observe_entry(&mut self, entry: &PerformanceEntry) {
        let (event, is_first_input) = match entry {
            PerformanceEntry::Event(e) => (e, false),
            PerformanceEntry::FirstInput(e) => (e, true),
            _ => return,
        };

        if event.interaction_id != 0 {
            if let Some(target) = &event.target {
                self.interaction_targets
                    .entry(event.interaction_id)
                    .or_insert_with(|| target.clone());
            }
        }

        let render_time = event.render_time();
        self.latest_processing_end = self.latest_processing_end.max(event.processing_end);

        let tolerance = self.tolerance_ms;
        let group_id = match self
            .groups
            .iter_mut()
            .rev()
            .find(|group| (render_time - group.render_time).abs() <= tolerance)
        {
            Some(group) => {
                group.absorb(event);
                group.id
            }
            None => {
                let id = self.next_group_id;
                self.next_group_id += 1;
                self.groups.push(FrameGroup::from_entry(id, event));
                id
            }
        };

        if event.interaction_id != 0 || is_first_input {
            self.entry_groups.insert(EntryKey::of(event), group_id);
        }
    }

    /// `long-animation-frame` 엔트리 버퍼링 (시간순 전달 가정)
    pub fn observe_long_animation_frames(&mut self, frames: &[LongAnimationFrame]) {
        self.pending_frames.extend_from_slice(frames);
    }

    /// 더 이상 교차할 수 없는 그룹/프레임 제거.
    ///
    /// `tracked`는 현재 추적 중인 최악 상호작용들의 첫 엔트리.
    /// 최근 N개 그룹과 추적 중인 상호작용의 그룹은 유지하고,
    /// LoAF는 유지된 그룹과 교차하거나 마지막 처리 이후 시작한 최근 N개만 남긴다.
    pub fn cleanup<'a>(&mut self, tracked: impl IntoIterator<Item = &'a EventTiming>) {
        let mut tracked_groups = HashSet::new();
        let mut tracked_ids = HashSet::new();
        for entry in tracked {
            tracked_ids.insert(entry.interaction_id);
            if let Some(group_id) = self.entry_groups.get(&EntryKey::of(entry)) {
                tracked_groups.insert(*group_id);
            }
        }

        self.interaction_targets
            .retain(|interaction_id, _| tracked_ids.contains(interaction_id));

        let min_index = self.groups.len().saturating_sub(self.max_previous_frames);
        let mut index = 0;
        self.groups.retain(|group| {
            let keep = index >= min_index || tracked_groups.contains(&group.id);
            index += 1;
            keep
        });

        let live: HashSet<u64> = self.groups.iter().map(|group| group.id).collect();
        self.entry_groups.retain(|_, group_id| live.contains(group_id));

        let mut frames_to_keep = HashSet::new();
        for group in &self.groups {
            for index in self.intersecting_indices(group.start_time, group.processing_end) {
                frames_to_keep.insert(index);
            }
        }

        let cutoff = self.pending_frames.len() as i64 - 1 - self.max_previous_frames as i64;
        let latest_processing_end = self.latest_processing_end;
        let before = self.pending_frames.len();
        let mut index = 0usize;
        self.pending_frames.retain(|frame| {
            let recent = frame.start_time > latest_processing_end && index as i64 > cutoff;
            let keep = recent || frames_to_keep.contains(&index);
            index += 1;
            keep
        });

        trace!(
            "INP 어트리뷰션 버퍼 정리: 그룹 {}개, LoAF {}→{}개",
            self.groups.len(),
            before,
            self.pending_frames.len()
        );
    }

    /// 엔트리가 속한 프레임 그룹
    pub fn group_for(&self, entry: &EventTiming) -> Option<&FrameGroup> {
        let group_id = self.entry_groups.get(&EntryKey::of(entry))?;
        self.groups.iter().find(|group| group.id == *group_id)
    }

    /// `[start, end]` 구간과 겹치는 LoAF 엔트리
    pub fn intersecting_frames(&self, start: f64, end: f64) -> Vec<LongAnimationFrame> {
        self.intersecting_indices(start, end)
            .into_iter()
            .map(|index| self.pending_frames[index].clone())
            .collect()
    }

    fn intersecting_indices(&self, start: f64, end: f64) -> Vec<usize> {
        let mut indices = Vec::new();
        for (index, frame) in self.pending_frames.iter().enumerate() {
            if frame.end_time() < start {
                continue;
            }
            if frame.start_time > end {
                break;
            }
            indices.push(index);
        }
        indices
    }

    /// 상호작용 ID로 저장된 대상 셀렉터
    pub fn target_for(&self, interaction_id: u64) -> Option<&str> {
        self.interaction_targets
            .get(&interaction_id)
            .map(String::as_str)
    }

    /// 새 에피소드 시작 (bfcache 복원)
    pub fn reset(&mut self) {
        self.groups.clear();
        self.entry_groups.clear();
        self.interaction_targets.clear();
        self.pending_frames.clear();
        self.latest_processing_end = 0.0;
    }

    pub fn pending_group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn pending_frame_count(&self) -> usize {
        self.pending_frames.len()
    }
}

/// INP 어트리뷰션 빌더
///
/// 메트릭 엔트리가 없으면 (상호작용은 있었으나 관찰되지 않은 경우) `None`.
pub fn attribute_inp(sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let events: Vec<&EventTiming> = metric
        .entries
        .iter()
        .filter_map(PerformanceEntry::as_event_timing)
        .collect();
    let first = *events.first()?;

    let group = sources
        .frames
        .and_then(|frames| frames.group_for(first))
        .cloned()
        .or_else(|| FrameGroup::from_metric_entries(&events))?;

    let interaction_time = first.start_time;
    let processing_end = group.processing_end.max(interaction_time);
    let processing_start = group
        .processing_start
        .clamp(interaction_time, processing_end);
    let next_paint_time = group
        .render_time
        .max(first.render_time())
        .max(processing_end);

    let mut processed_event_entries = group.entries;
    processed_event_entries.sort_by(|a, b| a.processing_start.total_cmp(&b.processing_start));

    let long_animation_frame_entries = sources
        .frames
        .map(|frames| frames.intersecting_frames(interaction_time, processing_end))
        .unwrap_or_default();

    let interaction_target = events
        .iter()
        .find_map(|entry| entry.target.clone())
        .or_else(|| {
            sources
                .frames
                .and_then(|frames| frames.target_for(first.interaction_id))
                .map(String::from)
        });

    let interaction_type = if first.name.starts_with("key") {
        InteractionType::Keyboard
    } else {
        InteractionType::Pointer
    };

    let mut attribution = InpAttribution {
        interaction_target,
        interaction_type,
        interaction_time,
        next_paint_time,
        processed_event_entries,
        long_animation_frame_entries,
        input_delay: processing_start - interaction_time,
        processing_duration: processing_end - processing_start,
        presentation_delay: next_paint_time - processing_end,
        load_state: load_state_at(sources.page, interaction_time),
        longest_script: None,
        total_script_duration: None,
        total_style_and_layout_duration: None,
        total_paint_duration: None,
        total_unattributed_duration: None,
    };
    attribute_frame_details(&mut attribution);

    Some(Attribution::Inp(attribution))
}

/// LoAF 스크립트 정보로 구간별 총합과 가장 긴 스크립트 계산
fn attribute_frame_details(attribution: &mut InpAttribution) {
    let Some(last_frame) = attribution.long_animation_frame_entries.last() else {
        return;
    };
    let last_frame_end = last_frame.end_time();

    let interaction_time = attribution.interaction_time;
    let processing_start = interaction_time + attribution.input_delay;
    let processing_end = processing_start + attribution.processing_duration;

    let mut total_script = 0.0;
    let mut total_style_and_layout = 0.0;
    let mut longest: Option<LongestScript> = None;

    for frame in &attribution.long_animation_frame_entries {
        total_style_and_layout += frame.end_time() - frame.style_and_layout_start;

        for script in &frame.scripts {
            let script_end = script.start_time + script.duration;
            if script_end < interaction_time {
                continue;
            }
            let intersecting = script_end - interaction_time.max(script.start_time);
            // 강제 스타일/레이아웃은 겹친 비율만큼만 스크립트에서 분리
            let forced_style_and_layout = if script.duration > 0.0 {
                intersecting / script.duration * script.forced_style_and_layout_duration
            } else {
                0.0
            };
            total_script += intersecting - forced_style_and_layout;
            total_style_and_layout += forced_style_and_layout;

            let is_longest = longest
                .as_ref()
                .map_or(true, |current| intersecting > current.intersecting_duration);
            if intersecting > 0.0 && is_longest {
                let subpart = if script.start_time < processing_start {
                    ScriptSubpart::InputDelay
                } else if script.start_time >= processing_end {
                    ScriptSubpart::PresentationDelay
                } else {
                    ScriptSubpart::ProcessingDuration
                };
                longest = Some(LongestScript {
                    entry: script.clone(),
                    subpart,
                    intersecting_duration: intersecting,
                });
            }
        }
    }

    let total_paint = if last_frame_end >= processing_end {
        attribution.next_paint_time - last_frame_end
    } else {
        0.0
    };

    attribution.longest_script = longest;
    attribution.total_script_duration = Some(total_script);
    attribution.total_style_and_layout_duration = Some(total_style_and_layout);
    attribution.total_paint_duration = Some(total_paint);
    attribution.total_unattributed_duration = Some(
        attribution.next_paint_time
            - interaction_time
            - total_script
            - total_style_and_layout
            - total_paint,
    );
}
