//! 최악 상호작용 집합과 상호작용 카운터.
//!
//! INP는 모든 상호작용을 저장하지 않고 지연이 가장 큰 N개만 유지한 뒤
//! `상호작용 수 / 50` 번째로 나쁜 값을 p98 근사치로 사용한다.

use std::collections::HashMap;

use pagevitals_core::models::entry::{EventTiming, PerformanceEntry};
use pagevitals_core::ports::page::PageHost;

/// 논리적 사용자 상호작용 하나
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// 상호작용 그룹 키 (`first-input`에 ID가 없으면 0)
    pub id: u64,
    /// 엔트리 중 최대 지속 시간
    pub latency: f64,
    pub entries: Vec<EventTiming>,
}

/// 지연 내림차순으로 정렬된 최대 `capacity`개의 상호작용
#[derive(Debug, Clone)]
pub struct WorstInteractions {
    capacity: usize,
    by_id: HashMap<u64, Interaction>,
    /// 지연 내림차순 ID (동률은 먼저 들어온 순)
    ranking: Vec<u64>,
}

impl WorstInteractions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            by_id: HashMap::with_capacity(capacity + 1),
            ranking: Vec::with_capacity(capacity + 1),
        }
    }

    /// `event` / `first-input` 엔트리 반영. 집합이 바뀌었으면 `true`.
    pub fn process(&mut self, entry: &PerformanceEntry) -> bool {
        match entry {
            PerformanceEntry::Event(event) if event.interaction_id != 0 => self.admit(event),
            PerformanceEntry::FirstInput(event) => {
                // 같은 이벤트가 `event` 엔트리로 이미 들어왔으면 중복 집계하지 않는다
                if self.contains_timing(event.duration, event.start_time) {
                    false
                } else {
                    self.admit(event)
                }
            }
            _ => false,
        }
    }

    fn contains_timing(&self, duration: f64, start_time: f64) -> bool {
        self.by_id.values().any(|interaction| {
            interaction
                .entries
                .iter()
                .any(|e| e.duration == duration && e.start_time == start_time)
        })
    }

    fn min_latency(&self) -> Option<f64> {
        self.ranking
            .last()
            .and_then(|id| self.by_id.get(id))
            .map(|interaction| interaction.latency)
    }

    fn admit(&mut self, event: &EventTiming) -> bool {
        let id = event.interaction_id;

        if let Some(existing) = self.by_id.get_mut(&id) {
            existing.entries.push(event.clone());
            if event.duration > existing.latency {
                existing.latency = event.duration;
                self.sort();
            }
            return true;
        }

        let has_room = self.ranking.len() < self.capacity;
        if !has_room && self.min_latency().map_or(false, |min| event.duration <= min) {
            return false;
        }

        self.by_id.insert(
            id,
            Interaction {
                id,
                latency: event.duration,
                entries: vec![event.clone()],
            },
        );
        self.ranking.push(id);
        self.sort();

        while self.ranking.len() > self.capacity {
            if let Some(evicted) = self.ranking.pop() {
                self.by_id.remove(&evicted);
            }
        }
        true
    }

    fn sort(&mut self) {
        let by_id = &self.by_id;
        let latency = |id: &u64| by_id.get(id).map_or(0.0, |i| i.latency);
        // 안정 정렬이므로 동률은 삽입 순서 유지
        self.ranking.sort_by(|a, b| latency(b).total_cmp(&latency(a)));
    }

    /// p98 근사: `min(len - 1, interaction_count / per_step)` 번째 상호작용
    pub fn estimate(&self, interaction_count: u64, per_step: u64) -> Option<&Interaction> {
        let last = self.ranking.len().checked_sub(1)?;
        let step = (interaction_count / per_step.max(1)) as usize;
        self.ranking
            .get(last.min(step))
            .and_then(|id| self.by_id.get(id))
    }

    /// 지연 내림차순 순회
    pub fn iter(&self) -> impl Iterator<Item = &Interaction> + '_ {
        self.ranking.iter().filter_map(|id| self.by_id.get(id))
    }

    /// 추적 중인 상호작용의 첫 엔트리들
    pub fn first_entries(&self) -> impl Iterator<Item = &EventTiming> + '_ {
        self.iter().filter_map(|interaction| interaction.entries.first())
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.ranking.clear();
    }
}

/// 페이지 전체 상호작용 카운터.
///
/// 호스트에 네이티브 카운터가 없으면 `event` 엔트리의 상호작용 ID 범위로 추정한다.
/// ID는 상호작용마다 7씩 증가하므로 `(max - min) / 7 + 1`.
#[derive(Debug, Clone, Default)]
pub struct InteractionCounter {
    polyfill: bool,
    min_id: Option<u64>,
    max_id: Option<u64>,
}

impl InteractionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 추정 모드 활성화 여부
    pub fn is_polyfilled(&self) -> bool {
        self.polyfill
    }

    pub fn enable_polyfill(&mut self) {
        self.polyfill = true;
    }

    /// 추정용 `event` 엔트리 반영
    pub fn observe(&mut self, entries: &[PerformanceEntry]) {
        for event in entries.iter().filter_map(PerformanceEntry::as_event_timing) {
            if event.interaction_id == 0 {
                continue;
            }
            let id = event.interaction_id;
            self.min_id = Some(self.min_id.map_or(id, |min| min.min(id)));
            self.max_id = Some(self.max_id.map_or(id, |max| max.max(id)));
        }
    }

    fn estimate(&self) -> u64 {
        match (self.min_id, self.max_id) {
            (Some(min), Some(max)) => (max - min) / 7 + 1,
            _ => 0,
        }
    }

    /// 현재 상호작용 수
    pub fn count(&self, page: &dyn PageHost) -> u64 {
        if self.polyfill {
            self.estimate()
        } else {
            page.interaction_count().unwrap_or(0)
        }
    }
}
