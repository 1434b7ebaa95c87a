//! 테스트용 가짜 호스트.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use pagevitals_core::models::entry::{
    EntryKind, EventTiming, LayoutShift, NavigationTiming, PerformanceEntry, ResourceTiming,
};
use pagevitals_core::models::lifecycle::{ReadyState, VisibilityState};
use pagevitals_core::ports::entry_source::{EntrySource, ObserveOptions, SubscriptionId};
use pagevitals_core::ports::page::PageHost;

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub now: f64,
    pub hidden: bool,
    pub prerendering: bool,
    pub discarded: bool,
    pub ready_state: ReadyState,
    pub navigation: Option<NavigationTiming>,
    pub resources: HashMap<String, ResourceTiming>,
    pub interaction_count: Option<u64>,
}

impl FakePage {
    /// 로드 완료된 일반 내비게이션 (응답 시작 300ms)
    pub fn loaded(now: f64) -> Self {
        Self {
            now,
            ready_state: ReadyState::Complete,
            navigation: Some(NavigationTiming {
                response_start: 300.0,
                dom_interactive: 500.0,
                dom_content_loaded_event_start: 800.0,
                dom_complete: 1500.0,
                ..NavigationTiming::default()
            }),
            ..Self::default()
        }
    }
}

impl PageHost for FakePage {
    fn now(&self) -> f64 {
        self.now
    }

    fn visibility_state(&self) -> VisibilityState {
        if self.hidden {
            VisibilityState::Hidden
        } else {
            VisibilityState::Visible
        }
    }

    fn is_prerendering(&self) -> bool {
        self.prerendering
    }

    fn was_discarded(&self) -> bool {
        self.discarded
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn navigation_entry(&self) -> Option<NavigationTiming> {
        self.navigation.clone()
    }

    fn resource_timing(&self, url: &str) -> Option<ResourceTiming> {
        self.resources.get(url).cloned()
    }

    fn interaction_count(&self) -> Option<u64> {
        self.interaction_count
    }
}

/// 테스트와 런타임이 함께 쓰는 페이지
#[derive(Clone, Default)]
pub struct SharedPage(pub Rc<RefCell<FakePage>>);

impl PageHost for SharedPage {
    fn now(&self) -> f64 {
        self.0.borrow().now
    }

    fn visibility_state(&self) -> VisibilityState {
        self.0.borrow().visibility_state()
    }

    fn is_prerendering(&self) -> bool {
        self.0.borrow().prerendering
    }

    fn was_discarded(&self) -> bool {
        self.0.borrow().discarded
    }

    fn ready_state(&self) -> ReadyState {
        self.0.borrow().ready_state
    }

    fn navigation_entry(&self) -> Option<NavigationTiming> {
        self.0.borrow().navigation.clone()
    }

    fn resource_timing(&self, url: &str) -> Option<ResourceTiming> {
        self.0.borrow().resource_timing(url)
    }

    fn interaction_count(&self) -> Option<u64> {
        self.0.borrow().interaction_count
    }
}

#[derive(Debug, Default)]
pub struct SourceState {
    next_id: u64,
    pub unsupported: HashSet<EntryKind>,
    pub observed: Vec<(SubscriptionId, EntryKind, ObserveOptions)>,
    pub queued: HashMap<SubscriptionId, Vec<PerformanceEntry>>,
    pub disconnected: Vec<SubscriptionId>,
}

impl SourceState {
    /// 해당 종류로 열린 구독 ID (가장 최근)
    pub fn subscription_for(&self, kind: EntryKind) -> Option<SubscriptionId> {
        self.observed
            .iter()
            .rev()
            .find(|(_, k, _)| *k == kind)
            .map(|(id, _, _)| *id)
    }
}

/// 관찰 요청을 기록하고 큐에 넣어 둔 엔트리를 `take_records`로 돌려주는 소스
#[derive(Clone, Default)]
pub struct FakeSource(pub Rc<RefCell<SourceState>>);

impl EntrySource for FakeSource {
    fn observe(&mut self, kind: EntryKind, options: &ObserveOptions) -> Option<SubscriptionId> {
        let mut state = self.0.borrow_mut();
        if state.unsupported.contains(&kind) {
            return None;
        }
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.observed.push((id, kind, *options));
        Some(id)
    }

    fn take_records(&mut self, subscription: SubscriptionId) -> Vec<PerformanceEntry> {
        self.0
            .borrow_mut()
            .queued
            .remove(&subscription)
            .unwrap_or_default()
    }

    fn disconnect(&mut self, subscription: SubscriptionId) {
        self.0.borrow_mut().disconnected.push(subscription);
    }
}

pub fn shift(start_time: f64, value: f64) -> PerformanceEntry {
    PerformanceEntry::LayoutShift(LayoutShift {
        start_time,
        value,
        ..LayoutShift::default()
    })
}

pub fn interaction(interaction_id: u64, start_time: f64, duration: f64) -> EventTiming {
    EventTiming {
        name: "pointerup".to_string(),
        start_time,
        duration,
        processing_start: start_time + 4.0,
        processing_end: start_time + duration / 2.0,
        interaction_id,
        ..EventTiming::default()
    }
}
