//! 스크립트 호스트: 두 포트를 메모리 안에서 구현한다.
//!
//! 브라우저 관찰 소스처럼 기록된 엔트리를 이력에 남겨 버퍼 재생을 지원하고,
//! `event` 구독에는 최소 지속 시간 필터(기본 104ms, 하한 16ms)를 적용한다.
//! 전달되지 않은 엔트리는 구독별 큐에 남아 `take_records`로 꺼낼 수 있다.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use pagevitals_core::models::entry::{
    EntryKind, NavigationTiming, PerformanceEntry, ResourceTiming,
};
use pagevitals_core::models::lifecycle::{HostEvent, ReadyState, VisibilityState};
use pagevitals_core::ports::entry_source::{EntrySource, ObserveOptions, SubscriptionId};
use pagevitals_core::ports::page::PageHost;
use tracing::trace;

use crate::error::ReplayError;
use crate::scenario::PageSetup;

/// `durationThreshold` 미지정 시 `event` 구독 기본값 (ms)
pub const DEFAULT_EVENT_DURATION_THRESHOLD: f64 = 104.0;

/// `event` 구독 최소 지속 시간 하한 (ms)
pub const MIN_EVENT_DURATION_THRESHOLD: f64 = 16.0;

#[derive(Debug)]
struct Channel {
    kind: EntryKind,
    options: ObserveOptions,
    queue: Vec<PerformanceEntry>,
}

impl Channel {
    fn accepts(&self, entry: &PerformanceEntry) -> bool {
        if entry.kind() != self.kind {
            return false;
        }
        if self.kind != EntryKind::Event {
            return true;
        }
        let threshold = self
            .options
            .duration_threshold
            .unwrap_or(DEFAULT_EVENT_DURATION_THRESHOLD)
            .max(MIN_EVENT_DURATION_THRESHOLD);
        entry.duration() >= threshold
    }
}

#[derive(Debug, Default)]
struct HostState {
    now: f64,
    hidden: bool,
    prerendering: bool,
    discarded: bool,
    ready_state: ReadyState,
    navigation: Option<NavigationTiming>,
    resources: HashMap<String, ResourceTiming>,
    native_interaction_count: bool,
    unsupported: HashSet<EntryKind>,
    interaction_ids: HashSet<u64>,
    history: Vec<PerformanceEntry>,
    channels: BTreeMap<SubscriptionId, Channel>,
    next_id: u64,
    disconnected: Vec<SubscriptionId>,
}

/// 메모리 호스트 (복제본은 같은 상태를 공유)
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost(Rc<RefCell<HostState>>);

impl ScriptedHost {
    pub fn new(setup: &PageSetup) -> Self {
        let state = HostState {
            hidden: setup.hidden,
            prerendering: setup.prerendering,
            discarded: setup.discarded,
            ready_state: setup.ready_state,
            navigation: setup.navigation.clone(),
            resources: setup
                .resources
                .iter()
                .map(|r| (r.name.clone(), r.clone()))
                .collect(),
            native_interaction_count: setup.native_interaction_count,
            unsupported: setup.unsupported.iter().copied().collect(),
            ..HostState::default()
        };
        Self(Rc::new(RefCell::new(state)))
    }

    /// 현재 시각 이동. 되돌아갈 수는 없다.
    pub fn advance_to(&self, now: f64) -> Result<(), ReplayError> {
        let mut state = self.0.borrow_mut();
        if now < state.now {
            return Err(ReplayError::InvalidStep(format!(
                "시각은 되돌릴 수 없음: {:.1}ms → {:.1}ms",
                state.now, now
            )));
        }
        state.now = now;
        Ok(())
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.0.borrow_mut().hidden = hidden;
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.0.borrow_mut().ready_state = ready_state;
    }

    /// 프리렌더 종료. 내비게이션 엔트리의 활성화 시각을 현재 시각으로 기록한다.
    pub fn activate(&self) {
        let mut state = self.0.borrow_mut();
        state.prerendering = false;
        let now = state.now;
        if let Some(navigation) = state.navigation.as_mut() {
            if navigation.activation_start == 0.0 {
                navigation.activation_start = now;
            }
        }
    }

    /// 브라우저가 엔트리를 생성: 이력에 남기고 조건에 맞는 구독 큐에 넣는다
    pub fn record(&self, entry: PerformanceEntry) {
        let mut state = self.0.borrow_mut();
        if let PerformanceEntry::Event(event) = &entry {
            if event.interaction_id > 0 {
                state.interaction_ids.insert(event.interaction_id);
            }
        }
        for channel in state.channels.values_mut() {
            if channel.accepts(&entry) {
                channel.queue.push(entry.clone());
            }
        }
        state.history.push(entry);
    }

    /// 큐에 쌓인 엔트리를 모두 전달 이벤트로 꺼낸다 (구독 ID 순)
    pub fn take_deliveries(&self) -> Vec<HostEvent> {
        let mut state = self.0.borrow_mut();
        let deliveries = state
            .channels
            .iter_mut()
            .filter(|(_, channel)| !channel.queue.is_empty())
            .map(|(id, channel)| HostEvent::Entries {
                subscription: *id,
                entries: std::mem::take(&mut channel.queue),
            })
            .collect();
        deliveries
    }

    /// 구독 하나의 큐를 전달 이벤트로 꺼낸다
    pub fn take_delivery(&self, id: SubscriptionId) -> Result<Option<HostEvent>, ReplayError> {
        let mut state = self.0.borrow_mut();
        let channel = state
            .channels
            .get_mut(&id)
            .ok_or(ReplayError::UnknownSubscription(id))?;
        if channel.queue.is_empty() {
            return Ok(None);
        }
        Ok(Some(HostEvent::Entries {
            subscription: id,
            entries: std::mem::take(&mut channel.queue),
        }))
    }

    /// 열린 구독 (ID, 종류, 옵션)
    pub fn subscriptions(&self) -> Vec<(SubscriptionId, EntryKind, ObserveOptions)> {
        self.0
            .borrow()
            .channels
            .iter()
            .map(|(id, channel)| (*id, channel.kind, channel.options))
            .collect()
    }

    /// 종료된 구독 (종료 순)
    pub fn disconnected(&self) -> Vec<SubscriptionId> {
        self.0.borrow().disconnected.clone()
    }
}

impl EntrySource for ScriptedHost {
    fn observe(&mut self, kind: EntryKind, options: &ObserveOptions) -> Option<SubscriptionId> {
        let mut state = self.0.borrow_mut();
        if state.unsupported.contains(&kind) {
            return None;
        }
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        let mut channel = Channel {
            kind,
            options: *options,
            queue: Vec::new(),
        };
        if options.buffered {
            let replayed: Vec<PerformanceEntry> = state
                .history
                .iter()
                .filter(|entry| channel.accepts(entry))
                .cloned()
                .collect();
            channel.queue = replayed;
        }
        trace!(
            "스크립트 구독 {}: {} (버퍼 {}개)",
            id,
            kind.as_str(),
            channel.queue.len()
        );
        state.channels.insert(id, channel);
        Some(id)
    }

    fn take_records(&mut self, subscription: SubscriptionId) -> Vec<PerformanceEntry> {
        self.0
            .borrow_mut()
            .channels
            .get_mut(&subscription)
            .map(|channel| std::mem::take(&mut channel.queue))
            .unwrap_or_default()
    }

    fn disconnect(&mut self, subscription: SubscriptionId) {
        let mut state = self.0.borrow_mut();
        if state.channels.remove(&subscription).is_some() {
            state.disconnected.push(subscription);
        }
    }
}

impl PageHost for ScriptedHost {
    fn now(&self) -> f64 {
        self.0.borrow().now
    }

    fn visibility_state(&self) -> VisibilityState {
        if self.0.borrow().hidden {
            VisibilityState::Hidden
        } else {
            VisibilityState::Visible
        }
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
        self.0.borrow().resources.get(url).cloned()
    }

    fn interaction_count(&self) -> Option<u64> {
        let state = self.0.borrow();
        if state.native_interaction_count {
            Some(state.interaction_ids.len() as u64)
        } else {
            None
        }
    }
}
