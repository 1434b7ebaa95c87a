//! 테스트용 고정 페이지 상태.

use std::collections::HashMap;

use pagevitals_core::models::entry::{NavigationTiming, ResourceTiming};
use pagevitals_core::models::lifecycle::{ReadyState, VisibilityState};
use pagevitals_core::ports::page::PageHost;

#[derive(Default)]
pub struct StaticPage {
    pub now: f64,
    pub ready_state: ReadyState,
    pub navigation: Option<NavigationTiming>,
    pub resources: HashMap<String, ResourceTiming>,
}

impl StaticPage {
    /// 로드가 끝난 페이지 (domInteractive 500, DCL 800, complete 1500)
    pub fn loaded() -> Self {
        Self {
            now: 10_000.0,
            ready_state: ReadyState::Complete,
            navigation: Some(NavigationTiming {
                fetch_start: 5.0,
                domain_lookup_start: 20.0,
                connect_start: 40.0,
                connect_end: 90.0,
                request_start: 100.0,
                response_start: 300.0,
                dom_interactive: 500.0,
                dom_content_loaded_event_start: 800.0,
                dom_complete: 1500.0,
                ..NavigationTiming::default()
            }),
            resources: HashMap::new(),
        }
    }
}

impl PageHost for StaticPage {
    fn now(&self) -> f64 {
        self.now
    }

    fn visibility_state(&self) -> VisibilityState {
        VisibilityState::Visible
    }

    fn is_prerendering(&self) -> bool {
        false
    }

    fn was_discarded(&self) -> bool {
        false
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
        None
    }
}
