//! 로드 단계 분류.

use pagevitals_core::models::attribution::LoadState;
use pagevitals_core::models::lifecycle::ReadyState;
use pagevitals_core::ports::page::PageHost;

/// `timestamp` 시점의 문서 로드 단계
///
/// 문서가 아직 로딩 중이면 항상 `Loading`. 내비게이션 타이밍이 없으면 `Complete`.
pub fn load_state_at(page: &dyn PageHost, timestamp: f64) -> LoadState {
    if page.ready_state() == ReadyState::Loading {
        return LoadState::Loading;
    }

    let Some(nav) = page.navigation_entry() else {
        return LoadState::Complete;
    };

    if timestamp < nav.dom_interactive {
        LoadState::Loading
    } else if nav.dom_content_loaded_event_start == 0.0
        || timestamp < nav.dom_content_loaded_event_start
    {
        LoadState::DomInteractive
    } else if nav.dom_complete == 0.0 || timestamp < nav.dom_complete {
        LoadState::DomContentLoaded
    } else {
        LoadState::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page::StaticPage;

    #[test]
    fn classifies_against_navigation_milestones() {
        let page = StaticPage::loaded();
        assert_eq!(load_state_at(&page, 100.0), LoadState::Loading);
        assert_eq!(load_state_at(&page, 600.0), LoadState::DomInteractive);
        assert_eq!(load_state_at(&page, 900.0), LoadState::DomContentLoaded);
        assert_eq!(load_state_at(&page, 2000.0), LoadState::Complete);
    }

    #[test]
    fn loading_document_wins() {
        let mut page = StaticPage::loaded();
        page.ready_state = ReadyState::Loading;
        assert_eq!(load_state_at(&page, 5000.0), LoadState::Loading);
    }

    #[test]
    fn missing_navigation_is_complete() {
        let mut page = StaticPage::loaded();
        page.navigation = None;
        assert_eq!(load_state_at(&page, 0.0), LoadState::Complete);
    }
}
