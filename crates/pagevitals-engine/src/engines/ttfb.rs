//! TTFB 엔진.
//!
//! 일부 타이밍 필드는 `load` 이후에야 확정되므로, 문서 로드가 끝난 뒤
//! 다음 태스크 턴에 내비게이션 엔트리를 읽는다. 엔트리 구독은 사용하지 않는다.

use pagevitals_core::config::ReportOpts;
use pagevitals_core::models::entry::PerformanceEntry;
use pagevitals_core::models::lifecycle::ReadyState;
use pagevitals_core::models::metric::{MetricName, TTFB_THRESHOLDS};
use tracing::{debug, warn};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::reporter::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingLoad,
    AwaitingTurn,
    /// 측정 불가 (엔트리 없음 또는 비정상 값)
    Abandoned,
    Reported,
}

pub struct TtfbEngine {
    reporter: Reporter,
    report_all_changes: bool,
    phase: Phase,
}

impl TtfbEngine {
    pub fn new(view: &PageView<'_>, opts: &ReportOpts) -> Self {
        Self {
            reporter: Reporter::bind(
                new_metric(MetricName::Ttfb, -1.0, view),
                TTFB_THRESHOLDS,
                opts.report_all_changes,
            ),
            report_all_changes: opts.report_all_changes,
            phase: Phase::Idle,
        }
    }

    fn measure(&mut self, view: &PageView<'_>) -> Outcome {
        let Some(navigation) = view.page.navigation_entry() else {
            debug!("내비게이션 엔트리 없음: TTFB 측정 생략");
            self.phase = Phase::Abandoned;
            return Outcome::none();
        };

        let response_start = navigation.response_start;
        if response_start <= 0.0 || response_start > view.now() {
            warn!(
                "비정상 responseStart 무시: {:.1}ms (now={:.1}ms)",
                response_start,
                view.now()
            );
            self.phase = Phase::Abandoned;
            return Outcome::none();
        }

        let metric = self.reporter.metric_mut();
        metric.value = view.since_activation(response_start);
        metric.entries = vec![PerformanceEntry::Navigation(navigation)];
        self.phase = Phase::Reported;
        Outcome::report(self.reporter.report(true, view.hidden))
    }
}

impl MetricEngine for TtfbEngine {
    fn name(&self) -> MetricName {
        MetricName::Ttfb
    }

    fn requests(&self) -> Vec<EntryRequest> {
        Vec::new()
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match (signal, self.phase) {
            (Signal::Start, Phase::Idle) => {
                self.phase = if view.page.ready_state() == ReadyState::Complete {
                    Phase::AwaitingTurn
                } else {
                    Phase::AwaitingLoad
                };
                Outcome::none()
            }
            (Signal::Loaded, Phase::AwaitingLoad) => {
                self.phase = Phase::AwaitingTurn;
                Outcome::none()
            }
            (Signal::Turn, Phase::AwaitingTurn) => self.measure(view),
            // 첫 측정에 성공한 경우에만 복원 에피소드를 리포트
            (Signal::Restore { .. }, Phase::Reported) => {
                self.reporter = Reporter::bind(
                    new_metric(MetricName::Ttfb, 0.0, view),
                    TTFB_THRESHOLDS,
                    self.report_all_changes,
                );
                Outcome::report(self.reporter.report(true, view.hidden))
            }
            _ => Outcome::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePage;
    use pagevitals_core::models::metric::{NavigationType, Rating};

    fn started(page: &FakePage) -> TtfbEngine {
        let view = PageView::initial(page);
        let mut engine = TtfbEngine::new(&view, &ReportOpts::default());
        engine.handle(Signal::Start, &view);
        engine
    }

    #[test]
    fn waits_for_load_then_next_turn() {
        let mut page = FakePage::loaded(2000.0);
        page.ready_state = ReadyState::Interactive;
        let mut engine = started(&page);
        let view = PageView::initial(&page);

        assert!(engine.handle(Signal::Turn, &view).reports.is_empty());
        assert!(engine.handle(Signal::Loaded, &view).reports.is_empty());

        let outcome = engine.handle(Signal::Turn, &view);
        assert_eq!(outcome.reports.len(), 1);
        let metric = &outcome.reports[0];
        assert_eq!(metric.value, 300.0);
        assert_eq!(metric.rating, Rating::Good);
        assert_eq!(metric.entries.len(), 1);
    }

    #[test]
    fn loaded_document_reports_on_first_turn() {
        let page = FakePage::loaded(2000.0);
        let mut engine = started(&page);
        let outcome = engine.handle(Signal::Turn, &PageView::initial(&page));
        assert_eq!(outcome.reports[0].value, 300.0);
    }

    #[test]
    fn implausible_response_start_is_discarded() {
        for response_start in [0.0, -5.0, 9000.0] {
            let mut page = FakePage::loaded(2000.0);
            if let Some(nav) = page.navigation.as_mut() {
                nav.response_start = response_start;
            }
            let mut engine = started(&page);
            let view = PageView::initial(&page);
            assert!(engine.handle(Signal::Turn, &view).reports.is_empty());
            // 측정 실패 후에는 복원도 리포트하지 않는다
            let restored = PageView {
                restore_time: Some(3000.0),
                ..view
            };
            assert!(engine
                .handle(Signal::Restore { time_stamp: 3000.0 }, &restored)
                .reports
                .is_empty());
        }
    }

    #[test]
    fn activation_start_is_subtracted() {
        let mut page = FakePage::loaded(2000.0);
        if let Some(nav) = page.navigation.as_mut() {
            nav.activation_start = 450.0;
        }
        let mut engine = started(&page);
        let outcome = engine.handle(Signal::Turn, &PageView::initial(&page));
        assert_eq!(outcome.reports[0].value, 0.0);
        assert_eq!(outcome.reports[0].navigation_type, NavigationType::Prerender);
    }

    #[test]
    fn restore_reports_forced_zero() {
        let page = FakePage::loaded(2000.0);
        let mut engine = started(&page);
        let view = PageView::initial(&page);
        let first = engine.handle(Signal::Turn, &view).reports;

        let restored = PageView {
            restore_time: Some(8000.0),
            ..view
        };
        let outcome = engine.handle(Signal::Restore { time_stamp: 8000.0 }, &restored);
        assert_eq!(outcome.reports.len(), 1);
        let metric = &outcome.reports[0];
        assert_eq!(metric.value, 0.0);
        assert_eq!(metric.delta, 0.0);
        assert!(metric.entries.is_empty());
        assert_ne!(metric.id, first[0].id);
        assert_eq!(metric.navigation_type, NavigationType::BackForwardCache);
    }
}
