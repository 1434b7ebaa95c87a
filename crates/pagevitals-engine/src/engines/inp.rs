//! INP 엔진.
//!
//! 최악 상호작용 집합을 유지하고, 에피소드의 상호작용 수로 p98 후보를 고른다.
//! 숨김 이후에도 관찰을 계속하며 숨김 때마다 현재 추정치를 확정 리포트한다.
//!
//! 어트리뷰션이 켜져 있으면 모든 이벤트 엔트리를 [`InpAttributor`]에 먼저 전달해
//! 프레임 그룹을 만들고, LoAF 엔트리도 함께 버퍼링한다.

use pagevitals_attribution::InpAttributor;
use pagevitals_core::config::{AttributionConfig, InpConfig, ReportOpts};
use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::models::metric::{MetricName, INP_THRESHOLDS};
use pagevitals_core::ports::entry_source::ObserveOptions;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::interactions::WorstInteractions;
use crate::reporter::Reporter;

pub struct InpEngine {
    reporter: Reporter,
    report_all_changes: bool,
    worst: WorstInteractions,
    interactions_per_step: u64,
    duration_threshold: f64,
    /// 에피소드 시작 시점의 페이지 상호작용 수
    baseline: u64,
    attributor: Option<InpAttributor>,
}

impl InpEngine {
    pub fn new(
        view: &PageView<'_>,
        opts: &ReportOpts,
        config: &InpConfig,
        attribution: Option<&AttributionConfig>,
    ) -> Self {
        Self {
            reporter: Self::bind(view, opts.report_all_changes),
            report_all_changes: opts.report_all_changes,
            worst: WorstInteractions::new(config.max_interactions),
            interactions_per_step: config.interactions_per_step,
            duration_threshold: opts
                .duration_threshold
                .unwrap_or(config.duration_threshold_ms),
            baseline: 0,
            attributor: attribution.map(InpAttributor::new),
        }
    }

    fn bind(view: &PageView<'_>, report_all_changes: bool) -> Reporter {
        Reporter::bind(
            new_metric(MetricName::Inp, -1.0, view),
            INP_THRESHOLDS,
            report_all_changes,
        )
    }

    /// 현재 에피소드의 상호작용 수
    fn episode_interactions(&self, view: &PageView<'_>) -> u64 {
        view.interaction_count.saturating_sub(self.baseline)
    }

    fn handle_events(&mut self, entries: &[PerformanceEntry], view: &PageView<'_>) -> Outcome {
        for entry in entries {
            if let Some(attributor) = self.attributor.as_mut() {
                attributor.observe_entry(entry);
            }
            self.worst.process(entry);
        }

        let mut outcome = Outcome::none();
        if self.refresh_estimate(view) {
            outcome.push(self.reporter.report(false, view.hidden));
        }

        if let Some(attributor) = self.attributor.as_mut() {
            attributor.cleanup(self.worst.first_entries());
        }
        outcome
    }

    /// 현재 상호작용 수로 p98 후보를 다시 골라 메트릭에 반영. 값이 바뀌었으면 `true`.
    ///
    /// 임계값 미만 상호작용은 엔트리 없이 카운터만 늘리므로 엔트리 배치와 무관하게 호출된다.
    fn refresh_estimate(&mut self, view: &PageView<'_>) -> bool {
        let count = self.episode_interactions(view);
        let Some(candidate) = self.worst.estimate(count, self.interactions_per_step) else {
            return false;
        };
        if candidate.latency == self.reporter.metric().value {
            return false;
        }
        trace!(
            "INP 후보 갱신: {:.0}ms (상호작용 {}개, 추적 {}개)",
            candidate.latency,
            count,
            self.worst.len()
        );
        let entries = candidate
            .entries
            .iter()
            .cloned()
            .map(PerformanceEntry::Event)
            .collect();
        let metric = self.reporter.metric_mut();
        metric.value = candidate.latency;
        metric.entries = entries;
        true
    }

    fn finalize(&mut self, view: &PageView<'_>) -> Outcome {
        self.refresh_estimate(view);
        // 상호작용은 있었지만 관찰된 엔트리가 없으면 0으로 리포트
        if !self.reporter.metric().is_measured() && self.episode_interactions(view) > 0 {
            let metric = self.reporter.metric_mut();
            metric.value = 0.0;
            metric.entries.clear();
        }
        Outcome::report(self.reporter.report(true, view.hidden))
    }
}

impl MetricEngine for InpEngine {
    fn name(&self) -> MetricName {
        MetricName::Inp
    }

    fn requests(&self) -> Vec<EntryRequest> {
        let mut requests = vec![
            EntryRequest::required(
                EntryKind::Event,
                ObserveOptions::buffered().with_duration_threshold(self.duration_threshold),
            ),
            EntryRequest::optional(EntryKind::FirstInput, ObserveOptions::buffered()),
        ];
        if self.attributor.is_some() {
            requests.push(EntryRequest::optional(
                EntryKind::LongAnimationFrame,
                ObserveOptions::buffered(),
            ));
        }
        requests
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match signal {
            Signal::Entries(EntryKind::Event | EntryKind::FirstInput, entries) => {
                self.handle_events(entries, view)
            }
            Signal::Entries(EntryKind::LongAnimationFrame, entries) => {
                if let Some(attributor) = self.attributor.as_mut() {
                    let frames: Vec<_> = entries
                        .iter()
                        .filter_map(|entry| match entry {
                            PerformanceEntry::LongAnimationFrame(frame) => Some(frame.clone()),
                            _ => None,
                        })
                        .collect();
                    attributor.observe_long_animation_frames(&frames);
                }
                Outcome::none()
            }
            Signal::Hidden => self.finalize(view),
            Signal::Restore { .. } => {
                self.worst.clear();
                self.baseline = view.interaction_count;
                if let Some(attributor) = self.attributor.as_mut() {
                    attributor.reset();
                }
                self.reporter = Self::bind(view, self.report_all_changes);
                debug!(
                    "INP 새 에피소드 시작: {} (상호작용 기준점 {})",
                    self.reporter.metric().id,
                    self.baseline
                );
                Outcome::none()
            }
            _ => Outcome::none(),
        }
    }

    fn counts_interactions(&self) -> bool {
        true
    }

    fn frames(&self) -> Option<&InpAttributor> {
        self.attributor.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{interaction, FakePage};
    use pagevitals_core::models::metric::NavigationType;

    fn events(timings: &[(u64, f64, f64)]) -> Vec<PerformanceEntry> {
        timings
            .iter()
            .map(|(id, start, duration)| PerformanceEntry::Event(interaction(*id, *start, *duration)))
            .collect()
    }

    fn view_with_count(page: &FakePage, count: u64) -> PageView<'_> {
        PageView {
            interaction_count: count,
            ..PageView::initial(page)
        }
    }

    fn engine(page: &FakePage, opts: ReportOpts) -> InpEngine {
        InpEngine::new(
            &PageView::initial(page),
            &opts,
            &InpConfig::default(),
            None,
        )
    }

    #[test]
    fn percentile_estimate_follows_interaction_count() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());

        let batch = events(&[(7, 100.0, 600.0), (14, 2000.0, 400.0), (21, 4000.0, 100.0)]);
        engine.handle(
            Signal::Entries(EntryKind::Event, &batch),
            &view_with_count(&page, 3),
        );
        let hidden = PageView {
            hidden: true,
            ..view_with_count(&page, 3)
        };
        let outcome = engine.handle(Signal::Hidden, &hidden);
        assert_eq!(outcome.reports[0].value, 600.0);

        // 50번째 상호작용까지 빠른 상호작용만 추가
        let fast: Vec<_> = (0..47u64)
            .map(|i| PerformanceEntry::Event(interaction(28 + 7 * i, 5000.0 + 100.0 * i as f64, 48.0)))
            .collect();
        engine.handle(
            Signal::Entries(EntryKind::Event, &fast),
            &view_with_count(&page, 50),
        );
        let hidden = PageView {
            hidden: true,
            ..view_with_count(&page, 50)
        };
        let outcome = engine.handle(Signal::Hidden, &hidden);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].value, 400.0);
        assert_eq!(outcome.reports[0].delta, -200.0);
    }

    #[test]
    fn hidden_reestimates_when_counter_grows_without_entries() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());

        let batch = events(&[(7, 100.0, 600.0), (14, 2000.0, 400.0), (21, 4000.0, 100.0)]);
        engine.handle(
            Signal::Entries(EntryKind::Event, &batch),
            &view_with_count(&page, 3),
        );

        // 임계값 미만 상호작용 47개: 엔트리 없이 카운터만 50으로 증가
        let hidden = PageView {
            hidden: true,
            ..view_with_count(&page, 50)
        };
        let outcome = engine.handle(Signal::Hidden, &hidden);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].value, 400.0);
        assert_eq!(outcome.reports[0].delta, 400.0);
        assert_eq!(outcome.reports[0].entries.len(), 1);
    }

    #[test]
    fn default_mode_reports_only_when_hidden() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());
        let batch = events(&[(7, 100.0, 240.0)]);
        let outcome = engine.handle(
            Signal::Entries(EntryKind::Event, &batch),
            &view_with_count(&page, 1),
        );
        assert!(outcome.reports.is_empty());
    }

    #[test]
    fn all_changes_reports_estimate_changes_only() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::all_changes());

        let view = view_with_count(&page, 2);
        let first = events(&[(7, 100.0, 240.0)]);
        assert_eq!(
            engine
                .handle(Signal::Entries(EntryKind::Event, &first), &view)
                .reports
                .len(),
            1
        );
        // 더 빠른 상호작용은 추정치를 바꾸지 않는다
        let faster = events(&[(14, 900.0, 80.0)]);
        assert!(engine
            .handle(Signal::Entries(EntryKind::Event, &faster), &view)
            .reports
            .is_empty());
    }

    #[test]
    fn interactions_without_entries_report_zero() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());
        let hidden = PageView {
            hidden: true,
            ..view_with_count(&page, 4)
        };
        let outcome = engine.handle(Signal::Hidden, &hidden);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].value, 0.0);
        assert!(outcome.reports[0].entries.is_empty());
    }

    #[test]
    fn no_interactions_no_report() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());
        let hidden = PageView {
            hidden: true,
            ..PageView::initial(&page)
        };
        assert!(engine.handle(Signal::Hidden, &hidden).reports.is_empty());
    }

    #[test]
    fn restore_reanchors_interaction_baseline() {
        let page = FakePage::loaded(60_000.0);
        let mut engine = engine(&page, ReportOpts::default());
        let slow: Vec<_> = (0..60u64)
            .map(|i| PerformanceEntry::Event(interaction(7 + 7 * i, 100.0 * i as f64, 48.0 + i as f64)))
            .collect();
        engine.handle(
            Signal::Entries(EntryKind::Event, &slow),
            &view_with_count(&page, 60),
        );

        let restored = PageView {
            restore_time: Some(30_000.0),
            ..view_with_count(&page, 60)
        };
        engine.handle(Signal::Restore { time_stamp: 30_000.0 }, &restored);

        let after = events(&[(1000, 31_000.0, 300.0), (1007, 32_000.0, 120.0)]);
        let now = PageView {
            interaction_count: 62,
            ..restored
        };
        engine.handle(Signal::Entries(EntryKind::Event, &after), &now);
        let outcome = engine.handle(Signal::Hidden, &PageView { hidden: true, ..now });

        // 에피소드 상호작용 2개 → 인덱스 0 (최악값)
        let metric = &outcome.reports[0];
        assert_eq!(metric.value, 300.0);
        assert_eq!(metric.delta, 300.0);
        assert_eq!(metric.navigation_type, NavigationType::BackForwardCache);
    }

    #[test]
    fn requests_depend_on_attribution() {
        let page = FakePage::loaded(1000.0);
        let view = PageView::initial(&page);
        let opts = ReportOpts::default().with_duration_threshold(16.0);
        let plain = InpEngine::new(&view, &opts, &InpConfig::default(), None);
        let requests = plain.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].options.duration_threshold, Some(16.0));
        assert!(requests[0].required);
        assert!(!requests[1].required);

        let attributed = InpEngine::new(
            &view,
            &opts,
            &InpConfig::default(),
            Some(&AttributionConfig::default()),
        );
        assert_eq!(attributed.requests().len(), 3);
        assert!(attributed.frames().is_some());
    }
}
