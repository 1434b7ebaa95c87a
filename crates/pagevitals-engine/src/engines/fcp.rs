//! FCP 엔진: `first-contentful-paint` 한 번 캡처.

use pagevitals_core::config::ReportOpts;
use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::models::metric::{MetricName, FCP_THRESHOLDS};
use pagevitals_core::ports::entry_source::ObserveOptions;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::reporter::Reporter;

const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

pub struct FcpEngine {
    reporter: Reporter,
    report_all_changes: bool,
    captured: bool,
    /// 복원 시각: 다음 턴에 `now - 복원 시각`을 리포트
    pending_restore: Option<f64>,
}

impl FcpEngine {
    pub fn new(view: &PageView<'_>, opts: &ReportOpts) -> Self {
        Self {
            reporter: Self::bind(view, opts.report_all_changes),
            report_all_changes: opts.report_all_changes,
            captured: false,
            pending_restore: None,
        }
    }

    fn bind(view: &PageView<'_>, report_all_changes: bool) -> Reporter {
        Reporter::bind(
            new_metric(MetricName::Fcp, -1.0, view),
            FCP_THRESHOLDS,
            report_all_changes,
        )
    }

    fn handle_entries(&mut self, entries: &[PerformanceEntry], view: &PageView<'_>) -> Outcome {
        let paint = entries.iter().find_map(|entry| match entry {
            PerformanceEntry::Paint(paint) if paint.name == FIRST_CONTENTFUL_PAINT => Some(paint),
            _ => None,
        });
        let Some(paint) = paint else {
            return Outcome::none();
        };

        let mut outcome = Outcome {
            disconnect: true,
            ..Outcome::none()
        };
        if self.captured {
            return outcome;
        }
        self.captured = true;

        if paint.start_time >= view.first_hidden_time {
            trace!("숨김 이후 FCP 무시: {:.1}ms", paint.start_time);
            return outcome;
        }

        let metric = self.reporter.metric_mut();
        metric.value = view.since_activation(paint.start_time);
        metric.entries.push(PerformanceEntry::Paint(paint.clone()));
        outcome.push(self.reporter.report(true, view.hidden));
        outcome
    }
}

impl MetricEngine for FcpEngine {
    fn name(&self) -> MetricName {
        MetricName::Fcp
    }

    fn requests(&self) -> Vec<EntryRequest> {
        vec![EntryRequest::required(EntryKind::Paint, ObserveOptions::buffered())]
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match signal {
            Signal::Entries(EntryKind::Paint, entries) => self.handle_entries(entries, view),
            Signal::Restore { time_stamp } => {
                self.reporter = Self::bind(view, self.report_all_changes);
                self.pending_restore = Some(time_stamp);
                debug!("FCP 새 에피소드 시작: {}", self.reporter.metric().id);
                Outcome::none()
            }
            Signal::Turn => match self.pending_restore.take() {
                Some(restored_at) => {
                    self.reporter.metric_mut().value = view.now() - restored_at;
                    Outcome::report(self.reporter.report(true, view.hidden))
                }
                None => Outcome::none(),
            },
            _ => Outcome::none(),
        }
    }
}
