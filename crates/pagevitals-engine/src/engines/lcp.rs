//! LCP 엔진: 마지막 후보 엔트리가 이긴다.
//!
//! 첫 keydown/click 입력 또는 숨김 시점에 확정하고 구독을 끊는다.

use pagevitals_core::config::ReportOpts;
use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::models::metric::{MetricName, LCP_THRESHOLDS};
use pagevitals_core::ports::entry_source::ObserveOptions;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::reporter::Reporter;

pub struct LcpEngine {
    reporter: Reporter,
    report_all_changes: bool,
    finalized: bool,
    pending_restore: Option<f64>,
}

impl LcpEngine {
    pub fn new(view: &PageView<'_>, opts: &ReportOpts) -> Self {
        Self {
            reporter: Self::bind(view, opts.report_all_changes),
            report_all_changes: opts.report_all_changes,
            finalized: false,
            pending_restore: None,
        }
    }

    fn bind(view: &PageView<'_>, report_all_changes: bool) -> Reporter {
        Reporter::bind(
            new_metric(MetricName::Lcp, -1.0, view),
            LCP_THRESHOLDS,
            report_all_changes,
        )
    }

    fn handle_entries(&mut self, entries: &[PerformanceEntry], view: &PageView<'_>) -> Outcome {
        if self.finalized {
            return Outcome::none();
        }

        // 모든 변화를 리포트하지 않으면 배치의 마지막 후보만 본다
        let candidates = if self.report_all_changes {
            entries
        } else {
            &entries[entries.len().saturating_sub(1)..]
        };

        let mut outcome = Outcome::none();
        for entry in candidates {
            let PerformanceEntry::LargestContentfulPaint(lcp) = entry else {
                continue;
            };
            if lcp.start_time >= view.first_hidden_time {
                trace!("숨김 이후 LCP 후보 무시: {:.1}ms", lcp.start_time);
                continue;
            }
            let metric = self.reporter.metric_mut();
            metric.value = view.since_activation(lcp.start_time);
            metric.entries = vec![entry.clone()];
            outcome.push(self.reporter.report(false, view.hidden));
        }
        outcome
    }

    fn finalize(&mut self, view: &PageView<'_>) -> Outcome {
        if self.finalized {
            return Outcome::none();
        }
        self.finalized = true;
        debug!("LCP 확정: {:.1}ms", self.reporter.metric().value);
        Outcome {
            reports: self.reporter.report(true, view.hidden).into_iter().collect(),
            disconnect: true,
        }
    }
}

impl MetricEngine for LcpEngine {
    fn name(&self) -> MetricName {
        MetricName::Lcp
    }

    fn requests(&self) -> Vec<EntryRequest> {
        vec![EntryRequest::required(
            EntryKind::LargestContentfulPaint,
            ObserveOptions::buffered(),
        )]
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match signal {
            Signal::Entries(EntryKind::LargestContentfulPaint, entries) => {
                self.handle_entries(entries, view)
            }
            Signal::Input { kind, .. } if kind.ends_largest_paint() => self.finalize(view),
            Signal::Hidden => self.finalize(view),
            Signal::Restore { time_stamp } => {
                self.reporter = Self::bind(view, self.report_all_changes);
                self.finalized = true;
                self.pending_restore = Some(time_stamp);
                debug!("LCP 새 에피소드 시작: {}", self.reporter.metric().id);
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
