//! FID 엔진 (레거시).
//!
//! 첫 입력의 `processingStart - startTime`. 브라우저는 bfcache 복원 후
//! `first-input`을 다시 내보내지 않으므로, 복원 에피소드에서는 첫 개별 입력
//! 이벤트로 엔트리를 합성한다.

use pagevitals_core::config::ReportOpts;
use pagevitals_core::models::entry::{EntryKind, EventTiming, PerformanceEntry};
use pagevitals_core::models::metric::{Metric, MetricName, FID_THRESHOLDS};
use pagevitals_core::ports::entry_source::ObserveOptions;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::reporter::Reporter;

pub struct FidEngine {
    reporter: Reporter,
    report_all_changes: bool,
    disconnected: bool,
    /// 복원 후 첫 개별 입력 대기 중
    awaiting_input: bool,
}

impl FidEngine {
    pub fn new(view: &PageView<'_>, opts: &ReportOpts) -> Self {
        Self {
            reporter: Self::bind(view, opts.report_all_changes),
            report_all_changes: opts.report_all_changes,
            disconnected: false,
            awaiting_input: false,
        }
    }

    fn bind(view: &PageView<'_>, report_all_changes: bool) -> Reporter {
        Reporter::bind(
            new_metric(MetricName::Fid, -1.0, view),
            FID_THRESHOLDS,
            report_all_changes,
        )
    }

    fn handle_entry(&mut self, entry: &EventTiming, view: &PageView<'_>) -> Option<Metric> {
        if entry.start_time >= view.first_hidden_time {
            trace!("숨김 이후 첫 입력 무시: {:.1}ms", entry.start_time);
            return None;
        }
        let metric = self.reporter.metric_mut();
        metric.value = entry.processing_start - entry.start_time;
        metric.entries.push(PerformanceEntry::FirstInput(entry.clone()));
        self.reporter.report(true, view.hidden)
    }

    /// 복원 에피소드용 합성 엔트리
    fn synthesize(kind_name: &str, time_stamp: f64, view: &PageView<'_>) -> Option<EventTiming> {
        let delay = view.now() - time_stamp;
        if delay < 0.0 {
            return None;
        }
        Some(EventTiming {
            name: kind_name.to_string(),
            start_time: time_stamp,
            duration: 0.0,
            processing_start: time_stamp + delay,
            processing_end: time_stamp + delay,
            interaction_id: 0,
            target: None,
            cancelable: true,
        })
    }
}

impl MetricEngine for FidEngine {
    fn name(&self) -> MetricName {
        MetricName::Fid
    }

    fn requests(&self) -> Vec<EntryRequest> {
        vec![EntryRequest::required(
            EntryKind::FirstInput,
            ObserveOptions::buffered(),
        )]
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match signal {
            Signal::Entries(EntryKind::FirstInput, entries) => {
                let mut outcome = Outcome::none();
                for event in entries.iter().filter_map(PerformanceEntry::as_event_timing) {
                    let report = self.handle_entry(event, view);
                    outcome.push(report);
                }
                outcome
            }
            Signal::Hidden if !self.disconnected => {
                self.disconnected = true;
                Outcome {
                    disconnect: true,
                    ..Outcome::none()
                }
            }
            Signal::Restore { .. } => {
                self.reporter = Self::bind(view, self.report_all_changes);
                self.awaiting_input = true;
                debug!("FID 새 에피소드 시작: {}", self.reporter.metric().id);
                Outcome::none()
            }
            Signal::Input { kind, time_stamp } if self.awaiting_input && kind.is_discrete() => {
                let Some(entry) = Self::synthesize(kind.as_str(), time_stamp, view) else {
                    return Outcome::none();
                };
                self.awaiting_input = false;
                Outcome::report(self.handle_entry(&entry, view))
            }
            _ => Outcome::none(),
        }
    }
}
