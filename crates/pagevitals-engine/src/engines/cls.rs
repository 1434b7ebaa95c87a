//! CLS 엔진: 세션 윈도우 누적.
//!
//! 이동 간격이 1초 미만이고 세션 시작부터 5초 미만이면 같은 세션으로 합산하고,
//! 가장 큰 세션 합을 CLS 값으로 사용한다. 숨김 이후에도 관찰은 계속된다.

use pagevitals_core::config::ReportOpts;
use pagevitals_core::models::entry::{EntryKind, LayoutShift, PerformanceEntry};
use pagevitals_core::models::metric::{MetricName, CLS_THRESHOLDS};
use pagevitals_core::ports::entry_source::ObserveOptions;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{EntryRequest, MetricEngine, Outcome, Signal};
use crate::episode::new_metric;
use crate::reporter::Reporter;

const SESSION_GAP_MS: f64 = 1000.0;
const SESSION_SPAN_MS: f64 = 5000.0;

/// 현재 세션 윈도우
#[derive(Debug, Clone, Default)]
pub struct SessionWindow {
    entries: Vec<LayoutShift>,
    value: f64,
}

impl SessionWindow {
    /// 이동 하나 반영. 사용자 입력 직후 이동은 무시.
    pub fn push(&mut self, shift: &LayoutShift) {
        if shift.had_recent_input {
            return;
        }

        let joins = match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => {
                self.value > 0.0
                    && shift.start_time - last.start_time < SESSION_GAP_MS
                    && shift.start_time - first.start_time < SESSION_SPAN_MS
            }
            _ => false,
        };

        if joins {
            self.value += shift.value;
            self.entries.push(shift.clone());
        } else {
            self.value = shift.value;
            self.entries = vec![shift.clone()];
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn entries(&self) -> &[LayoutShift] {
        &self.entries
    }
}

pub struct ClsEngine {
    reporter: Reporter,
    session: SessionWindow,
    report_all_changes: bool,
    report_on_turn: bool,
}

impl ClsEngine {
    pub fn new(view: &PageView<'_>, opts: &ReportOpts) -> Self {
        Self {
            reporter: Self::bind(view, opts.report_all_changes),
            session: SessionWindow::default(),
            report_all_changes: opts.report_all_changes,
            report_on_turn: false,
        }
    }

    fn bind(view: &PageView<'_>, report_all_changes: bool) -> Reporter {
        Reporter::bind(
            new_metric(MetricName::Cls, 0.0, view),
            CLS_THRESHOLDS,
            report_all_changes,
        )
    }

    fn handle_entries(&mut self, entries: &[PerformanceEntry], view: &PageView<'_>) -> Outcome {
        let mut changed = false;
        for entry in entries {
            let PerformanceEntry::LayoutShift(shift) = entry else {
                continue;
            };
            self.session.push(shift);
            if self.session.value() > self.reporter.metric().value {
                let metric = self.reporter.metric_mut();
                metric.value = self.session.value();
                metric.entries = self
                    .session
                    .entries()
                    .iter()
                    .cloned()
                    .map(PerformanceEntry::LayoutShift)
                    .collect();
                changed = true;
            }
        }

        if !changed {
            return Outcome::none();
        }
        trace!("CLS 갱신: {:.4}", self.reporter.metric().value);
        Outcome::report(self.reporter.report(false, view.hidden))
    }
}

impl MetricEngine for ClsEngine {
    fn name(&self) -> MetricName {
        MetricName::Cls
    }

    fn requests(&self) -> Vec<EntryRequest> {
        vec![EntryRequest::required(
            EntryKind::LayoutShift,
            ObserveOptions::buffered(),
        )]
    }

    fn handle(&mut self, signal: Signal<'_>, view: &PageView<'_>) -> Outcome {
        match signal {
            Signal::Start => {
                self.report_on_turn = true;
                Outcome::none()
            }
            Signal::Entries(EntryKind::LayoutShift, entries) => self.handle_entries(entries, view),
            Signal::Hidden => Outcome::report(self.reporter.report(true, view.hidden)),
            Signal::Restore { .. } => {
                self.session = SessionWindow::default();
                self.reporter = Self::bind(view, self.report_all_changes);
                self.report_on_turn = true;
                debug!("CLS 새 에피소드 시작: {}", self.reporter.metric().id);
                Outcome::none()
            }
            Signal::Turn if self.report_on_turn => {
                self.report_on_turn = false;
                Outcome::report(self.reporter.report(false, view.hidden))
            }
            _ => Outcome::none(),
        }
    }
}
