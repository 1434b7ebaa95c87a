//! 시나리오 실행기.

use std::cell::RefCell;
use std::rc::Rc;

use pagevitals_core::config::VitalsConfig;
use pagevitals_core::models::lifecycle::{HostEvent, ReadyState, VisibilityState};
use pagevitals_core::models::metric::{Metric, MetricName};
use pagevitals_core::ports::page::PageHost;
use pagevitals_engine::VitalsRuntime;
use tracing::{debug, trace};

use crate::error::ReplayError;
use crate::host::ScriptedHost;
use crate::scenario::{MetricRequest, PageSetup, Scenario, Step};

/// 스크립트 호스트 위에서 `VitalsRuntime`을 구동하고 리포트를 모은다
pub struct Replay {
    host: ScriptedHost,
    runtime: VitalsRuntime,
    reports: Rc<RefCell<Vec<Metric>>>,
}

impl Replay {
    pub fn new(page: &PageSetup, config: VitalsConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        let host = ScriptedHost::new(page);
        let runtime = VitalsRuntime::new(Box::new(host.clone()), Box::new(host.clone()), config);
        Ok(Self {
            host,
            runtime,
            reports: Rc::default(),
        })
    }

    /// 페이지/설정을 만들고 메트릭을 등록한다 (단계는 실행하지 않음)
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ReplayError> {
        let mut replay = Self::new(&scenario.page, scenario.config.clone())?;
        for request in &scenario.metrics {
            replay.register(request);
        }
        Ok(replay)
    }

    /// 시나리오 전체 실행 후 리포트 반환
    pub fn run(scenario: &Scenario) -> Result<Vec<Metric>, ReplayError> {
        let mut replay = Self::from_scenario(scenario)?;
        for step in &scenario.steps {
            replay.apply(step)?;
        }
        debug!(
            "시나리오 완료: {} (리포트 {}개)",
            scenario.name,
            replay.reports.borrow().len()
        );
        Ok(replay.take_reports())
    }

    pub fn register(&mut self, request: &MetricRequest) {
        let sink = Rc::clone(&self.reports);
        let callback = move |metric: &Metric| sink.borrow_mut().push(metric.clone());
        let opts = request.opts();
        match request.metric {
            MetricName::Cls => self.runtime.on_cls(callback, opts),
            MetricName::Fcp => self.runtime.on_fcp(callback, opts),
            MetricName::Fid => self.runtime.on_fid(callback, opts),
            MetricName::Inp => self.runtime.on_inp(callback, opts),
            MetricName::Lcp => self.runtime.on_lcp(callback, opts),
            MetricName::Ttfb => self.runtime.on_ttfb(callback, opts),
        }
    }

    /// 단계 하나 실행
    pub fn apply(&mut self, step: &Step) -> Result<(), ReplayError> {
        trace!("단계 실행: {:?}", step);
        let now = self.host.now();
        match step {
            Step::Advance { to } => self.host.advance_to(*to)?,
            Step::Record { entries } => {
                for entry in entries {
                    self.host.record(entry.clone());
                }
            }
            Step::Entries { entries } => {
                for entry in entries {
                    self.host.record(entry.clone());
                }
                self.deliver_all();
            }
            Step::Flush { subscription: None } => self.deliver_all(),
            Step::Flush {
                subscription: Some(id),
            } => {
                if let Some(event) = self.host.take_delivery(*id)? {
                    self.runtime.dispatch(event);
                }
            }
            Step::Hide => {
                self.host.set_hidden(true);
                self.runtime.dispatch(HostEvent::VisibilityChange {
                    state: VisibilityState::Hidden,
                    time_stamp: now,
                });
            }
            Step::Show => {
                self.host.set_hidden(false);
                self.runtime.dispatch(HostEvent::VisibilityChange {
                    state: VisibilityState::Visible,
                    time_stamp: now,
                });
            }
            Step::PageHide { persisted } => {
                self.host.set_hidden(true);
                self.runtime.dispatch(HostEvent::PageHide {
                    persisted: *persisted,
                    time_stamp: now,
                });
            }
            Step::Restore => {
                self.host.set_hidden(false);
                self.runtime.dispatch(HostEvent::PageShow {
                    persisted: true,
                    time_stamp: now,
                });
            }
            Step::Activate => {
                self.host.activate();
                self.runtime
                    .dispatch(HostEvent::PrerenderingChange { time_stamp: now });
            }
            Step::Input { kind } => self.runtime.dispatch(HostEvent::Input {
                kind: *kind,
                time_stamp: now,
            }),
            Step::Load => {
                self.host.set_ready_state(ReadyState::Complete);
                self.runtime.dispatch(HostEvent::Load);
            }
            Step::Tick => self.runtime.dispatch(HostEvent::Tick),
        }
        Ok(())
    }

    fn deliver_all(&mut self) {
        for event in self.host.take_deliveries() {
            self.runtime.dispatch(event);
        }
    }

    /// 지금까지의 리포트 (복사본)
    pub fn reports(&self) -> Vec<Metric> {
        self.reports.borrow().clone()
    }

    /// 모은 리포트를 꺼낸다
    pub fn take_reports(&self) -> Vec<Metric> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }

    pub fn host(&self) -> &ScriptedHost {
        &self.host
    }

    pub fn runtime(&self) -> &VitalsRuntime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut VitalsRuntime {
        &mut self.runtime
    }
}
