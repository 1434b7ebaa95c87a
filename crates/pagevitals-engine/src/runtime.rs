//! 라이프사이클 오케스트레이션.
//!
//! `VitalsRuntime`은 포트 구현체(엔트리 소스, 페이지 상태)를 받아
//! 메트릭 함수(`on_cls`, `on_inp` ...) 호출마다 엔진을 등록하고,
//! 호스트 이벤트를 엔진 신호로 바꿔 전달한 뒤 리포트를 콜백으로 내보낸다.
//!
//! 모든 처리는 `dispatch` 호출 안에서 동기적으로 끝난다.
//! 엔진 상태가 정리된 뒤에만 콜백을 호출하므로 재진입이 없다.

use pagevitals_attribution::AttributionSources;
use pagevitals_core::config::{ReportOpts, VitalsConfig};
use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::models::lifecycle::{HostEvent, VisibilityState};
use pagevitals_core::models::metric::{Metric, MetricName};
use pagevitals_core::ports::entry_source::{EntrySource, ObserveOptions, SubscriptionId};
use pagevitals_core::ports::page::PageHost;
use tracing::{debug, trace};

use crate::context::PageView;
use crate::engines::{
    ClsEngine, FcpEngine, FidEngine, InpEngine, LcpEngine, MetricEngine, Signal, TtfbEngine,
};
use crate::interactions::InteractionCounter;
use crate::profile::{profile, MetricProfile};
use crate::source::{EntrySourceAdapter, Listener};
use crate::visibility::VisibilityWatcher;

/// 메트릭 콜백
pub type MetricCallback = Box<dyn FnMut(&Metric)>;

/// 등록 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// 프리렌더 활성화 대기
    AwaitingActivation,
    /// 관찰 중
    Live,
    /// 필수 엔트리 미지원: 리포트하지 않음
    Inert,
}

struct Registration {
    engine: Box<dyn MetricEngine>,
    callback: MetricCallback,
    profile: &'static MetricProfile,
    opts: ReportOpts,
    subscriptions: Vec<SubscriptionId>,
    status: RegistrationStatus,
}

/// 메트릭 런타임
pub struct VitalsRuntime {
    source: EntrySourceAdapter,
    page: Box<dyn PageHost>,
    config: VitalsConfig,
    visibility: VisibilityWatcher,
    counter: InteractionCounter,
    restore_time: Option<f64>,
    hidden: bool,
    registrations: Vec<Registration>,
}

impl VitalsRuntime {
    pub fn new(source: Box<dyn EntrySource>, page: Box<dyn PageHost>, config: VitalsConfig) -> Self {
        let mut visibility = VisibilityWatcher::new();
        visibility.ensure_initialized(page.as_ref());
        let hidden = page.is_hidden();
        Self {
            source: EntrySourceAdapter::new(source),
            page,
            config,
            visibility,
            counter: InteractionCounter::new(),
            restore_time: None,
            hidden,
            registrations: Vec::new(),
        }
    }

    pub fn config(&self) -> &VitalsConfig {
        &self.config
    }

    /// 등록 순서대로 (메트릭 이름, 상태)
    pub fn statuses(&self) -> Vec<(MetricName, RegistrationStatus)> {
        self.registrations
            .iter()
            .map(|r| (r.engine.name(), r.status))
            .collect()
    }

    fn view(&self) -> PageView<'_> {
        PageView {
            page: self.page.as_ref(),
            first_hidden_time: self.visibility.first_hidden_time(),
            interaction_count: self.counter.count(self.page.as_ref()),
            restore_time: self.restore_time,
            hidden: self.hidden,
        }
    }

    /// 호출 옵션과 설정 기본값 병합 (어느 쪽이든 켜져 있으면 사용)
    fn effective_opts(&self, opts: ReportOpts) -> ReportOpts {
        let defaults = self.config.report_opts();
        ReportOpts {
            report_all_changes: opts.report_all_changes || defaults.report_all_changes,
            attribution: opts.attribution || defaults.attribution,
            duration_threshold: opts.duration_threshold,
        }
    }

    // ============================================================
    // 메트릭 함수
    // ============================================================

    pub fn on_cls(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let engine = ClsEngine::new(&self.view(), &opts);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    pub fn on_fcp(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let engine = FcpEngine::new(&self.view(), &opts);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    pub fn on_fid(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let engine = FidEngine::new(&self.view(), &opts);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    pub fn on_inp(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let attribution = opts.attribution.then_some(&self.config.attribution);
        let engine = InpEngine::new(&self.view(), &opts, &self.config.inp, attribution);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    pub fn on_lcp(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let engine = LcpEngine::new(&self.view(), &opts);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    pub fn on_ttfb(&mut self, callback: impl FnMut(&Metric) + 'static, opts: ReportOpts) {
        let opts = self.effective_opts(opts);
        let engine = TtfbEngine::new(&self.view(), &opts);
        self.register(Box::new(engine), Box::new(callback), opts);
    }

    fn register(&mut self, engine: Box<dyn MetricEngine>, callback: MetricCallback, opts: ReportOpts) {
        let name = engine.name();
        let index = self.registrations.len();
        self.registrations.push(Registration {
            engine,
            callback,
            profile: profile(name),
            opts,
            subscriptions: Vec::new(),
            status: RegistrationStatus::AwaitingActivation,
        });

        if self.page.is_prerendering() {
            debug!("프리렌더 중: {} 활성화 대기", name);
            return;
        }
        self.start(index);
    }

    /// 엔트리 구독을 열고 엔진 시작
    fn start(&mut self, index: usize) {
        let Some(registration) = self.registrations.get(index) else {
            return;
        };
        let name = registration.engine.name();
        let requests = registration.engine.requests();
        let counts_interactions = registration.engine.counts_interactions();

        if counts_interactions {
            self.ensure_interaction_counter();
        }

        let mut subscriptions = Vec::new();
        let mut missing = None;
        for request in requests {
            let subscription =
                self.source
                    .subscribe(request.kind, request.options, Listener::Registration(index));
            match subscription.handle {
                Some(id) => subscriptions.push(id),
                None if request.required => {
                    missing = Some(request.kind);
                    break;
                }
                None => trace!("{} 선택 구독 미지원: {}", name, request.kind.as_str()),
            }
        }

        if let Some(kind) = missing {
            for id in subscriptions {
                self.source.stop(id, Listener::Registration(index));
            }
            if let Some(registration) = self.registrations.get_mut(index) {
                registration.status = RegistrationStatus::Inert;
            }
            debug!("{} 비활성화: {} 엔트리 미지원", name, kind.as_str());
            return;
        }

        if let Some(registration) = self.registrations.get_mut(index) {
            registration.subscriptions = subscriptions;
            registration.status = RegistrationStatus::Live;
        }
        debug!("{} 관찰 시작", name);
        self.signal(index, Signal::Start);
    }

    /// 네이티브 상호작용 카운터가 없으면 `event` 엔트리로 추정 시작
    fn ensure_interaction_counter(&mut self) {
        if self.counter.is_polyfilled() || self.page.interaction_count().is_some() {
            return;
        }
        let subscription = self.source.subscribe(
            EntryKind::Event,
            ObserveOptions::buffered().with_duration_threshold(0.0),
            Listener::InteractionCounter,
        );
        if subscription.supported {
            self.counter.enable_polyfill();
            debug!("상호작용 수 추정 시작");
        }
    }

    // ============================================================
    // 호스트 이벤트
    // ============================================================

    /// 호스트 이벤트 처리
    pub fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Entries {
                subscription,
                entries,
            } => self.route(subscription, &entries),
            HostEvent::VisibilityChange {
                state: VisibilityState::Hidden,
                time_stamp,
            }
            | HostEvent::PageHide { time_stamp, .. } => self.on_hidden(time_stamp),
            HostEvent::VisibilityChange {
                state: VisibilityState::Visible,
                ..
            } => self.hidden = false,
            HostEvent::PageShow {
                persisted: true,
                time_stamp,
            } => self.on_restore(time_stamp),
            HostEvent::PageShow { .. } => {}
            HostEvent::PrerenderingChange { .. } => self.on_activation(),
            HostEvent::Input { kind, time_stamp } => {
                self.flush();
                self.broadcast(Signal::Input { kind, time_stamp });
            }
            HostEvent::Load => self.broadcast(Signal::Loaded),
            HostEvent::Tick => {
                self.visibility.on_turn(self.page.as_ref());
                self.broadcast(Signal::Turn);
            }
        }
    }

    fn on_hidden(&mut self, time_stamp: f64) {
        self.hidden = true;
        self.visibility.on_hidden(time_stamp);
        trace!("페이지 숨김: {:.1}ms", time_stamp);
        self.flush();
        self.broadcast(Signal::Hidden);
    }

    fn on_restore(&mut self, time_stamp: f64) {
        self.restore_time = Some(time_stamp);
        self.hidden = false;
        self.visibility.schedule_reset();
        debug!("bfcache 복원: {:.1}ms", time_stamp);
        self.broadcast(Signal::Restore { time_stamp });
    }

    fn on_activation(&mut self) {
        self.visibility.on_prerendering_change(self.page.as_ref());
        debug!("프리렌더 페이지 활성화");
        let waiting: Vec<usize> = self
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == RegistrationStatus::AwaitingActivation)
            .map(|(index, _)| index)
            .collect();
        for index in waiting {
            self.start(index);
        }
    }

    /// 모든 구독의 미전달 엔트리를 꺼내 전달
    fn flush(&mut self) {
        for id in self.source.handles() {
            let entries = self.source.drain_pending(id);
            if !entries.is_empty() {
                self.route(id, &entries);
            }
        }
    }

    fn route(&mut self, id: SubscriptionId, entries: &[PerformanceEntry]) {
        let Some((kind, listeners)) = self.source.deliver(id) else {
            trace!("종료된 구독의 엔트리 무시: {}", id);
            return;
        };
        for listener in listeners {
            match listener {
                Listener::InteractionCounter => self.counter.observe(entries),
                Listener::Registration(index) => self.signal(index, Signal::Entries(kind, entries)),
            }
        }
    }

    fn broadcast(&mut self, signal: Signal<'_>) {
        for index in 0..self.registrations.len() {
            self.signal(index, signal);
        }
    }

    /// 엔진 하나에 신호를 전달하고 결과 리포트를 콜백으로 내보낸다
    fn signal(&mut self, index: usize, signal: Signal<'_>) {
        let view = PageView {
            page: self.page.as_ref(),
            first_hidden_time: self.visibility.first_hidden_time(),
            interaction_count: self.counter.count(self.page.as_ref()),
            restore_time: self.restore_time,
            hidden: self.hidden,
        };
        let Some(registration) = self.registrations.get_mut(index) else {
            return;
        };
        if registration.status != RegistrationStatus::Live {
            return;
        }

        let outcome = registration.engine.handle(signal, &view);
        for mut metric in outcome.reports {
            if registration.opts.attribution {
                let sources = AttributionSources {
                    page: view.page,
                    frames: registration.engine.frames(),
                    restore_time: view.restore_time,
                };
                metric.attribution = (registration.profile.attribute)(&sources, &metric);
            }
            debug!(
                "{} 리포트: value={:.4} delta={:.4} rating={:?} id={}",
                metric.name, metric.value, metric.delta, metric.rating, metric.id
            );
            (registration.callback)(&metric);
        }

        if outcome.disconnect {
            for id in registration.subscriptions.drain(..) {
                self.source.stop(id, Listener::Registration(index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{interaction, shift, FakePage, FakeSource, SharedPage};
    use assert_matches::assert_matches;
    use pagevitals_core::models::attribution::Attribution;
    use pagevitals_core::models::entry::LargestContentfulPaint;
    use pagevitals_core::models::lifecycle::InputKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        runtime: VitalsRuntime,
        source: FakeSource,
        page: SharedPage,
    }

    fn harness(page: FakePage) -> Harness {
        let source = FakeSource::default();
        let page = SharedPage(Rc::new(RefCell::new(page)));
        let runtime = VitalsRuntime::new(
            Box::new(source.clone()),
            Box::new(page.clone()),
            VitalsConfig::default(),
        );
        Harness {
            runtime,
            source,
            page,
        }
    }

    type Sink = Rc<RefCell<Vec<Metric>>>;

    fn sink() -> (Sink, impl FnMut(&Metric) + 'static) {
        let reports: Sink = Rc::default();
        let writer = reports.clone();
        (reports, move |metric: &Metric| {
            writer.borrow_mut().push(metric.clone())
        })
    }

    fn hide(h: &mut Harness, time_stamp: f64) {
        h.page.0.borrow_mut().hidden = true;
        h.runtime.dispatch(HostEvent::VisibilityChange {
            state: VisibilityState::Hidden,
            time_stamp,
        });
    }

    #[test]
    fn unsupported_required_kind_makes_registration_inert() {
        let mut h = harness(FakePage::loaded(1000.0));
        h.source
            .0
            .borrow_mut()
            .unsupported
            .insert(EntryKind::LayoutShift);

        let (reports, callback) = sink();
        h.runtime.on_cls(callback, ReportOpts::default());
        assert_eq!(
            h.runtime.statuses(),
            vec![(MetricName::Cls, RegistrationStatus::Inert)]
        );

        hide(&mut h, 2000.0);
        assert!(reports.borrow().is_empty());
    }

    #[test]
    fn hidden_drains_pending_records_before_final_report() {
        let mut h = harness(FakePage::loaded(1000.0));
        let (reports, callback) = sink();
        h.runtime.on_cls(callback, ReportOpts::default());

        let id = h
            .source
            .0
            .borrow()
            .subscription_for(EntryKind::LayoutShift)
            .unwrap();
        h.source
            .0
            .borrow_mut()
            .queued
            .insert(id, vec![shift(100.0, 0.12), shift(400.0, 0.03)]);

        hide(&mut h, 3000.0);
        let reports = reports.borrow();
        assert_eq!(reports.len(), 1);
        assert!((reports[0].value - 0.15).abs() < 1e-12);
        assert_eq!(reports[0].entries.len(), 2);
    }

    #[test]
    fn prerendered_registration_starts_on_activation() {
        let mut page = FakePage::loaded(1000.0);
        page.prerendering = true;
        let mut h = harness(page);
        let (_reports, callback) = sink();
        h.runtime.on_lcp(callback, ReportOpts::default());

        assert_eq!(
            h.runtime.statuses(),
            vec![(MetricName::Lcp, RegistrationStatus::AwaitingActivation)]
        );
        assert!(h.source.0.borrow().observed.is_empty());

        h.page.0.borrow_mut().prerendering = false;
        h.runtime
            .dispatch(HostEvent::PrerenderingChange { time_stamp: 1500.0 });
        assert_eq!(
            h.runtime.statuses(),
            vec![(MetricName::Lcp, RegistrationStatus::Live)]
        );
        assert_eq!(h.source.0.borrow().observed.len(), 1);
    }

    #[test]
    fn first_input_subscription_is_shared() {
        let mut page = FakePage::loaded(1000.0);
        page.interaction_count = Some(0);
        let mut h = harness(page);
        let (fid_reports, fid_cb) = sink();
        let (_inp_reports, inp_cb) = sink();
        h.runtime.on_fid(fid_cb, ReportOpts::default());
        h.runtime.on_inp(inp_cb, ReportOpts::default());

        let observed: Vec<EntryKind> = h
            .source
            .0
            .borrow()
            .observed
            .iter()
            .map(|(_, kind, _)| *kind)
            .collect();
        assert_eq!(observed, vec![EntryKind::FirstInput, EntryKind::Event]);

        let id = h
            .source
            .0
            .borrow()
            .subscription_for(EntryKind::FirstInput)
            .unwrap();
        let mut first = interaction(7, 300.0, 40.0);
        first.processing_start = 325.0;
        h.runtime.dispatch(HostEvent::Entries {
            subscription: id,
            entries: vec![PerformanceEntry::FirstInput(first)],
        });
        assert_eq!(fid_reports.borrow()[0].value, 25.0);
    }

    #[test]
    fn interaction_counter_polyfill_feeds_inp_estimate() {
        let mut h = harness(FakePage::loaded(1000.0));
        let (reports, callback) = sink();
        h.runtime.on_inp(callback, ReportOpts::default());

        let (counter_id, inp_id) = {
            let state = h.source.0.borrow();
            let find = |threshold: f64| {
                state
                    .observed
                    .iter()
                    .find(|(_, kind, options)| {
                        *kind == EntryKind::Event
                            && options.duration_threshold == Some(threshold)
                    })
                    .map(|(id, _, _)| *id)
                    .unwrap()
            };
            (find(0.0), find(40.0))
        };

        // 상호작용 50개 (ID 7씩 증가), 그중 느린 것 두 개만 임계값 이상
        let all: Vec<_> = (0..50u64)
            .map(|i| PerformanceEntry::Event(interaction(7 + 7 * i, i as f64 * 100.0, 16.0)))
            .collect();
        h.runtime.dispatch(HostEvent::Entries {
            subscription: counter_id,
            entries: all,
        });
        h.runtime.dispatch(HostEvent::Entries {
            subscription: inp_id,
            entries: vec![
                PerformanceEntry::Event(interaction(7, 0.0, 640.0)),
                PerformanceEntry::Event(interaction(14, 100.0, 320.0)),
            ],
        });

        hide(&mut h, 9000.0);
        assert_eq!(reports.borrow()[0].value, 320.0);
    }

    #[test]
    fn input_finalizes_lcp_and_disconnects() {
        let mut h = harness(FakePage::loaded(1000.0));
        let (reports, callback) = sink();
        h.runtime.on_lcp(callback, ReportOpts::default());
        let id = h
            .source
            .0
            .borrow()
            .subscription_for(EntryKind::LargestContentfulPaint)
            .unwrap();
        h.source.0.borrow_mut().queued.insert(
            id,
            vec![PerformanceEntry::LargestContentfulPaint(
                LargestContentfulPaint {
                    start_time: 700.0,
                    ..LargestContentfulPaint::default()
                },
            )],
        );

        h.runtime.dispatch(HostEvent::Input {
            kind: InputKind::KeyDown,
            time_stamp: 1200.0,
        });
        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(reports.borrow()[0].value, 700.0);
        assert_eq!(h.source.0.borrow().disconnected, vec![id]);
    }

    #[test]
    fn attribution_is_attached_when_requested() {
        let mut h = harness(FakePage::loaded(1000.0));
        let (reports, callback) = sink();
        h.runtime
            .on_ttfb(callback, ReportOpts::default().with_attribution());
        h.runtime.dispatch(HostEvent::Tick);

        let reports = reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_matches!(
            reports[0].attribution,
            Some(Attribution::Ttfb(ref ttfb)) if ttfb.navigation_entry.is_some()
        );
    }

    #[test]
    fn config_defaults_merge_into_call_options() {
        let source = FakeSource::default();
        let page = SharedPage(Rc::new(RefCell::new(FakePage::loaded(1000.0))));
        let config = VitalsConfig::from_json_str(r#"{ "report": { "report_all_changes": true } }"#)
            .unwrap();
        let mut runtime = VitalsRuntime::new(Box::new(source), Box::new(page), config);
        let (reports, callback) = sink();
        runtime.on_cls(callback, ReportOpts::default());

        // 모든 변화 보고 모드: 첫 턴에 0 리포트
        runtime.dispatch(HostEvent::Tick);
        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(reports.borrow()[0].value, 0.0);
    }
}
