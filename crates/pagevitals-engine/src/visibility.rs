//! 가시성 추적: 페이지가 처음 숨겨진 시각.
//!
//! 처음 조회될 때 한 번 초기화되고 이후 첫 숨김 시각으로 고정된다.
//! bfcache 복원 후 다음 태스크 턴에 다시 초기화된다.

use pagevitals_core::ports::page::PageHost;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct VisibilityWatcher {
    first_hidden_time: Option<f64>,
    reset_pending: bool,
}

impl VisibilityWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 상태: 프리렌더가 아닌데 이미 숨겨져 있으면 0, 아니면 +∞.
    ///
    /// 과거 가시성 이력은 알 수 없으므로 첫 조회 시점의 상태로 근사한다.
    fn initial_time(page: &dyn PageHost) -> f64 {
        if page.is_hidden() && !page.is_prerendering() {
            0.0
        } else {
            f64::INFINITY
        }
    }

    /// 아직 초기화되지 않았으면 현재 페이지 상태로 초기화
    pub fn ensure_initialized(&mut self, page: &dyn PageHost) {
        if self.first_hidden_time.is_none() {
            self.first_hidden_time = Some(Self::initial_time(page));
        }
    }

    pub fn first_hidden_time(&self) -> f64 {
        self.first_hidden_time.unwrap_or(f64::INFINITY)
    }

    fn record(&mut self, time_stamp: f64) {
        if let Some(current) = self.first_hidden_time.as_mut() {
            if current.is_infinite() {
                *current = time_stamp;
                debug!("첫 숨김 시각 기록: {:.1}ms", time_stamp);
            }
        }
    }

    /// `visibilitychange`(hidden) 또는 `pagehide`
    pub fn on_hidden(&mut self, time_stamp: f64) {
        self.record(time_stamp);
    }

    /// 숨겨진 상태로 프리렌더가 활성화되면 0부터 숨겨진 것으로 본다
    pub fn on_prerendering_change(&mut self, page: &dyn PageHost) {
        if page.is_hidden() {
            self.record(0.0);
        }
    }

    /// bfcache 복원: 다음 턴에 재초기화
    pub fn schedule_reset(&mut self) {
        self.reset_pending = true;
    }

    /// 태스크 턴 경과
    pub fn on_turn(&mut self, page: &dyn PageHost) {
        if !self.reset_pending {
            return;
        }
        self.reset_pending = false;
        if self.first_hidden_time.is_some() {
            self.first_hidden_time = Some(Self::initial_time(page));
            debug!("bfcache 복원 후 가시성 추적 재초기화");
        }
    }
}
