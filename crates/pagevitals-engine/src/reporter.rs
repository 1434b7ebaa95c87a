//! 리포터: 메트릭 레코드와 직전 리포트 값을 묶어 delta/rating을 계산한다.
//!
//! 콜백을 직접 호출하지 않고 리포트할 스냅샷을 반환한다.
//! 실제 콜백 호출은 엔진 처리가 끝난 뒤 런타임이 수행한다.

use pagevitals_core::models::metric::{Metric, Thresholds};

/// 에피소드 하나에 바인딩된 리포터
#[derive(Debug, Clone)]
pub struct Reporter {
    metric: Metric,
    thresholds: Thresholds,
    report_all_changes: bool,
    prev_value: Option<f64>,
}

impl Reporter {
    pub fn bind(metric: Metric, thresholds: Thresholds, report_all_changes: bool) -> Self {
        Self {
            metric,
            thresholds,
            report_all_changes,
            prev_value: None,
        }
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn metric_mut(&mut self) -> &mut Metric {
        &mut self.metric
    }

    /// 리포트 트리거.
    ///
    /// - 값이 음수(미측정)면 무시
    /// - `report_all_changes`, `force`, 숨김 상태 중 하나일 때만 리포트
    /// - 첫 리포트 이후 값이 변하지 않았으면 강제 여부와 관계없이 생략
    pub fn report(&mut self, force: bool, hidden: bool) -> Option<Metric> {
        if !self.metric.is_measured() {
            return None;
        }
        if !(force || hidden || self.report_all_changes) {
            return None;
        }

        let delta = self.metric.value - self.prev_value.unwrap_or(0.0);
        if delta == 0.0 && self.prev_value.is_some() {
            return None;
        }

        self.metric.delta = delta;
        self.metric.rating = self.thresholds.rate(self.metric.value);
        self.prev_value = Some(self.metric.value);
        Some(self.metric.clone())
    }
}
