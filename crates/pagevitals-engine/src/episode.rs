//! 측정 에피소드: 메트릭 ID 생성과 방문 유형 판별.

use chrono::Utc;
use pagevitals_core::models::metric::{Metric, MetricName, NavigationType};
use uuid::Uuid;

use crate::context::PageView;

const ID_RANDOM_FLOOR: u128 = 1_000_000_000_000;
const ID_RANDOM_SPAN: u128 = 8_999_999_999_999;

/// 에피소드 고유 ID (`v4-<epoch ms>-<13자리 난수>`)
pub fn generate_id() -> String {
    let random = Uuid::new_v4().as_u128() % ID_RANDOM_SPAN + ID_RANDOM_FLOOR;
    format!("v4-{}-{}", Utc::now().timestamp_millis(), random)
}

/// 현재 에피소드의 방문 유형
pub fn navigation_type(view: &PageView<'_>) -> NavigationType {
    if view.restore_time.is_some() {
        return NavigationType::BackForwardCache;
    }

    let Some(nav) = view.page.navigation_entry() else {
        return NavigationType::Navigate;
    };

    if view.page.is_prerendering() || nav.activation_start > 0.0 {
        NavigationType::Prerender
    } else if view.page.was_discarded() {
        NavigationType::Restore
    } else {
        nav.navigation_type
    }
}

/// 새 에피소드의 메트릭 레코드 (`value`가 음수면 미측정)
pub fn new_metric(name: MetricName, value: f64, view: &PageView<'_>) -> Metric {
    Metric::new(name, value, generate_id(), navigation_type(view))
}
