//! TTFB 어트리뷰션.

use pagevitals_core::models::attribution::{Attribution, TtfbAttribution};
use pagevitals_core::models::entry::PerformanceEntry;
use pagevitals_core::models::metric::Metric;

use crate::AttributionSources;

/// 대기/캐시/DNS/연결/요청 구간 분해. 모든 경계는 활성화 시각 기준.
///
/// 엔트리가 없으면 (bfcache 복원) 모든 구간이 0.
pub fn attribute_ttfb(_sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let navigation = metric.entries.iter().find_map(|entry| match entry {
        PerformanceEntry::Navigation(nav) => Some(nav),
        _ => None,
    });

    let Some(navigation) = navigation else {
        return Some(Attribution::Ttfb(TtfbAttribution::default()));
    };

    let activation_start = navigation.activation_start;
    let since_activation = |t: f64| (t - activation_start).max(0.0);

    let wait_start = if navigation.worker_start > 0.0 {
        navigation.worker_start
    } else {
        navigation.fetch_start
    };
    let wait_end = since_activation(wait_start);
    let dns_start = since_activation(navigation.domain_lookup_start);
    let connect_start = since_activation(navigation.connect_start);
    let connect_end = since_activation(navigation.connect_end);

    Some(Attribution::Ttfb(TtfbAttribution {
        waiting_duration: wait_end,
        cache_duration: dns_start - wait_end,
        dns_duration: connect_start - dns_start,
        connection_duration: connect_end - connect_start,
        request_duration: metric.value - connect_end,
        navigation_entry: Some(navigation.clone()),
    }))
}
