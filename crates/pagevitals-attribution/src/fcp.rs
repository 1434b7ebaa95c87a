//! FCP 어트리뷰션.

use pagevitals_core::models::attribution::{Attribution, FcpAttribution};
use pagevitals_core::models::entry::PerformanceEntry;
use pagevitals_core::models::metric::Metric;

use crate::load_state::load_state_at;
use crate::AttributionSources;

/// 첫 바이트 시각과 FCP 사이 구간 분해.
///
/// bfcache 복원처럼 엔트리가 없으면 TTFB 0, 전체 값을 `first_byte_to_fcp`로 본다.
pub fn attribute_fcp(sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let fcp_entry = metric.entries.iter().rev().find_map(|entry| match entry {
        PerformanceEntry::Paint(paint) => Some(paint.clone()),
        _ => None,
    });
    let navigation = sources.page.navigation_entry();

    let attribution = match (fcp_entry, navigation) {
        (Some(fcp_entry), Some(navigation)) => {
            let time_to_first_byte =
                (navigation.response_start - navigation.activation_start).max(0.0);
            FcpAttribution {
                time_to_first_byte,
                first_byte_to_fcp: (metric.value - time_to_first_byte).max(0.0),
                load_state: load_state_at(sources.page, fcp_entry.start_time),
                navigation_entry: Some(navigation),
                fcp_entry: Some(fcp_entry),
            }
        }
        (fcp_entry, _) => FcpAttribution {
            time_to_first_byte: 0.0,
            first_byte_to_fcp: metric.value,
            load_state: load_state_at(sources.page, sources.restore_time.unwrap_or(0.0)),
            navigation_entry: None,
            fcp_entry,
        },
    };

    Some(Attribution::Fcp(attribution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page::StaticPage;
    use pagevitals_core::models::attribution::LoadState;
    use pagevitals_core::models::entry::PaintTiming;
    use pagevitals_core::models::metric::{MetricName, NavigationType};

    fn fcp_metric(value: f64, with_entry: bool) -> Metric {
        let mut metric = Metric::new(MetricName::Fcp, value, "v4-test", NavigationType::Navigate);
        if with_entry {
            metric.entries.push(PerformanceEntry::Paint(PaintTiming {
                name: "first-contentful-paint".to_string(),
                start_time: value,
            }));
        }
        metric
    }

    #[test]
    fn splits_at_first_byte() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        match attribute_fcp(&sources, &fcp_metric(700.0, true)) {
            Some(Attribution::Fcp(fcp)) => {
                assert_eq!(fcp.time_to_first_byte, 300.0);
                assert_eq!(fcp.first_byte_to_fcp, 400.0);
                assert_eq!(fcp.load_state, LoadState::DomInteractive);
                assert!(fcp.navigation_entry.is_some());
            }
            other => panic!("FCP 어트리뷰션 아님: {other:?}"),
        }
    }

    #[test]
    fn prerender_activation_is_subtracted() {
        let mut page = StaticPage::loaded();
        if let Some(nav) = page.navigation.as_mut() {
            nav.activation_start = 250.0;
        }
        let sources = AttributionSources::new(&page);
        match attribute_fcp(&sources, &fcp_metric(400.0, true)) {
            Some(Attribution::Fcp(fcp)) => {
                assert_eq!(fcp.time_to_first_byte, 50.0);
                assert_eq!(fcp.first_byte_to_fcp, 350.0);
            }
            other => panic!("FCP 어트리뷰션 아님: {other:?}"),
        }
    }

    #[test]
    fn restore_without_entries_uses_whole_value() {
        let page = StaticPage::loaded();
        let sources = AttributionSources {
            restore_time: Some(5000.0),
            ..AttributionSources::new(&page)
        };
        match attribute_fcp(&sources, &fcp_metric(32.0, false)) {
            Some(Attribution::Fcp(fcp)) => {
                assert_eq!(fcp.time_to_first_byte, 0.0);
                assert_eq!(fcp.first_byte_to_fcp, 32.0);
                assert_eq!(fcp.load_state, LoadState::Complete);
                assert!(fcp.fcp_entry.is_none());
            }
            other => panic!("FCP 어트리뷰션 아님: {other:?}"),
        }
    }
}
