//! LCP 어트리뷰션.
//!
//! LCP 값을 TTFB, 리소스 로드 지연, 리소스 로드 시간, 요소 렌더 지연 네 구간으로
//! 나눈다. 각 경계는 이전 경계 이상으로 보정되므로 네 구간의 합은 항상 LCP 값이다.

use pagevitals_core::models::attribution::{Attribution, LcpAttribution};
use pagevitals_core::models::entry::PerformanceEntry;
use pagevitals_core::models::metric::Metric;

use crate::AttributionSources;

pub fn attribute_lcp(sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let lcp_entry = metric.entries.iter().rev().find_map(|entry| match entry {
        PerformanceEntry::LargestContentfulPaint(lcp) => Some(lcp.clone()),
        _ => None,
    });

    let breakdown = lcp_entry.and_then(|lcp_entry| {
        let navigation = sources.page.navigation_entry()?;
        let activation_start = navigation.activation_start;

        let resource = if lcp_entry.url.is_empty() {
            None
        } else {
            sources.page.resource_timing(&lcp_entry.url)
        };

        let ttfb = (navigation.response_start - activation_start).max(0.0);
        let request_start = ttfb.max(resource.as_ref().map_or(0.0, |r| {
            let start = if r.request_start > 0.0 {
                r.request_start
            } else {
                r.start_time
            };
            start - activation_start
        }));
        let response_end = request_start.max(
            resource
                .as_ref()
                .map_or(0.0, |r| r.response_end - activation_start),
        );
        let render_time = response_end.max(lcp_entry.start_time - activation_start);

        Some(LcpAttribution {
            target: lcp_entry.element.clone(),
            url: (!lcp_entry.url.is_empty()).then(|| lcp_entry.url.clone()),
            time_to_first_byte: ttfb,
            resource_load_delay: request_start - ttfb,
            resource_load_duration: response_end - request_start,
            element_render_delay: render_time - response_end,
            navigation_entry: Some(navigation),
            lcp_resource_entry: resource,
            lcp_entry: Some(lcp_entry),
        })
    });

    Some(Attribution::Lcp(breakdown.unwrap_or_else(|| LcpAttribution {
        target: None,
        url: None,
        time_to_first_byte: 0.0,
        resource_load_delay: 0.0,
        resource_load_duration: 0.0,
        element_render_delay: metric.value,
        navigation_entry: None,
        lcp_resource_entry: None,
        lcp_entry: None,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page::StaticPage;
    use pagevitals_core::models::entry::{LargestContentfulPaint, ResourceTiming};
    use pagevitals_core::models::metric::{MetricName, NavigationType};

    const HERO: &str = "https://cdn.example.com/hero.webp";

    fn lcp_metric(start: f64, url: &str) -> Metric {
        let mut metric = Metric::new(MetricName::Lcp, start, "v4-test", NavigationType::Navigate);
        metric
            .entries
            .push(PerformanceEntry::LargestContentfulPaint(LargestContentfulPaint {
                start_time: start,
                render_time: start,
                size: 120_000,
                url: url.to_string(),
                element: Some("img.hero".to_string()),
                ..LargestContentfulPaint::default()
            }));
        metric
    }

    fn unwrap_lcp(attribution: Option<Attribution>) -> LcpAttribution {
        match attribution {
            Some(Attribution::Lcp(lcp)) => lcp,
            other => panic!("LCP 어트리뷰션 아님: {other:?}"),
        }
    }

    fn parts_sum(lcp: &LcpAttribution) -> f64 {
        lcp.time_to_first_byte
            + lcp.resource_load_delay
            + lcp.resource_load_duration
            + lcp.element_render_delay
    }

    #[test]
    fn image_breakdown_sums_to_value() {
        let mut page = StaticPage::loaded();
        page.resources.insert(
            HERO.to_string(),
            ResourceTiming {
                name: HERO.to_string(),
                start_time: 550.0,
                request_start: 600.0,
                response_end: 1400.0,
                initiator_type: "img".to_string(),
                ..ResourceTiming::default()
            },
        );
        let sources = AttributionSources::new(&page);
        let lcp = unwrap_lcp(attribute_lcp(&sources, &lcp_metric(1800.0, HERO)));

        assert_eq!(lcp.target.as_deref(), Some("img.hero"));
        assert_eq!(lcp.url.as_deref(), Some(HERO));
        assert_eq!(lcp.time_to_first_byte, 300.0);
        assert_eq!(lcp.resource_load_delay, 300.0);
        assert_eq!(lcp.resource_load_duration, 800.0);
        assert_eq!(lcp.element_render_delay, 400.0);
        assert_eq!(parts_sum(&lcp), 1800.0);
        assert!(lcp.lcp_resource_entry.is_some());
    }

    #[test]
    fn text_element_has_no_resource_phase() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        let lcp = unwrap_lcp(attribute_lcp(&sources, &lcp_metric(900.0, "")));

        assert!(lcp.url.is_none());
        assert!(lcp.lcp_resource_entry.is_none());
        assert_eq!(lcp.resource_load_delay, 0.0);
        assert_eq!(lcp.resource_load_duration, 0.0);
        assert_eq!(lcp.element_render_delay, 600.0);
        assert_eq!(parts_sum(&lcp), 900.0);
    }

    #[test]
    fn cross_origin_resource_without_request_start_uses_start_time() {
        let mut page = StaticPage::loaded();
        page.resources.insert(
            HERO.to_string(),
            ResourceTiming {
                name: HERO.to_string(),
                start_time: 450.0,
                response_end: 1000.0,
                ..ResourceTiming::default()
            },
        );
        let sources = AttributionSources::new(&page);
        let lcp = unwrap_lcp(attribute_lcp(&sources, &lcp_metric(1200.0, HERO)));
        assert_eq!(lcp.resource_load_delay, 150.0);
        assert_eq!(parts_sum(&lcp), 1200.0);
    }

    #[test]
    fn restore_without_entries_is_all_render_delay() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        let metric = Metric::new(MetricName::Lcp, 48.0, "v4-test", NavigationType::BackForwardCache);
        let lcp = unwrap_lcp(attribute_lcp(&sources, &metric));
        assert_eq!(lcp.element_render_delay, 48.0);
        assert_eq!(lcp.time_to_first_byte, 0.0);
        assert!(lcp.lcp_entry.is_none());
    }
}
