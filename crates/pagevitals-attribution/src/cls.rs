//! CLS 어트리뷰션: 최대 세션 윈도우 안에서 가장 큰 단일 이동.

use pagevitals_core::models::attribution::{Attribution, ClsAttribution};
use pagevitals_core::models::entry::{LayoutShift, LayoutShiftSource, PerformanceEntry};
use pagevitals_core::models::metric::Metric;

use crate::load_state::load_state_at;
use crate::AttributionSources;

/// 이동 원인 노드 선택 (노드가 남아 있는 첫 소스, 없으면 첫 소스)
fn largest_source(shift: &LayoutShift) -> Option<&LayoutShiftSource> {
    shift
        .sources
        .iter()
        .find(|source| source.node.is_some())
        .or_else(|| shift.sources.first())
}

pub fn attribute_cls(sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let largest = metric
        .entries
        .iter()
        .filter_map(|entry| match entry {
            PerformanceEntry::LayoutShift(shift) => Some(shift),
            _ => None,
        })
        .fold(None::<&LayoutShift>, |best, shift| match best {
            Some(current) if current.value >= shift.value => Some(current),
            _ => Some(shift),
        });

    // 이동이 없으면 빈 어트리뷰션
    let Some(largest) = largest else {
        return Some(Attribution::Cls(ClsAttribution::default()));
    };

    let source = largest_source(largest).cloned();
    Some(Attribution::Cls(ClsAttribution {
        largest_shift_target: source.as_ref().and_then(|s| s.node.clone()),
        largest_shift_time: Some(largest.start_time),
        largest_shift_value: Some(largest.value),
        largest_shift_entry: Some(largest.clone()),
        largest_shift_source: source,
        load_state: Some(load_state_at(sources.page, largest.start_time)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page::StaticPage;
    use pagevitals_core::models::attribution::LoadState;
    use pagevitals_core::models::metric::{MetricName, NavigationType};

    fn shift(start: f64, value: f64, nodes: &[Option<&str>]) -> PerformanceEntry {
        PerformanceEntry::LayoutShift(LayoutShift {
            start_time: start,
            value,
            had_recent_input: false,
            sources: nodes
                .iter()
                .map(|node| LayoutShiftSource {
                    node: node.map(String::from),
                    ..LayoutShiftSource::default()
                })
                .collect(),
        })
    }

    fn cls_metric(entries: Vec<PerformanceEntry>) -> Metric {
        let mut metric = Metric::new(MetricName::Cls, 0.0, "v4-test", NavigationType::Navigate);
        metric.value = entries
            .iter()
            .map(|e| match e {
                PerformanceEntry::LayoutShift(s) => s.value,
                _ => 0.0,
            })
            .sum();
        metric.entries = entries;
        metric
    }

    #[test]
    fn picks_largest_shift_and_live_source() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        let metric = cls_metric(vec![
            shift(600.0, 0.02, &[Some("p.intro")]),
            shift(900.0, 0.08, &[None, Some("img.hero")]),
            shift(1200.0, 0.01, &[]),
        ]);

        match attribute_cls(&sources, &metric) {
            Some(Attribution::Cls(cls)) => {
                assert_eq!(cls.largest_shift_value, Some(0.08));
                assert_eq!(cls.largest_shift_time, Some(900.0));
                assert_eq!(cls.largest_shift_target.as_deref(), Some("img.hero"));
                assert_eq!(cls.load_state, Some(LoadState::DomContentLoaded));
            }
            other => panic!("CLS 어트리뷰션 아님: {other:?}"),
        }
    }

    #[test]
    fn detached_nodes_leave_target_empty() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        let metric = cls_metric(vec![shift(2000.0, 0.3, &[None])]);

        match attribute_cls(&sources, &metric) {
            Some(Attribution::Cls(cls)) => {
                assert!(cls.largest_shift_target.is_none());
                assert!(cls.largest_shift_source.is_some());
                assert_eq!(cls.load_state, Some(LoadState::Complete));
            }
            other => panic!("CLS 어트리뷰션 아님: {other:?}"),
        }
    }

    #[test]
    fn no_shifts_gives_empty_attribution() {
        let page = StaticPage::loaded();
        let sources = AttributionSources::new(&page);
        let metric = cls_metric(Vec::new());
        assert_eq!(
            attribute_cls(&sources, &metric),
            Some(Attribution::Cls(ClsAttribution::default()))
        );
    }
}
