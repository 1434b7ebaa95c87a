//! FID 어트리뷰션.

use pagevitals_core::models::attribution::{Attribution, FidAttribution};
use pagevitals_core::models::metric::Metric;

use crate::load_state::load_state_at;
use crate::AttributionSources;

/// 첫 입력 엔트리 정보. 복원 폴리필처럼 엔트리가 없으면 `None`.
pub fn attribute_fid(sources: &AttributionSources<'_>, metric: &Metric) -> Option<Attribution> {
    let event = metric.entries.first()?.as_event_timing()?;
    Some(Attribution::Fid(FidAttribution {
        event_target: event.target.clone(),
        event_type: event.name.clone(),
        event_time: event.start_time,
        event_entry: event.clone(),
        load_state: load_state_at(sources.page, event.start_time),
    }))
}
