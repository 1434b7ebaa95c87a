//! 메트릭 프로파일 테이블: 메트릭 이름별 등급 임계값과 어트리뷰션 빌더.

use pagevitals_attribution::{cls, fcp, fid, inp, lcp, ttfb, AttributeFn};
use pagevitals_core::models::metric::{
    MetricName, Thresholds, CLS_THRESHOLDS, FCP_THRESHOLDS, FID_THRESHOLDS, INP_THRESHOLDS,
    LCP_THRESHOLDS, TTFB_THRESHOLDS,
};

#[derive(Clone, Copy)]
pub struct MetricProfile {
    pub name: MetricName,
    pub thresholds: Thresholds,
    pub attribute: AttributeFn,
}

static PROFILES: [MetricProfile; 6] = [
    MetricProfile {
        name: MetricName::Cls,
        thresholds: CLS_THRESHOLDS,
        attribute: cls::attribute_cls,
    },
    MetricProfile {
        name: MetricName::Fcp,
        thresholds: FCP_THRESHOLDS,
        attribute: fcp::attribute_fcp,
    },
    MetricProfile {
        name: MetricName::Fid,
        thresholds: FID_THRESHOLDS,
        attribute: fid::attribute_fid,
    },
    MetricProfile {
        name: MetricName::Inp,
        thresholds: INP_THRESHOLDS,
        attribute: inp::attribute_inp,
    },
    MetricProfile {
        name: MetricName::Lcp,
        thresholds: LCP_THRESHOLDS,
        attribute: lcp::attribute_lcp,
    },
    MetricProfile {
        name: MetricName::Ttfb,
        thresholds: TTFB_THRESHOLDS,
        attribute: ttfb::attribute_ttfb,
    },
];

/// 메트릭 이름에 해당하는 프로파일
pub fn profile(name: MetricName) -> &'static MetricProfile {
    let index = match name {
        MetricName::Cls => 0,
        MetricName::Fcp => 1,
        MetricName::Fid => 2,
        MetricName::Inp => 3,
        MetricName::Lcp => 4,
        MetricName::Ttfb => 5,
    };
    &PROFILES[index]
}
