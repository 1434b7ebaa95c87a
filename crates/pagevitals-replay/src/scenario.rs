//! JSON 시나리오 모델.
//!
//! ```json
//! {
//!   "name": "cls-sessions",
//!   "page": { "ready_state": "complete" },
//!   "metrics": [{ "metric": "CLS" }],
//!   "steps": [
//!     { "step": "entries", "entries": [{ "entryType": "layout-shift", "startTime": 0, "value": 0.1 }] },
//!     { "step": "hide" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use pagevitals_core::config::{ReportOpts, VitalsConfig};
use pagevitals_core::error::CoreError;
use pagevitals_core::models::entry::{EntryKind, NavigationTiming, PerformanceEntry, ResourceTiming};
use pagevitals_core::models::lifecycle::{InputKind, ReadyState};
use pagevitals_core::models::metric::MetricName;
use pagevitals_core::ports::entry_source::SubscriptionId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReplayError;

/// 시나리오 전체
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub config: VitalsConfig,
    pub page: PageSetup,
    pub metrics: Vec<MetricRequest>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_str(content: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 파일에서 로드
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = fs::read_to_string(path).map_err(CoreError::from)?;
        let scenario = Self::from_json_str(&content)?;
        debug!(
            "시나리오 로드: {} ({}단계) from {}",
            scenario.name,
            scenario.steps.len(),
            path.display()
        );
        Ok(scenario)
    }
}

/// 초기 페이지 상태
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub hidden: bool,
    pub prerendering: bool,
    pub discarded: bool,
    pub ready_state: ReadyState,
    pub navigation: Option<NavigationTiming>,
    pub resources: Vec<ResourceTiming>,
    /// `interactionCount` 제공 여부 (없으면 런타임이 추정)
    pub native_interaction_count: bool,
    /// 관찰을 지원하지 않는 엔트리 종류
    pub unsupported: Vec<EntryKind>,
}

/// 메트릭 함수 호출 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub metric: MetricName,
    #[serde(default)]
    pub report_all_changes: bool,
    #[serde(default)]
    pub attribution: bool,
    #[serde(default)]
    pub duration_threshold: Option<f64>,
}

impl MetricRequest {
    pub fn new(metric: MetricName) -> Self {
        Self {
            metric,
            report_all_changes: false,
            attribution: false,
            duration_threshold: None,
        }
    }

    pub fn opts(&self) -> ReportOpts {
        ReportOpts {
            report_all_changes: self.report_all_changes,
            duration_threshold: self.duration_threshold,
            attribution: self.attribution,
        }
    }
}

/// 시나리오 단계. 시각이 필요한 이벤트는 호스트의 현재 시각을 쓴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// 현재 시각 이동
    Advance { to: f64 },
    /// 엔트리 생성 (전달하지 않음)
    Record { entries: Vec<PerformanceEntry> },
    /// 엔트리 생성 후 모든 구독 큐 전달
    Entries { entries: Vec<PerformanceEntry> },
    /// 구독 큐 전달 (지정하지 않으면 전체)
    Flush {
        #[serde(default)]
        subscription: Option<SubscriptionId>,
    },
    Hide,
    Show,
    PageHide {
        #[serde(default)]
        persisted: bool,
    },
    /// bfcache 복원 (`pageshow`, persisted)
    Restore,
    /// 프리렌더 활성화
    Activate,
    Input { kind: InputKind },
    Load,
    Tick,
}
