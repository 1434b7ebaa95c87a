//! # pagevitals-replay
//!
//! 메모리 스크립트 호스트와 JSON 시나리오 러너.
//! 브라우저 없이 `VitalsRuntime`을 결정적으로 구동해 리포트 순서를 검증한다.
//!
//! - [`host`]: `EntrySource` + `PageHost` 구현 (버퍼 재생, `event` 지속 시간 필터)
//! - [`scenario`]: 시나리오 JSON 모델
//! - [`replay`]: 단계 실행과 리포트 수집
//! - [`error`]: `ReplayError`

pub mod error;
pub mod host;
pub mod replay;
pub mod scenario;

pub use error::ReplayError;
pub use host::ScriptedHost;
pub use replay::Replay;
pub use scenario::{MetricRequest, PageSetup, Scenario, Step};
