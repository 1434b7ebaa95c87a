//! 리플레이 에러 타입.

use pagevitals_core::error::CoreError;
use pagevitals_core::ports::entry_source::SubscriptionId;
use thiserror::Error;

/// 시나리오 로드/실행 에러
#[derive(Debug, Error)]
pub enum ReplayError {
    /// 설정 로드/검증 실패
    #[error("코어 에러: {0}")]
    Core(#[from] CoreError),

    /// 시나리오 JSON 파싱 실패
    #[error("시나리오 파싱 실패: {0}")]
    Scenario(#[from] serde_json::Error),

    /// 열린 적 없거나 이미 종료된 구독 참조
    #[error("알 수 없는 구독: {0}")]
    UnknownSubscription(SubscriptionId),

    /// 실행할 수 없는 단계
    #[error("잘못된 시나리오 단계: {0}")]
    InvalidStep(String),
}
