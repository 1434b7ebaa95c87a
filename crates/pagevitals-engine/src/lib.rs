//! # pagevitals-engine
//!
//! 메트릭 엔진과 라이프사이클 런타임.
//!
//! ## 구조
//!
//! - [`runtime`]: `VitalsRuntime`: 등록, 호스트 이벤트 디스패치, 콜백 호출
//! - [`engines`]: 메트릭별 상태 머신 (CLS, FCP, FID, INP, LCP, TTFB)
//! - [`reporter`]: 델타/등급 계산과 리포트 조건
//! - [`interactions`]: INP 최악 상호작용 집합, 상호작용 수 추정
//! - [`visibility`]: 최초 숨김 시각 추적
//! - [`source`]: 엔트리 구독 공유와 팬아웃
//! - [`episode`]: 메트릭 ID, 내비게이션 유형
//! - [`profile`]: 메트릭별 임계값과 어트리뷰션 함수 테이블

pub mod context;
pub mod engines;
pub mod episode;
pub mod interactions;
pub mod profile;
pub mod reporter;
pub mod runtime;
pub mod source;
pub mod visibility;

#[cfg(test)]
mod test_support;

pub use runtime::{RegistrationStatus, VitalsRuntime};
