//! # pagevitals-core
//!
//! PAGEVITALS 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 메트릭 레코드, 성능 엔트리, 어트리뷰션, 라이프사이클 이벤트 (serde)
//! - [`ports`]: 호스트 런타임 포트 인터페이스 (엔트리 소스, 페이지 상태)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 리포트 옵션과 런타임 설정

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
