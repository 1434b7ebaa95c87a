//! PAGEVITALS 도메인 모델.
//!
//! 호스트 런타임이 전달하는 성능 엔트리, 콜백으로 보고되는 메트릭 레코드,
//! 디버깅용 어트리뷰션, 페이지 라이프사이클 이벤트를 정의한다.
//! 엔트리/메트릭 모델은 브라우저 JSON 표기(camelCase)로 직렬화된다.

pub mod attribution;
pub mod entry;
pub mod lifecycle;
pub mod metric;
