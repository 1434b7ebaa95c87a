//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 호스트 런타임(브라우저 바인딩, 스크립트 호스트 등)이 이 trait들을 구현하며,
//! `pagevitals-engine`의 `VitalsRuntime`에 `Box<dyn T>`로 와이어링한다.
//!
//! 모든 호출은 단일 스레드 이벤트 턴 안에서 동기적으로 일어나므로
//! `Send`/`Sync`를 요구하지 않는다.

pub mod entry_source;
pub mod page;
