//! 엔진 호출 시점의 페이지 상태 스냅샷.

use pagevitals_core::ports::page::PageHost;

/// 엔진이 신호를 처리할 때 참조하는 페이지 상태
///
/// 런타임이 매 신호마다 새로 만들어 전달한다. 엔진은 보관하지 않는다.
#[derive(Clone, Copy)]
pub struct PageView<'a> {
    /// 호스트 페이지 포트
    pub page: &'a dyn PageHost,
    /// 페이지가 처음 숨겨진 시각 (숨겨진 적 없으면 +∞)
    pub first_hidden_time: f64,
    /// 페이지 전체 상호작용 수 (네이티브 또는 추정)
    pub interaction_count: u64,
    /// 마지막 bfcache 복원 시각
    pub restore_time: Option<f64>,
    /// 현재 숨김 상태
    pub hidden: bool,
}

impl<'a> PageView<'a> {
    /// 복원/숨김 이력이 없는 초기 상태
    pub fn initial(page: &'a dyn PageHost) -> Self {
        Self {
            page,
            first_hidden_time: f64::INFINITY,
            interaction_count: 0,
            restore_time: None,
            hidden: page.is_hidden(),
        }
    }

    pub fn now(&self) -> f64 {
        self.page.now()
    }

    /// 프리렌더 활성화 시각 기준으로 보정 (0 미만은 0)
    pub fn since_activation(&self, time: f64) -> f64 {
        (time - self.page.activation_start()).max(0.0)
    }
}
