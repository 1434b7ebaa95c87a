//! 엔트리 소스 어댑터.
//!
//! 호스트 구독은 (종류, 옵션) 조합마다 하나만 열고 여러 리스너에 팬아웃한다.
//! 이미 엔트리를 전달한 구독에 버퍼 재생 요청이 새로 들어오면
//! 과거 엔트리를 다시 받을 수 있도록 별도 호스트 구독을 연다.

use std::collections::BTreeMap;

use pagevitals_core::models::entry::{EntryKind, PerformanceEntry};
use pagevitals_core::ports::entry_source::{EntrySource, ObserveOptions, SubscriptionId};
use tracing::{debug, trace};

/// 구독 엔트리를 받는 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    /// `VitalsRuntime` 등록 인덱스
    Registration(usize),
    /// 상호작용 수 추정
    InteractionCounter,
}

/// 구독 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub handle: Option<SubscriptionId>,
    pub supported: bool,
}

impl Subscription {
    fn unsupported() -> Self {
        Self {
            handle: None,
            supported: false,
        }
    }
}

#[derive(Debug)]
struct Channel {
    kind: EntryKind,
    options: ObserveOptions,
    listeners: Vec<Listener>,
    delivered: bool,
}

pub struct EntrySourceAdapter {
    source: Box<dyn EntrySource>,
    channels: BTreeMap<SubscriptionId, Channel>,
}

impl EntrySourceAdapter {
    pub fn new(source: Box<dyn EntrySource>) -> Self {
        Self {
            source,
            channels: BTreeMap::new(),
        }
    }

    /// 구독 시작. 런타임이 종류를 지원하지 않으면 `supported = false`.
    pub fn subscribe(
        &mut self,
        kind: EntryKind,
        options: ObserveOptions,
        listener: Listener,
    ) -> Subscription {
        let shared = self.channels.iter_mut().find(|(_, channel)| {
            channel.kind == kind
                && channel.options == options
                && !(options.buffered && channel.delivered)
        });
        if let Some((id, channel)) = shared {
            if !channel.listeners.contains(&listener) {
                channel.listeners.push(listener);
            }
            trace!("{} 구독 공유: {}", kind.as_str(), id);
            return Subscription {
                handle: Some(*id),
                supported: true,
            };
        }

        let Some(id) = self.source.observe(kind, &options) else {
            debug!("{} 엔트리 미지원", kind.as_str());
            return Subscription::unsupported();
        };
        debug!("{} 구독 시작: {}", kind.as_str(), id);
        self.channels.insert(
            id,
            Channel {
                kind,
                options,
                listeners: vec![listener],
                delivered: false,
            },
        );
        Subscription {
            handle: Some(id),
            supported: true,
        }
    }

    /// 큐에 남아 있는 미전달 엔트리를 꺼낸다
    pub fn drain_pending(&mut self, id: SubscriptionId) -> Vec<PerformanceEntry> {
        if !self.channels.contains_key(&id) {
            return Vec::new();
        }
        self.source.take_records(id)
    }

    /// 엔트리 전달 대상 (종류와 리스너). 종료된 구독이면 `None`.
    pub fn deliver(&mut self, id: SubscriptionId) -> Option<(EntryKind, Vec<Listener>)> {
        let channel = self.channels.get_mut(&id)?;
        channel.delivered = true;
        Some((channel.kind, channel.listeners.clone()))
    }

    /// 리스너 하나의 구독 종료. 남은 리스너가 없으면 호스트 구독도 끊는다.
    pub fn stop(&mut self, id: SubscriptionId, listener: Listener) {
        let Some(channel) = self.channels.get_mut(&id) else {
            return;
        };
        channel.listeners.retain(|l| *l != listener);
        if channel.listeners.is_empty() {
            let kind = channel.kind;
            self.channels.remove(&id);
            self.source.disconnect(id);
            debug!("{} 구독 종료: {}", kind.as_str(), id);
        }
    }

    /// 열려 있는 호스트 구독
    pub fn handles(&self) -> Vec<SubscriptionId> {
        self.channels.keys().copied().collect()
    }

    pub fn is_open(&self, id: SubscriptionId) -> bool {
        self.channels.contains_key(&id)
    }
}
