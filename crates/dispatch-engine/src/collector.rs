//! Message collectors: open "waiting for a follow-up" sessions.
//!
//! The engine consults open collectors before normal dispatch; a consumed
//! event never reaches the command registry. Collectors end on timeout,
//! match/try exhaustion, user cancel, or explicit stop, and the end reason
//! is observable by whoever is awaiting.

use chat_platform::ChatEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Why a collector ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Timeout,
    MaxMatches,
    MaxTries,
    Cancelled,
    Stopped,
}

type Filter = Box<dyn Fn(&ChatEvent) -> bool + Send + Sync>;

/// Scope and limits for a new collector.
pub struct CollectOptions {
    pub channel_id: String,
    pub author_id: String,
    pub max_matches: usize,
    pub max_tries: usize,
    pub timeout: Duration,
    filter: Option<Filter>,
}

impl CollectOptions {
    /// Scope to the channel and author of `event`, with one match, five
    /// tries, and a 30 second deadline.
    pub fn for_event(event: &ChatEvent) -> Self {
        Self {
            channel_id: event.channel.id.clone(),
            author_id: event.author.id.clone(),
            max_matches: 1,
            max_tries: 5,
            timeout: Duration::from_secs(30),
            filter: None,
        }
    }

    pub fn matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches.max(1);
        self
    }

    pub fn tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra predicate on top of the channel/author scope. In-scope events
    /// failing the predicate are still consumed, but count as spent tries.
    pub fn filter(mut self, filter: impl Fn(&ChatEvent) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

struct ActiveCollector {
    id: u64,
    channel_id: String,
    author_id: String,
    filter: Option<Filter>,
    matches_left: usize,
    tries_left: usize,
    deadline: std::time::Instant,
    tx: mpsc::UnboundedSender<ChatEvent>,
    ended: Arc<StdMutex<Option<EndReason>>>,
}

impl ActiveCollector {
    fn end(&self, reason: EndReason) {
        let mut ended = self.ended.lock().expect("end reason lock poisoned");
        if ended.is_none() {
            *ended = Some(reason);
        }
    }
}

/// All currently open collectors, consulted in registration order.
#[derive(Default)]
pub struct CollectorSet {
    active: Mutex<Vec<ActiveCollector>>,
    next_id: AtomicU64,
}

impl CollectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(self: &Arc<Self>, options: CollectOptions) -> Collector {
        let (tx, rx) = mpsc::unbounded_channel();
        let ended = Arc::new(StdMutex::new(None));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = std::time::Instant::now() + options.timeout;

        self.active.lock().await.push(ActiveCollector {
            id,
            channel_id: options.channel_id,
            author_id: options.author_id,
            filter: options.filter,
            matches_left: options.max_matches.max(1),
            tries_left: options.max_tries.max(1),
            deadline,
            tx,
            ended: Arc::clone(&ended),
        });

        Collector {
            id,
            set: Arc::clone(self),
            rx,
            deadline: tokio::time::Instant::from_std(deadline),
            ended,
        }
    }

    /// Offer an inbound event. Returns true when a collector consumed it,
    /// in which case dispatch must not see the event.
    pub async fn offer(&self, event: &ChatEvent) -> bool {
        let mut active = self.active.lock().await;
        let now = std::time::Instant::now();

        // Expire overdue collectors so a stale session can't eat events, and
        // drop ones whose receiving side is already gone.
        active.retain(|collector| {
            if collector.deadline <= now {
                collector.end(EndReason::Timeout);
                false
            } else if collector.tx.is_closed() {
                collector.end(EndReason::Stopped);
                false
            } else {
                true
            }
        });

        let Some(index) = active.iter().position(|collector| {
            collector.channel_id == event.channel.id && collector.author_id == event.author.id
        }) else {
            return false;
        };

        let finished = {
            let collector = &mut active[index];
            let accepted = collector
                .filter
                .as_ref()
                .map_or(true, |filter| filter(event));

            if accepted {
                let _ = collector.tx.send(event.clone());
                collector.matches_left -= 1;
                if collector.matches_left == 0 {
                    collector.end(EndReason::MaxMatches);
                    true
                } else {
                    false
                }
            } else {
                collector.tries_left -= 1;
                if collector.tries_left == 0 {
                    collector.end(EndReason::MaxTries);
                    true
                } else {
                    false
                }
            }
        };

        if finished {
            active.remove(index);
        }
        true
    }

    pub async fn open_count(&self) -> usize {
        self.active.lock().await.len()
    }

    async fn finish(&self, id: u64, reason: EndReason) {
        let mut active = self.active.lock().await;
        if let Some(position) = active.iter().position(|c| c.id == id) {
            let collector = active.remove(position);
            collector.end(reason);
            debug!(id, ?reason, "collector released");
        }
    }
}

/// Handle held by the code awaiting follow-up messages.
///
/// Dropping the handle releases the registration, so a panicking or
/// early-returning dialog cannot leak an open collector.
pub struct Collector {
    id: u64,
    set: Arc<CollectorSet>,
    rx: mpsc::UnboundedReceiver<ChatEvent>,
    deadline: tokio::time::Instant,
    ended: Arc<StdMutex<Option<EndReason>>>,
}

impl Collector {
    /// Await the next matching event, or the reason the collector ended.
    /// Events matched before the end are still delivered in order.
    pub async fn next(&mut self) -> Result<ChatEvent, EndReason> {
        match tokio::time::timeout_at(self.deadline, self.rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(self.end_reason().unwrap_or(EndReason::Stopped)),
            Err(_) => {
                self.set.finish(self.id, EndReason::Timeout).await;
                Err(self.end_reason().unwrap_or(EndReason::Timeout))
            }
        }
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        *self.ended.lock().expect("end reason lock poisoned")
    }

    /// End the collector now with an explicit reason.
    pub async fn stop(&mut self, reason: EndReason) {
        self.set.finish(self.id, reason).await;
        self.rx.close();
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if self.end_reason().is_some() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let set = Arc::clone(&self.set);
            let id = self.id;
            handle.spawn(async move { set.finish(id, EndReason::Stopped).await });
        }
    }
}
