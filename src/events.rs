//! Language change notifications.
//!
//! [`EventStream`] is a synchronous multicast source. Delivery walks a
//! snapshot of the subscriber list taken without holding the lock, so
//! callbacks may subscribe, unsubscribe (themselves or others) or call back
//! into the service that emitted the event.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in subscription order.
//! 2. Each live subscriber receives each event exactly once.
//! 3. A subscriber unsubscribed before its turn in a broadcast is skipped.
//! 4. Subscribers added during a broadcast, or after it, miss that event.

use std::fmt;
use std::sync::atomic::{
    AtomicBool,
    AtomicU64,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    Weak,
};

use crate::tree::TranslationTree;
use crate::types::LanguageId;

/// Fired when [`crate::TranslateService::use_language`] completes.
#[derive(Debug, Clone, PartialEq)]
pub struct LangChangeEvent {
    pub lang: LanguageId,
    pub translations: TranslationTree,
}

/// Fired when [`crate::TranslateService::set_default_lang`] completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultLangChangeEvent {
    pub lang: LanguageId,
    pub translations: TranslationTree,
}

/// Fired when translations are installed for a language without changing
/// which language is active.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationChangeEvent {
    pub lang: LanguageId,
    pub translations: TranslationTree,
}

/// Subscriber callback.
type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// One registered callback.
struct Subscriber<E> {
    /// Subscription id, unique per stream
    id: u64,
    /// Cleared on unsubscribe; checked before each delivery
    active: Arc<AtomicBool>,
    callback: Callback<E>,
}

/// Shared interior of an [`EventStream`].
struct StreamInner<E> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber<E>>>,
}

impl<E> StreamInner<E> {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber<E>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removal hook held by [`Subscription`], erasing the event type.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<E: 'static> Detach for StreamInner<E> {
    fn detach(&self, id: u64) {
        self.subscribers().retain(|subscriber| subscriber.id != id);
    }
}

/// A synchronous multicast event source.
///
/// Cloning creates a new handle to the same subscriber list.
pub struct EventStream<E> {
    inner: Arc<StreamInner<E>>,
}

impl<E> Clone for EventStream<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: 'static> Default for EventStream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscriber_count", &self.inner.subscribers().len())
            .finish()
    }
}

impl<E: 'static> EventStream<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StreamInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers `callback` for every future event.
    ///
    /// The returned [`Subscription`] unsubscribes when
    /// [`Subscription::unsubscribe`] is called or when it is dropped.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.inner.subscribers().push(Subscriber {
            id,
            active: Arc::clone(&active),
            callback: Arc::new(callback),
        });

        let inner: Arc<dyn Detach> = self.inner.clone();
        Subscription { id, active, stream: Arc::downgrade(&inner) }
    }

    /// Delivers `event` to every live subscriber and returns how many
    /// callbacks ran.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<(Arc<AtomicBool>, Callback<E>)> = self
            .inner
            .subscribers()
            .iter()
            .map(|subscriber| (Arc::clone(&subscriber.active), Arc::clone(&subscriber.callback)))
            .collect();

        let mut delivered = 0;
        for (active, callback) in snapshot {
            if active.load(Ordering::Acquire) {
                callback(event);
                delivered += 1;
            }
        }

        tracing::trace!(delivered, "Event delivered");
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// Handle for one registration on an [`EventStream`].
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    stream: Weak<dyn Detach>,
}

impl Subscription {
    /// Stops delivery to this subscription, effective immediately, including
    /// for a broadcast currently in progress.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel)
            && let Some(stream) = self.stream.upgrade()
        {
            stream.detach(self.id);
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// The three change streams owned by one service instance.
#[derive(Debug, Default, Clone)]
pub struct LanguageChangeBroadcaster {
    pub lang_change: EventStream<LangChangeEvent>,
    pub default_lang_change: EventStream<DefaultLangChangeEvent>,
    pub translation_change: EventStream<TranslationChangeEvent>,
}
