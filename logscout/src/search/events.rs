use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

/// Progress notifications sent by a [`SearchEngine`](super::SearchEngine).
///
/// For one search the consumer observes exactly one `Started`, `FoundFile(i)`
/// before any `ResultPartial(i, _)`, and at most one `SearchFinished`, which
/// is never sent for a search that was cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    /// A new search has begun
    Started,
    /// The search was paused (`full_stop == false`, results kept) or reset
    /// (`full_stop == true`, results cleared)
    Stopped { full_stop: bool },
    /// A new record exists at `index` in the result store
    FoundFile { index: usize },
    /// The record at `index` gained a match; `position` is the new match's
    /// index within that record's match list
    ResultPartial { index: usize, position: usize },
    /// Every scanner drained its work without the search being cancelled
    SearchFinished,
}

impl SearchEvent {
    /// Whether this event ends the current search
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::Stopped { .. } | SearchEvent::SearchFinished)
    }
}

/// Fans events out to the current subscribers.
///
/// Nothing is buffered for a subscriber that does not exist: with no live
/// receiver an event is dropped, and a subscriber whose receiver was dropped
/// is forgotten at the next emit.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    subscribers: Mutex<Vec<Sender<SearchEvent>>>,
}

impl EventSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self) -> Receiver<SearchEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: SearchEvent) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event).is_ok());
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
