//! Message window polling for the active room.
//!
//! Every fetch is tagged with the room it targeted and only applied if that
//! room is still active when the response lands. Per room at most one fetch
//! is in flight: poll ticks that collide with it are skipped, explicit
//! refreshes are deferred and re-run once the current fetch completes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::constants::POLL_INTERVAL;
use crate::error::{ChatError, ServiceError};
use crate::events::{emit, CoreEvent, EventSender};
use crate::models::{sort_for_display, Message, MessageId, RoomId};
use crate::service::SharedService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The window was replaced with `count` messages
    Applied { count: usize },
    /// The room stopped being active before the response arrived
    Stale,
    /// Queued behind the fetch already in flight for this room
    Deferred,
    /// A poll tick collided with an in-flight fetch
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tick,
    Refresh,
}

#[derive(Default)]
struct SyncState {
    active: Option<RoomId>,
    messages: Vec<Message>,
    last_error: Option<String>,
    in_flight: HashSet<RoomId>,
    refresh_pending: HashSet<RoomId>,
}

/// Clears the in-flight marker if the fetch future is dropped mid-request.
/// A completed fetch releases the marker itself and disarms the guard.
struct InFlightGuard {
    state: Arc<Mutex<SyncState>>,
    room_id: RoomId,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().in_flight.remove(&self.room_id);
        }
    }
}

#[derive(Clone)]
struct Fetcher {
    service: SharedService,
    state: Arc<Mutex<SyncState>>,
    limit: u32,
    events: Option<EventSender>,
}

impl Fetcher {
    async fn fetch(&self, room_id: RoomId, trigger: Trigger) -> Result<FetchOutcome, ChatError> {
        {
            let mut state = self.state.lock();
            if state.active != Some(room_id) {
                return Ok(FetchOutcome::Stale);
            }
            if state.in_flight.contains(&room_id) {
                return Ok(match trigger {
                    Trigger::Tick => FetchOutcome::Skipped,
                    Trigger::Refresh => {
                        state.refresh_pending.insert(room_id);
                        FetchOutcome::Deferred
                    }
                });
            }
            state.in_flight.insert(room_id);
        }
        let mut guard = InFlightGuard {
            state: self.state.clone(),
            room_id,
            armed: true,
        };

        loop {
            let result = self.service.list_messages(room_id, None, self.limit).await;
            let outcome = self.apply(room_id, result);

            // pending check and in-flight release share one critical section
            let rerun = {
                let mut state = self.state.lock();
                let rerun =
                    state.refresh_pending.remove(&room_id) && state.active == Some(room_id);
                if !rerun {
                    state.in_flight.remove(&room_id);
                }
                rerun
            };
            if !rerun {
                guard.armed = false;
                return outcome;
            }
            debug!(room_id, "running deferred refresh");
        }
    }

    fn apply(
        &self,
        room_id: RoomId,
        result: Result<Vec<Message>, ServiceError>,
    ) -> Result<FetchOutcome, ChatError> {
        let mut state = self.state.lock();
        if state.active != Some(room_id) {
            debug!(room_id, "discarding response for inactive room");
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok(mut messages) => {
                sort_for_display(&mut messages);
                let count = messages.len();
                state.messages = messages;
                state.last_error = None;
                drop(state);
                emit(self.events.as_ref(), CoreEvent::MessagesChanged { room_id });
                Ok(FetchOutcome::Applied { count })
            }
            Err(e) => {
                warn!(room_id, error = %e, "message fetch failed");
                let err = ChatError::Messages(e);
                let text = err.to_string();
                let repeated = state.last_error.as_deref() == Some(text.as_str());
                state.last_error = Some(text.clone());
                drop(state);
                if !repeated {
                    emit(self.events.as_ref(), CoreEvent::Error(text));
                }
                Err(err)
            }
        }
    }
}

/// Handle to a room's poll timer. Cancelling is idempotent, and dropping the
/// handle cancels it.
pub struct PollHandle {
    room_id: RoomId,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    fn spawn(fetcher: Fetcher, room_id: RoomId, period: Duration) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            // activation fetch is issued by the caller; first tick is one period out
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if *cancel_rx.borrow() {
                            break;
                        }
                        match fetcher.fetch(room_id, Trigger::Tick).await {
                            Ok(FetchOutcome::Skipped) => {
                                debug!(room_id, "poll tick skipped, fetch in flight");
                            }
                            Ok(FetchOutcome::Stale) => break,
                            Ok(_) => {}
                            Err(e) => debug!(room_id, error = %e, "poll tick failed"),
                        }
                    }
                }
            }
            debug!(room_id, "poller stopped");
        });

        Self {
            room_id,
            cancel_tx,
            task,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Message window of the active room, refreshed on activation, on demand
/// and on a fixed cadence.
pub struct MessageSync {
    fetcher: Fetcher,
    poll_interval: Duration,
    poller: Mutex<Option<PollHandle>>,
}

impl MessageSync {
    /// A zero `poll_interval` falls back to the default cadence.
    pub fn new(service: SharedService, poll_interval: Duration, limit: u32) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            warn!("zero poll interval, using default");
            POLL_INTERVAL
        } else {
            poll_interval
        };
        Self {
            fetcher: Fetcher {
                service,
                state: Arc::new(Mutex::new(SyncState::default())),
                limit,
                events: None,
            },
            poll_interval,
            poller: Mutex::new(None),
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.fetcher.events = Some(events);
        self
    }

    /// Make `room_id` the active room and start its poll timer.
    ///
    /// Switching to a different room clears the window; late responses for
    /// the previous room are discarded by the tag check. Re-activating the
    /// room that is already polling is a no-op. Must be called from within a
    /// tokio runtime. The activation fetch itself is `refresh()`.
    pub fn activate(&self, room_id: RoomId) {
        let mut poller = self.poller.lock();
        if poller
            .as_ref()
            .is_some_and(|p| p.room_id() == room_id && p.is_running())
        {
            return;
        }
        if let Some(previous) = poller.take() {
            previous.cancel();
        }

        {
            let mut state = self.fetcher.state.lock();
            if state.active != Some(room_id) {
                state.messages.clear();
                state.last_error = None;
            }
            state.active = Some(room_id);
        }

        debug!(room_id, interval_ms = self.poll_interval.as_millis() as u64, "polling room");
        *poller = Some(PollHandle::spawn(
            self.fetcher.clone(),
            room_id,
            self.poll_interval,
        ));
    }

    /// Stop polling and forget the active room. Safe to call repeatedly.
    pub fn deactivate(&self) {
        if let Some(poller) = self.poller.lock().take() {
            poller.cancel();
        }
        self.fetcher.state.lock().active = None;
    }

    /// Fetch the active room now, outside the tick cadence.
    pub async fn refresh(&self) -> Result<FetchOutcome, ChatError> {
        let room_id = self.active_room().ok_or(ChatError::NoActiveRoom)?;
        self.fetcher.fetch(room_id, Trigger::Refresh).await
    }

    pub fn active_room(&self) -> Option<RoomId> {
        self.fetcher.state.lock().active
    }

    /// Snapshot of the current window in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.fetcher.state.lock().messages.clone()
    }

    /// Borrow the window without cloning it.
    pub fn with_window<R>(&self, f: impl FnOnce(&[Message]) -> R) -> R {
        f(&self.fetcher.state.lock().messages)
    }

    pub fn find_message(&self, message_id: MessageId) -> Option<Message> {
        self.fetcher
            .state
            .lock()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.fetcher.state.lock().last_error.clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().as_ref().is_some_and(|p| p.is_running())
    }

    pub fn is_fetching(&self, room_id: RoomId) -> bool {
        self.fetcher.state.lock().in_flight.contains(&room_id)
    }
}

impl Drop for MessageSync {
    fn drop(&mut self) {
        self.deactivate();
    }
}
