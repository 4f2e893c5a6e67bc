//! The idle batch queue. Accepted messages accumulate here and drain to the
//! sink either synchronously (`drain_all`) or across frame-budgeted idle
//! opportunities (`drain_partial`), so delivery never monopolizes the host's
//! main thread.

use crate::message::Message;
use crate::sched::Scheduler;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// The application-supplied delivery callback, invoked once per message.
pub type Sink = Rc<dyn Fn(Message)>;

/// Upper bound on undelivered messages. Without a sink the queue would
/// otherwise grow forever; beyond this the oldest message is dropped.
pub const MAX_PENDING: usize = 1024;

struct QueueState {
    pending: VecDeque<Message>,
    sink: Option<Sink>,
    frame_size: u64,
    /// An idle drain is outstanding; submissions must not schedule another.
    scheduled: bool,
}

/// FIFO queue of pending messages with time-sliced draining.
///
/// Cheap to clone; clones share state. Single-threaded by construction —
/// the only yield point is the scheduler's idle callback.
#[derive(Clone)]
pub struct IdleQueue {
    state: Rc<RefCell<QueueState>>,
    scheduler: Rc<dyn Scheduler>,
}

impl IdleQueue {
    #[must_use]
    pub fn new(scheduler: Rc<dyn Scheduler>, frame_size: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                pending: VecDeque::new(),
                sink: None,
                frame_size,
                scheduled: false,
            })),
            scheduler,
        }
    }

    pub fn set_sink(&self, sink: Option<Sink>) {
        self.state.borrow_mut().sink = sink;
    }

    pub fn set_frame_size(&self, ms: u64) {
        self.state.borrow_mut().frame_size = ms;
    }

    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.state.borrow().sink.is_some()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Appends a message and, on the empty-to-non-empty transition,
    /// schedules exactly one drain opportunity. Submissions while a drain
    /// is outstanding coalesce into it.
    pub fn submit(&self, msg: Message) {
        let needs_schedule = {
            let mut state = self.state.borrow_mut();

            if state.pending.len() >= MAX_PENDING {
                state.pending.pop_front();
                tracing::warn!("pending message limit reached, dropping oldest");
            }

            state.pending.push_back(msg);

            if state.scheduled {
                false
            } else {
                state.scheduled = true;
                true
            }
        };

        if needs_schedule {
            self.schedule_drain();
        }
    }

    /// Delivers directly to the sink, bypassing the queue. Non-idle mode
    /// delivery; without a sink the message is discarded.
    pub fn deliver_now(&self, msg: Message) {
        let sink = self.state.borrow().sink.clone();
        if let Some(sink) = sink {
            sink(msg);
        } else {
            tracing::debug!("no sink configured, discarding message");
        }
    }

    /// Drains FIFO until the frame budget elapses, leaving the remainder
    /// queued and rescheduling itself for the next idle opportunity. At
    /// least one message is delivered per drain, so a zero budget still
    /// makes progress one message per tick. With no sink configured this
    /// is a no-op and messages stay queued.
    pub fn drain_partial(&self) {
        self.state.borrow_mut().scheduled = false;

        let (sink, frame_size) = {
            let state = self.state.borrow();
            (state.sink.clone(), state.frame_size)
        };
        let Some(sink) = sink else {
            return;
        };

        let start = self.scheduler.now();

        loop {
            // Short borrow per pop: the sink must be free to re-enter the
            // collector (it must not touch the queue, but may log).
            let Some(msg) = self.state.borrow_mut().pending.pop_front() else {
                return;
            };

            sink(msg);

            // The budget check follows delivery; no drain is a no-op.
            if self.scheduler.now().saturating_sub(start) >= frame_size {
                break;
            }
        }

        let reschedule = {
            let mut state = self.state.borrow_mut();
            if state.pending.is_empty() || state.scheduled {
                false
            } else {
                state.scheduled = true;
                true
            }
        };

        if reschedule {
            self.schedule_drain();
        }
    }

    /// Drains everything regardless of budget. Teardown and explicit flush.
    pub fn drain_all(&self) {
        let sink = self.state.borrow().sink.clone();
        let Some(sink) = sink else {
            return;
        };

        while let Some(msg) = self.state.borrow_mut().pending.pop_front() {
            sink(msg);
        }
    }

    /// Discards all pending messages without delivering them. Messages
    /// queued while enabled must not leak out after disablement.
    pub fn clear(&self) {
        self.state.borrow_mut().pending.clear();
    }

    fn schedule_drain(&self) {
        let queue = self.clone();
        self.scheduler
            .schedule_idle(Box::new(move || queue.drain_partial()));
    }
}
