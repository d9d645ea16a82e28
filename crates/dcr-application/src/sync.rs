//! Serial delivery queue
//!
//! Work that must reach user code in a strict order (binding callbacks,
//! state notifications) is recorded under the owner's lock and delivered
//! after the lock is released. At most one thread delivers at a time:
//!
//! ```text
//!  thread A: lock ─ push(a1) ─ unlock ─ drain ──► deliver(a1) ─► deliver(b1) ─► idle
//!  thread B:            lock ─ push(b1) ─ unlock ─ drain (A is delivering: return)
//!  thread C:                       run_in_order(c1) ── wait ──────────────────► deliver(c1)
//! ```
//!
//! [`SerialQueue::drain`] hands its items to whichever thread is already
//! delivering. [`SerialQueue::run_in_order`] waits for that thread instead
//! and delivers its item itself, after everything recorded before it. A
//! thread that is itself delivering (a callback that triggers more work)
//! gets its drained items deferred to the running loop, and its
//! `run_in_order` items delivered in a nested frame.

use std::cell::Cell;
use std::collections::VecDeque;

use parking_lot::{Mutex, ReentrantMutex};

/// Ordered, single-deliverer work queue
pub struct SerialQueue<T> {
    pending: Mutex<VecDeque<T>>,
    /// Held by the delivering thread; the flag marks an active delivery loop
    delivery: ReentrantMutex<Cell<bool>>,
}

impl<T> Default for SerialQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SerialQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            delivery: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Record an item; call one of the drain methods afterwards
    pub fn push(&self, item: T) {
        self.pending.lock().push_back(item);
    }

    /// Drop every pending item
    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether no item is pending
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Whether the current thread is delivering
    pub fn is_delivering(&self) -> bool {
        self.delivery.try_lock().is_some_and(|active| active.get())
    }

    /// Deliver pending items unless some thread (this one included) already is
    pub fn drain<F: FnMut(T)>(&self, mut deliver: F) {
        loop {
            {
                let Some(slot) = self.delivery.try_lock() else {
                    return;
                };
                if slot.get() {
                    return;
                }
                let _active = Active::set(&slot);
                self.pump(&mut deliver);
            }
            // an item pushed while the slot was released still needs a deliverer
            if self.is_empty() {
                return;
            }
        }
    }

    /// Deliver `item` on the calling thread once every earlier item is delivered
    ///
    /// Waits while another thread is delivering. On the delivering thread
    /// itself the item is delivered right away.
    pub fn run_in_order<F: FnMut(T)>(&self, item: T, mut deliver: F) {
        {
            let slot = self.delivery.lock();
            if slot.get() {
                deliver(item);
                return;
            }
            let _active = Active::set(&slot);
            self.pump(&mut deliver);
            deliver(item);
            self.pump(&mut deliver);
        }
        self.drain(deliver);
    }

    fn pump<F: FnMut(T)>(&self, deliver: &mut F) {
        loop {
            let next = self.pending.lock().pop_front();
            match next {
                Some(item) => deliver(item),
                None => return,
            }
        }
    }
}

/// Marks the delivery loop active; cleared on drop, unwinding included
struct Active<'a>(&'a Cell<bool>);

impl<'a> Active<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
