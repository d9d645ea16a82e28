//! Per-thread service usage snapshot
//!
//! While a component method runs, every read of an injected field returns
//! the same value, whatever the registry does on other threads. The first
//! read opens a snapshot (depth 1); nested intercepted methods deepen it;
//! the snapshot is discarded when the outermost method completes.
//!
//! ```text
//! enter(run)       depth 0 -> 0   (no snapshot yet)
//! read(field)      depth 0 -> 1   snapshot = resolve()
//!   enter(helper)  depth 1 -> 2
//!   read(field)    depth 2        returns snapshot
//!   exit(helper)   depth 2 -> 1
//! exit(run)        depth 1 -> 0   snapshot discarded
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dcr_domain::FieldValue;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

struct Usage {
    depth: usize,
    generation: u64,
    value: FieldValue,
}

thread_local! {
    static USAGES: RefCell<HashMap<u64, Usage>> = RefCell::new(HashMap::new());
}

/// Thread-local snapshot slot owned by one dependency
///
/// [`clear`](Self::clear) bumps the slot generation; snapshots opened on
/// any thread before that are stale and never returned again.
#[derive(Debug)]
pub struct ServiceUsage {
    key: u64,
    generation: AtomicU64,
}

impl Default for ServiceUsage {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceUsage {
    /// Allocate a new slot
    pub fn new() -> Self {
        Self {
            key: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            generation: AtomicU64::new(0),
        }
    }

    fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Snapshot depth on the current thread
    pub fn depth(&self) -> usize {
        USAGES.with(|usages| usages.borrow().get(&self.key).map_or(0, |u| u.depth))
    }

    /// Method entry: deepen an active snapshot, otherwise do nothing
    pub fn enter(&self) {
        let generation = self.current();
        USAGES.with(|usages| {
            if let Some(usage) = usages.borrow_mut().get_mut(&self.key) {
                usage.depth += 1;
                usage.forget_if_stale(generation);
            }
        });
    }

    /// Method completion: shallow the snapshot, discarding it at depth 0
    pub fn exit(&self) {
        let generation = self.current();
        USAGES.with(|usages| {
            let mut usages = usages.borrow_mut();
            if let Some(usage) = usages.get_mut(&self.key) {
                usage.depth = usage.depth.saturating_sub(1);
                usage.forget_if_stale(generation);
                if usage.depth == 0 {
                    usages.remove(&self.key);
                }
            }
        });
    }

    /// Cached value of the active snapshot, or a fresh one from `resolve`
    pub fn snapshot_or_init<F: FnOnce() -> FieldValue>(&self, resolve: F) -> FieldValue {
        let generation = self.current();
        let cached = USAGES.with(|usages| {
            usages
                .borrow()
                .get(&self.key)
                .filter(|u| u.generation == generation)
                .map(|u| u.value.clone())
        });
        if let Some(value) = cached {
            return value;
        }

        // resolve() may read other dependencies; keep the table unborrowed
        let value = resolve();
        USAGES.with(|usages| {
            let mut usages = usages.borrow_mut();
            let usage = usages.entry(self.key).or_insert(Usage {
                depth: 1,
                generation,
                value: FieldValue::Empty,
            });
            // a stale snapshot keeps the nesting of the method still running
            usage.generation = generation;
            usage.value = value.clone();
        });
        value
    }

    /// Invalidate the snapshots of every thread
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        USAGES.with(|usages| {
            usages.borrow_mut().remove(&self.key);
        });
    }
}

impl Usage {
    /// Drop the provider objects of a snapshot taken before the last clear
    fn forget_if_stale(&mut self, generation: u64) {
        if self.generation != generation {
            self.value = FieldValue::Empty;
        }
    }
}
