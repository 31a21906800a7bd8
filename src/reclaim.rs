//! Deferred reclamation of retired audio sources.
//!
//! The pool holds an extra strong reference to every source that has been
//! loaded or retired, so that no matter where the other references are
//! dropped, the final (expensive) destruction happens here, on the
//! housekeeping thread, never on the real-time thread.
//!
//! Insertion has two paths. The owner of the [`ReclamationPool`] inserts
//! directly with [`ReclamationPool::adopt`]. Every other thread holds its
//! own [`PoolInserter`], whose `adopt` pushes onto a dedicated SPSC
//! hand-off queue and sets a pending flag; the handle joins the pool's
//! collection at the next [`sweep`](ReclamationPool::sweep). The
//! real-time thread therefore never mutates the collection and never runs
//! a destructor — it only pushes a pointer.

use crate::diag::Diagnostics;
use crate::source::SourceHandle;
use crate::spsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Owner-side collection of retired (and in-flight) sources.
///
/// Not `Send`-shared: exactly one thread owns the pool and runs sweeps.
/// Other threads interact through [`PoolInserter`]s created before the
/// pool moves to its owner thread.
pub struct ReclamationPool {
    retained: Vec<Arc<SourceHandle>>,
    inlets: Vec<Inlet>,
}

struct Inlet {
    queue: spsc::Consumer<Arc<SourceHandle>>,
    pending: Arc<AtomicBool>,
}

/// Hand-off end for one non-owner thread.
///
/// Each inserter owns a dedicated SPSC queue into the pool, so the loader
/// thread and the audio thread can both retire sources without ever
/// sharing a producer cursor.
pub struct PoolInserter {
    queue: spsc::Producer<Arc<SourceHandle>>,
    pending: Arc<AtomicBool>,
    diag: Arc<Diagnostics>,
}

impl PoolInserter {
    /// Hands `handle` to the pool for deferred destruction.
    ///
    /// Never blocks or allocates. Returns `false` if the hand-off queue
    /// is full; the reference is dropped on the spot, which is only safe
    /// because the pool already holds a reference to every loader-built
    /// handle. The drop is counted in diagnostics.
    pub fn adopt(&mut self, handle: Arc<SourceHandle>) -> bool {
        if self.queue.push(handle) {
            self.pending.store(true, Ordering::Release);
            true
        } else {
            self.diag.count_retirement_dropped();
            false
        }
    }
}

impl ReclamationPool {
    pub fn new() -> Self {
        Self {
            retained: Vec::new(),
            inlets: Vec::new(),
        }
    }

    /// Creates a hand-off end for one client thread.
    ///
    /// Call once per client during setup, before the pool moves to its
    /// owner thread.
    pub fn inserter(&mut self, capacity: usize, diag: Arc<Diagnostics>) -> PoolInserter {
        let (tx, rx) = spsc::channel(capacity);
        let pending = Arc::new(AtomicBool::new(false));
        self.inlets.push(Inlet {
            queue: rx,
            pending: pending.clone(),
        });
        PoolInserter {
            queue: tx,
            pending,
            diag,
        }
    }

    /// Owner-thread direct insertion, deduplicated by identity.
    pub fn adopt(&mut self, handle: Arc<SourceHandle>) {
        Self::adopt_into(&mut self.retained, handle);
    }

    fn adopt_into(retained: &mut Vec<Arc<SourceHandle>>, handle: Arc<SourceHandle>) {
        if !retained.iter().any(|h| Arc::ptr_eq(h, &handle)) {
            retained.push(handle);
        }
    }

    /// Drains pending hand-offs, then destroys every source the pool is
    /// the sole owner of. Returns the number destroyed.
    pub fn sweep(&mut self) -> usize {
        for inlet in &mut self.inlets {
            if inlet.pending.swap(false, Ordering::AcqRel) {
                while let Some(handle) = inlet.queue.pop() {
                    Self::adopt_into(&mut self.retained, handle);
                }
            }
        }

        let before = self.retained.len();
        self.retained.retain(|h| Arc::strong_count(h) > 1);
        let destroyed = before - self.retained.len();
        if destroyed > 0 {
            log::debug!("reclamation sweep destroyed {} source(s)", destroyed);
        }
        destroyed
    }

    /// Number of sources currently kept alive by the pool.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

impl Default for ReclamationPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedicated low-priority thread that owns a pool and sweeps it on a
/// fixed cadence.
pub struct Housekeeper {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Housekeeper {
    /// Moves `pool` onto a new thread and sweeps it every `interval`.
    pub fn spawn(mut pool: ReclamationPool, interval: Duration) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let thread = thread::Builder::new()
            .name("swapdeck-housekeeping".to_string())
            .spawn(move || {
                log::info!("housekeeping thread started");
                loop {
                    pool.sweep();
                    if shutdown_flag.load(Ordering::Acquire) {
                        break;
                    }
                    thread::park_timeout(interval);
                }
                // Dropping the pool here destroys whatever is left, still
                // off the real-time thread.
                log::info!("housekeeping thread exiting");
            })?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

impl Drop for Housekeeper {
    fn drop(&mut self) {
        self.stop();
    }
}
