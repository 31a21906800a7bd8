//! Background loading of audio sources.
//!
//! One dedicated worker thread turns identifiers into playable
//! [`SourceHandle`]s. This is the only thread in the system allowed to
//! block on I/O. Requests come in through a bounded SPSC queue and are
//! processed strictly oldest-first; finished handles go out through
//! another SPSC queue to the audio thread, in the same order.
//!
//! The worker sleeps via `park` and is unparked on submit; a short
//! `park_timeout` bounds the sleep as a safety net against a missed wake.

use crate::audio_data::AudioSourceLoader;
use crate::diag::Diagnostics;
use crate::reclaim::PoolInserter;
use crate::source::SourceHandle;
use crate::spsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

/// Control-thread end of the loader: submits identifiers to load.
pub struct LoadSubmitter {
    requests: spsc::Producer<String>,
    work_pending: Arc<AtomicBool>,
    worker: Thread,
    diag: Arc<Diagnostics>,
}

impl LoadSubmitter {
    /// Queues `identifier` for loading. Non-blocking; returns whether the
    /// request was accepted. A rejected request (queue full) is dropped
    /// and counted.
    pub fn submit(&mut self, identifier: impl Into<String>) -> bool {
        let identifier = identifier.into();
        if self.requests.push(identifier) {
            self.work_pending.store(true, Ordering::Release);
            self.worker.unpark();
            true
        } else {
            self.diag.count_request_dropped();
            log::warn!("request queue full, dropping load request");
            false
        }
    }
}

/// Owns the loader thread; joins it on drop.
pub struct BackgroundLoader {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundLoader {
    /// Spawns the worker thread.
    ///
    /// `results` carries finished handles to the audio thread and
    /// `registrar` gives the pool a reference to every handle the loader
    /// builds, so a load that is never consumed is still collectible —
    /// and so the audio thread never ends up holding the last reference.
    pub fn spawn(
        loader: Arc<dyn AudioSourceLoader>,
        request_capacity: usize,
        results: spsc::Producer<Arc<SourceHandle>>,
        registrar: PoolInserter,
        diag: Arc<Diagnostics>,
        wake_timeout: Duration,
    ) -> std::io::Result<(LoadSubmitter, BackgroundLoader)> {
        let (request_tx, request_rx) = spsc::channel(request_capacity);
        let work_pending = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_state = WorkerState {
            loader,
            requests: request_rx,
            results,
            registrar,
            work_pending: work_pending.clone(),
            shutdown: shutdown.clone(),
            diag: diag.clone(),
            wake_timeout,
        };

        let thread = thread::Builder::new()
            .name("swapdeck-loader".to_string())
            .spawn(move || worker_state.run())?;

        let submitter = LoadSubmitter {
            requests: request_tx,
            work_pending,
            worker: thread.thread().clone(),
            diag,
        };

        Ok((
            submitter,
            BackgroundLoader {
                shutdown,
                thread: Some(thread),
            },
        ))
    }
}

impl Drop for BackgroundLoader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

struct WorkerState {
    loader: Arc<dyn AudioSourceLoader>,
    requests: spsc::Consumer<String>,
    results: spsc::Producer<Arc<SourceHandle>>,
    registrar: PoolInserter,
    work_pending: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    diag: Arc<Diagnostics>,
    wake_timeout: Duration,
}

impl WorkerState {
    fn run(mut self) {
        log::info!("loader thread started");
        while !self.shutdown.load(Ordering::Acquire) {
            if self.work_pending.swap(false, Ordering::AcqRel) || !self.requests.is_empty() {
                // Drain every pending request, oldest first. An in-flight
                // open always runs to completion; there is no cancellation.
                while let Some(identifier) = self.requests.pop() {
                    self.process(identifier);
                }
            } else {
                thread::park_timeout(self.wake_timeout);
            }
        }
        log::info!("loader thread exiting");
    }

    fn process(&mut self, identifier: String) {
        match self.loader.open(&identifier) {
            Ok(data) => {
                let handle = Arc::new(SourceHandle::new(identifier, data));
                // The pool reference must exist before the handle is
                // published; without it the audio thread could end up
                // dropping the last reference.
                if !self.registrar.adopt(handle.clone()) {
                    log::warn!(
                        "pool hand-off full, discarding loaded source {:?}",
                        handle.identifier()
                    );
                    return;
                }
                if !self.results.push(handle) {
                    self.diag.count_result_dropped();
                    log::warn!("result queue full, dropping loaded source");
                }
            }
            Err(e) => {
                // No error object crosses the output channel; the request
                // simply produces nothing.
                self.diag.count_load_failure();
                log::warn!("failed to open {:?}: {}", identifier, e);
            }
        }
    }
}
