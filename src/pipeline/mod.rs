//! The threaded row pipeline.
//!
//! The calling thread is the only producer: it reads lines into pooled
//! buffers and pushes one [`WorkItem`] per line onto a lock-free
//! [`CircularBuffer`]. Long-lived workers pop items, decode them straight
//! into the caller's destination slice at the item's index, and hand the
//! buffer back to the pool. Because indices are disjoint, the destination
//! needs no locking and results need no merging.
//!
//! A batch ends when the destination is full or the source is exhausted;
//! either way the producer waits until every issued item has completed
//! before returning, so the destination borrow never outlives the batch.

mod worker;

use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::binding::{BindingTable, CsvRecord, ParseOptions};
use crate::error::{CsvError, Result};
use crate::queue::{BufferPool, CircularBuffer, SpinWait};

/// One line handed from the producer to a worker.
#[derive(Debug)]
pub struct WorkItem {
    /// Pooled line buffer; only the first `len` bytes are meaningful
    pub buf: Box<[u8]>,
    /// True length of the line, which may exceed `buf.len()`
    pub len: usize,
    /// 1-based physical line number
    pub line_no: usize,
    /// Index in the destination slice this line decodes into
    pub dest_index: usize,
}

/// Outcome of a batch fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filled {
    /// Number of records written, starting at the requested offset
    pub rows: usize,
    /// `false` once the source is exhausted
    pub more_data: bool,
}

pub(crate) struct Shared<T> {
    queue: CircularBuffer<WorkItem>,
    buffers: BufferPool,
    table: Arc<BindingTable<T>>,
    dest: AtomicPtr<T>,
    completed: AtomicUsize,
    stop: AtomicBool,
    failed: AtomicBool,
    error: Mutex<Option<CsvError>>,
}

impl<T> Shared<T> {
    /// Keep the first error of a batch; later ones are only logged.
    fn record_error(&self, error: CsvError) {
        let mut slot = match self.error.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_none() {
            *slot = Some(error);
            self.failed.store(true, Ordering::Release);
        } else {
            debug!(error = %error, "dropping additional worker error");
        }
    }

    fn take_error(&self) -> Option<CsvError> {
        let mut slot = match self.error.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.failed.store(false, Ordering::Release);
        slot.take()
    }
}

/// Long-lived decode workers shared by every batch of one session.
pub struct WorkerPool<T: CsvRecord> {
    shared: Arc<Shared<T>>,
    handles: Vec<JoinHandle<()>>,
    issued: usize,
}

impl<T: CsvRecord> WorkerPool<T> {
    /// Spawn `workers` threads decoding against `table`.
    ///
    /// `line_len` sizes the pooled line buffers; `queue_capacity` is rounded
    /// up to a power of two.
    pub fn start(
        table: Arc<BindingTable<T>>,
        workers: usize,
        queue_capacity: usize,
        line_len: usize,
        opts: ParseOptions,
    ) -> Result<Self> {
        let workers = workers.max(1);
        let queue = CircularBuffer::new(queue_capacity);
        let buffers = BufferPool::new(queue.capacity() + workers, line_len);
        let shared = Arc::new(Shared {
            queue,
            buffers,
            table,
            dest: AtomicPtr::new(std::ptr::null_mut()),
            completed: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
        });

        let mut pool = Self {
            shared,
            handles: Vec::with_capacity(workers),
            issued: 0,
        };
        for id in 0..workers {
            let shared = Arc::clone(&pool.shared);
            let handle = thread::Builder::new()
                .name(format!("csvbind-worker-{id}"))
                .spawn(move || worker::run(id, shared, opts))
                .map_err(|e| CsvError::io(None, e))?;
            pool.handles.push(handle);
        }

        debug!(
            workers,
            queue_capacity = pool.shared.queue.capacity(),
            buffers = pool.shared.buffers.total(),
            "worker pool started"
        );
        Ok(pool)
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Decode lines into `dest[offset..]`.
    ///
    /// `next_line` fills a pooled buffer with the next non-empty line and
    /// returns its true length and 1-based line number, or `None` at the end
    /// of the source. The first error, from either the producer or a worker,
    /// is returned after the batch has drained.
    pub fn fill<F>(&mut self, dest: &mut [T], offset: usize, mut next_line: F) -> Result<Filled>
    where
        F: FnMut(&mut [u8]) -> Result<Option<(usize, usize)>>,
    {
        let shared = Arc::clone(&self.shared);
        shared.dest.store(dest.as_mut_ptr(), Ordering::Release);

        let mut index = offset;
        let mut more_data = true;
        let mut produced: Result<()> = Ok(());

        while index < dest.len() {
            if shared.failed.load(Ordering::Acquire) {
                break;
            }
            let mut buf = shared.buffers.take();
            match next_line(&mut buf) {
                Ok(Some((len, line_no))) => {
                    self.issued += 1;
                    shared.queue.push(WorkItem {
                        buf,
                        len,
                        line_no,
                        dest_index: index,
                    });
                    index += 1;
                }
                Ok(None) => {
                    shared.buffers.give(buf);
                    more_data = false;
                    break;
                }
                Err(e) => {
                    shared.buffers.give(buf);
                    produced = Err(e);
                    break;
                }
            }
        }

        self.drain();
        shared.dest.store(std::ptr::null_mut(), Ordering::Release);
        debug!(rows = index - offset, more_data, "batch drained");

        let worker_error = shared.take_error();
        produced?;
        if let Some(e) = worker_error {
            return Err(e);
        }
        Ok(Filled {
            rows: index - offset,
            more_data,
        })
    }

    /// Wait until workers have completed every issued item.
    fn drain(&self) {
        let mut spinner = SpinWait::new();
        while self.shared.completed.load(Ordering::Acquire) < self.issued {
            spinner.spin_once();
        }
    }

    /// Stop and join every worker. Idempotent.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.drain();
        self.shared.stop.store(true, Ordering::Release);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        debug!("worker pool stopped");
    }
}

impl<T: CsvRecord> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: CsvRecord> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.handles.len())
            .field("issued", &self.issued)
            .field("completed", &self.shared.completed.load(Ordering::Relaxed))
            .finish()
    }
}
