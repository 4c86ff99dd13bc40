use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use crate::record::LogRecord;

/// Destination for generated records.
///
/// Calls never fail from the caller's point of view. A sink that cannot write
/// reports the problem itself.
pub trait Sink: Send + Sync {
    fn write(&self, record: &LogRecord);

    /// Pushes buffered records out. Returns once done or after a bounded wait.
    fn flush(&self);

    /// Flushes and releases the underlying resources. Calling it again is a no-op.
    fn close(&self);
}

/// Keeps every record in memory. Records written after `close` are dropped.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
    flushes: AtomicUsize,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        // a panicking test thread must not hide what was captured
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &LogRecord) {
        if !self.is_closed() {
            self.lock().push(record.clone());
        }
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl<S: Sink + ?Sized> Sink for std::sync::Arc<S> {
    fn write(&self, record: &LogRecord) {
        (**self).write(record)
    }

    fn flush(&self) {
        (**self).flush()
    }

    fn close(&self) {
        (**self).close()
    }
}
