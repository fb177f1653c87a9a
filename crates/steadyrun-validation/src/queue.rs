//! FIFO queue of captured responses awaiting validation.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use steadyrun_core::ReceivedMessage;

use crate::error::ValidationError;

/// Append/pop store of captured responses.
///
/// Single producer (the measurement path), single consumer (the
/// validation worker). Push must never block on the consumer; pop returns
/// `None` when the queue is empty. The queue is unbounded by design — the
/// producer must never stall waiting for validation.
pub trait ResponseQueue: Send + Sync {
    /// Append a captured response.
    fn push(&self, message: ReceivedMessage) -> Result<(), ValidationError>;

    /// Remove and return the oldest captured response, or `None` when
    /// the queue is empty.
    fn pop(&self) -> Result<Option<ReceivedMessage>, ValidationError>;

    /// Current queue depth. May be approximate under concurrent access.
    fn len(&self) -> usize;

    /// Whether the queue currently holds no responses.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory queue for tests and non-durable deployments.
pub struct InMemoryQueue {
    items: Mutex<VecDeque<ReceivedMessage>>,
}

impl InMemoryQueue {
    /// Create an empty in-memory queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseQueue for InMemoryQueue {
    fn push(&self, message: ReceivedMessage) -> Result<(), ValidationError> {
        self.items.lock().push_back(message);
        Ok(())
    }

    fn pop(&self) -> Result<Option<ReceivedMessage>, ValidationError> {
        Ok(self.items.lock().pop_front())
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }
}

struct FileQueueInner {
    writer: File,
    reader: BufReader<File>,
    pending: usize,
}

/// Durable queue backed by an append-only file of JSON lines.
///
/// Responses are appended to the file and consumed through an in-memory
/// read cursor, so the backlog survives the process while validation lags
/// behind. Consumed entries are not compacted away; reopening an existing
/// file replays every entry still in it. The on-disk representation is
/// internal and may change.
pub struct FileQueue {
    path: PathBuf,
    inner: Mutex<FileQueueInner>,
}

impl FileQueue {
    /// Open (or create) a file queue at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref().to_path_buf();
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(ValidationError::QueueInit)?;
        let read_file = File::open(&path).map_err(ValidationError::QueueInit)?;
        let mut reader = BufReader::new(read_file);
        reader
            .seek(SeekFrom::Start(0))
            .map_err(ValidationError::QueueInit)?;

        // Leftover lines from a previous binding are still pending.
        let pending = BufReader::new(File::open(&path).map_err(ValidationError::QueueInit)?)
            .lines()
            .count();
        if pending > 0 {
            debug!(path = %path.display(), pending, "Resuming file queue with a backlog");
        }

        Ok(Self {
            path,
            inner: Mutex::new(FileQueueInner {
                writer,
                reader,
                pending,
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseQueue for FileQueue {
    fn push(&self, message: ReceivedMessage) -> Result<(), ValidationError> {
        let mut line = serde_json::to_vec(&message)
            .map_err(|e| ValidationError::Queue(format!("serialize: {e}")))?;
        line.push(b'\n');

        let mut inner = self.inner.lock();
        inner
            .writer
            .write_all(&line)
            .map_err(|e| ValidationError::Queue(format!("append: {e}")))?;
        inner.pending += 1;
        Ok(())
    }

    fn pop(&self) -> Result<Option<ReceivedMessage>, ValidationError> {
        let mut inner = self.inner.lock();
        if inner.pending == 0 {
            return Ok(None);
        }

        let mut line = String::new();
        let read = inner
            .reader
            .read_line(&mut line)
            .map_err(|e| ValidationError::Queue(format!("read: {e}")))?;
        if read == 0 {
            return Ok(None);
        }

        let message = serde_json::from_str(line.trim_end())
            .map_err(|e| ValidationError::Queue(format!("deserialize: {e}")))?;
        inner.pending -= 1;
        Ok(Some(message))
    }

    fn len(&self) -> usize {
        self.inner.lock().pending
    }
}
