//! ZIP archive written straight into a bounded channel of body chunks.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zip::write::{SimpleFileOptions, StreamWriter};
use zip::{CompressionMethod, ZipWriter};

use super::config::{ArchiveConfig, COMPRESSION_LEVEL};
use super::error::ArchiveError;

/// One piece of the archive byte stream, or the error that ended it.
pub type ArchiveChunk = Result<Bytes, io::Error>;

type StreamingZip = ZipWriter<StreamWriter<ChannelWriter>>;

/// `io::Write` adapter that cuts its input into chunks and sends them on a
/// channel. Sending blocks, so writes must happen on blocking threads. Once
/// `closed` is set the writer is a sink: input is accepted and discarded.
struct ChannelWriter {
    tx: mpsc::Sender<ArchiveChunk>,
    buf: Vec<u8>,
    chunk_size: usize,
    closed: Arc<AtomicBool>,
}

impl ChannelWriter {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.is_closed() {
            self.buf.clear();
            return Ok(());
        }
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buf,
            Vec::with_capacity(self.chunk_size),
        ));
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive receiver dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Ok(data.len());
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= self.chunk_size {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

/// A ZIP archive whose bytes are streamed out as they are produced.
///
/// Entries are compressed on a blocking thread. When any write fails, an
/// error chunk is pushed to the receiver so that whoever is forwarding the
/// stream can abort it, and the archive refuses further work.
pub struct ZipStream {
    writer: Option<StreamingZip>,
    closed: Arc<AtomicBool>,
    errors: mpsc::Sender<ArchiveChunk>,
    options: SimpleFileOptions,
    names: HashMap<String, usize>,
    entries: usize,
}

impl ZipStream {
    /// Creates an archive and the receiving end of its byte stream.
    pub fn channel(config: &ArchiveConfig) -> (Self, mpsc::Receiver<ArchiveChunk>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let chunk_size = config.chunk_size_bytes.max(1);
        let closed = Arc::new(AtomicBool::new(false));

        let writer = ZipWriter::new_stream(ChannelWriter {
            tx: tx.clone(),
            buf: Vec::with_capacity(chunk_size),
            chunk_size,
            closed: Arc::clone(&closed),
        });

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));

        let stream = Self {
            writer: Some(writer),
            closed,
            errors: tx,
            options,
            names: HashMap::new(),
            entries: 0,
        };
        (stream, rx)
    }

    /// Number of entries appended so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Appends a file and returns the entry name actually used.
    ///
    /// A name already present in the archive gets a `-2`, `-3`, ... suffix
    /// before its extension.
    pub async fn append(&mut self, name: &str, data: Bytes) -> Result<String, ArchiveError> {
        let entry_name = self.unique_name(name);
        let mut writer = self.writer.take().ok_or(ArchiveError::Closed)?;
        let options = self.options;
        let task_name = entry_name.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let result = writer
                .start_file(task_name, options)
                .map_err(ArchiveError::from)
                .and_then(|_| writer.write_all(&data).map_err(ArchiveError::from));
            (writer, result)
        })
        .await;

        match joined {
            Ok((writer, Ok(()))) => {
                self.writer = Some(writer);
                self.entries += 1;
                debug!(entry = %entry_name, "Appended archive entry");
                Ok(entry_name)
            }
            Ok((writer, Err(e))) => {
                self.close_writer(Some(writer));
                self.signal_failure(&e).await;
                Err(e)
            }
            Err(e) => {
                let err = ArchiveError::TaskFailed(e.to_string());
                self.signal_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Writes the central directory and closes the stream.
    ///
    /// Returns the number of entries in the finished archive.
    pub async fn finish(mut self) -> Result<usize, ArchiveError> {
        let writer = self.writer.take().ok_or(ArchiveError::Closed)?;

        let joined = tokio::task::spawn_blocking(move || -> Result<(), ArchiveError> {
            let mut inner = writer.finish()?;
            inner.flush()?;
            Ok(())
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(ArchiveError::TaskFailed(e.to_string())),
        };

        match result {
            Ok(()) => Ok(self.entries),
            Err(e) => {
                self.signal_failure(&e).await;
                Err(e)
            }
        }
    }

    fn unique_name(&mut self, name: &str) -> String {
        let seen = self.names.entry(name.to_string()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            return name.to_string();
        }

        let mut n = *seen;
        loop {
            let candidate = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
                _ => format!("{}-{}", name, n),
            };
            if !self.names.contains_key(&candidate) {
                self.names.insert(candidate.clone(), 1);
                return candidate;
            }
            n += 1;
        }
    }

    /// Turns the channel writer into a sink before dropping the ZIP writer.
    /// Its `Drop` writes a central directory, which then goes nowhere
    /// instead of failing.
    fn close_writer(&mut self, writer: Option<StreamingZip>) {
        self.closed.store(true, Ordering::Release);
        drop(writer);
    }

    async fn signal_failure(&mut self, err: &ArchiveError) {
        warn!(error = %err, "Archive stream failed");
        let writer = self.writer.take();
        self.close_writer(writer);
        // The receiver may already be gone, which is what failed in the first place.
        let _ = self
            .errors
            .send(Err(io::Error::other(err.to_string())))
            .await;
    }
}

impl Drop for ZipStream {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            warn!(entries = self.entries, "Archive dropped before it was finished");
            self.close_writer(Some(writer));
            let _ = self.errors.try_send(Err(io::Error::other("archive abandoned")));
        }
    }
}
