//! A [`Sink`] writing one JSON object per line to an append-only file.
//!
//! Records are rendered on the calling thread and handed over a
//! [crossbeam-channel](https://docs.rs/crossbeam-channel/0.5.1/crossbeam_channel/) to a writer
//! thread which owns the file. The writer keeps lines in a buffer and writes the buffer to the
//! file when the next line would not fit, or on [`Sink::flush`]. When a rotate size is set and
//! the current file would grow past it, the file is renamed with a timestamp and compressed with
//! [flate2](https://docs.rs/flate2/latest/flate2/) on a helper thread.

use std::{
    fs::{create_dir_all, read_dir, remove_file, rename, File, OpenOptions},
    io::{self, stdout, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::Utc;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use flate2::{write::GzEncoder, Compression};
use permissions::{is_readable, is_writable};
use regex::Regex;

use crate::{
    error::{Error, Result},
    record::LogRecord,
    sink::Sink,
};

/// Name of the thread owning the log file.
pub const WRITER_THREAD: &str = "synthlog-writer";

enum Message {
    Line(String),
    Flush(Sender<()>),
    Rotate,
    Close(Sender<()>),
}

/// Settings for [`FileSink::open`].
#[derive(Debug, Clone)]
pub struct FileSinkOptions {
    /// Relative or absolute path of the log file.
    pub path: PathBuf,
    /// Lines are written to the file once the buffer would exceed this many bytes.
    pub buffer_size: usize,
    /// Rotate the file before it grows past this many bytes. `None` keeps a single file.
    pub rotate_size: Option<usize>,
    /// Max number of compressed rotated files kept next to the log file.
    pub retain: usize,
    /// Also write every line to standard output.
    pub stdout: bool,
    /// How long `flush` and `close` wait for the writer thread.
    pub ack_timeout: Duration,
}

impl FileSinkOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSinkOptions {
            path: path.into(),
            buffer_size: 8 * 1024,
            rotate_size: None,
            retain: 10,
            stdout: false,
            ack_timeout: Duration::from_secs(5),
        }
    }
}

/// The file sink handle. Dropping it closes the file.
pub struct FileSink {
    path: PathBuf,
    sender: Sender<Message>,
    ack_timeout: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Writer {
    path: PathBuf,
    dir: PathBuf,
    stem: String,
    ext: Option<String>,
    file: File,
    /// bytes of the current file, buffered ones included
    file_size: usize,
    buffer: Vec<u8>,
    buffer_size: usize,
    rotate_size: Option<usize>,
    retain: usize,
    archives: Vec<PathBuf>,
    compression: Option<JoinHandle<()>>,
    stdout: bool,
}

impl FileSink {
    /// Open the log file and start the writer thread.
    ///
    /// The parent directory is created when missing and must be readable and writable.
    ///
    /// # Example
    /// ```rust,no_run
    /// use synthlog::{FileSink, FileSinkOptions, Sink};
    ///
    /// let sink = FileSink::open(FileSinkOptions::new("logs/combined.log")).unwrap();
    /// sink.flush();
    /// sink.close();
    /// ```
    pub fn open(options: FileSinkOptions) -> Result<FileSink> {
        let path = options.path;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        if !is_readable(&dir).map_err(|e| Error::io(&dir, e))? {
            return Err(Error::NotReadable(dir));
        }
        if !is_writable(&dir).map_err(|e| Error::io(&dir, e))? {
            return Err(Error::NotWritable(dir));
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("combined")
            .to_string();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_string);

        let file = open_append(&path).map_err(|e| Error::io(&path, e))?;
        let file_size = file.metadata().map_err(|e| Error::io(&path, e))?.len() as usize;
        let archives = find_archives(&dir, &stem, ext.as_deref())?;

        let writer = Writer {
            path: path.clone(),
            dir,
            stem,
            ext,
            file,
            file_size,
            buffer: Vec::with_capacity(options.buffer_size),
            buffer_size: options.buffer_size,
            rotate_size: options.rotate_size,
            retain: options.retain.max(1),
            archives,
            compression: None,
            stdout: options.stdout,
        };
        let (sender, receiver) = unbounded();
        let worker = thread::Builder::new()
            .name(WRITER_THREAD.into())
            .spawn(move || writer.run(receiver))
            .map_err(|e| Error::io(&path, e))?;

        Ok(FileSink {
            path,
            sender,
            ack_timeout: options.ack_timeout,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manually rotate the current log file.
    pub fn rotate(&self) {
        let _ = self.sender.send(Message::Rotate);
    }

    /// Sends a message carrying an ack channel and waits for the writer to answer.
    /// Returns false when the writer is gone or did not answer in time.
    fn request(&self, message: impl FnOnce(Sender<()>) -> Message) -> bool {
        let (ack, done) = bounded(1);
        if self.sender.send(message(ack)).is_err() {
            return false;
        }
        match done.recv_timeout(self.ack_timeout) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("writer for {} did not answer: {}", self.path.display(), err);
                false
            }
        }
    }
}

impl Sink for FileSink {
    fn write(&self, record: &LogRecord) {
        match record.to_json_line(Utc::now()) {
            Ok(line) => {
                // the writer is gone once closed; late records are dropped
                let _ = self.sender.send(Message::Line(line));
            }
            Err(err) => log::error!("failed to render record: {}", err),
        }
    }

    fn flush(&self) {
        self.request(Message::Flush);
    }

    fn close(&self) {
        if !self.request(Message::Close) {
            return;
        }
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(worker) = worker {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl Writer {
    fn run(mut self, receiver: Receiver<Message>) {
        while let Ok(message) = receiver.recv() {
            match message {
                Message::Line(line) => self.push(line),
                Message::Flush(ack) => {
                    self.write_buffer();
                    let _ = ack.send(());
                }
                Message::Rotate => self.rotate(),
                Message::Close(ack) => {
                    self.finish();
                    let _ = ack.send(());
                    return;
                }
            }
        }
        self.finish();
    }

    fn push(&mut self, line: String) {
        let len = line.len();
        if let Some(limit) = self.rotate_size {
            if self.file_size > 0 && self.file_size + len > limit {
                self.rotate();
            }
        }
        self.file_size += len;
        if self.buffer.len() + len > self.buffer_size {
            self.write_buffer();
        }
        self.buffer.extend_from_slice(line.as_bytes());
        if self.buffer.len() >= self.buffer_size {
            self.write_buffer();
        }
    }

    fn write_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(err) = self.file.write_all(&self.buffer) {
            log::error!("failed to write {}: {}", self.path.display(), err);
        }
        if self.stdout {
            let _ = stdout().write_all(&self.buffer);
        }
        self.buffer.clear();
    }

    fn rotate(&mut self) {
        self.write_buffer();
        self.wait_compression();

        let rotated = self.rotated_path();
        if let Err(err) = self.file.sync_all() {
            log::warn!("failed to sync {}: {}", self.path.display(), err);
        }
        if let Err(err) = rename(&self.path, &rotated) {
            log::error!("failed to rotate {}: {}", self.path.display(), err);
            return;
        }
        match open_append(&self.path) {
            Ok(file) => self.file = file,
            Err(err) => {
                log::error!("failed to reopen {}: {}", self.path.display(), err);
                return;
            }
        }
        self.file_size = 0;

        let archive = gz_path(&rotated);
        self.archives.push(archive.clone());
        while self.archives.len() > self.retain {
            let _ = remove_file(self.archives.remove(0));
        }
        self.compression = Some(thread::spawn(move || {
            if let Err(err) = compress(&rotated, &archive) {
                log::error!("failed to compress {}: {}", rotated.display(), err);
            }
        }));
    }

    /// `<stem>.<yyMMdd.HHmmss.SSS>.<ext>`, unique among existing rotated files.
    fn rotated_path(&self) -> PathBuf {
        loop {
            let now = chrono::Local::now().naive_local();
            let name = match &self.ext {
                Some(ext) => format!("{}.{}.{}", self.stem, now.format("%y%m%d.%H%M%S%.3f"), ext),
                None => format!("{}.{}", self.stem, now.format("%y%m%d.%H%M%S%.3f")),
            };
            let rotated = self.dir.join(name);
            if !rotated.exists() && !gz_path(&rotated).exists() {
                return rotated;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_compression(&mut self) {
        if let Some(handle) = self.compression.take() {
            let _ = handle.join();
        }
    }

    fn finish(&mut self) {
        self.write_buffer();
        if let Err(err) = self.file.sync_all() {
            log::warn!("failed to sync {}: {}", self.path.display(), err);
        }
        self.wait_compression();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn gz_path(rotated: &Path) -> PathBuf {
    let mut name = rotated.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn compress(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let mut zip = GzEncoder::new(File::create(dst)?, Compression::default());
    io::copy(&mut input, &mut zip)?;
    zip.finish()?.sync_all()?;
    remove_file(src)
}

/// Lists archives left by earlier runs, oldest first.
fn find_archives(dir: &Path, stem: &str, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match ext {
        Some(ext) => format!(
            r"^{}\.\d{{6}}\.\d{{6}}\.\d{{3}}\.{}\.gz$",
            regex::escape(stem),
            regex::escape(ext)
        ),
        None => format!(r"^{}\.\d{{6}}\.\d{{6}}\.\d{{3}}\.gz$", regex::escape(stem)),
    };
    let re = Regex::new(&pattern)?;
    let mut archives: Vec<PathBuf> = read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| re.is_match(n))
        })
        .collect();
    archives.sort();
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Read};

    use flate2::read::GzDecoder;
    use serde_json::Value;

    use super::*;
    use crate::level::Level;

    fn lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn writes_stamped_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/combined.log");
        let sink = FileSink::open(FileSinkOptions::new(&path)).unwrap();
        let first = LogRecord::new(Level::Info, "Configuration loaded").with_iteration(0);
        sink.write(&first);
        sink.write(&LogRecord::new(Level::Warn, "Disk space low").with_iteration(1));
        sink.flush();

        let text = fs::read_to_string(&path).unwrap();
        let read_back: LogRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(read_back, first);

        let written = lines(&path);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["level"], "info");
        assert_eq!(written[1]["message"], "Disk space low");
        let ts = written[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
        assert!(ts.ends_with('Z'));
        sink.close();
    }

    #[test]
    fn close_is_idempotent_and_drops_late_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.log");
        let sink = FileSink::open(FileSinkOptions::new(&path)).unwrap();
        sink.write(&LogRecord::new(Level::Info, "a"));
        sink.close();
        sink.close();
        sink.write(&LogRecord::new(Level::Info, "b"));
        sink.flush();
        assert_eq!(lines(&path).len(), 1);
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.log");
        for _ in 0..2 {
            let sink = FileSink::open(FileSinkOptions::new(&path)).unwrap();
            sink.write(&LogRecord::new(Level::Info, "again"));
            sink.close();
        }
        assert_eq!(lines(&path).len(), 2);
    }

    #[test]
    fn small_buffer_keeps_lines_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.log");
        let mut options = FileSinkOptions::new(&path);
        options.buffer_size = 16;
        let sink = FileSink::open(options).unwrap();
        for i in 0..20 {
            sink.write(&LogRecord::new(Level::Info, "Payment processed").with_iteration(i));
        }
        sink.close();
        let written = lines(&path);
        assert_eq!(written.len(), 20);
        assert_eq!(written[19]["iteration"], 19);
    }

    #[test]
    fn rotates_and_retains_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.log");
        let mut options = FileSinkOptions::new(&path);
        options.buffer_size = 0;
        options.rotate_size = Some(150);
        options.retain = 2;
        let sink = FileSink::open(options).unwrap();
        for i in 0..5 {
            sink.write(&LogRecord::new(Level::Info, "Background job completed").with_iteration(i));
        }
        sink.close();

        let current = lines(&path);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0]["iteration"], 4);

        let archives = find_archives(dir.path(), "combined", Some("log")).unwrap();
        assert_eq!(archives.len(), 2);
        let mut text = String::new();
        GzDecoder::new(File::open(&archives[1]).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        let archived: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(archived["iteration"], 3);
    }

    #[test]
    fn manual_rotate_starts_a_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.log");
        let sink = FileSink::open(FileSinkOptions::new(&path)).unwrap();
        sink.write(&LogRecord::new(Level::Info, "User signed in").with_iteration(0));
        sink.rotate();
        sink.write(&LogRecord::new(Level::Warn, "Payment processed").with_iteration(1));
        sink.close();

        let current = lines(&path);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0]["iteration"], 1);

        let archives = find_archives(dir.path(), "combined", Some("log")).unwrap();
        assert_eq!(archives.len(), 1);
        let mut text = String::new();
        GzDecoder::new(File::open(&archives[0]).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        let archived: LogRecord = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(archived.message, "User signed in");
        assert_eq!(archived.iteration, Some(0));
    }
}
