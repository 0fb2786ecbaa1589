//! Append-only session log backed by a background writer thread.
//!
//! A [`LogSink`] is created once by the application and hands out cheap
//! [`LogHandle`]s to whoever needs to record messages. Logging only enqueues;
//! the dedicated worker does the file I/O. Each run writes to its own
//! `log_<start time>.txt` file.

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Callback receiving every formatted line, e.g. to mirror the log in a UI panel.
pub type Subscriber = Arc<dyn Fn(&str) + Send + Sync>;

enum Message {
    Line(String),
    Shutdown,
}

/// Producer side of the log queue.
#[derive(Clone)]
pub struct LogHandle {
    tx: Sender<Message>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl LogHandle {
    /// Timestamp `message`, queue it for the file and pass it to subscribers.
    pub fn log(&self, message: impl Display) {
        let line = format!(
            "{}: {}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            message
        );

        if self.tx.send(Message::Line(line.clone())).is_err() {
            tracing::debug!("Log sink already stopped, dropping: {}", line);
        }

        // Call outside the lock so a subscriber may log itself.
        let subscribers = self.subscribers.lock().clone();
        for subscriber in subscribers {
            subscriber(&line);
        }
    }
}

pub struct LogSink {
    file_path: PathBuf,
    handle: LogHandle,
    worker: Option<JoinHandle<()>>,
}

impl LogSink {
    /// Create `dir` if needed and start the writer thread.
    pub fn start(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;

        let file_path = dir.join(format!(
            "log_{}.txt",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        ));

        let (tx, rx) = mpsc::channel();
        let worker_path = file_path.clone();
        let worker = std::thread::Builder::new()
            .name("log-sink".into())
            .spawn(move || drain(rx, worker_path))
            .with_context(|| "Failed to spawn log writer thread")?;

        Ok(Self {
            file_path,
            handle: LogHandle {
                tx,
                subscribers: Arc::new(Mutex::new(Vec::new())),
            },
            worker: Some(worker),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    pub fn log(&self, message: impl Display) {
        self.handle.log(message);
    }

    pub fn subscribe(&self, subscriber: impl Fn(&str) + Send + Sync + 'static) {
        self.handle.subscribers.lock().push(Arc::new(subscriber));
    }

    /// Flush everything queued so far and stop the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.tx.send(Message::Shutdown);
            if worker.join().is_err() {
                tracing::error!("Log writer thread panicked");
            }
        }
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain(rx: Receiver<Message>, path: PathBuf) {
    let mut file: Option<File> = None;

    while let Ok(message) = rx.recv() {
        let line = match message {
            Message::Line(line) => line,
            Message::Shutdown => break,
        };

        if file.is_none() {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(f) => file = Some(f),
                Err(e) => {
                    tracing::error!("Failed to open log file {:?}: {}", path, e);
                    continue;
                }
            }
        }

        if let Some(f) = file.as_mut() {
            if let Err(e) = writeln!(f, "{}", line) {
                tracing::error!("Failed to write log line: {}", e);
                // reopen on the next message
                file = None;
            }
        }
    }
}
