// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for score hot-reload.
//!
//! Editors save files in several steps (truncate, write, rename), so the
//! watcher observes the parent directory, keeps only events for the score
//! file, and reloads once writes have been quiet for the debounce period.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::ScoreFile;

/// Events emitted by the score watcher
#[derive(Debug, Clone)]
pub enum ScoreFileEvent {
    /// Score file changed and parsed successfully
    Reloaded(Box<ScoreFile>),
    /// Score file changed but failed to load
    Error(String),
    /// Score file was deleted
    Removed(PathBuf),
}

/// Watches one score file with debouncing
pub struct ScoreWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<ScoreFileEvent>,
    watched_path: PathBuf,
}

impl ScoreWatcher {
    /// Watch the score file at `path`, reloading after `debounce_ms` of quiet
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: u64) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let file_name: OsString = watched_path
            .file_name()
            .ok_or_else(|| anyhow!("Not a file path: {:?}", watched_path))?
            .to_os_string();
        let directory = match watched_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let debounce_duration = Duration::from_millis(debounce_ms);

        let (event_tx, event_rx): (Sender<ScoreFileEvent>, Receiver<ScoreFileEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", directory, e))?;

        let load_path = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => {
                        let Some(path) = event
                            .paths
                            .iter()
                            .find(|p| p.file_name() == Some(file_name.as_os_str()))
                        else {
                            continue;
                        };
                        match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => {
                                last_event_time = Some(Instant::now());
                            }
                            EventKind::Remove(_) => {
                                last_event_time = None;
                                let _ = event_tx.send(ScoreFileEvent::Removed(path.clone()));
                            }
                            _ => {}
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let Some(last_time) = last_event_time else {
                            continue;
                        };
                        if last_time.elapsed() < debounce_duration {
                            continue;
                        }
                        last_event_time = None;

                        let event = match ScoreFile::load(&load_path) {
                            Ok(file) => ScoreFileEvent::Reloaded(Box::new(file)),
                            Err(e) => ScoreFileEvent::Error(format!("Failed to load {:?}: {:#}", load_path, e)),
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next event (non-blocking)
    pub fn try_recv(&self) -> Option<ScoreFileEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn recv_all(&self) -> Vec<ScoreFileEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until the next event is received
    pub fn recv(&self) -> Option<ScoreFileEvent> {
        self.event_receiver.recv().ok()
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}
