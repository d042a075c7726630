//! Scriptable test doubles for the device seam
//!
//! [`FakeBackend`] stands in for the platform audio subsystem in
//! integration tests, here and in downstream crates. Every load
//! produces a [`FakeSession`] the test keeps: it records the commands
//! the player issued and lets the test push status updates into the
//! stream the player watches.

use crate::device::{AudioBackend, AudioHandle, HandleStatus, LoadedHandle};
use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// A device command observed by a fake handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeCommand {
    Play,
    Pause,
    Seek(u64),
    Release,
}

/// One load recorded by the fake backend
#[derive(Debug, Clone)]
pub struct LoadRecord {
    pub url: String,
    pub autoplay: bool,
}

/// Test-side view of a single loaded handle
#[derive(Clone)]
pub struct FakeSession {
    commands: Arc<Mutex<Vec<FakeCommand>>>,
    current: Arc<Mutex<HandleStatus>>,
    statuses: Arc<Mutex<Option<mpsc::UnboundedSender<HandleStatus>>>>,
    fail_commands: Arc<AtomicBool>,
}

impl FakeSession {
    /// Push a status update into the stream and remember it as the
    /// on-demand status
    pub fn push_status(&self, status: HandleStatus) {
        *self.current.lock().unwrap() = status;
        if let Some(tx) = self.statuses.lock().unwrap().as_ref() {
            let _ = tx.send(status);
        }
    }

    /// Set the on-demand status without emitting a stream update
    pub fn set_status(&self, status: HandleStatus) {
        *self.current.lock().unwrap() = status;
    }

    /// Commands the player issued to this handle, in order
    pub fn commands(&self) -> Vec<FakeCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Whether the handle was released
    pub fn is_released(&self) -> bool {
        self.commands().contains(&FakeCommand::Release)
    }

    /// Make every further play/pause/seek on this handle fail
    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }
}

struct FakeHandle {
    session: FakeSession,
}

impl FakeHandle {
    fn command(&self, command: FakeCommand) -> Result<()> {
        self.session.commands.lock().unwrap().push(command);
        if self.session.fail_commands.load(Ordering::SeqCst) {
            return Err(PlaybackError::Device("scripted command failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioHandle for FakeHandle {
    async fn play(&mut self) -> Result<()> {
        self.command(FakeCommand::Play)
    }

    async fn pause(&mut self) -> Result<()> {
        self.command(FakeCommand::Pause)
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.command(FakeCommand::Seek(position_ms))
    }

    async fn status(&mut self) -> Result<HandleStatus> {
        Ok(*self.session.current.lock().unwrap())
    }

    async fn release(&mut self) -> Result<()> {
        self.session.commands.lock().unwrap().push(FakeCommand::Release);
        // Closing the sender ends the status stream and its watcher
        self.session.statuses.lock().unwrap().take();
        Ok(())
    }
}

/// In-memory audio backend for tests
#[derive(Default)]
pub struct FakeBackend {
    loads: Mutex<Vec<LoadRecord>>,
    sessions: Mutex<Vec<FakeSession>>,
    fail_next_load: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next load fail with a device error
    pub fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }

    /// Loads observed so far
    pub fn loads(&self) -> Vec<LoadRecord> {
        self.loads.lock().unwrap().clone()
    }

    /// Session created by the `index`th load
    pub fn session(&self, index: usize) -> Option<FakeSession> {
        self.sessions.lock().unwrap().get(index).cloned()
    }

    /// Session created by the most recent load
    pub fn last_session(&self) -> Option<FakeSession> {
        self.sessions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    async fn load(
        &self,
        url: &str,
        autoplay: bool,
        _status_interval: Duration,
    ) -> Result<LoadedHandle> {
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(PlaybackError::Device("scripted load failure".into()));
        }

        self.loads.lock().unwrap().push(LoadRecord {
            url: url.to_string(),
            autoplay,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let session = FakeSession {
            commands: Arc::new(Mutex::new(Vec::new())),
            current: Arc::new(Mutex::new(HandleStatus::default())),
            statuses: Arc::new(Mutex::new(Some(tx))),
            fail_commands: Arc::new(AtomicBool::new(false)),
        };
        self.sessions.lock().unwrap().push(session.clone());

        Ok(LoadedHandle {
            handle: Box::new(FakeHandle { session }),
            statuses: rx,
        })
    }
}
