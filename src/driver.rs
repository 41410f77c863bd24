//! Event loop owning a [`TrackingSession`]
//!
//! The driver runs on a tokio task and is the only place the session is
//! touched. Commands arrive over an mpsc channel, sensor events over the
//! session's event stream, and the routine timer is a tokio `Interval` that is
//! rebuilt whenever tracking starts or stops. Events still queued when a
//! session ends or a new one starts are discarded. State snapshots are
//! published on a watch channel for any number of viewers.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{Result, SensorError, VitalRsError};
use crate::models::ActivityType;
use crate::sensors::EventStream;
use crate::session::{StopOutcome, TrackingSession, TrackingState};

const COMMAND_BUFFER: usize = 16;

enum Command {
    Start {
        activity: ActivityType,
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<StopOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<TrackingState>,
    },
    Authorize {
        reply: oneshot::Sender<std::result::Result<bool, SensorError>>,
    },
}

/// Cloneable front end to a running driver
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<TrackingState>,
}

impl TrackerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| VitalRsError::Internal("tracking driver has shut down".to_string()))?;
        response
            .await
            .map_err(|_| VitalRsError::Internal("tracking driver dropped the request".to_string()))
    }

    /// See [`TrackingSession::start`]
    pub async fn start(&self, activity: ActivityType) -> Result<bool> {
        self.request(|reply| Command::Start { activity, reply }).await
    }

    /// See [`TrackingSession::stop`]
    pub async fn stop(&self) -> Result<StopOutcome> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Current state, read on the driver's loop
    pub async fn snapshot(&self) -> Result<TrackingState> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn request_health_authorization(&self) -> Result<bool> {
        Ok(self.request(|reply| Command::Authorize { reply }).await??)
    }

    /// Receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.clone()
    }
}

pub struct SessionDriver {
    session: TrackingSession,
    events: EventStream,
    commands: mpsc::Receiver<Command>,
    timer: Option<Interval>,
}

impl SessionDriver {
    /// Wrap a session and the stream its feeds deliver into
    pub fn new(mut session: TrackingSession, events: EventStream) -> (Self, TrackerHandle) {
        let (state_tx, state_rx) = watch::channel(session.state().clone());
        session.subscribe(move |state: &TrackingState| {
            state_tx.send_replace(state.clone());
        });

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let driver = Self {
            session,
            events,
            commands: commands_rx,
            timer: None,
        };
        let handle = TrackerHandle {
            commands: commands_tx,
            state: state_rx,
        };
        (driver, handle)
    }

    /// Run on a new tokio task
    pub fn spawn(session: TrackingSession, events: EventStream) -> (TrackerHandle, JoinHandle<TrackingState>) {
        let (driver, handle) = Self::new(session, events);
        (handle, tokio::spawn(driver.run()))
    }

    /// Serve commands until every handle is dropped. A running session is
    /// stopped first; the final state is returned.
    pub async fn run(mut self) -> TrackingState {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = self.events.recv() => self.session.handle_event(event),
                _ = next_tick(&mut self.timer) => self.session.on_timer_tick(),
            }
        }

        if self.session.is_tracking() {
            info!("All handles dropped, stopping running session");
            let outcome = self.session.stop().await;
            debug!(success = outcome.success, "Session stopped on shutdown");
        }
        self.session.state().clone()
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { activity, reply } => {
                if !self.session.is_tracking() {
                    self.discard_stale_events();
                }
                let started = self.session.start(activity);
                if started {
                    self.refresh_timer();
                }
                let _ = reply.send(started);
            }
            Command::Stop { reply } => {
                let outcome = self.session.stop().await;
                self.refresh_timer();
                self.discard_stale_events();
                let _ = reply.send(outcome);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.state().clone());
            }
            Command::Authorize { reply } => {
                let _ = reply.send(self.session.request_health_authorization());
            }
        }
    }

    /// Readings queued before a session boundary belong to the old session
    fn discard_stale_events(&mut self) {
        let mut dropped = 0usize;
        while self.events.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded readings from a previous session");
        }
    }

    fn refresh_timer(&mut self) {
        self.timer = self.session.timer_period().map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        debug!(period = ?self.timer.as_ref().map(|t| t.period()), "Routine timer refreshed");
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
