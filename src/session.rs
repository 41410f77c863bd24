//! Activity tracking session
//!
//! [`TrackingSession`] is the state machine behind the tracking screen. It is
//! idle until [`TrackingSession::start`], active until [`TrackingSession::stop`],
//! and tracks at most one activity at a time. The session is single-owner:
//! sensor events, timer ticks and observer notifications all run on the
//! caller's loop, so no locking guards the metric mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{minutes_between, Clock, SystemClock};
use crate::error::{SensorError, VitalRsError, WorkoutError};
use crate::models::{ActivityType, MetricType, MetricValues};
use crate::observer::{MetricsObserver, ObserverRegistry, SubscriptionId};
use crate::random::{RandomSource, SeededRandom};
use crate::routines::{self, RoutinePlan, Teardown};
use crate::sensors::{
    EventSink, SensorEvent, SensorHub, WorkoutRecord, HEALTH_READ_TYPES, HEALTH_SHARE_TYPES,
    MOTION_UPDATE_INTERVAL,
};

/// Observable part of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    /// Activity of the running or most recent session
    pub current_activity: Option<ActivityType>,

    /// True strictly between a successful start and the completion of stop
    pub is_tracking: bool,

    /// Latest value per metric
    pub metrics: MetricValues,

    /// When the running or most recent session started
    pub started_at: Option<DateTime<Utc>>,
}

impl TrackingState {
    pub fn metric(&self, metric: MetricType) -> f64 {
        self.metrics.get(metric)
    }
}

/// What a finished session measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub activity: ActivityType,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub metrics: MetricValues,
}

impl ActivitySummary {
    pub fn elapsed_minutes(&self) -> f64 {
        minutes_between(self.started_at, self.ended_at)
    }

    /// Duration metric when a routine reported one, wall time otherwise
    pub fn duration_minutes(&self) -> f64 {
        self.metrics
            .value(MetricType::Duration)
            .unwrap_or_else(|| self.elapsed_minutes())
    }
}

/// Result of [`TrackingSession::stop`]
#[derive(Debug)]
pub struct StopOutcome {
    pub success: bool,
    pub error: Option<VitalRsError>,

    /// Present whenever a running session was stopped
    pub summary: Option<ActivitySummary>,

    /// Record saved by the workout service, for workout-backed activities
    pub workout: Option<WorkoutRecord>,
}

impl StopOutcome {
    fn not_tracking() -> Self {
        Self {
            success: false,
            error: None,
            summary: None,
            workout: None,
        }
    }

    /// The `(success, error)` pair reported to the presentation layer
    pub fn into_parts(self) -> (bool, Option<VitalRsError>) {
        (self.success, self.error)
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveRoutine {
    plan: &'static RoutinePlan,
    workout_running: bool,
}

pub struct TrackingSession {
    state: TrackingState,
    hub: SensorHub,
    sink: EventSink,
    clock: Box<dyn Clock>,
    random: Box<dyn RandomSource>,
    observers: ObserverRegistry,
    active: Option<ActiveRoutine>,
    motion_interval: Duration,
}

impl TrackingSession {
    /// Create an idle session. Feeds started by the session deliver into `sink`.
    pub fn new(hub: SensorHub, sink: EventSink) -> Self {
        Self {
            state: TrackingState::default(),
            hub,
            sink,
            clock: Box::new(SystemClock),
            random: Box::new(SeededRandom::from_entropy()),
            observers: ObserverRegistry::new(),
            active: None,
            motion_interval: MOTION_UPDATE_INTERVAL,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_motion_interval(mut self, interval: Duration) -> Self {
        self.motion_interval = interval;
        self
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_tracking
    }

    pub fn current_activity(&self) -> Option<ActivityType> {
        self.state.current_activity
    }

    pub fn metric_values(&self) -> &MetricValues {
        &self.state.metrics
    }

    /// Last written value, or zero
    pub fn metric(&self, metric: MetricType) -> f64 {
        self.state.metrics.get(metric)
    }

    /// Overwrite a metric and notify observers
    pub fn set_metric(&mut self, metric: MetricType, value: f64) {
        self.state.metrics.set(metric, value);
        self.notify();
    }

    pub fn subscribe(&mut self, observer: impl MetricsObserver + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Period of the running routine's timer, if it has one
    pub fn timer_period(&self) -> Option<Duration> {
        if !self.state.is_tracking {
            return None;
        }
        self.active
            .and_then(|active| active.plan.timer)
            .map(|timer| timer.period())
    }

    /// Ask for health data access. `Ok(false)` when health data is
    /// unavailable on this device or the user declined.
    pub fn request_health_authorization(&mut self) -> Result<bool, SensorError> {
        if !self.hub.health.is_health_data_available() {
            debug!("Health data unavailable on this device");
            return Ok(false);
        }
        self.hub
            .health
            .request_authorization(&HEALTH_SHARE_TYPES, &HEALTH_READ_TYPES)
    }

    /// Begin tracking `activity`. Returns false, changing nothing, when a
    /// session is already running.
    pub fn start(&mut self, activity: ActivityType) -> bool {
        if self.state.is_tracking {
            debug!(
                requested = %activity,
                current = ?self.state.current_activity,
                "Start ignored, already tracking"
            );
            return false;
        }

        let now = self.clock.now();
        self.state.current_activity = Some(activity);
        self.state.started_at = Some(now);
        self.state.is_tracking = true;
        self.state.metrics.clear();

        let plan = RoutinePlan::for_activity(activity);
        let mut workout_running = false;

        if plan.workout {
            match self.hub.workouts.begin(activity.workout_configuration(), now) {
                Ok(()) => workout_running = true,
                Err(err) => warn!(activity = %activity, error = %err, "Workout session not started"),
            }
        }

        if plan.pedometer {
            self.start_pedometer(now);
        }

        if plan.motion.is_some() {
            self.start_motion();
        }

        self.active = Some(ActiveRoutine {
            plan,
            workout_running,
        });

        info!(
            activity = %activity,
            workout = workout_running,
            timer_secs = ?plan.timer.map(|t| t.period().as_secs()),
            "Tracking started"
        );

        self.notify();
        true
    }

    fn start_pedometer(&mut self, from: DateTime<Utc>) {
        if !self.hub.pedometer.is_step_counting_available() {
            debug!("Step counting unavailable, step metrics disabled");
            return;
        }
        if let Err(err) = self.hub.pedometer.start_updates(from, self.sink.clone()) {
            debug!(error = %err, "Pedometer updates disabled");
        }
    }

    fn start_motion(&mut self) {
        if !self.hub.motion.is_device_motion_available() {
            debug!("Device motion unavailable, motion metrics disabled");
            return;
        }
        if let Err(err) = self
            .hub
            .motion
            .start_updates(self.motion_interval, self.sink.clone())
        {
            debug!(error = %err, "Motion updates disabled");
        }
    }

    fn elapsed_minutes(&self) -> Option<f64> {
        self.state
            .started_at
            .map(|started| minutes_between(started, self.clock.now()))
    }

    fn running_plan(&self) -> Option<&'static RoutinePlan> {
        if !self.state.is_tracking {
            return None;
        }
        self.active.map(|active| active.plan)
    }

    /// Feed callback entry point. Ignored once the session has stopped.
    pub fn handle_event(&mut self, event: SensorEvent) {
        let Some(plan) = self.running_plan() else {
            return;
        };
        let elapsed = self.elapsed_minutes();

        match event {
            SensorEvent::Pedometer(data) => {
                if !plan.pedometer {
                    return;
                }
                routines::apply_pedometer(&mut self.state.metrics, &data, elapsed);
            }
            SensorEvent::Motion(motion) => {
                let Some(routine) = plan.motion else {
                    return;
                };
                routines::apply_motion(routine, &mut self.state.metrics, &motion, elapsed);
            }
        }

        self.notify();
    }

    /// Periodic timer entry point. Ignored once the session has stopped.
    pub fn on_timer_tick(&mut self) {
        let Some(timer) = self.running_plan().and_then(|plan| plan.timer) else {
            return;
        };
        let elapsed = self.elapsed_minutes();

        if routines::apply_timer(timer, &mut self.state.metrics, elapsed, self.random.as_mut()) {
            debug!(routine = ?timer, elapsed_min = ?elapsed, "Timer tick");
            self.notify();
        }
    }

    /// Stop tracking, halt every producer and run the activity's teardown
    ///
    /// When idle this reports `(false, None)` and changes nothing.
    pub async fn stop(&mut self) -> StopOutcome {
        if !self.state.is_tracking {
            debug!("Stop ignored, not tracking");
            return StopOutcome::not_tracking();
        }

        self.state.is_tracking = false;
        let ended_at = self.clock.now();

        self.hub.pedometer.stop_updates();
        self.hub.motion.stop_updates();

        let active = self.active.take();
        let summary = match (self.state.current_activity, self.state.started_at) {
            (Some(activity), Some(started_at)) => Some(ActivitySummary {
                activity,
                started_at,
                ended_at,
                metrics: self.state.metrics.clone(),
            }),
            _ => None,
        };

        self.notify();

        let teardown = active.map_or(Teardown::Immediate, |a| a.plan.teardown);
        let workout_running = active.is_some_and(|a| a.workout_running);

        let (success, error, workout) = match teardown {
            Teardown::Immediate => (true, None, None),
            Teardown::FinishWorkout if !workout_running => {
                (false, Some(VitalRsError::from(WorkoutError::NotRunning)), None)
            }
            Teardown::FinishWorkout => self.finish_workout(ended_at).await,
        };

        match &error {
            Some(err) => warn!(
                activity = ?self.state.current_activity,
                error = %err,
                "Tracking stopped with errors"
            ),
            None => info!(
                activity = ?self.state.current_activity,
                success,
                "Tracking stopped"
            ),
        }

        StopOutcome {
            success,
            error,
            summary,
            workout,
        }
    }

    async fn finish_workout(
        &mut self,
        ended_at: DateTime<Utc>,
    ) -> (bool, Option<VitalRsError>, Option<WorkoutRecord>) {
        self.hub.workouts.end(ended_at);
        if let Err(err) = self.hub.workouts.end_collection(ended_at).await {
            return (false, Some(err.into()), None);
        }

        match self.hub.workouts.finish().await {
            Ok(Some(record)) => (true, None, Some(record)),
            Ok(None) => (false, None, None),
            Err(err) => (false, Some(err.into()), None),
        }
    }

    fn notify(&mut self) {
        self.observers.notify(&self.state);
    }
}
