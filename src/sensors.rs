//! Sensor and health collaborators
//!
//! Feeds push [`SensorEvent`]s into an [`EventSink`]. Producers may run on any
//! thread; the owner of the tracking session drains the matching
//! [`EventStream`] on its own loop before touching session state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{SensorError, WorkoutError};
use crate::models::{DeviceMotion, PedometerData, WorkoutActivityType, WorkoutConfiguration};

/// Update interval of the device-motion feed (10 Hz)
pub const MOTION_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Push-based reading delivered by a feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    Pedometer(PedometerData),
    Motion(DeviceMotion),
}

pub type EventSink = mpsc::UnboundedSender<SensorEvent>;
pub type EventStream = mpsc::UnboundedReceiver<SensorEvent>;

/// Create the channel connecting feeds to the session loop
pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::unbounded_channel()
}

/// Step counting feed
pub trait Pedometer: Send {
    fn is_step_counting_available(&self) -> bool;

    /// Begin cumulative updates counted from `from`
    fn start_updates(&mut self, from: DateTime<Utc>, sink: EventSink) -> Result<(), SensorError>;

    fn stop_updates(&mut self);
}

/// Continuous device-motion feed
pub trait MotionSensor: Send {
    fn is_device_motion_available(&self) -> bool;

    fn start_updates(&mut self, interval: Duration, sink: EventSink) -> Result<(), SensorError>;

    fn stop_updates(&mut self);
}

/// Record produced when a workout finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub activity_type: WorkoutActivityType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkoutRecord {
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Workout session lifecycle
///
/// `begin` creates the session and starts collection. Stopping is `end`,
/// then `end_collection`, then `finish`, which yields the saved record, if any.
#[async_trait]
pub trait WorkoutService: Send {
    fn begin(&mut self, config: WorkoutConfiguration, start: DateTime<Utc>) -> Result<(), WorkoutError>;

    /// End the live session. No-op when none is running.
    fn end(&mut self, end: DateTime<Utc>);

    async fn end_collection(&mut self, end: DateTime<Utc>) -> Result<(), WorkoutError>;

    async fn finish(&mut self) -> Result<Option<WorkoutRecord>, WorkoutError>;
}

/// Health data categories requested at launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthDataType {
    StepCount,
    DistanceWalkingRunning,
    ActiveEnergyBurned,
    HeartRate,
    HeartRateVariability,
    RespiratoryRate,
    SleepAnalysis,
    Workout,
}

/// Types the tracker reads from the health store
pub const HEALTH_READ_TYPES: [HealthDataType; 8] = [
    HealthDataType::StepCount,
    HealthDataType::DistanceWalkingRunning,
    HealthDataType::ActiveEnergyBurned,
    HealthDataType::HeartRate,
    HealthDataType::HeartRateVariability,
    HealthDataType::RespiratoryRate,
    HealthDataType::SleepAnalysis,
    HealthDataType::Workout,
];

/// Types the tracker writes to the health store
pub const HEALTH_SHARE_TYPES: [HealthDataType; 6] = [
    HealthDataType::StepCount,
    HealthDataType::DistanceWalkingRunning,
    HealthDataType::ActiveEnergyBurned,
    HealthDataType::HeartRate,
    HealthDataType::SleepAnalysis,
    HealthDataType::Workout,
];

/// Health data permission gate
pub trait HealthStore: Send {
    fn is_health_data_available(&self) -> bool;

    fn request_authorization(
        &mut self,
        share: &[HealthDataType],
        read: &[HealthDataType],
    ) -> Result<bool, SensorError>;
}

/// All collaborators a tracking session drives
pub struct SensorHub {
    pub pedometer: Box<dyn Pedometer>,
    pub motion: Box<dyn MotionSensor>,
    pub workouts: Box<dyn WorkoutService>,
    pub health: Box<dyn HealthStore>,
}

impl SensorHub {
    pub fn new(
        pedometer: Box<dyn Pedometer>,
        motion: Box<dyn MotionSensor>,
        workouts: Box<dyn WorkoutService>,
        health: Box<dyn HealthStore>,
    ) -> Self {
        Self {
            pedometer,
            motion,
            workouts,
            health,
        }
    }
}
