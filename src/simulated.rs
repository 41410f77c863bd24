//! Simulated device collaborators
//!
//! Used by the CLI and by tests when no watch hardware is present. Feeds run as
//! tokio tasks and deliver through the session's event sink, the same path a
//! platform callback thread would take.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::SimulationSettings;
use crate::error::{SensorError, WorkoutError};
use crate::models::{DeviceMotion, PedometerData, Vector3, WorkoutConfiguration};
use crate::sensors::{
    EventSink, HealthDataType, HealthStore, MotionSensor, Pedometer, SensorEvent, SensorHub,
    WorkoutRecord, WorkoutService,
};

/// Cumulative step counter walking at a fixed cadence
pub struct SimulatedPedometer {
    available: bool,
    cadence_spm: f64,
    stride_m: f64,
    update_interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl SimulatedPedometer {
    pub fn new(available: bool, cadence_spm: f64, stride_m: f64) -> Self {
        Self {
            available,
            cadence_spm,
            stride_m,
            update_interval: Duration::from_secs(1),
            task: None,
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }
}

impl Pedometer for SimulatedPedometer {
    fn is_step_counting_available(&self) -> bool {
        self.available
    }

    fn start_updates(&mut self, _from: DateTime<Utc>, sink: EventSink) -> Result<(), SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable {
                feed: "pedometer".to_string(),
            });
        }
        let handle = Handle::try_current().map_err(|_| SensorError::NoRuntime {
            feed: "pedometer".to_string(),
        })?;

        self.stop_updates();

        let cadence = self.cadence_spm;
        let stride = self.stride_m;
        let period = self.update_interval;
        self.task = Some(handle.spawn(async move {
            let began = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval_at(began + period, period);
            loop {
                ticker.tick().await;
                let minutes = began.elapsed().as_secs_f64() / 60.0;
                let steps = (minutes * cadence).floor();
                let data = PedometerData {
                    number_of_steps: steps as u64,
                    distance: Some(steps * stride),
                };
                if sink.send(SensorEvent::Pedometer(data)).is_err() {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop_updates(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Simulated pedometer stopped");
        }
    }
}

/// Wrist motion with light noise and occasional jump spikes
pub struct SimulatedMotion {
    available: bool,
    jump_probability: f64,
    seed: Option<u64>,
    task: Option<JoinHandle<()>>,
}

impl SimulatedMotion {
    pub fn new(available: bool, jump_probability: f64, seed: Option<u64>) -> Self {
        Self {
            available,
            jump_probability: jump_probability.clamp(0.0, 1.0),
            seed,
            task: None,
        }
    }
}

impl MotionSensor for SimulatedMotion {
    fn is_device_motion_available(&self) -> bool {
        self.available
    }

    fn start_updates(&mut self, interval: Duration, sink: EventSink) -> Result<(), SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable {
                feed: "device motion".to_string(),
            });
        }
        let handle = Handle::try_current().map_err(|_| SensorError::NoRuntime {
            feed: "device motion".to_string(),
        })?;

        self.stop_updates();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let jump_probability = self.jump_probability;
        self.task = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let vertical = if rng.gen_bool(jump_probability) {
                    rng.gen_range(1.6..2.4)
                } else {
                    rng.gen_range(-0.4..0.4)
                };
                let motion = DeviceMotion {
                    user_acceleration: Vector3::new(
                        rng.gen_range(-0.3..0.3),
                        vertical,
                        rng.gen_range(-0.3..0.3),
                    ),
                    rotation_rate: Vector3::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    ),
                };
                if sink.send(SensorEvent::Motion(motion)).is_err() {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop_updates(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Simulated motion stopped");
        }
    }
}

/// In-memory workout session
#[derive(Debug, Default)]
pub struct SimulatedWorkoutService {
    fail_begin: bool,
    fail_finish: bool,
    running: Option<(WorkoutConfiguration, DateTime<Utc>)>,
    session_ended: bool,
    ended_at: Option<DateTime<Utc>>,
}

impl SimulatedWorkoutService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_begin() -> Self {
        Self {
            fail_begin: true,
            ..Self::default()
        }
    }

    pub fn failing_finish() -> Self {
        Self {
            fail_finish: true,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether the live session was ended ahead of collection
    pub fn is_session_ended(&self) -> bool {
        self.session_ended
    }
}

#[async_trait]
impl WorkoutService for SimulatedWorkoutService {
    fn begin(&mut self, config: WorkoutConfiguration, start: DateTime<Utc>) -> Result<(), WorkoutError> {
        if self.fail_begin {
            return Err(WorkoutError::BeginFailed {
                reason: "workout session could not be created".to_string(),
            });
        }
        self.running = Some((config, start));
        self.session_ended = false;
        self.ended_at = None;
        Ok(())
    }

    fn end(&mut self, end: DateTime<Utc>) {
        if self.running.is_some() {
            self.session_ended = true;
            self.ended_at = Some(end);
            debug!("Simulated workout session ended");
        }
    }

    async fn end_collection(&mut self, end: DateTime<Utc>) -> Result<(), WorkoutError> {
        if self.running.is_none() {
            return Err(WorkoutError::EndCollectionFailed {
                reason: "no collection in progress".to_string(),
            });
        }
        self.ended_at = Some(end);
        Ok(())
    }

    async fn finish(&mut self) -> Result<Option<WorkoutRecord>, WorkoutError> {
        let Some((config, start)) = self.running.take() else {
            return Ok(None);
        };
        if self.fail_finish {
            return Err(WorkoutError::FinishFailed {
                reason: "health store rejected the workout".to_string(),
            });
        }
        let end = self.ended_at.take().unwrap_or(start);
        Ok(Some(WorkoutRecord {
            activity_type: config.activity_type,
            start,
            end,
        }))
    }
}

/// Health store answering with fixed availability and consent
#[derive(Debug, Clone, Copy)]
pub struct SimulatedHealthStore {
    available: bool,
    grant: bool,
}

impl SimulatedHealthStore {
    pub fn new(available: bool, grant: bool) -> Self {
        Self { available, grant }
    }
}

impl HealthStore for SimulatedHealthStore {
    fn is_health_data_available(&self) -> bool {
        self.available
    }

    fn request_authorization(
        &mut self,
        share: &[HealthDataType],
        read: &[HealthDataType],
    ) -> Result<bool, SensorError> {
        debug!(share = share.len(), read = read.len(), granted = self.grant, "Health authorization requested");
        Ok(self.grant)
    }
}

impl SensorHub {
    /// Hub of simulated collaborators configured from settings
    pub fn simulated(settings: &SimulationSettings, seed: Option<u64>) -> Self {
        let workouts = if settings.fail_workout_begin {
            SimulatedWorkoutService::failing_begin()
        } else if settings.fail_workout_finish {
            SimulatedWorkoutService::failing_finish()
        } else {
            SimulatedWorkoutService::new()
        };

        SensorHub::new(
            Box::new(SimulatedPedometer::new(
                settings.pedometer_available,
                settings.cadence_spm,
                settings.stride_m,
            )),
            Box::new(SimulatedMotion::new(
                settings.motion_available,
                settings.jump_probability,
                seed,
            )),
            Box::new(workouts),
            Box::new(SimulatedHealthStore::new(
                settings.health_available,
                settings.grant_health_access,
            )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, WorkoutActivityType};
    use crate::sensors::event_channel;

    #[test]
    fn test_feeds_need_a_runtime() {
        let (sink, _stream) = event_channel();
        let mut pedometer = SimulatedPedometer::new(true, 100.0, 0.8);
        let result = pedometer.start_updates(Utc::now(), sink);
        assert!(matches!(result, Err(SensorError::NoRuntime { .. })));
    }

    #[test]
    fn test_unavailable_motion() {
        let (sink, _stream) = event_channel();
        let mut motion = SimulatedMotion::new(false, 0.1, Some(1));
        assert!(!motion.is_device_motion_available());
        assert!(motion.start_updates(Duration::from_millis(100), sink).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pedometer_reports_cumulative_steps() {
        let (sink, mut stream) = event_channel();
        let mut pedometer = SimulatedPedometer::new(true, 120.0, 0.5);
        pedometer.start_updates(Utc::now(), sink).unwrap();

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        let mut last = None;
        while let Ok(event) = stream.try_recv() {
            last = Some(event);
        }
        pedometer.stop_updates();

        match last {
            Some(SensorEvent::Pedometer(data)) => {
                assert_eq!(data.number_of_steps, 60);
                assert_eq!(data.distance, Some(30.0));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_motion_stops_delivering_after_stop() {
        let (sink, mut stream) = event_channel();
        let mut motion = SimulatedMotion::new(true, 0.5, Some(9));
        motion.start_updates(Duration::from_millis(100), sink).unwrap();

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let mut received = 0;
        while stream.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 10);

        motion.stop_updates();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_workout_lifecycle() {
        let mut service = SimulatedWorkoutService::new();
        let start = Utc::now();
        service
            .begin(ActivityType::Cycling.workout_configuration(), start)
            .unwrap();
        assert!(service.is_running());

        let end = start + chrono::Duration::minutes(30);
        service.end(end);
        assert!(service.is_session_ended());
        service.end_collection(end).await.unwrap();
        let record = service.finish().await.unwrap().unwrap();

        assert_eq!(record.activity_type, WorkoutActivityType::Cycling);
        assert_eq!(record.duration_seconds(), 1800);
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_workout_failures() {
        let mut service = SimulatedWorkoutService::failing_begin();
        assert!(service
            .begin(ActivityType::Yoga.workout_configuration(), Utc::now())
            .is_err());
        assert!(service.end_collection(Utc::now()).await.is_err());

        let mut service = SimulatedWorkoutService::failing_finish();
        service
            .begin(ActivityType::Yoga.workout_configuration(), Utc::now())
            .unwrap();
        service.end_collection(Utc::now()).await.unwrap();
        assert!(matches!(
            service.finish().await,
            Err(WorkoutError::FinishFailed { .. })
        ));
    }
}
