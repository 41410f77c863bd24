use proptest::prelude::*;

use vitalrs::routines::{apply_motion, apply_pedometer, apply_timer, MotionRoutine, TimerRoutine};
use vitalrs::simulated::{SimulatedHealthStore, SimulatedMotion, SimulatedPedometer, SimulatedWorkoutService};
use vitalrs::{
    event_channel, ActivityType, DeviceMotion, MetricType, MetricValues, PedometerData,
    ScriptedRandom, SensorHub, TrackingSession, Vector3,
};

fn any_activity() -> impl Strategy<Value = ActivityType> {
    prop::sample::select(ActivityType::all().to_vec())
}

fn idle_session() -> TrackingSession {
    // Feeds report unavailable so no runtime is needed
    let hub = SensorHub::new(
        Box::new(SimulatedPedometer::new(false, 100.0, 0.7)),
        Box::new(SimulatedMotion::new(false, 0.0, Some(1))),
        Box::new(SimulatedWorkoutService::new()),
        Box::new(SimulatedHealthStore::new(true, true)),
    );
    let (sink, _events) = event_channel();
    TrackingSession::new(hub, sink)
}

proptest! {
    #[test]
    fn test_stress_stays_in_range(hr in 0.0f64..=1.0, hrv in 0.0f64..=1.0) {
        let mut metrics = MetricValues::default();
        let mut random = ScriptedRandom::new([hr, hrv]);
        prop_assert!(apply_timer(TimerRoutine::Stress, &mut metrics, None, &mut random));

        let stress = metrics.get(MetricType::StressLevel);
        prop_assert!((0.0..=100.0).contains(&stress));
        prop_assert!(metrics.get(MetricType::HeartRateVariability) >= 20.0);
        prop_assert!((65.0..=85.0).contains(&metrics.get(MetricType::HeartRate)));
        prop_assert!((12.0..=17.0).contains(&metrics.get(MetricType::BreathingRate)));
    }

    #[test]
    fn test_brushing_zones_never_exceed_four(elapsed in 0.0f64..600.0, y in -3.0f64..3.0) {
        let mut metrics = MetricValues::default();
        let motion = DeviceMotion {
            user_acceleration: Vector3::new(0.1, y, 0.1),
            rotation_rate: Vector3::default(),
        };
        apply_motion(MotionRoutine::ToothBrushing, &mut metrics, &motion, Some(elapsed));

        let zones = metrics.get(MetricType::BrushingZones);
        prop_assert!((0.0..=MetricType::MAX_BRUSHING_ZONES).contains(&zones));
        prop_assert!(metrics.get(MetricType::Intensity) >= 0.0);
    }

    #[test]
    fn test_sleep_phases_are_whole_and_capped(elapsed in 0.0f64..5000.0, draw in 0.0f64..=1.0) {
        let mut metrics = MetricValues::default();
        let mut random = ScriptedRandom::constant(draw);
        prop_assert!(apply_timer(TimerRoutine::Sleep, &mut metrics, Some(elapsed), &mut random));

        let phases = metrics.get(MetricType::SleepPhases);
        prop_assert_eq!(phases, phases.floor());
        prop_assert!(phases <= MetricType::MAX_SLEEP_PHASES);
        prop_assert!((10.0..=14.0).contains(&metrics.get(MetricType::BreathingRate)));
    }

    #[test]
    fn test_pedometer_distance_and_pace(
        steps in 0u64..50_000,
        metres in 0.0f64..40_000.0,
        elapsed in 0.1f64..600.0,
    ) {
        let mut metrics = MetricValues::default();
        let data = PedometerData { number_of_steps: steps, distance: Some(metres) };
        apply_pedometer(&mut metrics, &data, Some(elapsed));

        prop_assert_eq!(metrics.get(MetricType::Steps), steps as f64);
        prop_assert!((metrics.get(MetricType::Distance) - metres / 1000.0).abs() < 1e-9);
        if metres > 0.0 {
            let expected = elapsed / (metres / 1000.0);
            prop_assert!((metrics.get(MetricType::Pace) - expected).abs() <= expected * 1e-9);
        } else {
            prop_assert!(!metrics.contains(MetricType::Pace));
        }
    }

    #[test]
    fn test_cycling_speed_and_pace_agree(elapsed in 0.0f64..300.0, draw in 0.0f64..=1.0) {
        let mut metrics = MetricValues::default();
        let mut random = ScriptedRandom::constant(draw);
        apply_timer(TimerRoutine::Cycling, &mut metrics, Some(elapsed), &mut random);

        let speed = metrics.get(MetricType::Speed);
        prop_assert!((12.0..=18.0).contains(&speed));
        prop_assert!((metrics.get(MetricType::Pace) * speed - 60.0).abs() < 1e-9);
        prop_assert!((110.0..=130.0).contains(&metrics.get(MetricType::HeartRate)));
    }

    #[test]
    fn test_second_start_never_replaces_activity(first in any_activity(), second in any_activity()) {
        let mut session = idle_session();
        prop_assert!(session.start(first));
        prop_assert!(!session.start(second));
        prop_assert_eq!(session.current_activity(), Some(first));
        prop_assert!(session.is_tracking());
    }

    #[test]
    fn test_activity_slug_round_trips(activity in any_activity()) {
        prop_assert_eq!(activity.slug().parse::<ActivityType>().unwrap(), activity);
    }
}
