//! Per-activity sampling routines
//!
//! Each activity resolves once, at start, to a [`RoutinePlan`]: which producers
//! to run and how to tear the session down. The `apply_*` functions are the
//! producer callbacks. They only compute metrics; notification and the
//! tracking guard live in the session.

use std::time::Duration;

use crate::models::{ActivityType, DeviceMotion, MetricType, MetricValues, PedometerData};
use crate::random::RandomSource;

/// Vertical user acceleration (g) above which a motion sample counts as a jump
pub const JUMP_THRESHOLD: f64 = 1.5;

/// Scale from acceleration magnitude (g) to the intensity level
pub const INTENSITY_SCALE: f64 = 10.0;

/// Minutes of brushing that cover all four zones
pub const BRUSHING_FULL_MINUTES: f64 = 2.0;

/// Litres of water per minute of dish washing
pub const WATER_LITRES_PER_MINUTE: f64 = 2.5;

/// Minutes per sleep cycle
pub const SLEEP_CYCLE_MINUTES: f64 = 90.0;

/// Routine driven by the continuous motion feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionRoutine {
    ToothBrushing,
    DishWashing,
    Sports,
}

/// Routine driven by a periodic timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerRoutine {
    Sleep,
    Stress,
    Swimming,
    Cycling,
    MindBody { calories_per_hour: f64 },
}

impl TimerRoutine {
    pub fn period(&self) -> Duration {
        match self {
            TimerRoutine::Sleep => Duration::from_secs(60),
            TimerRoutine::Stress => Duration::from_secs(10),
            TimerRoutine::Swimming => Duration::from_secs(5),
            TimerRoutine::Cycling => Duration::from_secs(5),
            TimerRoutine::MindBody { .. } => Duration::from_secs(10),
        }
    }
}

/// How a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// End and finish the workout session; the outcome follows its result
    FinishWorkout,
    /// Nothing is persisted on the device; succeed immediately
    Immediate,
}

/// Producers and teardown for one activity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutinePlan {
    pub workout: bool,
    pub pedometer: bool,
    pub motion: Option<MotionRoutine>,
    pub timer: Option<TimerRoutine>,
    pub teardown: Teardown,
}

const STEP_WORKOUT: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: true,
    motion: None,
    timer: None,
    teardown: Teardown::FinishWorkout,
};

const SLEEP: RoutinePlan = RoutinePlan {
    workout: false,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::Sleep),
    teardown: Teardown::Immediate,
};

const STRESS: RoutinePlan = RoutinePlan {
    workout: false,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::Stress),
    teardown: Teardown::Immediate,
};

const BRUSHING: RoutinePlan = RoutinePlan {
    workout: false,
    pedometer: false,
    motion: Some(MotionRoutine::ToothBrushing),
    timer: None,
    teardown: Teardown::Immediate,
};

const DISHES: RoutinePlan = RoutinePlan {
    workout: false,
    pedometer: false,
    motion: Some(MotionRoutine::DishWashing),
    timer: None,
    teardown: Teardown::Immediate,
};

const SPORTS: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: true,
    motion: Some(MotionRoutine::Sports),
    timer: None,
    teardown: Teardown::FinishWorkout,
};

const SWIMMING: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::Swimming),
    teardown: Teardown::FinishWorkout,
};

const CYCLING: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::Cycling),
    teardown: Teardown::FinishWorkout,
};

const YOGA: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::MindBody { calories_per_hour: 250.0 }),
    teardown: Teardown::FinishWorkout,
};

const MEDITATION: RoutinePlan = RoutinePlan {
    workout: true,
    pedometer: false,
    motion: None,
    timer: Some(TimerRoutine::MindBody { calories_per_hour: 150.0 }),
    teardown: Teardown::FinishWorkout,
};

impl RoutinePlan {
    pub fn for_activity(activity: ActivityType) -> &'static RoutinePlan {
        match activity {
            ActivityType::Walking | ActivityType::Running => &STEP_WORKOUT,
            ActivityType::Sleeping => &SLEEP,
            ActivityType::StressMonitoring => &STRESS,
            ActivityType::ToothBrushing => &BRUSHING,
            ActivityType::DishWashing => &DISHES,
            ActivityType::Volleyball | ActivityType::Football => &SPORTS,
            ActivityType::Swimming => &SWIMMING,
            ActivityType::Cycling => &CYCLING,
            ActivityType::Yoga => &YOGA,
            ActivityType::Meditation => &MEDITATION,
        }
    }
}

/// Step feed callback: steps, distance in km and pace in min/km
pub fn apply_pedometer(metrics: &mut MetricValues, data: &PedometerData, elapsed_minutes: Option<f64>) {
    metrics.set(MetricType::Steps, data.number_of_steps as f64);

    if let Some(distance_m) = data.distance {
        let distance_km = distance_m / 1000.0;
        metrics.set(MetricType::Distance, distance_km);

        if let Some(elapsed) = elapsed_minutes {
            if distance_m > 0.0 {
                metrics.set(MetricType::Pace, elapsed / distance_km);
            }
        }
    }
}

/// Motion feed callback
pub fn apply_motion(
    routine: MotionRoutine,
    metrics: &mut MetricValues,
    motion: &DeviceMotion,
    elapsed_minutes: Option<f64>,
) {
    let acceleration = motion.user_acceleration;
    let intensity = acceleration.magnitude() * INTENSITY_SCALE;

    match routine {
        MotionRoutine::ToothBrushing => {
            if let Some(elapsed) = elapsed_minutes {
                metrics.set(MetricType::Duration, elapsed);
            }
            metrics.set(MetricType::Intensity, intensity);

            let zones = (metrics.get(MetricType::Duration) * MetricType::MAX_BRUSHING_ZONES
                / BRUSHING_FULL_MINUTES)
                .min(MetricType::MAX_BRUSHING_ZONES);
            metrics.set(MetricType::BrushingZones, zones);
        }
        MotionRoutine::DishWashing => {
            if let Some(elapsed) = elapsed_minutes {
                metrics.set(MetricType::Duration, elapsed);
            }
            metrics.set(MetricType::Intensity, intensity);
            metrics.set(
                MetricType::WaterUsage,
                metrics.get(MetricType::Duration) * WATER_LITRES_PER_MINUTE,
            );
        }
        MotionRoutine::Sports => {
            metrics.set(MetricType::Intensity, intensity);

            // No debounce: every sample above the threshold counts.
            if acceleration.y > JUMP_THRESHOLD {
                metrics.set(MetricType::Jumps, metrics.get(MetricType::Jumps) + 1.0);
            }

            if let Some(elapsed) = elapsed_minutes {
                metrics.set(MetricType::Duration, elapsed);
            }
        }
    }
}

/// Timer callback. Returns false when the tick was skipped because the
/// routine needs a start time and none is recorded.
pub fn apply_timer(
    routine: TimerRoutine,
    metrics: &mut MetricValues,
    elapsed_minutes: Option<f64>,
    random: &mut dyn RandomSource,
) -> bool {
    match routine {
        TimerRoutine::Stress => {
            stress_tick(metrics, random);
            true
        }
        TimerRoutine::Sleep => elapsed_minutes
            .map(|elapsed| sleep_tick(metrics, elapsed, random))
            .is_some(),
        TimerRoutine::Swimming => elapsed_minutes
            .map(|elapsed| swimming_tick(metrics, elapsed))
            .is_some(),
        TimerRoutine::Cycling => elapsed_minutes
            .map(|elapsed| cycling_tick(metrics, elapsed, random))
            .is_some(),
        TimerRoutine::MindBody { calories_per_hour } => elapsed_minutes
            .map(|elapsed| mind_body_tick(metrics, elapsed, calories_per_hour, random))
            .is_some(),
    }
}

fn sleep_tick(metrics: &mut MetricValues, elapsed: f64, random: &mut dyn RandomSource) {
    metrics.set(MetricType::Duration, elapsed);

    let phases = (elapsed / SLEEP_CYCLE_MINUTES)
        .floor()
        .min(MetricType::MAX_SLEEP_PHASES);
    metrics.set(MetricType::SleepPhases, phases);

    metrics.set(MetricType::BreathingRate, 12.0 + random.uniform(-2.0, 2.0));
}

fn stress_tick(metrics: &mut MetricValues, random: &mut dyn RandomSource) {
    let heart_rate = 65.0 + random.uniform(0.0, 20.0);
    metrics.set(MetricType::HeartRate, heart_rate);

    let hrv = 65.0 - random.uniform(0.0, 30.0);
    metrics.set(MetricType::HeartRateVariability, hrv.max(20.0));

    // Derived from the unfloored draw
    let stress = ((85.0 - hrv) * 1.2).clamp(0.0, 100.0);
    metrics.set(MetricType::StressLevel, stress);

    metrics.set(MetricType::BreathingRate, 12.0 + stress / 20.0);
}

fn swimming_tick(metrics: &mut MetricValues, elapsed: f64) {
    metrics.set(MetricType::Duration, elapsed);

    let distance = elapsed * (2.0 / 60.0);
    metrics.set(MetricType::Distance, distance);
    if distance > 0.0 {
        metrics.set(MetricType::Pace, elapsed / distance);
    }

    metrics.set(MetricType::StrokeCount, elapsed * 20.0);
    metrics.set(MetricType::Calories, elapsed * (500.0 / 60.0));
}

fn cycling_tick(metrics: &mut MetricValues, elapsed: f64, random: &mut dyn RandomSource) {
    metrics.set(MetricType::Duration, elapsed);
    metrics.set(MetricType::Distance, elapsed * (15.0 / 60.0));

    let speed = 15.0 + random.uniform(-3.0, 3.0);
    metrics.set(MetricType::Speed, speed);
    if speed > 0.0 {
        metrics.set(MetricType::Pace, 60.0 / speed);
    }

    metrics.set(MetricType::Calories, elapsed * (400.0 / 60.0));
    metrics.set(MetricType::HeartRate, 120.0 + random.uniform(-10.0, 10.0));
}

fn mind_body_tick(
    metrics: &mut MetricValues,
    elapsed: f64,
    calories_per_hour: f64,
    random: &mut dyn RandomSource,
) {
    metrics.set(MetricType::Duration, elapsed);

    let heart_rate = 75.0 - (elapsed * 2.0).min(20.0) + random.uniform(-3.0, 3.0);
    metrics.set(MetricType::HeartRate, heart_rate.max(55.0));

    let breathing = 12.0 - (elapsed / 10.0).min(6.0) + random.uniform(-1.0, 1.0);
    metrics.set(MetricType::BreathingRate, breathing.max(4.0));

    metrics.set(MetricType::Calories, elapsed * (calories_per_hour / 60.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vector3;
    use crate::random::ScriptedRandom;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_plan_table() {
        let walking = RoutinePlan::for_activity(ActivityType::Walking);
        assert!(walking.pedometer && walking.workout);
        assert_eq!(walking.teardown, Teardown::FinishWorkout);

        let sleeping = RoutinePlan::for_activity(ActivityType::Sleeping);
        assert_eq!(sleeping.timer.map(|t| t.period()), Some(Duration::from_secs(60)));
        assert_eq!(sleeping.teardown, Teardown::Immediate);

        let football = RoutinePlan::for_activity(ActivityType::Football);
        assert!(football.workout && football.pedometer);
        assert_eq!(football.motion, Some(MotionRoutine::Sports));

        for activity in ActivityType::all() {
            let plan = RoutinePlan::for_activity(*activity);
            assert_eq!(plan.workout, plan.teardown == Teardown::FinishWorkout);
        }
    }

    #[test]
    fn test_pedometer_without_distance() {
        let mut metrics = MetricValues::new();
        let data = PedometerData { number_of_steps: 42, distance: None };
        apply_pedometer(&mut metrics, &data, Some(3.0));

        assert_eq!(metrics.get(MetricType::Steps), 42.0);
        assert!(!metrics.contains(MetricType::Distance));
        assert!(!metrics.contains(MetricType::Pace));
    }

    #[test]
    fn test_pedometer_zero_distance_skips_pace() {
        let mut metrics = MetricValues::new();
        let data = PedometerData { number_of_steps: 0, distance: Some(0.0) };
        apply_pedometer(&mut metrics, &data, Some(3.0));

        assert_eq!(metrics.value(MetricType::Distance), Some(0.0));
        assert!(!metrics.contains(MetricType::Pace));
    }

    #[test]
    fn test_sleep_phases_capped() {
        let mut metrics = MetricValues::new();
        let mut random = ScriptedRandom::constant(1.0);

        assert!(apply_timer(TimerRoutine::Sleep, &mut metrics, Some(200.0), &mut random));
        assert_eq!(metrics.get(MetricType::SleepPhases), 2.0);
        assert_eq!(metrics.get(MetricType::BreathingRate), 14.0);

        apply_timer(TimerRoutine::Sleep, &mut metrics, Some(900.0), &mut random);
        assert_eq!(metrics.get(MetricType::SleepPhases), 5.0);
    }

    #[test]
    fn test_stress_tick_exact() {
        let mut metrics = MetricValues::new();
        // heart rate draw 10 (0.5 of 0..20), HRV draw 30 (1.0 of 0..30)
        let mut random = ScriptedRandom::new([0.5, 1.0]);
        apply_timer(TimerRoutine::Stress, &mut metrics, None, &mut random);

        assert!(close(metrics.get(MetricType::HeartRate), 75.0));
        assert!(close(metrics.get(MetricType::HeartRateVariability), 35.0));
        assert!(close(metrics.get(MetricType::StressLevel), 60.0));
        assert!(close(metrics.get(MetricType::BreathingRate), 15.0));
    }

    #[test]
    fn test_elapsed_routines_skip_without_start() {
        let mut metrics = MetricValues::new();
        let mut random = ScriptedRandom::midpoint();
        assert!(!apply_timer(TimerRoutine::Cycling, &mut metrics, None, &mut random));
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_swimming_tick() {
        let mut metrics = MetricValues::new();
        let mut random = ScriptedRandom::midpoint();
        apply_timer(TimerRoutine::Swimming, &mut metrics, Some(30.0), &mut random);

        assert!(close(metrics.get(MetricType::Distance), 1.0));
        assert!(close(metrics.get(MetricType::Pace), 30.0));
        assert!(close(metrics.get(MetricType::StrokeCount), 600.0));
        assert!(close(metrics.get(MetricType::Calories), 250.0));
    }

    #[test]
    fn test_swimming_at_zero_elapsed_has_no_pace() {
        let mut metrics = MetricValues::new();
        let mut random = ScriptedRandom::midpoint();
        apply_timer(TimerRoutine::Swimming, &mut metrics, Some(0.0), &mut random);
        assert!(!metrics.contains(MetricType::Pace));
    }

    #[test]
    fn test_mind_body_floors() {
        let mut metrics = MetricValues::new();
        let mut random = ScriptedRandom::constant(0.0);
        apply_timer(
            TimerRoutine::MindBody { calories_per_hour: 150.0 },
            &mut metrics,
            Some(120.0),
            &mut random,
        );

        // 75 - 20 - 3 = 52 -> floored at 55; 12 - 6 - 1 = 5
        assert_eq!(metrics.get(MetricType::HeartRate), 55.0);
        assert!(close(metrics.get(MetricType::BreathingRate), 5.0));
        assert!(close(metrics.get(MetricType::Calories), 300.0));
    }

    #[test]
    fn test_brushing_zones_and_intensity() {
        let mut metrics = MetricValues::new();
        let motion = DeviceMotion {
            user_acceleration: Vector3::new(0.3, 0.4, 0.0),
            ..Default::default()
        };
        apply_motion(MotionRoutine::ToothBrushing, &mut metrics, &motion, Some(1.0));

        assert!(close(metrics.get(MetricType::Intensity), 5.0));
        assert!(close(metrics.get(MetricType::BrushingZones), 2.0));

        apply_motion(MotionRoutine::ToothBrushing, &mut metrics, &motion, Some(10.0));
        assert_eq!(metrics.get(MetricType::BrushingZones), 4.0);
    }

    #[test]
    fn test_dish_washing_water() {
        let mut metrics = MetricValues::new();
        apply_motion(MotionRoutine::DishWashing, &mut metrics, &DeviceMotion::default(), Some(4.0));
        assert!(close(metrics.get(MetricType::WaterUsage), 10.0));
        assert_eq!(metrics.get(MetricType::Intensity), 0.0);
    }

    #[test]
    fn test_jump_counts_every_sample_above_threshold() {
        let mut metrics = MetricValues::new();
        let high = DeviceMotion {
            user_acceleration: Vector3::new(0.0, 1.6, 0.0),
            ..Default::default()
        };
        let low = DeviceMotion {
            user_acceleration: Vector3::new(0.0, 1.5, 0.0),
            ..Default::default()
        };

        apply_motion(MotionRoutine::Sports, &mut metrics, &high, Some(0.1));
        apply_motion(MotionRoutine::Sports, &mut metrics, &high, Some(0.2));
        apply_motion(MotionRoutine::Sports, &mut metrics, &low, Some(0.3));

        assert_eq!(metrics.get(MetricType::Jumps), 2.0);
        assert!(close(metrics.get(MetricType::Duration), 0.3));
    }
}
