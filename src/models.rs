use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Activities a user can pick on the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Walking,
    Running,
    Sleeping,
    StressMonitoring,
    ToothBrushing,
    DishWashing,
    Volleyball,
    Football,
    Swimming,
    Cycling,
    Yoga,
    Meditation,
}

/// Workout classification tag handed to the workout session service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutActivityType {
    Walking,
    Running,
    MindAndBody,
    PreparationAndRecovery,
    Volleyball,
    AmericanFootball,
    Swimming,
    Cycling,
    Yoga,
}

/// Where the workout takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Indoor,
    Outdoor,
    Unknown,
}

/// Configuration for beginning a workout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutConfiguration {
    pub activity_type: WorkoutActivityType,
    pub location_type: LocationType,
}

impl ActivityType {
    const ALL: [ActivityType; 12] = [
        ActivityType::Walking,
        ActivityType::Running,
        ActivityType::Sleeping,
        ActivityType::StressMonitoring,
        ActivityType::ToothBrushing,
        ActivityType::DishWashing,
        ActivityType::Volleyball,
        ActivityType::Football,
        ActivityType::Swimming,
        ActivityType::Cycling,
        ActivityType::Yoga,
        ActivityType::Meditation,
    ];

    /// Every activity in catalog order
    pub fn all() -> &'static [ActivityType] {
        &Self::ALL
    }

    /// Short display name shown in the activity list
    pub fn name(&self) -> &'static str {
        match self {
            ActivityType::Walking => "Walking",
            ActivityType::Running => "Running",
            ActivityType::Sleeping => "Sleep",
            ActivityType::StressMonitoring => "Stress",
            ActivityType::ToothBrushing => "Brushing",
            ActivityType::DishWashing => "Dishes",
            ActivityType::Volleyball => "Volleyball",
            ActivityType::Football => "Football",
            ActivityType::Swimming => "Swimming",
            ActivityType::Cycling => "Cycling",
            ActivityType::Yoga => "Yoga",
            ActivityType::Meditation => "Meditation",
        }
    }

    pub fn workout_type(&self) -> WorkoutActivityType {
        match self {
            ActivityType::Walking => WorkoutActivityType::Walking,
            ActivityType::Running => WorkoutActivityType::Running,
            ActivityType::Sleeping => WorkoutActivityType::MindAndBody,
            ActivityType::StressMonitoring => WorkoutActivityType::MindAndBody,
            ActivityType::ToothBrushing => WorkoutActivityType::PreparationAndRecovery,
            ActivityType::DishWashing => WorkoutActivityType::PreparationAndRecovery,
            ActivityType::Volleyball => WorkoutActivityType::Volleyball,
            ActivityType::Football => WorkoutActivityType::AmericanFootball,
            ActivityType::Swimming => WorkoutActivityType::Swimming,
            ActivityType::Cycling => WorkoutActivityType::Cycling,
            ActivityType::Yoga => WorkoutActivityType::Yoga,
            ActivityType::Meditation => WorkoutActivityType::MindAndBody,
        }
    }

    /// Symbol name of the icon rendered next to the activity
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityType::Walking => "figure.walk",
            ActivityType::Running => "figure.run",
            ActivityType::Sleeping => "bed.double",
            ActivityType::StressMonitoring => "brain.head.profile",
            ActivityType::ToothBrushing => "mouth",
            ActivityType::DishWashing => "drop.triangle",
            ActivityType::Volleyball => "circle.fill",
            ActivityType::Football => "sportscourt",
            ActivityType::Swimming => "figure.pool.swim",
            ActivityType::Cycling => "bicycle",
            ActivityType::Yoga => "figure.yoga",
            ActivityType::Meditation => "sparkles",
        }
    }

    /// Command-line identifier
    pub fn slug(&self) -> &'static str {
        match self {
            ActivityType::Walking => "walking",
            ActivityType::Running => "running",
            ActivityType::Sleeping => "sleeping",
            ActivityType::StressMonitoring => "stress",
            ActivityType::ToothBrushing => "tooth-brushing",
            ActivityType::DishWashing => "dish-washing",
            ActivityType::Volleyball => "volleyball",
            ActivityType::Football => "football",
            ActivityType::Swimming => "swimming",
            ActivityType::Cycling => "cycling",
            ActivityType::Yoga => "yoga",
            ActivityType::Meditation => "meditation",
        }
    }

    pub fn workout_configuration(&self) -> WorkoutConfiguration {
        WorkoutConfiguration {
            activity_type: self.workout_type(),
            location_type: LocationType::Outdoor,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "walking" | "walk" => Ok(ActivityType::Walking),
            "running" | "run" => Ok(ActivityType::Running),
            "sleeping" | "sleep" => Ok(ActivityType::Sleeping),
            "stress" | "stress-monitoring" => Ok(ActivityType::StressMonitoring),
            "tooth-brushing" | "brushing" => Ok(ActivityType::ToothBrushing),
            "dish-washing" | "dishes" => Ok(ActivityType::DishWashing),
            "volleyball" => Ok(ActivityType::Volleyball),
            "football" => Ok(ActivityType::Football),
            "swimming" | "swim" => Ok(ActivityType::Swimming),
            "cycling" | "bike" => Ok(ActivityType::Cycling),
            "yoga" => Ok(ActivityType::Yoga),
            "meditation" => Ok(ActivityType::Meditation),
            _ => Err(format!("Unknown activity: {}", s)),
        }
    }
}

/// Measurable quantities shown on the tracking screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Steps,
    Distance,
    Calories,
    HeartRate,
    HeartRateVariability,
    Duration,
    Pace,
    SleepPhases,
    StressLevel,
    BreathingRate,
    BrushingZones,
    WaterUsage,
    Intensity,
    Jumps,
    StrokeCount,
    Speed,
}

impl MetricType {
    /// Maximum brushing zones (four mouth quadrants)
    pub const MAX_BRUSHING_ZONES: f64 = 4.0;
    /// Maximum sleep phases reported in one night
    pub const MAX_SLEEP_PHASES: f64 = 5.0;

    pub fn label(&self) -> &'static str {
        match self {
            MetricType::Steps => "Steps",
            MetricType::Distance => "Distance",
            MetricType::Calories => "Calories",
            MetricType::HeartRate => "Heart Rate",
            MetricType::HeartRateVariability => "HRV",
            MetricType::Duration => "Duration",
            MetricType::Pace => "Pace",
            MetricType::SleepPhases => "Sleep Phases",
            MetricType::StressLevel => "Stress Level",
            MetricType::BreathingRate => "Breathing Rate",
            MetricType::BrushingZones => "Brushing Zones",
            MetricType::WaterUsage => "Water Used",
            MetricType::Intensity => "Intensity",
            MetricType::Jumps => "Jumps",
            MetricType::StrokeCount => "Strokes",
            MetricType::Speed => "Speed",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricType::Steps => "steps",
            MetricType::Distance => "km",
            MetricType::Calories => "cal",
            MetricType::HeartRate => "bpm",
            MetricType::HeartRateVariability => "ms",
            MetricType::Duration => "min",
            MetricType::Pace => "min/km",
            MetricType::SleepPhases => "phases",
            MetricType::StressLevel => "score",
            MetricType::BreathingRate => "br/min",
            MetricType::BrushingZones => "zones",
            MetricType::WaterUsage => "L",
            MetricType::Intensity => "level",
            MetricType::Jumps => "count",
            MetricType::StrokeCount => "strokes",
            MetricType::Speed => "km/h",
        }
    }

    /// Render a value the way the tracking screen shows it
    pub fn format_value(&self, value: f64) -> String {
        match self {
            MetricType::Pace | MetricType::Duration => {
                let minutes = value.trunc() as i64;
                let seconds = ((value - value.trunc()) * 60.0) as i64;
                format!("{}:{:02} {}", minutes, seconds, self.unit())
            }
            MetricType::Steps | MetricType::Jumps | MetricType::StrokeCount => {
                format!("{:.0} {}", value, self.unit())
            }
            MetricType::BrushingZones | MetricType::SleepPhases => {
                let max = if *self == MetricType::BrushingZones {
                    Self::MAX_BRUSHING_ZONES
                } else {
                    Self::MAX_SLEEP_PHASES
                };
                format!("{:.0}/{:.0} {}", value.min(max), max, self.unit())
            }
            MetricType::StressLevel => format!("{:.0}/100 {}", value, self.unit()),
            _ => format!("{:.1} {}", value, self.unit()),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Latest value per metric for the running session
///
/// Reads of absent metrics yield zero. Keys are ordered by catalog position so
/// renderers get a stable layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues(BTreeMap<MetricType, f64>);

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: MetricType) -> f64 {
        self.0.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn value(&self, metric: MetricType) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn set(&mut self, metric: MetricType, value: f64) {
        self.0.insert(metric, value);
    }

    pub fn contains(&self, metric: MetricType) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricType, f64)> + '_ {
        self.0.iter().map(|(metric, value)| (*metric, *value))
    }
}

/// Three-axis vector reported by the motion feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

/// One device-motion sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMotion {
    /// Acceleration the user imparts to the device, in g
    pub user_acceleration: Vector3,

    /// Rotation rate in radians per second
    pub rotation_rate: Vector3,
}

/// Cumulative step counter reading since the feed was started
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PedometerData {
    pub number_of_steps: u64,

    /// Distance in metres, when the device can estimate it
    pub distance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_tags() {
        let all = ActivityType::all();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0], ActivityType::Walking);
        assert_eq!(all[11], ActivityType::Meditation);

        assert_eq!(ActivityType::Sleeping.name(), "Sleep");
        assert_eq!(ActivityType::Football.workout_type(), WorkoutActivityType::AmericanFootball);
        assert_eq!(ActivityType::DishWashing.icon(), "drop.triangle");
    }

    #[test]
    fn test_activity_slug_round_trip() {
        for activity in ActivityType::all() {
            assert_eq!(activity.slug().parse::<ActivityType>().unwrap(), *activity);
        }
        assert_eq!("Stress Monitoring".parse::<ActivityType>().unwrap(), ActivityType::StressMonitoring);
        assert!("skiing".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_metric_units() {
        assert_eq!(MetricType::Distance.unit(), "km");
        assert_eq!(MetricType::HeartRateVariability.label(), "HRV");
        assert_eq!(MetricType::WaterUsage.label(), "Water Used");
        assert_eq!(MetricType::BreathingRate.unit(), "br/min");
    }

    #[test]
    fn test_metric_formatting() {
        assert_eq!(MetricType::Duration.format_value(2.5), "2:30 min");
        assert_eq!(MetricType::Steps.format_value(1234.4), "1234 steps");
        assert_eq!(MetricType::BrushingZones.format_value(6.0), "4/4 zones");
        assert_eq!(MetricType::SleepPhases.format_value(2.0), "2/5 phases");
        assert_eq!(MetricType::StressLevel.format_value(42.2), "42/100 score");
        assert_eq!(MetricType::Speed.format_value(15.26), "15.3 km/h");
    }

    #[test]
    fn test_metric_values_default_zero() {
        let mut values = MetricValues::new();
        assert_eq!(values.get(MetricType::Steps), 0.0);
        assert!(values.value(MetricType::Steps).is_none());

        values.set(MetricType::Steps, 10.0);
        values.set(MetricType::Steps, 12.0);
        assert_eq!(values.get(MetricType::Steps), 12.0);
        assert_eq!(values.len(), 1);

        values.clear();
        assert!(values.is_empty());
    }

    #[test]
    fn test_acceleration_magnitude() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert!((v.magnitude() - 5.0).abs() < 1e-9);
    }
}
