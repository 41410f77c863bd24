// Library interface for vitalrs modules
// The binary and the integration tests both build on these

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod observer;
pub mod random;
pub mod routines;
pub mod sensors;
pub mod session;
pub mod simulated;

// Re-export commonly used types for convenience
pub use models::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{SessionDriver, TrackerHandle};
pub use error::{Result, VitalRsError};
pub use gateway::{ActivityRecord, LocalSettings, NewActivityRecord, RecordStore};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use observer::{MetricsObserver, SubscriptionId};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use sensors::{event_channel, SensorEvent, SensorHub};
pub use session::{ActivitySummary, StopOutcome, TrackingSession, TrackingState};
