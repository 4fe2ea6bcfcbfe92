//! Color-Blob Aim Assistant Library
//!
//! Real-time pipeline for a 2D aim-training target: capture a frame, find
//! colored blobs, track them across frames, pick the next one to engage and
//! drive synthetic pointer input with open-loop timing. Platform capture and
//! input injection are kept behind the [`devices`] traits.
//!
//! ```ignore
//! use aim_assistant::{AssistConfig, AssistLoop, SystemClock};
//!
//! let config = AssistConfig::from_file("assist.json")?;
//! let mut assist = AssistLoop::new(&config, capture, mouse, keyboard, SystemClock);
//! loop {
//!     assist.tick();
//! }
//! ```

pub mod clock;
pub mod config;
pub mod detector;
pub mod detector_trait;
pub mod devices;
pub mod engagement;
pub mod error;
pub mod scheduler;
pub mod selector;
pub mod simulation;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AssistConfig;
pub use detector::{ColorBlobDetector, DetectorConfig};
pub use detector_trait::TargetDetector;
pub use devices::{ActivationInput, Actuator, FrameSource, RecordingActuator, ToggleLatch};
pub use engagement::{AssistLoop, SessionStats, TickOutcome};
pub use error::{AssistError, Result};
pub use scheduler::{ActionScheduler, CycleOutcome, EngagementState, SchedulerConfig, ShotReport};
pub use selector::{SelectorConfig, TargetSelector};
pub use types::{Frame, ImageData, ImageFormat};

pub use blobtrack::{GhostTracker, Observation, Point, TrackId, TrackedTarget, TrackerConfig};

/// Initialize the library
/// Call once at startup, after the host installed its logger
pub fn init() -> Result<()> {
    log::info!("Aim assistant library v{} initialized", version());
    Ok(())
}

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
