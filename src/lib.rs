//! Flies a drone from headset motion: a rolling-average smoother per axis feeds a
//! grounded/airborne state machine that emits rate-limited text commands.

pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod flight;
pub mod pilot;
pub mod queue;
pub mod recorder;
pub mod sink;
pub mod smoother;
pub mod stream;
pub mod window;

pub use command::{Command, Direction};
pub use config::PilotConfig;
pub use flight::{FlightState, FlightStateMachine, Thresholds};
pub use pilot::{Pilot, PilotStats, fly};
pub use sink::CommandSink;
pub use smoother::{AxisSmoother, Sample, SmoothedSignal};
pub use stream::{StreamFrame, StreamHandler, StreamSource};
pub use window::SampleWindow;
