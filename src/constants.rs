//! Constants used throughout the program.

/// Number of samples averaged per axis:
pub const SAMPLE_WINDOW_CAPACITY: usize = 30;
/// Decimal places the smoothed means are rounded to before any threshold comparison:
pub const ROUNDING_DECIMALS: u32 = 2;
/// Finest rounding an f32 mean can carry meaningfully:
pub const MAX_ROUNDING_DECIMALS: u32 = 6;
/// Largest accepted sample window:
pub const MAX_WINDOW_CAPACITY: usize = 10_000;

/// Smoothed y above which a grounded drone takes off (and an airborne one backs up):
pub const TAKEOFF_THRESHOLD: f32 = 0.20;
/// Smoothed y below which an airborne drone lands:
pub const LAND_THRESHOLD: f32 = -0.63;
/// Lower bound of the forward band, at or above the land threshold:
pub const FORWARD_LOWER_THRESHOLD: f32 = -0.63;
/// Upper bound of the forward band:
pub const FORWARD_UPPER_THRESHOLD: f32 = -0.30;
/// Smoothed z magnitude beyond which the drone moves left or right:
pub const LATERAL_THRESHOLD: f32 = 0.50;

/// Minimum time between two directional commands, in milliseconds:
pub const COMMAND_COOLDOWN_MILLIS: u64 = 1500;
/// Distance unit sent with every move command:
pub const MOVE_DISTANCE: u32 = 40;

/// Positions of ACCX, ACCY, ACCZ within a motion frame:
pub const MOTION_AXIS_OFFSETS: [usize; 3] = [6, 7, 8];

/// Frames buffered between the stream reader and the decision loop:
pub const FRAME_QUEUE_CAPACITY: usize = 64;
/// Largest accepted frame queue:
pub const MAX_FRAME_QUEUE_CAPACITY: usize = 65_536;

/// Default address of the vehicle's command port:
pub const VEHICLE_UDP_ADDRESS: &str = "192.168.10.1:8889";
/// Baud rate used when commands go out over a serial link:
pub const SERIAL_BAUD_RATE: u32 = 9600;
/// How long a sink waits for the vehicle to acknowledge a command, in milliseconds:
pub const ACK_TIMEOUT_MILLIS: u64 = 7000;
