//! Control-Loop Constants

/// Target temperature for every zone (°C).
pub const DEFAULT_TARGET_TEMP_C: f64 = 20.0;

/// Simulated time after which the control loop stops (s).
pub const DEFAULT_STOP_TIME_S: f64 = 5000.0;

/// Simulated time covered by one control step (s).
pub const DEFAULT_DELTA_T_S: f64 = 200.0;

/// Power of a heater that is switched on (W). Heaters are on/off only.
pub const MAX_HEATER_POWER_W: f64 = 10_000.0;

/// Default timeout for one request/reply exchange over pub/sub (s).
///
/// This is the only cancellation mechanism in the system.
pub const DEFAULT_RPC_TIMEOUT_S: u64 = 10;
