//! Thermal Parameters of the Reference Building
//!
//! Both the ground-truth plant and the controller's predictive model start from
//! these values. The real set then drifts; the model set is recalibrated.

// ===== ZONE PARAMETERS =====

/// Heat capacity of each zone (J/K).
///
/// Roughly a 100 m² room including furniture and inner walls.
pub const DEFAULT_HEAT_CAPACITY_J_PER_K: f64 = 1.0e6;

/// External heat-transfer coefficient of zone Z1 (W/K).
///
/// Z1 is a corner zone with two outside walls.
pub const HEAT_TRANSFER_EXTERNAL_Z1_W_PER_K: f64 = 1000.0;

/// External heat-transfer coefficient of zone Z2 (W/K).
pub const HEAT_TRANSFER_EXTERNAL_Z2_W_PER_K: f64 = 500.0;

/// External heat-transfer coefficient of zone Z3 (W/K).
pub const HEAT_TRANSFER_EXTERNAL_Z3_W_PER_K: f64 = 1042.0;

/// Heat-transfer coefficient between neighbouring zones (W/K).
pub const HEAT_TRANSFER_BETWEEN_ZONES_W_PER_K: f64 = 500.0;

// ===== INITIAL CONDITIONS =====

/// Outside temperature (°C).
pub const DEFAULT_ENVIRONMENT_TEMP_C: f64 = 15.0;

/// Zone temperature assumed before the first plant reply (°C).
pub const INITIAL_ZONE_TEMP_C: f64 = 15.0;

/// Sensor value assumed before the first plant reply.
///
/// Sensors read zero until the plant reports, matching a cold start where no
/// measurement has arrived yet.
pub const INITIAL_SENSOR_VALUE: f64 = 0.0;

// ===== DRIFT =====

/// Span of the multiplicative drift applied to the real external coefficients
/// after every predictive step: the factor is drawn from `[1.0, 1.0 + span)`.
pub const DEFAULT_DRIFT_SPAN: f64 = 0.1;
