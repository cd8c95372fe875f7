//! GPIO / peripheral pin assignments for the PulseBreath wristband board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// I2C bus (MAX30102 optical front end, SHT4x temperature / humidity)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 4;
pub const I2C_SCL_GPIO: i32 = 5;

/// MAX30102 data-ready interrupt, active LOW.
pub const PPG_INT_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// SnO2 breath-acetone sensor
// ---------------------------------------------------------------------------

/// Sensing-resistor divider output.  ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const GAS_ADC_GPIO: i32 = 1;
pub const GAS_ADC_CHANNEL: u32 = 0;

/// Heater MOSFET gate, active HIGH.
pub const GAS_HEATER_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 13;
