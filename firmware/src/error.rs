//! Unified error types for the PulseBreath firmware.
//!
//! Two families live here.  [`MeasureError`] is the recoverable status of a
//! single estimation pass; the pipeline reports it and keeps running.
//! [`GasFault`] is the latched class that parks the gas heater in its
//! `Error` phase until someone resets it.  Everything funnels into [`Error`]
//! for the outer layers.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The gas heater cycle was aborted.
    Gas(GasFault),
    /// A measurement pass was rejected.
    Measure(MeasureError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Gas(e) => write!(f, "gas: {e}"),
            Self::Measure(e) => write!(f, "measure: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Measurement status
// ---------------------------------------------------------------------------

/// Why an estimation pass produced no value.
///
/// All variants are recoverable: the previous valid estimate stays
/// published and the next pass tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// The sample window has not been filled once yet.
    BufferNotFull,
    /// SNR, peak count, correlation or DC level is insufficient.
    PoorSignal,
    /// The derived value falls outside its physiological range.
    OutOfRange,
    /// The sample source had nothing new to offer.
    ReadFailed,
}

impl MeasureError {
    /// Stable integer code shared with transport collaborators.
    pub const fn code(self) -> i8 {
        match self {
            Self::BufferNotFull => -1,
            Self::PoorSignal => -2,
            Self::OutOfRange => -3,
            Self::ReadFailed => -4,
        }
    }
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferNotFull => write!(f, "buffer not full"),
            Self::PoorSignal => write!(f, "poor signal"),
            Self::OutOfRange => write!(f, "out of range"),
            Self::ReadFailed => write!(f, "read failed"),
        }
    }
}

impl From<MeasureError> for Error {
    fn from(e: MeasureError) -> Self {
        Self::Measure(e)
    }
}

/// Outcome of the most recent estimation pass, as published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[repr(i8)]
pub enum Status {
    #[default]
    Success = 0,
    BufferNotFull = -1,
    PoorSignal = -2,
    OutOfRange = -3,
    ReadFailed = -4,
}

impl Status {
    pub const fn code(self) -> i8 {
        self as i8
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<MeasureError> for Status {
    fn from(e: MeasureError) -> Self {
        match e {
            MeasureError::BufferNotFull => Self::BufferNotFull,
            MeasureError::PoorSignal => Self::PoorSignal,
            MeasureError::OutOfRange => Self::OutOfRange,
            MeasureError::ReadFailed => Self::ReadFailed,
        }
    }
}

impl<T> From<&core::result::Result<T, MeasureError>> for Status {
    fn from(r: &core::result::Result<T, MeasureError>) -> Self {
        match r {
            Ok(_) => Self::Success,
            Err(e) => Self::from(*e),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = match self {
            Self::Success => return write!(f, "ok"),
            Self::BufferNotFull => MeasureError::BufferNotFull,
            Self::PoorSignal => MeasureError::PoorSignal,
            Self::OutOfRange => MeasureError::OutOfRange,
            Self::ReadFailed => MeasureError::ReadFailed,
        };
        write!(f, "{e}")
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// No fresh reading was posted by the bus driver.
    NoData,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NoData => write!(f, "no fresh data"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Gas heater faults
// ---------------------------------------------------------------------------

/// Reasons the gas acquisition cycle was parked in `Error`.
///
/// The heater is forced off on entry and the phase is only left through an
/// explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GasFault {
    /// The heater pin rejected a write.
    HeaterWrite = 0b0000_0001,
    /// The heater stayed on well past its heating window (loop stall).
    HeaterOverrun = 0b0000_0010,
    /// Raised by an outside supervisor.
    External = 0b0000_0100,
}

impl GasFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for GasFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaterWrite => write!(f, "heater write failed"),
            Self::HeaterOverrun => write!(f, "heater on-time exceeded"),
            Self::External => write!(f, "external trip"),
        }
    }
}

impl From<GasFault> for Error {
    fn from(e: GasFault) -> Self {
        Self::Gas(e)
    }
}

impl From<ActuatorError> for GasFault {
    fn from(_: ActuatorError) -> Self {
        Self::HeaterWrite
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
