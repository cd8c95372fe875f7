//! Temperature / humidity sensor, main-loop side.
//!
//! The bus driver converts a measurement and calls [`post_env_reading`];
//! [`EnvSensor`] takes it.  Range checking is left to the consumer.

use crate::error::SensorError;
use crate::state::EnvReading;

use super::Mailbox;

static ENV_MAILBOX: Mailbox<EnvReading> = Mailbox::new();

pub fn post_env_reading(temperature_c: f32, humidity_pct: f32) {
    ENV_MAILBOX.post(EnvReading {
        temperature_c,
        humidity_pct,
    });
}

pub struct EnvSensor {
    mailbox: &'static Mailbox<EnvReading>,
}

impl EnvSensor {
    pub fn new() -> Self {
        Self::with_mailbox(&ENV_MAILBOX)
    }

    pub fn with_mailbox(mailbox: &'static Mailbox<EnvReading>) -> Self {
        Self { mailbox }
    }

    /// The reading posted since the last call, or [`SensorError::NoData`].
    pub fn read(&mut self) -> Result<EnvReading, SensorError> {
        self.mailbox.take().ok_or(SensorError::NoData)
    }
}

impl Default for EnvSensor {
    fn default() -> Self {
        Self::new()
    }
}
