//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                     |
//! |------------|----------------|---------------------------------|
//! | `hardware` | SampleSource   | MAX30102 mailbox                |
//! |            | GasAdc         | ESP32 ADC1                      |
//! |            | EnvSource      | Temperature / humidity mailbox  |
//! |            | HeaterPort     | Heater GPIO                     |
//! | `log_sink` | EventSink      | Serial log output               |
//! | `time`     | Clock          | ESP32 system timer              |

pub mod hardware;
pub mod log_sink;
pub mod time;
