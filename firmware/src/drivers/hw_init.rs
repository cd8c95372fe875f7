//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for the SnO2 divider using raw ESP-IDF
//! sys calls.  Called once from `main()` before the loop starts.  GPIO
//! outputs go through `esp-idf-hal` pin drivers instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::Error;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Error::Init("ADC1 oneshot unit"),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the loop; single-threaded.
    unsafe { init_adc() }
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: only called from the init path or the main-loop read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    use crate::pins;

    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation covers the full 0–3.3 V divider swing.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::GAS_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured (GPIO{} = SnO2)", pins::GAS_ADC_CHANNEL, pins::GAS_ADC_GPIO);
    Ok(())
}

/// One 12-bit conversion, or `None` if the driver reported an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; single-threaded main-loop access.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    None
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn adc_failure_maps_to_init_error() {
        let e = Error::from(HwInitError::AdcInitFailed(-1));
        assert_eq!(e, Error::Init("ADC1 oneshot unit"));
        assert_eq!(e.to_string(), "init: ADC1 oneshot unit");
        assert_eq!(HwInitError::AdcInitFailed(259).to_string(), "ADC1 init failed (rc=259)");
    }

    #[test]
    fn host_build_skips_init_and_reads_nothing() {
        assert_eq!(init_peripherals(), Ok(()));
        assert_eq!(adc1_read(0), None);
    }
}
