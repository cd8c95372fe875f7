//! Non-diagnostic trend indicator.
//!
//! Counts how many published readings sit outside their comfortable band
//! and folds the count into three levels.  Inputs that have not been
//! measured yet never contribute.
//!
//! | factor                    | weight |
//! |---------------------------|--------|
//! | heart rate outside band   | 1      |
//! | SpO2 below floor          | 1      |
//! | acetone proxy above limit | 2      |
//! | weak PPG signal           | 1      |
//!
//! `>= 3` → High, `>= 1` → Elevated, otherwise Normal.

use serde::Serialize;

use crate::config::TrendConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum TrendLevel {
    #[default]
    Normal = 0,
    Elevated = 1,
    High = 2,
}

impl TrendLevel {
    pub const fn from_score(score: u8) -> Self {
        match score {
            0 => Self::Normal,
            1 | 2 => Self::Elevated,
            _ => Self::High,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::High => "high",
        }
    }
}

/// Readings the assessment looks at; `None` / 0 means "not measured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrendInputs {
    pub bpm: u8,
    pub spo2: u8,
    pub acetone_ppm: Option<u16>,
    pub snr_x10: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrendAssessment {
    pub level: TrendLevel,
    pub score: u8,
}

pub fn assess(inputs: &TrendInputs, limits: &TrendConfig) -> TrendAssessment {
    let mut score = 0u8;

    if inputs.bpm > 0 && (inputs.bpm < limits.bpm_low || inputs.bpm > limits.bpm_high) {
        score += 1;
    }
    if inputs.spo2 > 0 && inputs.spo2 < limits.spo2_low {
        score += 1;
    }
    if inputs.acetone_ppm.is_some_and(|ppm| ppm > limits.acetone_ppm) {
        score += 2;
    }
    if inputs.snr_x10.is_some_and(|snr| snr < limits.snr_low_x10) {
        score += 1;
    }

    TrendAssessment {
        level: TrendLevel::from_score(score),
        score,
    }
}
