//! MAX30102 optical front end, main-loop side.
//!
//! The bus driver reads the FIFO on the data-ready interrupt and calls
//! [`post_ppg_sample`].  [`PpgFrontEnd`] takes the newest pair; a pair
//! that is replaced before the main loop gets to it is dropped and counted.

use crate::error::MeasureError;
use crate::ppg::PpgSample;

use super::Mailbox;

/// The FIFO delivers 18-bit right-aligned samples.
pub const PPG_SAMPLE_MASK: i32 = 0x3_FFFF;

static PPG_MAILBOX: Mailbox<PpgSample> = Mailbox::new();

/// Hand a red/IR pair to the main loop.  Safe to call from ISR context.
pub fn post_ppg_sample(red: u32, ir: u32) {
    PPG_MAILBOX.post(PpgSample {
        red: red as i32 & PPG_SAMPLE_MASK,
        ir: ir as i32 & PPG_SAMPLE_MASK,
    });
}

pub struct PpgFrontEnd {
    mailbox: &'static Mailbox<PpgSample>,
    reads: u32,
}

impl PpgFrontEnd {
    /// Front end fed by [`post_ppg_sample`].
    pub fn new() -> Self {
        Self::with_mailbox(&PPG_MAILBOX)
    }

    pub fn with_mailbox(mailbox: &'static Mailbox<PpgSample>) -> Self {
        Self { mailbox, reads: 0 }
    }

    pub fn read(&mut self) -> Result<PpgSample, MeasureError> {
        let sample = self.mailbox.take().ok_or(MeasureError::ReadFailed)?;
        self.reads = self.reads.wrapping_add(1);
        Ok(sample)
    }

    /// Successful reads since construction.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Pairs the main loop never saw.
    pub fn dropped(&self) -> u32 {
        self.mailbox.overwritten()
    }
}

impl Default for PpgFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mailbox_is_read_failure() {
        static MB: Mailbox<PpgSample> = Mailbox::new();
        let mut fe = PpgFrontEnd::with_mailbox(&MB);
        assert_eq!(fe.read(), Err(MeasureError::ReadFailed));
        assert_eq!(fe.reads(), 0);
    }

    #[test]
    fn reads_each_pair_once() {
        static MB: Mailbox<PpgSample> = Mailbox::new();
        let mut fe = PpgFrontEnd::with_mailbox(&MB);
        MB.post(PpgSample { red: 10, ir: 20 });
        assert_eq!(fe.read(), Ok(PpgSample { red: 10, ir: 20 }));
        assert_eq!(fe.read(), Err(MeasureError::ReadFailed));
        assert_eq!(fe.reads(), 1);
    }

    #[test]
    fn post_masks_to_eighteen_bits() {
        let mut fe = PpgFrontEnd::new();
        post_ppg_sample(0xFFFF_FFFF, 0x4_0001);
        let s = fe.read().unwrap();
        assert_eq!(s.red, PPG_SAMPLE_MASK);
        assert_eq!(s.ir, 1);
    }
}
