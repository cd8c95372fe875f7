//! Two-channel PPG sample ring.
//!
//! ```text
//!   primary (IR)  [ s0 | s1 | ... | s(N-1) ]
//!   aux (red)     [ s0 | s1 | ... | s(N-1) ]
//!                         ^ cursor (next write)
//! ```
//!
//! Both channels share one cursor so index `i` always holds a synchronized
//! pair.  `filled` flips to `true` the first time the cursor wraps and stays
//! there until [`SampleBuffer::reset`].

/// Sensor words are 18-bit right-aligned; dropping two bits fits them in i16.
const INGEST_SHIFT: u32 = 2;

/// Narrow to i16, clamping instead of wrapping.
pub fn saturate_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[derive(Debug, Clone)]
pub struct SampleBuffer<const N: usize> {
    primary: [i16; N],
    aux: [i16; N],
    cursor: usize,
    filled: bool,
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleBuffer<N> {
    pub const fn new() -> Self {
        Self {
            primary: [0; N],
            aux: [0; N],
            cursor: 0,
            filled: false,
        }
    }

    /// Store a raw sensor pair (`ir` primary, `red` auxiliary).
    pub fn push_raw(&mut self, ir: i32, red: i32) {
        self.push(saturate_i16(ir >> INGEST_SHIFT), saturate_i16(red >> INGEST_SHIFT));
    }

    /// Store an already-scaled pair.
    pub fn push(&mut self, primary: i16, aux: i16) {
        self.primary[self.cursor] = primary;
        self.aux[self.cursor] = aux;
        self.cursor += 1;
        if self.cursor == N {
            self.cursor = 0;
            self.filled = true;
        }
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Index of the next write.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Primary channel in storage order.
    pub fn primary(&self) -> &[i16; N] {
        &self.primary
    }

    /// Auxiliary channel in storage order.
    pub fn aux(&self) -> &[i16; N] {
        &self.aux
    }

    /// Copy the primary channel into `out`, oldest sample first.
    pub fn unroll_primary(&self, out: &mut [i16; N]) {
        let (newest, oldest) = self.primary.split_at(self.cursor);
        out[..oldest.len()].copy_from_slice(oldest);
        out[oldest.len()..].copy_from_slice(newest);
    }

    /// Forget every sample and start filling again.
    pub fn reset(&mut self) {
        self.primary = [0; N];
        self.aux = [0; N];
        self.cursor = 0;
        self.filled = false;
    }
}
