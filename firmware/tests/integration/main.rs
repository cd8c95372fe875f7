//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod gas_cycle_tests;
mod mock_hw;
mod service_tests;
