//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node cycle (or both
//! of them over a simulated link) against mock adapters.  All tests run on
//! the host with no real hardware required.

mod mock_hw;
mod responder_tests;
