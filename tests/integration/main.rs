//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the modem driver or the
//! link service against the scripted module in [`mock_modem`].  All tests
//! run on the host with a virtual clock; no hardware is required.

mod init_sequence_tests;
mod mock_modem;
