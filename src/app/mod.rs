//! Application core: link orchestration above the modem driver.
//!
//! All interaction with the board happens through the **port traits**
//! defined in [`ports`], so the service runs unchanged against the mock
//! adapters in the host tests.

pub mod ports;
pub mod service;
