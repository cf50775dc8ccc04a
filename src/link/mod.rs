//! Serial link plumbing: the byte transport and the response line decoder.

pub mod lines;
pub mod transport;

pub use lines::{Line, LineDecoder};
pub use transport::Transport;
