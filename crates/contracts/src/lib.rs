//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Round-trip latency is measured on the monotonic clock (`std::time::Instant`)
//! - The send stamp lives in a single [`SendSlot`], last-write-wins

mod config;
mod correlation;
mod display;
mod error;
mod event;
mod frame;
mod source;
mod state;

pub use config::*;
pub use correlation::SendSlot;
pub use display::{DisplaySink, DisplayUpdate};
pub use error::*;
pub use event::*;
pub use frame::*;
pub use source::FrameSource;
pub use state::ConnectionState;
