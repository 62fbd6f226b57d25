//! Gateway protocol definitions
//!
//! Defines the JSON frame formats exchanged with the chat gateway and the
//! close codes used when tearing a connection down.

mod close_codes;
mod frames;

pub use close_codes::CloseCode;
pub use frames::{ControlFrame, InboundFrame, OutboundFrame, TypingData};
