//! Core types for fnhost
//!
//! This crate provides the leaf types shared by the lifecycle engine and the
//! host binary: body formats and their codec, trace identifiers, and the
//! engine error taxonomy.

pub mod error;
pub mod format;
pub mod trace;

pub use error::EngineError;
pub use format::{Format, Payload};
pub use trace::TraceId;
