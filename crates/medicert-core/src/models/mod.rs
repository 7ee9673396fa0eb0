//! Domain models for the medicert system.

mod certificate;
mod patient;

pub use certificate::*;
pub use patient::*;
