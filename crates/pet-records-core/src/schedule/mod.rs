//! Recurrence math and reference vaccine data.

mod due;
mod reference;

pub use due::*;
pub use reference::*;
