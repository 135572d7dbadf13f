//! Domain models for pet health records.

mod activity;
mod condition;
mod document;
mod medication;
mod pet;
mod record;
mod vaccination;
mod weight;

pub use activity::*;
pub use condition::*;
pub use document::*;
pub use medication::*;
pub use pet::*;
pub use record::*;
pub use vaccination::*;
pub use weight::*;
