//! Domain records, value objects and events
pub mod aggregates;
pub mod events;
pub mod value_objects;
