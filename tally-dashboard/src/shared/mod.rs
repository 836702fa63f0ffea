/// Shared modules for the Tally Dashboard
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod normalize;
pub mod scheduler;
pub mod source;
pub mod status;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod widget;
