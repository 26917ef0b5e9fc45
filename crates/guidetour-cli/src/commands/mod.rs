pub mod availability;
pub mod blackout;
pub mod catalog;
pub mod config;
pub mod scheduler;
pub mod visit;
