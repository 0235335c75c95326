pub mod health_service;
pub mod poll_scheduler;

pub use health_service::*;
pub use poll_scheduler::*;
