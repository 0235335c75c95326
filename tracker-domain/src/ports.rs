// Port traits
// What the engine needs from infrastructure

pub mod line_source;
pub mod services;
pub mod snapshot_sink;

pub use line_source::*;
pub use services::*;
pub use snapshot_sink::*;
