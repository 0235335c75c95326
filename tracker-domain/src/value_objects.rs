// Domain value objects
pub mod event_kind;
pub mod game_settings;
pub mod identifiers;
pub mod log_source;
pub mod timestamp_format;

pub use event_kind::*;
pub use game_settings::*;
pub use identifiers::*;
pub use log_source::*;
pub use timestamp_format::*;
