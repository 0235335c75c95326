pub mod ops_handlers;
pub mod session_handlers;

pub use ops_handlers::*;
pub use session_handlers::*;
