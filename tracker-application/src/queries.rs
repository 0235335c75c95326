pub mod session_queries;

pub use session_queries::*;
