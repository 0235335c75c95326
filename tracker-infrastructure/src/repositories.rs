pub mod file_tailer;
pub mod json_sink;

pub use file_tailer::*;
pub use json_sink::*;
