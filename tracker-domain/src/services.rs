// Session reconstruction engine

pub mod correlator;
pub mod extractor;
pub mod normalizer;
pub mod pipeline;
pub mod retention;

pub use correlator::*;
pub use extractor::*;
pub use normalizer::*;
pub use pipeline::*;
pub use retention::*;
