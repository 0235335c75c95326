// Domain entities
pub mod event;
pub mod game;
pub mod model;
pub mod snapshot;

pub use event::*;
pub use game::*;
pub use model::*;
pub use snapshot::*;
