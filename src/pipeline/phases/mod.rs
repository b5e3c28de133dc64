pub mod index;
pub mod materialize;
pub mod tidy;

pub use index::IndexPhase;
pub use materialize::MaterializePhase;
pub use tidy::TidyPhase;
