pub mod hotfix;
pub mod summary;
pub mod usage;

pub use hotfix::*;
pub use summary::*;
pub use usage::*;
