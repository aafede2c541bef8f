pub mod hop;
pub mod summary;

pub use hop::*;
pub use summary::*;
