pub mod common;
pub mod dashboard;
pub mod learn;

pub use common::*;
pub use dashboard::*;
pub use learn::*;
