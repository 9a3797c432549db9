pub mod application;
pub mod order;

pub use application::*;
pub use order::*;
