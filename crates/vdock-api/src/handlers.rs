//! Request handlers.

pub mod health;
pub mod uploads;
pub mod videos;

pub use health::*;
pub use uploads::*;
pub use videos::*;
