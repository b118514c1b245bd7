//! Common utilities shared by the analyzer services

pub mod constants;
pub mod errors;
pub mod logging;
pub mod notify;

pub use constants::*;
pub use errors::*;
pub use notify::*;
