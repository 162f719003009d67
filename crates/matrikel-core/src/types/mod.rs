//! Core types for Matrikel

mod credentials;
mod student;

pub use credentials::*;
pub use student::*;
