//! Log file plumbing for the production variant.

pub mod rotating;

pub use rotating::{RotatingFileWriter, RotatingWriterGuard};
