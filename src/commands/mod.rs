//! Command handlers behind the `studio-gen` binary.

mod compose;
mod generate;

pub use compose::{ComposeArgs, compose};
pub use generate::{GenerateArgs, generate};
