//! Terminal output.

mod output;

pub use output::Output;
