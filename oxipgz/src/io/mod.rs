//! Input and output adapters.

mod input;
mod output;
mod plain;

pub use input::{InputFile, ReadBlocks};
pub use output::{OutputFile, OutputStream};
pub use plain::PlainOutput;
