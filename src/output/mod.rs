//! Report rendering and output.

pub mod markdown;
pub mod writer;

pub use markdown::{RenderError, render};
pub use writer::{OutputError, write_output};
