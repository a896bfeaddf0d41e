//! Invocation of the external OCR program and parsing of its output.

pub mod command;
pub mod parser;
pub mod runner;

pub use command::{build_command, quote};
pub use parser::{find_structured_line, parse_output};
pub use runner::{run_command, run_program};
