pub mod liveness;
pub mod opcodes;
pub mod parser;
pub mod project;
pub mod raw;
pub mod scratchblocks;

pub use parser::parse_project;
pub use project::{Project, Rect, Script, Target};
pub use raw::RawProject;
