pub mod diagnostic;
pub mod extract;
pub mod passes;
mod structures;
mod util;

pub use structures::{ast, cst, signature};
