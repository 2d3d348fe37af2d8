pub mod ast;
pub mod cst;
pub mod signature;
