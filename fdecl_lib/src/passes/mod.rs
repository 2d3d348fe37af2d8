pub mod func_decls;
pub mod lower_cst;
pub mod parse;
pub mod preprocess;
