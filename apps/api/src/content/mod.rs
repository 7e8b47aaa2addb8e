pub mod games;
pub mod import;
pub mod kind;
