pub mod bytecode;
pub mod constant;
pub mod errors;
pub mod eval;
pub mod integrity;
pub mod memory;
pub mod ops;
