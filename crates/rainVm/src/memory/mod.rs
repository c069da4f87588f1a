pub mod bytes;
pub mod kv;
pub mod stack;

pub use kv::{KvPtr, MemoryKv};
pub use stack::Stack;
