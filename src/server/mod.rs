pub mod listener;

pub use listener::{Server, ServerHandle, run};
