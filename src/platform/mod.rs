// Platform-specific helpers

pub mod tools;

pub use tools::find_executable;
