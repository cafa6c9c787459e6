pub mod runner;

pub use runner::DocumentRunner;
