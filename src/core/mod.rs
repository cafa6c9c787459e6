pub mod builder;
pub mod listeners;
pub mod registry;
pub mod render;

pub use crate::domain::model::{Method, Model, PropertySource, PropertyTree};
pub use crate::domain::ports::HostTree;
pub use crate::utils::error::Result;
