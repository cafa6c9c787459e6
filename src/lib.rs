pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{MemoryTree, NodeId};
pub use app::DocumentRunner;
pub use config::toml_config::ModelsConfig;
pub use core::{
    builder::NodeBuilder,
    listeners::{Context, ListenerBus, ListenerHandle},
    registry::{Binding, ModelRegistry},
    render::{RenderEngine, RenderParams},
};
pub use domain::model::{Method, Model, PropertySource, PropertyTree};
pub use domain::ports::HostTree;
pub use utils::error::{CallbackStage, Result, UiError};
