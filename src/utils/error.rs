use std::fmt;
use thiserror::Error;

/// 回呼執行的階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    /// Model 的資料回呼 (computed properties)
    Resolve,
    /// render 後的 binding
    Binding,
    /// announce 的 listener
    Listener,
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            CallbackStage::Resolve => "Resolve",
            CallbackStage::Binding => "Binding",
            CallbackStage::Listener => "Listener",
        };
        f.write_str(stage)
    }
}

#[derive(Error, Debug)]
pub enum UiError {
    #[error("Model not found: {name}")]
    ModelNotFound { name: String },

    #[error("Target node has no parent, required by {method}")]
    MissingParent { method: String },

    #[error("Property tree has no tagName, cannot create a node")]
    MissingTagName,

    #[error("Model '{name}' has no properties to build a node from")]
    MissingProperties { name: String },

    #[error("Unknown node: {id}")]
    UnknownNode { id: usize },

    #[error("Host tree error: {message}")]
    HostError { message: String },

    #[error("{stage} callback for '{target}' failed: {source}")]
    Callback {
        stage: CallbackStage,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Structure,
    Callback,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UiError {
    /// 將回呼錯誤包裝為 `UiError::Callback`
    pub fn callback(stage: CallbackStage, target: impl Into<String>, source: anyhow::Error) -> Self {
        UiError::Callback {
            stage,
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            UiError::ModelNotFound { .. } => ErrorCategory::Lookup,
            UiError::MissingParent { .. }
            | UiError::MissingTagName
            | UiError::MissingProperties { .. }
            | UiError::UnknownNode { .. }
            | UiError::HostError { .. } => ErrorCategory::Structure,
            UiError::Callback { .. } => ErrorCategory::Callback,
            UiError::TomlError(_)
            | UiError::ConfigValidationError { .. }
            | UiError::InvalidConfigValueError { .. }
            | UiError::MissingConfigError { .. } => ErrorCategory::Configuration,
            UiError::IoError(_) | UiError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup | ErrorCategory::Callback => ErrorSeverity::Medium,
            ErrorCategory::Structure | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            UiError::ModelNotFound { name } => {
                format!("Register a model named '{}' before rendering or binding it", name)
            }
            UiError::MissingParent { method } => format!(
                "Attach the target node to the tree before running a {} model",
                method
            ),
            UiError::MissingTagName => "Add a tagName to every node of the property tree".to_string(),
            UiError::MissingProperties { name } => format!(
                "Give model '{}' static properties or a properties callback",
                name
            ),
            UiError::UnknownNode { .. } | UiError::HostError { .. } => {
                "Make sure the target node belongs to the same host tree as the engine".to_string()
            }
            UiError::Callback { stage, .. } => {
                format!("Check the {} callback, its error is reported above", stage)
            }
            UiError::IoError(_) => "Check the file path and its permissions".to_string(),
            UiError::SerializationError(_) | UiError::TomlError(_) => {
                "Check the model file syntax".to_string()
            }
            UiError::ConfigValidationError { field, .. }
            | UiError::InvalidConfigValueError { field, .. }
            | UiError::MissingConfigError { field } => {
                format!("Fix the '{}' entry of the model file", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Lookup => format!("Unknown model: {}", self),
            ErrorCategory::Structure => format!("Cannot change the node tree: {}", self),
            ErrorCategory::Callback => format!("A callback failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid model file: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, UiError>;
