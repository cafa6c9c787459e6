use crate::config::template::PropertyTemplate;
use crate::core::registry::ModelRegistry;
use crate::domain::model::{Method, Model, PropertyTree};
use crate::utils::error::{Result, UiError};
use crate::utils::validation::{
    parse_node_path, validate_non_empty_string, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// TOML model 檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub document: DocumentConfig,
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
    #[serde(default)]
    pub steps: Vec<RenderStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    pub method: Method,
    pub properties: Option<PropertyTree>,
    /// 為 true 時以 render 資料填入 `{{key}}` 佔位符
    pub template: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderStep {
    pub model: String,
    /// 從 document 根節點起算的子節點索引路徑，例如 "0/1"；空字串代表根節點
    #[serde(default)]
    pub target: String,
    pub data: Option<Value>,
    #[serde(default)]
    pub binding_args: Vec<Value>,
}

impl RenderStep {
    pub fn target_path(&self) -> Result<Vec<usize>> {
        parse_node_path("steps.target", &self.target)
    }
}

impl ModelDefinition {
    pub fn is_template(&self) -> bool {
        self.template.unwrap_or(false)
    }

    /// 轉成可註冊的 model；模板會變成 computed model
    pub fn to_model(&self) -> Result<Model> {
        match (&self.properties, self.is_template()) {
            (Some(properties), true) => {
                let template = Arc::new(PropertyTemplate::new(properties.clone())?);
                Ok(Model::computed(self.name.clone(), self.method, move |data| {
                    template.fill(data.as_ref())
                }))
            }
            (Some(properties), false) => Ok(Model::new(
                self.name.clone(),
                self.method,
                properties.clone(),
            )),
            (None, _) => Ok(Model::structural(self.name.clone(), self.method)),
        }
    }
}

impl ModelsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${USER})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UiError::ConfigValidationError {
            field: "environment".to_string(),
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn to_models(&self) -> Result<Vec<Model>> {
        self.models.iter().map(ModelDefinition::to_model).collect()
    }

    /// 把所有 model 依檔案順序註冊到 registry
    pub fn register_into<N>(&self, registry: &ModelRegistry<N>) -> Result<usize> {
        let models = self.to_models()?;
        let count = models.len();
        for model in models {
            registry.register(model);
        }
        Ok(count)
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    fn validate_model(&self, model: &ModelDefinition) -> Result<()> {
        validate_non_empty_string("models.name", &model.name)?;

        if model.method.uses_properties() {
            let properties = validate_required_field(
                &format!("models.{}.properties", model.name),
                &model.properties,
            )?;
            if model.method.creates_node() && properties.tag_name.is_none() {
                return Err(UiError::ConfigValidationError {
                    field: format!("models.{}.properties.tagName", model.name),
                    message: format!("{} needs a tagName to create a node", model.method),
                });
            }
        } else if model.properties.is_some() {
            tracing::warn!(
                "⚠️ Model '{}' uses {}, its properties are ignored",
                model.name,
                model.method
            );
        }

        if model.is_template() && model.properties.is_none() {
            return Err(UiError::ConfigValidationError {
                field: format!("models.{}.template", model.name),
                message: "A template model needs properties".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for ModelsConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("document.name", &self.document.name)?;

        let mut seen = HashSet::new();
        for model in &self.models {
            self.validate_model(model)?;
            if !seen.insert(model.name.as_str()) {
                tracing::warn!(
                    "⚠️ Model '{}' is defined more than once, the first definition is used",
                    model.name
                );
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if !seen.contains(step.model.as_str()) {
                return Err(UiError::ConfigValidationError {
                    field: format!("steps[{}].model", index),
                    message: format!("Model '{}' is not defined in models", step.model),
                });
            }
            step.target_path()?;
        }

        Ok(())
    }
}
