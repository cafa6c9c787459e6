use crate::domain::model::{Model, PropertySource, PropertyTree};
use crate::utils::error::{CallbackStage, Result, UiError};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// render 後的回呼：第一個參數是新建立的節點，之後是 `binding_args`
pub type BindingFn<N> =
    Arc<dyn Fn(N, Vec<Value>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// 附加在 model 上的 binding
pub struct Binding<N> {
    pub name: String,
    pub callback: BindingFn<N>,
}

impl<N> Clone for Binding<N> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<N> fmt::Debug for Binding<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("name", &self.name).finish()
    }
}

/// 註冊表中的一筆 model
pub struct RegisteredModel<N> {
    pub model: Model,
    pub binding: Option<Binding<N>>,
}

impl<N> Clone for RegisteredModel<N> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<N> fmt::Debug for RegisteredModel<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("model", &self.model)
            .field("binding", &self.binding)
            .finish()
    }
}

/// Model 註冊表
///
/// 只能新增不能移除。名稱查詢採「第一筆符合者」：重複註冊同名 model 不會報錯，
/// 但 render / bind 永遠作用在最早註冊的那一筆。複製出來的 handle 共用同一份狀態。
pub struct ModelRegistry<N> {
    models: Arc<RwLock<Vec<RegisteredModel<N>>>>,
}

impl<N> Clone for ModelRegistry<N> {
    fn clone(&self) -> Self {
        Self {
            models: Arc::clone(&self.models),
        }
    }
}

impl<N> Default for ModelRegistry<N> {
    fn default() -> Self {
        Self {
            models: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<N> fmt::Debug for ModelRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}

impl<N> ModelRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, model: Model) {
        let mut models = self.models.write();
        if models.iter().any(|entry| entry.model.name == model.name) {
            tracing::warn!(
                "⚠️ Model '{}' is already registered, the first registration stays in effect",
                model.name
            );
        }
        tracing::debug!("📝 Registered model '{}' ({})", model.name, model.method);
        models.push(RegisteredModel {
            model,
            binding: None,
        });
    }

    /// 把回呼綁到第一個同名的 model 上；找不到 model 時回傳 `ModelNotFound`
    pub fn bind<F, Fut>(&self, name: &str, callback: F) -> Result<()>
    where
        F: Fn(N, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: BindingFn<N> = Arc::new(move |node, args| callback(node, args).boxed());

        let mut models = self.models.write();
        let entry = models
            .iter_mut()
            .find(|entry| entry.model.name == name)
            .ok_or_else(|| UiError::ModelNotFound {
                name: name.to_string(),
            })?;
        entry.binding = Some(Binding {
            name: name.to_string(),
            callback,
        });
        tracing::debug!("🔗 Bound callback to model '{}'", name);
        Ok(())
    }

    /// 取得第一筆同名 model 的快照 (clone 後就釋放鎖)
    pub fn lookup(&self, name: &str) -> Result<RegisteredModel<N>> {
        self.models
            .read()
            .iter()
            .find(|entry| entry.model.name == name)
            .cloned()
            .ok_or_else(|| UiError::ModelNotFound {
                name: name.to_string(),
            })
    }

    /// 取得 model 目前的 properties
    ///
    /// computed model 會以 `data` 呼叫回呼；static model 回傳共用的那一份樹 (不複製)；
    /// 沒有 properties 的 model 回傳 `None`。可用來把一個 model 組合成另一個 model 的子節點。
    pub async fn resolve_properties(
        &self,
        name: &str,
        data: Option<Value>,
    ) -> Result<Option<Arc<PropertyTree>>> {
        let entry = self.lookup(name)?;
        resolve_source(&entry.model, data).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.read().iter().any(|entry| entry.model.name == name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.models
            .read()
            .iter()
            .find(|entry| entry.model.name == name)
            .is_some_and(|entry| entry.binding.is_some())
    }

    pub fn names(&self) -> Vec<String> {
        self.models
            .read()
            .iter()
            .map(|entry| entry.model.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}

pub(crate) async fn resolve_source(
    model: &Model,
    data: Option<Value>,
) -> Result<Option<Arc<PropertyTree>>> {
    match &model.source {
        PropertySource::Computed(callback) => {
            let properties = callback(data)
                .await
                .map_err(|e| UiError::callback(CallbackStage::Resolve, &model.name, e))?;
            Ok(Some(Arc::new(properties)))
        }
        PropertySource::Static(properties) => Ok(Some(Arc::clone(properties))),
        PropertySource::Empty => Ok(None),
    }
}
