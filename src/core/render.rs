use crate::core::builder::NodeBuilder;
use crate::core::registry::{resolve_source, ModelRegistry};
use crate::domain::model::{Method, Model, PropertyTree};
use crate::domain::ports::HostTree;
use crate::utils::error::{CallbackStage, Result, UiError};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// 單次 render 的參數
#[derive(Debug, Clone)]
pub struct RenderParams<N> {
    /// 傳給 computed model 回呼的資料
    pub data: Option<Value>,
    /// 目標節點；appendChild 時是未來的父節點
    pub target: N,
    /// 接在新節點之後傳給 binding 的參數
    pub binding_args: Vec<Value>,
}

impl<N> RenderParams<N> {
    pub fn new(target: N) -> Self {
        Self {
            data: None,
            target,
            binding_args: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_binding_args(mut self, args: Vec<Value>) -> Self {
        self.binding_args = args;
        self
    }
}

/// 依 model 對宿主樹執行 mutation
///
/// 每次 render 都是直接、無條件地修改樹，不做 diff。建立節點的操作
/// (appendChild / insertBefore / replaceElement / wrapElement) 每次都從
/// PropertyTree 完整重建節點。
pub struct RenderEngine<H: HostTree> {
    host: Arc<H>,
    registry: ModelRegistry<H::Node>,
    builder: NodeBuilder<H>,
}

impl<H: HostTree> Clone for RenderEngine<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            registry: self.registry.clone(),
            builder: self.builder.clone(),
        }
    }
}

impl<H: HostTree> RenderEngine<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self::with_registry(host, ModelRegistry::new())
    }

    pub fn with_registry(host: Arc<H>, registry: ModelRegistry<H::Node>) -> Self {
        Self {
            builder: NodeBuilder::new(Arc::clone(&host)),
            host,
            registry,
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn registry(&self) -> &ModelRegistry<H::Node> {
        &self.registry
    }

    pub fn builder(&self) -> &NodeBuilder<H> {
        &self.builder
    }

    pub fn register(&self, model: Model) {
        self.registry.register(model);
    }

    pub fn bind<F, Fut>(&self, name: &str, callback: F) -> Result<()>
    where
        F: Fn(H::Node, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry.bind(name, callback)
    }

    pub async fn resolve_properties(
        &self,
        name: &str,
        data: Option<Value>,
    ) -> Result<Option<Arc<PropertyTree>>> {
        self.registry.resolve_properties(name, data).await
    }

    /// 執行名為 `name` 的 model，回傳新建立的節點 (若有)
    ///
    /// 失敗時不回滾：已完成的結構變更會保留。
    pub async fn render(&self, name: &str, params: RenderParams<H::Node>) -> Result<Option<H::Node>> {
        let entry = self.registry.lookup(name)?;
        let method = entry.model.method;
        tracing::debug!("🎨 Rendering model '{}' with {}", name, method);

        let RenderParams {
            data,
            target,
            binding_args,
        } = params;

        // 資料回呼不分 method 都會執行，失敗時中止 render
        let properties = resolve_source(&entry.model, data).await?;

        let node = if method.creates_node() {
            let properties = properties.as_deref().ok_or_else(|| UiError::MissingProperties {
                name: name.to_string(),
            })?;
            Some(self.builder.build(properties).await?)
        } else {
            None
        };

        match (method, &node) {
            (Method::AppendChild, Some(node)) => self.host.append_child(&target, node)?,
            (Method::InsertBefore, Some(node)) => {
                let parent = self.parent_of(&target, method)?;
                self.host.insert_before(&parent, node, &target)?;
            }
            (Method::ReplaceElement, Some(node)) => {
                let parent = self.parent_of(&target, method)?;
                self.host.replace_child(&parent, node, &target)?;
            }
            (Method::WrapElement, Some(node)) => {
                let parent = self.parent_of(&target, method)?;
                let copy = self.host.clone_node(&target)?;
                self.host.append_child(node, &copy)?;
                self.host.replace_child(&parent, node, &target)?;
            }
            (Method::RemoveElement, _) => {
                let parent = self.parent_of(&target, method)?;
                self.host.remove_child(&parent, &target)?;
            }
            (Method::ClearListeners, _) => {
                let parent = self.parent_of(&target, method)?;
                let copy = self.host.clone_node(&target)?;
                self.host.replace_child(&parent, &copy, &target)?;
            }
            (Method::UpdateElement, _) => {
                if let Some(properties) = &properties {
                    for (key, value) in properties.assignable_fields() {
                        self.host.set_field(&target, key, value)?;
                    }
                }
            }
            (method, None) => {
                return Err(UiError::HostError {
                    message: format!("{} produced no node for model '{}'", method, name),
                });
            }
        }

        if let (Some(node), Some(binding)) = (&node, &entry.binding) {
            tracing::debug!("🔗 Running binding of model '{}'", binding.name);
            (binding.callback)(node.clone(), binding_args)
                .await
                .map_err(|e| UiError::callback(CallbackStage::Binding, &binding.name, e))?;
        }

        Ok(node)
    }

    fn parent_of(&self, target: &H::Node, method: Method) -> Result<H::Node> {
        self.host.parent(target).ok_or_else(|| UiError::MissingParent {
            method: method.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryTree, NodeId};
    use serde_json::json;

    fn engine() -> RenderEngine<MemoryTree> {
        RenderEngine::new(Arc::new(MemoryTree::new()))
    }

    #[tokio::test]
    async fn test_append_child_returns_built_node() {
        let engine = engine();
        engine.register(Model::new(
            "simplemodel",
            Method::AppendChild,
            PropertyTree::new("div")
                .field("className", "simplemodel")
                .field("id", "simplemodel")
                .field("textContent", "My first simple model"),
        ));

        let body = engine.host().document();
        let node = engine
            .render("simplemodel", RenderParams::new(body))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(engine.host().parent(&node), Some(body));
        assert_eq!(
            engine.host().inner_html(&body).unwrap(),
            r#"<div class="simplemodel" id="simplemodel">My first simple model</div>"#
        );
    }

    #[tokio::test]
    async fn test_structural_methods_need_parent() {
        let engine = engine();
        engine.register(Model::structural("remove", Method::RemoveElement));
        engine.register(Model::structural("clear", Method::ClearListeners));
        engine.register(Model::new("wrap", Method::WrapElement, PropertyTree::new("div")));

        let detached: NodeId = engine.host().create_node("p").unwrap();
        for name in ["remove", "clear", "wrap"] {
            let result = engine.render(name, RenderParams::new(detached)).await;
            assert!(
                matches!(result, Err(UiError::MissingParent { .. })),
                "{} should require a parent",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_creating_method_without_properties() {
        let engine = engine();
        engine.register(Model::structural("empty", Method::AppendChild));

        let body = engine.host().document();
        let result = engine.render("empty", RenderParams::new(body)).await;
        assert!(matches!(result, Err(UiError::MissingProperties { name }) if name == "empty"));
        assert_eq!(engine.host().inner_html(&body).unwrap(), "");
    }

    #[tokio::test]
    async fn test_update_element_does_not_build_or_bind() {
        let engine = engine();
        engine.register(Model::new(
            "update",
            Method::UpdateElement,
            PropertyTree::fields_only().field("textContent", "Published 02/06/2019"),
        ));
        engine
            .bind("update", |_node, _args| async {
                Err::<(), _>(anyhow::anyhow!("update never runs its binding"))
            })
            .unwrap();

        let body = engine.host().document();
        let p = engine.host().create_node("p").unwrap();
        engine.host().set_field(&p, "textContent", &json!("Published 01/01/1900")).unwrap();
        engine.host().append_child(&body, &p).unwrap();

        let node = engine.render("update", RenderParams::new(p)).await.unwrap();
        assert!(node.is_none());
        assert_eq!(
            engine.host().inner_html(&body).unwrap(),
            "<p>Published 02/06/2019</p>"
        );
    }
}
