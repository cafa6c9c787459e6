use crate::domain::model::PropertyTree;
use crate::domain::ports::HostTree;
use crate::utils::error::{Result, UiError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// 把 PropertyTree 轉成宿主樹上的節點 (含所有子孫)
pub struct NodeBuilder<H: HostTree> {
    host: Arc<H>,
}

impl<H: HostTree> Clone for NodeBuilder<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H: HostTree> NodeBuilder<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// 遞迴建立節點
    ///
    /// 子節點依序、逐一建立，每個子節點完整建好後才 append 到父節點的最後。
    pub fn build<'a>(&'a self, properties: &'a PropertyTree) -> BoxFuture<'a, Result<H::Node>> {
        async move {
            let tag_name = properties
                .tag_name
                .as_deref()
                .ok_or(UiError::MissingTagName)?;

            let node = self.host.create_node(tag_name)?;
            for (key, value) in properties.assignable_fields() {
                self.host.set_field(&node, key, value)?;
            }

            for child in &properties.children {
                let child_node = self.build(child).await?;
                self.host.append_child(&node, &child_node)?;
            }

            tracing::trace!(
                "🧱 Built <{}> with {} children",
                tag_name,
                properties.children.len()
            );
            Ok(node)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryTree;
    use serde_json::json;

    fn builder() -> (Arc<MemoryTree>, NodeBuilder<MemoryTree>) {
        let host = Arc::new(MemoryTree::new());
        (Arc::clone(&host), NodeBuilder::new(host))
    }

    #[tokio::test]
    async fn test_build_without_children() {
        let (host, builder) = builder();
        let tree = PropertyTree::new("input")
            .field("name", "email")
            .field("value", "a@b.c");

        let node = builder.build(&tree).await.unwrap();

        assert!(host.children(&node).unwrap().is_empty());
        assert_eq!(host.field(&node, "name").unwrap(), Some(json!("email")));
        assert_eq!(host.field(&node, "value").unwrap(), Some(json!("a@b.c")));
        assert_eq!(host.parent(&node), None);
    }

    #[tokio::test]
    async fn test_build_nested_children_in_order() {
        let (host, builder) = builder();
        let tree = PropertyTree::from_value(json!({
            "tagName": "div",
            "className": "simplemodel",
            "textContent": "My first element",
            "children": [
                {
                    "tagName": "div",
                    "className": "child",
                    "textContent": "My first child",
                    "children": [
                        {"tagName": "div", "className": "child", "textContent": "My first child child"}
                    ]
                },
                {"tagName": "span"}
            ]
        }))
        .unwrap();

        let node = builder.build(&tree).await.unwrap();

        assert_eq!(
            host.outer_html(&node).unwrap(),
            concat!(
                r#"<div class="simplemodel">My first element"#,
                r#"<div class="child">My first child<div class="child">My first child child</div></div>"#,
                r#"<span></span></div>"#
            )
        );
        let children = host.children(&node).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(host.kind(&children[1]).unwrap(), "span");
    }

    #[tokio::test]
    async fn test_build_requires_tag_name() {
        let (_host, builder) = builder();
        let tree = PropertyTree::new("div").child(PropertyTree::fields_only().field("id", "x"));

        let result = builder.build(&tree).await;
        assert!(matches!(result, Err(UiError::MissingTagName)));
    }
}
