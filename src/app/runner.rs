use crate::adapters::MemoryTree;
use crate::config::toml_config::{ModelsConfig, RenderStep};
use crate::core::render::{RenderEngine, RenderParams};
use crate::utils::error::Result;
use std::sync::Arc;

/// 把 model 檔的步驟套用到一份記憶體中的 document
pub struct DocumentRunner {
    config: ModelsConfig,
    engine: RenderEngine<MemoryTree>,
}

impl DocumentRunner {
    pub fn new(config: ModelsConfig) -> Result<Self> {
        let engine = RenderEngine::new(Arc::new(MemoryTree::new()));
        let count = config.register_into(engine.registry())?;
        tracing::debug!("📝 Registered {} models from '{}'", count, config.document.name);
        Ok(Self { config, engine })
    }

    /// 讓呼叫端在 run 之前加上 binding 或更多 model
    pub fn engine(&self) -> &RenderEngine<MemoryTree> {
        &self.engine
    }

    pub async fn run_step(&self, step: &RenderStep) -> Result<()> {
        let host = self.engine.host();
        let target = host.node_at_path(&host.document(), &step.target_path()?)?;

        let mut params = RenderParams::new(target).with_binding_args(step.binding_args.clone());
        if let Some(data) = &step.data {
            params = params.with_data(data.clone());
        }

        self.engine.render(&step.model, params).await?;
        Ok(())
    }

    /// 依序執行所有步驟，回傳 document 的 inner HTML
    pub async fn run(&self) -> Result<String> {
        tracing::info!(
            "🚀 Rendering '{}' ({} steps)",
            self.config.document.name,
            self.config.steps.len()
        );

        for (index, step) in self.config.steps.iter().enumerate() {
            tracing::info!(
                "🎨 Step {}/{}: {} -> '{}'",
                index + 1,
                self.config.steps.len(),
                step.model,
                step.target
            );
            self.run_step(step).await?;
        }

        let host = self.engine.host();
        let html = host.inner_html(&host.document())?;
        tracing::info!("✅ Rendered {} bytes of markup", html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_steps_in_order() {
        let config = ModelsConfig::from_toml_str(
            r#"
[document]
name = "list"

[[models]]
name = "list"
method = "appendChild"
[models.properties]
tagName = "ul"

[[models]]
name = "item"
method = "appendChild"
template = true
[models.properties]
tagName = "li"
textContent = "{{label}}"

[[models]]
name = "second"
method = "insertBefore"
[models.properties]
tagName = "li"
textContent = "Second element"

[[steps]]
model = "list"

[[steps]]
model = "item"
target = "0"
data = { label = "First element" }

[[steps]]
model = "item"
target = "0"
data = { label = "Third element" }

[[steps]]
model = "second"
target = "0/1"
"#,
        )
        .unwrap();

        let runner = DocumentRunner::new(config).unwrap();
        let html = runner.run().await.unwrap();

        assert_eq!(
            html,
            "<ul><li>First element</li><li>Second element</li><li>Third element</li></ul>"
        );
    }

    #[tokio::test]
    async fn test_bad_target_path_aborts() {
        let config = ModelsConfig::from_toml_str(
            r#"
[document]
name = "broken"

[[models]]
name = "gone"
method = "removeElement"

[[steps]]
model = "gone"
target = "3"
"#,
        )
        .unwrap();

        let runner = DocumentRunner::new(config).unwrap();
        assert!(runner.run().await.is_err());
    }
}
