use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use ui_models::utils::validation::Validate;
use ui_models::{DocumentRunner, ModelsConfig, Result, UiError};

const CARD_MODELS: &str = r#"
[document]
name = "cards"
description = "Card layout rendered from a models file"

[[models]]
name = "card"
method = "appendChild"

[models.properties]
tagName = "div"
className = "card"

[[models.properties.children]]
tagName = "h2"
textContent = "Title"

[[models]]
name = "line"
method = "appendChild"
template = true

[models.properties]
tagName = "p"
className = "{{kind}}"
textContent = "{{user.name}} wrote {{count}} lines"

[[models]]
name = "highlight"
method = "updateElement"

[models.properties]
tagName = "ignored"
className = "card highlighted"
textContent = "Renamed"

[[models]]
name = "frame"
method = "wrapElement"

[models.properties]
tagName = "section"
id = "frame"

[[steps]]
model = "card"

[[steps]]
model = "line"
target = "0"
binding_args = ["first", 1]
data = { kind = "note", count = 3, user = { name = "Ada" } }

[[steps]]
model = "highlight"
target = "0/0"

[[steps]]
model = "frame"
target = "0"
"#;

fn write_models(dir: &TempDir, content: &str) -> Result<String> {
    let path = dir.path().join("models.toml");
    std::fs::write(&path, content)?;
    Ok(path.to_string_lossy().replace('\\', "/"))
}

/// 從檔案載入 model 並依步驟 render 出整份 markup
#[tokio::test]
async fn test_render_models_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_models(&temp_dir, CARD_MODELS)?;

    let config = ModelsConfig::from_file(&path)?;
    config.validate()?;
    assert_eq!(config.document.name, "cards");
    assert_eq!(config.steps.len(), 4);

    let runner = DocumentRunner::new(config)?;
    let html = runner.run().await?;

    assert_eq!(
        html,
        concat!(
            r#"<section id="frame">"#,
            r#"<div class="card"><h2 class="card highlighted">Renamed</h2>"#,
            r#"<p class="note">Ada wrote 3 lines</p></div>"#,
            "</section>"
        )
    );
    Ok(())
}

/// run 之前加上的 binding 會收到新節點與步驟中的 binding_args
#[tokio::test]
async fn test_binding_receives_step_args() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_models(&temp_dir, CARD_MODELS)?;
    let runner = DocumentRunner::new(ModelsConfig::from_file(&path)?)?;

    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let host = Arc::clone(runner.engine().host());
    runner.engine().bind("line", move |node, args| {
        let sink = Arc::clone(&sink);
        let host = Arc::clone(&host);
        async move {
            let text = host.field(&node, "textContent")?;
            let mut seen = sink.lock();
            seen.push(text.unwrap_or(Value::Null));
            seen.extend(args);
            anyhow::Ok(())
        }
    })?;

    runner.run().await?;

    assert_eq!(
        *seen.lock(),
        vec![json!("Ada wrote 3 lines"), json!("first"), json!(1)]
    );
    Ok(())
}

/// 模板缺少資料時，步驟以 Callback 錯誤中止
#[tokio::test]
async fn test_template_without_data_fails() -> Result<()> {
    let config = ModelsConfig::from_toml_str(
        r#"
[document]
name = "missing"

[[models]]
name = "line"
method = "appendChild"
template = true

[models.properties]
tagName = "p"
textContent = "{{text}}"

[[steps]]
model = "line"
"#,
    )?;
    config.validate()?;

    let runner = DocumentRunner::new(config)?;
    let result = runner.run().await;

    assert!(matches!(result, Err(UiError::Callback { .. })));
    let host = runner.engine().host();
    assert_eq!(host.inner_html(&host.document())?, "");
    Ok(())
}

#[test]
fn test_missing_models_file() {
    let result = ModelsConfig::from_file("/nonexistent/models.toml");
    assert!(matches!(result, Err(UiError::IoError(_))));
}
