use crate::domain::model::PropertyTree;
use crate::utils::error::{Result, UiError};
use regex::{Captures, Regex};
use serde_json::Value;

/// `{{key}}` / `{{user.name}}` 形式的佔位符
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}";

/// 以 render 資料填入 PropertyTree 字串欄位中的佔位符
#[derive(Debug, Clone)]
pub struct PropertyTemplate {
    tree: PropertyTree,
    placeholder: Regex,
}

impl PropertyTemplate {
    pub fn new(tree: PropertyTree) -> Result<Self> {
        let placeholder =
            Regex::new(PLACEHOLDER_PATTERN).map_err(|e| UiError::ConfigValidationError {
                field: "template".to_string(),
                message: format!("Invalid placeholder pattern: {}", e),
            })?;
        Ok(Self { tree, placeholder })
    }

    /// 模板中用到的所有鍵 (依出現順序，不重複)
    pub fn placeholders(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_keys(&self.tree, &mut keys);
        keys
    }

    fn collect_keys(&self, tree: &PropertyTree, keys: &mut Vec<String>) {
        let texts = tree
            .tag_name
            .iter()
            .map(String::as_str)
            .chain(tree.fields.values().filter_map(Value::as_str));
        for text in texts {
            for caps in self.placeholder.captures_iter(text) {
                let key = caps[1].to_string();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for child in &tree.children {
            self.collect_keys(child, keys);
        }
    }

    pub fn fill(&self, data: Option<&Value>) -> anyhow::Result<PropertyTree> {
        self.fill_tree(&self.tree, data)
    }

    fn fill_tree(&self, tree: &PropertyTree, data: Option<&Value>) -> anyhow::Result<PropertyTree> {
        let tag_name = match &tree.tag_name {
            Some(tag) => Some(self.fill_text(tag, data)?),
            None => None,
        };

        let mut fields = serde_json::Map::new();
        for (key, value) in &tree.fields {
            let filled = match value {
                Value::String(text) => self.fill_value(text, data)?,
                other => other.clone(),
            };
            fields.insert(key.clone(), filled);
        }

        let children = tree
            .children
            .iter()
            .map(|child| self.fill_tree(child, data))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(PropertyTree {
            tag_name,
            children,
            fields,
        })
    }

    /// 整個字串就是一個佔位符時保留原始 JSON 型別
    fn fill_value(&self, text: &str, data: Option<&Value>) -> anyhow::Result<Value> {
        if let Some(caps) = self.placeholder.captures(text) {
            if caps.get(0).is_some_and(|m| m.as_str() == text) {
                return Ok(lookup(data, &caps[1])?.clone());
            }
        }
        Ok(Value::String(self.fill_text(text, data)?))
    }

    fn fill_text(&self, text: &str, data: Option<&Value>) -> anyhow::Result<String> {
        let mut missing = None;
        let filled = self.placeholder.replace_all(text, |caps: &Captures| {
            match lookup(data, &caps[1]) {
                Ok(Value::String(s)) => s.clone(),
                Ok(Value::Null) => String::new(),
                Ok(other) => other.to_string(),
                Err(e) => {
                    missing.get_or_insert(e);
                    String::new()
                }
            }
        });

        match missing {
            Some(e) => Err(e),
            None => Ok(filled.into_owned()),
        }
    }
}

fn lookup<'a>(data: Option<&'a Value>, path: &str) -> anyhow::Result<&'a Value> {
    let mut current =
        data.ok_or_else(|| anyhow::anyhow!("Unresolved placeholder '{{{{{}}}}}': no data", path))?;
    for segment in path.split('.') {
        current = current.get(segment).ok_or_else(|| {
            anyhow::anyhow!("Unresolved placeholder '{{{{{}}}}}' in template data", path)
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> PropertyTemplate {
        PropertyTemplate::new(
            PropertyTree::from_value(json!({
                "tagName": "{{tag}}",
                "className": "{{className}}",
                "id": "simplemodel",
                "textContent": "My {{textContent}} model",
                "hidden": "{{flags.hidden}}",
                "children": [
                    {"tagName": "span", "textContent": "My {{ textContent }} model"}
                ]
            }))
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_fill_placeholders() {
        let data = json!({
            "tag": "p",
            "className": "callback",
            "textContent": "echo",
            "flags": {"hidden": false}
        });

        let tree = template().fill(Some(&data)).unwrap();

        assert_eq!(tree.tag_name.as_deref(), Some("p"));
        assert_eq!(tree.fields["className"], json!("callback"));
        assert_eq!(tree.fields["textContent"], json!("My echo model"));
        assert_eq!(tree.fields["hidden"], json!(false));
        assert_eq!(tree.children[0].fields["textContent"], json!("My echo model"));
    }

    #[test]
    fn test_placeholders_are_listed_once() {
        assert_eq!(
            template().placeholders(),
            vec!["tag", "className", "textContent", "flags.hidden"]
        );
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let err = template().fill(Some(&json!({"tag": "p"}))).unwrap_err();
        assert!(err.to_string().contains("className"));
        assert!(template().fill(None).is_err());
    }
}
