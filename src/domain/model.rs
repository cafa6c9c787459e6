use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use crate::utils::error::UiError;

/// 由 builder 處理、不會被當作欄位指派的鍵
pub const RESERVED_KEYS: [&str; 2] = ["tagName", "children"];

/// 節點的純資料描述 (遞迴)
///
/// `tagName` 與 `children` 之外的每個鍵都會被「直接指派」到產生的節點欄位上，
/// 而不是序列化成 markup attribute。欄位順序即插入順序。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyTree {
    #[serde(rename = "tagName", default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PropertyTree>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PropertyTree {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: Some(tag_name.into()),
            ..Self::default()
        }
    }

    /// 沒有 tagName 的樹，只適合 updateElement
    pub fn fields_only() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn child(mut self, child: PropertyTree) -> Self {
        self.children.push(child);
        self
    }

    /// 從 JSON 值解析，例如 `json!({"tagName": "div", "children": [...]})`
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// 會被指派到節點上的欄位 (排除保留鍵)
    pub fn assignable_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
    }

    /// 樹中節點總數 (含自己)
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(PropertyTree::node_count).sum::<usize>()
    }
}

/// Model 對目標位置執行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    AppendChild,
    InsertBefore,
    RemoveElement,
    UpdateElement,
    ReplaceElement,
    WrapElement,
    ClearListeners,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::AppendChild,
        Method::InsertBefore,
        Method::RemoveElement,
        Method::UpdateElement,
        Method::ReplaceElement,
        Method::WrapElement,
        Method::ClearListeners,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::AppendChild => "appendChild",
            Method::InsertBefore => "insertBefore",
            Method::RemoveElement => "removeElement",
            Method::UpdateElement => "updateElement",
            Method::ReplaceElement => "replaceElement",
            Method::WrapElement => "wrapElement",
            Method::ClearListeners => "clearListeners",
        }
    }

    /// 需要先建立新節點的操作
    pub fn creates_node(&self) -> bool {
        matches!(
            self,
            Method::AppendChild | Method::InsertBefore | Method::ReplaceElement | Method::WrapElement
        )
    }

    /// 需要讀取 properties 的操作
    pub fn uses_properties(&self) -> bool {
        self.creates_node() || *self == Method::UpdateElement
    }

    /// 需要目標節點有 parent 的操作
    pub fn requires_parent(&self) -> bool {
        !matches!(self, Method::AppendChild | Method::UpdateElement)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UiError::InvalidConfigValueError {
                field: "method".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown method. Valid methods: {}",
                    Method::ALL.map(|m| m.as_str()).join(", ")
                ),
            })
    }
}

/// 資料回呼：依 render 的 data 計算 properties
pub type ResolveFn =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, anyhow::Result<PropertyTree>> + Send + Sync>;

/// Model 的 properties 來源，在建立 model 時就決定
#[derive(Clone)]
pub enum PropertySource {
    Static(Arc<PropertyTree>),
    Computed(ResolveFn),
    Empty,
}

impl fmt::Debug for PropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertySource::Static(tree) => f.debug_tuple("Static").field(tree).finish(),
            PropertySource::Computed(_) => f.write_str("Computed(..)"),
            PropertySource::Empty => f.write_str("Empty"),
        }
    }
}

/// 具名、可重複使用的 render / mutation 描述
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub method: Method,
    pub source: PropertySource,
}

impl Model {
    pub fn new(name: impl Into<String>, method: Method, properties: PropertyTree) -> Self {
        Self {
            name: name.into(),
            method,
            source: PropertySource::Static(Arc::new(properties)),
        }
    }

    /// 由同步回呼計算 properties 的 model
    pub fn computed<F>(name: impl Into<String>, method: Method, callback: F) -> Self
    where
        F: Fn(Option<Value>) -> anyhow::Result<PropertyTree> + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        Self::computed_async(name, method, move |data| {
            let callback = Arc::clone(&callback);
            async move { callback(data) }
        })
    }

    /// 由非同步回呼計算 properties 的 model
    pub fn computed_async<F, Fut>(name: impl Into<String>, method: Method, callback: F) -> Self
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PropertyTree>> + Send + 'static,
    {
        let resolve: ResolveFn = Arc::new(move |data| callback(data).boxed());
        Self {
            name: name.into(),
            method,
            source: PropertySource::Computed(resolve),
        }
    }

    /// 不帶 properties 的 model (removeElement / clearListeners)
    pub fn structural(name: impl Into<String>, method: Method) -> Self {
        Self {
            name: name.into(),
            method,
            source: PropertySource::Empty,
        }
    }
}
