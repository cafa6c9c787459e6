use crate::domain::ports::HostTree;
use crate::utils::error::{Result, UiError};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const TEXT_CONTENT: &str = "textContent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

struct NodeData {
    kind: String,
    fields: Map<String, Value>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    subscriptions: Vec<(String, EventCallback)>,
}

impl NodeData {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            fields: Map::new(),
            children: Vec::new(),
            parent: None,
            subscriptions: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn get(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id.0).ok_or(UiError::UnknownNode { id: id.0 })
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(id.0).ok_or(UiError::UnknownNode { id: id.0 })
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    /// `ancestor` 是否為 `node` 本身或其祖先
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.get(id)?.parent;
        }
        Ok(false)
    }

    fn position_in(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.get(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| UiError::HostError {
                message: format!("{} is not a child of {}", child, parent),
            })
    }

    fn detach(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.get(node)?.parent {
            let index = self.position_in(parent, node)?;
            self.get_mut(parent)?.children.remove(index);
            self.get_mut(node)?.parent = None;
        }
        Ok(())
    }

    /// 把 `child` 移到 `parent` 的 `index` 位置 (None 代表最後)
    fn adopt(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<()> {
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(UiError::HostError {
                message: format!("cannot insert {} inside itself", child),
            });
        }
        self.detach(child)?;
        let children = &mut self.get_mut(parent)?.children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn deep_clone(&mut self, node: NodeId) -> Result<NodeId> {
        let source = self.get(node)?;
        let mut copy = NodeData::new(&source.kind);
        copy.fields = source.fields.clone();
        let children = source.children.clone();

        let id = self.alloc(copy);
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.get_mut(id)?.children.push(child_copy);
            self.get_mut(child_copy)?.parent = Some(id);
        }
        Ok(id)
    }

    fn write_html(&self, node: NodeId, out: &mut String) -> Result<()> {
        let data = self.get(node)?;
        out.push('<');
        out.push_str(&data.kind);
        for (key, value) in &data.fields {
            if key == TEXT_CONTENT {
                continue;
            }
            write_attribute(out, key, value);
        }
        out.push('>');
        self.write_inner_html(node, out)?;
        out.push_str("</");
        out.push_str(&data.kind);
        out.push('>');
        Ok(())
    }

    fn write_inner_html(&self, node: NodeId, out: &mut String) -> Result<()> {
        let data = self.get(node)?;
        if let Some(text) = data.fields.get(TEXT_CONTENT) {
            out.push_str(&escape(&value_text(text), false));
        }
        for child in &data.children {
            self.write_html(*child, out)?;
        }
        Ok(())
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn attribute_name(field: &str) -> &str {
    match field {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

fn write_attribute(out: &mut String, key: &str, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => {
            out.push(' ');
            out.push_str(attribute_name(key));
        }
        other => {
            out.push(' ');
            out.push_str(attribute_name(key));
            out.push_str("=\"");
            out.push_str(&escape(&value_text(other), true));
            out.push('"');
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// 以 arena 實作的節點樹，建立時就帶有一個 `body` 根節點
///
/// 欄位語意比照瀏覽器 DOM：設定 `textContent` 會移除所有子節點，`className`
/// 輸出為 `class`，事件訂閱不會被 `clone_node` 複製。
///
/// 節點只配置不回收：被移除或取代的節點仍留在 arena 中，直到整棵樹被 drop。
/// 適合測試與 CLI 這類短生命週期的 document。
pub struct MemoryTree {
    arena: Mutex<Arena>,
    document: NodeId,
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let document = arena.alloc(NodeData::new("body"));
        Self {
            arena: Mutex::new(arena),
            document,
        }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn add_event_listener<F>(&self, node: &NodeId, event: &str, callback: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut arena = self.arena.lock();
        arena
            .get_mut(*node)?
            .subscriptions
            .push((event.to_string(), Arc::new(callback)));
        Ok(())
    }

    /// 觸發節點上的事件，回傳被呼叫的訂閱數量
    pub fn dispatch_event(&self, node: &NodeId, event: &str) -> Result<usize> {
        let callbacks: Vec<EventCallback> = {
            let arena = self.arena.lock();
            arena
                .get(*node)?
                .subscriptions
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in &callbacks {
            callback();
        }
        Ok(callbacks.len())
    }

    pub fn children(&self, node: &NodeId) -> Result<Vec<NodeId>> {
        Ok(self.arena.lock().get(*node)?.children.clone())
    }

    pub fn kind(&self, node: &NodeId) -> Result<String> {
        Ok(self.arena.lock().get(*node)?.kind.clone())
    }

    pub fn field(&self, node: &NodeId, key: &str) -> Result<Option<Value>> {
        Ok(self.arena.lock().get(*node)?.fields.get(key).cloned())
    }

    /// 依子節點索引路徑找節點，空路徑代表 `root` 本身
    pub fn node_at_path(&self, root: &NodeId, path: &[usize]) -> Result<NodeId> {
        let arena = self.arena.lock();
        let mut current = *root;
        for (depth, index) in path.iter().enumerate() {
            current = *arena.get(current)?.children.get(*index).ok_or_else(|| {
                UiError::HostError {
                    message: format!(
                        "no child at index {} (depth {}) under {}",
                        index, depth, current
                    ),
                }
            })?;
        }
        Ok(current)
    }

    pub fn inner_html(&self, node: &NodeId) -> Result<String> {
        let mut out = String::new();
        self.arena.lock().write_inner_html(*node, &mut out)?;
        Ok(out)
    }

    pub fn outer_html(&self, node: &NodeId) -> Result<String> {
        let mut out = String::new();
        self.arena.lock().write_html(*node, &mut out)?;
        Ok(out)
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTree")
            .field("document", &self.document)
            .field("nodes", &self.arena.lock().nodes.len())
            .finish()
    }
}

impl HostTree for MemoryTree {
    type Node = NodeId;

    fn create_node(&self, kind: &str) -> Result<NodeId> {
        if kind.trim().is_empty() {
            return Err(UiError::HostError {
                message: "node kind cannot be empty".to_string(),
            });
        }
        Ok(self.arena.lock().alloc(NodeData::new(kind)))
    }

    fn set_field(&self, node: &NodeId, key: &str, value: &Value) -> Result<()> {
        let mut arena = self.arena.lock();
        if key == TEXT_CONTENT {
            let children = arena.get(*node)?.children.clone();
            for child in children {
                arena.detach(child)?;
            }
        }
        arena.get_mut(*node)?.fields.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        self.arena.lock().adopt(*parent, *child, None)
    }

    fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: &NodeId) -> Result<()> {
        if node == reference {
            return Ok(());
        }
        let mut arena = self.arena.lock();
        arena.position_in(*parent, *reference)?;
        if arena.is_inclusive_ancestor(*node, *parent)? {
            return Err(UiError::HostError {
                message: format!("cannot insert {} inside itself", node),
            });
        }
        arena.detach(*node)?;
        let index = arena.position_in(*parent, *reference)?;
        arena.adopt(*parent, *node, Some(index))
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        let mut arena = self.arena.lock();
        arena.position_in(*parent, *child)?;
        arena.detach(*child)
    }

    fn replace_child(&self, parent: &NodeId, new_node: &NodeId, old_node: &NodeId) -> Result<()> {
        if new_node == old_node {
            return Ok(());
        }
        let mut arena = self.arena.lock();
        arena.position_in(*parent, *old_node)?;
        if arena.is_inclusive_ancestor(*new_node, *parent)? {
            return Err(UiError::HostError {
                message: format!("cannot insert {} inside itself", new_node),
            });
        }
        arena.detach(*new_node)?;
        let index = arena.position_in(*parent, *old_node)?;
        arena.detach(*old_node)?;
        arena.adopt(*parent, *new_node, Some(index))
    }

    fn clone_node(&self, node: &NodeId) -> Result<NodeId> {
        self.arena.lock().deep_clone(*node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.lock().get(*node).ok().and_then(|data| data.parent)
    }
}
