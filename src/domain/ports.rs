use crate::utils::error::Result;
use serde_json::Value;
use std::fmt::Debug;

/// 宿主節點樹需要提供的最小能力集合
///
/// 節點是由宿主管理的 handle (類似 DOM 的 node reference)，所以所有操作都只需要 `&self`。
/// 操作是同步的，render engine 只在 builder 遞迴與回呼處 await。
pub trait HostTree: Send + Sync + 'static {
    type Node: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// 依種類 (tag) 建立一個尚未掛上樹的節點
    fn create_node(&self, kind: &str) -> Result<Self::Node>;

    /// 直接指派節點欄位 (欄位語意，不是 markup attribute)
    fn set_field(&self, node: &Self::Node, key: &str, value: &Value) -> Result<()>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    /// 把 `node` 插入到 `parent` 底下、`reference` 之前
    fn insert_before(
        &self,
        parent: &Self::Node,
        node: &Self::Node,
        reference: &Self::Node,
    ) -> Result<()>;

    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    /// 以 `new_node` 取代 `old_node`，位置不變
    fn replace_child(
        &self,
        parent: &Self::Node,
        new_node: &Self::Node,
        old_node: &Self::Node,
    ) -> Result<()>;

    /// 深層複製結構與欄位，不包含外部掛上的事件訂閱
    fn clone_node(&self, node: &Self::Node) -> Result<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
}
