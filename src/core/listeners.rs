use crate::utils::error::{CallbackStage, Result, UiError};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// announce 的範圍識別 (opaque identity)
///
/// 每次 `Context::new()` 都是新的身分；複製出來的值共用同一個身分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context(u64);

impl Context {
    pub fn new() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

pub type ListenerFn<C> =
    Arc<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct ListenerRecord<C> {
    context: Context,
    title: String,
    callback: ListenerFn<C>,
}

/// `listen` 回傳的 handle，移除時以記錄本身的身分比對
pub struct ListenerHandle<C = Value> {
    record: Arc<ListenerRecord<C>>,
}

impl<C> ListenerHandle<C> {
    pub fn context(&self) -> Context {
        self.record.context
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }
}

impl<C> Clone for ListenerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
        }
    }
}

impl<C> fmt::Debug for ListenerHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("context", &self.record.context)
            .field("title", &self.record.title)
            .finish()
    }
}

/// 以 (context, title) 為鍵的 listener 集合
///
/// `announce` 依註冊順序逐一 await 每個符合的回呼，不會並行。回呼裡可以再呼叫
/// `announce`，巢狀的 announce 會完整執行完 (depth-first) 才輪到下一個 listener。
pub struct ListenerBus<C = Value> {
    listeners: Arc<RwLock<Vec<Arc<ListenerRecord<C>>>>>,
}

impl<C> Clone for ListenerBus<C> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<C> Default for ListenerBus<C> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<C> fmt::Debug for ListenerBus<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBus")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl<C: Clone + Send + 'static> ListenerBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F, Fut>(
        &self,
        context: Context,
        title: impl Into<String>,
        callback: F,
    ) -> ListenerHandle<C>
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let record = Arc::new(ListenerRecord {
            context,
            title: title.into(),
            callback: Arc::new(move |content| callback(content).boxed()),
        });
        tracing::debug!("👂 Listening to '{}' on {:?}", record.title, context);
        self.listeners.write().push(Arc::clone(&record));
        ListenerHandle { record }
    }

    /// 移除 listener；找不到時什麼都不做，回傳 false
    pub fn remove_listener(&self, handle: &ListenerHandle<C>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|record| !Arc::ptr_eq(record, &handle.record));
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!("🔇 Removed listener '{}'", handle.record.title);
        }
        removed
    }

    /// 廣播給所有 (context, title) 完全相符的 listener，回傳被呼叫的數量
    ///
    /// 符合的 listener 在開始時取快照；第一個失敗的回呼會中止這次廣播。
    pub async fn announce(&self, context: Context, title: &str, content: C) -> Result<usize> {
        let matching: Vec<Arc<ListenerRecord<C>>> = self
            .listeners
            .read()
            .iter()
            .filter(|record| record.context == context && record.title == title)
            .cloned()
            .collect();

        tracing::debug!(
            "📣 Announcing '{}' on {:?} to {} listeners",
            title,
            context,
            matching.len()
        );

        for record in &matching {
            (record.callback)(content.clone())
                .await
                .map_err(|e| UiError::callback(CallbackStage::Listener, title, e))?;
        }

        Ok(matching.len())
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}
