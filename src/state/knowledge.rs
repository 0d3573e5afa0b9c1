use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Agent 的自由格式知识存储
///
/// 仅供 handler 读写（例如累积的 insights / decisions），不参与路由控制。
#[derive(Default)]
pub struct Knowledge {
    inner: RwLock<Map<String, Value>>,
}

impl Knowledge {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Map::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.write().insert(key.to_string(), value.into());
    }

    /// 向 `key` 下的数组追加元素，不存在时新建
    ///
    /// 已有的非数组值会被包装为数组的第一个元素。
    pub fn append(&self, key: &str, value: impl Into<Value>) {
        let mut guard = self.inner.write();
        let slot = guard
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            let previous = slot.take();
            *slot = Value::Array(vec![previous]);
        }
        if let Value::Array(items) = slot {
            items.push(value.into());
        }
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        self.inner
            .read()
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().clone()
    }
}
