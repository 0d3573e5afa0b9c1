use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AgentMeshError, Result};

/// 数据来源能力（例如分析型数据仓库）
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, dataset: &str) -> Result<Vec<f64>>;
}

pub type DynDataSource = Arc<dyn DataSource>;

/// 内存中的命名数据序列
#[derive(Clone, Default)]
pub struct MockDataSource {
    datasets: HashMap<String, Vec<f64>>,
    default_series: Option<Vec<f64>>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self {
            datasets: HashMap::new(),
            default_series: None,
        }
    }

    pub fn with_dataset(mut self, name: impl Into<String>, series: Vec<f64>) -> Self {
        self.datasets.insert(name.into(), series);
        self
    }

    /// 未单独配置的数据集名称统一返回该序列
    pub fn with_default_series(mut self, series: Vec<f64>) -> Self {
        self.default_series = Some(series);
        self
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch(&self, dataset: &str) -> Result<Vec<f64>> {
        self.datasets
            .get(dataset)
            .or(self.default_series.as_ref())
            .cloned()
            .ok_or_else(|| AgentMeshError::DataSource(format!("dataset `{dataset}` not found")))
    }
}

/// 主数据源失败时回退到 mock 数据
pub struct FallbackDataSource {
    primary: DynDataSource,
    fallback: DynDataSource,
}

impl FallbackDataSource {
    pub fn new(primary: DynDataSource, fallback: DynDataSource) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl DataSource for FallbackDataSource {
    async fn fetch(&self, dataset: &str) -> Result<Vec<f64>> {
        match self.primary.fetch(dataset).await {
            Ok(series) => Ok(series),
            Err(err) => {
                warn!(%err, dataset, "primary data source failed, using fallback");
                self.fallback.fetch(dataset).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl DataSource for Unreachable {
        async fn fetch(&self, _dataset: &str) -> Result<Vec<f64>> {
            Err(AgentMeshError::DataSource("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn fallback_serves_mock_series_when_primary_fails() {
        let mock = MockDataSource::new().with_dataset("revenue", vec![1.0, 2.0]);
        let source = FallbackDataSource::new(Arc::new(Unreachable), Arc::new(mock));
        assert_eq!(source.fetch("revenue").await.unwrap(), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn mock_uses_default_series_for_unknown_names() {
        let mock = MockDataSource::new().with_default_series(vec![3.0, 4.0]);
        assert_eq!(mock.fetch("anything").await.unwrap(), vec![3.0, 4.0]);
        assert!(MockDataSource::new().fetch("anything").await.is_err());
    }
}
