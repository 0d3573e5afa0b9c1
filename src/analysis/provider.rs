use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentMeshError, Result};

use super::source::DynDataSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendLabel {
    pub const ALL: [TrendLabel; 3] = [
        TrendLabel::Increasing,
        TrendLabel::Decreasing,
        TrendLabel::Stable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Increasing => "increasing",
            TrendLabel::Decreasing => "decreasing",
            TrendLabel::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 趋势分析能力
///
/// 在 `DataAnalyst::handle` 中同步调用，应尽快返回；重试逻辑属于实现方。
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn classify(&self, dataset: &str) -> Result<TrendLabel>;
}

pub type DynAnalysisProvider = Arc<dyn AnalysisProvider>;

/// 在三种趋势中均匀随机选择
pub struct RandomTrendProvider {
    rng: Mutex<StdRng>,
}

impl RandomTrendProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomTrendProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProvider for RandomTrendProvider {
    async fn classify(&self, _dataset: &str) -> Result<TrendLabel> {
        let mut rng = self.rng.lock();
        TrendLabel::ALL
            .choose(&mut *rng)
            .copied()
            .ok_or_else(|| AgentMeshError::Analysis("no trend labels to choose from".into()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTrendProvider(pub TrendLabel);

#[async_trait]
impl AnalysisProvider for FixedTrendProvider {
    async fn classify(&self, _dataset: &str) -> Result<TrendLabel> {
        Ok(self.0)
    }
}

/// 基于数据序列最小二乘斜率的趋势分类
pub struct SeriesTrendProvider {
    source: DynDataSource,
    tolerance: f64,
}

impl SeriesTrendProvider {
    pub const DEFAULT_TOLERANCE: f64 = 0.01;

    pub fn new(source: DynDataSource) -> Self {
        Self {
            source,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }
}

#[async_trait]
impl AnalysisProvider for SeriesTrendProvider {
    async fn classify(&self, dataset: &str) -> Result<TrendLabel> {
        let series = self.source.fetch(dataset).await?;
        let slope = relative_slope(&series)?;
        debug!(dataset, slope, "series slope computed");
        let label = if slope > self.tolerance {
            TrendLabel::Increasing
        } else if slope < -self.tolerance {
            TrendLabel::Decreasing
        } else {
            TrendLabel::Stable
        };
        Ok(label)
    }
}

/// 最小二乘斜率除以序列均值的绝对值
///
/// 容差因此表示“每步相对均值的变化比例”。
fn relative_slope(series: &[f64]) -> Result<f64> {
    if series.len() < 2 {
        return Err(AgentMeshError::Analysis(format!(
            "need at least 2 points to fit a trend, got {}",
            series.len()
        )));
    }
    let n = series.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / n;
    let (mut covariance, mut variance) = (0.0, 0.0);
    for (index, value) in series.iter().enumerate() {
        let dx = index as f64 - mean_x;
        covariance += dx * (value - mean_y);
        variance += dx * dx;
    }
    let slope = covariance / variance;
    if mean_y.abs() < f64::EPSILON {
        return Ok(slope);
    }
    Ok(slope / mean_y.abs())
}
