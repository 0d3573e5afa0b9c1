// 外部分析能力边界

mod provider;
mod source;

pub use provider::{
    AnalysisProvider, DynAnalysisProvider, FixedTrendProvider, RandomTrendProvider,
    SeriesTrendProvider, TrendLabel,
};
pub use source::{DataSource, DynDataSource, FallbackDataSource, MockDataSource};
