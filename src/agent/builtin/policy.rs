use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    ExpandOperations,
    ReduceCosts,
    MaintainStrategy,
}

impl Decision {
    /// 先匹配者优先：`increasing` 先于 `decreasing` 检查
    pub fn from_analysis(content: &str) -> Self {
        if content.contains("increasing") {
            Decision::ExpandOperations
        } else if content.contains("decreasing") {
            Decision::ReduceCosts
        } else {
            Decision::MaintainStrategy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::ExpandOperations => "Expand operations",
            Decision::ReduceCosts => "Reduce costs",
            Decision::MaintainStrategy => "Maintain current strategy",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
