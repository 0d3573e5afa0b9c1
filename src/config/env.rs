use std::env;

use crate::error::{AgentMeshError, Result};

use super::orchestration::OrchestrationConfig;

pub const ROUNDS_VAR: &str = "AGENTMESH_ROUNDS";
pub const HANDLER_TIMEOUT_VAR: &str = "AGENTMESH_HANDLER_TIMEOUT_MS";
pub const DEBUG_VAR: &str = "AGENTMESH_DEBUG";

/// 环境变量配置
pub struct EnvConfig;

impl EnvConfig {
    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    /// 检查是否启用调试模式
    pub fn is_debug_mode() -> bool {
        env::var(DEBUG_VAR).is_ok()
    }

    /// 用环境变量覆盖 `rounds` 和 `handler_timeout_ms`
    pub fn apply(mut config: OrchestrationConfig) -> Result<OrchestrationConfig> {
        if let Some(rounds) = Self::parse_u64(ROUNDS_VAR)? {
            config.rounds = u32::try_from(rounds).map_err(|_| {
                AgentMeshError::Config(format!("{ROUNDS_VAR}={rounds} is out of range"))
            })?;
        }
        if let Some(limit) = Self::parse_u64(HANDLER_TIMEOUT_VAR)? {
            config.handler_timeout_ms = Some(limit);
        }
        Ok(config)
    }

    fn parse_u64(key: &str) -> Result<Option<u64>> {
        Self::get_env_optional(key)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    AgentMeshError::Config(format!(
                        "{key} must be a non-negative integer, got `{raw}`"
                    ))
                })
            })
            .transpose()
    }
}
