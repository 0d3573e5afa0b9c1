use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EnvConfig;

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// 支持通过环境变量配置：
    /// - RUST_LOG: 设置日志级别（error, warn, info, debug, trace）
    /// - AGENTMESH_DEBUG: 启用详细调试输出（每条路由、每次 drain）
    ///
    /// ```no_run
    /// use agentmesh::utils::LoggingConfig;
    ///
    /// LoggingConfig::init();
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if is_debug {
                    EnvFilter::new("agentmesh=debug,info")
                } else {
                    EnvFilter::new("agentmesh=info,warn")
                }
            }
        };

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug)
            .with_thread_ids(is_debug);

        // A second init (tests, embedding apps) keeps the first subscriber.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        if is_debug {
            tracing::debug!("debug logging enabled");
        }
    }

    /// 初始化日志系统（带自定义过滤器）
    pub fn init_with_filter(filter: &str) {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }

    pub fn is_debug() -> bool {
        EnvConfig::is_debug_mode()
    }
}
