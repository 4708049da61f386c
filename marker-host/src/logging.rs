//! # Logging 模块
//!
//! 初始化 tracing 订阅者。日志写到 stderr，stdout 留给帧快照输出。

use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// 覆盖配置中日志过滤规则的环境变量
pub const LOG_ENV: &str = "MARKER_LOG";

/// 安装全局订阅者
///
/// `MARKER_LOG` 存在时优先使用，否则使用 `default_filter`。
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("无效的日志过滤规则 '{default_filter}'"))?,
    };

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("日志订阅者已安装")?;
    Ok(())
}
