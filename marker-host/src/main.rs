//! Marker Host 命令行入口
//!
//! 回放场景文件并把帧快照以 JSON 行的形式写到 stdout。

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use marker_host::{HostConfig, Replayer, Scene, image_loader_for, logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "marker-host", about = "回放标记场景并输出帧快照")]
struct Cli {
    /// 场景文件 (JSON)
    scene: PathBuf,

    /// 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的帧率
    #[arg(long)]
    frame_rate: Option<u32>,

    /// 覆盖配置中的日志过滤规则
    #[arg(long)]
    log: Option<String>,

    /// 图片使用占位位图
    #[arg(long)]
    placeholder_images: bool,

    /// 输出每一帧的快照（默认只输出最后一帧）
    #[arg(long)]
    every_frame: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HostConfig::read(path)
            .with_context(|| format!("无法加载配置 {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(frame_rate) = cli.frame_rate {
        config.frame_rate = frame_rate;
    }
    if let Some(filter) = cli.log {
        config.log_filter = filter;
    }
    if cli.placeholder_images {
        config.images.placeholder = true;
    }
    config.validate()?;

    logging::init(&config.log_filter)?;

    let scene = Scene::read(&cli.scene)?;
    let mut replayer = Replayer::new(&config, image_loader_for(&config, &cli.scene));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let report = replayer.run(&scene, |snapshot| {
        if cli.every_frame && write_error.is_none() {
            let line = serde_json::to_string(snapshot).map_err(anyhow::Error::from);
            if let Err(e) = line.and_then(|l| writeln!(out, "{l}").map_err(Into::into)) {
                write_error = Some(e);
            }
        }
    });
    if let Some(e) = write_error {
        return Err(e.context("写出帧快照失败"));
    }
    if !cli.every_frame {
        serde_json::to_writer(&mut out, &replayer.snapshot())?;
        writeln!(out)?;
    }

    info!(
        ops = report.ops,
        frames = report.frames,
        failures = report.failures.len(),
        "回放结束"
    );
    if !report.matches(&scene) {
        bail!(
            "场景预期 {} 个失败操作，实际 {} 个: {:?}",
            scene.expect_failures,
            report.failures.len(),
            report.failures
        );
    }
    Ok(())
}
