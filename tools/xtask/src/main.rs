//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 marker-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `scene-check`: 回放场景文件，检查失败操作数量是否符合预期

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use marker_host::{HostConfig, ImageLoader, Replayer, Scene, image_loader_for};
use marker_runtime::MarkerEvent;
use walkdir::WalkDir;
use xshell::{Shell, cmd};

/// 默认场景目录（相对于 workspace root）
const DEFAULT_SCENES_DIR: &str = "marker-host/scenes";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 运行 marker-runtime 覆盖率报告
    CovRuntime,

    /// 运行 workspace 覆盖率报告
    CovWorkspace,

    /// 回放场景文件
    ///
    /// 不带参数时检查 marker-host/scenes/ 下所有 .json 文件。
    SceneCheck {
        /// 场景文件或目录
        path: Option<PathBuf>,

        /// 读取真实图片（默认使用占位位图）
        #[arg(long)]
        images: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::CheckAll => {
            step("cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            step("cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            step("cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Commands::CovRuntime => {
            ensure_cargo_llvm_cov_available(&sh)?;

            step("cargo llvm-cov -p marker-runtime --html");
            cmd!(sh, "cargo llvm-cov -p marker-runtime --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::CovWorkspace => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，避免工具代码稀释覆盖率
            step("cargo llvm-cov --workspace --exclude xtask --html");
            cmd!(sh, "cargo llvm-cov --workspace --exclude xtask --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::SceneCheck { path, images } => {
            scene_check(path.as_deref(), images)?;
        }
    }

    Ok(())
}

fn step(name: &str) {
    eprintln!("\n==> {name}");
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

//=============================================================================
// scene-check 命令实现
//=============================================================================

/// 单个场景的检查结果
struct SceneOutcome {
    path: PathBuf,
    frames: u64,
    completed: usize,
    cancelled: usize,
    failures: usize,
    expected_failures: usize,
}

impl SceneOutcome {
    fn passed(&self) -> bool {
        self.failures == self.expected_failures
    }
}

/// 执行场景检查
fn scene_check(path: Option<&Path>, images: bool) -> anyhow::Result<()> {
    let root = path.unwrap_or(Path::new(DEFAULT_SCENES_DIR));
    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else if root.is_dir() {
        collect_scene_files(root)
    } else {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
            root.display()
        );
    };

    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 回放 {} 个场景文件...\n", files.len());

    let config = HostConfig::default();
    let mut outcomes = Vec::new();
    let mut read_errors = 0;
    for file in &files {
        let scene = match Scene::read(file) {
            Ok(scene) => scene,
            Err(e) => {
                eprintln!("[ERROR] {}: {e}", file.display());
                read_errors += 1;
                continue;
            }
        };

        let loader = if images {
            image_loader_for(&config, file)
        } else {
            ImageLoader::placeholder()
        };
        let mut replayer = Replayer::new(&config, loader);
        let report = replayer.run(&scene, |_| {});

        outcomes.push(SceneOutcome {
            path: file.clone(),
            frames: report.frames,
            completed: count_events(&report.events, |e| {
                matches!(e, MarkerEvent::TransitionCompleted(_))
            }),
            cancelled: count_events(&report.events, |e| {
                matches!(e, MarkerEvent::TransitionCancelled(_))
            }),
            failures: report.failures.len(),
            expected_failures: scene.expect_failures,
        });
    }

    print_outcomes(&outcomes, read_errors);

    if read_errors > 0 || outcomes.iter().any(|o| !o.passed()) {
        anyhow::bail!("场景检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有场景文件
fn collect_scene_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn count_events(events: &[MarkerEvent], pred: impl Fn(&MarkerEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

/// 输出检查结果
fn print_outcomes(outcomes: &[SceneOutcome], read_errors: usize) {
    eprintln!("─────────────────────────────────────────────────────");
    for o in outcomes {
        let mark = if o.passed() { "OK  " } else { "FAIL" };
        eprintln!(
            "[{mark}] {}: {} 帧, {} 个过渡完成, {} 个取消, 失败操作 {}/{}",
            o.path.display(),
            o.frames,
            o.completed,
            o.cancelled,
            o.failures,
            o.expected_failures
        );
    }

    let failed = outcomes.iter().filter(|o| !o.passed()).count() + read_errors;
    eprintln!();
    if failed > 0 {
        eprintln!("❌ {} 个场景未通过", failed);
    } else {
        eprintln!("✅ 检查通过，{} 个场景", outcomes.len());
    }
}
