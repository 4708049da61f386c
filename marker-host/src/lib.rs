//! # Marker Host
//!
//! 标记运行时的无窗口宿主：读取 JSON 场景，以固定帧率回放标记操作，
//! 并输出每帧的快照。
//!
//! ## 模块结构
//!
//! - [`config`]：宿主配置
//! - [`logging`]：tracing 初始化
//! - [`images`]：图片解码与缓存
//! - [`scene`]：场景解析与回放

pub mod config;
pub mod images;
pub mod logging;
pub mod scene;

pub use config::{HostConfig, ImageConfig};
pub use images::{ImageLoadError, ImageLoader};
pub use scene::{OpFailure, ReplayReport, Replayer, Scene, SceneError, SceneOp};

use std::path::Path;

/// 按配置为场景文件创建图片加载器
///
/// 未配置根目录时，相对路径以场景文件所在目录为准。
pub fn image_loader_for(config: &HostConfig, scene_path: &Path) -> ImageLoader {
    if config.images.placeholder {
        return ImageLoader::placeholder();
    }
    let root = config
        .images
        .root
        .clone()
        .or_else(|| scene_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    ImageLoader::new(root)
}
