//! # Images 模块
//!
//! 把场景中的图片路径解码为 [`ImageRef`] 并按路径缓存。
//!
//! 同一路径只解码一次，后续返回共享同一位图的引用。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use marker_runtime::ImageRef;
use thiserror::Error;
use tracing::debug;

/// 占位位图边长
pub const PLACEHOLDER_SIZE: u32 = 16;

/// 图片加载错误
#[derive(Error, Debug)]
pub enum ImageLoadError {
    /// 文件读取失败
    #[error("无法读取图片 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解码失败
    #[error("无法解码图片 {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// 图片加载器
#[derive(Debug)]
pub struct ImageLoader {
    /// 相对路径的根目录
    root: PathBuf,
    /// 占位模式：不访问文件系统
    placeholder: bool,
    /// 已解码的图片（解析后的路径 -> 位图）
    cache: HashMap<PathBuf, ImageRef>,
}

impl ImageLoader {
    /// 从文件系统加载
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            placeholder: false,
            cache: HashMap::new(),
        }
    }

    /// 占位模式，所有路径都得到同一张占位位图
    pub fn placeholder() -> Self {
        Self {
            root: PathBuf::new(),
            placeholder: true,
            cache: HashMap::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// 解析图片路径（绝对路径原样返回）
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// 加载图片
    pub fn load(&mut self, path: &str) -> Result<ImageRef, ImageLoadError> {
        let key = if self.placeholder {
            PathBuf::new()
        } else {
            self.resolve(path)
        };
        if let Some(image) = self.cache.get(&key) {
            return Ok(image.clone());
        }

        let image = if self.placeholder {
            ImageRef::new(RgbaImage::from_pixel(
                PLACEHOLDER_SIZE,
                PLACEHOLDER_SIZE,
                Rgba([255, 0, 255, 255]),
            ))
        } else {
            decode(&key)?
        };
        debug!(path = ?key, width = image.width(), height = image.height(), "图片已加载");
        self.cache.insert(key, image.clone());
        Ok(image)
    }

    /// 已缓存的图片数量
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn decode(path: &Path) -> Result<ImageRef, ImageLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageRef::new(decoded.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("pin.png"))
            .unwrap();

        let mut loader = ImageLoader::new(dir.path());
        let first = loader.load("pin.png").unwrap();
        assert_eq!((first.width(), first.height()), (3, 2));

        let second = loader.load("pin.png").unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn test_missing_and_broken() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut loader = ImageLoader::new(dir.path());
        assert!(matches!(
            loader.load("missing.png"),
            Err(ImageLoadError::Io { .. })
        ));
        assert!(matches!(
            loader.load("broken.png"),
            Err(ImageLoadError::Decode { .. })
        ));
        assert!(loader.is_empty());
    }

    #[test]
    fn test_placeholder() {
        let mut loader = ImageLoader::placeholder();
        let a = loader.load("a.png").unwrap();
        let b = loader.load("b/c.png").unwrap();
        assert_eq!(a.width(), PLACEHOLDER_SIZE);
        assert_eq!(a, b);
    }
}
