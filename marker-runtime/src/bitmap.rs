//! # Bitmap 模块
//!
//! 已解码位图的共享引用。标记系统从不解码图片，解码由宿主完成。

use std::sync::Arc;

use image::RgbaImage;

/// 位图引用
///
/// 克隆只增加引用计数，相等比较按同一份位图判断。
#[derive(Clone)]
pub struct ImageRef {
    bitmap: Arc<RgbaImage>,
}

impl ImageRef {
    /// 包装已解码的 RGBA8 位图
    pub fn new(bitmap: RgbaImage) -> Self {
        Self {
            bitmap: Arc::new(bitmap),
        }
    }

    /// 包装已共享的位图
    pub fn from_shared(bitmap: Arc<RgbaImage>) -> Self {
        Self { bitmap }
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// 位图数据
    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageRef({}x{})", self.width(), self.height())
    }
}
