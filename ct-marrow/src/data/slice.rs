//! 体数据水平切片视图与 QA 导出.

use super::HuWindow;
use crate::consts::mask;
use crate::Idx2d;
use image::ImageResult;
use ndarray::ArrayView2;
use std::ops::Index;
use std::path::Path;

/// 不可变、借用的二维水平强度切片.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtScan`].
    data: ArrayView2<'a, f32>,
}

/// 不可变、借用的二维水平掩膜切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于各掩膜类型.
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 获取给定位置 (高, 宽) 的强度值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 以 `window` 为灰度映射窗口, 将切片保存为 8-bit 灰度 png.
    /// 窗口外或非有限的强度值被映射为黑色.
    pub fn save_windowed<P: AsRef<Path>>(&self, path: P, window: &HuWindow) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.data.indexed_iter() {
            let gray = window.eval_gray(v).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

impl<'a> MaskSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, u8>) -> Self {
        Self { data }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 获取给定位置 (高, 宽) 的体素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 统计切片中前景像素的个数.
    #[inline]
    pub fn count_marrow(&self) -> usize {
        self.data.iter().filter(|p| mask::is_marrow(**p)).count()
    }

    /// 该切片是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(mask::is_background)
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }
}

/// 将切片以原始 (非可视化增强) 的方式导出为 png 的能力.
pub trait SliceWritePng {
    /// 将切片内容写入 `path` 指定的 png 文件.
    fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl SliceWritePng for MaskSlice<'_> {
    /// 前景像素写为白色, 背景像素写为黑色.
    fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.data.indexed_iter() {
            let gray = if mask::is_marrow(v) { u8::MAX } else { u8::MIN };
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_mask_slice_counts() {
        let mut m = Array2::<u8>::zeros((3, 5));
        m[(1, 2)] = 1;
        m[(2, 4)] = 1;

        let sli = MaskSlice::new(m.view());
        assert_eq!(sli.shape(), (3, 5));
        assert_eq!(sli.count_marrow(), 2);
        assert!(!sli.is_background());
        assert_eq!(sli.get((1, 2)), Some(&1));
        assert_eq!(sli.get((3, 0)), None);
    }

    #[test]
    fn test_empty_mask_slice_is_background() {
        let m = Array2::<u8>::zeros((2, 2));
        assert!(MaskSlice::new(m.view()).is_background());
    }
}
