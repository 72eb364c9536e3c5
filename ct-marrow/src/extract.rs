//! 骨髓提取流水线: 阈值选择 -> 强度窗 -> 形态学精化.

use crate::consts::mask;
use crate::morph;
use crate::{BoneMask, CtScan, HuWindow, MarrowError, MarrowMask, NiftiHeaderAttr, ThresholdMode};
use ndarray::{Array3, Zip};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 对一个 (强度体数据, 区域掩膜) 对提取骨髓掩膜.
///
/// 网格形状不一致 (允许的 4D 末维压缩已在载入时完成) 返回
/// [`MarrowError::GridMismatch`], 只影响该处理单元;
/// 是否跳过或中止由调用者决定.
///
/// 区域未选中任何体素不是错误: 上阈值为 0, 精化后得到空或近空的掩膜.
pub fn extract_marrow(
    scan: &CtScan,
    bone: &BoneMask,
    mode: ThresholdMode,
) -> Result<MarrowMask, MarrowError> {
    if scan.shape() != bone.shape() {
        return Err(MarrowError::GridMismatch(scan.shape(), bone.shape()));
    }

    let upper = mode.upper_threshold(scan, bone);
    let window = HuWindow::with_floor(upper);

    let mut raw = Array3::<u8>::zeros(scan.data().dim());
    Zip::from(&mut raw)
        .and(scan.data())
        .and(bone.data())
        .for_each(|r, &v, &b| {
            if mask::is_marrow(b) && window.classify(v).is_marrow() {
                *r = mask::MARROW;
            }
        });

    Ok(MarrowMask::derive(bone, morph::refine_marrow(raw)))
}

/// 借助 `rayon`, 并行地对多个区域掩膜提取骨髓掩膜.
///
/// 各处理单元相互独立, 只读共享同一强度体数据;
/// 返回值与 `bones` 顺序一一对应.
#[cfg(feature = "rayon")]
pub fn par_extract_marrow(
    scan: &CtScan,
    bones: &[BoneMask],
    mode: ThresholdMode,
) -> Vec<Result<MarrowMask, MarrowError>> {
    bones
        .par_iter()
        .map(|bone| extract_marrow(scan, bone, mode))
        .collect()
}
