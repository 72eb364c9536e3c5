//! 三维形态学精化.
//!
//! 对强度窗选出的原始骨髓掩膜做两步清理:
//!
//! 1. 尺寸门控的 3D 开运算, 去除皮质骨外侧的小块软组织与噪声;
//! 2. 无条件的逐切片 2D 腐蚀回乘, 裁掉骨/髓界面上的部分容积伪影.
//!
//! 全部操作对合法的二值掩膜是全函数, 不会失败; 全零输入产生同形状的全零输出.

use crate::consts::{mask, OPENING_MIN_DIM};
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};

/// 6-邻接 (钻石型) 3D 腐蚀. 越界邻域视为背景, 因此表面前景体素总被腐蚀.
fn erode_3d(m: &Array3<u8>) -> Array3<u8> {
    let (z, h, w) = m.dim();
    let mut out = Array3::zeros((z, h, w));

    for ((iz, ih, iw), &v) in m.indexed_iter() {
        if mask::is_background(v) {
            continue;
        }
        let keep = iz > 0
            && mask::is_marrow(m[(iz - 1, ih, iw)])
            && iz + 1 < z
            && mask::is_marrow(m[(iz + 1, ih, iw)])
            && ih > 0
            && mask::is_marrow(m[(iz, ih - 1, iw)])
            && ih + 1 < h
            && mask::is_marrow(m[(iz, ih + 1, iw)])
            && iw > 0
            && mask::is_marrow(m[(iz, ih, iw - 1)])
            && iw + 1 < w
            && mask::is_marrow(m[(iz, ih, iw + 1)]);
        if keep {
            out[(iz, ih, iw)] = mask::MARROW;
        }
    }
    out
}

/// 6-邻接 (钻石型) 3D 膨胀. 越界的邻域写入被忽略.
fn dilate_3d(m: &Array3<u8>) -> Array3<u8> {
    let (z, h, w) = m.dim();
    let mut out = Array3::zeros((z, h, w));

    for ((iz, ih, iw), &v) in m.indexed_iter() {
        if mask::is_background(v) {
            continue;
        }
        out[(iz, ih, iw)] = mask::MARROW;
        if iz > 0 {
            out[(iz - 1, ih, iw)] = mask::MARROW;
        }
        if iz + 1 < z {
            out[(iz + 1, ih, iw)] = mask::MARROW;
        }
        if ih > 0 {
            out[(iz, ih - 1, iw)] = mask::MARROW;
        }
        if ih + 1 < h {
            out[(iz, ih + 1, iw)] = mask::MARROW;
        }
        if iw > 0 {
            out[(iz, ih, iw - 1)] = mask::MARROW;
        }
        if iw + 1 < w {
            out[(iz, ih, iw + 1)] = mask::MARROW;
        }
    }
    out
}

/// 一次迭代的 3D 开运算 (腐蚀后膨胀), 单位连通性结构元.
pub fn opening_3d(m: &Array3<u8>) -> Array3<u8> {
    dilate_3d(&erode_3d(m))
}

/// 4-邻接 2D 腐蚀. 越界邻域视为背景, 因此边缘前景像素总被腐蚀.
pub fn erode_slice(m: ArrayView2<u8>) -> Array2<u8> {
    let (h, w) = m.dim();
    let mut out = Array2::zeros((h, w));

    for ((ih, iw), &v) in m.indexed_iter() {
        if mask::is_background(v) {
            continue;
        }
        let keep = ih > 0
            && mask::is_marrow(m[(ih - 1, iw)])
            && ih + 1 < h
            && mask::is_marrow(m[(ih + 1, iw)])
            && iw > 0
            && mask::is_marrow(m[(ih, iw - 1)])
            && iw + 1 < w
            && mask::is_marrow(m[(ih, iw + 1)]);
        if keep {
            out[(ih, iw)] = mask::MARROW;
        }
    }
    out
}

/// 精化原始骨髓掩膜.
///
/// 步骤 A: 仅当最大维度不小于 [`OPENING_MIN_DIM`] 时施加一次 3D 开运算.
/// 小体数据上开运算会把纤细的真阳性结构整体抹掉, 因此跳过.
///
/// 步骤 B: 无条件地对每个水平切片独立施加一次 2D 腐蚀,
/// 并将结果与步骤 A 的掩膜逐体素相与.
pub fn refine_marrow(raw: Array3<u8>) -> Array3<u8> {
    let (z, h, w) = raw.dim();
    let largest = z.max(h).max(w);

    let opened = if largest >= OPENING_MIN_DIM {
        opening_3d(&raw)
    } else {
        debug!("最大维度 {largest} < {OPENING_MIN_DIM}, 跳过 3D 开运算");
        raw
    };

    let mut trimmed = Array3::<u8>::zeros(opened.dim());
    for (mut out_sli, in_sli) in trimmed
        .axis_iter_mut(Axis(0))
        .zip(opened.axis_iter(Axis(0)))
    {
        out_sli.assign(&erode_slice(in_sli));
    }

    // 逐体素回乘, 保证结果是步骤 A 掩膜的子集.
    Zip::from(&mut trimmed)
        .and(&opened)
        .for_each(|t, &o| *t &= o);
    trimmed
}
