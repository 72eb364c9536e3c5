//! 通用常量.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// 掩膜体素值.
pub mod mask {
    /// 二值掩膜中, 背景的体素值.
    pub const BACKGROUND: u8 = 0;

    /// 二值掩膜中, 前景 (骨骼或骨髓) 的体素值.
    pub const MARROW: u8 = 1;

    /// 体素是否是前景?
    #[inline]
    pub const fn is_marrow(p: u8) -> bool {
        matches!(p, MARROW)
    }

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }
}

/// 骨髓分割窗的系统级下界 (HU). 位于空气/脂肪边界之下,
/// 与各模式计算出的上阈值共同构成分割窗.
pub const HU_FLOOR: f64 = -100.0;

/// 启用 3D 开运算的最小体数据尺寸 (最大维度的体素个数).
/// 小于该尺寸时开运算会把纤细的真阳性结构整体抹掉, 因此跳过.
pub const OPENING_MIN_DIM: usize = 100;

/// 病灶检测的信噪比下界. 逐体素信噪比大于等于该值的体素被判为病灶.
pub const SNR_LESION_FLOOR: f64 = 5.0;

/// 自适应阈值使用的低分位点 (百分位).
pub const MARROW_P_LOW: f64 = 5.0;

/// 自适应阈值使用的高分位点 (百分位).
pub const MARROW_P_HIGH: f64 = 95.0;

/// `average` 模式中低分位点的权重.
pub const P_LOW_WEIGHT: f64 = 0.7;

/// `average` 模式中高分位点的权重.
pub const P_HIGH_WEIGHT: f64 = 0.3;

/// 受试者级合成骨髓体数据的固定文件名.
pub const COMPOSITE_FILE: &str = "assembled_marrow.nii.gz";

/// 体素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VoxelClass {
    /// 分割窗之外, 代表背景.
    Background,

    /// 分割窗之内, 代表骨髓候选.
    Marrow,
}

impl VoxelClass {
    /// 是否为骨髓候选.
    #[inline]
    pub fn is_marrow(&self) -> bool {
        matches!(self, Self::Marrow)
    }

    /// 是否为背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.is_marrow()
    }
}

/// 外部分割器产出的骨骼结构名.
pub mod bones {
    use super::*;

    /// 分割器输出的全部骨骼结构, 每个结构对应一个独立的区域掩膜文件.
    pub const ALL: [&str; 56] = [
        "clavicula_left",
        "clavicula_right",
        "hip_left",
        "hip_right",
        "femur_left",
        "femur_right",
        "humerus_left",
        "humerus_right",
        "rib_left_1",
        "rib_left_2",
        "rib_left_3",
        "rib_left_4",
        "rib_left_5",
        "rib_left_6",
        "rib_left_7",
        "rib_left_8",
        "rib_left_9",
        "rib_left_10",
        "rib_left_11",
        "rib_left_12",
        "rib_right_1",
        "rib_right_2",
        "rib_right_3",
        "rib_right_4",
        "rib_right_5",
        "rib_right_6",
        "rib_right_7",
        "rib_right_8",
        "rib_right_9",
        "rib_right_10",
        "rib_right_11",
        "rib_right_12",
        "sacrum",
        "scapula_left",
        "scapula_right",
        "skull",
        "spinal_cord",
        "sternum",
        "vertebrae_L1",
        "vertebrae_L2",
        "vertebrae_L3",
        "vertebrae_L4",
        "vertebrae_L5",
        "vertebrae_S1",
        "vertebrae_T1",
        "vertebrae_T2",
        "vertebrae_T3",
        "vertebrae_T4",
        "vertebrae_T5",
        "vertebrae_T6",
        "vertebrae_T7",
        "vertebrae_T8",
        "vertebrae_T9",
        "vertebrae_T10",
        "vertebrae_T11",
        "vertebrae_T12",
    ];

    /// 不含骨髓的结构. 这些结构的掩膜不参与受试者级聚合.
    pub const NON_MARROW: [&str; 1] = ["spinal_cord"];

    /// 含骨髓的结构集合, 即 [`ALL`] 去掉 [`NON_MARROW`].
    pub static MARROW_BEARING: Lazy<HashSet<&'static str>> =
        Lazy::new(|| ALL.iter().copied().filter(|b| !NON_MARROW.contains(b)).collect());
}
