#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供全身骨骼 CT (及配准后的摄取扫描) 的逐骨骼骨髓提取、
//! 病灶剔除与受试者级聚合算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 所有体数据在载入时被统一为
//! `(z, H, W)` 内存布局, 几何元数据以 nifti header 原样携带.
//!
//! # 注意
//!
//! 1. 该 crate 假设逐骨骼掩膜由外部分割器产生, 且与 CT 扫描位于同一网格
//!   (允许末维为 1 的 4D 体数据, 载入时会被压缩为 3D).
//! 2. 网格不一致会以 [`MarrowError::GridMismatch`] 的形式报告给调用者,
//!   由调用者决定跳过该单元还是中止批处理; 引擎自身不会悄悄裁剪数据.
//!
//! # 开发计划
//!
//! ### 自适应阈值选择 ✅
//!
//! `static` / `dynamic` / `average` 三种上阈值模式, 以封闭枚举表达.
//!
//! 实现位于 `ct-marrow/src/threshold.rs`.
//!
//! ### 三维形态学精化 ✅
//!
//! 3D 开运算 (尺寸门控) 与逐切片腐蚀回乘两步.
//!
//! 实现位于 `ct-marrow/src/morph.rs`.
//!
//! ### 信噪比病灶检测与剔除 ✅
//!
//! 对重采样后的摄取扫描计算逐体素信噪比并二值化; 剔除策略
//! (合并剔除 / 逐病灶剔除) 显式给出.
//!
//! 实现位于 `ct-marrow/src/snr.rs` 和 `ct-marrow/src/post_proc/exclusion.rs`.
//!
//! ### 受试者级骨髓聚合 ✅
//!
//! 逐骨骼骨髓掩膜的逐体素 **求和** (非并集), 重叠体素保留计数信息.
//!
//! 实现位于 `ct-marrow/src/post_proc/assemble.rs`.
//!
//! ### 几何元数据保持 ✅
//!
//! 13 个几何 header 字段封装为不可变值对象, 派生体数据整体继承源掩膜
//! header 后再盖写一次, 保证字节级一致.
//!
//! 实现位于 `ct-marrow/src/data/geometry.rs`.
//!
//! ### 数据加载器 ✅
//!
//! 迭代器风格的分割目录 / 骨髓目录加载器.
//!
//! 实现位于 `ct-marrow/src/dataset.rs`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D nii 体数据基础结构.
mod data;

pub use data::{
    BoneMask, CompositeMarrow, CtScan, GeometryMeta, HuWindow, LesionMask, MarrowMask, MaskSlice,
    NiftiHeaderAttr, ScanSlice, SliceWritePng,
};

pub mod consts;

mod error;

pub use error::MarrowError;

pub mod threshold;

pub use threshold::ThresholdMode;

pub mod morph;

pub mod snr;

pub mod extract;

pub mod post_proc;

pub use post_proc::exclusion::LesionPolicy;

pub mod dataset;

pub mod prelude;
