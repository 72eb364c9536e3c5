//! 运行时错误.

use crate::Idx3d;
use nifti::NiftiError;

/// 提取、剔除与聚合的运行时错误.
///
/// 网格类错误只使对应的处理单元失败; 是否中止整个批处理由调用者决定.
#[derive(Debug)]
pub enum MarrowError {
    /// 参与同一计算的体数据网格形状不一致 (允许的 4D 末维压缩之后).
    ///
    /// 第一个参数代表基准形状, 第二个参数代表实际遇到的形状.
    GridMismatch(Idx3d, Idx3d),

    /// 参与同一计算的体数据形状一致, 但几何元数据不一致.
    GeometryDiverged,

    /// 聚合时没有任何可用的骨髓掩膜.
    EmptyAssembly,

    /// 底层 nifti 读写错误.
    Nifti(NiftiError),
}

impl From<NiftiError> for MarrowError {
    #[inline]
    fn from(e: NiftiError) -> Self {
        Self::Nifti(e)
    }
}
