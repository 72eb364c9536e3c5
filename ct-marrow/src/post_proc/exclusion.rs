//! 病灶剔除.
//!
//! 将病灶掩膜标出的体素从骨髓掩膜中去除. 一个受试者可能存在多个病灶掩膜,
//! 组合方式由调用者以 [`LesionPolicy`] 显式给出, 而不是对每个病灶文件
//! 重跑一遍提取流水线.

use crate::{LesionMask, MarrowError, MarrowMask, NiftiHeaderAttr};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 多病灶掩膜的组合策略.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LesionPolicy {
    /// 先将全部病灶掩膜取并集, 再剔除一次, 产生单个输出掩膜.
    Union,

    /// 对每个病灶掩膜独立剔除, 每个病灶掩膜产生一个输出掩膜.
    PerLesion,
}

/// 从骨髓掩膜中剔除病灶体素.
///
/// 对每个病灶掩膜为前景的体素, 输出掩膜在该处必为 0;
/// 其余体素原样保留. 输入掩膜不被修改.
///
/// 病灶掩膜列表为空时不是错误, 原掩膜原样通过 (单个输出).
/// 任一病灶掩膜与骨髓掩膜形状不一致, 该单元整体失败.
pub fn exclude_lesions(
    marrow: &MarrowMask,
    lesions: &[LesionMask],
    policy: LesionPolicy,
) -> Result<Vec<MarrowMask>, MarrowError> {
    if let Some(l) = lesions.iter().find(|l| l.shape() != marrow.shape()) {
        return Err(MarrowError::GridMismatch(marrow.shape(), l.shape()));
    }
    if lesions.is_empty() {
        return Ok(vec![marrow.clone()]);
    }

    match policy {
        LesionPolicy::Union => {
            let mut out = marrow.clone();
            let mut erased = 0usize;
            for lesion in lesions {
                erased += out.erase_lesions(lesion);
            }
            debug!("合并剔除 {} 个病灶掩膜, 置零 {erased} 个体素", lesions.len());
            Ok(vec![out])
        }
        LesionPolicy::PerLesion => Ok(lesions
            .iter()
            .map(|lesion| {
                let mut out = marrow.clone();
                out.erase_lesions(lesion);
                out
            })
            .collect()),
    }
}
