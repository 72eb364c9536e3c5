//! 受试者级骨髓聚合.
//!
//! 将一个受试者的全部逐骨骼骨髓掩膜逐体素 **求和** 为一个合成体数据.
//! 求和而非取并集是有意为之: 重叠体素的值等于覆盖它的掩膜个数,
//! 下游消费者可借 [`CompositeMarrow::binary_union`] 以 ≥ 1 为阈值还原并集.
//!
//! 哪些文件参与聚合 (排除不含骨髓的结构与先前的合成输出)
//! 由 [`crate::dataset::is_assembly_input`] 决定.

use crate::{CompositeMarrow, MarrowError, MarrowMask, NiftiHeaderAttr};
use log::debug;
use ndarray::Zip;

/// 聚合一个受试者的骨髓掩膜集合.
///
/// 输出的几何元数据整体继承自第一个掩膜; 后续每个掩膜必须与其网格一致
/// (形状且几何元数据), 否则该受试者聚合失败. 空输入返回
/// [`MarrowError::EmptyAssembly`].
pub fn assemble_composite<I>(masks: I) -> Result<CompositeMarrow, MarrowError>
where
    I: IntoIterator<Item = MarrowMask>,
{
    let mut it = masks.into_iter();
    let Some(first) = it.next() else {
        return Err(MarrowError::EmptyAssembly);
    };

    let mut acc = first.data().mapv(u16::from);
    let mut contributors = 1usize;
    for m in it {
        if m.shape() != first.shape() {
            return Err(MarrowError::GridMismatch(first.shape(), m.shape()));
        }
        if m.geometry() != first.geometry() {
            return Err(MarrowError::GeometryDiverged);
        }
        Zip::from(&mut acc)
            .and(m.data())
            .for_each(|a, &v| *a += u16::from(v));
        contributors += 1;
    }

    debug!("聚合 {contributors} 个骨髓掩膜");
    Ok(CompositeMarrow::derive(&first, acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoneMask, Idx3d};
    use ndarray::Array3;

    fn marrow_at(positions: &[Idx3d]) -> MarrowMask {
        let bone = BoneMask::fake(
            Array3::ones((4, 4, 4)),
            [0.8, 0.8, 2.0],
            1,
            [0.25, -0.25, 0.5],
        );
        let mut data = Array3::<u8>::zeros((4, 4, 4));
        for &pos in positions {
            data[pos] = 1;
        }
        MarrowMask::derive(&bone, data)
    }

    #[test]
    fn test_disjoint_masks_sum_to_ones() {
        let a = marrow_at(&[(0, 0, 0)]);
        let b = marrow_at(&[(3, 3, 3)]);

        let comp = assemble_composite([a, b]).unwrap();
        assert_eq!(comp[(0, 0, 0)], 1);
        assert_eq!(comp[(3, 3, 3)], 1);
        assert_eq!(comp.data().iter().map(|&v| v as usize).sum::<usize>(), 2);
        assert_eq!(comp.max_overlap(), 1);
    }

    #[test]
    fn test_overlap_accumulates_instead_of_saturating() {
        let a = marrow_at(&[(1, 1, 1), (1, 1, 2)]);
        let b = marrow_at(&[(1, 1, 1)]);

        let comp = assemble_composite([a, b]).unwrap();
        assert_eq!(comp[(1, 1, 1)], 2);
        assert_eq!(comp[(1, 1, 2)], 1);
        assert_eq!(comp.max_overlap(), 2);

        // 并集还原: 重叠体素与独占体素都回到 1.
        let union = comp.binary_union();
        assert_eq!(union[(1, 1, 1)], 1);
        assert_eq!(union[(1, 1, 2)], 1);
        assert_eq!(union.count_marrow(), 2);
    }

    #[test]
    fn test_geometry_comes_from_first_contributor() {
        let a = marrow_at(&[(0, 0, 0)]);
        let geometry = a.geometry();

        let comp = assemble_composite([a, marrow_at(&[])]).unwrap();
        assert_eq!(comp.geometry(), geometry);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            assemble_composite(Vec::new()),
            Err(MarrowError::EmptyAssembly)
        ));
    }

    #[test]
    fn test_shape_mismatch_fails_the_subject() {
        let a = marrow_at(&[(0, 0, 0)]);
        let bone = BoneMask::fake(
            Array3::ones((5, 4, 4)),
            [0.8, 0.8, 2.0],
            1,
            [0.25, -0.25, 0.5],
        );
        let b = MarrowMask::derive(&bone, Array3::zeros((5, 4, 4)));

        assert!(matches!(
            assemble_composite([a, b]),
            Err(MarrowError::GridMismatch((4, 4, 4), (5, 4, 4)))
        ));
    }

    #[test]
    fn test_diverged_geometry_fails_the_subject() {
        let a = marrow_at(&[(0, 0, 0)]);
        let bone = BoneMask::fake(
            Array3::ones((4, 4, 4)),
            [1.0, 1.0, 1.0], // 体素分辨率不同
            1,
            [0.25, -0.25, 0.5],
        );
        let b = MarrowMask::derive(&bone, Array3::zeros((4, 4, 4)));

        assert!(matches!(
            assemble_composite([a, b]),
            Err(MarrowError::GeometryDiverged)
        ));
    }
}
