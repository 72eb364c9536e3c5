//! 自适应上阈值选择.
//!
//! 对一个 (强度体数据, 区域掩膜) 对, 从掩膜内强度分布计算骨髓分割窗的
//! 上阈值. 系统级下界 [`crate::consts::HU_FLOOR`] 不由本模块产生,
//! 而是在构建分割窗时由下游统一引入.

use crate::consts::{MARROW_P_HIGH, MARROW_P_LOW, P_HIGH_WEIGHT, P_LOW_WEIGHT};
use crate::{BoneMask, CtScan};
use itertools::Itertools;
use log::debug;
use ordered_float::NotNan;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 上阈值选择模式.
///
/// 封闭枚举: 不存在合法值之外的模式.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdMode {
    /// 固定阈值: 携带的值直接作为上阈值, 强度分布被忽略.
    Static(f64),

    /// 动态阈值: 掩膜内强度的低分位点 (P5, 已知的骨髓参考值)
    /// 加上携带的偏移量.
    Dynamic(f64),

    /// 加权平均阈值: 掩膜内强度低高分位点的加权组合
    /// `0.7 * P5 + 0.3 * P95`. 不使用偏移量.
    Average,
}

impl ThresholdMode {
    /// 计算上阈值.
    ///
    /// `Dynamic` 和 `Average` 模式下, 如果掩膜未选中任何体素, 则返回 0.
    /// 掩膜内存在体素但强度全为 0 **不是** 空区域, 会照常计算分位点.
    ///
    /// 两者形状必须一致; 该函数只应在网格检查通过后调用.
    pub fn upper_threshold(&self, scan: &CtScan, region: &BoneMask) -> f64 {
        match *self {
            Self::Static(value) => value,
            Self::Dynamic(offset) => {
                let values = sorted_values(scan, region);
                if values.is_empty() {
                    return 0.0;
                }
                let th = percentile(&values, MARROW_P_LOW) + offset;
                debug!("dynamic 模式上阈值: {th}");
                th
            }
            Self::Average => {
                let values = sorted_values(scan, region);
                if values.is_empty() {
                    return 0.0;
                }
                let th = P_LOW_WEIGHT * percentile(&values, MARROW_P_LOW)
                    + P_HIGH_WEIGHT * percentile(&values, MARROW_P_HIGH);
                debug!("average 模式上阈值: {th}");
                th
            }
        }
    }
}

/// 收集掩膜内强度值并升序排序. 非有限的强度值被忽略.
fn sorted_values(scan: &CtScan, region: &BoneMask) -> Vec<NotNan<f64>> {
    scan.values_within(region)
        .into_iter()
        .filter_map(|v| NotNan::new(v).ok())
        .sorted()
        .collect()
}

/// 求升序序列 `sorted` 的第 `p` 百分位数, 相邻秩之间线性插值.
///
/// `sorted` 必须非空且 `p` 位于 \[0, 100\] 内, 否则程序行为未定义.
pub(crate) fn percentile(sorted: &[NotNan<f64>], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=100.0).contains(&p));

    let rank = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    let (a, b) = (sorted[lo].into_inner(), sorted[hi].into_inner());
    a + (b - a) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 一个 (5, 5, 5) 扫描, 掩膜选中前 101 个体素, 强度为 0..=100.
    fn ramp_fixture() -> (CtScan, BoneMask) {
        let mut scan = Array3::<f32>::zeros((5, 5, 5));
        let mut region = Array3::<u8>::zeros((5, 5, 5));
        for (i, (v, m)) in scan.iter_mut().zip(region.iter_mut()).take(101).enumerate() {
            *v = i as f32;
            *m = 1;
        }
        (
            CtScan::fake(scan, [1.0, 1.0, 1.0]),
            BoneMask::fake(region, [1.0, 1.0, 1.0], 1, [0.0, 0.0, 0.0]),
        )
    }

    fn empty_fixture() -> (CtScan, BoneMask) {
        let scan = Array3::<f32>::from_elem((4, 4, 4), 37.5);
        let region = Array3::<u8>::zeros((4, 4, 4));
        (
            CtScan::fake(scan, [1.0, 1.0, 1.0]),
            BoneMask::fake(region, [1.0, 1.0, 1.0], 1, [0.0, 0.0, 0.0]),
        )
    }

    #[test]
    fn test_static_returns_offset_untouched() {
        let (scan, region) = ramp_fixture();
        for offset in [-1000.0, -100.0, 0.0, 42.5, 230.0] {
            assert_eq!(
                ThresholdMode::Static(offset).upper_threshold(&scan, &region),
                offset
            );
        }
    }

    #[test]
    fn test_dynamic_is_p5_plus_offset() {
        let (scan, region) = ramp_fixture();
        // 101 个等差值 0..=100, P5 恰为 5.0.
        assert!(float_eq(
            ThresholdMode::Dynamic(0.0).upper_threshold(&scan, &region),
            5.0
        ));
        assert!(float_eq(
            ThresholdMode::Dynamic(30.0).upper_threshold(&scan, &region),
            35.0
        ));
    }

    #[test]
    fn test_average_is_weighted_percentile_blend() {
        let (scan, region) = ramp_fixture();
        // 0.7 * 5 + 0.3 * 95 = 32.
        assert!(float_eq(
            ThresholdMode::Average.upper_threshold(&scan, &region),
            32.0
        ));
    }

    #[test]
    fn test_empty_region_yields_zero() {
        let (scan, region) = empty_fixture();
        assert_eq!(ThresholdMode::Dynamic(25.0).upper_threshold(&scan, &region), 0.0);
        assert_eq!(ThresholdMode::Average.upper_threshold(&scan, &region), 0.0);
    }

    #[test]
    fn test_zero_intensities_are_not_an_empty_region() {
        // 掩膜非空但强度全为 0: 分位点照常计算, 偏移量得以保留.
        let scan = CtScan::fake(Array3::zeros((4, 4, 4)), [1.0, 1.0, 1.0]);
        let region = BoneMask::fake(
            Array3::ones((4, 4, 4)),
            [1.0, 1.0, 1.0],
            1,
            [0.0, 0.0, 0.0],
        );
        assert_eq!(ThresholdMode::Dynamic(25.0).upper_threshold(&scan, &region), 25.0);
        assert_eq!(ThresholdMode::Average.upper_threshold(&scan, &region), 0.0);
    }

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        let sorted: Vec<_> = [10.0, 20.0, 40.0, 80.0]
            .into_iter()
            .map(|v| NotNan::new(v).unwrap())
            .collect();
        assert!(float_eq(percentile(&sorted, 0.0), 10.0));
        assert!(float_eq(percentile(&sorted, 100.0), 80.0));
        assert!(float_eq(percentile(&sorted, 50.0), 30.0));
        // rank = 3 * 0.05 = 0.15 -> 10 + 0.15 * 10.
        assert!(float_eq(percentile(&sorted, 5.0), 11.5));
    }
}
