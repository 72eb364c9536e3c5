//! 信噪比病灶检测.
//!
//! 对已重采样到受试者主网格的摄取扫描计算逐体素信噪比
//! (体素强度除以全体数据强度标准差), 并以固定下界二值化.
//! 不设上界: 信噪比越高, 越应被判为病灶.

use crate::consts::mask;
use crate::{CtScan, LesionMask};
use log::warn;
use ndarray::Array3;

/// 从摄取扫描检测病灶掩膜.
///
/// 体素被判为病灶, 当且仅当其信噪比不小于 `snr_floor`
/// (通常取 [`crate::consts::SNR_LESION_FLOOR`]).
///
/// 强度标准差为零 (常数体数据) 时不存在有意义的信噪比,
/// 返回全零掩膜.
pub fn detect_lesions(scan: &CtScan, snr_floor: f64) -> LesionMask {
    let std = scan.std_intensity();
    if std == 0.0 {
        warn!("摄取扫描强度标准差为零, 视为无病灶");
        return LesionMask::derive(scan, Array3::zeros(scan.data().dim()));
    }

    let data = scan.data().mapv(|v| {
        if v as f64 / std >= snr_floor {
            mask::MARROW
        } else {
            mask::BACKGROUND
        }
    });
    LesionMask::derive(scan, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NiftiHeaderAttr;

    #[test]
    fn test_constant_volume_has_no_lesions() {
        let scan = CtScan::fake(Array3::from_elem((4, 4, 4), 7.25), [1.0, 1.0, 1.0]);
        let lesion = detect_lesions(&scan, 5.0);
        assert_eq!(lesion.count_lesion(), 0);
        assert_eq!(lesion.shape(), (4, 4, 4));
    }

    #[test]
    fn test_snr_floor_is_inclusive() {
        // 一半体素为 0, 一半为 10: 标准差恰为 5, 信噪比为 0 和 2.
        let mut data = Array3::<f32>::zeros((2, 2, 2));
        data.iter_mut().skip(4).for_each(|v| *v = 10.0);
        let scan = CtScan::fake(data, [1.0, 1.0, 1.0]);

        let hit = detect_lesions(&scan, 2.0);
        assert_eq!(hit.count_lesion(), 4);

        let miss = detect_lesions(&scan, 2.1);
        assert_eq!(miss.count_lesion(), 0);
    }

    #[test]
    fn test_negative_intensities_are_background() {
        let mut data = Array3::<f32>::zeros((2, 2, 2));
        data[(0, 0, 0)] = -40.0;
        data[(1, 1, 1)] = 40.0;
        let scan = CtScan::fake(data, [1.0, 1.0, 1.0]);

        let lesion = detect_lesions(&scan, 1.0);
        assert_eq!(lesion[(1, 1, 1)], 1);
        assert_eq!(lesion[(0, 0, 0)], 0);
    }

    #[test]
    fn test_lesion_mask_inherits_scan_geometry() {
        let scan = CtScan::fake(Array3::from_elem((3, 3, 3), 1.0), [0.5, 0.5, 2.0]);
        let lesion = detect_lesions(&scan, 5.0);
        assert_eq!(lesion.geometry(), scan.geometry());
    }
}
