//! 几何元数据.

use nifti::NiftiHeader;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体数据的几何元数据, 共 13 个 nifti header 字段.
///
/// 派生体数据 (骨髓掩膜、合成体数据) 的这些字段必须与其源区域掩膜
/// **逐字节一致**, 不允许来自默认构造的 header. 因此该结构被设计为
/// 不可变值对象: 从源 header 一次性读出, 在派生体数据构造时整体盖写回去.
///
/// 两个体数据网格兼容, 当且仅当形状一致且该结构相等.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryMeta {
    /// 体素分辨率, nifti `pixdim` 原样.
    pub pixdim: [f32; 8],

    /// 空间/时间单位编码.
    pub xyzt_units: u8,

    /// 四元数方向编码的有效性标志.
    pub qform_code: i16,

    /// 仿射方向编码的有效性标志.
    pub sform_code: i16,

    /// 方向四元数分量 b.
    pub quatern_b: f32,

    /// 方向四元数分量 c.
    pub quatern_c: f32,

    /// 方向四元数分量 d.
    pub quatern_d: f32,

    /// x 方向空间偏移.
    pub quatern_x: f32,

    /// y 方向空间偏移.
    pub quatern_y: f32,

    /// z 方向空间偏移.
    pub quatern_z: f32,

    /// 仿射变换行向量 x.
    pub srow_x: [f32; 4],

    /// 仿射变换行向量 y.
    pub srow_y: [f32; 4],

    /// 仿射变换行向量 z.
    pub srow_z: [f32; 4],
}

impl GeometryMeta {
    /// 从 header 读出全部 13 个几何字段.
    pub fn from_header(h: &NiftiHeader) -> Self {
        Self {
            pixdim: h.pixdim,
            xyzt_units: h.xyzt_units,
            qform_code: h.qform_code,
            sform_code: h.sform_code,
            quatern_b: h.quatern_b,
            quatern_c: h.quatern_c,
            quatern_d: h.quatern_d,
            quatern_x: h.quatern_x,
            quatern_y: h.quatern_y,
            quatern_z: h.quatern_z,
            srow_x: h.srow_x,
            srow_y: h.srow_y,
            srow_z: h.srow_z,
        }
    }

    /// 将全部 13 个几何字段盖写进 `h`.
    pub fn write_to(&self, h: &mut NiftiHeader) {
        h.pixdim = self.pixdim;
        h.xyzt_units = self.xyzt_units;
        h.qform_code = self.qform_code;
        h.sform_code = self.sform_code;
        h.quatern_b = self.quatern_b;
        h.quatern_c = self.quatern_c;
        h.quatern_d = self.quatern_d;
        h.quatern_x = self.quatern_x;
        h.quatern_y = self.quatern_y;
        h.quatern_z = self.quatern_z;
        h.srow_x = self.srow_x;
        h.srow_y = self.srow_y;
        h.srow_z = self.srow_z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbitrary_header() -> NiftiHeader {
        let mut h = NiftiHeader::default();
        h.pixdim = [1.0, 0.82, 0.82, 3.0, 1.0, 1.0, 1.0, 1.0];
        h.xyzt_units = 10;
        h.qform_code = 1;
        h.sform_code = 2;
        (h.quatern_b, h.quatern_c, h.quatern_d) = (0.5, -0.5, 0.5);
        (h.quatern_x, h.quatern_y, h.quatern_z) = (-205.5, 187.25, -742.0);
        h.srow_x = [-0.82, 0.0, 0.0, 205.5];
        h.srow_y = [0.0, -0.82, 0.0, 187.25];
        h.srow_z = [0.0, 0.0, 3.0, -742.0];
        h
    }

    #[test]
    fn test_round_trip_is_identical() {
        let src = arbitrary_header();
        let meta = GeometryMeta::from_header(&src);

        let mut fresh = NiftiHeader::default();
        meta.write_to(&mut fresh);
        assert_eq!(GeometryMeta::from_header(&fresh), meta);
    }

    #[test]
    fn test_default_header_diverges() {
        // 默认构造的 header 与真实几何不相等, 因此必须盖写.
        let src = arbitrary_header();
        let default = NiftiHeader::default();
        assert_ne!(
            GeometryMeta::from_header(&src),
            GeometryMeta::from_header(&default)
        );
    }
}
