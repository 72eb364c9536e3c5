use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayViewMut, Axis, Ix3};
use nifti::{DataElement, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use nifti::writer::WriterOptions;

use crate::consts::mask;
use crate::{Idx2d, Idx3d};

mod geometry;
mod slice;
mod window;

pub use geometry::GeometryMeta;
pub use slice::{MaskSlice, ScanSlice, SliceWritePng};
pub use window::HuWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组. 对 4D header, 末维在载入时已被压缩, 这里忽略.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 打开 nii 体数据文件, 返回 header 和 `(z, H, W)` 布局的数组.
///
/// 末维为 1 的 4D 体数据在返回前被压缩为 3D; 其他形状不一致一律交由
/// 上层的网格检查报告.
fn open_volume<T, P>(path: P) -> nifti::Result<(BoxedHeader, Array3<T>)>
where
    T: DataElement,
    P: AsRef<Path>,
{
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let header = Box::new(obj.header().clone());

    let mut data = obj.into_volume().into_ndarray::<T>()?;
    if data.ndim() == 4 && data.shape()[3] == 1 {
        data = data.index_axis_move(Axis(3), 0);
    }

    // [W, H, z] -> [z, H, W].
    // hint: 原第一维向下增长, 原第二维向右增长.
    let data = data.permuted_axes([2, 1, 0].as_slice());

    // The nature of nifti data field layout.
    debug_assert!(data.is_standard_layout());

    // 该操作不会生成 `Err`, 可直接 unwrap.
    let data =
        Array3::<T>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec()).unwrap();

    Ok((header, data))
}

/// 将 `(z, H, W)` 布局的数组按 nifti 惯用的 `(W, H, z)` 顺序写入文件.
/// `header` 作为参照 header, 其几何字段原样进入输出文件.
fn save_volume<T, P>(path: P, header: &NiftiHeader, data: ArrayView<'_, T, Ix3>) -> nifti::Result<()>
where
    T: DataElement + bytemuck::Pod,
    P: AsRef<Path>,
{
    // [z, H, W] -> [W, H, z].
    let vol = data.permuted_axes([2, 1, 0]);
    WriterOptions::new(path.as_ref())
        .reference_header(header)
        .write_nifti(&vol)
}

/// 3D nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获取该体数据的几何元数据值对象.
    #[inline]
    fn geometry(&self) -> GeometryMeta {
        GeometryMeta::from_header(self.header())
    }

    /// 判断两个体数据是否位于同一网格 (形状一致且几何元数据相等).
    #[inline]
    fn same_grid<O: NiftiHeaderAttr>(&self, other: &O) -> bool {
        self.shape() == other.shape() && self.geometry() == other.geometry()
    }
}

/// nii 格式 3D 强度体数据, 包括 header 和体素强度. 强度值以 `f32` 保存.
///
/// 既用于主 CT 扫描 (HU), 也用于已重采样到同一网格的摄取扫描.
/// 该结构对本引擎只读.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtScan {
    /// 打开 nii 文件格式的 3D 强度体数据. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// 末维为 1 的 4D 体数据会被压缩为 3D.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let (header, data) = open_volume(path)?;
        Ok(Self { header, data })
    }

    /// 根据裸强度数据和部分几何信息直接创建 `CtScan` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照本 crate 工作布局 \[z, H, W\] 组织.
    /// 2. `pix_dim` 按照 \[w, h, z\] 格式存储.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let mut header = Box::<NiftiHeader>::default();

        let (z, h, w) = data.dim();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];

        let [_, pw, ph, pz, ..] = &mut header.pixdim;
        let [w, h, z] = &pix_dim;
        (*pw, *ph, *pz) = (*w, *h, *z);
        header.intent_name[..4].copy_from_slice(b"fake");

        Self { header, data }
    }

    /// 收集掩膜前景体素对应的全部强度值, 按行优先序.
    ///
    /// 两者形状必须一致; 该函数只应在网格检查通过后调用.
    pub fn values_within(&self, region: &BoneMask) -> Vec<f64> {
        debug_assert_eq!(self.data.dim(), region.data.dim());
        self.data
            .iter()
            .zip(region.data.iter())
            .filter_map(|(&v, &m)| mask::is_marrow(m).then_some(v as f64))
            .collect()
    }

    /// 计算全体体素的强度平均值.
    pub fn mean_intensity(&self) -> f64 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / (n as f64)
    }

    /// 计算全体体素的强度标准差 (总体标准差).
    pub fn std_intensity(&self) -> f64 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.mean_intensity();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / (n as f64);
        var.sqrt()
    }

    /// 获取 3D 体数据 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// nii 格式单骨骼区域掩膜, 包括 header 和二值标注. 标注值以 `u8` 保存,
/// 限定为 0/1. 由外部分割器产生, 对本引擎只读.
#[derive(Debug, Clone)]
pub struct BoneMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for BoneMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for BoneMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl BoneMask {
    /// 打开 nii 文件格式的区域掩膜. 如果打开成功, 则返回 `Ok(Self)`,
    /// 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let (header, data) = open_volume(path)?;
        Ok(Self { header, data })
    }

    /// 根据裸掩膜数据和部分几何信息直接创建 `BoneMask` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照本 crate 工作布局 \[z, H, W\] 组织, 体素值必须为 0 或 1,
    ///   否则程序行为未定义.
    /// 2. `pix_dim` 按照 \[w, h, z\] 格式存储.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(
        data: Array3<u8>,
        pix_dim: [f32; 3],
        qform_code: i16,
        quatern_bcd: [f32; 3],
    ) -> Self {
        let mut header = Box::<NiftiHeader>::default();

        let (z, h, w) = data.dim();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];

        let [_, pw, ph, pz, ..] = &mut header.pixdim;
        let [w, h, z] = &pix_dim;
        (*pw, *ph, *pz) = (*w, *h, *z);
        header.qform_code = qform_code;
        let [qb, qc, qd] = &quatern_bcd;
        (header.quatern_b, header.quatern_c, header.quatern_d) = (*qb, *qc, *qd);
        header.intent_name[..4].copy_from_slice(b"fake");

        Self { header, data }
    }

    /// 直接创建数据. 除 `dim` 会按 `data` 的形状重置、`intent_name`
    /// 被打上标记外, `header` 的其余字段 (包括全部几何字段) 原样保留.
    ///
    /// # 注意
    ///
    /// `data` 按照本 crate 工作布局 \[z, H, W\] 组织, 体素值必须为 0 或 1,
    /// 否则程序行为未定义.
    pub fn fake_with_header(header: &NiftiHeader, data: Array3<u8>) -> Self {
        let mut header = Box::new(header.clone());
        let (z, h, w) = data.dim();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        header.intent_name[..4].copy_from_slice(b"fake");
        Self { header, data }
    }

    /// 判断该结构是否是由 `fake_*` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 获取掩膜中前景体素的个数.
    #[inline]
    pub fn count_marrow(&self) -> usize {
        self.data.iter().filter(|p| mask::is_marrow(**p)).count()
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}

/// 由 (强度体数据, 区域掩膜) 派生出的骨髓掩膜. 二值, 与源区域掩膜同网格.
///
/// 该结构在提取时创建一次, 持久化之前可被病灶剔除就地修改,
/// 持久化之后不再变动.
#[derive(Debug, Clone)]
pub struct MarrowMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for MarrowMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for MarrowMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl MarrowMask {
    /// 从源区域掩膜派生骨髓掩膜. header 整体继承自 `source`,
    /// 几何字段随后再盖写一次, 保证与源掩膜逐字节一致.
    pub(crate) fn derive(source: &BoneMask, data: Array3<u8>) -> Self {
        debug_assert_eq!(source.shape(), data.dim());

        let mut header = Box::new(source.header().clone());
        source.geometry().write_to(&mut header);
        Self { header, data }
    }

    /// 打开先前持久化的骨髓掩膜文件.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let (header, data) = open_volume(path)?;
        Ok(Self { header, data })
    }

    /// 将掩膜写入 `path`. 输出文件的几何字段来自继承的 header.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        save_volume(path, &self.header, self.data.view())
    }

    /// 将病灶掩膜为前景的全部体素置 0, 其余体素原样保留.
    ///
    /// 返回被置 0 的体素个数. 两者形状必须一致;
    /// 该函数只应在网格检查通过后调用.
    pub fn erase_lesions(&mut self, lesion: &LesionMask) -> usize {
        debug_assert_eq!(self.data.dim(), lesion.data.dim());

        let mut cnt = 0usize;
        self.data
            .iter_mut()
            .zip(lesion.data.iter())
            .filter(|(v, l)| mask::is_marrow(**l) && mask::is_marrow(**v))
            .for_each(|(v, _)| {
                cnt += 1;
                *v = mask::BACKGROUND;
            });
        cnt
    }

    /// 获取掩膜中前景体素的个数.
    #[inline]
    pub fn count_marrow(&self) -> usize {
        self.data.iter().filter(|p| mask::is_marrow(**p)).count()
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }
}

/// 病灶掩膜. 二值, 由信噪比检测器从摄取扫描派生, 与受试者主网格一致.
#[derive(Debug, Clone)]
pub struct LesionMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for LesionMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for LesionMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LesionMask {
    /// 从摄取扫描派生病灶掩膜. header 整体继承自 `source`,
    /// 几何字段随后再盖写一次.
    pub(crate) fn derive(source: &CtScan, data: Array3<u8>) -> Self {
        debug_assert_eq!(source.shape(), data.dim());

        let mut header = Box::new(source.header().clone());
        source.geometry().write_to(&mut header);
        Self { header, data }
    }

    /// 打开先前持久化的病灶掩膜文件.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let (header, data) = open_volume(path)?;
        Ok(Self { header, data })
    }

    /// 将掩膜写入 `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        save_volume(path, &self.header, self.data.view())
    }

    /// 获取掩膜中前景 (病灶) 体素的个数.
    #[inline]
    pub fn count_lesion(&self) -> usize {
        self.data.iter().filter(|p| mask::is_marrow(**p)).count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}

/// 受试者级合成骨髓体数据: 逐骨骼骨髓掩膜的逐体素 **求和**.
///
/// 体素值等于覆盖该体素的掩膜个数, 不是并集; 需要二值结果的消费者
/// 应使用 [`Self::binary_union`] (阈值 ≥ 1).
#[derive(Debug, Clone)]
pub struct CompositeMarrow {
    header: BoxedHeader,
    data: Array3<u16>,
}

impl NiftiHeaderAttr for CompositeMarrow {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CompositeMarrow {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CompositeMarrow {
    /// 从第一个参与聚合的骨髓掩膜派生合成体数据.
    /// header 整体继承, 几何字段随后再盖写一次.
    pub(crate) fn derive(source: &MarrowMask, data: Array3<u16>) -> Self {
        debug_assert_eq!(source.shape(), data.dim());

        let mut header = Box::new(source.header().clone());
        source.geometry().write_to(&mut header);
        Self { header, data }
    }

    /// 将合成体数据写入 `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        save_volume(path, &self.header, self.data.view())
    }

    /// 以 ≥ 1 为阈值将合成体数据还原为二值并集掩膜.
    pub fn binary_union(&self) -> MarrowMask {
        MarrowMask {
            header: self.header.clone(),
            data: self.data.mapv(|v| u8::from(v >= 1)),
        }
    }

    /// 获取全体体素的最大覆盖次数. 大于 1 说明参与聚合的掩膜存在重叠.
    pub fn max_overlap(&self) -> u16 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u16, Ix3> {
        self.data.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn cube_mask() -> BoneMask {
        let mut m = Array3::<u8>::zeros((4, 4, 4));
        m.slice_mut(ndarray::s![1..3, 1..3, 1..3]).fill(1);
        BoneMask::fake(m, [1.0, 1.0, 2.5], 1, [0.0, 0.5, 0.5])
    }

    #[test]
    fn test_fake_sets_consistent_shape() {
        let b = cube_mask();
        assert!(b.is_faked());
        assert_eq!(b.shape(), (4, 4, 4));
        assert_eq!(b.slice_shape(), (4, 4));
        assert_eq!(b.len_z(), 4);
        assert_eq!(b.size(), 64);
        assert_eq!(b.count_marrow(), 8);
        assert_eq!(b.pix_dim(), [2.5, 1.0, 1.0]);
    }

    #[test]
    fn test_derived_mask_inherits_geometry() {
        let b = cube_mask();
        let derived = MarrowMask::derive(&b, Array3::zeros((4, 4, 4)));
        assert_eq!(derived.geometry(), b.geometry());
        assert!(derived.same_grid(&b));
    }

    #[test]
    fn test_erase_lesions_zeroes_flagged_voxels() {
        let b = cube_mask();
        let mut marrow = MarrowMask::derive(&b, b.data().to_owned());

        let mut lesion = Array3::<u8>::zeros((4, 4, 4));
        lesion[(1, 1, 1)] = 1;
        lesion[(0, 0, 0)] = 1; // 掩膜外的病灶体素不计数
        let scan = CtScan::fake(Array3::zeros((4, 4, 4)), [1.0, 1.0, 1.0]);
        let lesion = LesionMask::derive(&scan, lesion);

        assert_eq!(marrow.erase_lesions(&lesion), 1);
        assert_eq!(marrow[(1, 1, 1)], 0);
        assert_eq!(marrow[(1, 1, 2)], 1);
        assert_eq!(marrow.count_marrow(), 7);
    }

    #[test]
    fn test_binary_union_thresholds_at_one() {
        let b = cube_mask();
        let marrow = MarrowMask::derive(&b, b.data().to_owned());

        let mut counts = Array3::<u16>::zeros((4, 4, 4));
        counts[(1, 1, 1)] = 2;
        counts[(2, 2, 2)] = 1;
        let comp = CompositeMarrow::derive(&marrow, counts);

        assert_eq!(comp.max_overlap(), 2);
        let union = comp.binary_union();
        assert_eq!(union[(1, 1, 1)], 1);
        assert_eq!(union[(2, 2, 2)], 1);
        assert_eq!(union.count_marrow(), 2);
        assert_eq!(union.geometry(), b.geometry());
    }
}
