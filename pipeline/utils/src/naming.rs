//! 批处理文件命名约定.
//!
//! 所有派生目录与文件都以 CT 扫描文件所在目录为基准, 通过固定的
//! 后缀规则定位. 这些规则只属于批处理层, 核心引擎不感知路径.

use ct_marrow::dataset::is_nii;

/// 受试者级最终骨髓掩膜目录名.
pub const MARROW_DIR: &str = "marrow_segmentation";

/// 去掉 nii 扩展名.
fn strip_nii(name: &str) -> &str {
    name.strip_suffix(".nii.gz")
        .or_else(|| name.strip_suffix(".nii"))
        .unwrap_or(name)
}

/// CT 扫描文件对应的分割目录名.
pub fn segmentation_dir_name(ct_file: &str) -> String {
    format!("{}_segmentation", strip_nii(ct_file))
}

/// CT 扫描文件对应的中间结果目录名.
pub fn intermediate_dir_name(ct_file: &str) -> String {
    format!("{}_intermediate", strip_nii(ct_file))
}

/// 区域掩膜文件对应的骨髓掩膜文件名.
pub fn marrow_file_name(bone_file: &str) -> String {
    format!("{}_marrow.nii.gz", strip_nii(bone_file))
}

/// 摄取扫描文件对应的病灶掩膜文件名.
pub fn lesion_file_name(scan_file: &str) -> String {
    format!("{}_lesion_snr.nii.gz", strip_nii(scan_file))
}

/// 判断文件名是否是主 CT 扫描.
pub fn is_primary_scan(name: &str) -> bool {
    is_nii(name) && name.contains("CT")
}

/// 判断文件名是否是已重采样到主网格的摄取扫描.
pub fn is_uptake_scan(name: &str) -> bool {
    is_nii(name) && name.contains("PT") && name.contains("resized") && !name.contains("lesion")
}

/// 判断文件名是否是病灶掩膜.
pub fn is_lesion_mask(name: &str) -> bool {
    is_nii(name) && name.contains("lesion_snr")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_names_strip_extension() {
        assert_eq!(
            segmentation_dir_name("CT_axial.nii.gz"),
            "CT_axial_segmentation"
        );
        assert_eq!(intermediate_dir_name("CT_axial.nii"), "CT_axial_intermediate");
    }

    #[test]
    fn test_derived_file_names() {
        assert_eq!(
            marrow_file_name("femur_left.nii.gz"),
            "femur_left_marrow.nii.gz"
        );
        assert_eq!(
            lesion_file_name("PT_wb_resized.nii.gz"),
            "PT_wb_resized_lesion_snr.nii.gz"
        );
    }

    #[test]
    fn test_scan_classification() {
        assert!(is_primary_scan("CT_axial.nii.gz"));
        assert!(!is_primary_scan("PT_wb_resized.nii.gz"));

        assert!(is_uptake_scan("PT_wb_resized.nii.gz"));
        assert!(!is_uptake_scan("PT_wb.nii.gz")); // 未重采样
        assert!(!is_uptake_scan("PT_wb_resized_lesion_snr.nii.gz"));

        assert!(is_lesion_mask("PT_wb_resized_lesion_snr.nii.gz"));
    }
}
