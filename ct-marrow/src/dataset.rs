//! 数据集操作.
//!
//! 提供迭代器风格的掩膜目录加载器, 以及聚合输入的文件名过滤规则.

use crate::consts::{bones, COMPOSITE_FILE};
use crate::{BoneMask, MarrowMask};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 判断文件名是否是 nii 体数据文件.
#[inline]
pub fn is_nii(name: &str) -> bool {
    name.ends_with(".nii") || name.ends_with(".nii.gz")
}

/// 从掩膜文件名提取结构名 (去掉扩展名与可选的 `_marrow` 后缀).
pub fn structure_name(file: &str) -> &str {
    let base = file
        .strip_suffix(".nii.gz")
        .or_else(|| file.strip_suffix(".nii"))
        .unwrap_or(file);
    base.strip_suffix("_marrow").unwrap_or(base)
}

/// 判断文件名是否对应外部分割器已知的骨骼结构.
#[inline]
pub fn is_known_structure(file: &str) -> bool {
    bones::ALL.contains(&structure_name(file))
}

/// 判断一个文件是否参与受试者级聚合.
///
/// 参与条件: nii 格式的骨髓掩膜文件, 不是先前的合成输出,
/// 且其结构含骨髓. 未知结构一律视为含骨髓, 只排除明确不含骨髓的结构.
pub fn is_assembly_input(name: &str) -> bool {
    if !is_nii(name) || name == COMPOSITE_FILE || !name.contains("marrow") {
        return false;
    }
    let structure = structure_name(name);
    bones::MARROW_BEARING.contains(structure) || !bones::ALL.contains(&structure)
}

/// 列出目录下全部 nii 文件名. 结果升序排序, 保证迭代顺序稳定.
fn nii_entries(dir: &Path) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| is_nii(n))
        .collect();
    names.sort_unstable();
    Ok(names)
}

/// 从分割目录创建区域掩膜加载器.
///
/// 目录不存在或不可读时返回 `Err`, 由调用者报告并跳过该受试者;
/// 单个文件的载入错误在迭代时以 `Result` 形式返回.
pub fn bone_mask_loader<P: AsRef<Path>>(dir: P) -> io::Result<BoneMaskLoader> {
    let path = dir.as_ref().to_owned();
    let mut names = nii_entries(&path)?;
    names.reverse();

    Ok(BoneMaskLoader {
        path,
        names_rev: names,
    })
}

/// 区域掩膜加载器, 按文件名升序逐个打开分割目录下的掩膜.
#[derive(Debug)]
pub struct BoneMaskLoader {
    path: PathBuf,
    names_rev: Vec<String>,
}

impl Iterator for BoneMaskLoader {
    type Item = (String, nifti::Result<BoneMask>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names_rev.pop()?;

        self.path.push(&name);
        let data = BoneMask::open(self.path.as_path());
        self.path.pop();

        Some((name, data))
    }
}

impl ExactSizeIterator for BoneMaskLoader {
    #[inline]
    fn len(&self) -> usize {
        self.names_rev.len()
    }
}

/// 从骨髓目录创建骨髓掩膜加载器, 迭代目录下全部 nii 文件.
///
/// 目录不存在或不可读时返回 `Err`, 由调用者报告并跳过该受试者;
/// 单个文件的载入错误在迭代时以 `Result` 形式返回.
pub fn marrow_loader<P: AsRef<Path>>(dir: P) -> io::Result<MarrowLoader> {
    let path = dir.as_ref().to_owned();
    let mut names = nii_entries(&path)?;
    names.reverse();

    Ok(MarrowLoader {
        path,
        names_rev: names,
    })
}

/// 从骨髓目录创建聚合输入加载器. 只迭代通过 [`is_assembly_input`]
/// 过滤的文件.
///
/// 目录不存在或不可读时返回 `Err`, 由调用者报告并跳过该受试者;
/// 单个文件的载入错误在迭代时以 `Result` 形式返回.
pub fn assembly_loader<P: AsRef<Path>>(dir: P) -> io::Result<MarrowLoader> {
    let path = dir.as_ref().to_owned();
    let mut names: Vec<String> = nii_entries(&path)?
        .into_iter()
        .filter(|n| is_assembly_input(n))
        .collect();
    names.reverse();

    Ok(MarrowLoader {
        path,
        names_rev: names,
    })
}

/// 骨髓掩膜加载器, 按文件名升序逐个打开骨髓掩膜.
#[derive(Debug)]
pub struct MarrowLoader {
    path: PathBuf,
    names_rev: Vec<String>,
}

impl Iterator for MarrowLoader {
    type Item = (String, nifti::Result<MarrowMask>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names_rev.pop()?;

        self.path.push(&name);
        let data = MarrowMask::open(self.path.as_path());
        self.path.pop();

        Some((name, data))
    }
}

impl ExactSizeIterator for MarrowLoader {
    #[inline]
    fn len(&self) -> usize {
        self.names_rev.len()
    }
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_data_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_data_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_name_strips_suffixes() {
        assert_eq!(structure_name("femur_left.nii.gz"), "femur_left");
        assert_eq!(structure_name("femur_left_marrow.nii.gz"), "femur_left");
        assert_eq!(structure_name("vertebrae_L1_marrow.nii"), "vertebrae_L1");
        assert_eq!(structure_name("sacrum"), "sacrum");
    }

    #[test]
    fn test_known_structures() {
        assert!(is_known_structure("rib_left_10.nii.gz"));
        assert!(is_known_structure("spinal_cord_marrow.nii.gz"));
        assert!(!is_known_structure("implant.nii.gz"));
    }

    #[test]
    fn test_assembly_input_filter() {
        // 含骨髓结构的掩膜参与聚合.
        assert!(is_assembly_input("femur_left_marrow.nii.gz"));
        assert!(is_assembly_input("vertebrae_T12_marrow.nii.gz"));
        // 未知结构视为含骨髓.
        assert!(is_assembly_input("implant_marrow.nii.gz"));
        // 不含骨髓的结构被排除.
        assert!(!is_assembly_input("spinal_cord_marrow.nii.gz"));
        // 先前的合成输出被排除, 重跑不会重复计数.
        assert!(!is_assembly_input(COMPOSITE_FILE));
        // 非骨髓掩膜文件被排除.
        assert!(!is_assembly_input("femur_left.nii.gz"));
        assert!(!is_assembly_input("report.txt"));
    }
}
