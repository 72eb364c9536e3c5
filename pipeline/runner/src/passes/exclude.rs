//! 病灶剔除: 将病灶体素从中间骨髓掩膜中去除, 产出最终骨髓掩膜.

use super::file_name;
use crate::report::BatchReport;
use ct_marrow::prelude::*;
use log::warn;
use std::fs;
use std::path::Path;
use utils::{naming, walk};

/// 收集 `dir` 下该受试者的全部病灶掩膜.
fn load_lesions(dir: &Path, report: &mut BatchReport) -> Vec<LesionMask> {
    let mut lesions = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return lesions;
    };
    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| file_name(p).is_some_and(naming::is_lesion_mask))
        .collect();
    files.sort_unstable();

    for path in files {
        match LesionMask::open(&path) {
            Ok(l) => lesions.push(l),
            Err(e) => {
                warn!("病灶掩膜载入失败 {}: {e:?}", path.display());
                report.units_failed += 1;
            }
        }
    }
    lesions
}

/// 对每个已有中间结果的受试者运行剔除.
///
/// 多个病灶掩膜按合并策略一次剔除; 没有病灶掩膜时中间掩膜原样通过.
/// 最终掩膜写入受试者的 `marrow_segmentation/` 目录,
/// 已存在的输出视为已处理并跳过.
pub fn run(root: &Path, report: &mut BatchReport) {
    for ct_path in walk::find_files(root, naming::is_primary_scan) {
        let (Some(dir), Some(ct_name)) = (ct_path.parent(), file_name(&ct_path)) else {
            continue;
        };

        let inter_dir = dir.join(naming::intermediate_dir_name(ct_name));
        if !inter_dir.is_dir() {
            continue; // 尚未提取
        }

        let loader = match dataset::marrow_loader(&inter_dir) {
            Ok(l) => l,
            Err(e) => {
                warn!("中间目录不可读 {}: {e}", inter_dir.display());
                report.subjects_skipped += 1;
                continue;
            }
        };

        let marrow_dir = dir.join(naming::MARROW_DIR);
        if let Err(e) = fs::create_dir_all(&marrow_dir) {
            warn!("无法创建输出目录 {}: {e}", marrow_dir.display());
            report.subjects_skipped += 1;
            continue;
        }

        let lesions = load_lesions(dir, report);

        for (name, mask) in loader {
            let out_path = marrow_dir.join(&name);
            if out_path.exists() {
                report.units_skipped += 1;
                continue;
            }

            let marrow = match mask {
                Ok(m) => m,
                Err(e) => {
                    warn!("骨髓掩膜载入失败 {name}: {e:?}");
                    report.units_failed += 1;
                    continue;
                }
            };

            match exclude_lesions(&marrow, &lesions, LesionPolicy::Union) {
                Ok(outs) => {
                    // Union 策略只产生一个输出.
                    let out = outs.into_iter().next().unwrap();
                    match out.save(&out_path) {
                        Ok(()) => report.masks_excluded += 1,
                        Err(e) => {
                            warn!("最终掩膜写出失败 {}: {e:?}", out_path.display());
                            report.units_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("剔除失败 {name}: {e:?}");
                    report.units_failed += 1;
                }
            }
        }
    }
}
