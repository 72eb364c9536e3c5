//! 第二遍: 受试者级聚合.

use crate::report::BatchReport;
use ct_marrow::consts::COMPOSITE_FILE;
use ct_marrow::prelude::*;
use log::{info, warn};
use std::path::Path;
use utils::{naming, walk};

/// 对每个已有最终骨髓掩膜目录的受试者聚合合成体数据.
///
/// 聚合输入由 [`ct_marrow::dataset::is_assembly_input`] 过滤:
/// 不含骨髓的结构与先前的合成输出不参与, 重跑不会重复计数.
/// 合成文件已存在的受试者被跳过.
pub fn run(root: &Path, report: &mut BatchReport) {
    for ct_path in walk::find_files(root, naming::is_primary_scan) {
        let Some(dir) = ct_path.parent() else {
            continue;
        };

        let marrow_dir = dir.join(naming::MARROW_DIR);
        if !marrow_dir.is_dir() {
            continue; // 尚未剔除
        }

        let composite_path = marrow_dir.join(COMPOSITE_FILE);
        if composite_path.exists() {
            report.units_skipped += 1;
            continue;
        }

        let loader = match dataset::assembly_loader(&marrow_dir) {
            Ok(l) => l,
            Err(e) => {
                warn!("骨髓目录不可读 {}: {e}", marrow_dir.display());
                report.subjects_skipped += 1;
                continue;
            }
        };

        // 任一掩膜载入失败都使该受试者聚合失败: 缺少贡献者的合成结果是错的.
        let mut masks = Vec::with_capacity(loader.len());
        let mut broken = false;
        for (name, mask) in loader {
            match mask {
                Ok(m) => masks.push(m),
                Err(e) => {
                    warn!("聚合输入载入失败 {name}: {e:?}");
                    broken = true;
                    break;
                }
            }
        }
        if broken {
            report.units_failed += 1;
            continue;
        }

        match assemble_composite(masks) {
            Ok(composite) => {
                info!(
                    "聚合 {}: 最大覆盖次数 {}",
                    marrow_dir.display(),
                    composite.max_overlap()
                );
                if let Err(e) = composite.save(&composite_path) {
                    warn!("合成体数据写出失败 {}: {e:?}", composite_path.display());
                    report.units_failed += 1;
                    continue;
                }
                report.subjects_assembled += 1;

                if utils::qa_enabled() {
                    let union = composite.binary_union();
                    let z = composite.len_z() / 2;
                    let qa_path = marrow_dir.join("assembled_marrow_qa.png");
                    if let Err(e) = union.slice_at(z).save_png(&qa_path) {
                        warn!("QA 图像写出失败 {}: {e}", qa_path.display());
                    }
                }
            }
            Err(e) => {
                warn!("聚合失败 {}: {e:?}", marrow_dir.display());
                report.units_failed += 1;
            }
        }
    }
}
