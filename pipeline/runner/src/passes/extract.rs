//! 第一遍: 逐 (CT 扫描, 区域掩膜) 单元提取骨髓.

use super::{file_name, EXTRACT_MODE};
use crate::report::BatchReport;
use ct_marrow::prelude::*;
use log::{info, warn};
use std::fs;
use std::path::Path;
use utils::{naming, walk};

/// 对数据根目录下的每个 CT 扫描运行提取.
///
/// 约定: 区域掩膜位于 CT 文件旁的 `*_segmentation/` 目录
/// (由外部分割器产生), 输出写入同级的 `*_intermediate/` 目录.
/// 已存在的输出文件视为已处理并跳过, 重跑安全.
pub fn run(root: &Path, report: &mut BatchReport) {
    for ct_path in walk::find_files(root, naming::is_primary_scan) {
        let (Some(dir), Some(ct_name)) = (ct_path.parent(), file_name(&ct_path)) else {
            continue;
        };

        let seg_dir = dir.join(naming::segmentation_dir_name(ct_name));
        if !seg_dir.is_dir() {
            warn!("未找到分割目录, 跳过受试者: {}", ct_path.display());
            report.subjects_skipped += 1;
            continue;
        }

        let loader = match dataset::bone_mask_loader(&seg_dir) {
            Ok(l) => l,
            Err(e) => {
                warn!("分割目录不可读, 跳过受试者: {}: {e}", seg_dir.display());
                report.subjects_skipped += 1;
                continue;
            }
        };

        let inter_dir = dir.join(naming::intermediate_dir_name(ct_name));
        if let Err(e) = fs::create_dir_all(&inter_dir) {
            warn!("无法创建输出目录 {}: {e}", inter_dir.display());
            report.subjects_skipped += 1;
            continue;
        }

        let scan = match CtScan::open(&ct_path) {
            Ok(s) => s,
            Err(e) => {
                warn!("CT 扫描载入失败, 跳过受试者: {}: {e:?}", ct_path.display());
                report.subjects_skipped += 1;
                continue;
            }
        };
        info!("处理受试者: {}", ct_path.display());

        for (bone_file, mask) in loader {
            let out_path = inter_dir.join(naming::marrow_file_name(&bone_file));
            if out_path.exists() {
                report.units_skipped += 1;
                continue;
            }
            if !dataset::is_known_structure(&bone_file) {
                warn!("未知结构 {bone_file}, 仍尝试提取");
            }

            let bone = match mask {
                Ok(b) => b,
                Err(e) => {
                    warn!("区域掩膜载入失败 {bone_file}: {e:?}");
                    report.units_failed += 1;
                    continue;
                }
            };

            match extract_marrow(&scan, &bone, EXTRACT_MODE) {
                Ok(marrow) => match marrow.save(&out_path) {
                    Ok(()) => report.units_extracted += 1,
                    Err(e) => {
                        warn!("骨髓掩膜写出失败 {}: {e:?}", out_path.display());
                        report.units_failed += 1;
                    }
                },
                Err(e) => {
                    warn!("提取失败 {bone_file}: {e:?}");
                    report.units_failed += 1;
                }
            }
        }

        if utils::qa_enabled() {
            let z = scan.len_z() / 2;
            let qa_path = inter_dir.join("scan_qa.png");
            if let Err(e) = scan.slice_at(z).save_windowed(&qa_path, &utils::qa_window()) {
                warn!("QA 图像写出失败 {}: {e}", qa_path.display());
            }
        }
    }
}
