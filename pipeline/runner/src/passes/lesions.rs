//! 病灶检测: 对每个重采样后的摄取扫描计算信噪比病灶掩膜.

use super::file_name;
use crate::report::BatchReport;
use ct_marrow::prelude::*;
use log::{info, warn};
use std::path::Path;
use utils::{naming, walk};

/// 对数据根目录下的每个摄取扫描运行病灶检测.
///
/// 输出病灶掩膜写到扫描文件旁; 已存在的输出视为已处理并跳过.
/// 没有摄取扫描的受试者不产生病灶掩膜, 后续剔除阶段自然退化为原样通过.
pub fn run(root: &Path, report: &mut BatchReport) {
    for pt_path in walk::find_files(root, naming::is_uptake_scan) {
        let (Some(dir), Some(pt_name)) = (pt_path.parent(), file_name(&pt_path)) else {
            continue;
        };

        let out_path = dir.join(naming::lesion_file_name(pt_name));
        if out_path.exists() {
            report.units_skipped += 1;
            continue;
        }

        let scan = match CtScan::open(&pt_path) {
            Ok(s) => s,
            Err(e) => {
                warn!("摄取扫描载入失败 {}: {e:?}", pt_path.display());
                report.units_failed += 1;
                continue;
            }
        };

        let lesion = detect_lesions(&scan, SNR_LESION_FLOOR);
        info!(
            "病灶检测 {}: {} 个病灶体素",
            pt_path.display(),
            lesion.count_lesion()
        );
        match lesion.save(&out_path) {
            Ok(()) => report.lesions_detected += 1,
            Err(e) => {
                warn!("病灶掩膜写出失败 {}: {e:?}", out_path.display());
                report.units_failed += 1;
            }
        }
    }
}
