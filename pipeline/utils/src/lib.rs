//! 批处理驱动依赖的通用组件.

use ct_marrow::HuWindow;
use std::env;
use std::path::PathBuf;

pub mod naming;

pub mod walk;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) {
    writeln!(&mut w, "{SEP}").unwrap();
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 获取批处理数据根目录.
///
/// 1. 若环境变量 `$MARROW_DATA_ROOT` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset`.
pub fn data_root_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("MARROW_DATA_ROOT") {
        PathBuf::from(d)
    } else {
        ct_marrow::dataset::home_data_dir().unwrap()
    }
}

/// 是否开启 QA 图像导出. 由环境变量 `$MARROW_QA` 非空控制.
pub fn qa_enabled() -> bool {
    env::var("MARROW_QA").is_ok_and(|v| !v.is_empty())
}

/// 创建一般情况下适合可视化骨髓窗内容的灰度映射窗口.
/// 该窗口覆盖分割窗下界到松质骨上缘.
#[inline]
pub fn qa_window() -> HuWindow {
    HuWindow::new(-100.0, 300.0).unwrap()
}
