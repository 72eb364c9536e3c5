//! 批处理入口.
//!
//! 对数据根目录做两遍处理: 第一遍对每个 (CT 扫描, 区域掩膜) 单元提取骨髓
//! 并检测/剔除病灶, 第二遍对每个受试者聚合合成骨髓体数据.
//! 固定配置, 无命令行参数; 数据根目录由 `$MARROW_DATA_ROOT` 或
//! `$HOME/dataset` 给出.

use log::info;

mod passes;
mod report;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    let root = utils::data_root_from_env_or_home();
    assert!(root.is_dir(), "数据根目录不存在: {}", root.display());
    info!(
        "数据根目录: {}; 可用核心数: {}",
        root.display(),
        utils::cpus()
    );

    let mut report = report::BatchReport::default();
    passes::extract::run(&root, &mut report);
    passes::lesions::run(&root, &mut report);
    passes::exclude::run(&root, &mut report);
    passes::assemble::run(&root, &mut report);

    utils::sep();
    print!("{report}");
}
