//! 目录树遍历.

use std::fs;
use std::path::{Path, PathBuf};

/// 递归收集 `root` 下的全部普通文件路径. 结果升序排序,
/// 保证批处理顺序稳定. 不可读的子目录被静默跳过.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_owned()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort_unstable();
    out
}

/// 递归收集 `root` 下文件名满足 `pred` 的全部文件路径, 升序排序.
pub fn find_files(root: &Path, pred: fn(&str) -> bool) -> Vec<PathBuf> {
    collect_files(root)
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(pred)
        })
        .collect()
}
