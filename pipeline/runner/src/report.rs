//! 批处理运行统计.

use std::fmt;

/// 四个处理阶段的累计计数.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 成功提取并写出的 (CT, 区域掩膜) 单元数.
    pub units_extracted: usize,

    /// 因输出已存在而跳过的单元数.
    pub units_skipped: usize,

    /// 失败 (载入、网格或写出错误) 的单元数.
    pub units_failed: usize,

    /// 因缺少分割目录等原因被整体跳过的受试者数.
    pub subjects_skipped: usize,

    /// 成功写出的病灶掩膜数.
    pub lesions_detected: usize,

    /// 完成病灶剔除并写出的骨髓掩膜数.
    pub masks_excluded: usize,

    /// 成功聚合的受试者数.
    pub subjects_assembled: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const S4: &str = "    ";

        writeln!(f, "Batch summary:")?;
        writeln!(f, "{S4}Units extracted: {}", self.units_extracted)?;
        writeln!(f, "{S4}Units skipped (already processed): {}", self.units_skipped)?;
        writeln!(f, "{S4}Units failed: {}", self.units_failed)?;
        writeln!(f, "{S4}Subjects skipped: {}", self.subjects_skipped)?;
        writeln!(f, "{S4}Lesion masks written: {}", self.lesions_detected)?;
        writeln!(f, "{S4}Marrow masks after exclusion: {}", self.masks_excluded)?;
        writeln!(f, "{S4}Subjects assembled: {}", self.subjects_assembled)
    }
}
