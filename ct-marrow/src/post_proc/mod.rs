//! 骨髓掩膜的后处理: 病灶剔除与受试者级聚合.

pub mod assemble;

pub mod exclusion;
