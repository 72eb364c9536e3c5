//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{
    BoneMask, CompositeMarrow, CtScan, GeometryMeta, HuWindow, LesionMask, MarrowMask, MaskSlice,
    NiftiHeaderAttr, ScanSlice, SliceWritePng,
};

pub use crate::consts::mask::{BACKGROUND, MARROW};
pub use crate::consts::{VoxelClass, HU_FLOOR, OPENING_MIN_DIM, SNR_LESION_FLOOR};

pub use crate::error::MarrowError;

pub use crate::extract::extract_marrow;
pub use crate::snr::detect_lesions;
pub use crate::threshold::ThresholdMode;

pub use crate::post_proc::assemble::assemble_composite;
pub use crate::post_proc::exclusion::{exclude_lesions, LesionPolicy};

pub use crate::dataset::{self, home_data_dir_with};

#[cfg(feature = "rayon")]
pub use crate::extract::par_extract_marrow;
