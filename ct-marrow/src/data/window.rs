//! 骨髓分割窗.

use crate::consts::{VoxelClass, HU_FLOOR};
use num::ToPrimitive;

/// 强度分割窗, 由下界和上界构成的闭区间.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
/// 倒置的窗口 (下界大于上界) 是合法的, 它不包含任何强度值.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HuWindow {
    floor: f64,
    upper: f64,
}

impl HuWindow {
    /// 构建分割窗.
    ///
    /// `floor` 和 `upper` 必须均为有限值, 否则返回 `None`.
    pub fn new(floor: f64, upper: f64) -> Option<HuWindow> {
        (floor.is_finite() && upper.is_finite()).then_some(Self { floor, upper })
    }

    /// 以系统级下界 [`HU_FLOOR`] 和给定上阈值构建分割窗.
    ///
    /// `upper` 必须为有限值, 否则程序 panic. 阈值选择器的输出总是有限的.
    #[inline]
    pub fn with_floor(upper: f64) -> HuWindow {
        assert!(upper.is_finite());
        Self {
            floor: HU_FLOOR,
            upper,
        }
    }

    /// 窗下界.
    #[inline]
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// 窗上界.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// 判断强度值 `v` 是否落在窗内 (闭区间).
    ///
    /// 无法转换为 `f64` 的值视为窗外.
    #[inline]
    pub fn contains<T: ToPrimitive>(&self, v: T) -> bool {
        v.to_f64()
            .is_some_and(|v| (self.floor..=self.upper).contains(&v))
    }

    /// 判断强度值 `v` 对应的体素类型.
    #[inline]
    pub fn classify<T: ToPrimitive>(&self, v: T) -> VoxelClass {
        if self.contains(v) {
            VoxelClass::Marrow
        } else {
            VoxelClass::Background
        }
    }

    /// 求在当前窗设置下, 强度值对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_gray(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let v = v as f64;
        let width = self.upper - self.floor;
        if v <= self.floor || width <= 0.0 {
            Some(u8::MIN)
        } else if v >= self.upper {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some(((v - self.floor) / width * 255.0) as u8)
        }
    }
}
