//! 时间单位换算.
//!
//! 容器索引以纳秒提供块的显示时间; 下游播放管线使用 100ns 参考单位
//! (reference time). 本模块提供两者之间的换算与相关哨兵值.

/// 表示"未定义/无约束"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 表示"未配置预滚边界"的哨兵值
pub const NO_PREROLL: i64 = -1;

/// 每个 100ns 参考单位对应的纳秒数
pub const NS_PER_REFTIME: i64 = 100;

/// 纳秒 → 100ns 参考单位
///
/// 整数除法, 向零截断, 不做四舍五入.
/// 长流场景下截断策略影响累计漂移, 必须与下游时间刻度保持一致.
pub const fn ns_to_reftime(ns: i64) -> i64 {
    ns / NS_PER_REFTIME
}

/// 100ns 参考单位 → 纳秒
pub const fn reftime_to_ns(reftime: i64) -> i64 {
    reftime * NS_PER_REFTIME
}

/// 纳秒 → 秒 (f64), 用于日志输出
pub fn ns_to_seconds(ns: i64) -> f64 {
    ns as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reftime_整除换算() {
        // 33ms = 33_000_000 ns = 330_000 个 100ns 单位
        assert_eq!(ns_to_reftime(33_000_000), 330_000);
        assert_eq!(reftime_to_ns(330_000), 33_000_000);
    }

    #[test]
    fn test_reftime_向零截断() {
        assert_eq!(ns_to_reftime(199), 1);
        assert_eq!(ns_to_reftime(99), 0);
        // 负值同样向零截断 (不是向下取整)
        assert_eq!(ns_to_reftime(-199), -1);
    }

    #[test]
    fn test_ns_转换为秒() {
        assert!((ns_to_seconds(1_500_000_000) - 1.5).abs() < f64::EPSILON);
    }
}
