//! 转盘纯计算：按权重选择扇区索引、计算客户端动画角度。
//!
//! 随机数由调用方（service 层）抽取后传入，这里只做确定性计算，
//! 便于单元测试覆盖边界情况。

/// 转盘扇区总数
pub const WHEEL_SECTORS: i32 = 12;
/// 单个扇区的角度
pub const SEGMENT_DEGREES: f64 = 360.0 / WHEEL_SECTORS as f64;
/// 附加整圈数的下限/上限（含）
pub const EXTRA_TURNS_MIN: i64 = 5;
pub const EXTRA_TURNS_MAX: i64 = 10;

/// 按累积概率质量选择索引（轮盘赌选择）。
///
/// draw 应在 `[0, Σweights)` 内抽取；若因配置漂移导致 draw 越过
/// 实际总和（总和不足 100 等情况），回落到最后一个索引而不是崩溃。
/// weights 为空时返回 None。
pub fn pick_by_weight(weights: &[f64], draw: f64) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if draw < acc {
            return Some(i);
        }
    }
    // draw >= Σweights：钳制到末尾
    Some(weights.len() - 1)
}

/// 扇区中心相对指针的偏移角，归一化到 [0, 360)。
///
/// 指针固定在顶部（-90°），345 - index*30 使扇区**中心**而非边缘
/// 对准指针，避免停在扇区边界上的歧义落点。
pub fn sector_center_offset(sector_number: i32) -> f64 {
    let index = (sector_number - 1) as f64;
    (345.0 - index * SEGMENT_DEGREES).rem_euclid(360.0)
}

/// 计算客户端动画的目标角度。
///
/// 基础角度随用户累计旋转次数增长（每次 +20 圈），再叠加
/// extra_turns（调用方在 [5,10] 内抽取）整圈，保证同一用户的
/// 角度序列严格递增，动画始终向前转。
pub fn compute_rotation(sector_number: i32, user_spin_count: i64, extra_turns: i64) -> f64 {
    let base = (user_spin_count * 360 * 20 + extra_turns * 360) as f64;
    base + sector_center_offset(sector_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_weight_cumulative_walk() {
        // 第1扇区 5%，第2扇区 45%（累积到 50），其余 10 个各 5%
        let mut weights = vec![5.0, 45.0];
        weights.extend(std::iter::repeat(5.0).take(10));
        assert_eq!(weights.iter().sum::<f64>(), 100.0);

        // draw=46 落在 [5, 50) 区间，必须命中 45% 的扇区
        assert_eq!(pick_by_weight(&weights, 46.0), Some(1));
        // 边界：draw=5 刚好越过第一段
        assert_eq!(pick_by_weight(&weights, 5.0), Some(1));
        assert_eq!(pick_by_weight(&weights, 4.999), Some(0));
        assert_eq!(pick_by_weight(&weights, 99.9), Some(11));
    }

    #[test]
    fn test_pick_by_weight_clamps_to_sum() {
        // 总和不足 100 时，越界 draw 不崩溃，钳制到末尾
        let weights = vec![10.0, 10.0];
        assert_eq!(pick_by_weight(&weights, 25.0), Some(1));
        assert_eq!(pick_by_weight(&weights, 20.0), Some(1));
    }

    #[test]
    fn test_pick_by_weight_empty() {
        assert_eq!(pick_by_weight(&[], 0.0), None);
    }

    #[test]
    fn test_sector_center_offset_range() {
        for n in 1..=WHEEL_SECTORS {
            let offset = sector_center_offset(n);
            assert!((0.0..360.0).contains(&offset), "sector {n}: {offset}");
        }
        assert_eq!(sector_center_offset(1), 345.0);
        assert_eq!(sector_center_offset(12), 15.0);
    }

    #[test]
    fn test_rotation_monotonic_across_spins() {
        // 同一用户连续旋转，即使本次抽到最大附加圈数、下次最小，
        // 角度仍严格递增（20 圈的步进远大于附加圈数的波动）
        for n in 1..20i64 {
            let worst_current = compute_rotation(1, n, EXTRA_TURNS_MAX);
            let best_next = compute_rotation(12, n + 1, EXTRA_TURNS_MIN);
            assert!(best_next > worst_current, "spin {n}");
        }
    }

    #[test]
    fn test_rotation_mod_360_recovers_sector_center() {
        for n in 1..=WHEEL_SECTORS {
            for spins in [1i64, 2, 7, 100] {
                for extra in EXTRA_TURNS_MIN..=EXTRA_TURNS_MAX {
                    let rotation = compute_rotation(n, spins, extra);
                    assert!(rotation >= 0.0);
                    let recovered = rotation.rem_euclid(360.0);
                    assert!(
                        (recovered - sector_center_offset(n)).abs() < 1e-6,
                        "sector {n} spins {spins} extra {extra}"
                    );
                }
            }
        }
    }
}
