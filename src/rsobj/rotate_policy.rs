/// 轮转策略：大小与日期两个独立条件，任一满足即触发
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotatePolicy {
    /// 大小上限（字节），None 表示不按大小轮转
    pub size_limit: Option<u64>,
    /// 是否按天轮转
    pub daily: bool,
}

impl RotatePolicy {
    /// 每次写入成功后调用。大小条件与日期条件为或关系，
    /// 两者同时满足也只触发一次轮转
    pub fn should_rotate(&self, file_size: u64, today: &str, last_date: &str) -> bool {
        if let Some(limit) = self.size_limit {
            if file_size >= limit {
                return true;
            }
        }
        self.daily && today != last_date
    }
}

/// 单位换算：K/M/G，其他单位按原始字节数
pub fn size_bytes(value: u64, unit: &str) -> u64 {
    match unit {
        "K" => value.saturating_mul(1024),
        "M" => value.saturating_mul(1024 * 1024),
        "G" => value.saturating_mul(1024 * 1024 * 1024),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_unit_multipliers() {
        assert_eq!(size_bytes(10, "K"), 10 * 1024);
        assert_eq!(size_bytes(10, "M"), 10 * 1024 * 1024);
        assert_eq!(size_bytes(2, "G"), 2 * 1024 * 1024 * 1024);
        assert_eq!(size_bytes(123, ""), 123);
        assert_eq!(size_bytes(123, "B"), 123);
    }

    #[test]
    fn oversized_values_saturate_instead_of_overflowing() {
        // 配置文件里的离谱数值不应 panic
        assert_eq!(size_bytes(u64::MAX, "G"), u64::MAX);
        assert_eq!(size_bytes(u64::MAX / 2, "K"), u64::MAX);
    }

    #[test]
    fn size_policy_fires_at_threshold() {
        let policy = RotatePolicy {
            size_limit: Some(100),
            daily: false,
        };
        assert!(!policy.should_rotate(99, "2026-08-28", "2026-08-28"));
        assert!(policy.should_rotate(100, "2026-08-28", "2026-08-28"));
        assert!(policy.should_rotate(101, "2026-08-28", "2026-08-28"));
    }

    #[test]
    fn calendar_policy_fires_on_date_change() {
        let policy = RotatePolicy {
            size_limit: None,
            daily: true,
        };
        assert!(!policy.should_rotate(0, "2026-08-28", "2026-08-28"));
        assert!(policy.should_rotate(0, "2026-08-29", "2026-08-28"));
    }

    #[test]
    fn both_conditions_single_decision() {
        let policy = RotatePolicy {
            size_limit: Some(10),
            daily: true,
        };
        // 两个条件同时满足，结果仍是一个 bool，一次轮转
        assert!(policy.should_rotate(10, "2026-08-29", "2026-08-28"));
    }

    #[test]
    fn disabled_policy_never_fires() {
        let policy = RotatePolicy::default();
        assert!(!policy.should_rotate(u64::MAX, "2026-08-29", "2026-08-28"));
    }
}
