//! 每日流水号冲突的重试策略：有上限的指数退避，带随机抖动

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 总尝试次数，包含第一次
    pub max_attempts: u32,
    /// 第一次重试前的延迟（抖动前）
    pub base_delay: Duration,
    /// 延迟上限（抖动前）
    pub max_delay: Duration,
    /// 延迟乘以 [1 - jitter, 1 + jitter] 内的随机系数
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    /// 尝试之间不等待
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// 第 `attempt` 次（从 1 开始）之后是否还能再试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// 第 `attempt` 次（从 1 开始）失败后的延迟
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let capped = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        if self.jitter <= 0.0 || capped.is_zero() {
            return capped;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        capped.mul_f64(factor.max(0.0))
    }
}
