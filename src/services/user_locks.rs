use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 按用户粒度的串行化锁注册表。
///
/// 余额记录的所有修改方（spin、Stars 到账、Stars 兑换、余额评估、
/// 批量恢复）都必须先持有该用户的锁再开启事务，保证同一用户
/// 同时最多只有一次余额变更在途，消除"先查后扣"的竞态。
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某用户的锁，返回的 guard 在持有期间阻塞该用户的其它修改方
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // 强引用只剩注册表自身的锁没有在途操作，顺手回收，
            // 注册表不会随用户数无界增长
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = UserLocks::new();
        let guard = locks.acquire(1).await;

        let locks2 = locks.clone();
        let second = tokio::spawn(async move { locks2.acquire(1).await });
        // 第一个 guard 未释放前，第二次获取不应完成
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        drop(guard);
        second.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_users_are_independent() {
        let locks = UserLocks::new();
        let _guard = locks.acquire(1).await;
        // 另一个用户的锁不受影响
        let _other = locks.acquire(2).await;
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = UserLocks::new();
        drop(locks.acquire(1).await);
        drop(locks.acquire(2).await);

        // 仍被持有的锁保留，空闲条目在下次获取时被回收
        let _held = locks.acquire(3).await;
        let _other = locks.acquire(4).await;
        assert_eq!(locks.tracked().await, 2);
    }
}
