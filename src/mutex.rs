use core::{
    cell::UnsafeCell,
    sync::atomic::AtomicBool,
    sync::atomic::Ordering::*,
    future::poll_fn,
    task::Poll,
    ops::{Deref, DerefMut},
    };

/// lock polled instead of queued, cheap enough for the few contenders of a serial port
pub struct BusyMutex<T> {
    value: UnsafeCell<T>,
    locked: AtomicBool,
}
// SAFETY: the value is only reachable through a guard, and only one guard exists at a time
unsafe impl<T: Send> Sync for BusyMutex<T> {}
unsafe impl<T: Send> Send for BusyMutex<T> {}

impl<T> BusyMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: value.into(),
            locked: AtomicBool::new(false),
        }
    }
    /// busy polling future until lock is acquired
    pub async fn lock(&self) -> BusyMutexGuard<'_, T> {
        poll_fn(|context| match BusyMutexGuard::try_new(self) {
            Some(guard) => Poll::Ready(guard),
            None => {
                // ask to be polled again, nobody else will wake us
                context.waker().wake_by_ref();
                Poll::Pending
            },
            }).await
    }
}
impl<T> From<T> for BusyMutex<T> {
    fn from(value: T) -> Self {Self::new(value)}
}

pub struct BusyMutexGuard<'m, T> {
    mutex: &'m BusyMutex<T>,
}
impl<'m, T> BusyMutexGuard<'m, T> {
    fn try_new(mutex: &'m BusyMutex<T>) -> Option<Self> {
        if mutex.locked.swap(true, Acquire)
            {None}
        else
            {Some(Self {mutex})}
    }
}
impl<T> Deref for BusyMutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe {& *self.mutex.value.get()}
    }
}
impl<T> DerefMut for BusyMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe {&mut *self.mutex.value.get()}
    }
}
impl<T> Drop for BusyMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.locked.store(false, Release);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exclusive() {
        let mutex = BusyMutex::new(5);
        let mut guard = mutex.lock().await;
        assert!(BusyMutexGuard::try_new(&mutex).is_none());
        *guard += 1;
        drop(guard);
        assert_eq!(*mutex.lock().await, 6);
    }

    #[tokio::test]
    async fn lock_waits_for_release() {
        let mutex = BusyMutex::new(0);
        let guard = mutex.lock().await;
        let waiting = async {
            *mutex.lock().await += 1;
        };
        let releasing = async move {
            tokio::task::yield_now().await;
            drop(guard);
        };
        tokio::join!(waiting, releasing);
        assert_eq!(*mutex.lock().await, 1);
    }
}
