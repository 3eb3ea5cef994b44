//! Single-flight execution: concurrent callers of the same operation share
//! one in-flight future and all observe its output.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

pub struct SingleFlight<T: Clone> {
    slot: Mutex<Option<(u64, Shared<BoxFuture<'static, T>>)>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Join the in-flight call, or start one with `start` if none is running.
    /// The slot is cleared once the flight that filled it completes, so the
    /// next call after completion starts a fresh flight.
    pub async fn run<F, Fut>(&self, start: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (id, flight) = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some((id, flight)) => {
                    tracing::trace!(flight = id, "joining in-flight call");
                    (*id, flight.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let flight = start().boxed().shared();
                    *slot = Some((id, flight.clone()));
                    (id, flight)
                }
            }
        };

        let output = flight.await;

        let mut slot = self.slot.lock().await;
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            *slot = None;
        }
        output
    }

    pub async fn in_flight(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let flight = Arc::new(SingleFlight::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |flight: Arc<SingleFlight<u32>>, calls: Arc<AtomicUsize>| async move {
            flight
                .run(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    42
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(flight.clone(), calls.clone()),
            run(flight.clone(), calls.clone())
        );

        assert_eq!((a, b), (42, 42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!flight.in_flight().await);
    }

    #[tokio::test]
    async fn sequential_calls_start_new_flights() {
        let flight = SingleFlight::<usize>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=2 {
            let calls = calls.clone();
            let n = flight
                .run(move || async move { calls.fetch_add(1, Ordering::SeqCst) + 1 })
                .await;
            assert_eq!(n, expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
