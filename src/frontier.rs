use hashbrown::HashSet;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<String>,
    seen: HashSet<String>,
    downloaded: HashSet<String>,
    in_flight: usize,
}

/// Work queue shared by the crawl workers.
///
/// A canonical URL is admitted at most once for the lifetime of the crawl,
/// whether it is currently queued, in flight, or long finished. Workers pull
/// with [`Frontier::pop_next`], which tells apart a momentarily empty queue
/// from a finished crawl.
#[derive(Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    wake: Notify,
}

impl Frontier {
    /// An empty frontier.
    pub fn new() -> Self {
        Default::default()
    }

    /// Admit a canonical URL. Returns false when it was already seen.
    pub fn push(&self, url: String) -> bool {
        {
            let mut state = self.state.lock();

            if state.seen.contains(&url) {
                return false;
            }

            state.seen.insert(url.clone());
            state.queue.push_back(url);
        }

        self.wake.notify_one();
        true
    }

    /// Take the next URL to fetch, or `None` once the crawl is exhausted.
    ///
    /// Suspends while the queue is empty but other workers still hold URLs
    /// in flight, since any of them may push fresh links. Only an empty
    /// queue with nothing in flight ends the crawl.
    pub async fn pop_next(&self) -> Option<String> {
        loop {
            let pending = self.wake.notified();

            {
                let mut state = self.state.lock();

                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(url);
                }

                if state.in_flight == 0 {
                    drop(state);
                    // ripple the shutdown to the next suspended worker
                    self.wake.notify_one();
                    return None;
                }
            }

            pending.await;
        }
    }

    /// Mark a popped URL fully processed and record it as downloaded.
    pub fn mark_complete(&self, url: &str) {
        let exhausted = {
            let mut state = self.state.lock();

            state.downloaded.insert(url.to_string());
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0 && state.queue.is_empty()
        };

        if exhausted {
            self.wake.notify_one();
        }
    }

    /// Count of URLs fully processed.
    pub fn downloaded_count(&self) -> usize {
        self.state.lock().downloaded.len()
    }

    /// Whether a URL has been fully processed.
    pub fn is_downloaded(&self, url: &str) -> bool {
        self.state.lock().downloaded.contains(url)
    }

    /// Count of URLs waiting to be fetched.
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Count of URLs ever admitted.
    pub fn seen_count(&self) -> usize {
        self.state.lock().seen.len()
    }
}

#[tokio::test]
async fn test_push_dedups() {
    let frontier = Frontier::new();

    assert!(frontier.push("https://www.ics.uci.edu/".to_string()));
    assert!(!frontier.push("https://www.ics.uci.edu/".to_string()));
    assert_eq!(frontier.pending_count(), 1);
    assert_eq!(frontier.seen_count(), 1);
}

#[tokio::test]
async fn test_pop_complete_exhausts() {
    let frontier = Frontier::new();
    frontier.push("https://www.ics.uci.edu/".to_string());

    let url = frontier.pop_next().await.unwrap();
    assert_eq!(url, "https://www.ics.uci.edu/");

    frontier.mark_complete(&url);
    assert_eq!(frontier.downloaded_count(), 1);
    assert_eq!(frontier.pop_next().await, None);
}

#[tokio::test]
async fn test_completed_urls_never_requeue() {
    let frontier = Frontier::new();
    frontier.push("https://www.ics.uci.edu/".to_string());

    let url = frontier.pop_next().await.unwrap();
    frontier.mark_complete(&url);

    assert!(!frontier.push(url));
    assert_eq!(frontier.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_queue_with_work_in_flight_suspends() {
    use std::sync::Arc;
    use std::time::Duration;

    let frontier = Arc::new(Frontier::new());
    frontier.push("https://www.ics.uci.edu/".to_string());
    let held = frontier.pop_next().await.unwrap();

    let waiter = tokio::spawn({
        let frontier = frontier.clone();
        async move { frontier.pop_next().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    frontier.push("https://www.ics.uci.edu/about".to_string());
    let released = waiter.await.unwrap();
    assert_eq!(released.as_deref(), Some("https://www.ics.uci.edu/about"));

    frontier.mark_complete(&held);
    frontier.mark_complete("https://www.ics.uci.edu/about");
    assert_eq!(frontier.pop_next().await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_waiters_drain_on_exhaustion() {
    use std::sync::Arc;
    use std::time::Duration;

    let frontier = Arc::new(Frontier::new());
    frontier.push("https://www.ics.uci.edu/".to_string());
    let held = frontier.pop_next().await.unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            tokio::spawn({
                let frontier = frontier.clone();
                async move { frontier.pop_next().await }
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    frontier.mark_complete(&held);

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), None);
    }
}
