//! Page-at-a-time concurrent execution of deletions
//!
//! Every item of a page gets its own task; all tasks of the page run
//! concurrently and the coordinator waits for the whole page before returning,
//! so work from two pages never overlaps. Failures are collected after the page
//! barrier and handled according to the [`FailurePolicy`].

use crate::cli::config::FailurePolicy;
use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use futures::future::join_all;
use std::future::Future;

/// Running totals of a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Identifiers removed, moved or restored
    pub succeeded: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Pages processed
    pub pages: usize,
}

impl Tally {
    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            pages: self.pages + other.pages,
        }
    }

    /// Fail when any task failed
    pub fn into_result(self) -> Result<Tally> {
        if self.failed > 0 {
            Err(PurgeError::Incomplete {
                failed: self.failed,
            })
        } else {
            Ok(self)
        }
    }
}

pub struct PageCoordinator {
    policy: FailurePolicy,
    output: Logger,
    tally: Tally,
}

impl PageCoordinator {
    pub fn new(policy: FailurePolicy, output: Logger) -> Self {
        Self {
            policy,
            output,
            tally: Tally::default(),
        }
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Run one task per item concurrently and wait for all of them.
    ///
    /// Each task resolves to the number of identifiers it handled. Tasks that are
    /// already running always complete; their errors are inspected only once the
    /// whole page is done. Under [`FailurePolicy::FailFast`] the first error is
    /// returned and the caller must not fetch another page.
    pub async fn run_page<I, F, Fut>(&mut self, items: I, task: F) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<usize>>,
    {
        let results = join_all(items.into_iter().map(task)).await;
        self.tally.pages += 1;

        let (handled, first_error) = self.settle(results);
        self.tally.succeeded += handled.into_iter().sum::<usize>();
        first_error.map_or(Ok(()), Err)
    }

    /// Run a preparatory step for every item of the current page.
    ///
    /// Same barrier and failure handling as [`Self::run_page`], but successful
    /// outputs are handed back instead of being counted, so the caller can feed
    /// them into the page's deletions.
    pub async fn run_stage<I, F, Fut, T>(&mut self, items: I, task: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let results = join_all(items.into_iter().map(task)).await;
        let (done, first_error) = self.settle(results);
        first_error.map_or(Ok(done), Err)
    }

    fn settle<T>(&mut self, results: Vec<Result<T>>) -> (Vec<T>, Option<PurgeError>) {
        let mut done = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(value) => done.push(value),
                Err(e) => {
                    self.tally.failed += 1;
                    match self.policy {
                        FailurePolicy::FailFast if first_error.is_none() => {
                            first_error = Some(e);
                        }
                        _ => self.output.error(&e.to_string()),
                    }
                }
            }
        }
        (done, first_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_test::block_on;

    #[tokio::test]
    async fn waits_for_every_task_before_reporting_failure() {
        let finished = Mutex::new(Vec::new());
        let mut coordinator = PageCoordinator::new(FailurePolicy::FailFast, Logger::new_quiet());

        let result = coordinator
            .run_page([1u64, 2, 3], |item| {
                let finished = &finished;
                async move {
                    if item == 2 {
                        return Err(PurgeError::Transport(format!("item {}", item)));
                    }
                    tokio::time::sleep(Duration::from_millis(10 * item)).await;
                    finished.lock().unwrap().push(item);
                    Ok(1)
                }
            })
            .await;

        assert!(matches!(result, Err(PurgeError::Transport(msg)) if msg == "item 2"));
        let mut done = finished.lock().unwrap().clone();
        done.sort();
        assert_eq!(done, vec![1, 3]);
        assert_eq!(
            coordinator.tally(),
            Tally {
                succeeded: 2,
                failed: 1,
                pages: 1
            }
        );
    }

    #[tokio::test]
    async fn continue_policy_counts_and_keeps_going() {
        let mut coordinator = PageCoordinator::new(FailurePolicy::Continue, Logger::new_quiet());

        let result = coordinator
            .run_page(["a", "b"], |item| async move {
                if item == "a" {
                    Err(PurgeError::Transport("boom".to_string()))
                } else {
                    Ok(1)
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(matches!(
            coordinator.tally().into_result(),
            Err(PurgeError::Incomplete { failed: 1 })
        ));
    }

    #[test]
    fn empty_page_is_a_no_op() {
        let mut coordinator = PageCoordinator::new(FailurePolicy::FailFast, Logger::new_quiet());
        block_on(coordinator.run_page(Vec::<u8>::new(), |_| async { Ok(1) })).unwrap();
        assert_eq!(coordinator.tally().succeeded, 0);
        assert_eq!(coordinator.tally().pages, 1);
    }

    #[tokio::test]
    async fn stage_hands_back_successes_without_counting_them() {
        let mut coordinator = PageCoordinator::new(FailurePolicy::Continue, Logger::new_quiet());

        let done = coordinator
            .run_stage(["a", "b", "c"], |item| async move {
                if item == "b" {
                    Err(PurgeError::Metadata("no record".to_string()))
                } else {
                    Ok(item.to_uppercase())
                }
            })
            .await
            .unwrap();

        assert_eq!(done, vec!["A", "C"]);
        assert_eq!(coordinator.tally().succeeded, 0);
        assert_eq!(coordinator.tally().failed, 1);
        assert_eq!(coordinator.tally().pages, 0);
    }
}
