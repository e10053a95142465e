//! Fail-fast stage pipeline.
//!
//! Runs an ordered list of transform stages over a value, stopping at the
//! first failure. Every stage receives the ORIGINAL initial input together
//! with a mutable data bag shared across the whole run; the pipeline keeps
//! the latest stage output and returns it after the last stage completes.
//!
//! Note the input handling: stages are invoked with the initial input, not
//! with the previous stage's output. Existing callers depend on that
//! behavior, so it is pinned by tests here rather than changed.

use anyhow::Result;
use futures::future::BoxFuture;
use tracing::error;

/// One step of a pipeline run.
///
/// A stage sees the original initial input by shared reference and the data
/// bag by mutable reference, and produces a new value of the input type.
pub type Stage<T, U> =
    Box<dyn for<'a> Fn(&'a T, &'a mut U) -> BoxFuture<'a, Result<T>> + Send + Sync>;

/// Box a closure into a [`Stage`].
pub fn stage<T, U, F>(f: F) -> Stage<T, U>
where
    F: for<'a> Fn(&'a T, &'a mut U) -> BoxFuture<'a, Result<T>> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Run `stages` in order, abandoning the run at the first failure.
///
/// Stages run strictly sequentially; each is awaited to completion before
/// the next is considered. A failing stage is logged with its index and the
/// error is returned verbatim; no later stage runs. An empty stage list is
/// a no-op returning `input` unchanged.
pub async fn fail_fast_pipeline<T, U>(stages: &[Stage<T, U>], input: T, bag: &mut U) -> Result<T> {
    let mut result = None;

    for (index, stage) in stages.iter().enumerate() {
        match stage(&input, bag).await {
            Ok(value) => result = Some(value),
            Err(err) => {
                error!(stage = index, "Pipeline stage failed: {err:#}");
                return Err(err);
            }
        }
    }

    Ok(result.unwrap_or(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn add_one() -> Stage<i64, Vec<&'static str>> {
        stage(|input: &i64, bag: &mut Vec<&'static str>| {
            let input = *input;
            bag.push("add_one");
            Box::pin(async move { Ok(input + 1) })
        })
    }

    fn double() -> Stage<i64, Vec<&'static str>> {
        stage(|input: &i64, bag: &mut Vec<&'static str>| {
            let input = *input;
            bag.push("double");
            Box::pin(async move { Ok(input * 2) })
        })
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_input() {
        let stages: Vec<Stage<i64, ()>> = vec![];
        let result = fail_fast_pipeline(&stages, 42, &mut ()).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_stages_receive_original_input() {
        // [x+1, x*2] over 3 must give 6: the second stage sees the original
        // input 3, not the first stage's output 4.
        let stages = vec![add_one(), double()];
        let mut bag = Vec::new();
        let result = fail_fast_pipeline(&stages, 3, &mut bag).await.unwrap();
        assert_eq!(result, 6);
        assert_eq!(bag, vec!["add_one", "double"]);
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_stages() {
        let ran_after = Arc::new(AtomicBool::new(false));
        let flag = ran_after.clone();

        let ok = add_one();
        let throws: Stage<i64, Vec<&'static str>> = stage(
            |_input: &i64, _bag: &mut Vec<&'static str>| {
                Box::pin(async { Err(anyhow!("stage blew up")) })
            },
        );
        let never_runs: Stage<i64, Vec<&'static str>> = stage(
            move |input: &i64, _bag: &mut Vec<&'static str>| {
                let input = *input;
                flag.store(true, Ordering::SeqCst);
                Box::pin(async move { Ok(input) })
            },
        );

        let stages = vec![ok, throws, never_runs];
        let mut bag = Vec::new();
        let err = fail_fast_pipeline(&stages, 1, &mut bag)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "stage blew up");
        assert!(!ran_after.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_data_bag_visible_to_all_stages() {
        let stages = vec![add_one(), add_one(), double()];
        let mut bag = Vec::new();
        fail_fast_pipeline(&stages, 0, &mut bag).await.unwrap();
        assert_eq!(bag.len(), 3);
    }
}
