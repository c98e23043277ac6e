//! Quiet-period debounce between raw keystrokes and the search flow.
//!
//! Every pushed value restarts the timer; only the latest value survives a
//! full quiet period and is forwarded to the sink. A value equal to the last
//! forwarded one is swallowed, so retyping the current term does not refetch.
//! Closing the input with [`Debouncer::finish`] flushes the pending value
//! right away.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);

#[derive(Debug)]
pub struct Debouncer {
    input: Option<UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn spawn(delay: Duration, sink: UnboundedSender<String>) -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, rx, sink));
        Self {
            input: Some(input),
            task: Some(task),
        }
    }

    /// Returns false once the debouncer has stopped.
    pub fn push(&self, value: impl Into<String>) -> bool {
        self.input
            .as_ref()
            .is_some_and(|input| input.send(value.into()).is_ok())
    }

    /// Closes the input and waits until the pending value, if any, has been
    /// forwarded to the sink.
    pub async fn finish(mut self) {
        self.input.take();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "debounce task ended abnormally");
            }
        }
    }

    /// Drops any pending value without emitting it.
    pub fn shutdown(self) {}
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(delay: Duration, mut input: UnboundedReceiver<String>, sink: UnboundedSender<String>) {
    let mut last_emitted = String::new();
    let mut pending: Option<String> = None;
    loop {
        let Some(value) = pending.take() else {
            match input.recv().await {
                Some(value) => {
                    pending = Some(value);
                    continue;
                }
                None => break,
            }
        };
        tokio::select! {
            next = input.recv() => match next {
                Some(next) => pending = Some(next),
                None => {
                    emit(&sink, &mut last_emitted, value);
                    break;
                }
            },
            () = sleep(delay) => {
                if !emit(&sink, &mut last_emitted, value) {
                    break;
                }
            }
        }
    }
}

/// Forwards `value` unless it repeats the last emitted one. Returns false when
/// the sink is gone.
fn emit(sink: &UnboundedSender<String>, last_emitted: &mut String, value: String) -> bool {
    if value == *last_emitted {
        return true;
    }
    if sink.send(value.clone()).is_err() {
        debug!("debounce sink closed");
        return false;
    }
    *last_emitted = value;
    true
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::advance;

    use super::{Debouncer, DEFAULT_DEBOUNCE};

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_only_last_value_after_quiet_period() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(DEFAULT_DEBOUNCE, sink);
        for term in ["b", "ba", "bat", "batman"] {
            debouncer.push(term);
            settle().await;
            advance(Duration::from_millis(200)).await;
        }
        assert!(out.try_recv().is_err());

        advance(Duration::from_millis(499)).await;
        settle().await;
        assert!(out.try_recv().is_err());

        advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(out.try_recv().unwrap(), "batman");
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn each_quiet_window_emits_once() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(Duration::from_millis(100), sink);

        debouncer.push("alien");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;
        debouncer.push("aliens");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;

        assert_eq!(out.try_recv().unwrap(), "alien");
        assert_eq!(out.try_recv().unwrap(), "aliens");
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_value_is_not_reemitted() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(Duration::from_millis(100), sink);

        debouncer.push("");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;
        assert!(out.try_recv().is_err());

        debouncer.push("x");
        settle().await;
        advance(Duration::from_millis(50)).await;
        debouncer.push("");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_value() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(Duration::from_millis(100), sink);
        debouncer.push("batman");
        settle().await;
        debouncer.shutdown();

        advance(Duration::from_millis(500)).await;
        settle().await;
        assert!(out.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn finish_flushes_pending_value() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(Duration::from_millis(100), sink);
        debouncer.push("bat");
        debouncer.push("batman");
        debouncer.finish().await;

        assert_eq!(out.try_recv().unwrap(), "batman");
        assert!(out.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn finish_skips_value_already_emitted() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(Duration::from_millis(100), sink);
        debouncer.push("alien");
        settle().await;
        advance(Duration::from_millis(150)).await;
        settle().await;
        assert_eq!(out.try_recv().unwrap(), "alien");

        debouncer.push("alien");
        debouncer.finish().await;
        assert!(out.recv().await.is_none());
    }
}
