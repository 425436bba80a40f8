//! Private run loop for an install worker.
//!
//! A [`MainLoop`] is driven by exactly one worker. Other parties only hold a
//! [`LoopContext`], which can queue work onto the loop or ask it to stop. Work
//! queued through [`LoopContext::invoke`] always runs on the loop's own task, so
//! callbacks never run on whatever context produced the event.
//!
//! ## Usage
//!
//! ```ignore
//! let (context, mut main_loop) = MainLoop::new();
//! context.invoke(|| println!("runs on the loop"));
//! let exit = main_loop.run(&mut events, |event| handle(event)).await;
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type LoopTask = Box<dyn FnOnce() + Send + 'static>;

/// Why [`MainLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// [`LoopContext::quit`] was called
    Quit,
    /// Every event sender was dropped before a quit was requested
    SourceClosed,
}

/// Handle onto a worker's private scheduling context.
#[derive(Debug, Clone)]
pub struct LoopContext {
    tasks: mpsc::UnboundedSender<LoopTask>,
    quit: CancellationToken,
}

impl LoopContext {
    /// Queue `task` to run on the loop.
    ///
    /// Returns `false` if the loop has already been dropped; the task is then
    /// discarded.
    pub fn invoke<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tasks.send(Box::new(task)).is_ok()
    }

    /// Ask the loop to stop after the current dispatch.
    pub fn quit(&self) {
        self.quit.cancel();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_quit_requested(&self) -> bool {
        self.quit.is_cancelled()
    }
}

/// Run/stop handle for a worker's private loop.
pub struct MainLoop {
    tasks: mpsc::UnboundedReceiver<LoopTask>,
    quit: CancellationToken,
}

impl MainLoop {
    /// Create a loop together with the context used to reach it.
    #[must_use]
    pub fn new() -> (LoopContext, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let quit = CancellationToken::new();
        let context = LoopContext {
            tasks: tx,
            quit: quit.clone(),
        };
        (context, Self { tasks: rx, quit })
    }

    /// Run until quit is requested or `events` closes.
    ///
    /// Queued tasks are served before new events. Tasks that are still queued
    /// when the loop stops are run before this returns.
    pub async fn run<E, F>(&mut self, events: &mut mpsc::UnboundedReceiver<E>, mut dispatch: F) -> LoopExit
    where
        F: FnMut(E),
    {
        let exit = loop {
            tokio::select! {
                biased;

                _ = self.quit.cancelled() => break LoopExit::Quit,
                Some(task) = self.tasks.recv() => task(),
                event = events.recv() => match event {
                    Some(event) => dispatch(event),
                    None => break LoopExit::SourceClosed,
                },
            }
        };

        let flushed = self.flush();
        debug!(exit = ?exit, flushed, "Main loop stopped");
        exit
    }

    fn flush(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.tasks.try_recv() {
            task();
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_quit_from_dispatch() {
        let (context, mut main_loop) = MainLoop::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.send(3).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let exit = main_loop
            .run(&mut rx, |n: i32| {
                sink.lock().unwrap().push(n);
                if n == 2 {
                    context.quit();
                }
            })
            .await;

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(context.is_quit_requested());
    }

    #[tokio::test]
    async fn test_source_closed() {
        let (_context, mut main_loop) = MainLoop::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        drop(tx);

        let exit = main_loop.run(&mut rx, |_| {}).await;
        assert_eq!(exit, LoopExit::SourceClosed);
    }

    #[tokio::test]
    async fn test_invoked_tasks_run_in_order() {
        let (context, mut main_loop) = MainLoop::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let sink = seen.clone();
            assert!(context.invoke(move || sink.lock().unwrap().push(i)));
        }
        drop(tx);

        main_loop.run(&mut rx, |_| {}).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_tasks_queued_before_quit_are_flushed() {
        let (context, mut main_loop) = MainLoop::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();

        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let ctx = context.clone();
        main_loop
            .run(&mut rx, move |_| {
                let flag = flag.clone();
                ctx.invoke(move || *flag.lock().unwrap() = true);
                ctx.quit();
            })
            .await;

        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn test_invoke_after_drop() {
        let (context, main_loop) = MainLoop::new();
        drop(main_loop);
        assert!(!context.invoke(|| {}));
    }
}
