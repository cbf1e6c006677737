//! Background jobs on a rayon pool with a handle to wait on.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

pub struct Worker {
    pool: rayon::ThreadPool,
}

impl Worker {
    pub fn new(threads: usize) -> Result<Self, CliError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("gstmatch-worker-{i}"))
            // Without a handler a panicking job aborts the process.
            .panic_handler(|_| tracing::error!("background job panicked"))
            .build()
            .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot start worker pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Run `job` on the pool. The returned handle yields its result.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.pool.spawn(move || {
            // Receiver gone means nobody is waiting any more.
            let _ = tx.send(job());
        });
        JobHandle { rx }
    }
}

pub struct JobHandle<T> {
    rx: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Block until the job finishes. A job that panicked drops its sender.
    pub fn wait(self) -> Result<T, CliError> {
        self.rx.recv().map_err(|_| worker_died())
    }

    /// Block until the job finishes, ticking a spinner on stderr meanwhile.
    pub fn wait_with_spinner(self, message: &str, show: bool) -> Result<T, CliError> {
        if !show {
            return self.wait();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());

        let result = loop {
            match self.rx.recv_timeout(Duration::from_millis(80)) {
                Ok(value) => break Ok(value),
                Err(RecvTimeoutError::Timeout) => spinner.tick(),
                Err(RecvTimeoutError::Disconnected) => break Err(worker_died()),
            }
        };
        spinner.finish_and_clear();
        result
    }
}

fn worker_died() -> CliError {
    CliError::new(EXIT_ERROR, "background reconciliation stopped unexpectedly")
}
