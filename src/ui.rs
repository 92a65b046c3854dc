//! Terminal feedback for the blocking steps of a run (model load, detection).

use anyhow::Result;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UiMode {
    /// Spinner when stderr is a terminal, plain lines otherwise.
    #[default]
    Auto,
    /// Plain lines only.
    Plain,
    /// Always draw the spinner.
    Pretty,
}

#[derive(Clone, Copy, Debug)]
pub struct Ui {
    spinner: bool,
}

impl Ui {
    pub fn new(mode: UiMode, stderr_is_tty: bool) -> Self {
        let spinner = match mode {
            UiMode::Auto => stderr_is_tty,
            UiMode::Plain => false,
            UiMode::Pretty => true,
        };
        Self { spinner }
    }

    /// Run `work` as a named step, marking it done or failed by its result.
    pub fn run<T>(&self, label: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let stage = self.begin(label);
        let result = work();
        match &result {
            Ok(_) => stage.done(),
            Err(_) => stage.fail(),
        }
        result
    }

    fn begin(&self, label: &str) -> Stage {
        let spinner = if self.spinner {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
                bar.set_style(style);
            }
            bar.set_message(label.to_string());
            bar.enable_steady_tick(TICK);
            Some(bar)
        } else {
            eprintln!("{label}...");
            None
        };
        Stage {
            label: label.to_string(),
            started: Instant::now(),
            spinner,
            finished: false,
        }
    }
}

/// A step in progress. A stage dropped without `done` counts as failed,
/// which covers early returns through `?`.
struct Stage {
    label: String,
    started: Instant,
    spinner: Option<ProgressBar>,
    finished: bool,
}

impl Stage {
    fn done(mut self) {
        self.finish(true);
    }

    fn fail(mut self) {
        self.finish(false);
    }

    fn finish(&mut self, ok: bool) {
        if self.finished {
            return;
        }
        self.finished = true;
        let line = outcome_line(ok, &self.label, self.started.elapsed());
        match self.spinner.take() {
            Some(bar) => bar.finish_with_message(line),
            None => eprintln!("{line}"),
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.finish(false);
    }
}

fn outcome_line(ok: bool, label: &str, elapsed: Duration) -> String {
    let mark = if ok { "✔" } else { "✗" };
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{mark} {label} in {millis}ms")
    } else {
        format!("{mark} {label} in {:.1}s", elapsed.as_secs_f64())
    }
}
