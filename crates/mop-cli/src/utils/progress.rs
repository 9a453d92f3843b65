use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use mopbuild::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    pb: ProgressBar,
    phase: &'static str,
}

impl BarState {
    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => self.begin_phase(name),
            Progress::PhaseFinish => {
                self.pb.disable_steady_tick();
                self.pb.finish_with_message(format!("✓ {}", self.phase));
            }
            Progress::TaskStart { total_steps } => self.begin_task(total_steps),
            Progress::TaskIncrement => self.pb.inc(1),
            Progress::TaskFinish => {
                // Copies skipped on error still count towards the total.
                if let Some(length) = self.pb.length() {
                    self.pb.set_position(length.max(self.pb.position()));
                }
                self.pb.finish();
            }
            Progress::Message(msg) if self.pb.is_finished() => self.pb.set_message(msg),
            Progress::Message(msg) => self.pb.println(format!("  {}", msg)),
        }
    }

    fn begin_phase(&mut self, name: &'static str) {
        self.phase = name;
        self.pb.reset();
        self.pb.set_length(0);
        self.pb.set_style(spinner_style());
        self.pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.pb.set_message(name);
    }

    fn begin_task(&mut self, total_steps: u64) {
        self.pb.disable_steady_tick();
        self.pb.reset();
        self.pb.set_length(total_steps);
        self.pb.set_style(bar_style());
        self.pb.set_message(self.phase);
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} copies ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("=> ")
}

/// Renders assembly progress events as an `indicatif` spinner or bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(BarState { pb, phase: "" })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);
        Box::new(move |progress: Progress| match state.lock() {
            Ok(mut bar) => bar.apply(progress),
            Err(_) => warn!("Progress bar lock poisoned; dropping progress event."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
