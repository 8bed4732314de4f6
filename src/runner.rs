use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{error, info, warn};

use crate::{
    error::{InjectorError, RunError, ValidationError},
    hotkey::{self, StopKey},
    injector::Injector,
    target::{PrimaryAction, RunConfig, SecondaryAction, Target},
};

/// Longest uninterrupted sleep inside a wait; bounds stop latency.
const WAIT_SLICE: Duration = Duration::from_millis(50);

// -------------- Stop flag --------------

/// Shared set-once stop signal observed by the worker and the key listener.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns true only for the caller that actually flipped it.
    pub fn request_stop(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Sleeps for `duration` unless stopped first. Returns whether the flag is set.
    pub fn wait(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_stopped() {
                return true;
            }
            let slice = remaining.min(WAIT_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        self.is_stopped()
    }
}

// -------------- Dispatch --------------

/// Performs `target`'s action at the current pointer position.
pub fn dispatch(injector: &mut dyn Injector, target: &Target) -> Result<(), InjectorError> {
    let Target { x, y, .. } = *target;
    match target.primary {
        PrimaryAction::Click => {
            injector.click()?;
            info!("Clicked at: {x}, {y}");
        }
        PrimaryAction::DoubleClick => {
            injector.double_click()?;
            info!("Double-clicked at: {x}, {y}");
            match target.secondary {
                SecondaryAction::Copy => {
                    injector.copy()?;
                    info!("  -> And copied at: {x}, {y}");
                }
                SecondaryAction::Paste => {
                    injector.paste()?;
                    info!("  -> And pasted at: {x}, {y}");
                }
                SecondaryAction::Nothing => {}
            }
        }
        PrimaryAction::Copy => {
            injector.click()?;
            injector.copy()?;
            info!("Copied at: {x}, {y}");
        }
        PrimaryAction::Paste => {
            injector.click()?;
            injector.paste()?;
            info!("Pasted at: {x}, {y}");
        }
    }
    Ok(())
}

// -------------- Run loop --------------

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Stopped { cycles: u64 },
    Failed(InjectorError),
}

/// Everything a worker thread owns for one run.
struct Job {
    targets: Vec<Target>,
    config: RunConfig,
    move_duration: Duration,
    injector: Box<dyn Injector>,
    stop: StopFlag,
}

impl Job {
    fn run(mut self) -> RunOutcome {
        let outcome = match self.cycle_until_stopped() {
            Ok(cycles) => RunOutcome::Stopped { cycles },
            Err(e) => {
                match e {
                    InjectorError::FailSafe { .. } => error!("Fail-safe triggered. Run terminated: {e}"),
                    InjectorError::Backend(_) => error!("An error occurred in mouse actions: {e}"),
                }
                RunOutcome::Failed(e)
            }
        };
        // Leaves the listener free to exit whatever ended the loop.
        self.stop.request_stop();
        info!("Mouse actions thread finished.");
        outcome
    }

    fn cycle_until_stopped(&mut self) -> Result<u64, InjectorError> {
        let mut cycles = 0;
        loop {
            for target in &self.targets {
                if self.stop.is_stopped() {
                    return Ok(cycles);
                }
                self.injector.move_to(target.x, target.y, self.move_duration)?;
                dispatch(self.injector.as_mut(), target)?;
                if self.stop.wait(self.config.click_wait) {
                    return Ok(cycles);
                }
            }
            cycles += 1;
            if self.stop.wait(self.config.cycle_wait) {
                return Ok(cycles);
            }
        }
    }
}

// -------------- Runner --------------

#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    Idle,
    Running,
    Stopped { cycles: u64 },
    Failed(String),
}

struct ActiveRun {
    worker: JoinHandle<RunOutcome>,
    listener: Option<JoinHandle<()>>,
}

/// Owns the stop flag and at most one worker/listener pair.
pub struct ActionRunner {
    stop: StopFlag,
    stop_key: Option<StopKey>,
    move_duration: Duration,
    active: Option<ActiveRun>,
    last_outcome: Option<RunOutcome>,
    /// Set when a run is reaped, cleared once `take_finished` hands the outcome out.
    unreported: bool,
}

impl ActionRunner {
    pub fn new(stop_key: Option<StopKey>, move_duration: Duration) -> Self {
        Self {
            stop: StopFlag::new(),
            stop_key,
            move_duration,
            active: None,
            last_outcome: None,
            unreported: false,
        }
    }

    #[cfg(test)]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|run| !run.worker.is_finished())
    }

    pub fn start(
        &mut self,
        targets: Vec<Target>,
        config: RunConfig,
        injector: Box<dyn Injector>,
    ) -> Result<(), RunError> {
        if self.is_running() {
            info!("Info: Script is already running.");
            return Err(RunError::AlreadyRunning);
        }
        if targets.is_empty() {
            return Err(ValidationError::NoTargets.into());
        }
        self.reap();

        info!(
            "Starting Mouse Actions with Cycle Wait: {}s, Click Wait: {}s",
            config.cycle_wait.as_secs_f64(),
            config.click_wait.as_secs_f64()
        );
        self.stop.reset();

        let job = Job {
            targets,
            config,
            move_duration: self.move_duration,
            injector,
            stop: self.stop.clone(),
        };
        let worker = thread::Builder::new()
            .name("action-runner".into())
            .spawn(move || job.run())?;

        let listener = match self.stop_key {
            Some(key) => hotkey::spawn_listener(self.stop.clone(), key).unwrap_or_else(|e| {
                warn!("Key listener unavailable: {e}");
                None
            }),
            None => None,
        };

        self.active = Some(ActiveRun { worker, listener });
        match self.stop_key {
            Some(key) => info!("Script Status: Mouse actions started. Press 'Stop Script' or '{key}' to halt."),
            None => info!("Script Status: Mouse actions started. Press 'Stop Script' to halt."),
        }
        Ok(())
    }

    /// GUI stop action. Idempotent.
    pub fn request_stop(&self) -> bool {
        let flipped = self.stop.request_stop();
        if flipped {
            info!("Stopping script initiated.");
        }
        flipped
    }

    pub fn status(&mut self) -> RunStatus {
        if self.is_running() {
            return RunStatus::Running;
        }
        self.reap();
        match &self.last_outcome {
            None => RunStatus::Idle,
            Some(RunOutcome::Stopped { cycles }) => RunStatus::Stopped { cycles: *cycles },
            Some(RunOutcome::Failed(e)) => RunStatus::Failed(e.to_string()),
        }
    }

    /// Takes the outcome of a finished run, if one has not been reported yet.
    pub fn take_finished(&mut self) -> Option<RunOutcome> {
        if self.is_running() {
            return None;
        }
        self.reap();
        if !std::mem::take(&mut self.unreported) {
            return None;
        }
        self.last_outcome.clone()
    }

    /// Stops any active run and waits for both threads.
    pub fn shutdown(&mut self) {
        if self.active.is_some() {
            self.request_stop();
        }
        self.reap();
    }

    /// Joins the threads of the previous run. The worker must already be finished or stopping.
    fn reap(&mut self) {
        let Some(run) = self.active.take() else { return };
        self.unreported = true;
        match run.worker.join() {
            Ok(outcome) => self.last_outcome = Some(outcome),
            Err(_) => {
                error!("Mouse actions thread panicked.");
                self.last_outcome = Some(RunOutcome::Failed(InjectorError::Backend(
                    "worker thread panicked".into(),
                )));
            }
        }
        if let Some(listener) = run.listener {
            if listener.join().is_err() {
                warn!("Key listener thread panicked.");
            }
        }
    }
}

impl Drop for ActionRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_request_stop_is_set_once() {
        let flag = StopFlag::new();
        assert!(!flag.is_stopped());
        assert!(flag.request_stop());
        assert!(!flag.request_stop());
        assert!(flag.is_stopped());
        flag.reset();
        assert!(!flag.is_stopped());
    }

    #[test]
    fn test_request_stop_concurrently_flips_once() {
        let flag = StopFlag::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = flag.clone();
                thread::spawn(move || flag.request_stop())
            })
            .collect();
        let flips = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|flipped| *flipped)
            .count();
        assert_eq!(flips, 1);
        assert!(flag.is_stopped());
    }

    #[test]
    fn test_wait_zero_does_not_sleep() {
        let flag = StopFlag::new();
        let started = Instant::now();
        assert!(!flag.wait(Duration::ZERO));
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_wait_returns_early_when_stopped() {
        let flag = StopFlag::new();
        let remote = flag.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.request_stop();
        });
        let started = Instant::now();
        assert!(flag.wait(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
        stopper.join().unwrap();
    }

    #[test]
    fn test_new_runner_is_idle() {
        let mut runner = ActionRunner::new(None, Duration::ZERO);
        assert!(!runner.is_running());
        assert_eq!(runner.status(), RunStatus::Idle);
        assert_eq!(runner.take_finished(), None);
    }
}
