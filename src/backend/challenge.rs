//! Time Master challenge: pick a task, guess how long it takes, then try to
//! beat a countdown set to 90% of the guess.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::backend::content::TimeTask;
use crate::error::{LifeSkillsError, Result};

/// Countdown is this fraction of the estimate, in percent.
pub const COUNTDOWN_PERCENT: u64 = 90;

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStage {
    Selection,
    Estimation,
    Timing,
    Finished,
}

/// Emitted exactly once when a run enters `Finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub task: TimeTask,
    pub estimate_minutes: u32,
    pub countdown_secs: u64,
    pub seconds_used: u64,
    /// Finished via the "I'm done" button rather than the clock.
    pub finished_early: bool,
}

/// floor(E * 60 * 0.9) seconds.
pub fn countdown_for(estimate_minutes: u32) -> u64 {
    u64::from(estimate_minutes) * 60 * COUNTDOWN_PERCENT / 100
}

/// Parse the estimate field. Must be a positive whole number of minutes.
pub fn parse_estimate(input: &str) -> Result<u32> {
    match input.trim().parse::<u32>() {
        Ok(m) if m > 0 => Ok(m),
        _ => Err(LifeSkillsError::Validation(format!(
            "estimate must be a positive number of minutes, got {input:?}"
        ))),
    }
}

/// mm:ss
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Default)]
pub struct TimeChallenge {
    task: Option<TimeTask>,
    estimate_minutes: u32,
    countdown_secs: u64,
    remaining_secs: u64,
    running: bool,
    result: Option<ChallengeResult>,
}

impl TimeChallenge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> ChallengeStage {
        if self.result.is_some() {
            ChallengeStage::Finished
        } else if self.countdown_secs > 0 {
            ChallengeStage::Timing
        } else if self.task.is_some() {
            ChallengeStage::Estimation
        } else {
            ChallengeStage::Selection
        }
    }

    pub fn task(&self) -> Option<&TimeTask> {
        self.task.as_ref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn countdown_secs(&self) -> u64 {
        self.countdown_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn result(&self) -> Option<&ChallengeResult> {
        self.result.as_ref()
    }

    /// Selection -> Estimation. Re-picking while still estimating swaps the task.
    pub fn select_task(&mut self, task: TimeTask) -> Result<()> {
        match self.stage() {
            ChallengeStage::Selection | ChallengeStage::Estimation => {
                self.task = Some(task);
                Ok(())
            }
            stage => Err(invalid(stage, "select a task")),
        }
    }

    /// Estimation -> Timing. Returns the countdown length in seconds.
    pub fn submit_estimate(&mut self, minutes: u32) -> Result<u64> {
        let stage = self.stage();
        if stage != ChallengeStage::Estimation {
            return Err(invalid(stage, "submit an estimate"));
        }
        if minutes == 0 {
            return Err(LifeSkillsError::Validation(
                "estimate must be at least one minute".to_string(),
            ));
        }
        let countdown = countdown_for(minutes);
        self.estimate_minutes = minutes;
        self.countdown_secs = countdown;
        self.remaining_secs = countdown;
        self.running = true;
        tracing::debug!(minutes, countdown, "challenge started");
        Ok(countdown)
    }

    pub fn pause(&mut self) {
        if self.stage() == ChallengeStage::Timing {
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if self.stage() == ChallengeStage::Timing {
            self.running = true;
        }
    }

    /// One second elapsed. Paused or idle machines ignore ticks. Returns the
    /// result when this tick ran the clock out.
    pub fn tick(&mut self) -> Option<ChallengeResult> {
        if self.stage() != ChallengeStage::Timing || !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.enter_finished(false);
        }
        None
    }

    /// "I'm done". Returns the result the first time only.
    pub fn finish(&mut self) -> Option<ChallengeResult> {
        if self.stage() != ChallengeStage::Timing {
            return None;
        }
        self.enter_finished(true)
    }

    fn enter_finished(&mut self, early: bool) -> Option<ChallengeResult> {
        let task = self.task.clone()?;
        self.running = false;
        let result = ChallengeResult {
            task,
            estimate_minutes: self.estimate_minutes,
            countdown_secs: self.countdown_secs,
            seconds_used: self.countdown_secs - self.remaining_secs,
            finished_early: early,
        };
        tracing::info!(seconds_used = result.seconds_used, early, "challenge finished");
        self.result = Some(result.clone());
        Some(result)
    }

    /// Back to Selection from anywhere.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn invalid(stage: ChallengeStage, action: &str) -> LifeSkillsError {
    LifeSkillsError::Validation(format!("cannot {action} while in {stage:?} stage"))
}

/// Tick a shared challenge once per second until it leaves the timing stage.
/// Returns the result only when the clock ran out here; a manual finish is
/// reported by [`TimeChallenge::finish`] instead.
pub async fn drive_countdown(challenge: Arc<Mutex<TimeChallenge>>) -> Option<ChallengeResult> {
    let mut interval = tokio::time::interval(TICK);
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        let mut c = challenge.lock();
        if let Some(result) = c.tick() {
            return Some(result);
        }
        if c.stage() != ChallengeStage::Timing {
            return None;
        }
    }
}
