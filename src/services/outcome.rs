//! The pass/fail reveal.
//!
//! A spin redraws a number in `[0, 100)` on every tick for a fixed window, then
//! takes one more draw and settles. The outcome compares that final draw with
//! the score; the score only biases the odds.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn decide(draw: u32, score: f64) -> Self {
        if draw as f64 <= score * 100.0 {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Outcome::Pass => "🦌",
            Outcome::Fail => "🚫",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinFrame {
    Rolling(u32),
    Settled { draw: u32, outcome: Outcome },
}

#[derive(Debug, Clone, Copy)]
pub struct SpinConfig {
    pub duration: Duration,
    pub tick: Duration,
}

/// Uniform draw in `[0, 100)`.
pub fn random_draw() -> u32 {
    rand::thread_rng().gen_range(0..100)
}

/// A running spin. Dropping it cancels the spin.
pub struct Spin {
    frames: mpsc::Receiver<SpinFrame>,
    task: JoinHandle<()>,
}

impl Spin {
    pub fn start<F>(score: f64, config: SpinConfig, mut draw: F) -> Self
    where
        F: FnMut() -> u32 + Send + 'static,
    {
        let (tx, frames) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(config.tick.max(Duration::from_millis(1)));

            loop {
                ticker.tick().await;
                if started.elapsed() >= config.duration {
                    break;
                }
                if tx.send(SpinFrame::Rolling(draw())).await.is_err() {
                    return;
                }
            }

            let final_draw = draw();
            let outcome = Outcome::decide(final_draw, score);
            tracing::debug!(draw = final_draw, score, ?outcome, "Spin settled");
            let _ = tx
                .send(SpinFrame::Settled {
                    draw: final_draw,
                    outcome,
                })
                .await;
        });

        Self { frames, task }
    }

    /// Next frame, or `None` once the spin has settled and every frame was read.
    pub async fn next_frame(&mut self) -> Option<SpinFrame> {
        self.frames.recv().await
    }
}

impl Drop for Spin {
    fn drop(&mut self) {
        self.task.abort();
    }
}
