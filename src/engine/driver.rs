use crate::broker::BrokerClient;
use crate::engine::TradingEngine;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{error, info, warn};

/// Commands a loop driver acts upon between cycles. A cycle in progress always completes; there
/// is no mid-cycle cancellation.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Command {
    /// External interrupt: finish the in-flight cycle and exit the loop cleanly.
    Terminate(String),
}

/// Pause after a failed cycle before the aligned loop resumes.
const RECOVERY_SLEEP: Duration = Duration::from_secs(10);

/// Relays Ctrl-C to the driver as a [`Command::Terminate`]. Spawn alongside a running driver to
/// wire OS interrupts into cooperative shutdown.
pub async fn terminate_on_interrupt(command_tx: mpsc::Sender<Command>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        let _ = command_tx
            .send(Command::Terminate("interrupt received".to_owned()))
            .await;
    }
}

/// Fixed-interval loop driver: run a cycle, sleep `interval`, repeat. Slow cycles push every
/// subsequent one back (no drift compensation); prefer [`AlignedDriver`] in production.
pub struct IntervalDriver<Broker>
where
    Broker: BrokerClient,
{
    engine: TradingEngine<Broker>,
    command_rx: mpsc::Receiver<Command>,
    interval: Duration,
}

impl<Broker> IntervalDriver<Broker>
where
    Broker: BrokerClient,
{
    /// Constructs a new [`IntervalDriver`] running `engine` every `interval`.
    pub fn new(
        engine: TradingEngine<Broker>,
        command_rx: mpsc::Receiver<Command>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            command_rx,
            interval,
        }
    }

    /// Run the trading loop until a [`Command::Terminate`] is received or the command
    /// transmitter is dropped.
    pub async fn run(mut self) {
        loop {
            if let Err(err) = self.engine.run_once(Utc::now()) {
                error!(%err, "trading cycle failed");
            }

            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Terminate(reason)) => {
                            info!(%reason, "received terminate command");
                        }
                        None => warn!("command transmitter dropped, terminating"),
                    }
                    break;
                }
                _ = time::sleep(self.interval) => {}
            }
        }
        info!("interval driver terminated");
    }
}

/// Candle-aligned loop driver: sleeps until shortly after every candle-close boundary, then runs
/// a cycle. The next boundary is recomputed each iteration, so missed or slow cycles
/// self-correct by skipping ahead.
pub struct AlignedDriver<Broker>
where
    Broker: BrokerClient,
{
    engine: TradingEngine<Broker>,
    command_rx: mpsc::Receiver<Command>,
    timeframe_minutes: u32,
    wait_after_close: TimeDelta,
}

impl<Broker> AlignedDriver<Broker>
where
    Broker: BrokerClient,
{
    /// Constructs a new [`AlignedDriver`] waking `wait_after_close_seconds` after every
    /// `timeframe_minutes` candle boundary.
    pub fn new(
        engine: TradingEngine<Broker>,
        command_rx: mpsc::Receiver<Command>,
        timeframe_minutes: u32,
        wait_after_close_seconds: u32,
    ) -> Self {
        Self {
            engine,
            command_rx,
            timeframe_minutes,
            wait_after_close: TimeDelta::seconds(i64::from(wait_after_close_seconds)),
        }
    }

    /// Run the trading loop until a [`Command::Terminate`] is received or the command
    /// transmitter is dropped. A failed cycle is logged and followed by a short recovery pause;
    /// the loop never terminates due to a per-cycle error.
    pub async fn run(mut self) {
        loop {
            let now = Utc::now();
            let target = next_aligned_instant(now, self.timeframe_minutes, self.wait_after_close);
            let sleep_for = (target - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Terminate(reason)) => {
                            info!(%reason, "received terminate command");
                        }
                        None => warn!("command transmitter dropped, terminating"),
                    }
                    break;
                }
                _ = time::sleep(sleep_for) => {}
            }

            if let Err(err) = self.engine.run_once(Utc::now()) {
                error!(%err, "trading cycle failed, pausing before the next boundary");
                time::sleep(RECOVERY_SLEEP).await;
            }
        }
        info!("aligned driver terminated");
    }
}

/// Next wake-up instant: the wall-clock boundary that is a multiple of `timeframe_minutes` past
/// the current UTC zero-second mark, plus `wait_after_close`. When that instant already passed,
/// the following boundary is used.
pub fn next_aligned_instant(
    now: DateTime<Utc>,
    timeframe_minutes: u32,
    wait_after_close: TimeDelta,
) -> DateTime<Utc> {
    let step_minutes = i64::from(timeframe_minutes.max(1));
    let minutes = now.timestamp().div_euclid(60);
    let remainder = minutes.rem_euclid(step_minutes);
    let boundary_minutes = if remainder == 0 {
        minutes
    } else {
        minutes - remainder + step_minutes
    };
    let boundary_secs = boundary_minutes * 60;

    let mut target = DateTime::from_timestamp(boundary_secs, 0).unwrap_or(now) + wait_after_close;
    if target <= now {
        target += TimeDelta::minutes(step_minutes);
    }
    target
}
