//! Single-flight command writer.
//!
//! A setting change is two command blocks with a pause in between. Blocks
//! are handed to the connection task over the request channel, which owns
//! the socket:
//!
//! ```text
//! write_setpoint ─┐
//!                 ├─► CommandWriter ─► mpsc::Sender<Request> ─► connection task ─► Gateway
//! write_mode ─────┘        │
//!                     in-flight flag
//! ```
//!
//! Only one sequence may be in flight. A second caller is rejected with
//! [`Ht3Error::WriteInProgress`] instead of being queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::{Ht3Error, Result};
use crate::protocol::{to_bus_units, CommandBlock, HcMode, WriteSequence};
use crate::session::Request;

/// Handle for writing settings through the connection task.
#[derive(Clone)]
pub(crate) struct CommandWriter {
    /// Request channel into the connection task.
    tx: mpsc::Sender<Request>,
    /// Set while a sequence is being sent.
    in_flight: Arc<AtomicBool>,
    /// Pause between the two blocks.
    delay: Duration,
}

impl CommandWriter {
    pub(crate) fn new(tx: mpsc::Sender<Request>, delay: Duration) -> Self {
        Self {
            tx,
            in_flight: Arc::new(AtomicBool::new(false)),
            delay,
        }
    }

    /// Check if a write sequence is currently in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Write the requested room temperature of the heating circuit.
    pub async fn write_setpoint(&self, degrees: f64) -> Result<()> {
        let units = to_bus_units(degrees)?;
        self.send_sequence(WriteSequence::setpoint(units)).await?;
        tracing::info!("Requested room temperature set to {:.1}°C", degrees);
        Ok(())
    }

    /// Write the operating mode of the heating circuit.
    pub async fn write_mode(&self, mode: HcMode) -> Result<()> {
        self.send_sequence(WriteSequence::mode(mode)).await?;
        tracing::info!("Heating circuit mode set to {:?}", mode);
        Ok(())
    }

    /// Send both blocks of `sequence` with the configured delay between them.
    pub(crate) async fn send_sequence(&self, sequence: WriteSequence) -> Result<()> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(Ht3Error::WriteInProgress)?;

        let [first, second] = sequence.blocks;
        self.send_block(first).await?;
        tokio::time::sleep(self.delay).await;
        self.send_block(second).await
    }

    async fn send_block(&self, block: CommandBlock) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Write { block, reply })
            .await
            .map_err(|_| Ht3Error::DriverStopped)?;
        rx.await.map_err(|_| Ht3Error::DriverStopped)?
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter")
            .field("busy", &self.is_busy())
            .field("delay", &self.delay)
            .finish()
    }
}

/// Clears the in-flight flag when dropped, including on early return.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{markers, registers};
    use tokio::time::Instant;

    /// Fake connection task: records each block with its arrival time and
    /// answers with `answer`.
    fn responder(
        mut rx: mpsc::Receiver<Request>,
        answer: fn() -> Result<()>,
    ) -> tokio::task::JoinHandle<Vec<(CommandBlock, Instant)>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(request) = rx.recv().await {
                if let Request::Write { block, reply } = request {
                    seen.push((block, Instant::now()));
                    let _ = reply.send(answer());
                }
            }
            seen
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_setpoint_sends_two_blocks_with_delay() {
        let (tx, rx) = mpsc::channel(8);
        let task = responder(rx, || Ok(()));
        let writer = CommandWriter::new(tx, Duration::from_secs(1));

        writer.write_setpoint(21.5).await.unwrap();
        drop(writer);

        let seen = task.await.unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].0,
            CommandBlock::new(registers::SETPOINT, markers::ACTION_SET, 0x2B)
        );
        assert_eq!(
            seen[1].0,
            CommandBlock::new(registers::SETPOINT_COMMIT, markers::ACTION_COMMIT, 0x2B)
        );
        assert!(seen[1].1 - seen[0].1 >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_sends_mode_code() {
        let (tx, rx) = mpsc::channel(8);
        let task = responder(rx, || Ok(()));
        let writer = CommandWriter::new(tx, Duration::from_millis(10));

        writer.write_mode(HcMode::Comfort).await.unwrap();
        drop(writer);

        let seen = task.await.unwrap();
        let blocks: Vec<_> = seen.iter().map(|(block, _)| block.encode()).collect();
        assert_eq!(blocks[0][7..], [0x0E, 0x00, 0x65, 0x03]);
        assert_eq!(blocks[1][7..], [0x04, 0x00, 0x79, 0x03]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_write_rejected_while_in_flight() {
        let (tx, rx) = mpsc::channel(8);
        let _task = responder(rx, || Ok(()));
        let writer = CommandWriter::new(tx, Duration::from_secs(1));

        let first = {
            let writer = writer.clone();
            tokio::spawn(async move { writer.write_setpoint(20.0).await })
        };
        while !writer.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = writer.write_mode(HcMode::Eco).await;
        assert!(matches!(second, Err(Ht3Error::WriteInProgress)));

        first.await.unwrap().unwrap();
        assert!(!writer.is_busy());
    }

    #[tokio::test]
    async fn test_invalid_setpoint_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(8);
        let writer = CommandWriter::new(tx, Duration::ZERO);

        let result = writer.write_setpoint(128.0).await;
        assert!(matches!(result, Err(Ht3Error::InvalidSetpoint(_))));
        assert!(rx.try_recv().is_err());
        assert!(!writer.is_busy());
    }

    #[tokio::test]
    async fn test_failed_block_clears_flag() {
        let (tx, rx) = mpsc::channel(8);
        let task = responder(rx, || Err(Ht3Error::NotConnected));
        let writer = CommandWriter::new(tx, Duration::ZERO);

        let result = writer.write_setpoint(21.0).await;
        assert!(matches!(result, Err(Ht3Error::NotConnected)));
        assert!(!writer.is_busy());

        drop(writer);
        // The second block is never sent after the first one fails.
        assert_eq!(task.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stopped_task_reports_driver_stopped() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let writer = CommandWriter::new(tx, Duration::ZERO);

        let result = writer.write_mode(HcMode::Auto).await;
        assert!(matches!(result, Err(Ht3Error::DriverStopped)));
    }
}
