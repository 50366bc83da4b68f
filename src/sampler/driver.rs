//! Sampler tick loop
//!
//! Runs the sampler on a tokio task: pointer samples arrive over a channel
//! and are recorded as they come, while a fixed-rate interval delivers
//! ticks. A due tick always runs before the next queued sample. Both happen on the same task, so every listener sees a history
//! that no other writer is mutating.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::MotionSampler;
use crate::intent::PositionSample;

/// Capacity of the sample channel
const SAMPLE_CHANNEL_CAPACITY: usize = 256;

/// Background task driving a [`MotionSampler`]
#[derive(Debug)]
pub struct SamplerDriver {
    sender: mpsc::Sender<PositionSample>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SamplerDriver {
    /// Spawn the tick loop on the current tokio runtime
    pub fn spawn(sampler: Arc<MotionSampler>) -> Self {
        let (sender, mut receiver) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let period = sampler.config().tick_interval();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!("Sampler driver started ({:?} per tick)", period);

            loop {
                tokio::select! {
                    biased;

                    _ = stop.cancelled() => break,

                    // A due tick goes ahead of queued samples so a backlog
                    // cannot delay it
                    _ = interval.tick() => {
                        sampler.tick();
                    }

                    Some(sample) = receiver.recv() => {
                        sampler.record(sample);
                    }
                }
            }

            debug!("Sampler driver stopped after {} ticks", sampler.stats().ticks);
        });

        Self {
            sender,
            shutdown,
            task,
        }
    }

    /// Channel for the position source
    pub fn sender(&self) -> mpsc::Sender<PositionSample> {
        self.sender.clone()
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!("Sampler driver task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SamplerConfig;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_driver_records_and_ticks() {
        let sampler = Arc::new(MotionSampler::new(SamplerConfig::default()));
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let _sub = sampler.subscribe(move |history| {
            let mut max = sink.lock();
            *max = (*max).max(history.len());
        });

        let driver = SamplerDriver::spawn(Arc::clone(&sampler));
        let tx = driver.sender();
        for i in 0..3 {
            tx.send(PositionSample::new(i as f64, 0.0, i as f64 * 16.0))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.shutdown().await;

        assert_eq!(*seen.lock(), 3);
        assert!(sampler.stats().ticks >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_backlog_does_not_delay_tick() {
        let sampler = Arc::new(MotionSampler::new(SamplerConfig {
            buffer_size: 512,
            ..SamplerConfig::default()
        }));
        let lengths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lengths);
        let _sub = sampler.subscribe(move |history| sink.lock().push(history.len()));

        let driver = SamplerDriver::spawn(Arc::clone(&sampler));
        let tx = driver.sender();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*lengths.lock(), vec![0]);

        for i in 0..200 {
            tx.try_send(PositionSample::new(i as f64, 0.0, i as f64))
                .unwrap();
        }
        tokio::time::advance(Duration::from_millis(20)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        // The due tick ran before the queued samples were recorded
        assert_eq!(lengths.lock().get(1).copied(), Some(0));

        tokio::time::sleep(Duration::from_millis(20)).await;
        driver.shutdown().await;
        assert_eq!(lengths.lock().last().copied(), Some(200));
    }
}
