use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::job_queue::{JobQueue, JobQueueError, QueueHealth};
use crate::domain::entities::IngestionRun;

/// In-process queue of ingestion runs. The run row is the durable record;
/// queued runs lost on restart stay `pending` until re-queued.
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<IngestionRun>,
    stats: Arc<Mutex<QueueStats>>,
}

#[derive(Debug, Clone, Default)]
struct QueueStats {
    total_enqueued: u64,
    total_dequeued: u64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

impl QueueStats {
    fn pending(&self) -> usize {
        self.total_enqueued.saturating_sub(self.total_dequeued) as usize
    }

    fn record_dequeue(&mut self) {
        self.total_dequeued += 1;
        self.last_activity = Some(chrono::Utc::now());
    }
}

impl MpscJobQueue {
    /// The queue for producers plus a receiving handle shared by the workers.
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));

        let queue = Self {
            sender,
            stats: stats.clone(),
        };
        let receiver = MpscJobQueueReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
            stats,
        };

        (queue, receiver)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, run: IngestionRun) -> Result<(), JobQueueError> {
        self.sender
            .send(run)
            .map_err(|_| JobQueueError::ConnectionError("Channel closed".to_string()))?;

        let mut stats = self.stats.lock().await;
        stats.total_enqueued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        let stats = self.stats.lock().await;

        Ok(QueueHealth {
            queue_size: stats.pending(),
            total_enqueued: stats.total_enqueued,
            total_dequeued: stats.total_dequeued,
            is_healthy: !self.sender.is_closed(),
            last_activity: stats.last_activity,
        })
    }
}

// Receiving side handed to the background processor
pub struct MpscJobQueueReceiver {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<IngestionRun>>>,
    stats: Arc<Mutex<QueueStats>>,
}

impl MpscJobQueueReceiver {
    pub async fn recv(&self) -> Option<IngestionRun> {
        let run = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        };
        if run.is_some() {
            self.stats.lock().await.record_dequeue();
        }
        run
    }
}
