use crate::repo::notifications_outbox_repo::NotificationsOutboxRepo;
use anyhow::Result;
use chrono::{Duration, Utc};

/// Drains the notifications outbox into a Redis stream for the external
/// notification collaborator. The core never waits on this; delivery
/// failures only delay the request, never a state transition.
#[derive(Clone)]
pub struct NotificationRelay {
    pub outbox_repo: NotificationsOutboxRepo,
    pub redis_client: redis::Client,
    pub stream_key: String,
}

impl NotificationRelay {
    pub async fn run(self) {
        loop {
            if let Err(err) = self.tick().await {
                tracing::error!("notification relay error: {}", err);
            }
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
    }

    async fn tick(&self) -> Result<()> {
        let batch = self.outbox_repo.lock_pending(100).await?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        for item in batch {
            let payload = serde_json::to_string(&item.payload_json)?;
            let add_res: redis::RedisResult<String> = redis::cmd("XADD")
                .arg(&self.stream_key)
                .arg("MAXLEN")
                .arg("~")
                .arg(1_000_000)
                .arg("*")
                .arg("user_id")
                .arg(item.user_id.to_string())
                .arg("kind")
                .arg(&item.kind)
                .arg("payload")
                .arg(payload)
                .query_async(&mut conn)
                .await;

            match add_res {
                Ok(_) => {
                    self.outbox_repo.mark_published(item.id).await?;
                }
                Err(e) => {
                    let attempts = item.attempts + 1;
                    let backoff = i64::min(300, 2_i64.pow((attempts.min(8)) as u32));
                    let next_attempt_at = Utc::now() + Duration::seconds(backoff);
                    self.outbox_repo.mark_retry(item.id, attempts, next_attempt_at).await?;
                    tracing::warn!("xadd failed for notification id {}: {}", item.id, e);
                }
            }
        }

        Ok(())
    }
}
