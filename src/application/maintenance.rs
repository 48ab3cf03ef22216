//! Maintenance - Periodic subscription expiry and webhook retention.
//!
//! Each tick:
//! 1. Expires active subscriptions whose period has ended and recomputes
//!    their owners' entitlements
//! 2. Deletes webhook records older than the retention window
//!
//! A failed step is logged and retried on the next tick; the loop only stops
//! on the shutdown signal.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::Timestamp;

use super::handlers::{
    ExpireSubscriptionsCommand, ExpireSubscriptionsHandler, PurgeWebhookEventsCommand,
    PurgeWebhookEventsHandler,
};

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_subscriptions: usize,
    pub purged_webhook_events: u64,
}

pub struct MaintenanceTask {
    expire: ExpireSubscriptionsHandler,
    purge: PurgeWebhookEventsHandler,
    interval: Duration,
}

impl MaintenanceTask {
    pub fn new(
        expire: ExpireSubscriptionsHandler,
        purge: PurgeWebhookEventsHandler,
        interval: Duration,
    ) -> Self {
        Self {
            expire,
            purge,
            interval,
        }
    }

    /// Run until `shutdown` flips to true. The first pass runs immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Maintenance task stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.run_once(Timestamp::now()).await;
                }
            }
        }
    }

    /// One pass as of `now`. Errors are logged, not returned.
    pub async fn run_once(&self, now: Timestamp) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.expire.handle(ExpireSubscriptionsCommand::at(now)).await {
            Ok(result) => {
                report.expired_subscriptions = result.expired;
                if result.expired > 0 {
                    tracing::info!(expired = result.expired, "Expired lapsed subscriptions");
                }
            }
            Err(e) => tracing::error!(error = %e, "Subscription expiry sweep failed"),
        }

        match self.purge.handle(PurgeWebhookEventsCommand { now }).await {
            Ok(result) => report.purged_webhook_events = result.deleted,
            Err(e) => tracing::error!(error = %e, "Webhook event purge failed"),
        }

        report
    }
}
