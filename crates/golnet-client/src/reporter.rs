//! Periodic progress reports polled from the broker.

use std::time::Duration;

use golnet_proto::RpcClient;
use golnet_proto::methods::{BrokerReport, ReportRequest};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Poll `Broker.Report` every `interval`, starting one interval from now,
/// until `stop` turns `true`.
pub fn spawn_reporter(
    client: RpcClient,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = Instant::now()
            .checked_add(interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(first, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = async { let _ = stop.wait_for(|stop| *stop).await; } => break,
                _ = ticker.tick() => match client.call::<BrokerReport>(&ReportRequest {}).await {
                    Ok(report) => info!(
                        completed_turns = report.turns,
                        alive_cells = report.alive_cells_count,
                        "alive cells count"
                    ),
                    Err(e) => warn!(error = %e, "report failed"),
                },
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::LocalBroker;

    #[tokio::test]
    async fn stops_on_signal_without_calling_unreachable_broker() {
        let (stop_tx, stop_rx) = watch::channel(false);
        // Nothing listens here; the first tick is an hour away.
        let client = RpcClient::new("127.0.0.1:9");
        let handle = spawn_reporter(client, Duration::from_secs(3600), stop_rx);

        stop_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn keeps_reporting_until_stopped() {
        let broker = LocalBroker::start(1).await;
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_reporter(broker.client.clone(), Duration::from_millis(10), stop_rx);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());

        stop_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
