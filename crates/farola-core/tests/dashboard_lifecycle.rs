#![allow(clippy::unwrap_used)]
// Integration tests for `Dashboard` driven by an in-process `ChannelSource`.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use farola_core::{
    ChannelSource, CommandError, CommandKind, ControlCommand, Dashboard, DashboardConfig,
    SnapshotBatch, SourceError, StoreError, StorePhase, ZoneFilter,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup() -> (ChannelSource, Dashboard) {
    let source = ChannelSource::new();
    let dashboard = Dashboard::new(DashboardConfig::default(), source.clone());
    (source, dashboard)
}

fn fleet_batch() -> SnapshotBatch {
    SnapshotBatch::new()
        .upsert(
            "p-1",
            json!({"nombre": "Plaza", "zona": "Norte", "online": true, "intensidad": 80}),
        )
        .upsert("p-2", json!({"zona": "Norte", "online": true}))
        .upsert("p-3", json!({"zona": "Sur", "conectado": true, "automatico": true}))
        .upsert("p-4", json!({"zona": "Sur"}))
}

async fn wait_until(dashboard: &Dashboard, ready: impl Fn(&Dashboard) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !ready(dashboard) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
}

// ── Subscription lifecycle ──────────────────────────────────────────

#[tokio::test]
async fn test_batches_populate_the_view() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();

    assert!(dashboard.status().loading);
    assert_eq!(source.collection().as_deref(), Some("postes"));

    assert!(source.push(fleet_batch()));
    wait_until(&dashboard, |d| d.view().available_devices.len() == 4).await;

    let view = dashboard.view();
    assert_eq!(view.stats.total, 4);
    assert_eq!(view.stats.online_percent, 75);
    assert_eq!(view.stats.powered_on_count, 1);
    assert_eq!(view.available_zones, vec!["Norte", "Sur"]);
    assert_eq!(view.available_devices[0].name, "Plaza");

    let status = dashboard.status();
    assert!(!status.loading);
    assert!(status.error.is_none());
    assert!(status.updated_at.is_some());
}

#[tokio::test]
async fn test_updates_and_removals_replace_device_states() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;

    source.push(
        SnapshotBatch::new()
            .upsert("p-4", json!({"zona": "Sur", "online": true}))
            .remove("p-1"),
    );
    wait_until(&dashboard, |d| d.view().stats.total == 3).await;

    let store = dashboard.store();
    assert!(store.device("p-1").is_none());
    assert!(store.device("p-4").unwrap().status.online);
    assert_eq!(dashboard.view().stats.online_count, 3);
}

#[tokio::test]
async fn test_stream_error_keeps_the_snapshot() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;

    source.push_error(SourceError::Connection {
        reason: "quota exceeded".into(),
    });
    wait_until(&dashboard, |d| d.status().error.is_some()).await;

    assert!(matches!(
        dashboard.status().error,
        Some(StoreError::Stream { .. })
    ));
    assert_eq!(dashboard.view().stats.total, 4);
    assert_eq!(dashboard.store().len(), 4);
}

#[tokio::test]
async fn test_decode_error_is_a_processing_error() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();

    source.push_error(SourceError::Decode {
        reason: "expected value".into(),
    });
    wait_until(&dashboard, |d| d.status().error.is_some()).await;

    let status = dashboard.status();
    assert!(matches!(status.error, Some(StoreError::Processing { .. })));
    assert!(!status.loading);

    // The next good batch clears the error.
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.status().error.is_none()).await;
    assert_eq!(dashboard.store().len(), 4);
}

#[tokio::test]
async fn test_source_closing_is_reported() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.close();

    wait_until(&dashboard, |d| d.status().error.is_some()).await;
    assert_eq!(
        dashboard.status().error.unwrap().to_string(),
        "Live data stream error: Snapshot stream closed by the source"
    );
}

#[tokio::test]
async fn test_closed_source_can_be_started_again() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;
    source.close();

    wait_until(&dashboard, |d| d.status().phase == StorePhase::Unsubscribed).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while dashboard.is_running().await {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
    assert!(dashboard.status().error.is_some());
    assert_eq!(dashboard.store().len(), 4);

    dashboard.start().await.unwrap();
    assert_eq!(source.subscriptions(), 2);
    assert!(dashboard.is_running().await);
    assert_eq!(dashboard.status().phase, StorePhase::Subscribed);

    source.push(SnapshotBatch::new().upsert("p-9", json!({"online": true})));
    wait_until(&dashboard, |d| d.view().stats.total == 1).await;
}

#[tokio::test]
async fn test_stop_is_idempotent_and_releases_the_feed() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    assert!(source.is_subscribed());

    dashboard.stop().await;
    dashboard.stop().await;

    assert!(!source.is_subscribed());
    assert!(!dashboard.is_running().await);
    assert_eq!(dashboard.status().phase, StorePhase::Unsubscribed);
    assert!(!source.push(fleet_batch()));
}

#[tokio::test]
async fn test_start_twice_subscribes_once() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    dashboard.start().await.unwrap();
    assert_eq!(source.subscriptions(), 1);
}

#[tokio::test]
async fn test_retry_resubscribes_from_scratch() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;
    source.push_error(SourceError::Connection {
        reason: "network unreachable".into(),
    });
    wait_until(&dashboard, |d| d.status().error.is_some()).await;

    dashboard.retry().await.unwrap();

    assert_eq!(source.subscriptions(), 2);
    let status = dashboard.status();
    assert_eq!(status.phase, StorePhase::Subscribed);
    assert!(status.loading);
    assert!(status.error.is_none());
    assert_eq!(dashboard.view().stats.total, 0);

    source.push(SnapshotBatch::new().upsert("p-9", json!({"online": true})));
    wait_until(&dashboard, |d| d.view().stats.total == 1).await;
}

// ── Filtering and selection ─────────────────────────────────────────

#[tokio::test]
async fn test_zone_filter_changes_list_not_stats() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;
    let unfiltered = dashboard.view().stats;

    dashboard.set_zone_filter(ZoneFilter::Zone("Sur".into()));
    let view = dashboard.view();

    let ids: Vec<&str> = view.filtered_devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["p-3", "p-4"]);
    assert_eq!(view.stats, unfiltered);
    assert_eq!(*dashboard.zone_filter(), ZoneFilter::Zone("Sur".into()));

    dashboard.set_zone_filter(ZoneFilter::parse(Some("todas")));
    assert_eq!(dashboard.view().filtered_devices.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_filter_change_is_never_overwritten_by_a_batch() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();

    let feeder = {
        let source = source.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                let zone = if i % 2 == 0 { "Norte" } else { "Sur" };
                source.push(SnapshotBatch::new().upsert(format!("p-{i}"), json!({"zona": zone})));
                tokio::task::yield_now().await;
            }
        })
    };

    for i in 0..300 {
        let filter = match i % 3 {
            0 => ZoneFilter::All,
            1 => ZoneFilter::Zone("Norte".into()),
            _ => ZoneFilter::Zone("Sur".into()),
        };
        dashboard.set_zone_filter(filter.clone());
        assert_eq!(dashboard.view().filter, filter);
        tokio::task::yield_now().await;
    }
    feeder.await.unwrap();
    assert_eq!(dashboard.view().filter, *dashboard.zone_filter());
}

#[tokio::test]
async fn test_stale_selection_is_tolerated() {
    let (source, dashboard) = setup();
    dashboard.start().await.unwrap();
    source.push(fleet_batch());
    wait_until(&dashboard, |d| d.view().stats.total == 4).await;

    dashboard.set_selection(["p-2", "p-3"]);
    source.push(SnapshotBatch::new().remove("p-3"));
    wait_until(&dashboard, |d| d.view().stats.total == 3).await;

    let selected = dashboard.selected_devices();
    assert_eq!(selected.len(), 2);
    assert!(!selected[0].is_stale());
    assert!(selected[1].is_stale());
    assert_eq!(selected[1].id(), "p-3");
    assert_eq!(dashboard.selection().len(), 2);

    assert_eq!(dashboard.prune_selection(), 1);
    assert_eq!(dashboard.selection().ids(), ["p-2"]);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_command_error_clears_after_ttl() {
    let (_source, dashboard) = setup();
    let err = dashboard
        .send_command(ControlCommand::power(true, vec!["p-1".into()]))
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Unsupported { kind: CommandKind::Encender });

    let mut errors = dashboard.subscribe_command_error();
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(dashboard.command_error(), Some(err));

    tokio::time::timeout(Duration::from_secs(2), errors.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(dashboard.command_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_newer_command_error_restarts_the_ttl() {
    let (_source, dashboard) = setup();
    let targets = vec!["p-1".to_owned()];

    dashboard
        .send_command(ControlCommand::power(true, targets.clone()))
        .await
        .unwrap_err();
    tokio::time::sleep(Duration::from_secs(3)).await;

    dashboard
        .send_command(ControlCommand::automatic_mode(targets, true))
        .await
        .unwrap_err();
    let mut errors = dashboard.subscribe_command_error();

    // Past the first error's expiry, short of the second's.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(
        dashboard.command_error(),
        Some(CommandError::Unsupported {
            kind: CommandKind::ModoAutomatico
        })
    );

    tokio::time::timeout(Duration::from_secs(3), errors.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(dashboard.command_error().is_none());
}
