use super::*;
use tokio::sync::broadcast::error::TryRecvError;

#[test]
fn test_notification_carries_topic() {
    let n = Notification::new(Streamer::new(1, vec![]), EventKind::Added);
    assert_eq!(n.topic, "DataSourceEvent");
    assert_eq!(n.kind, EventKind::Added);
    assert_eq!(n.streamer.uid, 1);
}

#[test]
fn test_event_kind_display() {
    assert_eq!(EventKind::Added.to_string(), "DataSourceAdded");
    assert_eq!(EventKind::Removed.to_string(), "DataSourceRemoved");
    assert_eq!(EventKind::Updated.to_string(), "DataSourceUpdated");
}

#[test]
fn test_broadcast_sink_without_subscribers() {
    let sink = BroadcastSink::new(4);
    assert_eq!(sink.receiver_count(), 0);

    // Must not panic or block
    sink.notify(Notification::new(Streamer::new(1, vec![]), EventKind::Added));
}

#[test]
fn test_broadcast_sink_delivers_in_order() {
    let sink = BroadcastSink::new(16);
    let mut rx = sink.subscribe();

    sink.notify(Notification::new(Streamer::new(1, vec![]), EventKind::Removed));
    sink.notify(Notification::new(Streamer::new(2, vec![]), EventKind::Added));

    assert_eq!(rx.try_recv().unwrap().kind, EventKind::Removed);
    assert_eq!(rx.try_recv().unwrap().streamer.uid, 2);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_broadcast_sink_lagging_subscriber_does_not_block() {
    let sink = BroadcastSink::new(2);
    let mut rx = sink.subscribe();

    for uid in 0..5 {
        sink.notify(Notification::new(Streamer::new(uid, vec![]), EventKind::Added));
    }

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(3))));
    assert_eq!(rx.try_recv().unwrap().streamer.uid, 3);
}

#[test]
fn test_recording_sink() {
    let sink = RecordingSink::new();
    sink.notify(Notification::new(Streamer::new(1, vec![]), EventKind::Added));
    sink.notify(Notification::new(Streamer::new(1, vec![]), EventKind::Updated));

    assert_eq!(
        sink.kinds(),
        vec![(EventKind::Added, 1), (EventKind::Updated, 1)]
    );
    assert_eq!(sink.take().len(), 2);
    assert!(sink.events().is_empty());
}
