//! Send node tests over the loopback transport
//!
//! Outlets are read back either with raw inlets or with a receive node.

use slotstream::{LoopbackTransport, ReceiveNode, ReceiveSettings, SendNode, SendSettings};
use slotstream_engine::OutletStatus;
use slotstream_transport::{Inlet, LoopbackInlet, Transport};
use std::time::Duration;

const CHANNEL_MISMATCH: &str = "Channel numbers for each stream is not specified correctly";

/// Helper to build send settings
fn send_settings(names: &[&str], counts: &[i64]) -> SendSettings {
    SendSettings {
        stream_type: "EEG".to_string(),
        stream_names: names.iter().map(|s| s.to_string()).collect(),
        channel_counts: counts.to_vec(),
        nominal_rate: 100.0,
        ..Default::default()
    }
}

/// Helper to open a raw inlet on a named stream
fn open_inlet(bus: &LoopbackTransport, name: &str) -> LoopbackInlet {
    let found = bus.resolve("EEG", 1, Duration::ZERO).unwrap();
    let descriptor = found.iter().find(|d| d.name == name).unwrap();
    bus.open_inlet(descriptor, Duration::from_secs(1)).unwrap()
}

#[test]
fn test_channel_count_change_recreates_outlet() {
    let bus = LoopbackTransport::new();
    let mut node = SendNode::new(bus.clone(), send_settings(&["EEG_0"], &[2]));
    node.set_values(0, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    node.evaluate();

    let before = node.outlets().slot(0).unwrap().binding().unwrap().connection_id();
    let mut old_inlet = open_inlet(&bus, "EEG_0");
    node.evaluate();
    let chunk = old_inlet.pull_chunk(10, Duration::ZERO).unwrap();
    assert_eq!(chunk.samples(), &[vec![1.0, 2.0]]);

    node.set_channel_counts(vec![4]);
    let report = node.evaluate();
    assert!(report.reconnected);

    let binding = node.outlets().slot(0).unwrap().binding().unwrap();
    assert_ne!(binding.connection_id(), before);
    assert_eq!(binding.channel_count(), 4);
    assert_eq!(bus.advertised_count(), 1);

    let mut new_inlet = open_inlet(&bus, "EEG_0");
    assert!(old_inlet.pull_chunk(10, Duration::ZERO).is_err());

    node.evaluate();
    let chunk = new_inlet.pull_chunk(10, Duration::ZERO).unwrap();
    assert_eq!(chunk.samples(), &[vec![1.0, 2.0, 3.0, 4.0]]);
}

#[test]
fn test_list_mismatch_suppresses_every_push() {
    let bus = LoopbackTransport::new();
    let mut node = SendNode::new(bus.clone(), send_settings(&["a", "b"], &[1, 1]));
    node.evaluate();
    let mut inlet_a = open_inlet(&bus, "a");

    node.set_stream_names(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    let report = node.evaluate();
    assert!(report.suppressed);
    assert_eq!(report.samples, 0);
    assert_eq!(node.status_message(), CHANNEL_MISMATCH);
    assert_eq!(node.outlet_status(), OutletStatus::ChannelMismatch);
    assert_eq!(node.slot_count(), 2);
    assert_eq!(bus.advertised_count(), 2);

    for _ in 0..3 {
        assert!(node.evaluate().suppressed);
    }
    assert!(inlet_a.pull_chunk(10, Duration::ZERO).unwrap().is_empty());

    node.set_channel_counts(vec![1, 1, 1]);
    let report = node.evaluate();
    assert!(!report.suppressed);
    assert_eq!(report.samples, 3);
    assert_eq!(node.status_message(), "OK");
    assert_eq!(inlet_a.pull_chunk(10, Duration::ZERO).unwrap().len(), 1);
}

#[test]
fn test_negative_channel_count_is_a_mismatch() {
    let bus = LoopbackTransport::new();
    let mut node = SendNode::new(bus, send_settings(&["a"], &[-2]));
    let report = node.evaluate();

    assert!(report.suppressed);
    assert_eq!(node.status_message(), CHANNEL_MISMATCH);
}

#[test]
fn test_send_to_receive_node() {
    let bus = LoopbackTransport::new();
    let mut sender = SendNode::new(bus.clone(), send_settings(&["EEG_0", "EEG_1"], &[3, 1]));
    let mut receiver = ReceiveNode::new(
        bus,
        ReceiveSettings {
            slot_count: 2,
            stream_names: vec!["EEG_1".to_string(), "EEG_0".to_string()],
            resolve_wait_secs: 0.0,
            ..Default::default()
        },
    )
    .unwrap();

    for cycle in 0..5 {
        sender.set_values(0, vec![cycle as f64, 0.5]).unwrap();
        sender.set_values(1, vec![-(cycle as f64)]).unwrap();
        assert_eq!(sender.evaluate().samples, 2);
    }

    let report = receiver.evaluate();
    assert_eq!(report.active_slots, 2);
    assert_eq!(receiver.channel_counts(), vec![1, 3]);
    assert_eq!(receiver.nominal_rates(), vec![100.0, 100.0]);

    sender.set_values(0, vec![7.0]).unwrap();
    sender.evaluate();
    receiver.evaluate();

    let eeg_0 = receiver.slot_output(1).unwrap();
    assert_eq!(eeg_0.channel(0).unwrap(), &[7.0]);
    assert_eq!(eeg_0.channel(1).unwrap(), &[0.0]);
    assert_eq!(eeg_0.channel(2).unwrap(), &[0.0]);

    let eeg_1 = receiver.slot_output(0).unwrap();
    assert_eq!(eeg_1.channel(0).unwrap(), &[-4.0]);

    let stats = sender.stats();
    assert_eq!(stats.total_samples_pushed(), 12);
    assert_eq!(stats.active_slot_count(), 2);
}

#[test]
fn test_disabled_cycle_sends_nothing() {
    let bus = LoopbackTransport::new();
    let mut node = SendNode::new(bus.clone(), send_settings(&["a"], &[1]));
    node.evaluate();
    let mut inlet = open_inlet(&bus, "a");

    node.set_enabled(false);
    let report = node.evaluate();
    assert_eq!(report.samples, 0);
    assert!(!report.suppressed);
    assert_eq!(node.status_message(), "OK");

    node.set_enabled(true);
    node.evaluate();
    assert_eq!(inlet.pull_chunk(10, Duration::ZERO).unwrap().len(), 1);
}
