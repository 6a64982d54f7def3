//! Receive node tests over the loopback transport
//!
//! These tests drive whole cycles: resolve, bind and drain.

use slotstream::{LoopbackTransport, ReceiveNode, ReceiveSettings};
use slotstream_transport::{LoopbackOutlet, Outlet, OutletSpec, Transport};

/// Helper to advertise an EEG stream on the bus
fn advertise(bus: &LoopbackTransport, name: &str, channels: usize, rate: f64) -> LoopbackOutlet {
    bus.open_outlet(&OutletSpec::new(name, "EEG", channels).with_rate(rate))
        .unwrap()
}

/// Helper to build receive settings for the given slot names
fn receive_settings(names: &[&str]) -> ReceiveSettings {
    ReceiveSettings {
        stream_type: "EEG".to_string(),
        slot_count: names.len() as i64,
        stream_names: names.iter().map(|s| s.to_string()).collect(),
        resolve_wait_secs: 0.0,
        ..Default::default()
    }
}

/// Helper to push `count` samples where channel `c` of sample `i` is `i * 10 + c`
fn push_numbered(outlet: &mut LoopbackOutlet, channels: usize, count: usize) {
    for i in 0..count {
        let sample: Vec<f64> = (0..channels).map(|c| (i * 10 + c) as f64).collect();
        outlet.push_sample(&sample).unwrap();
    }
}

#[test]
fn test_eeg_end_to_end_hundred_samples() {
    let bus = LoopbackTransport::new();
    let mut outlet = advertise(&bus, "EEG_0", 8, 250.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0"])).unwrap();

    node.evaluate();
    assert_eq!(node.channel_counts(), vec![8]);
    assert_eq!(node.nominal_rates(), vec![250.0]);

    push_numbered(&mut outlet, 8, 100);
    let report = node.evaluate();
    assert_eq!(report.samples, 100);

    let output = node.slot_output(0).unwrap();
    assert_eq!(output.channels().len(), 8);
    for channel in 0..8 {
        let values = output.channel(channel).unwrap();
        assert_eq!(values.len(), 100);
        assert_eq!(values[0], (99 * 10 + channel) as f64);
        assert_eq!(values[99], channel as f64);
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    let timestamps = output.timestamps();
    assert_eq!(timestamps.len(), 100);
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_budget_spreads_backlog_over_cycles() {
    let bus = LoopbackTransport::new();
    let mut outlet = advertise(&bus, "EEG_0", 2, 1000.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0"])).unwrap();
    node.evaluate();

    push_numbered(&mut outlet, 2, 600);

    assert_eq!(node.evaluate().samples, 512);
    let first = node.slot_output(0).unwrap().channel(0).unwrap().to_vec();
    assert_eq!(first[0], 5110.0);
    assert_eq!(first[511], 0.0);

    assert_eq!(node.evaluate().samples, 88);
    let second = node.slot_output(0).unwrap().channel(0).unwrap();
    assert_eq!(second[0], 5990.0);
    assert_eq!(second[87], 5120.0);

    assert_eq!(node.evaluate().samples, 0);
    assert_eq!(node.slot_output(0).unwrap().sample_count(), 0);
    assert_eq!(node.channel_counts(), vec![2]);
}

#[test]
fn test_duplicate_names_bind_independently() {
    let bus = LoopbackTransport::new();
    let mut outlet = advertise(&bus, "EEG_0", 4, 250.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0", "EEG_0"])).unwrap();

    let report = node.evaluate();
    assert_eq!(report.active_slots, 2);
    assert_eq!(bus.subscriber_count("EEG_0"), 2);

    let inlets = node.inlets();
    let a = inlets.slot(0).unwrap().binding().unwrap();
    let b = inlets.slot(1).unwrap().binding().unwrap();
    assert_eq!(a.descriptor().handle, b.descriptor().handle);
    assert_ne!(a.connection_id(), b.connection_id());

    push_numbered(&mut outlet, 4, 10);
    node.evaluate();
    assert_eq!(
        node.slot_output(0).unwrap().channels(),
        node.slot_output(1).unwrap().channels()
    );
    assert_eq!(node.slot_output(1).unwrap().sample_count(), 10);
}

#[test]
fn test_empty_and_unmatched_names_stay_inactive() {
    let bus = LoopbackTransport::new();
    let _outlet = advertise(&bus, "EEG_0", 8, 250.0);
    let mut node = ReceiveNode::new(bus, receive_settings(&["", "EEG_9", "EEG_0"])).unwrap();

    let report = node.evaluate();
    assert_eq!(report.active_slots, 1);
    assert_eq!(node.channel_counts(), vec![0, 0, 8]);
    assert_eq!(node.status_message(), "OK");

    let inlets = node.inlets();
    assert!(inlets.slot(0).unwrap().binding().is_none());
    assert!(inlets.slot(1).unwrap().binding().is_none());
    assert_eq!(node.slot_output(1).unwrap().sample_count(), 0);
}

#[test]
fn test_type_filter_limits_candidates() {
    let bus = LoopbackTransport::new();
    let _markers = bus
        .open_outlet(&OutletSpec::new("EEG_0", "Markers", 1))
        .unwrap();
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0"])).unwrap();

    node.evaluate();
    assert_eq!(node.channel_counts(), vec![0]);

    node.set_stream_type("");
    node.evaluate();
    assert_eq!(node.channel_counts(), vec![1]);
}

#[test]
fn test_shrink_releases_and_grow_starts_empty() {
    let bus = LoopbackTransport::new();
    let _a = advertise(&bus, "EEG_0", 1, 250.0);
    let _b = advertise(&bus, "EEG_1", 1, 250.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0", "EEG_1"])).unwrap();
    node.evaluate();
    assert_eq!(bus.subscriber_count("EEG_1"), 1);

    node.set_slot_count(1).unwrap();
    assert_eq!(bus.subscriber_count("EEG_1"), 0);
    assert_eq!(node.slot_count(), 1);

    node.set_slot_count(3).unwrap();
    node.evaluate();
    assert_eq!(node.inlets().target_names(), vec!["EEG_0", "", ""]);
    assert_eq!(node.channel_counts(), vec![1, 0, 0]);
}

#[test]
fn test_restarted_source_rebinds_on_refresh() {
    let bus = LoopbackTransport::new();
    let outlet = advertise(&bus, "EEG_0", 2, 250.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0"])).unwrap();
    node.evaluate();

    drop(outlet);
    let report = node.evaluate();
    assert_eq!(report.failed_slots, vec![0]);
    assert!(!node.status().is_ok());

    let mut restarted = advertise(&bus, "EEG_0", 3, 250.0);
    assert_eq!(node.evaluate().active_slots, 0);

    node.refresh();
    let report = node.evaluate();
    assert!(report.reconnected);
    assert_eq!(node.channel_counts(), vec![3]);
    assert_eq!(node.status_message(), "OK");

    push_numbered(&mut restarted, 3, 5);
    assert_eq!(node.evaluate().samples, 5);
}

#[test]
fn test_last_samples_survive_source_shutdown() {
    let bus = LoopbackTransport::new();
    let mut outlet = advertise(&bus, "EEG_0", 2, 250.0);
    let mut node = ReceiveNode::new(bus.clone(), receive_settings(&["EEG_0"])).unwrap();
    node.evaluate();

    push_numbered(&mut outlet, 2, 3);
    drop(outlet);

    let report = node.evaluate();
    assert_eq!(report.samples, 3);
    assert!(report.failed_slots.is_empty());
    assert_eq!(node.slot_output(0).unwrap().channel(1).unwrap(), &[21.0, 11.0, 1.0]);
    assert_eq!(node.status_message(), "OK");

    let report = node.evaluate();
    assert_eq!(report.failed_slots, vec![0]);
    assert_eq!(node.channel_counts(), vec![0]);
    assert_eq!(node.status_message(), "Stream 'EEG_0' is no longer available");
}
