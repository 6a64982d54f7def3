//! Change-driven reconnection
//!
//! Every cycle the node hands the controller a snapshot of its watched
//! inputs. The controller diffs it against the previous cycle's snapshot and
//! moves to `ChangePending` when anything differs or a manual refresh was
//! requested. The node takes the pending change, runs one reconnect pass and
//! the controller is `Idle` again.

/// Inputs whose change forces a reconnect pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WatchedInputs {
    pub enabled: bool,
    pub stream_type: String,
    /// Per-slot stream names (the slot count is implied by the length)
    pub names: Vec<String>,
    /// Per-slot channel counts (outbound nodes only)
    pub channel_counts: Vec<i64>,
}

/// Reconnect state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectState {
    #[default]
    Idle,
    ChangePending,
}

/// Which watched inputs triggered a pending reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// First observation since the node was created
    pub initial: bool,
    pub enabled: bool,
    pub stream_type: bool,
    pub names: bool,
    pub channel_counts: bool,
    pub refresh: bool,
}

impl ChangeSet {
    /// Whether anything changed
    pub fn any(&self) -> bool {
        self.initial
            || self.enabled
            || self.stream_type
            || self.names
            || self.channel_counts
            || self.refresh
    }

    /// Fold another set of changes into this one
    pub fn merge(&mut self, other: ChangeSet) {
        self.initial |= other.initial;
        self.enabled |= other.enabled;
        self.stream_type |= other.stream_type;
        self.names |= other.names;
        self.channel_counts |= other.channel_counts;
        self.refresh |= other.refresh;
    }

    fn between(previous: &WatchedInputs, current: &WatchedInputs, refresh: bool) -> Self {
        ChangeSet {
            initial: false,
            enabled: previous.enabled != current.enabled,
            stream_type: previous.stream_type != current.stream_type,
            names: previous.names != current.names,
            channel_counts: previous.channel_counts != current.channel_counts,
            refresh,
        }
    }
}

/// Decides when a node must re-resolve or recreate its connections
#[derive(Debug, Default)]
pub struct ReconnectController {
    previous: Option<WatchedInputs>,
    pending: Option<ChangeSet>,
    reconnects: u64,
}

impl ReconnectController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff this cycle's inputs against the last cycle's
    ///
    /// The very first observation always counts as a change so that a node
    /// connects on startup. Any number of changes observed before the pending
    /// one is taken collapse into a single pass.
    pub fn observe(&mut self, inputs: &WatchedInputs, refresh: bool) -> ReconnectState {
        let changes = match &self.previous {
            None => ChangeSet {
                initial: true,
                refresh,
                ..ChangeSet::default()
            },
            Some(previous) => ChangeSet::between(previous, inputs, refresh),
        };

        if changes.any() {
            tracing::debug!("Reconnect triggered: {:?}", changes);
            match &mut self.pending {
                Some(pending) => pending.merge(changes),
                None => self.pending = Some(changes),
            }
        }

        if self.previous.as_ref() != Some(inputs) {
            self.previous = Some(inputs.clone());
        }

        self.state()
    }

    /// Take the pending change, returning the controller to `Idle`
    pub fn take_pending(&mut self) -> Option<ChangeSet> {
        let pending = self.pending.take();
        if pending.is_some() {
            self.reconnects += 1;
        }
        pending
    }

    pub fn state(&self) -> ReconnectState {
        if self.pending.is_some() {
            ReconnectState::ChangePending
        } else {
            ReconnectState::Idle
        }
    }

    /// Reconnect passes handed out so far
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects
    }
}
