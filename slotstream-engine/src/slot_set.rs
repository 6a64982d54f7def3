//! Runtime-resizable slot collection
//!
//! A node keeps one record per logical stream slot. The slot count is driven
//! from outside (host configuration or the length of a declared name list);
//! growing constructs new records through a factory and shrinking destroys
//! records from the tail. Because every per-slot concern lives in the same
//! record, there are no parallel arrays that could fall out of step.

use crate::error::ConfigError;

/// Validated slot count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotConfig {
    count: usize,
}

impl SlotConfig {
    /// Create a slot configuration
    pub fn new(count: usize) -> Self {
        SlotConfig { count }
    }

    /// Validate a host-provided (signed) slot count
    pub fn try_from_signed(count: i64) -> Result<Self, ConfigError> {
        usize::try_from(count)
            .map(SlotConfig::new)
            .map_err(|_| ConfigError::NegativeSlotCount(count))
    }

    /// Number of slots
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Resize notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEvent {
    Grew { from: usize, to: usize },
    Shrank { from: usize, to: usize },
}

impl ResizeEvent {
    /// Slot count after the resize
    pub fn new_count(&self) -> usize {
        match *self {
            ResizeEvent::Grew { to, .. } | ResizeEvent::Shrank { to, .. } => to,
        }
    }
}

/// A positionally labelled slot
#[derive(Debug, Clone)]
pub struct Slot<T> {
    label: String,
    value: T,
}

impl<T> Slot<T> {
    /// Stable positional label, e.g. "Stream name 2"
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

type ResizeObserver = Box<dyn FnMut(ResizeEvent) + Send>;

/// Ordered collection of slots whose count is externally driven
pub struct SlotSet<T> {
    slots: Vec<Slot<T>>,
    label_prefix: String,
    observers: Vec<ResizeObserver>,
}

impl<T> SlotSet<T> {
    /// Create an empty set whose slots are labelled "`label_prefix` {n}"
    pub fn new(label_prefix: impl Into<String>) -> Self {
        SlotSet {
            slots: Vec::new(),
            label_prefix: label_prefix.into(),
            observers: Vec::new(),
        }
    }

    /// Label given to the slot at `index` (labels are 1-based)
    pub fn label_for(&self, index: usize) -> String {
        format!("{} {}", self.label_prefix, index + 1)
    }

    /// Register a callback fired after every effective resize
    pub fn subscribe(&mut self, observer: impl FnMut(ResizeEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Resize to `new_count` slots
    ///
    /// New slots are built by `factory`, which receives the slot index.
    /// Excess slots are destroyed from the tail, last slot first, so any
    /// connection a slot owns is released before the next one is touched.
    /// Resizing to the current count is a no-op and notifies nobody.
    pub fn resize_with<F>(&mut self, new_count: usize, mut factory: F) -> Option<ResizeEvent>
    where
        F: FnMut(usize) -> T,
    {
        let current = self.slots.len();

        let event = if new_count > current {
            self.slots.reserve(new_count - current);
            for index in current..new_count {
                let label = self.label_for(index);
                self.slots.push(Slot {
                    label,
                    value: factory(index),
                });
            }
            ResizeEvent::Grew {
                from: current,
                to: new_count,
            }
        } else if new_count < current {
            while self.slots.len() > new_count {
                drop(self.slots.pop());
            }
            ResizeEvent::Shrank {
                from: current,
                to: new_count,
            }
        } else {
            return None;
        };

        for observer in &mut self.observers {
            observer(event);
        }

        Some(event)
    }

    /// Resize from a host-provided signed count
    ///
    /// A negative count is rejected and the current slots are kept.
    pub fn resize_signed<F>(
        &mut self,
        requested: i64,
        factory: F,
    ) -> Result<Option<ResizeEvent>, ConfigError>
    where
        F: FnMut(usize) -> T,
    {
        let config = SlotConfig::try_from_signed(requested)?;
        Ok(self.resize_with(config.count(), factory))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot<T>> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slot<T>> {
        self.slots.get_mut(index)
    }

    /// Iterate slots in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Slot<T>> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot<T>> {
        self.slots.iter_mut()
    }

    /// Iterate slot values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().map(|slot| &slot.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|slot| &mut slot.value)
    }
}

impl<T: Default> SlotSet<T> {
    /// Resize, building new slots with `T::default()`
    pub fn resize_default(&mut self, new_count: usize) -> Option<ResizeEvent> {
        self.resize_with(new_count, |_| T::default())
    }
}
