//! The fixed table of output slots
//!
//! A logger owns exactly [`SLOT_COUNT`] slots. Each slot pairs a formatter with a
//! writer and has its own level threshold, filter and error handler. A disabled
//! slot has threshold `Off`.

use super::error_handler::ErrorHandler;
use super::filter::Filter;
use super::formatter::{same_formatter, SharedFormatter};
use super::log_level::LogLevel;
use super::writer::{self, SharedWriter};
use crate::formatters::NullFormatter;
use crate::writers::NullWriter;
use std::fmt;
use std::sync::Arc;

pub const SLOT_COUNT: usize = 8;

/// Index of a slot. Slots are processed in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Slot0 = 0,
    Slot1 = 1,
    Slot2 = 2,
    Slot3 = 3,
    Slot4 = 4,
    Slot5 = 5,
    Slot6 = 6,
    Slot7 = 7,
}

impl Slot {
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::Slot0,
        Slot::Slot1,
        Slot::Slot2,
        Slot::Slot3,
        Slot::Slot4,
        Slot::Slot5,
        Slot::Slot6,
        Slot::Slot7,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Slot> {
        Slot::ALL.get(index).copied()
    }
}

/// Configuration of one slot.
///
/// # Example
///
/// ```
/// use rust_slot_logger::core::{writer, LogLevel, SlotConfig};
/// use rust_slot_logger::formatters::text::{TextConfig, TextFormatter};
/// use rust_slot_logger::writers::StreamWriter;
/// use std::sync::Arc;
///
/// let slot = SlotConfig::new(
///     Arc::new(TextFormatter::new(TextConfig::default())),
///     writer::shared(StreamWriter::stderr()),
/// )
/// .with_level(LogLevel::Warn);
/// assert_eq!(slot.level, LogLevel::Warn);
/// ```
#[derive(Clone)]
pub struct SlotConfig {
    pub formatter: SharedFormatter,
    pub writer: SharedWriter,
    pub level: LogLevel,
    pub filter: Option<Filter>,
    pub error_handler: Option<ErrorHandler>,
}

impl SlotConfig {
    /// An enabled slot accepting every level, with no filter and no error handler.
    pub fn new(formatter: SharedFormatter, writer: SharedWriter) -> Self {
        Self {
            formatter,
            writer,
            level: LogLevel::Trace,
            filter: None,
            error_handler: None,
        }
    }

    /// The disabled slot: null formatter, null writer, threshold `Off`.
    pub fn disabled() -> Self {
        Self {
            formatter: Arc::new(NullFormatter),
            writer: writer::shared(NullWriter),
            level: LogLevel::Off,
            filter: None,
            error_handler: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_filter(mut self, filter: impl Into<Option<Filter>>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.level != LogLevel::Off
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for SlotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConfig")
            .field("writer", &self.writer.lock().name())
            .field("level", &self.level)
            .field("filter", &self.filter.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// Slots plus, for each index `i`, the indexes `j > i` whose formatter is the
/// same identity-comparable instance as slot `i`'s.
pub(crate) struct SlotTable {
    pub slots: [SlotConfig; SLOT_COUNT],
    pub equivalents: [Vec<usize>; SLOT_COUNT],
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| SlotConfig::disabled()),
            equivalents: std::array::from_fn(|_| Vec::with_capacity(SLOT_COUNT)),
        }
    }

    /// Recompute the formatter equivalence table.
    pub fn update_equivalents(&mut self) {
        for i in 0..SLOT_COUNT {
            self.equivalents[i].clear();
            for j in (i + 1)..SLOT_COUNT {
                if same_formatter(&self.slots[i].formatter, &self.slots[j].formatter) {
                    self.equivalents[i].push(j);
                }
            }
        }
    }

    pub fn set(&mut self, slot: Slot, config: SlotConfig) {
        self.slots[slot.index()] = config;
        self.update_equivalents();
    }

    pub fn copy(&mut self, dst: Slot, src: Slot) {
        self.slots[dst.index()] = self.slots[src.index()].clone();
        self.update_equivalents();
    }

    pub fn relocate(&mut self, to: Slot, from: Slot) {
        if to != from {
            self.slots[to.index()] =
                std::mem::replace(&mut self.slots[from.index()], SlotConfig::disabled());
        }
        self.update_equivalents();
    }

    pub fn swap(&mut self, left: Slot, right: Slot) {
        self.slots.swap(left.index(), right.index());
        self.update_equivalents();
    }

    pub fn reset(&mut self, slot: Slot) {
        self.set(slot, SlotConfig::disabled());
    }

    pub fn reset_all(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = SlotConfig::disabled();
        }
        self.update_equivalents();
    }

    /// Mutate one slot in place, then recompute the equivalence table.
    pub fn update<F: FnOnce(&mut SlotConfig)>(&mut self, slot: Slot, f: F) {
        f(&mut self.slots[slot.index()]);
        self.update_equivalents();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::FnFormatter;
    use crate::formatters::text::{TextConfig, TextFormatter};

    #[test]
    fn test_new_table_is_disabled() {
        let table = SlotTable::new();
        assert!(table.slots.iter().all(|s| !s.is_enabled()));
        assert!(table.equivalents.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_equivalents_track_shared_formatter() {
        let shared: SharedFormatter = Arc::new(TextFormatter::new(TextConfig::default()));
        let mut table = SlotTable::new();
        table.set(Slot::Slot1, SlotConfig::new(Arc::clone(&shared), writer::shared(NullWriter)));
        table.set(Slot::Slot4, SlotConfig::new(Arc::clone(&shared), writer::shared(NullWriter)));
        table.set(Slot::Slot6, SlotConfig::new(Arc::clone(&shared), writer::shared(NullWriter)));
        assert_eq!(table.equivalents[1], vec![4, 6]);
        assert_eq!(table.equivalents[4], vec![6]);
        assert!(table.equivalents[6].is_empty());

        table.swap(Slot::Slot1, Slot::Slot0);
        assert_eq!(table.equivalents[0], vec![4, 6]);
        assert!(table.equivalents[1].is_empty());

        table.reset(Slot::Slot4);
        assert_eq!(table.equivalents[0], vec![6]);
    }

    #[test]
    fn test_function_formatters_are_never_equivalent() {
        let f: SharedFormatter = Arc::new(FnFormatter::new(|r, buf| {
            buf.extend_from_slice(r.message.as_bytes())
        }));
        let mut table = SlotTable::new();
        table.set(Slot::Slot0, SlotConfig::new(Arc::clone(&f), writer::shared(NullWriter)));
        table.copy(Slot::Slot1, Slot::Slot0);
        assert!(table.equivalents[0].is_empty());
    }

    #[test]
    fn test_move_disables_source() {
        let mut table = SlotTable::new();
        table.set(
            Slot::Slot2,
            SlotConfig::new(Arc::new(NullFormatter), writer::shared(NullWriter))
                .with_level(LogLevel::Info),
        );
        table.relocate(Slot::Slot5, Slot::Slot2);
        assert_eq!(table.slots[5].level, LogLevel::Info);
        assert_eq!(table.slots[2].level, LogLevel::Off);
    }

    #[test]
    fn test_slot_index_roundtrip() {
        for (i, slot) in Slot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(Slot::from_index(i), Some(*slot));
        }
        assert_eq!(Slot::from_index(SLOT_COUNT), None);
    }
}
