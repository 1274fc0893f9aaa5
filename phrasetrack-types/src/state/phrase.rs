//! Phrase tables: rows of typed columns.

use serde::{Deserialize, Serialize};

use crate::{PhraseId, NUM_PHRASES, PHRASE_ROWS};

/// Columns of a phrase row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    /// Delta-time: ticks until the next event. DT >= 1 makes the row playable.
    DeltaTime,
    Note,
    Velocity,
    Gate,
    /// Index into the project's sampler file list.
    File,
    Retrigger,
    /// Pulses-per-quarter-note override while this row plays.
    Ppq,
}

/// A single phrase row. Unset columns are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_time: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrigger: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppq: Option<u16>,
}

impl Row {
    /// A row triggers when its delta-time is at least 1. DT 0 or unset is pass-through.
    pub fn is_playable(&self) -> bool {
        self.delta_time.is_some_and(|dt| dt >= 1)
    }

    /// Tick budget for this row: its delta-time, 0 for pass-through rows.
    pub fn ticks(&self) -> u32 {
        self.delta_time.map(u32::from).unwrap_or(0)
    }

    pub fn get(&self, column: Column) -> Option<u16> {
        match column {
            Column::DeltaTime => self.delta_time.map(u16::from),
            Column::Note => self.note.map(u16::from),
            Column::Velocity => self.velocity.map(u16::from),
            Column::Gate => self.gate.map(u16::from),
            Column::File => self.file,
            Column::Retrigger => self.retrigger.map(u16::from),
            Column::Ppq => self.ppq,
        }
    }

    /// Set or clear a column. Values wider than the column saturate.
    pub fn set(&mut self, column: Column, value: Option<u16>) {
        let narrow = |v: u16| v.min(u8::MAX as u16) as u8;
        match column {
            Column::DeltaTime => self.delta_time = value.map(narrow),
            Column::Note => self.note = value.map(narrow),
            Column::Velocity => self.velocity = value.map(narrow),
            Column::Gate => self.gate = value.map(narrow),
            Column::File => self.file = value,
            Column::Retrigger => self.retrigger = value.map(narrow),
            Column::Ppq => self.ppq = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    rows: Vec<Row>,
}

impl Default for Phrase {
    fn default() -> Self {
        Self {
            rows: vec![Row::default(); PHRASE_ROWS],
        }
    }
}

impl Phrase {
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Restore the fixed row count after deserializing a truncated or oversized phrase.
    fn normalize(&mut self) {
        self.rows.resize(PHRASE_ROWS, Row::default());
    }
}

/// All phrases for one track kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseTable {
    phrases: Vec<Phrase>,
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self {
            phrases: vec![Phrase::default(); NUM_PHRASES],
        }
    }
}

impl PhraseTable {
    pub fn phrase(&self, id: PhraseId) -> Option<&Phrase> {
        self.phrases.get(id.index())
    }

    pub fn phrase_mut(&mut self, id: PhraseId) -> Option<&mut Phrase> {
        self.phrases.get_mut(id.index())
    }

    pub fn row(&self, id: PhraseId, row: usize) -> Option<&Row> {
        self.phrase(id).and_then(|p| p.row(row))
    }

    pub fn row_mut(&mut self, id: PhraseId, row: usize) -> Option<&mut Row> {
        self.phrase_mut(id).and_then(|p| p.row_mut(row))
    }

    /// Convenience setter for the delta-time column.
    pub fn set_delta_time(&mut self, id: PhraseId, row: usize, dt: Option<u8>) {
        if let Some(r) = self.row_mut(id, row) {
            r.delta_time = dt;
        }
    }

    /// Fix table and phrase sizes after loading from disk.
    pub fn normalize(&mut self) {
        self.phrases.resize_with(NUM_PHRASES, Phrase::default);
        for phrase in &mut self.phrases {
            phrase.normalize();
        }
    }
}
