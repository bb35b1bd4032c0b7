//! Built-in result kind that replays pre-encoded records.
//!
//! A [`RecordedResult`] carries its payload as a list of frame-writer calls
//! (marker groups and blocks).  It is what the CLI loads from a JSON model
//! manifest, and it is handy for producing reference files whose payload was
//! captured from another writer.
//!
//! ```json
//! {
//!   "table_name": "OUGV1",
//!   "subcase_id": 1,
//!   "header":  [{ "op": "markers", "values": [2] }],
//!   "records": [{ "op": "block", "fields": [{ "i": 8 }, { "s": "OUGV1   " }, { "i": 8 }] }]
//! }
//! ```

use std::any::Any;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::frame::{Field, FrameWriter};
use super::{Encode, EncodeContext, TableResult};

const DEFAULT_KIND: &str = "RecordedResult";

/// One value inside a recorded block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordedValue {
    #[serde(rename = "i")] Int(i32),
    #[serde(rename = "q")] Long(i64),
    #[serde(rename = "f")] Float(f32),
    #[serde(rename = "d")] Double(f64),
    /// Written as raw UTF-8 bytes with no padding.
    #[serde(rename = "s")] Text(String),
}

impl RecordedValue {
    fn as_field(&self) -> Field<'_> {
        match self {
            RecordedValue::Int(v)    => Field::Int(*v),
            RecordedValue::Long(v)   => Field::Long(*v),
            RecordedValue::Float(v)  => Field::Float(*v),
            RecordedValue::Double(v) => Field::Double(*v),
            RecordedValue::Text(s)   => Field::Bytes(s.as_bytes()),
        }
    }
}

/// One frame-writer call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RecordedWrite {
    Markers { values: Vec<i32> },
    Block { fields: Vec<RecordedValue> },
}

impl RecordedWrite {
    fn replay(&self, out: &mut FrameWriter<'_>) -> Result<(), EncodeError> {
        match self {
            RecordedWrite::Markers { values } => out.write_markers(values)?,
            RecordedWrite::Block { fields } => {
                let fields: Vec<Field<'_>> = fields.iter().map(RecordedValue::as_field).collect();
                out.write_block(&fields)?;
            }
        }
        Ok(())
    }
}

fn default_kind() -> String { DEFAULT_KIND.to_string() }
fn default_steps() -> u32 { 1 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResult {
    #[serde(default = "default_kind")]
    pub kind:         String,
    pub table_name:   String,
    pub subcase_id:   i32,
    #[serde(default)]
    pub element_name: Option<String>,
    /// Written only when this is the first result of its table.
    #[serde(default)]
    pub header:       Vec<RecordedWrite>,
    #[serde(default)]
    pub records:      Vec<RecordedWrite>,
    /// How far the table index moves for this result.
    #[serde(default = "default_steps")]
    pub table_steps:  u32,
}

impl RecordedResult {
    /// A result with no payload that advances the table index by one.
    pub fn new(table_name: &str, subcase_id: i32) -> Self {
        Self {
            kind:         default_kind(),
            table_name:   table_name.to_string(),
            subcase_id,
            element_name: None,
            header:       Vec::new(),
            records:      Vec::new(),
            table_steps:  default_steps(),
        }
    }
}

impl TableResult for RecordedResult {
    fn kind(&self) -> &str { &self.kind }
    fn table_name(&self) -> &str { &self.table_name }
    fn subcase_id(&self) -> i32 { self.subcase_id }
    fn element_name(&self) -> Option<&str> { self.element_name.as_deref() }
    fn as_any(&self) -> &dyn Any { self }
}

impl Encode for RecordedResult {
    fn encode(&self, out: &mut FrameWriter<'_>, ctx: &EncodeContext) -> Result<i32, EncodeError> {
        if self.table_steps == 0 {
            return Err(EncodeError::Invalid("table_steps must be at least 1".into()));
        }
        if ctx.is_new_result {
            for write in &self.header {
                write.replay(out)?;
            }
        }
        for write in &self.records {
            write.replay(out)?;
        }
        i32::try_from(self.table_steps)
            .ok()
            .and_then(|steps| ctx.itable.checked_sub(steps))
            .ok_or_else(|| EncodeError::Invalid(format!(
                "itable {} cannot move by {} steps", ctx.itable, self.table_steps
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Endian;
    use chrono::NaiveDate;

    fn ctx(itable: i32, is_new_result: bool) -> EncodeContext {
        EncodeContext {
            itable,
            is_new_result,
            date:         NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            is_mag_phase: false,
            endian:       Endian::Little,
        }
    }

    fn sample() -> RecordedResult {
        serde_json::from_str(r#"{
            "table_name": "OUGV1",
            "subcase_id": 7,
            "element_name": "CBAR",
            "header":  [{ "op": "markers", "values": [2] }],
            "records": [{ "op": "block", "fields": [{ "i": 8 }, { "s": "OUGV1   " }, { "i": 8 }] }],
            "table_steps": 2
        }"#).unwrap()
    }

    #[test]
    fn manifest_defaults() {
        let r: RecordedResult = serde_json::from_str(
            r#"{ "table_name": "OQG1", "subcase_id": 1 }"#
        ).unwrap();
        assert_eq!(r, RecordedResult::new("OQG1", 1));
        assert_eq!(r.kind(), "RecordedResult");
    }

    #[test]
    fn header_only_on_first_result() {
        let r = sample();
        let mut bin = Vec::new();
        let mut txt = Vec::new();
        let mut fw = FrameWriter::new(&mut bin, &mut txt, Endian::Little);
        assert_eq!(r.encode(&mut fw, &ctx(-1, true)).unwrap(), -3);
        let first = fw.bytes_written();
        assert_eq!(first, 12 + 16);
        assert_eq!(r.encode(&mut fw, &ctx(-3, false)).unwrap(), -5);
        assert_eq!(fw.bytes_written() - first, 16);
    }

    #[test]
    fn zero_steps_is_rejected() {
        let mut r = RecordedResult::new("OQG1", 1);
        r.table_steps = 0;
        let mut bin = Vec::new();
        let mut txt = Vec::new();
        let mut fw = FrameWriter::new(&mut bin, &mut txt, Endian::Little);
        assert!(matches!(r.encode(&mut fw, &ctx(-1, true)), Err(EncodeError::Invalid(_))));
    }
}
