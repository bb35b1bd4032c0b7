//! Result kinds and the encoder registry.
//!
//! # Identity rules
//! A result kind is a concrete Rust type implementing [`TableResult`].  Its
//! encode capability is the [`Encode`] impl for that type, made available to
//! the writer by registering the type in an [`EncoderRegistry`].  Lookup is
//! by `TypeId`, never by name.
//!
//! A result whose type was not registered cannot be written.  The writer
//! fails hard with `MissingEncoder`; there is no skip and no fallback.
//!
//! # Encoder contract
//! An encoder receives the current table index and must return a strictly
//! smaller one.  It writes only its own payload; the per-result footer and
//! the table-closing marker belong to the writer.

pub mod recorded;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use chrono::NaiveDate;

use crate::error::EncodeError;
use crate::frame::{Endian, FrameWriter};

pub use recorded::{RecordedResult, RecordedWrite, RecordedValue};

// ── Result metadata ──────────────────────────────────────────────────────────

/// One computed result for one subcase, as seen by the writer.
pub trait TableResult {
    /// Diagnostic name of the result kind, e.g. `"RealDisplacementArray"`.
    fn kind(&self) -> &str;
    /// OP2 table code, e.g. `"OUGV1"`.
    fn table_name(&self) -> &str;
    fn subcase_id(&self) -> i32;
    fn element_name(&self) -> Option<&str> { None }
    fn as_any(&self) -> &dyn Any;
}

// ── Encoder ──────────────────────────────────────────────────────────────────

/// Per-call inputs handed to an encoder.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext {
    /// Table index before this result; `-1` for the first result of a table.
    pub itable:        i32,
    /// `true` only for the first result of a table, which carries the table
    /// header.
    pub is_new_result: bool,
    pub date:          NaiveDate,
    pub is_mag_phase:  bool,
    pub endian:        Endian,
}

pub trait Encode: TableResult {
    /// Write this result's payload and return the new (smaller) table index.
    fn encode(&self, out: &mut FrameWriter<'_>, ctx: &EncodeContext) -> Result<i32, EncodeError>;
}

type EncodeFn = fn(&dyn TableResult, &mut FrameWriter<'_>, &EncodeContext) -> Result<i32, EncodeError>;

fn encode_erased<T: Encode + 'static>(
    result: &dyn TableResult,
    out:    &mut FrameWriter<'_>,
    ctx:    &EncodeContext,
) -> Result<i32, EncodeError> {
    match result.as_any().downcast_ref::<T>() {
        Some(r) => r.encode(out, ctx),
        None    => Err(EncodeError::Invalid(format!(
            "{} does not match its registered encoder", result.kind()
        ))),
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Typed map from result kind to its encode capability.
#[derive(Default)]
pub struct EncoderRegistry {
    encoders: HashMap<TypeId, EncodeFn>,
}

impl EncoderRegistry {
    /// An empty registry.  Nothing can be written until kinds are registered.
    pub fn new() -> Self { Self::default() }

    /// A registry with the built-in kinds ([`RecordedResult`]).
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register::<RecordedResult>();
        reg
    }

    pub fn register<T: Encode + 'static>(&mut self) -> &mut Self {
        self.encoders.insert(TypeId::of::<T>(), encode_erased::<T>);
        self
    }

    pub fn contains(&self, result: &dyn TableResult) -> bool {
        self.encoders.contains_key(&result.as_any().type_id())
    }

    /// Encode `result`, or `None` if its kind has no registered encoder.
    pub fn encode(
        &self,
        result: &dyn TableResult,
        out:    &mut FrameWriter<'_>,
        ctx:    &EncodeContext,
    ) -> Option<Result<i32, EncodeError>> {
        let f = self.encoders.get(&result.as_any().type_id())?;
        Some(f(result, out, ctx))
    }

    pub fn len(&self) -> usize { self.encoders.len() }

    pub fn is_empty(&self) -> bool { self.encoders.is_empty() }
}
