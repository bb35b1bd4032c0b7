//! Table sequencer and the top-level write operation.
//!
//! # Layout
//! ```text
//! header                     (see header.rs)
//! preamble sections          (geometry/property writers, optional)
//! for each table, in TABLE_ORDER:
//!     for each result:
//!         <encoder payload>
//!         footer2  [4, itable, 4, 4, 1, 4, 4, 0, 4]
//!     close_a  [4, 0, 4]
//! close_b  [4, 0, 4]
//! ```
//!
//! `itable` starts at -1 for every table and must strictly decrease across
//! the encoder calls of that table.
//!
//! # Failure
//! Every error aborts the write.  Post mode, table codes and encoder coverage
//! are validated before any byte reaches either output.  Output files are closed on every
//! exit path; after a failure the binary file is incomplete and must not be
//! used.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{EncodeError, Result, WriteError};
use crate::frame::{Endian, FrameWriter};
use crate::header::{write_header, PostMode};
use crate::model::ResultModel;
use crate::result::{EncodeContext, EncoderRegistry};
use crate::table::{group_by_table, TableGroup};

/// Table index before the first result of a table.
pub const ITABLE_START: i32 = -1;

/// Per-result footer written after each encoder call.
pub fn result_footer(itable: i32) -> [i32; 9] {
    [4, itable, 4, 4, 1, 4, 4, 0, 4]
}

/// Closes a table, and (once more) the whole file.
pub const CLOSE_MARKER: [i32; 3] = [4, 0, 4];

// ── WriteOptions ─────────────────────────────────────────────────────────────

/// Configuration for [`Op2Writer::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Complex results as magnitude/phase instead of real/imaginary.
    /// Forwarded to encoders; the writer itself ignores it.
    pub is_mag_phase:   bool,
    /// Hint that the caller will release the model after writing.
    pub delete_objects: bool,
    pub post_mode:      PostMode,
    pub endian:         Endian,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            is_mag_phase:   false,
            delete_objects: true,
            post_mode:      PostMode::Minus1,
            endian:         Endian::Little,
        }
    }
}

// ── WriteSummary ─────────────────────────────────────────────────────────────

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// `(table_name, case_count)` in output order.
    pub tables:           Vec<(String, usize)>,
    pub total_case_count: usize,
    pub bytes_written:    u64,
}

// ── PreambleSection ──────────────────────────────────────────────────────────

/// A block written between the header and the first result table, such as
/// GEOM1 or EPT.  Implemented outside this crate.
pub trait PreambleSection {
    fn name(&self) -> &str;
    fn write(&self, out: &mut FrameWriter<'_>, model: &ResultModel) -> std::result::Result<(), EncodeError>;
}

// ── WriteSession ─────────────────────────────────────────────────────────────

/// Open output handles of one on-disk write.  Dropping the session closes
/// both files.
pub struct WriteSession {
    binary_path: PathBuf,
    binary:      BufWriter<File>,
    trace:       BufWriter<File>,
}

impl WriteSession {
    /// Create `path` and its trace file `<path>.txt`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let binary_path = path.as_ref().to_owned();
        let trace_path  = trace_path(&binary_path);
        let binary = BufWriter::new(File::create(&binary_path)?);
        let trace  = BufWriter::new(File::create(&trace_path)?);
        Ok(Self { binary_path, binary, trace })
    }

    pub fn path(&self) -> &Path { &self.binary_path }

    pub fn frame_writer(&mut self, endian: Endian) -> FrameWriter<'_> {
        FrameWriter::new(&mut self.binary, &mut self.trace, endian)
    }
}

/// `<destination>.txt`, appended to the full file name (`out.op2.txt`).
pub fn trace_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

// ── Op2Writer ────────────────────────────────────────────────────────────────

pub struct Op2Writer {
    registry: EncoderRegistry,
    preamble: Vec<Box<dyn PreambleSection>>,
}

impl Default for Op2Writer {
    fn default() -> Self { Self::new(EncoderRegistry::with_builtin()) }
}

impl Op2Writer {
    pub fn new(registry: EncoderRegistry) -> Self {
        Self { registry, preamble: Vec::new() }
    }

    /// Append a preamble section; sections are written in insertion order.
    pub fn add_preamble(&mut self, section: Box<dyn PreambleSection>) {
        self.preamble.push(section);
    }

    /// Write `model` to `destination` and `<destination>.txt`.
    ///
    /// Nothing is created on disk when a table code is unknown or a result
    /// kind has no registered encoder.
    pub fn write<P: AsRef<Path>>(
        &self,
        destination: P,
        model:       &ResultModel,
        opts:        &WriteOptions,
    ) -> Result<WriteSummary> {
        let groups = group_by_table(model)?;
        self.check_encoders(&groups)?;
        let mut session = WriteSession::create(destination)?;
        debug!("writing {} ({} endian)", session.path().display(), opts.endian.name());
        let mut out = session.frame_writer(opts.endian);
        // Flush what was written even when the sequencer failed.
        let written = self.write_groups(&mut out, model, groups, opts);
        let flushed = out.flush();
        let summary = written?;
        flushed?;
        if opts.delete_objects {
            debug!("delete_objects set; {} result(s) may be released by the caller", model.result_count());
        }
        Ok(summary)
    }

    /// Write `model` to caller-supplied binary and trace sinks.
    pub fn write_to(
        &self,
        binary: &mut dyn Write,
        trace:  &mut dyn Write,
        model:  &ResultModel,
        opts:   &WriteOptions,
    ) -> Result<WriteSummary> {
        let groups = group_by_table(model)?;
        self.check_encoders(&groups)?;
        let mut out = FrameWriter::new(binary, trace, opts.endian);
        let summary = self.write_groups(&mut out, model, groups, opts)?;
        out.flush()?;
        Ok(summary)
    }

    /// Fail with [`WriteError::MissingEncoder`] on the first result, in
    /// output order, whose kind is not registered.
    fn check_encoders(&self, groups: &[TableGroup<'_>]) -> Result<()> {
        for group in groups {
            if let Some(result) = group.results.iter().find(|r| !self.registry.contains(**r)) {
                return Err(WriteError::MissingEncoder {
                    kind:    result.kind().to_string(),
                    table:   group.table_name.to_string(),
                    subcase: result.subcase_id(),
                });
            }
        }
        Ok(())
    }

    fn write_groups(
        &self,
        out:    &mut FrameWriter<'_>,
        model:  &ResultModel,
        groups: Vec<TableGroup<'_>>,
        opts:   &WriteOptions,
    ) -> Result<WriteSummary> {
        write_header(out, opts.post_mode, model.is_nx)?;

        for section in &self.preamble {
            debug!("preamble {}", section.name());
            section.write(out, model).map_err(|source| WriteError::Encoding {
                kind:    section.name().to_string(),
                table:   "preamble".to_string(),
                subcase: 0,
                element: None,
                source,
            })?;
        }

        let mut tables = Vec::with_capacity(groups.len());
        let mut total_case_count = 0usize;
        for group in &groups {
            let case_count = self.write_group(out, model, group, opts)?;
            total_case_count += case_count;
            tables.push((group.table_name.to_string(), case_count));
        }

        if total_case_count == 0 {
            warn!("no results were written");
            return Err(WriteError::EmptyOutput);
        }
        out.write_ints("close_b", &CLOSE_MARKER)?;

        Ok(WriteSummary {
            tables,
            total_case_count,
            bytes_written: out.bytes_written(),
        })
    }

    /// Write one table and return its case count.
    fn write_group(
        &self,
        out:   &mut FrameWriter<'_>,
        model: &ResultModel,
        group: &TableGroup<'_>,
        opts:  &WriteOptions,
    ) -> Result<usize> {
        let mut itable = ITABLE_START;
        let mut is_new_result = true;
        let mut case_count = 0usize;

        for &result in &group.results {
            let ctx = EncodeContext {
                itable,
                is_new_result,
                date:         model.date,
                is_mag_phase: opts.is_mag_phase,
                endian:       opts.endian,
            };
            let encoded = self.registry.encode(result, out, &ctx).ok_or_else(|| {
                WriteError::MissingEncoder {
                    kind:    result.kind().to_string(),
                    table:   group.table_name.to_string(),
                    subcase: result.subcase_id(),
                }
            })?;
            let next = encoded.map_err(|source| {
                warn!(
                    " {} - isubcase={}{}",
                    result.kind(),
                    result.subcase_id(),
                    result.element_name().map(|e| format!(" - {e}")).unwrap_or_default()
                );
                WriteError::Encoding {
                    kind:    result.kind().to_string(),
                    table:   group.table_name.to_string(),
                    subcase: result.subcase_id(),
                    element: result.element_name().map(str::to_string),
                    source,
                }
            })?;
            if next >= itable {
                return Err(WriteError::NonMonotonicTableIndex {
                    kind:    result.kind().to_string(),
                    table:   group.table_name.to_string(),
                    subcase: result.subcase_id(),
                    before:  itable,
                    after:   next,
                });
            }
            itable = next;

            out.write_ints("footer2", &result_footer(itable))?;
            case_count += 1;
            is_new_result = false;
        }

        if case_count == 0 {
            return Err(WriteError::EmptyGroup { table: group.table_name.to_string() });
        }
        out.write_ints("close_a", &CLOSE_MARKER)?;
        debug!("{:<8} cases={} itable={}", group.table_name, case_count, itable);
        Ok(case_count)
    }
}

/// Write `model` with the built-in encoders.
pub fn write<P: AsRef<Path>>(
    destination: P,
    model:       &ResultModel,
    opts:        &WriteOptions,
) -> Result<WriteSummary> {
    Op2Writer::default().write(destination, model, opts)
}
