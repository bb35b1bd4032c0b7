pub mod error;
pub mod frame;
pub mod header;
pub mod model;
pub mod result;
pub mod table;
pub mod writer;

pub use error::{EncodeError, WriteError};
pub use frame::{Endian, Field, FrameWriter};
pub use header::PostMode;
pub use model::{ModelManifest, ResultModel};
pub use result::{Encode, EncodeContext, EncoderRegistry, RecordedResult, TableResult};
pub use table::TABLE_ORDER;
pub use writer::{write, Op2Writer, PreambleSection, WriteOptions, WriteSummary};
