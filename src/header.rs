use std::io;
use crate::error::WriteError;
use crate::frame::{Field, FrameWriter};

pub const TAPE_CODE: &[u8; 28] = b"NASTRAN FORT TAPE ID CODE - ";
pub const NX_VERSION: &[u8; 8] = b"NX8.5   ";
pub const GENERIC_VERSION: &[u8; 8] = b"XXXXXXXX";

/// `PARAM,POST` value selecting the file preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostMode {
    /// POST,-1: full tape identity and version block.
    #[default]
    Minus1,
    /// POST,-2: bare marker pair.
    Minus2,
}

impl TryFrom<i32> for PostMode {
    type Error = WriteError;
    fn try_from(post_mode: i32) -> Result<Self, WriteError> {
        match post_mode {
            -1 => Ok(PostMode::Minus1),
            -2 => Ok(PostMode::Minus2),
            _  => Err(WriteError::Configuration { post_mode }),
        }
    }
}

impl From<PostMode> for i32 {
    fn from(mode: PostMode) -> i32 {
        match mode {
            PostMode::Minus1 => -1,
            PostMode::Minus2 => -2,
        }
    }
}

/// Write the file preamble.  The endian is taken from `out`.
pub fn write_header(out: &mut FrameWriter<'_>, post_mode: PostMode, is_nx: bool) -> io::Result<()> {
    match post_mode {
        PostMode::Minus1 => {
            out.write_markers(&[3])?;
            out.write_markers(&[1, 7])?;
            out.write_block(&[Field::Int(28), Field::Bytes(TAPE_CODE), Field::Int(28)])?;
            let version = if is_nx { NX_VERSION } else { GENERIC_VERSION };
            out.write_markers(&[2])?;
            out.write_block(&[Field::Int(8), Field::Bytes(version), Field::Int(8)])?;
            out.write_markers(&[-1, 0])?;
        }
        PostMode::Minus2 => {
            out.write_markers(&[2, 4])?;
        }
    }
    Ok(())
}
