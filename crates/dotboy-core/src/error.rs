use std::io;

use thiserror::Error;

/// Failures that prevent a cartridge from being loaded. The core never starts
/// on one of these; everything after load is non-fatal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ROM image is {len} bytes, too small to contain a cartridge header")]
    RomTooSmall { len: usize },
    #[error("ROM image is {len} bytes, the cartridge controller addresses at most {max}")]
    RomTooLarge { len: usize, max: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
