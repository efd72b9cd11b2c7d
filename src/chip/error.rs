use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the boundary of the chip, i.e., when loading programs
/// or snapshots. Nothing that happens while executing instructions is an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("program is {size} bytes, but at most {max} bytes fit into memory")]
    RomTooLarge { size: usize, max: usize },

    #[error("could not read program from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("could not encode snapshot")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("could not decode snapshot")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("snapshot field `{field}` holds {actual} entries, expected {expected}")]
    Length {
        field: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("snapshot stack pointer {0} exceeds the stack depth")]
    StackPointer(u8),

    #[error("snapshot framebuffer holds invalid pixel value {0}")]
    Pixel(u8),
}
