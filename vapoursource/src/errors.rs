use std::io;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

/// The error type for session construction.
///
/// Messages are what the host shows after the plugin function name, so they read as complete
/// sentences.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to initialize VapourSynth.")]
    InitFailed,
    #[error("failed to get vsapi pointer.")]
    NoAPI,

    #[error("source file does not exist, or it is empty.")]
    SourceMissing,
    #[error("filesize of source is over 16MiB.")]
    SourceTooLarge,
    #[error("failed to open source file.")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to convert to UTF-8.")]
    Encoding,

    #[error("failed to evaluate script.\n{0}")]
    Evaluation(String),
    #[error("failed to get VapourSynth clip(index:{0}).")]
    NoOutput(i32),

    #[error("input clip has infinite length.")]
    InfiniteLength,
    #[error("input clip is not constant format.")]
    VariableFormat,
    #[error("input clip is not constant framerate.")]
    VariableFramerate,
    #[error("clip has over {} fpsnum.", u32::MAX)]
    FpsNumOverflow,
    #[error("clip has over {} fpsden.", u32::MAX)]
    FpsDenOverflow,
    #[error("input clip is unsupported format.")]
    UnsupportedFormat,
}

pub type Result<T> = result::Result<T, Error>;
