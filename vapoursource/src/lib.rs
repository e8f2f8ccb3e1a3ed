//! Imports the output of [VapourSynth](https://github.com/vapoursynth/vapoursynth) scripts into a
//! clip host that only understands 8-bit pixel layouts.
//!
//! ## Functionality
//!
//! A `Session` evaluates one script, binds one of its outputs and serves its frames to the host.
//! Formats deeper than 8 bits are delivered either with samples side by side in rows of double
//! width, or split into a most-significant-byte image stacked over a least-significant-byte
//! image (`stacked`).
//!
//! Both engines are reached through traits: `api::ScriptRuntime` and friends for the VapourSynth
//! side, `host::Host` for the clip host. `host::MemoryHost` is a heap-backed host, and with the
//! `vsscript` feature `vsscript::VSScript` binds the upstream traits to the VSScript library.
//!
//! ## Short example
//!
//! ```no_run
//! # use anyhow::Error;
//! # #[cfg(feature = "vsscript")]
//! # fn foo() -> Result<(), Error> {
//! use vapoursource::prelude::*;
//! use vapoursource::vsscript::VSScript;
//!
//! let args = Arguments {
//!     source: Some("test.vpy".to_owned()),
//!     stacked: Some(true),
//!     index: None,
//! };
//! let clip = plugin::create(VSScript, args, Mode::Import)?;
//! let frame = clip.get_frame(0, &MemoryHost);
//!
//! println!("Planes: {}", frame.plane_count());
//! # Ok(())
//! # }
//! # fn main() {
//! # }
//! ```
//!
//! ## Configuration
//!
//! Script text is converted to UTF-8 from the encoding named by the `VAPOURSOURCE_ENCODING`
//! environment variable (any WHATWG label, e.g. `windows-1252` or `shift_jis`). If it is unset,
//! the system encoding is used: the ANSI code page on Windows, the locale charset elsewhere.

pub mod api;
pub mod convert;
pub mod errors;
pub mod format;
pub mod host;
pub mod plugin;
pub mod script;
pub mod session;
pub mod video_info;

#[cfg(feature = "vsscript")]
pub mod vsscript;

pub use self::errors::{Error, Result};

pub mod prelude {
    //! The vapoursource prelude.
    //!
    //! Contains the types you most likely want to import anyway.
    pub use super::api::{OutputNode, ScriptEnvironment, ScriptRuntime, SourceFrame};
    pub use super::convert::Strategy;
    pub use super::format::{PixelType, PresetFormat};
    pub use super::host::{Clip, Host, HostFrame, MemoryFrame, MemoryHost, VideoInfo};
    pub use super::plugin::{self, Arguments, FunctionRegistry};
    pub use super::script::Mode;
    pub use super::session::{Session, SessionOptions};
    pub use super::video_info::ClipDescriptor;
}
