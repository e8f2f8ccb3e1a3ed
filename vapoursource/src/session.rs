//! One upstream script session serving one host clip.

use std::fmt;

use encoding_rs::Encoding;
use tracing::{debug, info, trace, warn};

use crate::api::{NodeOf, OutputNode, ScriptEnvironment, ScriptRuntime};
use crate::convert::Strategy;
use crate::errors::{Error, Result};
use crate::host::{Clip, Host, VideoInfo};
use crate::script::{self, Mode, Script};
use crate::video_info::ClipDescriptor;

/// Construction inputs of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mode: Mode,
    /// Script path or script text, depending on `mode`.
    pub source: String,
    /// Stack high bytes over low bytes instead of widening rows.
    pub stacked: bool,
    /// Output index of the node to serve.
    pub index: i32,
    /// Encoding the script is written in.
    pub encoding: &'static Encoding,
}

impl SessionOptions {
    /// Creates options with the default layout, output 0 and the configured native encoding.
    pub fn new(mode: Mode, source: impl Into<String>) -> Self {
        Self {
            mode,
            source: source.into(),
            stacked: false,
            index: 0,
            encoding: script::native_encoding(),
        }
    }

    #[inline]
    pub fn stacked(mut self, stacked: bool) -> Self {
        self.stacked = stacked;
        self
    }

    #[inline]
    pub fn index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    #[inline]
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// An initialization of the upstream engine, finalized on drop.
struct Initialized<R: ScriptRuntime> {
    runtime: R,
}

impl<R: ScriptRuntime> Initialized<R> {
    #[inline]
    fn new(runtime: R) -> Result<Self> {
        if runtime.init() {
            Ok(Self { runtime })
        } else {
            Err(Error::InitFailed)
        }
    }
}

impl<R: ScriptRuntime> Drop for Initialized<R> {
    #[inline]
    fn drop(&mut self) {
        self.runtime.finalize();
    }
}

/// A session with the upstream engine, exposed to the host as a clip.
///
/// Resources are acquired in the order initialization, script, environment, node, and released
/// in the reverse order, which is also the order the fields below are dropped in.
pub struct Session<R: ScriptRuntime> {
    node: NodeOf<R>,
    environment: R::Environment,
    script: Script,
    _init: Initialized<R>,
    descriptor: ClipDescriptor,
    strategy: Strategy,
}

impl<R: ScriptRuntime> fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("file_name", &self.script.file_name)
            .field("descriptor", &self.descriptor)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl<R: ScriptRuntime> Session<R> {
    /// Evaluates the script and binds its output node.
    ///
    /// On failure everything acquired so far is released before returning.
    pub fn new(runtime: R, options: &SessionOptions) -> Result<Self> {
        let init = Initialized::new(runtime)?;
        debug!("{}: engine initialized", options.mode);

        let api = init.runtime.api().ok_or(Error::NoAPI)?;

        let script = Script::load(options.mode, &options.source, options.encoding)?;
        debug!(
            "{}: evaluating {} ({} bytes)",
            options.mode,
            script.file_name,
            script.text.len()
        );

        let environment = init
            .runtime
            .evaluate(&api, &script.text, &script.file_name)
            .map_err(Error::Evaluation)?;

        let node = environment
            .output(options.index)
            .ok_or(Error::NoOutput(options.index))?;

        let descriptor = ClipDescriptor::new(&node.info(), options.stacked)?;
        let strategy = if descriptor.is_stacked_layout {
            Strategy::Stacked
        } else {
            Strategy::Interleaved
        };

        info!(
            "{}: serving output {} as {} {}x{}, {} frames at {}/{}, {} planes, strategy {:?}",
            options.mode,
            options.index,
            descriptor.pixel_type,
            descriptor.width,
            descriptor.height,
            descriptor.frame_count,
            descriptor.fps_numerator,
            descriptor.fps_denominator,
            descriptor.plane_count,
            strategy,
        );

        Ok(Self {
            node,
            environment,
            script,
            _init: init,
            descriptor,
            strategy,
        })
    }

    /// Returns the validated clip description.
    #[inline]
    pub fn descriptor(&self) -> &ClipDescriptor {
        &self.descriptor
    }

    /// Returns the conversion applied to every frame.
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the evaluation context the output node came from.
    #[inline]
    pub fn environment(&self) -> &R::Environment {
        &self.environment
    }

    /// Produces frame `n` in a frame allocated by `host`.
    ///
    /// If the upstream engine fails to produce the frame, the freshly allocated frame is
    /// returned as is so the host keeps an unbroken frame sequence.
    pub fn get_frame<H: Host>(&self, n: usize, host: &H) -> H::Frame {
        let mut dst = host.new_video_frame(&self.descriptor.video_info());

        let Some(src) = self.node.get_frame(n) else {
            warn!("no upstream frame {}, returning a blank frame", n);
            return dst;
        };

        self.strategy
            .write_frame(host, &src, &mut dst, self.descriptor.plane_count);
        trace!("converted frame {}", n);

        dst
    }
}

impl<R: ScriptRuntime, H: Host> Clip<H> for Session<R> {
    #[inline]
    fn video_info(&self) -> VideoInfo {
        self.descriptor.video_info()
    }

    #[inline]
    fn get_frame(&self, n: usize, host: &H) -> H::Frame {
        Session::get_frame(self, n, host)
    }
}
