//! Contracts of the upstream script engine.
//!
//! A session only talks to the upstream engine through these traits. Releasing a resource is
//! dropping it: an environment frees its script when dropped, a node frees its reference, a
//! frame gives its reference back.

use crate::video_info::NodeInfo;

/// A read-only view of one plane of an upstream frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    /// Plane samples, addressed as `data[row * stride + column]`.
    pub data: &'a [u8],
    /// Distance in bytes between two consecutive rows.
    pub stride: usize,
}

impl<'a> PlaneRef<'a> {
    #[inline]
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Returns `len` bytes of row `row`.
    ///
    /// # Panics
    /// Panics if the row lies outside of the plane.
    #[inline]
    pub fn row(&self, row: usize, len: usize) -> &'a [u8] {
        let start = row * self.stride;
        &self.data[start..start + len]
    }
}

/// The upstream engine's process-wide entry point.
pub trait ScriptRuntime {
    /// Function table handle, retrieved once per session.
    type Api: Clone;

    /// Evaluation context produced from a script.
    type Environment: ScriptEnvironment;

    /// Initializes the engine. Returns `false` if it could not be initialized.
    ///
    /// Every successful call is balanced by exactly one `finalize()`.
    fn init(&self) -> bool;

    /// Releases one initialization.
    fn finalize(&self);

    /// Retrieves the function table.
    fn api(&self) -> Option<Self::Api>;

    /// Evaluates a UTF-8 script. `file_name` is the name the engine reports in its messages.
    ///
    /// On failure the engine's own error message is returned.
    fn evaluate(
        &self,
        api: &Self::Api,
        script: &str,
        file_name: &str,
    ) -> Result<Self::Environment, String>;
}

/// An evaluated script.
pub trait ScriptEnvironment {
    type Node: OutputNode;

    /// Retrieves the node marked for output with `index`, if there is one.
    fn output(&self, index: i32) -> Option<Self::Node>;
}

/// A clip produced by a script.
pub trait OutputNode {
    type Frame: SourceFrame;

    /// Returns the clip properties.
    fn info(&self) -> NodeInfo;

    /// Generates frame `n`. `None` means the engine failed to produce it.
    fn get_frame(&self, n: usize) -> Option<Self::Frame>;
}

/// A borrowed upstream frame.
pub trait SourceFrame {
    /// Returns plane `plane` of the frame.
    ///
    /// # Panics
    /// May panic if `plane` is not a plane of the frame's format.
    fn plane(&self, plane: usize) -> PlaneRef<'_>;
}

/// Node type of a runtime.
pub type NodeOf<R> = <<R as ScriptRuntime>::Environment as ScriptEnvironment>::Node;
