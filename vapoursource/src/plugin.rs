//! The plugin surface: the functions registered with the host and their arguments.

use anyhow::{Context, Error, anyhow};

use crate::api::ScriptRuntime;
use crate::script::Mode;
use crate::session::{Session, SessionOptions};

/// Argument signature shared by both plugin functions.
pub const SIGNATURE: &str = "[source]s[stacked]b[index]i";

/// Description returned to the host when the plugin is loaded.
pub const DESCRIPTION: &str = concat!(
    "VapourSynth script importer ver.",
    env!("CARGO_PKG_VERSION")
);

/// The host's function registration mechanism.
pub trait FunctionRegistry {
    /// Registers a function called `name` taking `signature`. Calls to it must end up in
    /// `create()` with `mode`.
    fn add_function(&mut self, name: &'static str, signature: &'static str, mode: Mode);
}

/// Registers `VSImport` and `VSEval`, returning the plugin description.
pub fn plugin_init<F: FunctionRegistry>(registry: &mut F) -> &'static str {
    for mode in [Mode::Import, Mode::Eval] {
        registry.add_function(mode.function_name(), SIGNATURE, mode);
    }
    DESCRIPTION
}

/// Arguments of a plugin function call, as passed by the host. Unset ones are `None`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Arguments {
    pub source: Option<String>,
    pub stacked: Option<bool>,
    pub index: Option<i32>,
}

impl Arguments {
    /// Fills in the defaults: not stacked, output 0. The source is required.
    pub fn into_options(self, mode: Mode) -> Result<SessionOptions, Error> {
        let source = self.source.ok_or_else(|| anyhow!("No source specified"))?;
        Ok(SessionOptions::new(mode, source)
            .stacked(self.stacked.unwrap_or(false))
            .index(self.index.unwrap_or(0)))
    }
}

/// Creates the clip for a call to the function registered for `mode`.
///
/// Errors carry the function name as context; hosts report them formatted with `{:#}`, e.g.
/// `VSImport: input clip has infinite length.`
pub fn create<R: ScriptRuntime>(
    runtime: R,
    args: Arguments,
    mode: Mode,
) -> Result<Session<R>, Error> {
    let options = args.into_options(mode).context(mode)?;
    Session::new(runtime, &options).context(mode)
}
