//! Script sources: reading a script file or taking inline text, and converting it to UTF-8.

use std::env;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use cfg_if::cfg_if;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

use crate::errors::{Error, Result};

/// Largest script file accepted, in bytes.
pub const MAX_SCRIPT_SIZE: u64 = 16 * 1024 * 1024;

/// Environment variable naming the encoding script text is written in.
pub const ENCODING_VAR: &str = "VAPOURSOURCE_ENCODING";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Name the engine reports for scripts that were not read from a file.
const INLINE_SCRIPT_NAME: &str = "no file";

/// How the source string of a session is interpreted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Mode {
    /// The source is the path of a script file.
    Import,
    /// The source is the script itself.
    Eval,
}

impl Mode {
    /// Returns the name of the plugin function exposing this mode.
    #[inline]
    pub fn function_name(self) -> &'static str {
        match self {
            Mode::Import => "VSImport",
            Mode::Eval => "VSEval",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// A script ready for evaluation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Script {
    /// UTF-8 script text.
    pub text: String,
    /// Name the engine uses for the script in its messages.
    pub file_name: String,
}

/// Returns the encoding script text is assumed to be written in.
///
/// `VAPOURSOURCE_ENCODING` overrides the system encoding: the ANSI code page on Windows, the
/// charset of the `LC_ALL`/`LC_CTYPE`/`LANG` locale elsewhere. UTF-8 is used when neither names
/// a known encoding.
pub fn native_encoding() -> &'static Encoding {
    let configured = env::var(ENCODING_VAR).ok();
    select_encoding(configured.as_deref(), system_encoding)
}

/// Resolves the configured label, falling back to `system()` and then to UTF-8.
fn select_encoding(
    configured: Option<&str>,
    system: impl FnOnce() -> Option<&'static Encoding>,
) -> &'static Encoding {
    if let Some(label) = configured {
        match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => return encoding,
            None => warn!("unknown {} label {:?}, ignoring it", ENCODING_VAR, label),
        }
    }

    system().unwrap_or(UTF_8)
}

cfg_if! {
    if #[cfg(windows)] {
        #[link(name = "kernel32")]
        unsafe extern "system" {
            fn GetACP() -> u32;
        }

        /// Maps the ANSI code page of the process.
        fn system_encoding() -> Option<&'static Encoding> {
            let code_page = unsafe { GetACP() };
            let encoding = u16::try_from(code_page).ok().and_then(codepage::to_encoding);
            if encoding.is_none() {
                warn!("no encoding for code page {}", code_page);
            }
            encoding
        }
    } else {
        /// Maps the charset of the effective character-type locale.
        fn system_encoding() -> Option<&'static Encoding> {
            locale_encoding(|name| env::var(name).ok())
        }

        /// Resolves the charset of the first non-empty of `LC_ALL`, `LC_CTYPE` and `LANG`.
        fn locale_encoding(var: impl Fn(&str) -> Option<String>) -> Option<&'static Encoding> {
            let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
                .into_iter()
                .filter_map(|name| var(name))
                .find(|value| !value.is_empty())?;

            let charset = locale_charset(&locale)?;
            let encoding = Encoding::for_label(charset.as_bytes());
            if encoding.is_none() {
                debug!("unknown charset {:?} in locale {:?}", charset, locale);
            }
            encoding
        }

        /// Extracts the charset of a `language_TERRITORY.charset@modifier` locale name.
        fn locale_charset(locale: &str) -> Option<&str> {
            let (_, rest) = locale.split_once('.')?;
            let charset = rest.split('@').next().unwrap_or(rest);
            (!charset.is_empty()).then_some(charset)
        }
    }
}

impl Script {
    /// Produces the UTF-8 script for `source` interpreted according to `mode`.
    pub fn load(mode: Mode, source: &str, encoding: &'static Encoding) -> Result<Self> {
        match mode {
            Mode::Import => {
                let bytes = read_source_file(Path::new(source))?;
                Ok(Self {
                    text: to_utf8(&bytes, encoding)?,
                    file_name: source.to_owned(),
                })
            }
            Mode::Eval => Ok(Self {
                text: to_utf8(source.as_bytes(), encoding)?,
                file_name: INLINE_SCRIPT_NAME.to_owned(),
            }),
        }
    }
}

/// Reads a whole script file, refusing empty files and files over `MAX_SCRIPT_SIZE`.
fn read_source_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|_| Error::SourceMissing)?;
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);

    if len == 0 {
        return Err(Error::SourceMissing);
    }
    if len > MAX_SCRIPT_SIZE {
        return Err(Error::SourceTooLarge);
    }

    let mut buf = Vec::with_capacity(len as usize);
    file.by_ref()
        .take(MAX_SCRIPT_SIZE + 1)
        .read_to_end(&mut buf)
        .map_err(|source| Error::SourceUnreadable {
            path: path.to_owned(),
            source,
        })?;

    // The file may have changed after the size check.
    if buf.len() as u64 > MAX_SCRIPT_SIZE {
        return Err(Error::SourceTooLarge);
    }

    debug!("read {} bytes from {}", buf.len(), path.display());
    Ok(buf)
}

/// Decodes `bytes` from `encoding` into UTF-8.
///
/// The text ends at the first NUL byte, as it would for the engine's C string interface.
/// A leading byte order mark is dropped from UTF-8 text. Malformed input is an error rather
/// than being replaced.
pub fn to_utf8(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    let mut bytes = &bytes[..end];
    if encoding == UTF_8 {
        bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(Error::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, WINDOWS_1252};

    #[test]
    fn utf8_passthrough() {
        assert_eq!(to_utf8("clip = 1".as_bytes(), UTF_8).unwrap(), "clip = 1");
    }

    #[test]
    fn legacy_encodings() {
        assert_eq!(to_utf8(b"caf\xe9", WINDOWS_1252).unwrap(), "café");
        assert_eq!(
            to_utf8(b"\x82\xa0.vpy", SHIFT_JIS).unwrap(),
            "\u{3042}.vpy"
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(to_utf8(b"\xff\xfe\xfd", UTF_8), Err(Error::Encoding)));
    }

    #[test]
    fn stops_at_nul() {
        assert_eq!(to_utf8(b"abc\0def", UTF_8).unwrap(), "abc");
    }

    #[test]
    fn mode_names() {
        assert_eq!(Mode::Import.to_string(), "VSImport");
        assert_eq!(Mode::Eval.to_string(), "VSEval");
    }

    #[test]
    fn eval_uses_inline_name() {
        let script = Script::load(Mode::Eval, "x = 1", UTF_8).unwrap();
        assert_eq!(script.text, "x = 1");
        assert_eq!(script.file_name, "no file");
    }
    #[test]
    fn utf8_bom_is_dropped() {
        assert_eq!(to_utf8(b"\xEF\xBB\xBFclip = 1", UTF_8).unwrap(), "clip = 1");
        // Only a leading mark is a BOM.
        assert_eq!(to_utf8(b"a\xEF\xBB\xBF", UTF_8).unwrap(), "a\u{FEFF}");
    }

    #[test]
    fn configured_encoding_wins() {
        let encoding = select_encoding(Some(" shift_jis "), || Some(WINDOWS_1252));
        assert_eq!(encoding, SHIFT_JIS);
    }

    #[test]
    fn system_encoding_is_the_default() {
        assert_eq!(select_encoding(None, || Some(SHIFT_JIS)), SHIFT_JIS);
        assert_eq!(select_encoding(None, || None), UTF_8);
    }

    #[test]
    fn unknown_configured_label_falls_back() {
        assert_eq!(select_encoding(Some("klingon"), || Some(SHIFT_JIS)), SHIFT_JIS);
        assert_eq!(select_encoding(Some("klingon"), || None), UTF_8);
    }

    #[test]
    fn shift_jis_script_decodes_with_selected_encoding() {
        let encoding = select_encoding(None, || Some(SHIFT_JIS));
        assert_eq!(to_utf8(b"# \x82\xa0\n", encoding).unwrap(), "# \u{3042}\n");
    }

    #[cfg(not(windows))]
    #[test]
    fn locale_charsets() {
        assert_eq!(locale_charset("ja_JP.SJIS"), Some("SJIS"));
        assert_eq!(locale_charset("de_DE.ISO-8859-15@euro"), Some("ISO-8859-15"));
        assert_eq!(locale_charset("en_US.UTF-8"), Some("UTF-8"));
        assert_eq!(locale_charset("C"), None);
        assert_eq!(locale_charset("POSIX."), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn locale_precedence() {
        let vars = |lc_all: &'static str, lc_ctype: &'static str, lang: &'static str| {
            move |name: &str| {
                let value = match name {
                    "LC_ALL" => lc_all,
                    "LC_CTYPE" => lc_ctype,
                    "LANG" => lang,
                    _ => "",
                };
                Some(value.to_owned())
            }
        };

        assert_eq!(
            locale_encoding(vars("ja_JP.SJIS", "en_US.UTF-8", "")),
            Some(SHIFT_JIS)
        );
        assert_eq!(
            locale_encoding(vars("", "ja_JP.SJIS", "en_US.UTF-8")),
            Some(SHIFT_JIS)
        );
        assert_eq!(locale_encoding(vars("", "", "fr_FR.cp1252")), Some(WINDOWS_1252));
        assert_eq!(locale_encoding(vars("C", "ja_JP.SJIS", "")), None);
        assert_eq!(locale_encoding(vars("", "", "en_US.klingon")), None);
        assert_eq!(locale_encoding(|_: &str| None), None);
    }
}
