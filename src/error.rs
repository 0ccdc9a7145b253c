//! Errors related to the `vcov` crate.
//!
//! Please see documentation of the [`error-chain` crate](https://docs.rs/error-chain/) for detailed usage.

use std::io;
use std::path::PathBuf;
use std::result::Result as StdResult;

error_chain! {
    foreign_links {
        Io(io::Error) /** Wrapper of standard I/O error. */;
        Json(::serde_json::Error) /** Wrapper of JSON error. */;
    }

    errors {
        /// A value-change record refers to an alias that was never declared.
        ///
        /// A bad alias indicates a trace/parser mismatch rather than a
        /// recoverable gap, so this aborts the parse.
        UndeclaredAlias(alias: String) {
            description("value change for undeclared alias")
            display("value change for undeclared alias {:?}", alias)
        }

        /// A cross-coverage entry whose `sets` list does not contain exactly
        /// two set specifications.
        CrossSetCount(name: String, actual: usize) {
            description("cross-coverage entry needs exactly two sets")
            display("cross-coverage entry {:?} needs exactly two sets, found {}", name, actual)
        }

        /// A set specification is not of the `<group>.<point>` form.
        InvalidSetSpec(spec: String) {
            description("malformed set specification")
            display("malformed set specification {:?}, expected \"<group>.<point>\"", spec)
        }

        /// A coverpoint is too wide for default bin enumeration.
        WidthTooLarge(width: u32) {
            description("coverpoint width too large for default bins")
            display("coverpoint width {} is too large for default bins", width)
        }
    }
}

//----------------------------------------------------------------------------------------------------------------------

/// Context of an error: which file or line was being processed when it
/// happened.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Location {
    /// No context.
    None,
    /// A file.
    File(PathBuf),
    /// A 1-based line of the file currently being parsed.
    Line(u64),
}

impl Location {
    /// Runs `f`, attaching this location to the error on failure.
    pub fn wrap<T, E: Into<Error>, F: FnOnce() -> StdResult<T, E>>(self, f: F) -> Result<T> {
        f().map_err(|e| self.wrap_error(e))
    }

    /// Attaches this location to an existing error.
    pub fn wrap_error<E: Into<Error>>(self, e: E) -> Error {
        let e = e.into();
        match self {
            Location::None => e,
            Location::File(path) => Error::with_chain(e, ErrorKind::Msg(format!("while reading {}", path.display()))),
            Location::Line(line) => Error::with_chain(e, ErrorKind::Msg(format!("on line {}", line))),
        }
    }
}

#[test]
fn test_location_wrap() {
    let res: Result<()> = Location::Line(7).wrap(|| -> Result<()> {
        bail!(ErrorKind::UndeclaredAlias("!".to_owned()));
    });
    let err = res.unwrap_err();
    assert_eq!(err.to_string(), "on line 7");
    let cause = err.iter().nth(1).expect("cause");
    assert!(cause.to_string().contains("undeclared alias"));
}
