//! Reader of the VCD trace format.
//!
//! Only the declaration and value-change subset needed for coverage
//! evaluation is consumed: scope markers, variable declarations, the
//! `$dumpvars` marker, time markers and scalar/vector value changes. The
//! reader is line-oriented and permissive; unrecognized lines are skipped.
//!
//! # Examples
//!
//! ```rust
//! use vcov::reader::Reader;
//! use vcov::Interner;
//! # use vcov::Result;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() { run().unwrap(); }
//! # fn run() -> Result<()> {
//! let mut interner = Interner::new();
//! let file = File::open("test-data/counter/trace.vcd")?;
//! let vcd = Reader::new(BufReader::new(file), &mut interner).parse()?;
//! # Ok(()) }
//! ```

use error::*;
use intern::{Interner, Symbol};
use values::Values;
use vcd::{ScopeIndex, ScopeTree, Vcd};

use std::collections::HashMap;
use std::io::BufRead;

/// The reader of a VCD trace.
pub struct Reader<'si, R> {
    reader: R,
    line: u64,
    interner: &'si mut Interner,
}

impl<'si, R: BufRead> Reader<'si, R> {
    /// Creates a reader over a buffered source.
    pub fn new(reader: R, interner: &'si mut Interner) -> Reader<'si, R> {
        Reader {
            reader,
            line: 0,
            interner,
        }
    }

    /// Parses the whole source, producing a [`Vcd`].
    ///
    /// # Errors
    ///
    /// * Returns [`Io`] on I/O failure.
    /// * Returns [`UndeclaredAlias`] if a value change refers to an alias
    ///   that was never declared.
    ///
    /// [`Vcd`]: ../vcd/struct.Vcd.html
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    /// [`UndeclaredAlias`]: ../error/enum.ErrorKind.html#variant.UndeclaredAlias
    pub fn parse(mut self) -> Result<Vcd> {
        let mut scopes = ScopeTree::default();
        let mut names = HashMap::new();
        let mut values = Values::default();
        let mut current: Option<ScopeIndex> = None;
        let mut current_time = 0;
        let mut in_dump = false;

        // the initial dump inside `$dumpvars` happens at time zero.
        values.add_time(current_time);

        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                break;
            }
            self.line += 1;
            let l = buf.trim();

            if in_dump {
                self.change(l, &mut current_time, &mut values)?;
            } else if l.starts_with("$scope ") {
                if let Some(name) = l.split_whitespace().nth(2) {
                    trace!("scope-open @ line {}: {:?}", self.line, name);
                    let name = self.interner.intern(name);
                    current = Some(scopes.push_child(current, name));
                }
            } else if l.starts_with("$var") {
                self.declare(l, current, &mut scopes, &mut names, &mut values);
            } else if l.starts_with("$upscope") {
                trace!("scope-close @ line {}", self.line);
                current = current.and_then(|i| scopes[i].parent);
            } else if l.starts_with("$dumpvars") {
                debug!("value dump begins @ line {}", self.line);
                in_dump = true;
            } else {
                trace!("ignored line {}: {:?}", self.line, l);
            }
        }

        debug!("parsed {} scopes, {} signals, {} sample times", scopes.len(), names.len(), values.times().len());
        Ok(Vcd::new(scopes, names, values))
    }

    /// Handles a `$var <type> <width> <alias> <name> $end` declaration.
    /// Malformed declarations, and declarations outside any scope, are
    /// skipped.
    fn declare(&mut self, l: &str, current: Option<ScopeIndex>, scopes: &mut ScopeTree, names: &mut HashMap<Symbol, Symbol>, values: &mut Values) {
        let s = l.split_whitespace().collect::<Vec<_>>();
        let scope = match current {
            Some(scope) if s.len() >= 5 => scope,
            _ => {
                debug!("skipping malformed $var @ line {}: {:?}", self.line, l);
                return;
            },
        };
        let width = match s[2].parse::<u32>() {
            Ok(width) => width,
            Err(_) => {
                debug!("skipping $var with bad width @ line {}: {:?}", self.line, s[2]);
                return;
            },
        };

        trace!("var @ line {}: {} <{}> width {}", self.line, s[4], s[3], width);
        let alias = self.interner.intern(s[3]);
        let name = self.interner.intern(s[4]);
        values.add_alias(alias, width);
        scopes.add_var(scope, name);
        let full_name = format!("{}/{}", scopes.full_name(scope, self.interner), s[4]);
        let full_name = self.interner.intern(full_name);
        names.insert(full_name, alias);
    }

    /// Handles one line of the value-change section.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredAlias`] (wrapped with the line number) if the
    /// referenced alias was never declared.
    ///
    /// [`UndeclaredAlias`]: ../error/enum.ErrorKind.html#variant.UndeclaredAlias
    fn change(&mut self, l: &str, current_time: &mut u64, values: &mut Values) -> Result<()> {
        if l.is_empty() || l == "$end" {
            return Ok(());
        }

        if l.starts_with('#') {
            if let Ok(time) = l[1..].parse::<u64>() {
                trace!("time marker @ line {}: #{}", self.line, time);
                *current_time = time;
                values.add_time(time);
            }
            return Ok(());
        }

        let s = l.split_whitespace().collect::<Vec<_>>();
        let (value, token) = if s.len() == 2 {
            // vector change: `b<bits> <alias>`
            let value = if s[0].starts_with('b') { &s[0][1..] } else { s[0] };
            (value, s[1])
        } else if l.is_char_boundary(1) {
            // scalar change: `<value-char><alias>`
            l.split_at(1)
        } else {
            return Ok(());
        };
        if token.is_empty() {
            return Ok(());
        }

        let alias = self.interner.intern(token);
        if values.width(alias).is_none() {
            bail!(Location::Line(self.line).wrap_error(ErrorKind::UndeclaredAlias(token.to_owned())));
        }
        values.add_value(*current_time, alias, value)
    }
}

//----------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::Reader;
    use intern::Interner;
    use vcd::Vcd;

    fn parse(source: &str, interner: &mut Interner) -> ::error::Result<Vcd> {
        Reader::new(source.as_bytes(), interner).parse()
    }

    static TRACE: &'static str = "\
$date today $end
$timescale 1ns $end
$scope module top $end
$var wire 1 ! clk $end
$var wire 2 \" cnt $end
$scope module sub $end
$var wire 1 # rst $end
$upscope $end
$upscope $end
$enddefinitions $end
$dumpvars
0!
b00 \"
1#
$end
#5
1!
b01 \"
#10
0!
b10 \"
0#
";

    #[test]
    fn scopes_and_names_are_registered() {
        let mut interner = Interner::new();
        let vcd = parse(TRACE, &mut interner).unwrap();

        let root = vcd.scopes.root().unwrap();
        assert_eq!(vcd.scopes.full_name(root, &interner), "top");
        assert_eq!(vcd.scopes[root].children.len(), 1);
        let sub = vcd.scopes[root].children[0];
        assert_eq!(vcd.scopes.full_name(sub, &interner), "top/sub");
        assert_eq!(vcd.scopes.all_signals(sub, &interner), vec!["top/sub/rst"]);

        let clk = interner.intern("top/clk");
        let rst = interner.intern("top/sub/rst");
        let nosuch = interner.intern("top/nosuch");
        assert!(vcd.signal_alias(clk).is_some());
        assert!(vcd.signal_alias(rst).is_some());
        assert!(vcd.signal_alias(nosuch).is_none());
    }

    #[test]
    fn scalar_and_vector_changes_are_recorded() {
        let mut interner = Interner::new();
        let vcd = parse(TRACE, &mut interner).unwrap();

        let cnt = vcd.signal_alias(interner.intern("top/cnt")).unwrap();
        let history = vcd.values.values_by_time(cnt).unwrap();
        let samples = history.iter().map(|(t, v)| (*t, &**v)).collect::<Vec<_>>();
        assert_eq!(samples, vec![(0, "00"), (5, "01"), (10, "10")]);

        let clk = vcd.signal_alias(interner.intern("top/clk")).unwrap();
        let history = vcd.values.values_by_time(clk).unwrap();
        let samples = history.iter().map(|(t, v)| (*t, &**v)).collect::<Vec<_>>();
        assert_eq!(samples, vec![(0, "0"), (5, "1"), (10, "0")]);
    }

    #[test]
    fn undeclared_alias_is_fatal() {
        let mut interner = Interner::new();
        let err = parse("$scope module top $end\n$var wire 1 ! clk $end\n$upscope $end\n$dumpvars\n1?\n", &mut interner).unwrap_err();
        // the line context wraps the actual kind.
        assert_eq!(err.to_string(), "on line 5");
        let cause = err.iter().nth(1).expect("cause");
        assert_eq!(cause.to_string(), "value change for undeclared alias \"?\"");
    }

    #[test]
    fn junk_lines_are_ignored() {
        let mut interner = Interner::new();
        let vcd = parse("$comment hello $end\nnot a marker\n\n$scope module top $end\n$var wire nope ! clk $end\n$upscope $end\n", &mut interner).unwrap();
        assert_eq!(vcd.names().len(), 0);
        assert_eq!(vcd.scopes.len(), 1);
    }

    #[test]
    fn var_outside_scope_is_ignored() {
        let mut interner = Interner::new();
        let vcd = parse("$var wire 1 ! clk $end\n", &mut interner).unwrap();
        assert_eq!(vcd.names().len(), 0);
    }
}
