//! Reader of hit-count-annotated source listings.
//!
//! A listing annotates each source line with its execution state: a line
//! starting with `%` was never hit, a line starting with a space and a
//! decimal count was hit that many times, and any other line carries no
//! hit/miss state at all. This module parses such listings and aggregates a
//! per-file coverage percentage for the report renderer.

use error::*;
use utils::tuple_2_add;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of an annotated source listing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AnnotatedLine {
    /// Number of times the line was hit, or `None` when the line carries no
    /// hit/miss state.
    pub count: Option<u64>,
    /// The source text with the annotation stripped. Tabs are widened to
    /// four spaces.
    pub text: String,
}

/// A parsed annotated source listing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AnnotatedFile {
    /// File name of the listing, without directories.
    pub filename: String,
    lines: Vec<AnnotatedLine>,
}

/// Hit/miss totals of one annotated file. Lines without a hit/miss state do
/// not contribute to either count.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct AnnotatedSummary {
    /// Number of annotated lines hit at least once.
    pub lines_hit: usize,
    /// Number of annotated lines never hit.
    pub lines_missed: usize,
}

impl AnnotatedFile {
    /// Reads an annotated listing from the file system.
    pub fn open<P: AsRef<Path>>(p: P) -> Result<AnnotatedFile> {
        let path = p.as_ref();
        let filename = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => String::new(),
        };
        Location::File(path.to_owned()).wrap(move || {
            let file = File::open(path)?;
            AnnotatedFile::from_reader(filename, BufReader::new(file))
        })
    }

    /// Reads an annotated listing. See [`open()`].
    ///
    /// [`open()`]: #method.open
    pub fn from_reader<R: BufRead>(filename: String, reader: R) -> Result<AnnotatedFile> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?.replace('\t', "    ");
            lines.push(annotate(&line));
        }
        Ok(AnnotatedFile { filename, lines })
    }

    /// The parsed lines, in file order.
    pub fn lines(&self) -> &[AnnotatedLine] {
        &self.lines
    }

    /// Aggregates the hit/miss totals over all lines with a defined state.
    pub fn summary(&self) -> AnnotatedSummary {
        let (lines_hit, lines_missed) = self.lines
            .iter()
            .filter_map(|line| line.count)
            .map(|count| if count > 0 { (1, 0) } else { (0, 1) })
            .fold((0, 0), tuple_2_add);
        AnnotatedSummary { lines_hit, lines_missed }
    }
}

impl AnnotatedSummary {
    /// Covered fraction of the stated lines, in percent. A file stating no
    /// lines at all counts as fully covered.
    pub fn percent(&self) -> f64 {
        let total = self.lines_hit + self.lines_missed;
        if total == 0 {
            100.0
        } else {
            self.lines_hit as f64 * 100.0 / total as f64
        }
    }
}

fn annotate(line: &str) -> AnnotatedLine {
    if line.starts_with('%') {
        // e.g. "%000000  never reached"
        let text = match line.find(' ') {
            Some(pos) => line[pos + 1..].to_owned(),
            None => String::new(),
        };
        return AnnotatedLine {
            count: Some(0),
            text,
        };
    }

    if line.starts_with(' ') {
        // the prefix is one byte, so slicing past it stays on a char
        // boundary even when the rest is not ASCII.
        let rest = &line[1..];
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            // e.g. " 000012  hit twelve times"
            let (token, text) = match rest.find(' ') {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };
            if let Ok(count) = token.parse::<u64>() {
                return AnnotatedLine {
                    count: Some(count),
                    text: text.to_owned(),
                };
            }
        }
    }

    AnnotatedLine {
        count: None,
        text: line.to_owned(),
    }
}
