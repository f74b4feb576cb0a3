//! Fault reporter: maps the frames of an uncaught fault back to source lines.
//!
//! Each frame's position is its method's offset plus the index of the line
//! it was running. That position is found again by re-scanning the source
//! with the same executable-line rule the parser used. For `_main`, whose
//! lines are interleaved with method bodies, only unindented lines count.
//!
//! Reporting never fails: a position that cannot be found is reported as an
//! unknown line.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use xpp_eval::{Fault, Frame};
use xpp_types::ast::Program;
use xpp_types::{executable_lines, MAIN_METHOD};

/// One frame of a fault trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub file: String,
    /// 1-based line number, if the position could be found.
    pub line: Option<u32>,
    /// `the global scope`, or `<file-stem>.<class>.<method>`.
    pub location: String,
    /// The trimmed source line.
    pub source: Option<String>,
}

/// A runtime fault mapped to source. Entries are in call order, outermost
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultReport {
    pub entries: Vec<TraceEntry>,
    pub message: String,
}

impl FaultReport {
    /// Build a report, fetching source text through `load`.
    pub fn new(
        program: &Program,
        fault: &Fault,
        mut load: impl FnMut(&Path) -> Option<String>,
    ) -> Self {
        let mut sources: BTreeMap<PathBuf, Option<String>> = BTreeMap::new();
        let entries = fault
            .frames
            .iter()
            .map(|frame| {
                let file = program
                    .class(&frame.class)
                    .map(|class| class.file.clone())
                    .unwrap_or_default();
                let text = sources
                    .entry(file.clone())
                    .or_insert_with(|| load(&file))
                    .as_deref();
                trace_entry(program, frame, &file, text)
            })
            .collect();
        Self {
            entries,
            message: fault.error.to_string(),
        }
    }

    /// The innermost entry: where the fault was raised.
    pub fn innermost(&self) -> Option<&TraceEntry> {
        self.entries.last()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn trace_entry(program: &Program, frame: &Frame, file: &Path, text: Option<&str>) -> TraceEntry {
    let is_main = frame.method == MAIN_METHOD;
    let location = if is_main {
        "the global scope".to_string()
    } else {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}.{}.{}", frame.class, frame.method)
    };

    let found = program
        .method(&frame.class, &frame.method)
        .zip(text)
        .and_then(|(method, text)| {
            executable_lines(text)
                .into_iter()
                .filter(|line| !is_main || !line.indented)
                .nth(method.offset + frame.line_index)
        });

    TraceEntry {
        file: file.display().to_string(),
        line: found.as_ref().map(|line| line.number),
        location,
        source: found.map(|line| line.text),
    }
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "xpp | Instruction Fault")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for entry in &self.entries {
            match entry.line {
                Some(line) => writeln!(
                    f,
                    "File '{}', line {line}, in {}:",
                    entry.file, entry.location
                )?,
                None => writeln!(f, "File '{}', unknown line, in {}:", entry.file, entry.location)?,
            }
            if let Some(source) = &entry.source {
                writeln!(f, "  > {source}")?;
            }
        }
        write!(f, "Fault: {}", self.message)
    }
}
