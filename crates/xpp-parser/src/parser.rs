//! Structural parser: source text → [`Program`].
//!
//! Tracks the active class and method from `:class` / `:func` directives and
//! indentation, joins continuation lines, and hands each logical line to the
//! lexer and classifier.

use std::path::PathBuf;

use xpp_lexer::split_line;
use xpp_types::ast::{Class, Method, Program};
use xpp_types::{
    is_blank_or_comment, ErrorCode, OperatorNames, SourceFile, Span, SyntaxFault, GLOBAL_CLASS,
    MAIN_METHOD,
};

use crate::classify::{ClassifyError, Classifier};
use crate::patterns::Directive;

/// Spaces per indent unit unless configured otherwise.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Result alias for parsing.
pub type ParseResult<T> = Result<T, SyntaxFault>;

/// A statement whose last physical line ended in `\`.
struct PendingLine {
    words: Vec<String>,
    /// Physical line the statement started on.
    number: u32,
}

/// The xpp structural parser.
pub struct Parser<'src> {
    source_file: &'src SourceFile,
    classifier: Classifier<'src>,
    /// One indent unit written out in spaces.
    indent_unit: String,
    program: Program,
    active_class: Option<String>,
    active_method: Option<String>,
    last_indent: usize,
    /// Executable lines compiled so far, across every method.
    executable_count: usize,
    pending: Option<PendingLine>,
}

impl<'src> Parser<'src> {
    /// Create a parser over `source_file`, classifying against `operators`.
    pub fn new(source_file: &'src SourceFile, operators: &'src dyn OperatorNames) -> Self {
        Self {
            source_file,
            classifier: Classifier::new(operators),
            indent_unit: " ".repeat(DEFAULT_INDENT_WIDTH),
            program: Program::new(PathBuf::from(&source_file.name)),
            active_class: None,
            active_method: None,
            last_indent: 0,
            executable_count: 0,
            pending: None,
        }
    }

    /// Use `width` spaces per indent unit. A tab is always one unit.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_unit = " ".repeat(width.max(1));
        self
    }

    /// Parse the whole file. Any fault aborts with no program.
    pub fn parse(mut self) -> ParseResult<Program> {
        let source_file = self.source_file;
        for (index, raw) in source_file.source.lines().enumerate() {
            let number = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let trimmed = raw.trim();
            if is_blank_or_comment(trimmed) {
                continue;
            }

            if let Some(pending) = self.pending.take() {
                self.statement(pending.words, trimmed, pending.number, number)?;
                continue;
            }

            let indent = self.indent_level(raw);
            if indent < self.last_indent {
                if indent < 1 {
                    self.active_class = None;
                }
                self.active_method = None;
            }

            if trimmed.starts_with(':') {
                self.directive(trimmed, indent, number)?;
            } else {
                if let (Some(class), None) = (&self.active_class, &self.active_method) {
                    let message = format!("statement outside of a method in class '{class}'");
                    return Err(self.fault(ErrorCode::STATEMENT_OUTSIDE_METHOD, message, number));
                }
                self.statement(Vec::new(), trimmed, number, number)?;
            }
            self.last_indent = indent;
        }

        if let Some(pending) = self.pending.take() {
            self.finish_line(pending)?;
        }

        tracing::debug!(
            file = %self.source_file.name,
            classes = self.program.classes.len(),
            lines = self.executable_count,
            "parsed program"
        );
        Ok(self.program)
    }

    // ── Indentation ───────────────────────────────────────────────────────

    fn indent_level(&self, raw: &str) -> usize {
        let leading = &raw[..raw.len() - raw.trim_start().len()];
        leading
            .replace(self.indent_unit.as_str(), "\t")
            .chars()
            .filter(|&c| c == '\t')
            .count()
    }

    // ── Directives ────────────────────────────────────────────────────────

    fn directive(&mut self, line: &str, indent: usize, number: u32) -> ParseResult<()> {
        match Directive::parse(line) {
            Some(Directive::Class(name)) => self.declare_class(name, indent, number),
            Some(Directive::Func { name, params }) => {
                self.declare_method(name, params, indent, number)
            }
            None => Err(self
                .fault(
                    ErrorCode::UNKNOWN_DIRECTIVE,
                    format!("unrecognised directive '{line}'"),
                    number,
                )
                .with_suggestion("directives are ':class NAME' and ':func NAME(params)'")),
        }
    }

    fn declare_class(&mut self, name: String, indent: usize, number: u32) -> ParseResult<()> {
        if indent != 0 || self.active_class.is_some() {
            return Err(self.fault(
                ErrorCode::MISPLACED_CLASS,
                format!("class '{name}' must be declared at indentation 0 outside any class"),
                number,
            ));
        }
        if self.program.classes.contains_key(&name) {
            return Err(self.fault(
                ErrorCode::DUPLICATE_CLASS,
                format!("class '{name}' is already defined"),
                number,
            ));
        }

        let class = Class::new(name.clone(), PathBuf::from(&self.source_file.name));
        self.program.classes.insert(name.clone(), class);
        self.active_class = Some(name);
        self.active_method = None;
        Ok(())
    }

    fn declare_method(
        &mut self,
        name: String,
        params: Vec<String>,
        indent: usize,
        number: u32,
    ) -> ParseResult<()> {
        let expected = usize::from(self.active_class.is_some());
        if indent != expected {
            return Err(self.fault(
                ErrorCode::MISPLACED_FUNC,
                format!("method '{name}' must be declared at indentation {expected}"),
                number,
            ));
        }

        let class_name = self
            .active_class
            .clone()
            .unwrap_or_else(|| GLOBAL_CLASS.to_string());
        let offset = self.executable_count;
        let duplicate = self
            .program
            .classes
            .get(&class_name)
            .is_some_and(|class| class.methods.contains_key(&name));
        if duplicate {
            return Err(self.fault(
                ErrorCode::DUPLICATE_METHOD,
                format!("method '{name}' is already defined in class '{class_name}'"),
                number,
            ));
        }

        if let Some(class) = self.program.classes.get_mut(&class_name) {
            class
                .methods
                .insert(name.clone(), Method::new(name.clone(), params, offset));
        }
        self.active_method = Some(name);
        Ok(())
    }

    // ── Statements ────────────────────────────────────────────────────────

    /// Lex one physical line onto `words`, then either wait for the
    /// continuation or compile the logical line.
    fn statement(
        &mut self,
        mut words: Vec<String>,
        text: &str,
        start: u32,
        number: u32,
    ) -> ParseResult<()> {
        let (text, continues) = match text.strip_suffix('\\') {
            Some(head) => (head, true),
            None => (text, false),
        };
        let lexed = split_line(text)
            .map_err(|e| self.fault(ClassifyError::from(e.clone()).code(), e.to_string(), number))?;
        words.extend(lexed);

        let pending = PendingLine {
            words,
            number: start,
        };
        if continues {
            self.pending = Some(pending);
            Ok(())
        } else {
            self.finish_line(pending)
        }
    }

    fn finish_line(&mut self, pending: PendingLine) -> ParseResult<()> {
        let line = self
            .classifier
            .classify_line(&pending.words)
            .map_err(|e| self.fault(e.code(), e.to_string(), pending.number))?;

        let class = self.active_class.as_deref().unwrap_or(GLOBAL_CLASS);
        let method = self.active_method.as_deref().unwrap_or(MAIN_METHOD);
        if let Some(target) = self
            .program
            .classes
            .get_mut(class)
            .and_then(|c| c.methods.get_mut(method))
        {
            target.lines.push(line);
        }
        self.executable_count += 1;
        Ok(())
    }

    // ── Faults ────────────────────────────────────────────────────────────

    fn fault(&self, code: ErrorCode, message: impl Into<String>, number: u32) -> SyntaxFault {
        let source_line = self.source_file.line(number).unwrap_or("");
        SyntaxFault::new(
            self.source_file.name.as_str(),
            code,
            message,
            Span::line(number, source_line.len()),
            source_line,
        )
    }
}

/// Parse `source_file` with default settings.
pub fn parse_program(
    source_file: &SourceFile,
    operators: &dyn OperatorNames,
) -> ParseResult<Program> {
    Parser::new(source_file, operators).parse()
}
