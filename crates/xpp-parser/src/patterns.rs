//! Hand-written matchers for directives and word shapes.
//!
//! Grammar:
//! ```text
//! class    := ":class" WS+ NAME WS*
//! func     := ":func" WS+ NAME WS* "(" (NAME | WS)* ")" WS*
//! integer  := "-"? DIGIT+
//! float    := ("-" | "+")? DIGIT+ "." DIGIT+
//! indexed  := NAME "[" (NAME | "{" | "}" | "[" | "]" | "\"" | "'" | " ")* "]"
//! NAME     := (ALNUM | "_")+
//! ```

/// A recognised `:`-prefixed structural declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `:class NAME`
    Class(String),
    /// `:func NAME(params...)`
    Func { name: String, params: Vec<String> },
}

impl Directive {
    /// Match a trimmed line against the directive grammar.
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(rest) = keyword(line, ":class") {
            let name = rest.trim_end();
            return is_name(name).then(|| Directive::Class(name.to_string()));
        }
        let rest = keyword(line, ":func")?;
        let open = rest.find('(')?;
        let name = rest[..open].trim_end();
        let params = rest[open + 1..].trim_end().strip_suffix(')')?;
        if !is_name(name) || !params.chars().all(|c| is_name_char(c) || c == ' ') {
            return None;
        }
        Some(Directive::Func {
            name: name.to_string(),
            params: params.split_whitespace().map(str::to_string).collect(),
        })
    }
}

/// Strip `keyword` plus at least one whitespace character.
fn keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    let trimmed = rest.trim_start();
    (trimmed.len() < rest.len()).then_some(trimmed)
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `-?\d+`
pub(crate) fn is_integer(word: &str) -> bool {
    is_digits(word.strip_prefix('-').unwrap_or(word))
}

/// `[-+]?\d+\.\d+`
pub(crate) fn is_float(word: &str) -> bool {
    let unsigned = word
        .strip_prefix('-')
        .or_else(|| word.strip_prefix('+'))
        .unwrap_or(word);
    match unsigned.split_once('.') {
        Some((whole, frac)) => is_digits(whole) && is_digits(frac),
        None => false,
    }
}

/// `NAME[args]`, returning the name and the raw argument text.
pub(crate) fn indexed_call(word: &str) -> Option<(&str, &str)> {
    let open = word.find('[')?;
    let name = &word[..open];
    let args = word[open + 1..].strip_suffix(']')?;
    let args_ok = args
        .chars()
        .all(|c| is_name_char(c) || matches!(c, '{' | '}' | '[' | ']' | '"' | '\'' | ' '));
    (is_name(name) && args_ok).then_some((name, args))
}
