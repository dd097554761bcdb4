//! # Instance Format
//!
//! Plain-text persistence for fact models.
//!
//! Format: one ground atom per line, terminated by `.`.
//! - Blank lines are ignored
//! - Lines starting with `%` are comments
//! - Quoted strings use `\"`, `\\` and `\n` escapes
//!
//! Appending to an existing file is how a pre-built instance is augmented
//! with new seeds and targets. Concurrent appends to one file are not safe.
//!
//! `parse_atom` is shared with the external solver backend, which reports
//! answers as atom strings in the same syntax.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::FactModel;
use crate::types::{Fact, SymbiotaError, Term};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted instance file size.
///
/// Checked from file metadata before the file is read into memory.
pub const MAX_INSTANCE_FILE_SIZE: u64 = 1024 * 1024 * 1024;

// =============================================================================
// WRITING
// =============================================================================

/// Render a model as instance text.
#[must_use]
pub fn render_instance(model: &FactModel) -> String {
    let mut out = String::new();
    for fact in model {
        out.push_str(&fact.to_string());
        out.push_str(".\n");
    }
    out
}

/// Write a model to `path`, replacing any previous content.
pub fn write_instance(path: &Path, model: &FactModel) -> Result<(), SymbiotaError> {
    fs::write(path, render_instance(model)).map_err(|e| SymbiotaError::io(path, &e))
}

/// Append facts to an existing instance file.
pub fn append_facts<'a>(
    path: &Path,
    facts: impl IntoIterator<Item = &'a Fact>,
) -> Result<(), SymbiotaError> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| SymbiotaError::io(path, &e))?;
    let mut writer = BufWriter::new(file);
    for fact in facts {
        writeln!(writer, "{fact}.").map_err(|e| SymbiotaError::io(path, &e))?;
    }
    writer.flush().map_err(|e| SymbiotaError::io(path, &e))
}

// =============================================================================
// READING
// =============================================================================

/// Read an instance file into a model.
///
/// Returns `NotFound` if the file is absent and `MalformedInput` (with the
/// line number) for any line that is not a single atom.
pub fn read_instance(path: &Path) -> Result<FactModel, SymbiotaError> {
    let meta = fs::metadata(path).map_err(|e| SymbiotaError::io(path, &e))?;
    if !meta.is_file() {
        return Err(SymbiotaError::not_found(path, "Instance file"));
    }
    if meta.len() > MAX_INSTANCE_FILE_SIZE {
        return Err(SymbiotaError::malformed(
            path,
            format!("file size {} exceeds limit", meta.len()),
        ));
    }

    let text = fs::read_to_string(path).map_err(|e| SymbiotaError::io(path, &e))?;
    let mut model = FactModel::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let Some(body) = line.strip_suffix('.') else {
            return Err(SymbiotaError::malformed(
                path,
                format!("line {}: statement not terminated by '.'", index + 1),
            ));
        };
        let fact = parse_atom(body)
            .map_err(|reason| SymbiotaError::malformed(path, format!("line {}: {reason}", index + 1)))?;
        model.insert(fact);
    }

    Ok(model)
}

// =============================================================================
// ATOM PARSER
// =============================================================================

/// Parse a single atom such as `exchanged("e","c","orgB3","host")`.
///
/// Compound arguments (`f(x,y)`) and parenthesised tuples are kept verbatim
/// as `Term::Symbol`.
pub fn parse_atom(text: &str) -> Result<Fact, String> {
    let mut cursor = Cursor::new(text.trim());
    let predicate = cursor.identifier()?;
    let mut args = Vec::new();

    cursor.skip_ws();
    if cursor.eat('(') {
        loop {
            cursor.skip_ws();
            args.push(cursor.term()?);
            cursor.skip_ws();
            if cursor.eat(',') {
                continue;
            }
            if cursor.eat(')') {
                break;
            }
            return Err(format!("expected ',' or ')' at column {}", cursor.pos + 1));
        }
    }

    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(format!("unexpected text at column {}", cursor.pos + 1));
    }

    Ok(Fact::new(predicate, args))
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    src: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            src,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '\'')
        {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();
        match ident.chars().next() {
            Some(c) if c.is_lowercase() || c == '_' => Ok(ident),
            _ => Err(format!("expected predicate name in '{}'", self.src)),
        }
    }

    fn term(&mut self) -> Result<Term, String> {
        match self.peek() {
            Some('"') => self.quoted(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => self.symbol(),
            None => Err("unexpected end of atom".to_string()),
        }
    }

    fn quoted(&mut self) -> Result<Term, String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err("unterminated string".to_string()),
                Some('"') => {
                    self.pos += 1;
                    return Ok(Term::Quoted(out));
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some('n') => out.push('\n'),
                        Some(c) => out.push(c),
                        None => return Err("dangling escape".to_string()),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn number(&mut self) -> Result<Term, String> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Term::Number)
            .map_err(|_| format!("invalid integer '{text}'"))
    }

    /// Bare constant, possibly with a balanced parenthesised tail.
    fn symbol(&mut self) -> Result<Term, String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut in_string = false;
        while let Some(c) = self.peek() {
            if in_string {
                if c == '\\' {
                    self.pos += 1;
                } else if c == '"' {
                    in_string = false;
                }
            } else {
                match c {
                    '"' => in_string = true,
                    '(' => depth += 1,
                    ')' if depth == 0 => break,
                    ')' => depth -= 1,
                    ',' if depth == 0 => break,
                    _ => {}
                }
            }
            self.pos += 1;
        }
        if in_string || depth != 0 {
            return Err("unbalanced compound term".to_string());
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(format!("empty term at column {}", start + 1));
        }
        Ok(Term::Symbol(text))
    }
}

// =============================================================================
// TESTS
// =============================================================================
