//! The free-form textual puzzle grammar.
//!
//! Line-based and case-sensitive: `width N` and `height N` (each exactly
//! once), `rows`/`columns` opening a rule section (`rows N`/`columns N`
//! additionally set the dimension), an optional `maxrule N` hint, arbitrary
//! `name "quoted value"` notes, and rule lines of comma- or
//! whitespace-separated positive integers where a `0` ends the rule. Lines
//! starting with `#` are comments.

use std::fmt;

use thiserror::Error;

use crate::puzzle::Puzzle;
use crate::rule::Rule;

/// A failure while reading puzzle text, with the 1-based source line where
/// one applies.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {directive} already specified")]
    Duplicate {
        directive: &'static str,
        line: usize,
    },
    #[error("line {line}: {directive} needs a positive integer")]
    BadDirectiveValue {
        directive: &'static str,
        line: usize,
    },
    #[error("line {line}: malformed rule integer")]
    BadRule { line: usize },
    #[error("line {line}: specify height before rows")]
    SectionBeforeHeight { line: usize },
    #[error("line {line}: specify width before columns")]
    SectionBeforeWidth { line: usize },
    #[error("line {line}: rule data outside a rows/columns section")]
    RuleOutsideSection { line: usize },
    #[error("line {line}: too many rows")]
    TooManyRows { line: usize },
    #[error("line {line}: too many columns")]
    TooManyCols { line: usize },
    #[error("no width specified")]
    MissingWidth,
    #[error("no height specified")]
    MissingHeight,
    #[error("insufficient row data ({missing} still expected)")]
    MissingRows { missing: usize },
    #[error("insufficient column data ({missing} still expected)")]
    MissingCols { missing: usize },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Rows,
    Cols,
}

/// Reads a puzzle from its textual form.
///
/// Parsing stops as soon as every row and column rule has been seen;
/// trailing content is ignored.
///
/// # Errors
///
/// Any [`ParseError`]; the puzzle is not partially recoverable.
pub fn parse(text: &str) -> Result<Puzzle, ParseError> {
    let mut width: Option<usize> = None;
    let mut height: Option<usize> = None;
    let mut maxrule_seen = false;
    let mut section = Section::None;
    let mut rows: Vec<Rule> = Vec::new();
    let mut cols: Vec<Rule> = Vec::new();
    let mut notes: Vec<(String, String)> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = lineno + 1;
        if width.is_some()
            && height.is_some()
            && rows.len() == height.unwrap_or(0)
            && cols.len() == width.unwrap_or(0)
        {
            break;
        }

        let body = raw.trim_start();
        let Some(word) = body.split_whitespace().next() else {
            continue;
        };
        if word.starts_with('#') {
            continue;
        }
        let rest = &body[word.len()..];

        match word {
            "width" => {
                set_dimension(&mut width, "width", rest, line)?;
            }
            "height" => {
                set_dimension(&mut height, "height", rest, line)?;
            }
            "rows" => {
                if let Some(Ok(_)) = first_int(rest) {
                    set_dimension(&mut height, "height", rest, line)?;
                } else if height.is_none() {
                    return Err(ParseError::SectionBeforeHeight { line });
                }
                section = Section::Rows;
            }
            "columns" => {
                if let Some(Ok(_)) = first_int(rest) {
                    set_dimension(&mut width, "width", rest, line)?;
                } else if width.is_none() {
                    return Err(ParseError::SectionBeforeWidth { line });
                }
                section = Section::Cols;
            }
            "maxrule" => {
                if maxrule_seen {
                    return Err(ParseError::Duplicate {
                        directive: "maxrule",
                        line,
                    });
                }
                maxrule_seen = true;
                match first_int(rest) {
                    Some(Ok(n)) if n >= 1 => {}
                    _ => {
                        return Err(ParseError::BadDirectiveValue {
                            directive: "maxrule",
                            line,
                        });
                    }
                }
            }
            w if w.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                notes.push((w.to_owned(), parse_note_value(rest)));
            }
            _ => {
                let rule = parse_rule_line(body, line)?;
                match section {
                    Section::Rows => {
                        if Some(rows.len()) == height {
                            return Err(ParseError::TooManyRows { line });
                        }
                        rows.push(rule);
                    }
                    Section::Cols => {
                        if Some(cols.len()) == width {
                            return Err(ParseError::TooManyCols { line });
                        }
                        cols.push(rule);
                    }
                    Section::None => {
                        return Err(ParseError::RuleOutsideSection { line });
                    }
                }
            }
        }
    }

    let height = height.ok_or(ParseError::MissingHeight)?;
    if rows.len() < height {
        return Err(ParseError::MissingRows {
            missing: height - rows.len(),
        });
    }
    let width = width.ok_or(ParseError::MissingWidth)?;
    if cols.len() < width {
        return Err(ParseError::MissingCols {
            missing: width - cols.len(),
        });
    }

    let mut puzzle = Puzzle::new(rows, cols);
    for (name, value) in notes {
        puzzle.set_note(name, value);
    }
    Ok(puzzle)
}

fn set_dimension(
    slot: &mut Option<usize>,
    directive: &'static str,
    rest: &str,
    line: usize,
) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::Duplicate { directive, line });
    }
    match first_int(rest) {
        Some(Ok(n)) if n >= 1 => {
            *slot = Some(n);
            Ok(())
        }
        _ => Err(ParseError::BadDirectiveValue { directive, line }),
    }
}

/// The first whitespace-delimited token of `rest`, parsed, if there is one.
fn first_int(rest: &str) -> Option<Result<usize, ()>> {
    let token = rest.split_whitespace().next()?;
    Some(token.parse::<usize>().map_err(|_| ()))
}

fn parse_rule_line(body: &str, line: usize) -> Result<Rule, ParseError> {
    let mut blocks = Vec::new();
    for token in body
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let value: usize = token.parse().map_err(|_| ParseError::BadRule { line })?;
        if value == 0 {
            break;
        }
        blocks.push(value);
    }
    Ok(Rule::new(blocks))
}

/// Note values use shell-ish quoting: double quotes group words, a backslash
/// makes the next character literal, and unquoted whitespace collapses to
/// single spaces. Trailing whitespace is dropped.
fn parse_note_value(rest: &str) -> String {
    let mut out = String::new();
    let mut quoted = false;
    let mut space_pending = false;
    let mut chars = rest.trim_start().chars();

    let mut flush_push = |out: &mut String, pending: &mut bool, ch: char| {
        if *pending {
            out.push(' ');
            *pending = false;
        }
        out.push(ch);
    };

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    flush_push(&mut out, &mut space_pending, next);
                }
            }
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !out.is_empty() {
                    space_pending = true;
                }
            }
            c => flush_push(&mut out, &mut space_pending, c),
        }
    }
    out
}

/// Escapes a word for emission: quotes and backslashes get a backslash,
/// anything outside printable ASCII becomes `?`.
fn escape_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

impl fmt::Display for Puzzle {
    /// Emits the textual grammar, such that [`parse`] reads back an equal
    /// puzzle.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "maxrule {}", self.max_rule_len())?;
        writeln!(f, "width {}", self.width())?;
        writeln!(f, "height {}", self.height())?;
        for (name, value) in self.notes() {
            writeln!(f, "{} \"{}\"", escape_word(name), escape_word(value))?;
        }
        writeln!(f, "\nrows")?;
        for rule in self.rows() {
            writeln!(f, "{rule}")?;
        }
        writeln!(f, "\ncolumns")?;
        for rule in self.cols() {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
