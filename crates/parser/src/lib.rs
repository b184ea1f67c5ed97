//! Fixture DSL parsing: `col1:val1,col2:val2` into an ordered column map.
//!
//! Grammar:
//!
//! ```text
//! dsl    := "" | pair ("," pair)*
//! pair   := column ":" value      -- split on the first unescaped ':'
//! escape := "\," | "\:" | "\\" | "\[" | "\]"
//! group  := "[" ... "]"           -- copied verbatim, never split
//! ```
//!
//! Columns and values are trimmed. Any other backslash is literal.
//!
//! Escapes only protect delimiters while splitting. Classification sees the
//! unescaped value, so `\[user.id|a:1\]` is still an external reference; a
//! literal of that shape cannot be written.

mod ast;
mod table;

pub use ast::*;
pub use table::FixtureTable;

use common::{FixtureError, FixtureResult};
use keystore::KeywordStore;

/// Parse DSL text into a column map.
///
/// # Errors
///
/// Returns `FixtureError::MalformedDsl` if a pair has no `:`, a column name
/// is empty, or a `[` group is never closed.
pub fn parse_to_map(dsl: &str) -> FixtureResult<ColumnMap> {
    let mut map = ColumnMap::new();
    if dsl.trim().is_empty() {
        return Ok(map);
    }

    let mut scanner = Scanner::default();
    let mut chars = dsl.chars();
    while let Some(ch) = chars.next() {
        if scanner.depth > 0 {
            match ch {
                '[' => scanner.depth += 1,
                ']' => scanner.depth -= 1,
                _ => {}
            }
            scanner.push(ch);
            continue;
        }

        match ch {
            '\\' => match chars.next() {
                Some(escaped @ (',' | ':' | '\\' | '[' | ']')) => scanner.push(escaped),
                Some(other) => {
                    scanner.push('\\');
                    scanner.push(other);
                }
                None => scanner.push('\\'),
            },
            '[' => {
                scanner.depth += 1;
                scanner.push(ch);
            }
            ',' => scanner.finish_pair(dsl, &mut map)?,
            ':' if scanner.value.is_none() => scanner.value = Some(String::new()),
            _ => scanner.push(ch),
        }
    }

    if scanner.depth > 0 {
        return Err(FixtureError::malformed(dsl, "unclosed '[' group"));
    }
    scanner.finish_pair(dsl, &mut map)?;
    Ok(map)
}

#[derive(Default)]
struct Scanner {
    column: String,
    value: Option<String>,
    depth: usize,
}

impl Scanner {
    fn push(&mut self, ch: char) {
        match self.value.as_mut() {
            Some(value) => value.push(ch),
            None => self.column.push(ch),
        }
    }

    fn finish_pair(&mut self, dsl: &str, map: &mut ColumnMap) -> FixtureResult<()> {
        let column = std::mem::take(&mut self.column);
        let value = self.value.take().ok_or_else(|| {
            FixtureError::malformed(dsl, format!("'{}' is not a column:value pair", column.trim()))
        })?;
        let column = column.trim();
        if column.is_empty() {
            return Err(FixtureError::malformed(dsl, "empty column name"));
        }
        map.insert(column, value.trim());
        Ok(())
    }
}

/// Replace keyword references in every value with the store's current
/// values. A value that is exactly `{name}` must name a registered keyword;
/// references embedded in longer text are substituted in place.
pub fn resolve_keywords(map: &ColumnMap, store: &KeywordStore) -> FixtureResult<ColumnMap> {
    map.iter()
        .map(|(column, value)| {
            let resolved = match keystore::reference_name(value) {
                Some(name) => store.lookup(name)?.to_string(),
                None => store.parse_keywords_in(value)?,
            };
            Ok((column.to_string(), resolved))
        })
        .collect()
}

/// `parse_to_map` followed by `resolve_keywords`.
pub fn parse_and_resolve(dsl: &str, store: &KeywordStore) -> FixtureResult<ColumnMap> {
    resolve_keywords(&parse_to_map(dsl)?, store)
}
