//! Cypher RETURN clause column extraction.
//!
//! Apache AGE wraps Cypher in SQL and needs the result columns declared up
//! front, so the backend derives them from the query text.
//!
//! ```
//! use graphmart::graph::extract_return_columns;
//!
//! let columns = extract_return_columns("MATCH (p:Product) RETURN p, p.price AS price").unwrap();
//! assert_eq!(columns, vec!["p", "price"]);
//! ```

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "graph/cypher.pest"]
struct CypherParser;

/// Errors from [`extract_return_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The query has no top-level RETURN (write-only query).
    #[error("query has no RETURN clause")]
    NoReturnClause,
    /// `RETURN *` cannot be mapped to a fixed column list.
    #[error("RETURN * is not supported")]
    ReturnStarNotSupported,
    #[error("invalid Cypher: {0}")]
    InvalidSyntax(String),
}

/// One projection item while it is being read.
#[derive(Default)]
struct Item {
    span: Option<(usize, usize)>,
    alias: Option<String>,
    expecting_alias: bool,
}

impl Item {
    fn push(&mut self, pair: &Pair<'_, Rule>) {
        if self.expecting_alias {
            self.alias = Some(pair.as_str().trim_matches('`').to_string());
            self.expecting_alias = false;
            return;
        }
        let span = pair.as_span();
        self.span = Some(match self.span {
            Some((start, _)) => (start, span.end()),
            None => (span.start(), span.end()),
        });
    }

    fn is_empty(&self) -> bool {
        self.span.is_none() && self.alias.is_none()
    }

    fn into_column(self, query: &str) -> Result<String, ParseError> {
        if let Some(alias) = self.alias {
            return Ok(alias);
        }
        let (start, end) = self
            .span
            .ok_or_else(|| ParseError::InvalidSyntax("empty RETURN item".to_string()))?;
        let text = query[start..end].trim();
        if text == "*" {
            return Err(ParseError::ReturnStarNotSupported);
        }
        Ok(text.to_string())
    }
}

/// Extracts column names from the final top-level RETURN clause.
///
/// Aliased items (`expr AS alias`) yield the alias; other items yield their
/// expression text. RETURN clauses nested inside brackets are ignored, and
/// with UNION the last RETURN wins.
pub fn extract_return_columns(query: &str) -> Result<Vec<String>, ParseError> {
    let root = CypherParser::parse(Rule::Cypher, query)
        .map_err(|e| ParseError::InvalidSyntax(e.to_string()))?
        .next()
        .ok_or_else(|| ParseError::InvalidSyntax("empty query".to_string()))?;

    let mut last_columns: Option<Vec<String>> = None;
    let mut current: Option<(Vec<String>, Item)> = None;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::Return => {
                current = Some((Vec::new(), Item::default()));
            }
            Rule::Boundary | Rule::EOI => {
                if let Some((mut columns, item)) = current.take() {
                    columns.push(item.into_column(query)?);
                    last_columns = Some(columns);
                }
            }
            _ => {
                let Some((columns, item)) = current.as_mut() else {
                    continue;
                };
                match pair.as_rule() {
                    Rule::Comma => {
                        let done = std::mem::take(item);
                        columns.push(done.into_column(query)?);
                    }
                    Rule::Distinct if columns.is_empty() && item.is_empty() => {}
                    Rule::As => item.expecting_alias = true,
                    _ => item.push(&pair),
                }
            }
        }
    }

    last_columns.ok_or(ParseError::NoReturnClause)
}
