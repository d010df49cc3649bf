//! Permissive parsing of generated Cypher query lists.
//!
//! The query-generation prompt asks the model for either one Cypher query
//! or a list of queries written as a literal list of strings, e.g.
//!
//! ```text
//! ["MATCH (m:Movie {title: 'Heat'}) RETURN m.release_date",
//!  'MATCH (p:Person)-[:ACTED_IN]->(:Movie {title: "Heat"}) RETURN p.name']
//! ```
//!
//! Models are not reliable about this, so [`parse_query_list`] is total:
//! whatever cannot be read as a list is treated as a single query.

/// Parse model output into an ordered list of candidate queries.
///
/// Accepted shapes, tried in order:
/// 1. a JSON array of strings
/// 2. a list literal with single- or double-quoted (or triple-quoted)
///    strings, optional trailing comma and implicit literal concatenation
/// 3. a single quoted string literal
///
/// Surrounding Markdown code fences are removed first. Blank entries are
/// dropped. Anything else becomes a one-element list holding the trimmed
/// text; blank output yields an empty list.
///
/// # Examples
///
/// ```
/// use moviegraph_domain::retrieval::query_list::parse_query_list;
///
/// assert_eq!(
///     parse_query_list("MATCH (n) RETURN n LIMIT 1"),
///     vec!["MATCH (n) RETURN n LIMIT 1".to_string()]
/// );
/// assert_eq!(
///     parse_query_list(r#"['RETURN 1', "RETURN 2"]"#),
///     vec!["RETURN 1".to_string(), "RETURN 2".to_string()]
/// );
/// ```
pub fn parse_query_list(text: &str) -> Vec<String> {
    let body = strip_code_fence(text.trim()).trim();
    if body.is_empty() {
        return Vec::new();
    }

    if body.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(body) {
            return clean(items);
        }
        if let Some(items) = LiteralParser::new(body).parse_list() {
            return clean(items);
        }
    } else if let Some(single) = LiteralParser::new(body).parse_single() {
        return clean(vec![single]);
    }

    vec![body.to_string()]
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

/// Remove a surrounding ```` ```lang ... ``` ```` fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "cypher" or "python") on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest)
}

/// Minimal reader for list-of-string literals.
struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos == self.src.len()
    }

    fn parse_list(mut self) -> Option<Vec<String>> {
        self.skip_whitespace();
        if self.bump()? != '[' {
            return None;
        }

        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek()? {
                ']' => {
                    self.bump();
                    break;
                }
                _ => items.push(self.parse_concatenated()?),
            }

            self.skip_whitespace();
            match self.bump()? {
                ',' => continue,
                ']' => break,
                _ => return None,
            }
        }

        self.at_end().then_some(items)
    }

    fn parse_single(mut self) -> Option<String> {
        let value = self.parse_concatenated()?;
        self.at_end().then_some(value)
    }

    /// One or more adjacent string literals, joined (`'a' "b"` == `"ab"`)
    fn parse_concatenated(&mut self) -> Option<String> {
        self.skip_whitespace();
        let mut value = self.parse_string()?;
        loop {
            let checkpoint = self.pos;
            self.skip_whitespace();
            if matches!(self.peek(), Some('\'' | '"')) {
                value.push_str(&self.parse_string()?);
            } else {
                self.pos = checkpoint;
                return Some(value);
            }
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        if quote != '\'' && quote != '"' {
            return None;
        }

        let triple: String = std::iter::repeat_n(quote, 3).collect();
        let is_triple = self.rest().starts_with(&triple[1..]);
        if is_triple {
            self.pos += 2;
        }

        let mut value = String::new();
        loop {
            if is_triple && self.rest().starts_with(&triple) {
                self.pos += 3;
                return Some(value);
            }
            match self.bump()? {
                '\\' => {
                    let escaped = self.bump()?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' | '\'' | '"' => value.push(escaped),
                        '\n' => {}
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                c if c == quote && !is_triple => return Some(value),
                '\n' if !is_triple => return None,
                c => value.push(c),
            }
        }
    }
}
