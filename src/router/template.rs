//! Route template compilation — `/users/{id}` → a matchable token list.
//!
//! A template is a sequence of literal runs and `{name}` placeholders. Each
//! placeholder captures one or more non-`/` characters; literal runs match
//! verbatim and case-sensitively. The compiled template is anchored: it must
//! consume the entire request path, so partial-prefix matches never succeed.

use thiserror::Error;

/// Errors produced while compiling a route template string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` without a closing `}`, or a stray `}` outside a placeholder.
    #[error("unbalanced braces in route template `{0}`")]
    UnbalancedBraces(String),

    /// A `{}` placeholder with no name.
    #[error("empty parameter name in route template `{0}`")]
    EmptyParameter(String),

    /// The same parameter name appears more than once in one template.
    #[error("duplicate parameter name `{name}` in route template `{template}`")]
    DuplicateParameter { template: String, name: String },
}

// One element of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// A compiled route template: the original pattern string, its token list,
/// and the parameter names in declaration order.
///
/// Compilation is a pure function of the input string; a `RouteTemplate` is
/// never mutated after construction.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    raw: String,
    tokens: Vec<Token>,
    param_names: Vec<String>,
}

impl RouteTemplate {
    /// Compile a template string such as `/users/{id}`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::UnbalancedBraces`] — `{` never closed, a nested `{`,
    ///   or a `}` with no opening brace.
    /// - [`TemplateError::EmptyParameter`] — a `{}` with no name inside.
    /// - [`TemplateError::DuplicateParameter`] — a parameter name repeated
    ///   within the same template.
    pub fn compile(raw: &str) -> Result<Self, TemplateError> {
        let mut tokens = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(TemplateError::UnbalancedBraces(raw.to_owned()));
                            }
                            Some(c) => name.push(c),
                        }
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyParameter(raw.to_owned()));
                    }
                    if param_names.contains(&name) {
                        return Err(TemplateError::DuplicateParameter {
                            template: raw.to_owned(),
                            name,
                        });
                    }
                    param_names.push(name.clone());
                    tokens.push(Token::Param(name));
                }
                '}' => return Err(TemplateError::UnbalancedBraces(raw.to_owned())),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_owned(),
            tokens,
            param_names,
        })
    }

    /// Returns the original template string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parameter names in the order they appear in the template.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Attempt a full, anchored match of `path` against this template.
    ///
    /// On success returns the captured parameter values in declaration order
    /// (one entry per name in [`param_names`](Self::param_names)). Captures
    /// are greedy: a placeholder consumes as many non-`/` characters as
    /// possible while still allowing the rest of the template to match.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let mut captured = Vec::with_capacity(self.param_names.len());
        if match_tokens(&self.tokens, path, &mut captured) {
            Some(captured)
        } else {
            None
        }
    }
}

// Recursive descent over the token list with backtracking, so that a
// placeholder followed by a literal (`/file-{id}.txt`) behaves like the
// greedy regex capture `([^/]+)`.
fn match_tokens(tokens: &[Token], path: &str, captured: &mut Vec<String>) -> bool {
    let Some((head, rest)) = tokens.split_first() else {
        return path.is_empty();
    };

    match head {
        Token::Literal(lit) => match path.strip_prefix(lit.as_str()) {
            Some(remainder) => match_tokens(rest, remainder, captured),
            None => false,
        },
        Token::Param(_) => {
            // A capture stops at the next separator and must be non-empty.
            let limit = path.find('/').unwrap_or(path.len());
            for end in (1..=limit).rev() {
                if !path.is_char_boundary(end) {
                    continue;
                }
                captured.push(path[..end].to_owned());
                if match_tokens(rest, &path[end..], captured) {
                    return true;
                }
                captured.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── compile ──────────────────────────────────────────────────────────────

    #[test]
    fn compile_literal_only() {
        let t = RouteTemplate::compile("/users").unwrap();
        assert!(t.param_names().is_empty());
        assert_eq!(t.raw(), "/users");
    }

    #[test]
    fn compile_single_param() {
        let t = RouteTemplate::compile("/users/{id}").unwrap();
        assert_eq!(t.param_names(), ["id"]);
    }

    #[test]
    fn compile_params_in_declaration_order() {
        let t = RouteTemplate::compile("/a/{x}/b/{y}").unwrap();
        assert_eq!(t.param_names(), ["x", "y"]);
    }

    #[test]
    fn compile_rejects_duplicate_param() {
        let err = RouteTemplate::compile("/a/{x}/b/{x}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::DuplicateParameter {
                template: "/a/{x}/b/{x}".into(),
                name: "x".into(),
            }
        );
    }

    #[test]
    fn compile_rejects_unclosed_brace() {
        assert_eq!(
            RouteTemplate::compile("/users/{id").unwrap_err(),
            TemplateError::UnbalancedBraces("/users/{id".into())
        );
    }

    #[test]
    fn compile_rejects_stray_closing_brace() {
        assert_eq!(
            RouteTemplate::compile("/users/id}").unwrap_err(),
            TemplateError::UnbalancedBraces("/users/id}".into())
        );
    }

    #[test]
    fn compile_rejects_nested_brace() {
        assert_eq!(
            RouteTemplate::compile("/users/{{id}}").unwrap_err(),
            TemplateError::UnbalancedBraces("/users/{{id}}".into())
        );
    }

    #[test]
    fn compile_rejects_empty_param() {
        assert_eq!(
            RouteTemplate::compile("/users/{}").unwrap_err(),
            TemplateError::EmptyParameter("/users/{}".into())
        );
    }

    // ── captures ─────────────────────────────────────────────────────────────

    #[test]
    fn literal_match_exact() {
        let t = RouteTemplate::compile("/users").unwrap();
        assert_eq!(t.captures("/users"), Some(vec![]));
        assert_eq!(t.captures("/posts"), None);
    }

    #[test]
    fn literal_match_is_case_sensitive() {
        let t = RouteTemplate::compile("/Users").unwrap();
        assert!(t.captures("/users").is_none());
        assert!(t.captures("/Users").is_some());
    }

    #[test]
    fn literal_match_is_anchored() {
        let t = RouteTemplate::compile("/users").unwrap();
        assert!(t.captures("/users/42").is_none());
        assert!(t.captures("/users/").is_none());
        assert!(t.captures("/api/users").is_none());
    }

    #[test]
    fn param_captures_segment() {
        let t = RouteTemplate::compile("/users/{id}").unwrap();
        assert_eq!(t.captures("/users/42"), Some(vec!["42".to_owned()]));
    }

    #[test]
    fn param_does_not_cross_separator() {
        let t = RouteTemplate::compile("/users/{id}").unwrap();
        assert!(t.captures("/users/42/posts").is_none());
    }

    #[test]
    fn param_must_be_non_empty() {
        let t = RouteTemplate::compile("/users/{id}").unwrap();
        assert!(t.captures("/users/").is_none());
    }

    #[test]
    fn multi_param_capture_order() {
        let t = RouteTemplate::compile("/a/{x}/b/{y}").unwrap();
        assert_eq!(
            t.captures("/a/1/b/2"),
            Some(vec!["1".to_owned(), "2".to_owned()])
        );
        assert!(t.captures("/a/1/c/2").is_none());
    }

    #[test]
    fn param_embedded_in_segment() {
        // Greedy capture with backtracking against the trailing literal.
        let t = RouteTemplate::compile("/files/report-{id}.txt").unwrap();
        assert_eq!(
            t.captures("/files/report-2024.txt"),
            Some(vec!["2024".to_owned()])
        );
        assert!(t.captures("/files/report-2024.pdf").is_none());
    }

    #[test]
    fn param_capture_is_greedy() {
        let t = RouteTemplate::compile("/v/{id}.x").unwrap();
        // Both "a.x" and "a" could end the capture; greedy takes the longest.
        assert_eq!(t.captures("/v/a.x.x"), Some(vec!["a.x".to_owned()]));
    }

    #[test]
    fn param_capture_handles_multibyte_values() {
        let t = RouteTemplate::compile("/users/{name}").unwrap();
        assert_eq!(t.captures("/users/héllo"), Some(vec!["héllo".to_owned()]));
    }

    #[test]
    fn root_template() {
        let t = RouteTemplate::compile("/").unwrap();
        assert!(t.captures("/").is_some());
        assert!(t.captures("/x").is_none());
    }
}
