//! Doc-comment directives.
//!
//! A directive is a doc line of the form `@Keyword argument...`. The vocabulary is closed:
//! [`DirectiveMatcher`] holds one table entry per keyword and every other line is ignored.

use log::trace;
use std::fmt;

/// Recognized directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Controller,
    AnyApi,
    GetApi,
    PostApi,
    PutApi,
    DeleteApi,
    Desc,
    Tag,
    Summary,
    Params,
    Middleware,
}

/// HTTP verb carried by an Api-family directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Any,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Any => "ANY",
        }
    }

    /// Lowercase form used as the operation key in documentation paths.
    pub fn doc_key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DirectiveKind {
    /// The verb of an Api-family keyword, `None` for every other keyword.
    pub fn verb(&self) -> Option<HttpVerb> {
        match self {
            DirectiveKind::AnyApi => Some(HttpVerb::Any),
            DirectiveKind::GetApi => Some(HttpVerb::Get),
            DirectiveKind::PostApi => Some(HttpVerb::Post),
            DirectiveKind::PutApi => Some(HttpVerb::Put),
            DirectiveKind::DeleteApi => Some(HttpVerb::Delete),
            _ => None,
        }
    }

    pub fn is_api(&self) -> bool {
        self.verb().is_some()
    }
}

/// One recognized directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Everything after the first space following the keyword
    pub tail: String,
}

impl Directive {
    /// Whitespace-separated tokens of the tail.
    pub fn tokens(&self) -> Vec<String> {
        self.tail.split_whitespace().map(str::to_string).collect()
    }

    /// The tail as free text.
    pub fn text(&self) -> &str {
        &self.tail
    }

    pub fn first_token(&self) -> Option<&str> {
        self.tail.split_whitespace().next()
    }

    pub fn verb(&self) -> Option<HttpVerb> {
        self.kind.verb()
    }

    /// Route path of an Api-family directive, absent when no token follows the keyword.
    pub fn path(&self) -> Option<&str> {
        if self.kind.is_api() {
            self.first_token()
        } else {
            None
        }
    }
}

/// Table-driven matcher over the closed keyword set.
pub struct DirectiveMatcher {
    table: &'static [(&'static str, DirectiveKind)],
}

const KEYWORDS: &[(&str, DirectiveKind)] = &[
    ("Controller", DirectiveKind::Controller),
    ("AnyApi", DirectiveKind::AnyApi),
    ("GetApi", DirectiveKind::GetApi),
    ("PostApi", DirectiveKind::PostApi),
    ("PutApi", DirectiveKind::PutApi),
    ("DeleteApi", DirectiveKind::DeleteApi),
    ("Desc", DirectiveKind::Desc),
    ("Tag", DirectiveKind::Tag),
    ("Summary", DirectiveKind::Summary),
    ("Params", DirectiveKind::Params),
    ("Middleware", DirectiveKind::Middleware),
];

impl Default for DirectiveMatcher {
    fn default() -> Self {
        Self { table: KEYWORDS }
    }
}

impl DirectiveMatcher {
    /// Matches a single doc line.
    ///
    /// The line must start with `@`, a known keyword and one space. Api-family keywords also
    /// match when the keyword ends the line, leaving the path absent.
    pub fn match_line(&self, line: &str) -> Option<Directive> {
        let rest = line.trim().strip_prefix('@')?;
        self.table.iter().find_map(|(keyword, kind)| {
            let after = rest.strip_prefix(keyword)?;
            if let Some(tail) = after.strip_prefix(' ') {
                Some(Directive {
                    kind: *kind,
                    tail: tail.to_string(),
                })
            } else if after.is_empty() && kind.is_api() {
                Some(Directive {
                    kind: *kind,
                    tail: String::new(),
                })
            } else {
                None
            }
        })
    }

    /// Matches every line, dropping the ones that are not directives.
    pub fn parse(&self, lines: &[String]) -> DirectiveSet {
        let directives: Vec<Directive> = lines
            .iter()
            .filter_map(|line| self.match_line(line))
            .collect();
        trace!("Matched {} directives in {} lines", directives.len(), lines.len());
        DirectiveSet { directives }
    }

    /// The Api-family directive on the first doc line, if there is one.
    pub fn api_from_first_line(&self, lines: &[String]) -> Option<Directive> {
        lines
            .first()
            .and_then(|line| self.match_line(line))
            .filter(|directive| directive.kind.is_api())
    }
}

/// Directives of one declaration or method, in doc-line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    pub directives: Vec<Directive>,
}

impl DirectiveSet {
    pub fn first(&self, kind: DirectiveKind) -> Option<&Directive> {
        self.directives.iter().find(|d| d.kind == kind)
    }

    pub fn last(&self, kind: DirectiveKind) -> Option<&Directive> {
        self.directives.iter().rev().find(|d| d.kind == kind)
    }

    /// First Api-family directive; later ones are ignored.
    pub fn api(&self) -> Option<&Directive> {
        self.directives.iter().find(|d| d.kind.is_api())
    }

    /// Tokens of the first `@Middleware` line.
    pub fn middleware(&self) -> Vec<String> {
        self.first(DirectiveKind::Middleware)
            .map(Directive::tokens)
            .unwrap_or_default()
    }

    /// Tag and description of an `@Controller` line.
    pub fn controller(&self) -> Option<(String, String)> {
        let directive = self.first(DirectiveKind::Controller)?;
        let tag = directive.first_token()?.to_string();
        let description = directive.tail.trim_start()[tag.len()..].trim().to_string();
        Some((tag, description))
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
