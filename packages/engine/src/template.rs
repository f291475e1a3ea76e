//! Template resolver
//!
//! Expands the catalog mini-language against a [`VariableContext`]:
//!
//! - `{{name}}` - variable substitution (missing → empty)
//! - `{{#if name}}…{{/if}}` - emitted only when `name` is truthy
//! - `{{#each name}}…{{/each}}` - repeated per list element, with `{{this}}`
//!   and `{{@index}}` (1-based) available in the body
//! - `{{gender:m|f|p[|o]}}` - passed through untouched for
//!   [`crate::gender`], which selects the form
//!
//! Templates are parsed into a small block tree with an explicit stack, so
//! nested blocks work and an unbalanced tag never swallows the rest of the
//! document. Anything the resolver cannot interpret is stripped and reported
//! as a diagnostic; resolution never fails and never leaves a `{{…}}` other
//! than a gender marker in its output.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::MAX_BLOCK_DEPTH;
use crate::context::{Scope, VariableContext};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// Any innermost `{{…}}` construct.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("valid regex"));

/// A gender marker; group 1 holds the `|`-separated forms.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static GENDER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*gender\s*:([^{}]*)\}\}").expect("valid regex"));

/// Gender marker tag body, e.g. `gender:מצהיר|מצהירה|מצהירים`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKER_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^gender\s*:[^{}]*$").expect("valid regex"));

/// Opening block tag body, e.g. `#if has_car`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(if|each)\s+([^\s{}]+)$").expect("valid regex"));

/// Variable name: anything without whitespace that is not a block tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s#/!>{}][^\s{}]*$").expect("valid regex"));

/// Result of resolving a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Resolved text (gender markers still present)
    pub text: String,
    /// Stripped placeholders and unbalanced blocks
    pub diagnostics: Diagnostics,
}

/// Resolve a template against a context.
///
/// # Example
///
/// ```
/// use nusach_engine::{resolve, VariableContext};
///
/// let ctx = VariableContext::new().with("name", "דנה").with("has_car", true);
/// let text = resolve("שלום {{name}}, יש לך {{#if has_car}}רכב{{/if}}", &ctx);
/// assert_eq!(text, "שלום דנה, יש לך רכב");
/// ```
pub fn resolve(template: &str, ctx: &VariableContext) -> String {
    resolve_with_diagnostics(template, ctx).text
}

/// Resolve a template and report everything that was stripped.
pub fn resolve_with_diagnostics(template: &str, ctx: &VariableContext) -> Resolution {
    let mut diagnostics = Diagnostics::new();
    let nodes = parse(template, &mut diagnostics);

    let mut out = String::with_capacity(template.len());
    render(&nodes, Scope::new(ctx), &mut out);

    // Variable values may themselves contain `{{…}}`; sweep after substitution
    let text = sweep_placeholders(&out, true, &mut diagnostics);

    Resolution { text, diagnostics }
}

/// Check whether text still contains a `{{…}}` construct.
pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Check whether text contains a `{{…}}` construct other than a gender marker.
pub fn contains_unresolved_placeholder(text: &str) -> bool {
    PLACEHOLDER
        .find_iter(text)
        .any(|m| !GENDER_MARKER.is_match(m.as_str()))
}

/// Remove leftover `{{…}}` constructs until none remain.
///
/// Every removal shortens the text, so the loop terminates even when a removal
/// exposes a new placeholder (`{{{{x}}}}` → `{{}}` → ``).
pub(crate) fn sweep_placeholders(
    text: &str,
    keep_markers: bool,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut result = text.to_string();
    loop {
        let mut changed = false;
        let swept = PLACEHOLDER.replace_all(&result, |caps: &regex::Captures<'_>| {
            let whole = &caps[0];
            if keep_markers && GENDER_MARKER.is_match(whole) {
                whole.to_string()
            } else {
                changed = true;
                diagnostics.push(Diagnostic::UnresolvedPlaceholder {
                    tag: whole.to_string(),
                });
                String::new()
            }
        });
        if !changed {
            return result;
        }
        result = swept.into_owned();
    }
}

/// Parsed template element.
#[derive(Debug, Clone, PartialEq)]
enum Node<'t> {
    Text(&'t str),
    Variable(&'t str),
    Marker(&'t str),
    If { name: &'t str, body: Vec<Node<'t>> },
    Each { name: &'t str, body: Vec<Node<'t>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Each,
}

impl BlockKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(BlockKind::If),
            "each" => Some(BlockKind::Each),
            _ => None,
        }
    }

    fn close_keyword(&self) -> &'static str {
        match self {
            BlockKind::If => "/if",
            BlockKind::Each => "/each",
        }
    }
}

/// An open block while parsing.
struct Frame<'t> {
    kind: BlockKind,
    name: &'t str,
    open_tag: &'t str,
    nodes: Vec<Node<'t>>,
}

/// Classified `{{…}}` tag.
enum Tag<'t> {
    Open(BlockKind, &'t str),
    Close(BlockKind),
    Marker,
    Variable(&'t str),
    Unknown,
}

fn classify(inner: &str) -> Tag<'_> {
    let inner = inner.trim();
    if let Some(caps) = OPEN_TAG.captures(inner) {
        let keyword = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());
        if let Some(kind) = BlockKind::from_keyword(keyword) {
            return Tag::Open(kind, name);
        }
    }
    match inner {
        "/if" => Tag::Close(BlockKind::If),
        "/each" => Tag::Close(BlockKind::Each),
        _ if MARKER_BODY.is_match(inner) => Tag::Marker,
        _ if VARIABLE_NAME.is_match(inner) => Tag::Variable(inner),
        _ => Tag::Unknown,
    }
}

fn parse<'t>(template: &'t str, diagnostics: &mut Diagnostics) -> Vec<Node<'t>> {
    let mut root: Vec<Node<'t>> = Vec::new();
    let mut stack: Vec<Frame<'t>> = Vec::new();
    let mut last = 0;

    // Append to the innermost open block, or the root
    fn current<'a, 't>(
        root: &'a mut Vec<Node<'t>>,
        stack: &'a mut [Frame<'t>],
    ) -> &'a mut Vec<Node<'t>> {
        match stack.last_mut() {
            Some(frame) => &mut frame.nodes,
            None => root,
        }
    }

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let inner = caps.get(1).map_or("", |m| m.as_str());
        let tag = &template[whole.start()..whole.end()];

        if whole.start() > last {
            current(&mut root, &mut stack).push(Node::Text(&template[last..whole.start()]));
        }
        last = whole.end();

        match classify(inner) {
            Tag::Open(kind, name) => {
                if stack.len() >= MAX_BLOCK_DEPTH {
                    tracing::warn!(tag = %tag, depth = stack.len(), "Block nesting too deep");
                    diagnostics.push(Diagnostic::UnbalancedBlock {
                        tag: tag.to_string(),
                    });
                    continue;
                }
                stack.push(Frame {
                    kind,
                    name,
                    open_tag: tag,
                    nodes: Vec::new(),
                });
            }
            Tag::Close(kind) => {
                if stack.last().is_some_and(|frame| frame.kind == kind) {
                    if let Some(frame) = stack.pop() {
                        let node = match frame.kind {
                            BlockKind::If => Node::If {
                                name: frame.name,
                                body: frame.nodes,
                            },
                            BlockKind::Each => Node::Each {
                                name: frame.name,
                                body: frame.nodes,
                            },
                        };
                        current(&mut root, &mut stack).push(node);
                    }
                } else {
                    tracing::debug!(
                        tag = %tag,
                        expected = ?stack.last().map(|f| f.kind.close_keyword()),
                        "Stray closing tag"
                    );
                    diagnostics.push(Diagnostic::UnbalancedBlock {
                        tag: tag.to_string(),
                    });
                }
            }
            Tag::Marker => current(&mut root, &mut stack).push(Node::Marker(tag)),
            Tag::Variable(name) => {
                let in_loop = stack.iter().any(|frame| frame.kind == BlockKind::Each);
                if matches!(name, "this" | "@index") && !in_loop {
                    diagnostics.push(Diagnostic::UnresolvedPlaceholder {
                        tag: tag.to_string(),
                    });
                } else {
                    current(&mut root, &mut stack).push(Node::Variable(name));
                }
            }
            Tag::Unknown => {
                tracing::debug!(tag = %tag, "Unknown template construct stripped");
                diagnostics.push(Diagnostic::UnresolvedPlaceholder {
                    tag: tag.to_string(),
                });
            }
        }
    }

    if last < template.len() {
        current(&mut root, &mut stack).push(Node::Text(&template[last..]));
    }

    // Unclosed blocks: drop the opening tag, keep the content unconditionally
    while let Some(frame) = stack.pop() {
        diagnostics.push(Diagnostic::UnbalancedBlock {
            tag: frame.open_tag.to_string(),
        });
        current(&mut root, &mut stack).extend(frame.nodes);
    }

    root
}

fn render(nodes: &[Node<'_>], scope: Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) | Node::Marker(text) => out.push_str(text),
            Node::Variable(name) => {
                if let Some(text) = scope.text(name) {
                    out.push_str(&text);
                }
            }
            Node::If { name, body } => {
                if scope.is_truthy(name) {
                    render(body, scope, out);
                }
            }
            Node::Each { name, body } => {
                for (i, item) in scope.context().list(name).iter().enumerate() {
                    render(body, scope.with_frame(item, i + 1), out);
                }
            }
        }
    }
}
