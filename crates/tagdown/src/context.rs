//! Per-translation traversal state.

use indexmap::IndexMap;

use crate::whitespace::{is_whitespace_only, whitespace_stats, Position, WhitespaceStats};

/// Kind of an open list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone)]
struct ListFrame {
    kind: ListKind,
    next_number: u64,
    current: Option<u64>,
}

/// Mutable state of one tree walk.
///
/// A fresh context is created for every document and dropped when the walk
/// ends; nothing in it outlives a single translation.
#[derive(Debug, Default)]
pub struct TraversalContext {
    lists: Vec<ListFrame>,
    verbatim: bool,
    no_escape: bool,
    tail: WhitespaceStats,
    link_references: IndexMap<String, usize>,
}

/// Saved region flags, restored when a subtree is left.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Region {
    verbatim: bool,
    no_escape: bool,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lists enclosing the current node.
    pub fn list_depth(&self) -> usize {
        self.lists.len()
    }

    /// Kind of the innermost open list.
    pub fn list_kind(&self) -> Option<ListKind> {
        self.lists.last().map(|f| f.kind)
    }

    /// Number of the current item in the innermost list (1-based unless the
    /// list sets `start`). `None` outside lists or before the first item.
    pub fn list_item_number(&self) -> Option<u64> {
        self.lists.last().and_then(|f| f.current)
    }

    /// Whether text is currently emitted verbatim (no whitespace collapsing).
    pub fn in_verbatim(&self) -> bool {
        self.verbatim
    }

    /// Whether text escaping is suppressed for the current subtree.
    pub fn no_escape(&self) -> bool {
        self.no_escape
    }

    /// Whitespace run at the end of everything emitted so far.
    pub fn tail(&self) -> WhitespaceStats {
        self.tail
    }

    /// Reference number for `href`, allocating the next one on first use.
    pub fn link_reference(&mut self, href: &str) -> usize {
        let next = self.link_references.len() + 1;
        *self.link_references.entry(href.to_string()).or_insert(next)
    }

    /// Collected link references in allocation order.
    pub fn link_references(&self) -> impl Iterator<Item = (&str, usize)> {
        self.link_references.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub(crate) fn push_list(&mut self, kind: ListKind, start: u64) {
        self.lists.push(ListFrame {
            kind,
            next_number: start,
            current: None,
        });
    }

    pub(crate) fn pop_list(&mut self) {
        self.lists.pop();
    }

    /// Advance the innermost list to its next item.
    pub(crate) fn next_list_item(&mut self) {
        if let Some(frame) = self.lists.last_mut() {
            frame.current = Some(frame.next_number);
            frame.next_number += 1;
        }
    }

    /// Enter a subtree, switching region flags on (never off).
    pub(crate) fn enter_region(&mut self, verbatim: bool, no_escape: bool) -> Region {
        let saved = Region {
            verbatim: self.verbatim,
            no_escape: self.no_escape,
        };
        self.verbatim |= verbatim;
        self.no_escape |= no_escape;
        saved
    }

    pub(crate) fn leave_region(&mut self, saved: Region) {
        self.verbatim = saved.verbatim;
        self.no_escape = saved.no_escape;
    }

    /// Record that `fragment` was appended to the output.
    pub(crate) fn note_appended(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        if is_whitespace_only(fragment) {
            let added = whitespace_stats(fragment, Position::End);
            self.tail.length += added.length;
            self.tail.newlines += added.newlines;
        } else {
            self.tail = whitespace_stats(fragment, Position::End);
        }
    }

    /// Re-measure the tail after the output was cut or rewritten.
    pub(crate) fn reset_tail(&mut self, output: &str) {
        self.tail = whitespace_stats(output, Position::End);
    }
}
