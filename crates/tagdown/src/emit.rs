//! The tree walker that turns a [`Document`] into Markdown.
//!
//! Output is written into one growing buffer. Each element records where its
//! contribution starts so its postprocess hook can take that slice back out,
//! rewrite it, or drop it together with the line breaks it asked for.

use crate::context::{ListKind, TraversalContext};
use crate::escape::escape_markdown;
use crate::node::{Document, NodeRef, NodeType};
use crate::options::TranslatorOptions;
use crate::rules::{PostProcess, PostProcessInput, Registry};
use crate::whitespace::{
    collapse_whitespace, is_html_whitespace, is_whitespace_only, limit_newlines,
    trim_leading_blank_lines, trim_trailing_spaces,
};
use crate::Result;

/// Render `doc` with `registry`. A fresh traversal context is used for every
/// call.
pub fn emit(doc: &Document, options: &TranslatorOptions, registry: &Registry) -> Result<String> {
    let mut emitter = Emitter {
        registry,
        options,
        ctx: TraversalContext::new(),
        out: String::new(),
        anchor: None,
        floor: 0,
    };
    emitter.visit_children(doc.root())?;
    emitter.append_link_references();
    Ok(emitter.finish())
}

/// End of the innermost open prefix. Block children do not break the line
/// while the output still ends there.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    end: usize,
    /// The prefix itself opened an output line, so text right after it does
    /// too.
    line_start: bool,
}

struct Emitter<'a> {
    registry: &'a Registry,
    options: &'a TranslatorOptions,
    ctx: TraversalContext,
    out: String,
    anchor: Option<Anchor>,
    /// Start of the innermost open element's content. Trimming before a line
    /// break never reaches below it.
    floor: usize,
}

impl Emitter<'_> {
    /// Visit the children of `node` in order.
    fn visit_children(&mut self, node: NodeRef<'_>) -> Result<()> {
        for child in node.children() {
            match child.node_type() {
                NodeType::Text => self.visit_text(child),
                NodeType::Element => self.visit_element(child)?,
                NodeType::DocumentFragment => self.visit_children(child)?,
            }
        }
        Ok(())
    }

    fn visit_text(&mut self, node: NodeRef<'_>) {
        let raw = node.text().unwrap_or_default();
        if raw.is_empty() {
            return;
        }

        if self.ctx.in_verbatim() {
            self.push(raw);
            return;
        }

        let collapsed = collapse_whitespace(raw);
        if is_whitespace_only(&collapsed) {
            if !self.out.is_empty() && self.ctx.tail().length == 0 {
                self.push(" ");
            }
            return;
        }

        let text = if self.ctx.tail().length > 0 || self.out.is_empty() {
            collapsed.trim_start_matches(is_html_whitespace)
        } else {
            collapsed.as_str()
        };

        let mut text = if self.ctx.no_escape() || self.options.no_escape {
            text.to_string()
        } else {
            escape_markdown(text, self.at_line_start())
        };
        for (pattern, replacement) in &self.options.text_replace {
            text = pattern.replace_all(&text, replacement.as_str()).into_owned();
        }
        self.push(&text);
    }

    fn visit_element(&mut self, node: NodeRef<'_>) -> Result<()> {
        let tag = node.tag_name();
        let list_kind = match tag.as_str() {
            "ol" => Some(ListKind::Ordered),
            "ul" => Some(ListKind::Unordered),
            _ => None,
        };
        if tag == "li" {
            self.ctx.next_list_item();
        }

        let rule = self.registry.resolve(&tag);
        if rule.is_factory() {
            tracing::trace!(tag = %tag, "resolving rule through factory");
        }
        let config = rule.resolve(node, &mut self.ctx, self.options)?;

        if config.is_ignored() {
            // Ignored but recursing nodes are transparent.
            if config.should_recurse() {
                self.visit_children(node)?;
            }
            return Ok(());
        }

        let newlines = config.newlines();
        let mark = self.append_newlines(newlines);
        let start = self.out.len();

        let region = self.ctx.enter_region(
            config.preserve_whitespace.unwrap_or(false),
            config.no_escape.unwrap_or(false),
        );

        let prefix = config.prefix.as_deref().unwrap_or_default();
        let postfix = config.postfix.as_deref().unwrap_or_default();
        let (outer_anchor, outer_floor) = (self.anchor, self.floor);
        if !prefix.is_empty() {
            let line_start = self.at_line_start();
            self.push(prefix);
            self.anchor = Some(Anchor {
                end: self.out.len(),
                line_start,
            });
        }
        self.floor = self.out.len();

        let visited = if let Some(content) = &config.content {
            self.push(content);
            Ok(())
        } else if config.should_recurse() {
            match list_kind {
                Some(kind) => {
                    let first = node
                        .attr("start")
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(1);
                    self.ctx.push_list(kind, first);
                    let visited = self.visit_children(node);
                    self.ctx.pop_list();
                    visited
                }
                None => self.visit_children(node),
            }
        } else {
            Ok(())
        };
        self.anchor = outer_anchor;
        self.floor = outer_floor;
        visited?;

        self.push(postfix);
        self.ctx.leave_region(region);

        if let Some(hook) = &config.postprocess {
            let composed = self.out.split_off(start);
            let outcome = hook(&PostProcessInput {
                content: &composed,
                prefix,
                postfix,
                node,
                options: self.options,
            })?;
            match outcome {
                PostProcess::NoChange => self.out.push_str(&composed),
                PostProcess::Content(replaced) => self.out.push_str(&replaced),
                PostProcess::RemoveNode => {
                    tracing::trace!(tag = %tag, "node removed by postprocess");
                    self.out.truncate(mark);
                    self.ctx.reset_tail(&self.out);
                    return Ok(());
                }
            }
            self.ctx.reset_tail(&self.out);
        }

        if config.space_if_repeating_char.unwrap_or(false) && start > 0 {
            let before = self.out[..start].chars().next_back();
            let first = self.out[start..].chars().next();
            if before.is_some() && before == first {
                self.out.insert(start, ' ');
            }
        }

        self.append_newlines(newlines);
        Ok(())
    }

    /// Whether the output ends right after the innermost open prefix.
    fn at_anchor(&self) -> bool {
        self.anchor.is_some_and(|a| a.end == self.out.len())
    }

    /// Whether the next text begins an output line, either after a line
    /// break or right after a prefix that itself opened the line (`* `).
    fn at_line_start(&self) -> bool {
        self.out.is_empty()
            || self.out.ends_with('\n')
            || self
                .anchor
                .is_some_and(|a| a.line_start && a.end == self.out.len())
    }

    /// Make sure the output ends with at least `n` line breaks and return the
    /// offset the breaks start at.
    fn append_newlines(&mut self, n: usize) -> usize {
        if n == 0 || self.out.is_empty() || self.at_anchor() {
            return self.out.len();
        }
        if !self.ctx.in_verbatim() {
            trim_trailing_spaces(&mut self.out, self.floor);
            self.ctx.reset_tail(&self.out);
            if self.at_anchor() {
                return self.out.len();
            }
        }
        let mark = self.out.len();
        let have = self.ctx.tail().newlines;
        if have < n {
            self.push(&"\n".repeat(n - have));
        }
        mark
    }

    fn push(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.out.push_str(fragment);
        self.ctx.note_appended(fragment);
    }

    fn append_link_references(&mut self) {
        let definitions: Vec<String> = self
            .ctx
            .link_references()
            .map(|(href, n)| format!("[{n}]: {href}"))
            .collect();
        if definitions.is_empty() {
            return;
        }
        self.append_newlines(2);
        let joined = definitions.join("\n");
        self.push(&joined);
    }

    fn finish(self) -> String {
        let body = trim_leading_blank_lines(&self.out).trim_end();
        limit_newlines(body, self.options.max_consecutive_newlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::rules::{Rule, RuleConfig, RuleSet};
    use crate::TranslateError;
    use pretty_assertions::assert_eq;

    fn render(node: Node) -> String {
        render_with(node, TranslatorOptions::default(), None)
    }

    fn render_with(node: Node, options: TranslatorOptions, custom: Option<RuleSet>) -> String {
        let registry = Registry::build(&options, custom.as_ref()).unwrap();
        emit(&Document::from(node), &options, &registry).unwrap()
    }

    fn p(text: &str) -> Node {
        Node::element("p").with_text(text)
    }

    #[test]
    fn test_paragraphs_are_separated_once() {
        let root = Node::fragment()
            .with_child(p("one"))
            .with_text("\n\n\n   \n")
            .with_child(p("two"));
        assert_eq!(render(root), "one\n\ntwo");
    }

    #[test]
    fn test_inline_whitespace_collapses() {
        let root = p("  a \n\t b  ").with_child(Node::element("em").with_text(" c "));
        assert_eq!(render(root), "a b _c_");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render(p("# not a *heading*")), "\\# not a \\*heading\\*");
    }

    #[test]
    fn test_unknown_tag_is_transparent() {
        let root = p("a ").with_child(Node::element("x-widget").with_text("b"));
        assert_eq!(render(root), "a b");
    }

    #[test]
    fn test_nested_lists() {
        let inner = Node::element("ol")
            .with_child(Node::element("li").with_text("x"))
            .with_child(Node::element("li").with_text("y"));
        let root = Node::element("ul")
            .with_child(Node::element("li").with_text("a").with_child(inner))
            .with_child(Node::element("li").with_text("b"));
        assert_eq!(render(root), "* a\n  1. x\n  2. y\n* b");
    }

    #[test]
    fn test_ordered_list_start() {
        let root = Node::element_with_attrs("ol", vec![("start", "4")])
            .with_child(Node::element("li").with_text("d"))
            .with_child(Node::element("li").with_text("e"));
        assert_eq!(render(root), "4. d\n5. e");
    }

    #[test]
    fn test_paragraph_inside_item_stays_on_marker_line() {
        let root = Node::element("ul").with_child(Node::element("li").with_child(p("a")));
        assert_eq!(render(root), "* a");
    }

    #[test]
    fn test_nested_list_without_item_text() {
        let inner = Node::element("ul").with_child(Node::element("li").with_text("x"));
        let root = Node::element("ul").with_child(Node::element("li").with_child(inner));
        assert_eq!(render(root), "* * x");
    }

    #[test]
    fn test_block_in_item_through_wrapper() {
        let root = Node::element("ul")
            .with_child(Node::element("li").with_child(Node::element("div").with_child(p("x"))));
        assert_eq!(render(root), "* x");

        let root = Node::element("ol")
            .with_child(Node::element("li").with_child(Node::element("span").with_child(p("x"))))
            .with_child(Node::element("li").with_text("y"));
        assert_eq!(render(root), "1. x\n2. y");
    }

    #[test]
    fn test_text_after_marker_is_escaped() {
        let root = Node::element("ul")
            .with_child(Node::element("li").with_text("# x"))
            .with_child(Node::element("li").with_text("1. y"))
            .with_child(Node::element("li").with_text("- z"))
            .with_child(Node::element("li").with_text("> q"));
        assert_eq!(render(root), "* \\# x\n* 1\\. y\n* \\- z\n* \\> q");
    }

    #[test]
    fn test_text_after_inline_prefix_is_not_line_start() {
        let custom = RuleSet::new().with("kbd", RuleConfig::new().prefix("[").postfix("]"));
        let root = p("press ").with_child(Node::element("kbd").with_text("- K"));
        assert_eq!(
            render_with(root, TranslatorOptions::default(), Some(custom)),
            "press [- K]"
        );
    }

    #[test]
    fn test_block_in_inline_keeps_earlier_offsets() {
        let root = p("a ").with_child(Node::element("b").with_child(p("x")));
        assert_eq!(render(root), "a \n\n**x**");
    }

    #[test]
    fn test_menu_items_get_bullets() {
        let root = Node::element("menu")
            .with_child(Node::element("li").with_text("a"))
            .with_child(Node::element("li").with_text("b"));
        assert_eq!(render(root), "* a\n* b");
    }

    #[test]
    fn test_ignore_with_recurse_is_transparent() {
        let custom = RuleSet::new().with("section", RuleConfig::new().ignore(true).recurse(true));
        let root = Node::fragment()
            .with_child(p("before"))
            .with_child(Node::element("section").with_child(p("inside")))
            .with_child(p("after"));
        assert_eq!(
            render_with(root, TranslatorOptions::default(), Some(custom)),
            "before\n\ninside\n\nafter"
        );
    }

    #[test]
    fn test_ignore_wins_over_postprocess() {
        let custom = RuleSet::new().with(
            "span",
            RuleConfig::new()
                .ignore(true)
                .postprocess(|_| Ok(PostProcess::Content("never".to_string()))),
        );
        let root = p("a").with_child(Node::element("span").with_text("b"));
        assert_eq!(render_with(root, TranslatorOptions::default(), Some(custom)), "a");
    }

    #[test]
    fn test_remove_node_drops_its_newlines() {
        let root = Node::fragment()
            .with_child(p("a"))
            .with_child(Node::element("h2"))
            .with_child(Node::element("b").with_text("c"));
        assert_eq!(render(root), "a\n\n**c**");
    }

    #[test]
    fn test_repeating_delimiters_get_a_space() {
        let root = p("")
            .with_child(Node::element("b").with_text("a"))
            .with_child(Node::element("b").with_text("b"));
        assert_eq!(render(root), "**a** **b**");
    }

    #[test]
    fn test_verbatim_keeps_spaces() {
        let root = Node::element("pre").with_text("x  \n  y");
        assert_eq!(render(root), "```\nx  \n  y\n```");
    }

    #[test]
    fn test_link_reference_definitions() {
        let link = |text: &str, href: &str| {
            Node::element_with_attrs("a", vec![("href", href)]).with_text(text)
        };
        let root = p("")
            .with_child(link("one", "https://a"))
            .with_text(" and ")
            .with_child(link("again", "https://a"))
            .with_text(" ")
            .with_child(link("two", "https://b"));
        let options = TranslatorOptions::default().with_link_reference_definitions(true);
        assert_eq!(
            render_with(root, options, None),
            "[one][1] and [again][1] [two][2]\n\n[1]: https://a\n[2]: https://b"
        );
    }

    #[test]
    fn test_postprocess_error_propagates() {
        let custom = RuleSet::new().with(
            "p",
            RuleConfig::new().postprocess(|_| Err(TranslateError::postprocess("p", "boom"))),
        );
        let options = TranslatorOptions::default();
        let registry = Registry::build(&options, Some(&custom)).unwrap();
        let err = emit(&Document::from(p("x")), &options, &registry).unwrap_err();
        assert!(matches!(err, TranslateError::PostProcess { .. }));
    }

    #[test]
    fn test_factory_error_propagates() {
        let custom = RuleSet::new().with(
            "p",
            Rule::factory(|_| Err(TranslateError::factory("p", "bad"))),
        );
        let options = TranslatorOptions::default();
        let registry = Registry::build(&options, Some(&custom)).unwrap();
        let err = emit(&Document::from(p("x")), &options, &registry).unwrap_err();
        assert!(matches!(err, TranslateError::Factory { .. }));
    }

    #[test]
    fn test_newline_cap() {
        let custom = RuleSet::new().with("p", RuleConfig::new().surrounding_newlines(5));
        let root = Node::fragment().with_child(p("a")).with_child(p("b"));
        let options = TranslatorOptions::default().with_max_consecutive_newlines(2);
        assert_eq!(render_with(root, options, Some(custom)), "a\n\nb");
    }
}
