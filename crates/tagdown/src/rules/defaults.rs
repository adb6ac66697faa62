//! Built-in rules and the default ignore/block tables.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{PostProcess, PostProcessInput, Rule, RuleConfig, RuleContext, RuleSet};
use crate::context::ListKind;
use crate::escape::{count_unescaped_pipes, escape_table_pipes};
use crate::options::{CodeBlockStyle, TranslatorOptions};
use crate::whitespace::{
    collapse_whitespace, indent_continuation, is_whitespace_only, surround, trim_newlines,
};
use crate::Result;

/// Tags dropped together with their subtree.
pub const DEFAULT_IGNORE_ELEMENTS: &[&str] = &[
    "area", "audio", "base", "button", "canvas", "datalist", "embed", "head", "iframe", "input",
    "link", "map", "meta", "noscript", "object", "option", "param", "script", "select", "source",
    "style", "svg", "template", "textarea", "title", "track", "video",
];

/// Tags rendered as blocks separated by a blank line.
pub const DEFAULT_BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "ul",
];

static LANGUAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(?:language|lang)-(\S+)").unwrap());

/// The built-in rule table, layered between the block list and custom rules.
pub fn default_rules() -> RuleSet {
    RuleSet::new()
        .with("br", RuleConfig::new().content("  \n").recurse(false))
        .with(
            "hr",
            RuleConfig::new()
                .content("---")
                .recurse(false)
                .surrounding_newlines(2),
        )
        .with("h1,h2,h3,h4,h5,h6", Rule::factory(heading))
        .with("strong,b", delimited(|o| &o.strong_delimiter))
        .with("em,i", delimited(|o| &o.em_delimiter))
        .with("del,s,strike", delimited(|o| &o.strike_delimiter))
        .with("ol,ul", Rule::factory(list))
        .with("li", Rule::factory(list_item))
        .with(
            "blockquote",
            RuleConfig::new()
                .surrounding_newlines(2)
                .postprocess(blockquote),
        )
        .with("pre", Rule::factory(preformatted))
        .with("code", Rule::factory(inline_code))
        .with("a", Rule::factory(link))
        .with("img", Rule::factory(image))
        .with(
            "table",
            RuleConfig::new().surrounding_newlines(2).postprocess(table),
        )
        .with("thead,tbody,tfoot", RuleConfig::new().surrounding_newlines(0))
        .with(
            "tr",
            RuleConfig::new().surrounding_newlines(1).postprocess(table_row),
        )
        .with("th,td", Rule::factory(table_cell))
        .with(
            "caption,colgroup,col",
            RuleConfig::new().ignore(true).recurse(false),
        )
}

/// Inline emphasis wrapped in a delimiter taken from the options.
fn delimited(delimiter: fn(&TranslatorOptions) -> &String) -> RuleConfig {
    RuleConfig::new()
        .space_if_repeating_char(true)
        .postprocess(move |input| {
            if input.content.is_empty() {
                return Ok(PostProcess::RemoveNode);
            }
            if is_whitespace_only(input.content) {
                return Ok(PostProcess::NoChange);
            }
            Ok(PostProcess::Content(surround(
                input.content,
                delimiter(input.options),
            )))
        })
}

fn heading(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let level = rc.node.tag_name()[1..].parse::<usize>().unwrap_or(1).clamp(1, 6);
    let overlay = RuleConfig::new()
        .prefix(format!("{} ", "#".repeat(level)))
        .surrounding_newlines(2)
        .postprocess(|input| {
            let prefix = input.prefix;
            let text = input.content.strip_prefix(prefix).unwrap_or(input.content);
            let text = text.split('\n').map(str::trim).filter(|l| !l.is_empty());
            let text = text.collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return Ok(PostProcess::RemoveNode);
            }
            Ok(PostProcess::Content(format!("{prefix}{text}")))
        });
    Ok(rc.base_config()?.merge(&overlay))
}

fn list(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    // Nested lists hug their parent item.
    let newlines = if rc.ctx.list_depth() > 0 { 1 } else { 2 };
    Ok(rc
        .base_config()?
        .merge(&RuleConfig::new().surrounding_newlines(newlines)))
}

fn list_item(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let marker = match (rc.ctx.list_kind(), rc.ctx.list_item_number()) {
        (Some(ListKind::Ordered), Some(n)) => format!("{n}. "),
        _ => format!("{} ", rc.options.bullet_marker),
    };
    let overlay = RuleConfig::new()
        .prefix(marker)
        .surrounding_newlines(1)
        .postprocess(|input| {
            let marker = input.prefix;
            let body = input.content.strip_prefix(marker).unwrap_or(input.content);
            if body.trim().is_empty() {
                return Ok(PostProcess::RemoveNode);
            }
            let item = format!("{marker}{}", body.trim_end());
            Ok(PostProcess::Content(indent_continuation(&item, marker_width(marker))))
        });
    Ok(rc.base_config()?.merge(&overlay))
}

/// Columns taken by the list marker at the start of `prefix`, up to and
/// including its first space.
fn marker_width(prefix: &str) -> usize {
    let token = prefix.find(' ').map_or(prefix, |i| &prefix[..=i]);
    token.chars().count()
}

fn blockquote(input: &PostProcessInput<'_>) -> Result<PostProcess> {
    let body = trim_newlines(input.content);
    if is_whitespace_only(body) {
        return Ok(PostProcess::RemoveNode);
    }
    let quoted: Vec<String> = body
        .split('\n')
        .map(|line| match line {
            "" => ">".to_string(),
            l if l.starts_with('>') => format!(">{l}"),
            l => format!("> {l}"),
        })
        .collect();
    Ok(PostProcess::Content(quoted.join("\n")))
}

/// Longest run of `c` in `s`.
fn longest_run(s: &str, c: char) -> usize {
    s.chars()
        .fold((0, 0), |(max, current), ch| {
            if ch == c {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

fn preformatted(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let base = rc.base_config()?;
    let node = rc.node;
    let options = rc.options;

    let mut significant = node.significant_children();
    let code = match (significant.next(), significant.next()) {
        (Some(only), None) if only.is_tag("code") => Some(only),
        _ => None,
    };

    let overlay = RuleConfig::new()
        .no_escape(true)
        .preserve_whitespace(true)
        .surrounding_newlines(2);

    if options.code_block_style == CodeBlockStyle::Indented {
        let overlay = overlay.postprocess(|input| {
            let body = trim_newlines(input.content);
            let indented: Vec<String> = body
                .split('\n')
                .map(|line| {
                    if line.trim().is_empty() {
                        String::new()
                    } else {
                        format!("    {line}")
                    }
                })
                .collect();
            Ok(PostProcess::Content(indented.join("\n")))
        });
        return Ok(base.merge(&overlay));
    }

    let language = code
        .and_then(|c| c.attr("class"))
        .and_then(|class| LANGUAGE_CLASS.captures(class))
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let mut fence = options.code_fence.clone();
    if let Some(fence_char) = fence.chars().next() {
        let run = longest_run(&node.text_content(), fence_char);
        if run >= fence.chars().count() {
            fence = fence_char.to_string().repeat(run + 1);
        }
    }

    let overlay = overlay
        .prefix(format!("{fence}{language}\n"))
        .postfix(format!("\n{fence}"))
        .postprocess(|input| {
            let postfix = input.postfix;
            let body = input.content.strip_suffix(postfix).unwrap_or(input.content);
            let body = body.trim_end_matches('\n');
            Ok(PostProcess::Content(format!("{body}{postfix}")))
        });
    Ok(base.merge(&overlay))
}

fn inline_code(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    if rc.node.parent().is_some_and(|p| p.is_tag("pre")) {
        return rc.base_config();
    }
    let overlay = RuleConfig::new()
        .no_escape(true)
        .space_if_repeating_char(true)
        .postprocess(|input| {
            let code = input.content;
            if code.is_empty() {
                return Ok(PostProcess::RemoveNode);
            }
            let ticks = "`".repeat(longest_run(code, '`') + 1);
            let pad = if code.starts_with('`') || code.ends_with('`') {
                " "
            } else {
                ""
            };
            Ok(PostProcess::Content(format!("{ticks}{pad}{code}{pad}{ticks}")))
        });
    Ok(rc.base_config()?.merge(&overlay))
}

/// Link destination, wrapped in `<>` when it would break the inline form.
fn link_destination(href: &str) -> String {
    if href.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{href}>")
    } else {
        href.to_string()
    }
}

fn link_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => format!(" \"{}\"", t.replace('"', "\\\"")),
        _ => String::new(),
    }
}

fn link(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let base = rc.base_config()?;
    let href = rc.node.attr("href").map(str::trim).unwrap_or_default().to_string();
    if href.is_empty() {
        return Ok(base);
    }

    if rc.options.use_link_reference_definitions {
        let n = rc.ctx.link_reference(&href);
        let overlay = RuleConfig::new().postprocess(move |input| {
            Ok(PostProcess::Content(format!("[{}][{n}]", input.content.trim())))
        });
        return Ok(base.merge(&overlay));
    }

    let title = link_title(rc.node.attr("title"));
    let overlay = RuleConfig::new().postprocess(move |input| {
        let text = input.content.trim();
        if !input.options.use_inline_links
            && title.is_empty()
            && input.node.text_content().trim() == href
        {
            return Ok(PostProcess::Content(format!("<{href}>")));
        }
        Ok(PostProcess::Content(format!(
            "[{text}]({}{title})",
            link_destination(&href)
        )))
    });
    Ok(base.merge(&overlay))
}

fn image(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let base = rc.base_config()?;
    let src = rc.node.attr("src").map(str::trim).unwrap_or_default();
    if src.is_empty() {
        return Ok(base.merge(&RuleConfig::new().ignore(true).recurse(false)));
    }

    let src = match src.find(',') {
        Some(idx) if src.starts_with("data:") && !rc.options.keep_data_images => {
            format!("{}...", &src[..=idx])
        }
        _ => src.to_string(),
    };
    let alt = collapse_whitespace(rc.node.attr("alt").unwrap_or_default())
        .trim()
        .replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]");
    let title = link_title(rc.node.attr("title"));

    Ok(base.merge(
        &RuleConfig::new()
            .content(format!("![{alt}]({}{title})", link_destination(&src)))
            .recurse(false),
    ))
}

/// Cells of a rendered `| a | b |` row, trimmed.
fn split_row(row: &str) -> Vec<String> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = match row.strip_suffix('|') {
        Some(r) if !r.ends_with('\\') => r,
        _ => row,
    };

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut prev = None;
    for c in row.chars() {
        if c == '|' && prev != Some('\\') {
            cells.push(cell.trim().to_string());
            cell.clear();
        } else {
            cell.push(c);
        }
        prev = Some(c);
    }
    cells.push(cell.trim().to_string());
    cells
}

fn join_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn table_row(input: &PostProcessInput<'_>) -> Result<PostProcess> {
    if count_unescaped_pipes(input.content) == 0 {
        return Ok(PostProcess::RemoveNode);
    }
    Ok(PostProcess::Content(join_row(&split_row(input.content))))
}

fn table(input: &PostProcessInput<'_>) -> Result<PostProcess> {
    let rows: Vec<Vec<String>> = input
        .content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .map(split_row)
        .collect();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Ok(PostProcess::RemoveNode);
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, mut row) in rows.into_iter().enumerate() {
        row.resize(columns, String::new());
        lines.push(join_row(&row));
        if i == 0 {
            lines.push(join_row(&vec!["---".to_string(); columns]));
        }
    }
    Ok(PostProcess::Content(lines.join("\n")))
}

fn table_cell(rc: &mut RuleContext<'_>) -> Result<RuleConfig> {
    let first = rc.node.element_index() == 0;
    let overlay = RuleConfig::new()
        .surrounding_newlines(0)
        .postprocess(move |input| {
            let flat = collapse_whitespace(&input.content.replace('\n', " "));
            let cell = escape_table_pipes(flat.trim());
            let cell = if first {
                format!("| {cell} |")
            } else {
                format!(" {cell} |")
            };
            Ok(PostProcess::Content(cell))
        });
    Ok(rc.base_config()?.merge(&overlay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TraversalContext;
    use crate::node::{Document, Node};
    use pretty_assertions::assert_eq;

    fn resolve(rule: &Rule, doc: &Document, path: &[usize], ctx: &mut TraversalContext) -> RuleConfig {
        let mut node = doc.root();
        for &i in path {
            node = node.children().nth(i).unwrap();
        }
        rule.resolve(node, ctx, &TranslatorOptions::default()).unwrap()
    }

    fn run(config: &RuleConfig, doc: &Document, content: &str) -> PostProcess {
        let hook = config.postprocess.as_ref().unwrap();
        let node = doc.root().children().next().unwrap();
        let options = TranslatorOptions::default();
        hook(&PostProcessInput {
            content,
            prefix: config.prefix.as_deref().unwrap_or_default(),
            postfix: config.postfix.as_deref().unwrap_or_default(),
            node,
            options: &options,
        })
        .unwrap()
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("a``b```c`", '`'), 3);
        assert_eq!(longest_run("abc", '`'), 0);
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| a |  b | "), vec!["a", "b"]);
        assert_eq!(split_row("| a\\|b | c |"), vec!["a\\|b", "c"]);
    }

    #[test]
    fn test_table_pads_and_separates() {
        let doc = Document::from(Node::element("table"));
        let config = RuleConfig::new().postprocess(table);
        let out = run(&config, &doc, "| h1 | h2 |\n| a |\n");
        assert_eq!(
            out,
            PostProcess::Content("| h1 | h2 |\n| --- | --- |\n| a |  |".to_string())
        );
        assert_eq!(run(&config, &doc, "stray"), PostProcess::RemoveNode);
    }

    #[test]
    fn test_blockquote_nests() {
        let doc = Document::from(Node::element("blockquote"));
        let config = RuleConfig::new().postprocess(blockquote);
        assert_eq!(
            run(&config, &doc, "\n\na\n\n> b\n"),
            PostProcess::Content("> a\n>\n>> b".to_string())
        );
    }

    #[test]
    fn test_ordered_item_marker() {
        let doc = Document::from(Node::element("ol").with_child(Node::element("li")));
        let mut ctx = TraversalContext::new();
        ctx.push_list(ListKind::Ordered, 3);
        ctx.next_list_item();
        let rule = Rule::factory(list_item);
        let config = resolve(&rule, &doc, &[0, 0], &mut ctx);
        assert_eq!(config.prefix.as_deref(), Some("3. "));
        assert_eq!(
            run(&config, &doc, "3. a\n* b"),
            PostProcess::Content("3. a\n   * b".to_string())
        );
        assert_eq!(run(&config, &doc, "3. "), PostProcess::RemoveNode);
    }

    #[test]
    fn test_marker_width() {
        assert_eq!(marker_width("* "), 2);
        assert_eq!(marker_width("10. "), 4);
        assert_eq!(marker_width("1. [d1] "), 3);
        assert_eq!(marker_width("+"), 1);
    }

    #[test]
    fn test_heading_hook_uses_merged_prefix() {
        let doc = Document::from(Node::element("h1"));
        let mut ctx = TraversalContext::new();
        let config = resolve(&Rule::factory(heading), &doc, &[0], &mut ctx);
        let config = config.merge(&RuleConfig::new().prefix("= "));
        assert_eq!(
            run(&config, &doc, "= T\nitle"),
            PostProcess::Content("= T itle".to_string())
        );
    }

    #[test]
    fn test_fence_grows_past_content() {
        let pre = Node::element("pre").with_child(
            Node::element_with_attrs("code", vec![("class", "language-rust")])
                .with_text("let s = \"```\";"),
        );
        let doc = Document::from(pre);
        let mut ctx = TraversalContext::new();
        let config = resolve(&Rule::factory(preformatted), &doc, &[0], &mut ctx);
        assert_eq!(config.prefix.as_deref(), Some("````rust\n"));
        assert_eq!(config.postfix.as_deref(), Some("\n````"));
        assert_eq!(config.no_escape, Some(true));
    }

    #[test]
    fn test_inline_code_backticks() {
        let doc = Document::from(Node::element("code"));
        let mut ctx = TraversalContext::new();
        let config = resolve(&Rule::factory(inline_code), &doc, &[0], &mut ctx);
        assert_eq!(
            run(&config, &doc, "a`b"),
            PostProcess::Content("``a`b``".to_string())
        );
        assert_eq!(
            run(&config, &doc, "`x"),
            PostProcess::Content("`` `x ``".to_string())
        );
    }

    #[test]
    fn test_data_image_truncated() {
        let img = Node::element_with_attrs("img", vec![("src", "data:image/png;base64,AAAA"), ("alt", "a[b]")]);
        let doc = Document::from(img);
        let mut ctx = TraversalContext::new();
        let config = resolve(&Rule::factory(image), &doc, &[0], &mut ctx);
        assert_eq!(
            config.content.as_deref(),
            Some("![a\\[b\\]](data:image/png;base64,...)")
        );
    }

    #[test]
    fn test_link_destination() {
        assert_eq!(link_destination("https://a.b/c"), "https://a.b/c");
        assert_eq!(link_destination("a b(c)"), "<a b(c)>");
    }
}
