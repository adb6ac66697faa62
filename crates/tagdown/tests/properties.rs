use proptest::prelude::*;
use tagdown::{Translator, TranslatorOptions};

fn fragment() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("<p>para</p>"),
        Just("<div>"),
        Just("</div>"),
        Just("\n\n\n\n"),
        Just("<br><br><br>"),
        Just("<h2>head</h2>"),
        Just("<ul><li>a</li><li><p>b</p><p>c</p></li></ul>"),
        Just("<ol><li>x<ol><li>y</li></ol></li></ol>"),
        Just("<ul><li><ul><li>x</li></ul></li></ul>"),
        Just("<ul><li><div><p>x</p></div></li></ul>"),
        Just("<ol><li><span><p>x</p></span></li></ol>"),
        Just("<pre>x\n\n\n\n\n\ny</pre>"),
        Just("<blockquote><p>q</p>\n\n<p>r</p></blockquote>"),
        Just("<b>bold</b>"),
        Just("text * _ #"),
        Just("<table><tr><td>1</td></tr></table>"),
    ]
}

/// Longest run of blank lines in `s`.
fn longest_blank_run(s: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for line in s.split('\n') {
        if line.trim().is_empty() {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

proptest! {
    #[test]
    fn prop_translation_is_deterministic(parts in prop::collection::vec(fragment(), 0..12)) {
        let html = parts.concat();
        let translator = Translator::new(TranslatorOptions::default(), None).unwrap();
        let first = translator.translate(&html).unwrap();
        let second = translator.translate(&html).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_blank_lines_are_bounded(
        parts in prop::collection::vec(fragment(), 0..12),
        max in 0usize..5,
    ) {
        let html = parts.concat();
        let options = TranslatorOptions::default().with_max_consecutive_newlines(max);
        let out = Translator::new(options, None).unwrap().translate(&html).unwrap();
        let allowed = max.max(1) - 1;
        prop_assert!(
            longest_blank_run(&out) <= allowed,
            "{:?} has more than {} blank lines in a row",
            out,
            allowed
        );
        prop_assert_eq!(out.trim_end(), out.as_str());
    }
}
