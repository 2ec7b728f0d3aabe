//! Behavioural properties of the Markdown transducer
//!
//! These tests drive the converter end to end (tokenizer + transducer) and
//! through hand-built event streams, checking the output rules and the state
//! invariants that hold for any well-nested document.

use html_to_md_converter::converter::{ConversionState, LINE_BREAK, MarkdownConverter};
use html_to_md_converter::event::ParseEvent;
use html_to_md_converter::parser::tokenize;
use proptest::prelude::*;

fn convert(html: &str) -> html_to_md_converter::ConversionResult {
    MarkdownConverter::new().convert_html(html)
}

fn asset_strings(html: &str) -> Vec<String> {
    convert(html)
        .assets
        .iter()
        .map(|asset| asset.as_str().to_string())
        .collect()
}

/// Title and list items produce heading and bullet lines
#[test]
fn test_title_and_bullets() {
    let markdown = convert("<title>Hi</title><ul><li>a</li><li>b</li></ul>").markdown;

    assert!(markdown.starts_with("# Hi"));
    assert!(markdown.contains(&format!("* a{LINE_BREAK}")));
    assert!(markdown.contains(&format!("* b{LINE_BREAK}")));
}

/// A codeblock div is fenced and its close does not add the generic div break
#[test]
fn test_codeblock_div_fencing() {
    let markdown = convert(r#"<div style="codeblock">x</div>"#).markdown;

    assert_eq!(markdown, "```  \nx```  \n");
    assert_eq!(markdown.matches("```").count(), 2);
    assert!(!markdown.contains("\n\n"));
}

/// Self-closing images use data-filename and record their source once
#[test]
fn test_self_closing_image() {
    let result = convert(r#"<img data-filename="foo" src="img/foo.png"/>"#);

    assert_eq!(result.markdown, "![foo](img/foo.png)");
    assert_eq!(result.assets.len(), 1);
    assert_eq!(result.assets[0].as_str(), "img/foo.png");
}

/// Images inside links are wrapped, images outside are not
#[test]
fn test_image_link_wrapping() {
    let linked = convert(r#"<a href="pic-large.png"><img src="pic.png" alt="cat"></a>"#);
    assert_eq!(linked.markdown, "[![cat](pic.png)](pic-large.png)");

    let plain = convert(r#"<img src="pic.png" alt="cat">"#);
    assert_eq!(plain.markdown, "![cat](pic.png)");
}

/// Images are always assets, whether or not the enclosing link is
#[test]
fn test_image_source_always_recorded() {
    assert_eq!(
        asset_strings(r#"<a href="https://example.com"><img src="pic.png"></a>"#),
        vec!["pic.png"]
    );
    assert_eq!(
        asset_strings(r#"<a href="gallery.zip"><img src="pic.png"></a>"#),
        vec!["gallery.zip", "pic.png"]
    );
}

/// Nested lists number independently
#[test]
fn test_nested_ordered_lists_restart() {
    let markdown = convert(
        "<ol><li>one</li><li>two<ol><li>inner</li></ol></li></ol><ol><li>again</li></ol>",
    )
    .markdown;

    assert!(markdown.contains("1. one"));
    assert!(markdown.contains("2. two"));
    assert!(markdown.contains("1. inner"));
    assert!(markdown.contains("1. again"));
}

/// A style tag inside an ignored block stays silent after both close
#[test]
fn test_suppression_inside_ignore_block() {
    let markdown = convert(r#"<div class="wrap"><style>x</style>y</div>z"#).markdown;
    assert_eq!(markdown, "z");
}

/// Script bodies are dropped even when they contain markup-like text
#[test]
fn test_script_content_removed() {
    let markdown = convert(
        r#"<p>Before</p><script>if (a < b) { document.write("<b>x</b>"); }</script><p>After</p>"#,
    )
    .markdown;

    assert!(!markdown.contains("document"));
    assert!(!markdown.contains("**"));
    assert!(markdown.contains("Before"));
    assert!(markdown.contains("After"));
}

/// Hand-built event streams follow the same rules as tokenized HTML
#[test]
fn test_event_stream_conversion() {
    let events = vec![
        ParseEvent::start("h2"),
        ParseEvent::text("Files"),
        ParseEvent::start("ul"),
        ParseEvent::start("li"),
        ParseEvent::start_with("a", [("href", "report.pdf")]),
        ParseEvent::text("Report"),
        ParseEvent::end("a"),
        ParseEvent::end("li"),
        ParseEvent::end("ul"),
    ];
    let result = MarkdownConverter::new().convert(events);

    assert_eq!(result.markdown, "## Files  \n* [Report](report.pdf)  \n");
    assert_eq!(result.assets[0].as_str(), "report.pdf");
}

fn href_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        "[a-z]{1,8}\\.(png|pdf|zip)".prop_map(|s| (s, true)),
        "[a-z]{1,8}/[a-z]{1,8}\\.txt".prop_map(|s| (s, true)),
        "[a-z]{1,8}".prop_map(|s| (format!("http://{s}.org/x.png"), false)),
        "[a-z]{1,8}".prop_map(|s| (format!("https://{s}.org"), false)),
        "[a-z]{1,8}".prop_map(|s| (format!("{s}.html"), false)),
        "[a-z]{1,8}".prop_map(|s| (format!("mailto:{s}@example.com"), false)),
        "[a-z]{1,8}".prop_map(|s| (format!("{s}@example.com"), false)),
    ]
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Div(Option<&'static str>, Vec<Node>),
    List(bool, Vec<Vec<Node>>),
    Link(String, Vec<Node>),
    Bold(Vec<Node>),
    Style(String),
    Pre(String),
}

fn render(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Div(attr, children) => {
            match attr {
                Some(attr) => out.push_str(&format!("<div {attr}>")),
                None => out.push_str("<div>"),
            }
            children.iter().for_each(|child| render(child, out));
            out.push_str("</div>");
        }
        Node::List(ordered, items) => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push_str(&format!("<{tag}>"));
            for item in items {
                out.push_str("<li>");
                item.iter().for_each(|child| render(child, out));
                out.push_str("</li>");
            }
            out.push_str(&format!("</{tag}>"));
        }
        Node::Link(href, children) => {
            out.push_str(&format!(r#"<a href="{href}">"#));
            children.iter().for_each(|child| render(child, out));
            out.push_str("</a>");
        }
        Node::Bold(children) => {
            out.push_str("<b>");
            children.iter().for_each(|child| render(child, out));
            out.push_str("</b>");
        }
        Node::Style(css) => out.push_str(&format!("<style>{css}</style>")),
        Node::Pre(code) => out.push_str(&format!("<pre>{code}</pre>")),
    }
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        "[a-z ]{1,12}".prop_map(Node::Text),
        "[a-z{}:;]{1,12}".prop_map(Node::Style),
        "[a-z =;]{1,12}".prop_map(Node::Pre),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        let div_attr = prop_oneof![
            Just(None),
            Just(Some(r#"style="codeblock""#)),
            Just(Some(r#"class="wrapper""#)),
        ];
        prop_oneof![
            (div_attr, prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(attr, children)| Node::Div(attr, children)),
            (
                any::<bool>(),
                prop::collection::vec(prop::collection::vec(inner.clone(), 0..3), 0..4)
            )
                .prop_map(|(ordered, items)| Node::List(ordered, items)),
            ("[a-z]{1,8}\\.png", prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(href, children)| Node::Link(href, children)),
            prop::collection::vec(inner, 0..3).prop_map(Node::Bold),
        ]
    })
}

proptest! {
    /// Well-nested documents leave no open state behind
    #[test]
    fn prop_well_nested_input_settles(nodes in prop::collection::vec(node_strategy(), 0..6)) {
        let mut html = String::new();
        nodes.iter().for_each(|node| render(node, &mut html));

        let mut state = ConversionState::new();
        for event in tokenize(&html) {
            state.handle_event(&event);
        }

        prop_assert!(state.is_settled(), "unsettled after {}: {:?}", html, state.frames());
        prop_assert_eq!(state.block_depth(), 0);
        prop_assert!(state.link_target().is_none());
        prop_assert!(!state.in_code_block());
    }

    /// Sibling items of an ordered list are numbered 1..=n
    #[test]
    fn prop_ordered_list_numbering(items in prop::collection::vec("[a-z]{1,10}", 1..12)) {
        let mut html = String::from("<ol>");
        for item in &items {
            html.push_str(&format!("<li>{item}</li>"));
        }
        html.push_str("</ol>");

        let markdown = convert(&html).markdown;
        for (index, item) in items.iter().enumerate() {
            let expected = format!("{}. {}{}", index + 1, item, LINE_BREAK);
            prop_assert!(markdown.contains(&expected), "missing {:?} in {:?}", expected, markdown);
        }
    }

    /// Only local hrefs become assets
    #[test]
    fn prop_href_classification((href, is_asset) in href_strategy()) {
        let html = format!(r#"<a href="{href}">link</a>"#);
        let assets = asset_strings(&html);

        if is_asset {
            prop_assert_eq!(assets, vec![href]);
        } else {
            prop_assert!(assets.is_empty());
        }
    }

    /// Text inside style or svg never reaches the output
    #[test]
    fn prop_non_content_text_is_dropped(
        secret in "[A-Z]{6,12}",
        visible in "[a-z]{1,10}",
        wrapper in prop::sample::select(vec!["style", "svg"]),
        nested in any::<bool>(),
    ) {
        let inner = if nested && wrapper == "svg" {
            format!("<symbol><path>{secret}</path></symbol><b>{secret}</b>{secret}")
        } else {
            secret.clone()
        };
        let html = format!("{visible}<{wrapper}>{inner}</{wrapper}>{visible}");
        let markdown = convert(&html).markdown;

        prop_assert!(!markdown.contains(&secret));
        prop_assert!(markdown.contains(&visible));
    }

    /// Output is deterministic for identical input
    #[test]
    fn prop_deterministic_output(nodes in prop::collection::vec(node_strategy(), 0..4)) {
        let mut html = String::new();
        nodes.iter().for_each(|node| render(node, &mut html));

        prop_assert_eq!(convert(&html), convert(&html));
    }
}
