//! Markdown converter - transforms a parse event stream into Markdown
//!
//! This module holds the core of the crate: a single-pass state machine that
//! consumes [`ParseEvent`]s one at a time, appends Markdown fragments to an
//! output buffer and records the local files the document references.
//!
//! # Conversion Strategy
//!
//! Each event kind has a handler. Elements that open a special region (code
//! blocks, ignored wrapper blocks, links, lists, non-content elements) push a
//! [`Frame`] onto a stack; the matching close event pops it and restores the
//! enclosing state. Close events are matched by kind, so a `</div>` always
//! pairs with the innermost open `div` no matter how the divs are nested.
//!
//! # Element Rules
//!
//! | Element | Open | Close |
//! |---|---|---|
//! | `title`, `h1` | `# ` | |
//! | `h2` / `h3` | `## ` / `### ` | |
//! | `b`, `strong` | `**` | `**` + line break |
//! | `ul`, `ol` | line break | |
//! | `li` | `* ` or `<n>. ` | line break |
//! | `div style="..codeblock.."` | fence + line break | fence + line break |
//! | `div class=".."` | drop all content | |
//! | other `div` | | line break |
//! | `pre` | fence + line break | fence + line break |
//! | `a href` | wrap text as `[text](href)` | |
//! | `img` | `![alt](src)` or `[![alt](src)](href)` | |
//! | `<img/>` | `![data-filename](src)` | |
//! | `br` | line break | |
//! | `hr` | thematic break | |
//! | `style`, `script`, `svg`, ... | drop text | |
//!
//! A line break is two trailing spaces followed by a newline.
//!
//! # Mode Composition
//!
//! - Inside an ignored `div`, nothing is emitted and no assets are recorded,
//!   but nesting is still tracked.
//! - Inside a non-content element, text is dropped; markup is still emitted.
//! - Otherwise text inside a link becomes `[text](href)`, and plain text is
//!   appended verbatim.
//!
//! # Graceful Degradation
//!
//! The converter never fails. A close event without a matching open is
//! ignored (a stray `</div>` still emits its line break), and frames left open
//! above a matched close are discarded.
//!
//! # Examples
//!
//! ```rust
//! use html_to_md_converter::converter::MarkdownConverter;
//!
//! let converter = MarkdownConverter::new();
//! let result = converter.convert_html("<title>Hi</title><ul><li>a</li><li>b</li></ul>");
//!
//! assert_eq!(result.markdown, "# Hi  \n* a  \n* b  \n");
//! assert!(result.assets.is_empty());
//! ```

use std::fmt;
use std::path::Path;

use crate::error::ConversionError;
use crate::event::{Attributes, ParseEvent};
use crate::parser::parse_events;

/// Soft line break: two trailing spaces and a newline
pub const LINE_BREAK: &str = "  \n";

/// Fenced code block delimiter
pub const CODE_FENCE: &str = "```";

/// Thematic break; followed by a line break when emitted
const THEMATIC_BREAK: &str = "\n***\n";

/// Alt text for `img` elements without an `alt` attribute
pub const ALT_PLACEHOLDER: &str = "Placeholder";

/// Substring of a `div` style attribute that marks a code block
const CODEBLOCK_STYLE_MARKER: &str = "codeblock";

/// Elements whose text never reaches the output
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "style", "script", "noscript", "svg", "symbol", "path", "defs", "use",
];

/// A local file referenced from `href` or `src`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetReference(String);

impl AssetReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether an `href` points to a local file that should travel with the document
///
/// Web URLs, links to other HTML pages and mail addresses stay behind.
/// An empty reference names no file.
pub fn is_local_asset(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    !(href.is_empty()
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.ends_with(".html")
        || href.contains('@'))
}

/// Markdown output and referenced assets of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    /// Converted Markdown text
    pub markdown: String,
    /// Local asset paths in document order, not deduplicated
    pub assets: Vec<AssetReference>,
}

/// Kind of the list currently receiving items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListKind {
    #[default]
    None,
    Unordered,
    Ordered,
}

/// The active list and its item counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListContext {
    pub kind: ListKind,
    pub counter: u32,
}

/// What an open `div` means for its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivMode {
    Plain,
    CodeBlock,
    Ignore,
}

/// An open element that changes how later events are handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Div(DivMode),
    /// `pre`
    CodeElement,
    /// `a`, with the link target to restore on close
    Link(Option<String>),
    /// `ul`/`ol`, with the list context to restore on close
    List(ListContext),
    /// A non-content element
    Suppress(String),
}

/// Mutable state of one conversion
///
/// Feed events with [`ConversionState::handle_event`] and take the result with
/// [`ConversionState::finish`]. A state converts exactly one document.
#[derive(Debug, Default)]
pub struct ConversionState {
    output: String,
    assets: Vec<AssetReference>,
    list: ListContext,
    link: Option<String>,
    frames: Vec<Frame>,
    div_depth: usize,
    code_depth: usize,
    ignore_depth: usize,
    suppress_depth: usize,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event
    pub fn handle_event(&mut self, event: &ParseEvent) {
        match event {
            ParseEvent::StartTag { name, attrs } => self.handle_start(name, attrs),
            ParseEvent::EndTag { name } => self.handle_end(name),
            ParseEvent::SelfClosingTag { name, attrs } => self.handle_self_closing(name, attrs),
            ParseEvent::Text(data) => self.handle_text(data),
        }
    }

    /// Markdown produced so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Assets recorded so far
    pub fn assets(&self) -> &[AssetReference] {
        &self.assets
    }

    /// Number of open `div` elements
    pub fn block_depth(&self) -> usize {
        self.div_depth
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn list(&self) -> ListContext {
        self.list
    }

    pub fn in_code_block(&self) -> bool {
        self.code_depth > 0
    }

    /// Target of the innermost open link
    pub fn link_target(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Inside an ignored block: all output is dropped
    pub fn is_ignoring(&self) -> bool {
        self.ignore_depth > 0
    }

    /// Text is currently dropped
    pub fn is_suppressing_text(&self) -> bool {
        self.ignore_depth > 0 || self.suppress_depth > 0
    }

    /// Every opened region has been closed and the list context is back to its
    /// initial value
    pub fn is_settled(&self) -> bool {
        self.frames.is_empty() && self.list == ListContext::default() && self.link.is_none()
    }

    /// Consume the state and return the conversion result
    pub fn finish(self) -> ConversionResult {
        if !self.frames.is_empty() {
            tracing::debug!(open = self.frames.len(), "document ended with unclosed elements");
        }
        ConversionResult {
            markdown: self.output,
            assets: self.assets,
        }
    }

    fn emit(&mut self, fragment: &str) {
        if !self.is_ignoring() {
            self.output.push_str(fragment);
        }
    }

    fn record_asset(&mut self, path: &str) {
        if path.is_empty() || self.is_ignoring() {
            return;
        }
        self.assets.push(AssetReference::new(path));
    }

    fn handle_start(&mut self, name: &str, attrs: &Attributes) {
        match name {
            "title" | "h1" => self.emit("# "),
            "h2" => self.emit("## "),
            "h3" => self.emit("### "),
            "b" | "strong" => self.emit("**"),
            "ul" => self.open_list(ListKind::Unordered),
            "ol" => self.open_list(ListKind::Ordered),
            "li" => self.handle_list_item(),
            "div" => self.open_div(attrs),
            "pre" => {
                self.push_frame(Frame::CodeElement);
                self.emit_fence();
            }
            "a" => {
                let href = attrs.required("href");
                if is_local_asset(href) {
                    self.record_asset(href);
                }
                let outer = self.link.replace(href.to_string());
                self.push_frame(Frame::Link(outer));
            }
            "img" => self.handle_image(attrs),
            "br" => self.emit(LINE_BREAK),
            "hr" => self.emit_thematic_break(),
            _ if NON_CONTENT_ELEMENTS.contains(&name) => {
                self.push_frame(Frame::Suppress(name.to_string()));
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &str) {
        match name {
            "b" | "strong" => {
                self.emit("**");
                self.emit(LINE_BREAK);
            }
            "li" => self.emit(LINE_BREAK),
            "ul" | "ol" => {
                self.close(|f| matches!(f, Frame::List(_)));
            }
            "div" => self.close_div(),
            "pre" => {
                if self.close(|f| matches!(f, Frame::CodeElement)).is_some() {
                    self.emit_fence();
                }
            }
            "a" => {
                self.close(|f| matches!(f, Frame::Link(_)));
            }
            _ if NON_CONTENT_ELEMENTS.contains(&name) => {
                self.close(|f| matches!(f, Frame::Suppress(tag) if tag == name));
            }
            _ => {}
        }
    }

    fn handle_self_closing(&mut self, name: &str, attrs: &Attributes) {
        match name {
            "br" => self.emit(LINE_BREAK),
            "hr" => self.emit_thematic_break(),
            "img" => {
                // The self-closing form names the image by data-filename and
                // never wraps it in the enclosing link.
                let filename = attrs.required("data-filename");
                let src = attrs.required("src");
                self.record_asset(src);
                let fragment = format!("![{filename}]({src})");
                self.emit(&fragment);
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, data: &str) {
        if self.is_suppressing_text() {
            return;
        }
        let fragment = match self.link_target() {
            Some(target) => format!("[{data}]({target})"),
            None => data.to_string(),
        };
        self.emit(&fragment);
    }

    fn handle_image(&mut self, attrs: &Attributes) {
        let src = attrs.required("src");
        let alt = attrs.get_or("alt", ALT_PLACEHOLDER);
        self.record_asset(src);

        let fragment = match self.link_target() {
            Some(target) => format!("[![{alt}]({src})]({target})"),
            None => format!("![{alt}]({src})"),
        };
        self.emit(&fragment);
    }

    fn open_list(&mut self, kind: ListKind) {
        self.push_frame(Frame::List(self.list));
        self.list = ListContext { kind, counter: 0 };
        self.emit(LINE_BREAK);
    }

    fn handle_list_item(&mut self) {
        match self.list.kind {
            ListKind::Unordered => self.emit("* "),
            ListKind::Ordered => {
                self.list.counter += 1;
                let marker = format!("{}. ", self.list.counter);
                self.emit(&marker);
            }
            ListKind::None => {}
        }
    }

    fn open_div(&mut self, attrs: &Attributes) {
        let is_codeblock = attrs
            .get("style")
            .is_some_and(|style| style.contains(CODEBLOCK_STYLE_MARKER));

        let mode = if is_codeblock {
            DivMode::CodeBlock
        } else if attrs.contains("class") {
            DivMode::Ignore
        } else {
            DivMode::Plain
        };

        self.push_frame(Frame::Div(mode));
        if mode == DivMode::CodeBlock {
            self.emit_fence();
        }
    }

    fn close_div(&mut self) {
        match self.close(|f| matches!(f, Frame::Div(_))) {
            Some(Frame::Div(DivMode::CodeBlock)) => self.emit_fence(),
            Some(Frame::Div(DivMode::Ignore)) => {}
            Some(_) => self.emit(LINE_BREAK),
            None => {
                tracing::debug!("closing div without an open div");
                self.emit(LINE_BREAK);
            }
        }
    }

    fn emit_fence(&mut self) {
        self.emit(CODE_FENCE);
        self.emit(LINE_BREAK);
    }

    fn emit_thematic_break(&mut self) {
        self.emit(THEMATIC_BREAK);
        self.emit(LINE_BREAK);
    }

    fn push_frame(&mut self, frame: Frame) {
        self.adjust_depths(&frame, true);
        self.frames.push(frame);
    }

    /// Pop the top frame and restore the list or link context it saved
    fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.adjust_depths(&frame, false);
        match &frame {
            Frame::List(outer) => self.list = *outer,
            Frame::Link(outer) => self.link = outer.clone(),
            _ => {}
        }
        Some(frame)
    }

    fn adjust_depths(&mut self, frame: &Frame, opening: bool) {
        let step = |depth: &mut usize| {
            if opening {
                *depth += 1;
            } else {
                *depth -= 1;
            }
        };
        match frame {
            Frame::Div(mode) => {
                step(&mut self.div_depth);
                match mode {
                    DivMode::CodeBlock => step(&mut self.code_depth),
                    DivMode::Ignore => step(&mut self.ignore_depth),
                    DivMode::Plain => {}
                }
            }
            Frame::CodeElement => step(&mut self.code_depth),
            Frame::Suppress(_) => step(&mut self.suppress_depth),
            Frame::Link(_) | Frame::List(_) => {}
        }
    }

    /// Pop the innermost frame accepted by `matches`
    ///
    /// Frames above it were never closed; they are unwound first, restoring
    /// any context they saved.
    fn close(&mut self, matches: impl Fn(&Frame) -> bool) -> Option<Frame> {
        let Some(index) = self.frames.iter().rposition(|frame| matches(frame)) else {
            tracing::debug!("close event without matching open element");
            return None;
        };

        let unclosed = self.frames.len() - index - 1;
        if unclosed > 0 {
            tracing::debug!(unclosed, "discarding elements that were never closed");
        }
        while self.frames.len() > index + 1 {
            self.pop_frame();
        }
        self.pop_frame()
    }
}

/// Main Markdown converter
///
/// Each call starts from a fresh [`ConversionState`], so one converter can be
/// shared freely and conversions never influence each other.
///
/// # Usage
///
/// ```rust
/// use html_to_md_converter::converter::MarkdownConverter;
/// use html_to_md_converter::event::ParseEvent;
///
/// let converter = MarkdownConverter::new();
///
/// let events = vec![
///     ParseEvent::self_closing("img", [("data-filename", "foo"), ("src", "img/foo.png")]),
/// ];
/// let result = converter.convert(events);
/// assert_eq!(result.markdown, "![foo](img/foo.png)");
/// assert_eq!(result.assets[0].as_str(), "img/foo.png");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a finite event stream
    pub fn convert<I>(&self, events: I) -> ConversionResult
    where
        I: IntoIterator<Item = ParseEvent>,
    {
        let mut state = ConversionState::new();
        for event in events {
            state.handle_event(&event);
        }
        state.finish()
    }

    /// Tokenize and convert an HTML string
    ///
    /// Events are streamed into the state as the tokenizer produces them.
    pub fn convert_html(&self, html: &str) -> ConversionResult {
        let mut state = ConversionState::new();
        parse_events(html, |event| state.handle_event(&event));
        state.finish()
    }

    /// Decode HTML bytes with their declared charset, then convert
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::EncodingError` when the bytes cannot be decoded.
    pub fn convert_bytes(&self, html: &[u8]) -> Result<ConversionResult, ConversionError> {
        let text = crate::charset::decode_html(html)?;
        Ok(self.convert_html(&text))
    }
}
