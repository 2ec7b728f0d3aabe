//! HTML tokenizer adapter using html5ever
//!
//! This module drives html5ever's tokenizer (without the tree builder) and
//! turns its tokens into [`ParseEvent`]s. Working at the token level keeps the
//! distinction between `<img>` and `<img/>`, which the converter relies on.
//!
//! # Token mapping
//!
//! - Start tags become `StartTag`, or `SelfClosingTag` when written as `<x/>`
//! - End tags become `EndTag`
//! - Character tokens are coalesced into a single `Text` event per run
//! - Doctype, comments and null characters produce no events
//! - Parse errors are tolerated, counted and logged at trace level
//!
//! `<style>` switches the tokenizer to raw text and `<script>` to script data,
//! so CSS or JavaScript containing `<` is never mistaken for markup.
//!
//! # Examples
//!
//! ```rust
//! use html_to_md_converter::event::ParseEvent;
//! use html_to_md_converter::parser::tokenize;
//!
//! let events = tokenize("<b>Hi</b><br/>");
//! assert_eq!(events[1], ParseEvent::text("Hi"));
//! assert!(matches!(events[3], ParseEvent::SelfClosingTag { .. }));
//! ```

use std::cell::{Cell, RefCell};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::TokenizerResult;

use crate::event::{Attributes, ParseEvent};

/// Token sink forwarding events to a callback
struct EventSink<F> {
    emit: RefCell<F>,
    pending_text: RefCell<String>,
    parse_errors: Cell<usize>,
}

impl<F: FnMut(ParseEvent)> EventSink<F> {
    fn new(emit: F) -> Self {
        Self {
            emit: RefCell::new(emit),
            pending_text: RefCell::new(String::new()),
            parse_errors: Cell::new(0),
        }
    }

    fn flush_text(&self) {
        let text = std::mem::take(&mut *self.pending_text.borrow_mut());
        if !text.is_empty() {
            (self.emit.borrow_mut())(ParseEvent::Text(text));
        }
    }

    fn dispatch(&self, event: ParseEvent) {
        self.flush_text();
        (self.emit.borrow_mut())(event);
    }

    fn process_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();

        match tag.kind {
            TagKind::EndTag => {
                self.dispatch(ParseEvent::EndTag { name });
                TokenSinkResult::Continue
            }
            TagKind::StartTag => {
                let attrs: Attributes = tag
                    .attrs
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect();

                if tag.self_closing {
                    self.dispatch(ParseEvent::SelfClosingTag { name, attrs });
                    return TokenSinkResult::Continue;
                }

                let next = match name.as_str() {
                    "style" => TokenSinkResult::RawData(RawKind::Rawtext),
                    "script" => TokenSinkResult::RawData(RawKind::ScriptData),
                    _ => TokenSinkResult::Continue,
                };
                self.dispatch(ParseEvent::StartTag { name, attrs });
                next
            }
        }
    }
}

impl<F: FnMut(ParseEvent)> TokenSink for EventSink<F> {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => self.pending_text.borrow_mut().push_str(&text),
            Token::TagToken(tag) => return self.process_tag(tag),
            Token::CommentToken(_) | Token::EOFToken => self.flush_text(),
            Token::ParseError(message) => {
                self.parse_errors.set(self.parse_errors.get() + 1);
                tracing::trace!(line = line_number, %message, "tolerated malformed markup");
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize `html` and hand each event to `emit` as soon as it is complete
///
/// Returns the number of parse errors the tokenizer recovered from.
pub fn parse_events<F: FnMut(ParseEvent)>(html: &str, emit: F) -> usize {
    let tokenizer = Tokenizer::new(EventSink::new(emit), TokenizerOpts::default());

    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    // The sink never asks for script execution; resume feeding if it ever pauses
    while let TokenizerResult::Script(()) = tokenizer.feed(&input) {}
    tokenizer.end();

    tokenizer.sink.flush_text();
    let parse_errors = tokenizer.sink.parse_errors.get();
    if parse_errors > 0 {
        tracing::debug!(parse_errors, "tokenizer recovered from malformed markup");
    }
    parse_errors
}

/// Tokenize `html` into a vector of events
pub fn tokenize(html: &str) -> Vec<ParseEvent> {
    let mut events = Vec::new();
    parse_events(html, |event| events.push(event));
    events
}
