//! Markup event scanning
//!
//! Drives the `html5ever` tokenizer over a whole in-memory document and
//! reduces its token stream to the three events the text extractor cares
//! about: start tags, end tags and runs of character data.

use crate::error::{ExtractionError, Result};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::trace;

/// A single markup event, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupEvent {
    /// An opening tag. Attributes are not retained.
    StartTag {
        /// Lowercased tag name
        name: String,
        /// Whether the tag was written as `<name/>`
        self_closing: bool,
    },
    /// A closing tag
    EndTag {
        /// Lowercased tag name
        name: String,
    },
    /// A maximal run of character data, entities already decoded
    Text(String),
}

impl MarkupEvent {
    /// Tag name for start/end events
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            MarkupEvent::StartTag { name, .. } | MarkupEvent::EndTag { name } => Some(name),
            MarkupEvent::Text(_) => None,
        }
    }
}

/// Collects tokenizer output into `MarkupEvent`s.
///
/// Character tokens are buffered in `pending` and flushed as one `Text`
/// event whenever any other markup construct is seen.
#[derive(Default)]
struct EventSink {
    events: RefCell<Vec<MarkupEvent>>,
    pending: RefCell<String>,
}

impl EventSink {
    fn flush_text(&self) {
        let mut pending = self.pending.borrow_mut();
        if !pending.is_empty() {
            self.events
                .borrow_mut()
                .push(MarkupEvent::Text(std::mem::take(&mut *pending)));
        }
    }

    fn take_events(&self) -> Vec<MarkupEvent> {
        self.flush_text();
        self.events.take()
    }
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chunk) => {
                self.pending.borrow_mut().push_str(&chunk);
            }
            Token::TagToken(tag) => {
                self.flush_text();
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let raw = match name.as_str() {
                            "script" => Some(RawKind::ScriptData),
                            "style" => Some(RawKind::Rawtext),
                            _ => None,
                        };
                        self.events.borrow_mut().push(MarkupEvent::StartTag {
                            name,
                            self_closing: tag.self_closing,
                        });
                        if let Some(kind) = raw.filter(|_| !tag.self_closing) {
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => {
                        self.events.borrow_mut().push(MarkupEvent::EndTag { name });
                    }
                }
            }
            Token::ParseError(msg) => {
                trace!(line = line_number, "recoverable markup error: {}", msg);
            }
            Token::NullCharacterToken => {}
            Token::CommentToken(_) | Token::DoctypeToken(_) | Token::EOFToken => {
                self.flush_text();
            }
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize a whole document into markup events.
///
/// Never fails on a `&str`: the tokenizer recovers from any malformed markup
/// and drains its input queue. Invalid UTF-8 in [`tokenize_bytes`] is the
/// only fatal input.
pub fn tokenize(document: &str) -> Vec<MarkupEvent> {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(document));

    let tokenizer = Tokenizer::new(EventSink::default(), TokenizerOpts::default());
    // The sink never pauses for scripts, so feeding drains the queue.
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    debug_assert!(input.is_empty());

    tokenizer.sink.take_events()
}

/// Tokenize raw file bytes, which must be UTF-8.
pub fn tokenize_bytes(bytes: &[u8]) -> Result<Vec<MarkupEvent>> {
    let document = std::str::from_utf8(bytes).map_err(ExtractionError::from)?;
    Ok(tokenize(document))
}
