//! Markup tokenizer.
//!
//! A single-pass character state machine. Quoted attribute values are read in
//! their own states, so delimiters inside them (`<`, `>`, `=`, spaces, the
//! other quote) never split a tag. Malformed input is never rejected: stray
//! `<` becomes text and unterminated constructs are closed at end of input.

use crate::entities;
use crate::{ParseError, ParseResult};
use tracing::trace;

/// Attribute list of a start tag. `None` marks a valueless attribute.
pub type Attributes = Vec<(String, Option<String>)>;

/// Token types emitted by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<!DOCTYPE ...>`; carries the trimmed declaration body (e.g. `html`).
    Doctype { name: String },
    /// Start tag (e.g., `<div>` or `<img />`)
    StartTag {
        name: String,
        attrs: Attributes,
        self_closing: bool,
    },
    /// End tag (e.g., `</div>`)
    EndTag { name: String },
    /// A run of text, entities decoded
    Text(String),
    /// Comment body, verbatim
    Comment(String),
    /// End of file
    Eof,
}

/// Tokenization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    TagOpen,
    TagName,
    EndTagOpen,
    EndTagName,
    AfterEndTagName,
    SelfClosingStartTag,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    MarkupDeclarationOpen,
    Comment,
    Doctype,
    BogusComment,
    RawText,
    RcData,
}

/// Content model entered after a start tag.
fn content_state(tag_name: &str) -> State {
    match tag_name {
        "script" | "style" => State::RawText,
        "textarea" | "title" => State::RcData,
        _ => State::Data,
    }
}

/// Markup tokenizer.
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    state: State,
    /// The name of the last emitted start tag (for raw-text end tag matching)
    last_start_tag_name: String,
    current_tag_name: String,
    current_attrs: Attributes,
    current_attr_name: String,
    current_attr_value: String,
    self_closing: bool,
    current_comment: String,
    text: String,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            state: State::Data,
            last_start_tag_name: String::new(),
            current_tag_name: String::new(),
            current_attrs: Vec::new(),
            current_attr_name: String::new(),
            current_attr_value: String::new(),
            self_closing: false,
            current_comment: String::new(),
            text: String::new(),
            tokens: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.current_char();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.tokens.push(Token::Text(text));
        }
    }

    fn emit(&mut self, token: Token) {
        self.flush_text();
        self.tokens.push(token);
    }

    fn emit_current_comment(&mut self) {
        let comment = std::mem::take(&mut self.current_comment);
        self.emit(Token::Comment(comment));
        self.state = State::Data;
    }

    fn emit_current_tag(&mut self) {
        if self.current_tag_name.is_empty() {
            self.state = State::Data;
            return;
        }
        self.finish_attr(None);
        let name = std::mem::take(&mut self.current_tag_name);
        let self_closing = std::mem::take(&mut self.self_closing);
        self.state = if self_closing {
            State::Data
        } else {
            content_state(&name)
        };
        self.last_start_tag_name = name.clone();
        let tag = Token::StartTag {
            name,
            attrs: std::mem::take(&mut self.current_attrs),
            self_closing,
        };
        self.emit(tag);
    }

    fn emit_current_end_tag(&mut self) {
        if !self.current_tag_name.is_empty() {
            let tag = Token::EndTag {
                name: std::mem::take(&mut self.current_tag_name),
            };
            self.emit(tag);
        }
        self.state = State::Data;
    }

    /// Record the pending attribute. `value` is `None` for a bare name.
    fn finish_attr(&mut self, value: Option<String>) {
        if self.current_attr_name.is_empty() {
            return;
        }
        let name = std::mem::take(&mut self.current_attr_name);
        self.current_attr_value.clear();
        if self.current_attrs.iter().any(|(existing, _)| *existing == name) {
            trace!(attribute = %name, "ignoring duplicate attribute");
            return;
        }
        self.current_attrs.push((name, value));
    }

    fn finish_attr_with_value(&mut self) {
        let value = std::mem::take(&mut self.current_attr_value);
        self.finish_attr(Some(value));
    }

    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        // Every state either consumes input or moves to a consuming state.
        let max_steps = self.input.len() * 4 + 64;
        let mut steps = 0usize;

        while self.pos < self.input.len() || self.state != State::Data {
            match self.state {
                State::Data => self.state_data(),
                State::TagOpen => self.state_tag_open(),
                State::TagName => self.state_tag_name(),
                State::EndTagOpen => self.state_end_tag_open(),
                State::EndTagName => self.state_end_tag_name(),
                State::AfterEndTagName => self.state_after_end_tag_name(),
                State::SelfClosingStartTag => self.state_self_closing_start_tag(),
                State::BeforeAttributeName => self.state_before_attribute_name(),
                State::AttributeName => self.state_attribute_name(),
                State::AfterAttributeName => self.state_after_attribute_name(),
                State::BeforeAttributeValue => self.state_before_attribute_value(),
                State::AttributeValueDoubleQuoted => self.state_attribute_value_quoted('"'),
                State::AttributeValueSingleQuoted => self.state_attribute_value_quoted('\''),
                State::AttributeValueUnquoted => self.state_attribute_value_unquoted(),
                State::MarkupDeclarationOpen => self.state_markup_declaration_open(),
                State::Comment => self.state_comment(),
                State::Doctype => self.state_doctype(),
                State::BogusComment => self.state_bogus_comment(),
                State::RawText => self.state_raw_text(false),
                State::RcData => self.state_raw_text(true),
            }

            steps += 1;
            if steps > max_steps {
                return Err(ParseError::TokenizerError(format!(
                    "tokenizer made no progress at offset {} in state {:?}",
                    self.pos, self.state
                )));
            }
        }

        self.emit(Token::Eof);
        Ok(self.tokens)
    }

    fn state_data(&mut self) {
        match self.consume() {
            Some('<') => self.state = State::TagOpen,
            Some('&') => {
                let entity = self.consume_entity();
                self.text.push_str(&entity);
            }
            Some(ch) => self.text.push(ch),
            None => {}
        }
    }

    fn state_tag_open(&mut self) {
        match self.current_char() {
            Some('!') => {
                self.consume();
                self.state = State::MarkupDeclarationOpen;
            }
            Some('/') => {
                self.consume();
                self.state = State::EndTagOpen;
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag_name.clear();
                self.current_attrs.clear();
                self.self_closing = false;
                self.state = State::TagName;
            }
            Some('?') => {
                self.consume();
                self.state = State::BogusComment;
            }
            _ => {
                self.text.push('<');
                self.state = State::Data;
            }
        }
    }

    fn state_tag_name(&mut self) {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() => self.state = State::BeforeAttributeName,
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') | None => self.emit_current_tag(),
            Some(ch) => self.current_tag_name.push(ch.to_ascii_lowercase()),
        }
    }

    fn state_self_closing_start_tag(&mut self) {
        if self.current_char() == Some('>') {
            self.consume();
            self.self_closing = true;
            self.emit_current_tag();
        } else {
            self.state = State::BeforeAttributeName;
        }
    }

    fn state_before_attribute_name(&mut self) {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() => {}
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') | None => self.emit_current_tag(),
            Some(ch) => {
                self.current_attr_name.clear();
                self.current_attr_value.clear();
                self.current_attr_name.push(ch);
                self.state = State::AttributeName;
            }
        }
    }

    fn state_attribute_name(&mut self) {
        match self.current_char() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.consume();
                self.state = State::AfterAttributeName;
            }
            Some('/') | Some('>') | None => {
                self.finish_attr(None);
                self.state = State::BeforeAttributeName;
            }
            Some('=') => {
                self.consume();
                self.state = State::BeforeAttributeValue;
            }
            Some(ch) => {
                self.consume();
                self.current_attr_name.push(ch);
            }
        }
    }

    fn state_after_attribute_name(&mut self) {
        match self.current_char() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.consume();
            }
            Some('=') => {
                self.consume();
                self.state = State::BeforeAttributeValue;
            }
            _ => {
                self.finish_attr(None);
                self.state = State::BeforeAttributeName;
            }
        }
    }

    fn state_before_attribute_value(&mut self) {
        match self.current_char() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.consume();
            }
            Some('"') => {
                self.consume();
                self.state = State::AttributeValueDoubleQuoted;
            }
            Some('\'') => {
                self.consume();
                self.state = State::AttributeValueSingleQuoted;
            }
            Some('>') | None => {
                self.finish_attr_with_value();
                self.state = State::BeforeAttributeName;
            }
            Some(_) => self.state = State::AttributeValueUnquoted,
        }
    }

    fn state_attribute_value_quoted(&mut self, quote: char) {
        match self.consume() {
            Some(ch) if ch == quote => {
                self.finish_attr_with_value();
                self.state = State::BeforeAttributeName;
            }
            Some('&') => {
                let entity = self.consume_entity();
                self.current_attr_value.push_str(&entity);
            }
            Some(ch) => self.current_attr_value.push(ch),
            None => {
                self.finish_attr_with_value();
                self.emit_current_tag();
            }
        }
    }

    fn state_attribute_value_unquoted(&mut self) {
        match self.current_char() {
            Some(ch) if ch.is_ascii_whitespace() => {
                self.consume();
                self.finish_attr_with_value();
                self.state = State::BeforeAttributeName;
            }
            Some('>') | None => {
                self.finish_attr_with_value();
                self.state = State::BeforeAttributeName;
            }
            Some('&') => {
                self.consume();
                let entity = self.consume_entity();
                self.current_attr_value.push_str(&entity);
            }
            Some(ch) => {
                self.consume();
                self.current_attr_value.push(ch);
            }
        }
    }

    fn consume_entity(&mut self) -> String {
        let mut entity_str = String::from("&");

        while let Some(ch) = self.current_char() {
            if ch == ';' {
                entity_str.push(ch);
                self.consume();
                break;
            } else if ch.is_alphanumeric() || ch == '#' {
                entity_str.push(ch);
                self.consume();
            } else {
                break;
            }

            if entity_str.len() > 32 {
                break;
            }
        }

        entities::decode(&entity_str)
    }

    fn matches_case_insensitive(&self, offset: usize, s: &str) -> bool {
        s.chars().enumerate().all(|(i, expected)| {
            self.peek_char(offset + i)
                .is_some_and(|ch| ch.eq_ignore_ascii_case(&expected))
        })
    }

    fn state_markup_declaration_open(&mut self) {
        if self.current_char() == Some('-') && self.peek_char(1) == Some('-') {
            self.skip(2);
            self.current_comment.clear();
            if self.current_char() == Some('>') {
                self.consume();
                self.emit_current_comment();
            } else {
                self.state = State::Comment;
            }
            return;
        }

        if self.matches_case_insensitive(0, "DOCTYPE") {
            self.skip(7);
            self.current_comment.clear();
            self.state = State::Doctype;
            return;
        }

        self.current_comment.clear();
        self.state = State::BogusComment;
    }

    fn state_comment(&mut self) {
        match self.consume() {
            Some('-') if self.current_char() == Some('-') && self.peek_char(1) == Some('>') => {
                self.skip(2);
                self.emit_current_comment();
            }
            Some(ch) => self.current_comment.push(ch),
            None => {
                trace!("unterminated comment");
                self.emit_current_comment();
            }
        }
    }

    fn state_doctype(&mut self) {
        match self.consume() {
            Some('>') | None => {
                let name = std::mem::take(&mut self.current_comment).trim().to_string();
                self.emit(Token::Doctype { name });
                self.state = State::Data;
            }
            Some(ch) => self.current_comment.push(ch),
        }
    }

    fn state_bogus_comment(&mut self) {
        match self.consume() {
            Some('>') | None => self.emit_current_comment(),
            Some(ch) => self.current_comment.push(ch),
        }
    }

    fn state_end_tag_open(&mut self) {
        match self.current_char() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag_name.clear();
                self.state = State::EndTagName;
            }
            Some('>') => {
                self.consume();
                self.state = State::Data;
            }
            None => {
                self.text.push_str("</");
                self.state = State::Data;
            }
            _ => {
                self.current_comment.clear();
                self.state = State::BogusComment;
            }
        }
    }

    fn state_end_tag_name(&mut self) {
        match self.consume() {
            Some(ch) if ch.is_ascii_whitespace() || ch == '/' => {
                self.state = State::AfterEndTagName;
            }
            Some('>') | None => self.emit_current_end_tag(),
            Some(ch) => self.current_tag_name.push(ch.to_ascii_lowercase()),
        }
    }

    fn state_after_end_tag_name(&mut self) {
        if let Some('>') | None = self.consume() {
            self.emit_current_end_tag();
        }
    }

    /// Does `</name` for the open raw-text element start at `pos`?
    fn at_matching_end_tag(&self) -> bool {
        let name = &self.last_start_tag_name;
        self.current_char() == Some('<')
            && self.peek_char(1) == Some('/')
            && self.matches_case_insensitive(2, name)
            && match self.peek_char(2 + name.chars().count()) {
                None => true,
                Some(ch) => ch.is_ascii_whitespace() || ch == '>' || ch == '/',
            }
    }

    /// Script/style (`RawText`) and textarea/title (`RcData`, entities decoded).
    fn state_raw_text(&mut self, decode_entities: bool) {
        if self.at_matching_end_tag() {
            self.skip(2 + self.last_start_tag_name.chars().count());
            self.current_tag_name = self.last_start_tag_name.clone();
            self.state = State::AfterEndTagName;
            return;
        }
        match self.consume() {
            Some('&') if decode_entities => {
                let entity = self.consume_entity();
                self.text.push_str(&entity);
            }
            Some(ch) => self.text.push(ch),
            None => self.state = State::Data,
        }
    }
}

/// Tokenize a complete input.
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    Tokenizer::new(input).tokenize()
}
