//! Markup tokenizer.
//!
//! # Syntax
//! Text is literal except for tags in angle brackets. Recognized tags:
//!
//! `<b>bold</b> <strong>also bold</strong> <i>italic</i> <u>underlined</u>`
//!
//! `first line<br/>second line`
//!
//! Tags do not nest as a tree: an opening tag switches an attribute on
//! and the matching closing tag switches it off again. Spaces before the
//! tag name are ignored (`< b>` is `<b>`). Unknown or malformed tags are
//! skipped without affecting the style.

use std::str::Chars;

use logos::{Lexer, Logos};

#[derive(Copy, Clone, Debug, Logos, PartialEq, Eq)]
enum Token {
    #[token("<")]
    Open,
    #[token(">")]
    Close,

    #[regex("[^<>]+")]
    Text,

    #[error]
    Error,
}

/// A style transition produced by a tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagEvent {
    OpenBold,
    CloseBold,
    OpenItalic,
    CloseItalic,
    OpenUnderline,
    CloseUnderline,
    LineBreak,
    /// Unrecognized tag. Ignored.
    None,
}

impl TagEvent {
    /// Maps a tag name (without brackets) to its event. Case-sensitive.
    pub fn from_tag_name(name: &str) -> Self {
        match name {
            "b" | "strong" => TagEvent::OpenBold,
            "/b" | "/strong" => TagEvent::CloseBold,
            "i" => TagEvent::OpenItalic,
            "/i" => TagEvent::CloseItalic,
            "u" => TagEvent::OpenUnderline,
            "/u" => TagEvent::CloseUnderline,
            "br/" => TagEvent::LineBreak,
            _ => TagEvent::None,
        }
    }
}

/// An item of tokenized markup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Item {
    /// A literal character to render.
    Char(char),
    /// A tag was closed.
    Tag(TagEvent),
}

/// Streams [`Item`]s out of a markup string.
pub struct Tokenizer<'a> {
    lexer: Lexer<'a, Token>,
    /// Remaining characters of the current text token outside a tag.
    pending: Chars<'a>,
    in_tag: bool,
    tag_name: String,
}

impl<'a> Tokenizer<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self {
            lexer: Token::lexer(markup),
            pending: "".chars(),
            in_tag: false,
            tag_name: String::new(),
        }
    }

    fn push_tag_text(&mut self, text: &str) {
        if self.tag_name.is_empty() {
            self.tag_name.push_str(text.trim_start_matches(' '));
        } else {
            self.tag_name.push_str(text);
        }
    }

    fn finish_tag(&mut self) -> TagEvent {
        let event = TagEvent::from_tag_name(&self.tag_name);
        if event == TagEvent::None {
            log::debug!("Ignoring unknown tag <{}>", self.tag_name);
        }
        self.tag_name.clear();
        self.in_tag = false;
        event
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        loop {
            if let Some(c) = self.pending.next() {
                return Some(Item::Char(c));
            }

            match self.lexer.next()? {
                // A stray '<' inside a tag keeps accumulating the same tag.
                Token::Open => self.in_tag = true,
                Token::Close => return Some(Item::Tag(self.finish_tag())),
                Token::Text | Token::Error => {
                    let text = self.lexer.slice();
                    if self.in_tag {
                        self.push_tag_text(text);
                    } else {
                        self.pending = text.chars();
                    }
                }
            }
        }
    }
}

/// Tokenizes a markup string.
pub fn tokenize(markup: &str) -> Tokenizer {
    Tokenizer::new(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(markup: &str) -> Vec<Item> {
        tokenize(markup).collect()
    }

    fn chars(s: &str) -> Vec<Item> {
        s.chars().map(Item::Char).collect()
    }

    #[test]
    fn plain_text() {
        assert_eq!(items(" basic text  "), chars(" basic text  "));
    }

    #[test]
    fn bold_toggle() {
        let mut expected = vec![Item::Tag(TagEvent::OpenBold)];
        expected.extend(chars("hi"));
        expected.push(Item::Tag(TagEvent::CloseBold));
        expected.extend(chars(" there"));
        assert_eq!(items("<b>hi</b> there"), expected);
    }

    #[test]
    fn tag_names() {
        assert_eq!(
            items("<strong></strong><i></i><u></u><br/><br><B>"),
            [
                TagEvent::OpenBold,
                TagEvent::CloseBold,
                TagEvent::OpenItalic,
                TagEvent::CloseItalic,
                TagEvent::OpenUnderline,
                TagEvent::CloseUnderline,
                TagEvent::LineBreak,
                TagEvent::None,
                TagEvent::None,
            ]
            .iter()
            .copied()
            .map(Item::Tag)
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn leading_spaces_stripped_only() {
        assert_eq!(items("<   b>"), [Item::Tag(TagEvent::OpenBold)]);
        // Trailing and inner spaces are kept, so these do not match.
        assert_eq!(items("<b >"), [Item::Tag(TagEvent::None)]);
        assert_eq!(items("<br />"), [Item::Tag(TagEvent::None)]);
    }

    #[test]
    fn line_break_alone() {
        assert_eq!(items("<br/>"), [Item::Tag(TagEvent::LineBreak)]);
    }

    #[test]
    fn malformed_markup_degrades() {
        // Unterminated tag: swallowed, no event.
        assert_eq!(items("ab<b"), chars("ab"));
        // Stray '>' closes an empty tag.
        let mut expected = chars("a");
        expected.push(Item::Tag(TagEvent::None));
        expected.extend(chars("b"));
        assert_eq!(items("a>b"), expected);
        // '<' inside a tag continues the same tag.
        assert_eq!(items("<b<i>"), [Item::Tag(TagEvent::None)]);
        assert_eq!(items("</x>"), [Item::Tag(TagEvent::None)]);
    }

    #[test]
    fn unicode_and_newlines() {
        assert_eq!(items("é\n<u>ü"), {
            let mut v = chars("é\n");
            v.push(Item::Tag(TagEvent::OpenUnderline));
            v.extend(chars("ü"));
            v
        });
    }
}
