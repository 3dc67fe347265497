use bumpalo::collections::Vec as BumpVec;

use crate::{
    keyword::KeywordMatcher,
    scanner::{scalar, Scanner, CHAR_TABLE},
    token::{Token, TokenArena, TokenKind},
};

/// Token sequence of one tokenize call, allocated in the token arena.
pub type Tokens<'arena, 'src> = BumpVec<'arena, Token<'src>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Also accept `'…'` strings. Off by default; with the option off a
    /// bare `'` lexes as `Unknown`.
    pub single_quote_strings: bool,
}

#[derive(Debug)]
pub struct Tokenizer<'src> {
    text: &'src str,
    bytes: &'src [u8],
    position: usize,
    scanner: &'static Scanner,
    matcher: &'static KeywordMatcher,
    options: TokenizerOptions,
}

impl<'src> Tokenizer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self::with_options(text, TokenizerOptions::default())
    }

    pub fn with_options(text: &'src str, options: TokenizerOptions) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            position: 0,
            scanner: Scanner::get(),
            matcher: KeywordMatcher::get(),
            options,
        }
    }

    pub fn tokenize<'arena>(&mut self, arena: &'arena TokenArena) -> Tokens<'arena, 'src> {
        let len = self.bytes.len();
        let reserve = if len > 1000 { len / 3 } else { len };
        let mut tokens = BumpVec::with_capacity_in(reserve, arena.bump());

        // 跳过 UTF-8 BOM（仅在开头）
        if self.position == 0 && self.bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            self.position = 3;
        }

        loop {
            self.position = self.scanner.skip_whitespace(self.bytes, self.position);

            let Some(&c) = self.bytes.get(self.position) else {
                break;
            };

            if CHAR_TABLE.has_flag(c, scalar::COMMENT) {
                let next = self.scanner.skip_comment(self.bytes, self.position);
                if next != self.position {
                    self.position = next;
                    continue;
                }
            }

            if c == b'.' && self.bytes[self.position..].starts_with(b"...") {
                self.push(&mut tokens, TokenKind::Ellipsis, self.position, self.position + 3);
                continue;
            }

            if (c == b'$' || c == b'@') && self.ident_start_at(self.position + 1) {
                let start = self.position;
                let end = self.scanner.find_identifier_end(self.bytes, start + 1);
                let kind = if c == b'$' {
                    TokenKind::Variable
                } else {
                    TokenKind::Directive
                };
                self.push(&mut tokens, kind, start, end);
                continue;
            }

            if CHAR_TABLE.has_flag(c, scalar::SPECIAL) {
                let kind = CHAR_TABLE.special_kind(c);
                self.push(&mut tokens, kind, self.position, self.position + 1);
                continue;
            }

            if CHAR_TABLE.is_ident_start(c) {
                let start = self.position;
                let end = self.scanner.find_identifier_end(self.bytes, start);
                // 可能是关键词
                let kind = match self.matcher.match_keyword(&self.bytes[start..end]) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier,
                };
                self.push(&mut tokens, kind, start, end);
                continue;
            }

            if c.is_ascii_digit() || (c == b'-' && self.digit_at(self.position + 1)) {
                let start = self.position;
                let mut has_decimal = false;
                let end = self.scanner.find_number_end(self.bytes, start, &mut has_decimal);
                self.push(&mut tokens, TokenKind::Number, start, end);
                continue;
            }

            if c == b'"' || (c == b'\'' && self.options.single_quote_strings) {
                self.scan_string(&mut tokens, c);
                continue;
            }

            if CHAR_TABLE.has_flag(c, scalar::SYMBOL) {
                self.push(&mut tokens, TokenKind::Symbol, self.position, self.position + 1);
                continue;
            }

            // 未识别字节；整个 UTF-8 字符一并消费，保证 lexeme 切片有效
            let end = (self.position + utf8_width(c)).min(len);
            self.push(&mut tokens, TokenKind::Unknown, self.position, end);
        }

        tokens
    }

    // 匹配字符串；三引号为块字符串
    fn scan_string<'arena>(&mut self, tokens: &mut Tokens<'arena, 'src>, quote: u8) {
        let start = self.position;

        if quote == b'"' && self.bytes[start..].starts_with(b"\"\"\"") {
            let (end, terminated) = self.scanner.find_block_string_end(self.bytes, start);
            let kind = if terminated {
                TokenKind::String
            } else {
                TokenKind::Unknown
            };
            self.push(tokens, kind, start, end);
            return;
        }

        let (end, terminated) = self.scanner.find_string_end(self.bytes, start, quote);
        let kind = if terminated {
            TokenKind::String
        } else {
            TokenKind::Unknown
        };
        self.push(tokens, kind, start, end);
    }

    #[inline]
    fn push<'arena>(
        &mut self,
        tokens: &mut Tokens<'arena, 'src>,
        kind: TokenKind,
        start: usize,
        end: usize,
    ) {
        tokens.push(Token {
            kind,
            lexeme: &self.text[start..end],
            offset: start,
        });
        self.position = end;
    }

    #[inline]
    fn ident_start_at(&self, i: usize) -> bool {
        self.bytes.get(i).is_some_and(|&b| CHAR_TABLE.is_ident_start(b))
    }

    #[inline]
    fn digit_at(&self, i: usize) -> bool {
        self.bytes.get(i).is_some_and(|&b| b.is_ascii_digit())
    }
}

fn utf8_width(byte: u8) -> usize {
    if byte < 0x80 {
        1
    } else if byte < 0xE0 {
        2
    } else if byte < 0xF0 {
        3
    } else {
        4
    }
}

pub fn tokenize<'src, 'arena>(text: &'src str, arena: &'arena TokenArena) -> Tokens<'arena, 'src> {
    Tokenizer::new(text).tokenize(arena)
}

pub fn tokenize_with<'src, 'arena>(
    text: &'src str,
    arena: &'arena TokenArena,
    options: TokenizerOptions,
) -> Tokens<'arena, 'src> {
    Tokenizer::with_options(text, options).tokenize(arena)
}
