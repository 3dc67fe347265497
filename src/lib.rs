#![feature(portable_simd)]

mod error;
mod keyword;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod token;

pub use {
    ast::AstArena,
    error::{Error, ParseError},
    keyword::Keyword,
    lexer::{tokenize, tokenize_with, Tokenizer, TokenizerOptions},
    parser::{parse, parse_bytes, parse_text, Parser},
    scanner::SimdCapability,
    token::{Token, TokenArena, TokenKind},
};
