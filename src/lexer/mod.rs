mod lexer;

pub use lexer::{tokenize, tokenize_with, Tokenizer, TokenizerOptions, Tokens};
