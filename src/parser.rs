use simdutf8::basic::from_utf8;

use crate::{
    ast::{
        Argument, AstArena, Definition, Directive, Document, Field, FragmentDefinition,
        FragmentSpread, InlineFragment, ListValue, ObjectField, ObjectValue, OperationDefinition,
        OperationKind, Selection, SelectionSet, TypeRef, Value, VariableDefinition,
    },
    error::{Error, ParseError},
    keyword::Keyword,
    lexer::tokenize,
    token::{Token, TokenArena, TokenKind},
};

/// Parse a token sequence into a document. Always returns a document
/// (possibly partial) plus the accumulated error list; never panics out.
pub fn parse<'a>(tokens: &[Token<'a>], arena: &'a AstArena) -> (Document<'a>, Vec<ParseError>) {
    let mut parser = Parser::new(tokens, arena);
    let document = parser.parse_document();
    (document, parser.errors)
}

pub fn parse_text<'a>(
    text: &'a str,
    token_arena: &'a TokenArena,
    arena: &'a AstArena,
) -> (Document<'a>, Vec<ParseError>) {
    let tokens = tokenize(text, token_arena);
    parse(&tokens, arena)
}

pub fn parse_bytes<'a>(
    bytes: &'a [u8],
    token_arena: &'a TokenArena,
    arena: &'a AstArena,
) -> Result<(Document<'a>, Vec<ParseError>), Error> {
    let text = from_utf8(bytes)?;
    Ok(parse_text(text, token_arena, arena))
}

// 可恢复错误信号：记录后回到 definition 边界
struct Bail;

type Attempt<T> = Result<T, Bail>;

pub struct Parser<'a, 't> {
    tokens: &'t [Token<'a>],
    current: usize,
    arena: &'a AstArena,
    errors: Vec<ParseError>,
    eof: Token<'a>,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(tokens: &'t [Token<'a>], arena: &'a AstArena) -> Self {
        let end = tokens.last().map(Token::end).unwrap_or(0);
        Self {
            tokens,
            current: 0,
            arena,
            errors: Vec::new(),
            eof: Token {
                kind: TokenKind::Eof,
                lexeme: "",
                offset: end,
            },
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn peek(&self, k: usize) -> &Token<'a> {
        self.tokens.get(self.current + k).unwrap_or(&self.eof)
    }

    fn current_token(&self) -> &Token<'a> {
        self.peek(0)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn advance(&mut self) -> Token<'a> {
        if self.is_at_end() {
            return self.eof;
        }
        let token = self.tokens[self.current];
        self.current += 1;
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current_token().kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(TokenKind::Keyword(keyword))
    }

    // 当前 token 是 `=` 符号
    fn check_equals(&self) -> bool {
        let token = self.current_token();
        token.kind == TokenKind::Symbol && token.lexeme == "="
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Attempt<Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error_at_current(message);
            Err(Bail)
        }
    }

    fn error_at_current(&mut self, message: impl Into<String>) {
        let offset = self.current_token().offset;
        self.errors.push(ParseError::new(message, offset));
    }

    /// Advance until the cursor sits at a definition keyword or the end
    /// of input.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(
                self.current_token().kind,
                TokenKind::Keyword(
                    Keyword::Query | Keyword::Mutation | Keyword::Subscription | Keyword::Fragment
                )
            ) {
                return;
            }
            self.advance();
        }
    }

    /// Most keywords are not reserved: anywhere a name is expected, a
    /// keyword-classified token is accepted too. Contextual exclusions
    /// (`on` as a fragment name) live at the call sites.
    fn is_name_like(&self, kind: TokenKind) -> bool {
        matches!(kind, TokenKind::Identifier | TokenKind::Keyword(_))
    }

    fn check_name(&self) -> bool {
        self.is_name_like(self.current_token().kind)
    }

    fn parse_document(&mut self) -> Document<'a> {
        let mut definitions = self.arena.vec();

        while !self.is_at_end() {
            let before = self.current;
            match self.parse_definition() {
                Some(definition) => definitions.push(definition),
                None => self.synchronize(),
            }
            if self.current == before {
                self.error_at_current("unable to parse definition");
                self.advance();
            }
        }

        Document {
            definitions: definitions.into_bump_slice(),
        }
    }

    fn parse_definition(&mut self) -> Option<Definition<'a>> {
        match self.current_token().kind {
            TokenKind::Keyword(Keyword::Fragment) => {
                Some(Definition::Fragment(self.parse_fragment_definition()))
            }
            TokenKind::LeftBrace
            | TokenKind::Keyword(Keyword::Query | Keyword::Mutation | Keyword::Subscription) => {
                Some(Definition::Operation(self.parse_operation_definition()))
            }
            _ => {
                self.error_at_current("expected operation or fragment definition");
                None
            }
        }
    }

    fn parse_operation_definition(&mut self) -> &'a OperationDefinition<'a> {
        let offset = self.current_token().offset;
        let mut operation = OperationDefinition {
            operation: OperationKind::Query,
            name: None,
            variable_definitions: &[],
            directives: &[],
            selection_set: SelectionSet {
                selections: &[],
                offset,
            },
            offset,
        };
        if let Err(Bail) = self.fill_operation_definition(&mut operation) {
            self.synchronize();
        }
        self.arena.alloc(operation)
    }

    fn fill_operation_definition(
        &mut self,
        operation: &mut OperationDefinition<'a>,
    ) -> Attempt<()> {
        // shorthand query: bare selection set
        if self.check(TokenKind::LeftBrace) {
            operation.selection_set = self.parse_selection_set()?;
            return Ok(());
        }

        operation.operation = self.parse_operation_kind();

        if self.check_name() {
            operation.name = Some(self.advance().lexeme);
        }

        if self.check(TokenKind::LeftParen) {
            operation.variable_definitions = self.parse_variable_definitions()?;
        }

        operation.directives = self.parse_directives()?;

        if !self.check(TokenKind::LeftBrace) {
            self.error_at_current("expected selection set");
            return Err(Bail);
        }
        operation.selection_set = self.parse_selection_set()?;
        Ok(())
    }

    fn parse_operation_kind(&mut self) -> OperationKind {
        let kind = match self.current_token().kind {
            TokenKind::Keyword(Keyword::Mutation) => OperationKind::Mutation,
            TokenKind::Keyword(Keyword::Subscription) => OperationKind::Subscription,
            _ => OperationKind::Query,
        };
        self.advance();
        kind
    }

    fn parse_fragment_definition(&mut self) -> &'a FragmentDefinition<'a> {
        let offset = self.current_token().offset;
        let mut fragment = FragmentDefinition {
            name: "",
            type_condition: "",
            directives: &[],
            selection_set: SelectionSet {
                selections: &[],
                offset,
            },
            offset,
        };
        if let Err(Bail) = self.fill_fragment_definition(&mut fragment) {
            self.synchronize();
        }
        self.arena.alloc(fragment)
    }

    fn fill_fragment_definition(&mut self, fragment: &mut FragmentDefinition<'a>) -> Attempt<()> {
        self.expect(TokenKind::Keyword(Keyword::Fragment), "expected 'fragment'")?;

        // `on` cannot name a fragment
        if !self.check_name() || self.check_keyword(Keyword::On) {
            self.error_at_current("expected fragment name");
            return Err(Bail);
        }
        fragment.name = self.advance().lexeme;

        self.expect(
            TokenKind::Keyword(Keyword::On),
            "expected 'on' in fragment definition",
        )?;

        if !self.check_name() {
            self.error_at_current("expected type name");
            return Err(Bail);
        }
        fragment.type_condition = self.advance().lexeme;

        fragment.directives = self.parse_directives()?;

        if !self.check(TokenKind::LeftBrace) {
            self.error_at_current("expected selection set");
            return Err(Bail);
        }
        fragment.selection_set = self.parse_selection_set()?;
        Ok(())
    }

    fn parse_selection_set(&mut self) -> Attempt<SelectionSet<'a>> {
        let offset = self.current_token().offset;
        self.expect(TokenKind::LeftBrace, "expected '{'")?;

        let mut selections = self.arena.vec();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.current;
            selections.push(self.parse_selection()?);

            // commas are whitespace
            self.eat(TokenKind::Comma);

            if self.current == before {
                self.error_at_current("unable to parse selection");
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace, "expected '}'")?;

        Ok(SelectionSet {
            selections: selections.into_bump_slice(),
            offset,
        })
    }

    fn parse_selection(&mut self) -> Attempt<Selection<'a>> {
        if self.eat(TokenKind::Ellipsis) {
            // `... on T`, `... {`, and `... @dir` are inline fragments
            if self.check_keyword(Keyword::On)
                || self.check(TokenKind::LeftBrace)
                || self.check(TokenKind::Directive)
            {
                return Ok(Selection::InlineFragment(self.parse_inline_fragment()?));
            }
            return Ok(Selection::FragmentSpread(self.parse_fragment_spread()?));
        }

        Ok(Selection::Field(self.parse_field()?))
    }

    fn parse_field(&mut self) -> Attempt<&'a Field<'a>> {
        let offset = self.current_token().offset;

        if !self.check_name() {
            self.error_at_current("expected field name");
            return Err(Bail);
        }
        let first = self.advance().lexeme;

        let (alias, name) = if self.eat(TokenKind::Colon) {
            if !self.check_name() {
                self.error_at_current("expected field name after ':'");
                return Err(Bail);
            }
            (Some(first), self.advance().lexeme)
        } else {
            (None, first)
        };

        let arguments = if self.check(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            &[]
        };

        let directives = self.parse_directives()?;

        let selection_set = if self.check(TokenKind::LeftBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(self.arena.alloc(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            offset,
        }))
    }

    fn parse_fragment_spread(&mut self) -> Attempt<&'a FragmentSpread<'a>> {
        let offset = self.current_token().offset;

        if !self.check_name() {
            self.error_at_current("expected fragment name");
            return Err(Bail);
        }
        let name = self.advance().lexeme;

        let directives = self.parse_directives()?;

        Ok(self.arena.alloc(FragmentSpread {
            name,
            directives,
            offset,
        }))
    }

    fn parse_inline_fragment(&mut self) -> Attempt<&'a InlineFragment<'a>> {
        let offset = self.current_token().offset;

        let mut type_condition = None;
        if self.eat(TokenKind::Keyword(Keyword::On)) {
            if !self.check_name() {
                self.error_at_current("expected type condition");
                return Err(Bail);
            }
            type_condition = Some(self.advance().lexeme);
        }

        let directives = self.parse_directives()?;
        let selection_set = self.parse_selection_set()?;

        Ok(self.arena.alloc(InlineFragment {
            type_condition,
            directives,
            selection_set,
            offset,
        }))
    }

    fn parse_arguments(&mut self) -> Attempt<&'a [Argument<'a>]> {
        self.expect(TokenKind::LeftParen, "expected '('")?;

        let mut arguments = self.arena.vec();
        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            let before = self.current;
            arguments.push(self.parse_argument()?);

            self.eat(TokenKind::Comma);

            if self.current == before {
                self.error_at_current("unable to parse argument");
                self.advance();
            }
        }

        self.expect(TokenKind::RightParen, "expected ')'")?;

        Ok(arguments.into_bump_slice())
    }

    fn parse_argument(&mut self) -> Attempt<Argument<'a>> {
        let offset = self.current_token().offset;

        // argument names accept keywords too
        if !self.check_name() {
            self.error_at_current("expected argument name");
            return Err(Bail);
        }
        let name = self.advance().lexeme;

        self.expect(TokenKind::Colon, "expected ':' after argument name")?;

        let value = self.parse_value()?;

        Ok(Argument {
            name,
            value,
            offset,
        })
    }

    fn parse_directives(&mut self) -> Attempt<&'a [Directive<'a>]> {
        if !self.check(TokenKind::Directive) {
            return Ok(&[]);
        }

        let mut directives = self.arena.vec();
        while self.check(TokenKind::Directive) {
            directives.push(self.parse_directive()?);
        }

        Ok(directives.into_bump_slice())
    }

    fn parse_directive(&mut self) -> Attempt<Directive<'a>> {
        let token = self.advance();
        let name = token.lexeme.strip_prefix('@').unwrap_or(token.lexeme);

        let arguments = if self.check(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            &[]
        };

        Ok(Directive {
            name,
            arguments,
            offset: token.offset,
        })
    }

    fn parse_variable_definitions(&mut self) -> Attempt<&'a [VariableDefinition<'a>]> {
        self.expect(TokenKind::LeftParen, "expected '('")?;

        let mut definitions = self.arena.vec();
        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            let before = self.current;
            definitions.push(self.parse_variable_definition()?);

            self.eat(TokenKind::Comma);

            if self.current == before {
                self.error_at_current("unable to parse variable definition");
                self.advance();
            }
        }

        self.expect(TokenKind::RightParen, "expected ')'")?;

        Ok(definitions.into_bump_slice())
    }

    fn parse_variable_definition(&mut self) -> Attempt<VariableDefinition<'a>> {
        let offset = self.current_token().offset;

        let name = self.parse_variable_name()?;

        self.expect(TokenKind::Colon, "expected ':' after variable")?;

        let ty = self.parse_type()?;

        let default_value = if self.check_equals() {
            self.advance();
            Some(self.parse_value()?)
        } else {
            None
        };

        let directives = self.parse_directives()?;

        Ok(VariableDefinition {
            name,
            ty,
            default_value,
            directives,
            offset,
        })
    }

    fn parse_variable_name(&mut self) -> Attempt<&'a str> {
        if !self.check(TokenKind::Variable) {
            self.error_at_current("expected variable");
            return Err(Bail);
        }
        let token = self.advance();
        Ok(token.lexeme.strip_prefix('$').unwrap_or(token.lexeme))
    }

    fn parse_type(&mut self) -> Attempt<&'a TypeRef<'a>> {
        let offset = self.current_token().offset;

        let inner: &'a TypeRef<'a> = if self.eat(TokenKind::LeftBracket) {
            let of = self.parse_type()?;
            self.expect(TokenKind::RightBracket, "expected ']'")?;
            self.arena.alloc(TypeRef::List { of, offset })
        } else {
            if !self.check_name() {
                self.error_at_current("expected type name");
                return Err(Bail);
            }
            let token = self.advance();
            self.arena.alloc(TypeRef::Named {
                name: token.lexeme,
                offset: token.offset,
            })
        };

        if self.eat(TokenKind::Exclamation) {
            return Ok(self.arena.alloc(TypeRef::NonNull { of: inner, offset }));
        }

        Ok(inner)
    }

    fn parse_value(&mut self) -> Attempt<Value<'a>> {
        let token = *self.current_token();
        match token.kind {
            TokenKind::Variable => {
                self.advance();
                Ok(Value::Variable {
                    name: token.lexeme.strip_prefix('$').unwrap_or(token.lexeme),
                    offset: token.offset,
                })
            }
            TokenKind::Number => {
                self.advance();
                if token.lexeme.contains(['.', 'e', 'E']) {
                    Ok(Value::Float {
                        raw: token.lexeme,
                        offset: token.offset,
                    })
                } else {
                    Ok(Value::Int {
                        raw: token.lexeme,
                        offset: token.offset,
                    })
                }
            }
            TokenKind::String => {
                self.advance();
                Ok(Value::String {
                    raw: token.lexeme,
                    offset: token.offset,
                })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Value::Boolean {
                    value: true,
                    offset: token.offset,
                })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Value::Boolean {
                    value: false,
                    offset: token.offset,
                })
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Value::Null {
                    offset: token.offset,
                })
            }
            TokenKind::LeftBracket => self.parse_list_value(),
            TokenKind::LeftBrace => self.parse_object_value(),
            TokenKind::Identifier => {
                self.advance();
                Ok(Value::Enum {
                    value: token.lexeme,
                    offset: token.offset,
                })
            }
            _ => {
                self.error_at_current("expected value");
                Err(Bail)
            }
        }
    }

    fn parse_list_value(&mut self) -> Attempt<Value<'a>> {
        let offset = self.current_token().offset;
        self.expect(TokenKind::LeftBracket, "expected '['")?;

        let mut values = self.arena.vec();
        while !self.check(TokenKind::RightBracket) && !self.is_at_end() {
            let before = self.current;
            values.push(self.parse_value()?);

            self.eat(TokenKind::Comma);

            if self.current == before {
                self.error_at_current("unable to parse list value");
                self.advance();
            }
        }

        self.expect(TokenKind::RightBracket, "expected ']'")?;

        Ok(Value::List(self.arena.alloc(ListValue {
            values: values.into_bump_slice(),
            offset,
        })))
    }

    fn parse_object_value(&mut self) -> Attempt<Value<'a>> {
        let offset = self.current_token().offset;
        self.expect(TokenKind::LeftBrace, "expected '{'")?;

        let mut fields = self.arena.vec();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.current;

            let field_offset = self.current_token().offset;
            // object field names accept keywords too
            if !self.check_name() {
                self.error_at_current("expected field name");
                self.advance();
                continue;
            }
            let name = self.advance().lexeme;

            self.expect(TokenKind::Colon, "expected ':'")?;

            let value = self.parse_value()?;

            fields.push(ObjectField {
                name,
                value,
                offset: field_offset,
            });

            self.eat(TokenKind::Comma);

            if self.current == before {
                self.error_at_current("unable to parse object field");
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace, "expected '}'")?;

        Ok(Value::Object(self.arena.alloc(ObjectValue {
            fields: fields.into_bump_slice(),
            offset,
        })))
    }
}
