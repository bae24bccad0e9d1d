use logos::Logos;

use super::Location;

/// Token types for the textual IR
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    // Directives
    #[token(".field")]
    FieldDir,
    #[token(".method")]
    MethodDir,
    #[token(".construct")]
    ConstructDir,

    // Keywords
    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("static")]
    Static,
    #[token("final")]
    Final,
    #[token("this")]
    This,
    #[token("array")]
    Array,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("ret")]
    Ret,
    #[token("getfield")]
    GetField,
    #[token("putfield")]
    PutField,
    #[token("new")]
    New,
    #[token("arraylength")]
    ArrayLength,
    #[token("ldc")]
    Ldc,
    #[token("invokestatic")]
    InvokeStatic,
    #[token("invokespecial")]
    InvokeSpecial,
    #[token("invokevirtual")]
    InvokeVirtual,

    // Operators and punctuation
    #[token(":=")]
    Assign,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token("&&")]
    AndAnd,
    #[token("!")]
    Bang,

    // Literals and identifiers
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r#""[^"\n]*""#)]
    StringLiteral,
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    // Trivia, filtered out by `tokenize`
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    LineComment,
}

impl Token {
    /// Check if this token starts a binary operator
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus | Token::Minus | Token::Star | Token::Slash
                | Token::Lt | Token::Ge | Token::Le | Token::AndAnd
        )
    }
}

/// Lexical token with location information
#[derive(Debug, Clone)]
pub struct LexicalToken {
    pub token: Token,
    pub lexeme: String,
    pub location: Location,
}

impl LexicalToken {
    pub fn new(token: Token, lexeme: String, location: Location) -> Self {
        Self { token, lexeme, location }
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Check if this token matches the given token type
    pub fn is(&self, token_type: &Token) -> bool {
        std::mem::discriminant(&self.token) == std::mem::discriminant(token_type)
    }
}

/// Lexer for the textual IR
pub struct Lexer<'a> {
    lexer: logos::Lexer<'a, Token>,
    current_line: usize,
    current_column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Token::lexer(source),
            current_line: 1,
            current_column: 1,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Result<LexicalToken, String>> {
        let token = self.lexer.next()?;
        let lexeme = self.lexer.slice().to_string();
        let location = Location::new(self.current_line, self.current_column);
        self.update_position(&lexeme);

        match token {
            Ok(token) => Some(Ok(LexicalToken::new(token, lexeme, location))),
            Err(_) => Some(Err(format!(
                "unexpected character '{}' at {}:{}",
                lexeme, location.line, location.column
            ))),
        }
    }

    /// Update the current position based on the lexeme
    fn update_position(&mut self, lexeme: &str) {
        for ch in lexeme.chars() {
            if ch == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }

    /// Get all tokens from the source, skipping whitespace and comments
    pub fn tokenize(mut self) -> Result<Vec<LexicalToken>, String> {
        let mut tokens = Vec::new();

        while let Some(result) = self.next_token() {
            match result {
                Ok(token) => {
                    if !matches!(token.token, Token::Whitespace | Token::LineComment) {
                        tokens.push(token);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(tokens)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<LexicalToken, String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_assignment() {
        let tokens = Lexer::new("t0.i32 := a.i32 +.i32 1.i32;")
            .tokenize()
            .expect("lexing failed");
        let kinds: Vec<&Token> = tokens.iter().map(|t| &t.token).collect();
        assert_eq!(
            kinds,
            vec![
                &Token::Identifier, &Token::Dot, &Token::Identifier,
                &Token::Assign,
                &Token::Identifier, &Token::Dot, &Token::Identifier,
                &Token::Plus, &Token::Dot, &Token::Identifier,
                &Token::Integer, &Token::Dot, &Token::Identifier,
                &Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = Lexer::new("// header\nret.V; // trailing\n")
            .tokenize()
            .expect("lexing failed");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].is(&Token::Ret));
        assert_eq!(tokens[0].location().line, 2);
    }

    #[test]
    fn test_tokenize_directives_and_strings() {
        let tokens = Lexer::new(r#".method invokevirtual(o.Fac, "run").V"#)
            .tokenize()
            .expect("lexing failed");
        assert!(tokens[0].is(&Token::MethodDir));
        assert!(tokens.iter().any(|t| t.is(&Token::StringLiteral)));
    }

    #[test]
    fn test_tokenize_rejects_unknown_character() {
        assert!(Lexer::new("x ^ y").tokenize().is_err());
    }
}
