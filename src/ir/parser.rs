//! Recursive descent parser for the textual IR
//!
//! Builds a [`ClassUnit`] from token stream output of the lexer. The parser
//! records label positions as instruction indices; slot assignment is left
//! to [`vartable`](super::vartable).

use std::collections::HashSet;
use std::fmt;

use super::lexer::{Lexer, LexicalToken, Token};
use super::{
    AccessLevel, Call, CallKind, ClassUnit, Element, Field, Instruction, Label, Location, Method,
    Operation, Param, Type,
};
use crate::error::Error;

/// Errors produced while parsing the textual IR
#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },
    UnexpectedEndOfInput {
        expected: String,
    },
    InvalidSyntax {
        message: String,
        location: Location,
    },
    LexicalError {
        message: String,
    },
}

impl ParseError {
    pub fn unexpected_token(expected: &str, found: &LexicalToken) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.lexeme().to_string(),
            location: found.location(),
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, location: Location) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            location,
        }
    }

    fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. } => *location,
            ParseError::InvalidSyntax { location, .. } => *location,
            ParseError::UnexpectedEndOfInput { .. } | ParseError::LexicalError { .. } => {
                Location::start()
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, .. } => {
                write!(f, "expected {}, found '{}'", expected, found)
            }
            ParseError::UnexpectedEndOfInput { expected } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            ParseError::InvalidSyntax { message, .. } => write!(f, "{}", message),
            ParseError::LexicalError { message } => write!(f, "{}", message),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        let location = e.location();
        Error::parse_error(location.line, location.column, e.to_string())
    }
}

/// Parse one textual IR compilation unit into a [`ClassUnit`]
pub fn parse_unit(source: &str) -> crate::error::Result<ClassUnit> {
    let parser = Parser::new(source)?;
    Ok(parser.parse()?)
}

/// Parser for the textual IR
pub struct Parser {
    tokens: Vec<LexicalToken>,
    current: usize,
}

impl Parser {
    /// Create a new parser from source text
    pub fn new(source: &str) -> crate::error::Result<Self> {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|message| Error::lexical_error(message))?;
        Ok(Self { tokens, current: 0 })
    }

    /// Parse the whole unit: imports, then exactly one class
    pub fn parse(mut self) -> Result<ClassUnit, ParseError> {
        let mut imports = Vec::new();
        while self.matches(&Token::Import) {
            imports.push(self.parse_qualified_name()?);
            self.expect(&Token::Semicolon, "';' after import")?;
        }

        self.expect(&Token::Class, "'class'")?;
        let name = self.expect_identifier("class name")?;
        let super_class = if self.matches(&Token::Extends) {
            Some(self.expect_identifier("superclass name")?)
        } else {
            None
        };
        self.expect(&Token::LBrace, "'{'")?;

        let mut fields = Vec::new();
        while self.check(&Token::FieldDir) {
            fields.push(self.parse_field()?);
        }

        let mut methods = Vec::new();
        while self.check(&Token::MethodDir) || self.check(&Token::ConstructDir) {
            methods.push(self.parse_method()?);
        }

        self.expect(&Token::RBrace, "'}' closing the class")?;
        if let Some(extra) = self.peek() {
            return Err(ParseError::unexpected_token("end of input", extra));
        }

        Ok(ClassUnit {
            name,
            super_class,
            imports,
            fields,
            methods,
        })
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier("import path segment")?;
        while self.matches(&Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier("import path segment")?);
        }
        Ok(name)
    }

    fn parse_access(&mut self) -> AccessLevel {
        if self.matches(&Token::Public) {
            AccessLevel::Public
        } else if self.matches(&Token::Private) {
            AccessLevel::Private
        } else if self.matches(&Token::Protected) {
            AccessLevel::Protected
        } else {
            AccessLevel::Default
        }
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        self.expect(&Token::FieldDir, "'.field'")?;
        let access = self.parse_access();
        let is_static = self.matches(&Token::Static);
        let is_final = self.matches(&Token::Final);
        let name = self.expect_identifier("field name")?;
        self.expect(&Token::Dot, "'.' before field type")?;
        let ty = self.parse_type()?;
        let initial_value = if self.matches(&Token::Assign) {
            let literal = self.expect(&Token::Integer, "literal initializer")?;
            Some(literal.lexeme().to_string())
        } else {
            None
        };
        self.expect(&Token::Semicolon, "';' after field")?;

        Ok(Field {
            name,
            ty,
            access,
            is_static,
            is_final,
            initial_value,
        })
    }

    fn parse_method(&mut self) -> Result<Method, ParseError> {
        let is_constructor = self.check(&Token::ConstructDir);
        self.advance();
        let access = self.parse_access();
        let is_static = self.matches(&Token::Static);
        let is_final = self.matches(&Token::Final);
        let name = self.expect_identifier("method name")?;

        self.expect(&Token::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let param_name = self.expect_identifier("parameter name")?;
                self.expect(&Token::Dot, "'.' before parameter type")?;
                let ty = self.parse_type()?;
                params.push(Param { name: param_name, ty });
                if !self.matches(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')'")?;
        self.expect(&Token::Dot, "'.' before return type")?;
        let return_type = self.parse_type()?;

        self.expect(&Token::LBrace, "'{'")?;
        let mut instructions = Vec::new();
        let mut labels: Vec<Label> = Vec::new();
        let mut seen_labels: HashSet<String> = HashSet::new();
        while !self.check(&Token::RBrace) {
            // Labels attach to the next instruction; several may stack up
            while self.check(&Token::Identifier) && self.check_ahead(1, &Token::Colon) {
                let label_token = self.expect(&Token::Identifier, "label")?;
                let label_name = label_token.lexeme().to_string();
                if !seen_labels.insert(label_name.clone()) {
                    return Err(ParseError::invalid_syntax(
                        format!("duplicate label '{}'", label_name),
                        label_token.location(),
                    ));
                }
                self.expect(&Token::Colon, "':' after label")?;
                labels.push(Label {
                    name: label_name,
                    target: instructions.len(),
                });
            }
            if self.check(&Token::RBrace) {
                return Err(ParseError::invalid_syntax(
                    "label must be followed by an instruction",
                    self.previous_location(),
                ));
            }
            instructions.push(self.parse_instruction()?);
            self.expect(&Token::Semicolon, "';' after instruction")?;
        }
        self.expect(&Token::RBrace, "'}' closing the method")?;

        Ok(Method {
            name,
            access,
            is_static,
            is_final,
            is_constructor,
            params,
            return_type,
            instructions,
            labels,
            var_table: Default::default(),
        })
    }

    /// Parse one instruction, including the right-hand side of an assignment
    fn parse_instruction(&mut self) -> Result<Instruction, ParseError> {
        match self.peek_token() {
            Some(Token::Goto) => {
                self.advance();
                let label = self.expect_identifier("jump target label")?;
                Ok(Instruction::Goto { label })
            }
            Some(Token::If) => {
                self.advance();
                self.expect(&Token::LParen, "'(' after 'if'")?;
                let condition = Box::new(self.parse_instruction()?);
                self.expect(&Token::RParen, "')' after condition")?;
                self.expect(&Token::Goto, "'goto'")?;
                let label = self.expect_identifier("jump target label")?;
                Ok(Instruction::Branch { condition, label })
            }
            Some(Token::Ret) => {
                self.advance();
                self.expect(&Token::Dot, "'.' before return type")?;
                let ty = self.parse_type()?;
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_element()?)
                };
                Ok(Instruction::Return { value, ty })
            }
            Some(Token::GetField) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let receiver = self.parse_element()?;
                self.expect(&Token::Comma, "','")?;
                let field = self.expect_identifier("field name")?;
                self.expect(&Token::Dot, "'.' before field type")?;
                let field_type = self.parse_type()?;
                self.expect(&Token::RParen, "')'")?;
                self.expect(&Token::Dot, "'.' before result type")?;
                self.parse_type()?;
                Ok(Instruction::GetField {
                    receiver,
                    field,
                    field_type,
                })
            }
            Some(Token::PutField) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let receiver = self.parse_element()?;
                self.expect(&Token::Comma, "','")?;
                let field = self.expect_identifier("field name")?;
                self.expect(&Token::Dot, "'.' before field type")?;
                let field_type = self.parse_type()?;
                self.expect(&Token::Comma, "','")?;
                let value = self.parse_element()?;
                self.expect(&Token::RParen, "')'")?;
                self.expect(&Token::Dot, "'.' before result type")?;
                self.parse_type()?;
                Ok(Instruction::PutField {
                    receiver,
                    field,
                    field_type,
                    value,
                })
            }
            Some(Token::New) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                if self.matches(&Token::Array) {
                    self.expect(&Token::Comma, "',' after 'array'")?;
                    let size = self.parse_element()?;
                    self.expect(&Token::RParen, "')'")?;
                    self.expect(&Token::Dot, "'.' before result type")?;
                    let return_type = self.parse_type()?;
                    Ok(Instruction::Call(Call {
                        kind: CallKind::ArrayNew,
                        target: size,
                        method: None,
                        args: Vec::new(),
                        return_type,
                    }))
                } else {
                    let class = self.expect_identifier("class name")?;
                    self.expect(&Token::RParen, "')'")?;
                    self.expect(&Token::Dot, "'.' before result type")?;
                    let return_type = self.parse_type()?;
                    Ok(Instruction::Call(Call {
                        kind: CallKind::New,
                        target: Element::Variable {
                            name: class.clone(),
                            ty: Type::Class(class),
                        },
                        method: None,
                        args: Vec::new(),
                        return_type,
                    }))
                }
            }
            Some(Token::ArrayLength) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let target = self.parse_element()?;
                self.expect(&Token::RParen, "')'")?;
                self.expect(&Token::Dot, "'.' before result type")?;
                let return_type = self.parse_type()?;
                Ok(Instruction::Call(Call {
                    kind: CallKind::ArrayLength,
                    target,
                    method: None,
                    args: Vec::new(),
                    return_type,
                }))
            }
            Some(Token::Ldc) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let target = self.parse_element()?;
                self.expect(&Token::RParen, "')'")?;
                let return_type = target.ty();
                Ok(Instruction::Call(Call {
                    kind: CallKind::LoadConstant,
                    target,
                    method: None,
                    args: Vec::new(),
                    return_type,
                }))
            }
            Some(Token::InvokeStatic) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let owner = self.expect_identifier("class name")?;
                let target = Element::Variable {
                    name: owner.clone(),
                    ty: Type::Class(owner),
                };
                let (method, args, return_type) = self.parse_invocation_tail()?;
                Ok(Instruction::Call(Call {
                    kind: CallKind::InvokeStatic,
                    target,
                    method: Some(method),
                    args,
                    return_type,
                }))
            }
            Some(Token::InvokeSpecial) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let target = self.parse_element()?;
                let (method, args, return_type) = self.parse_invocation_tail()?;
                Ok(Instruction::Call(Call {
                    kind: CallKind::InvokeSpecial,
                    target,
                    method: Some(method),
                    args,
                    return_type,
                }))
            }
            Some(Token::InvokeVirtual) => {
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let target = self.parse_element()?;
                let (method, args, return_type) = self.parse_invocation_tail()?;
                Ok(Instruction::Call(Call {
                    kind: CallKind::InvokeVirtual,
                    target,
                    method: Some(method),
                    args,
                    return_type,
                }))
            }
            Some(Token::Bang) => {
                self.advance();
                self.expect(&Token::Dot, "'.' before operator type")?;
                let ty = self.parse_type()?;
                let operand = self.parse_element()?;
                Ok(Instruction::UnaryOp {
                    op: Operation::Not,
                    operand,
                    ty,
                })
            }
            Some(_) => self.parse_element_led_instruction(),
            None => Err(ParseError::UnexpectedEndOfInput {
                expected: "instruction".to_string(),
            }),
        }
    }

    /// After `invoke*(<target>`: `, "name" (, arg)* ) . type`
    fn parse_invocation_tail(&mut self) -> Result<(String, Vec<Element>, Type), ParseError> {
        self.expect(&Token::Comma, "',' before method name")?;
        let name_token = self.expect(&Token::StringLiteral, "quoted method name")?;
        let method = name_token.lexeme().trim_matches('"').to_string();
        let mut args = Vec::new();
        while self.matches(&Token::Comma) {
            args.push(self.parse_element()?);
        }
        self.expect(&Token::RParen, "')'")?;
        self.expect(&Token::Dot, "'.' before return type")?;
        let return_type = self.parse_type()?;
        Ok((method, args, return_type))
    }

    /// Assignment, binary operation or a bare operand
    fn parse_element_led_instruction(&mut self) -> Result<Instruction, ParseError> {
        let element = self.parse_element()?;

        if self.matches(&Token::Assign) {
            let rhs = Box::new(self.parse_instruction()?);
            return Ok(Instruction::Assign { dest: element, rhs });
        }

        if self.peek_token().map(|t| t.is_binary_operator()).unwrap_or(false) {
            let op = self.parse_operator()?;
            self.expect(&Token::Dot, "'.' before operator type")?;
            let ty = self.parse_type()?;
            let right = self.parse_element()?;
            return Ok(Instruction::BinaryOp {
                op,
                left: element,
                right,
                ty,
            });
        }

        Ok(Instruction::SingleOperand(element))
    }

    fn parse_operator(&mut self) -> Result<Operation, ParseError> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEndOfInput {
                expected: "operator".to_string(),
            })?;
        match token.token {
            Token::Plus => Ok(Operation::Add),
            Token::Minus => Ok(Operation::Sub),
            Token::Star => Ok(Operation::Mul),
            Token::Slash => Ok(Operation::Div),
            Token::Lt => Ok(Operation::LessThan),
            Token::Ge => Ok(Operation::GreaterOrEqual),
            Token::Le => Ok(Operation::LessOrEqual),
            Token::AndAnd => Ok(Operation::And),
            _ => Err(ParseError::unexpected_token("operator", &token)),
        }
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        match self.peek_token() {
            Some(Token::This) => {
                self.advance();
                Ok(Element::This)
            }
            Some(Token::Integer) | Some(Token::StringLiteral) => {
                let token = self.advance().expect("peeked token");
                let value = token.lexeme().to_string();
                self.expect(&Token::Dot, "'.' before literal type")?;
                let ty = self.parse_type()?;
                Ok(Element::Literal { value, ty })
            }
            Some(Token::Identifier) => {
                let token = self.advance().expect("peeked token");
                let name = token.lexeme().to_string();
                if self.matches(&Token::LBracket) {
                    let index = Box::new(self.parse_element()?);
                    self.expect(&Token::RBracket, "']'")?;
                    self.expect(&Token::Dot, "'.' before element type")?;
                    let ty = self.parse_type()?;
                    Ok(Element::ArrayAccess { name, index, ty })
                } else {
                    self.expect(&Token::Dot, "'.' before variable type")?;
                    let ty = self.parse_type()?;
                    Ok(Element::Variable { name, ty })
                }
            }
            Some(_) => {
                let token = self.peek().expect("peeked token").clone();
                Err(ParseError::unexpected_token("operand", &token))
            }
            None => Err(ParseError::UnexpectedEndOfInput {
                expected: "operand".to_string(),
            }),
        }
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        if self.matches(&Token::Array) {
            self.expect(&Token::Dot, "'.' after 'array'")?;
            let element = self.expect_identifier("array element type")?;
            if element != "i32" {
                return Err(ParseError::invalid_syntax(
                    format!("unsupported array element type '{}'", element),
                    self.previous_location(),
                ));
            }
            return Ok(Type::IntArray);
        }
        let name = self.expect_identifier("type")?;
        Ok(match name.as_str() {
            "i32" => Type::Int,
            "bool" => Type::Bool,
            "V" => Type::Void,
            "String" => Type::String,
            _ => Type::Class(name),
        })
    }

    // Helper methods

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&LexicalToken> {
        self.tokens.get(self.current)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.token)
    }

    fn previous_location(&self) -> Location {
        if self.current == 0 {
            Location::start()
        } else {
            self.tokens[self.current - 1].location()
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.peek().map(|t| t.is(token)).unwrap_or(false)
    }

    fn check_ahead(&self, offset: usize, token: &Token) -> bool {
        self.tokens
            .get(self.current + offset)
            .map(|t| t.is(token))
            .unwrap_or(false)
    }

    fn advance(&mut self) -> Option<LexicalToken> {
        if self.is_at_end() {
            return None;
        }
        let token = self.tokens[self.current].clone();
        self.current += 1;
        Some(token)
    }

    /// Consume the token if it matches
    fn matches(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<LexicalToken, ParseError> {
        if self.check(token) {
            Ok(self.advance().expect("checked token"))
        } else {
            match self.peek() {
                Some(found) => Err(ParseError::unexpected_token(expected, found)),
                None => Err(ParseError::UnexpectedEndOfInput {
                    expected: expected.to_string(),
                }),
            }
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.expect(&Token::Identifier, what)?;
        Ok(token.lexeme().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_class() {
        let unit = parse_unit("class Simple { }").expect("parse failed");
        assert_eq!(unit.name, "Simple");
        assert!(unit.super_class.is_none());
        assert!(unit.fields.is_empty());
        assert!(unit.methods.is_empty());
    }

    #[test]
    fn test_parse_imports_and_extends() {
        let source = "import io.Console; import util.List; class A extends B { }";
        let unit = parse_unit(source).expect("parse failed");
        assert_eq!(unit.imports, vec!["io.Console", "util.List"]);
        assert_eq!(unit.super_class.as_deref(), Some("B"));
    }

    #[test]
    fn test_parse_field_declarations() {
        let source = "class A { .field private num.i32; .field public static final K.i32 := 7; }";
        let unit = parse_unit(source).expect("parse failed");
        assert_eq!(unit.fields.len(), 2);
        assert_eq!(unit.fields[0].access, AccessLevel::Private);
        assert!(unit.fields[1].is_static && unit.fields[1].is_final);
        assert_eq!(unit.fields[1].initial_value.as_deref(), Some("7"));
    }

    #[test]
    fn test_parse_assignment_with_binary_rhs() {
        let source = "class A { .method public f(a.i32).i32 { t0.i32 := a.i32 +.i32 1.i32; ret.i32 t0.i32; } }";
        let unit = parse_unit(source).expect("parse failed");
        let method = &unit.methods[0];
        assert_eq!(method.params.len(), 1);
        match &method.instructions[0] {
            Instruction::Assign { dest, rhs } => {
                assert_eq!(
                    dest,
                    &Element::Variable {
                        name: "t0".into(),
                        ty: Type::Int
                    }
                );
                assert!(matches!(
                    rhs.as_ref(),
                    Instruction::BinaryOp { op: Operation::Add, .. }
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_branch_and_labels() {
        let source = "class A { .method f().V { \
            loop_0: if (x.i32 <.bool 10.i32) goto body_0; \
            goto end_0; \
            body_0: x.i32 := x.i32 +.i32 1.i32; \
            end_0: ret.V; } }";
        let unit = parse_unit(source).expect("parse failed");
        let method = &unit.methods[0];
        assert_eq!(method.labels.len(), 3);
        assert_eq!(method.label("loop_0").unwrap().target, 0);
        assert_eq!(method.label("body_0").unwrap().target, 2);
        assert_eq!(method.label("end_0").unwrap().target, 3);
        assert!(matches!(method.instructions[0], Instruction::Branch { .. }));
    }

    #[test]
    fn test_parse_constructor_and_invocations() {
        let source = r#"class Fac {
            .construct public Fac().V {
                invokespecial(this, "<init>").V;
                ret.V;
            }
            .method public static main(args.String).V {
                t0.Fac := new(Fac).Fac;
                invokevirtual(t0.Fac, "run", 5.i32).i32;
                ret.V;
            }
        }"#;
        let unit = parse_unit(source).expect("parse failed");
        assert!(unit.methods[0].is_constructor);
        let main = &unit.methods[1];
        match &main.instructions[1] {
            Instruction::Call(call) => {
                assert_eq!(call.kind, CallKind::InvokeVirtual);
                assert_eq!(call.method.as_deref(), Some("run"));
                assert_eq!(call.args.len(), 1);
                assert_eq!(call.return_type, Type::Int);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_operations() {
        let source = "class A { .method f().V { \
            arr.array.i32 := new(array, 10.i32).array.i32; \
            arr[0.i32].i32 := 5.i32; \
            x.i32 := arr[1.i32].i32; \
            n.i32 := arraylength(arr.array.i32).i32; \
            ret.V; } }";
        let unit = parse_unit(source).expect("parse failed");
        let method = &unit.methods[0];
        assert!(matches!(
            &method.instructions[1],
            Instruction::Assign { dest: Element::ArrayAccess { .. }, .. }
        ));
        match &method.instructions[3] {
            Instruction::Assign { rhs, .. } => {
                assert!(matches!(
                    rhs.as_ref(),
                    Instruction::Call(Call { kind: CallKind::ArrayLength, .. })
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_label() {
        let source = "class A { .method f().V { l0: ret.V; l0: ret.V; } }";
        assert!(parse_unit(source).is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_label() {
        let source = "class A { .method f().V { ret.V; end: } }";
        assert!(parse_unit(source).is_err());
    }

    #[test]
    fn test_parse_rejects_non_int_array() {
        let source = "class A { .method f(a.array.bool).V { ret.V; } }";
        assert!(parse_unit(source).is_err());
    }
}
