use super::error::CompileError;
use super::lexer::{Spanned, Token, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Number(f64),
    Variable(String),
    Negate(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Call(String, Vec<Node>),
}

/// A main expression followed by the intermediate definitions it may refer to.
///
/// Source text has the form `main; name1 = expr1; name2 = expr2`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedExpression {
    pub main: Node,
    pub definitions: Vec<(String, Node)>,
}

pub(crate) fn parse(source: &str) -> Result<ParsedExpression, CompileError> {
    let mut segments = source.split(';');
    let main_source = segments.next().unwrap_or_default();
    let main = Parser::new(tokenize(main_source)?).parse_complete()?;

    let mut definitions = Vec::new();
    for segment in segments {
        if segment.trim().is_empty() {
            continue;
        }
        definitions.push(parse_definition(segment)?);
    }

    Ok(ParsedExpression { main, definitions })
}

fn parse_definition(segment: &str) -> Result<(String, Node), CompileError> {
    let tokens = tokenize(segment)?;
    match tokens.as_slice() {
        [
            Spanned {
                token: Token::Identifier(name),
                ..
            },
            Spanned {
                token: Token::Equals,
                ..
            },
            rest @ ..,
        ] if !rest.is_empty() => {
            let name = name.clone();
            let node = Parser::new(rest.to_vec()).parse_complete()?;
            Ok((name, node))
        }
        _ => Err(CompileError::InvalidDefinition(segment.trim().to_string())),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, cursor: 0 }
    }

    fn parse_complete(mut self) -> Result<Node, CompileError> {
        let node = self.parse_sum()?;
        match self.tokens.get(self.cursor) {
            None => Ok(node),
            Some(extra) => Err(unexpected(extra)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|s| &s.token)
    }

    fn advance(&mut self) -> Result<&Spanned, CompileError> {
        let spanned = self
            .tokens
            .get(self.cursor)
            .ok_or(CompileError::UnexpectedEnd)?;
        self.cursor += 1;
        Ok(spanned)
    }

    fn expect(&mut self, expected: Token) -> Result<(), CompileError> {
        let spanned = self.advance()?;
        if spanned.token == expected {
            Ok(())
        } else {
            Err(unexpected(spanned))
        }
    }

    fn parse_sum(&mut self) -> Result<Node, CompileError> {
        let mut node = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(node),
            };
            self.cursor += 1;
            let rhs = self.parse_product()?;
            node = Node::Binary(op, Box::new(node), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> Result<Node, CompileError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(node),
            };
            self.cursor += 1;
            let rhs = self.parse_unary()?;
            node = Node::Binary(op, Box::new(node), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Node, CompileError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.cursor += 1;
                Ok(Node::Negate(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.cursor += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // `^` is right-associative and binds tighter than unary minus: -x^2 == -(x^2).
    fn parse_power(&mut self) -> Result<Node, CompileError> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.cursor += 1;
            let exponent = self.parse_unary()?;
            return Ok(Node::Binary(
                BinaryOp::Power,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, CompileError> {
        let spanned = self.advance()?.clone();
        match spanned.token {
            Token::Number(value) => Ok(Node::Number(value)),
            Token::Identifier(name) => {
                if self.peek() == Some(&Token::LeftParen) {
                    self.cursor += 1;
                    let args = self.parse_arguments()?;
                    Ok(Node::Call(name, args))
                } else {
                    Ok(Node::Variable(name))
                }
            }
            Token::LeftParen => {
                let node = self.parse_sum()?;
                self.expect(Token::RightParen)?;
                Ok(node)
            }
            _ => Err(unexpected(&spanned)),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, CompileError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RightParen) {
            self.cursor += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_sum()?);
            let spanned = self.advance()?;
            match spanned.token {
                Token::Comma => continue,
                Token::RightParen => return Ok(args),
                _ => return Err(unexpected(spanned)),
            }
        }
    }
}

fn unexpected(spanned: &Spanned) -> CompileError {
    CompileError::UnexpectedToken {
        token: spanned.token.to_string(),
        position: spanned.position,
    }
}
