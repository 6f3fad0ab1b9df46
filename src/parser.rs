/*!
Recursive-descent parser over the scanner's token stream.

Grammar (EBNF — condensed)
--------------------------

```text
program        → (NEWLINE | statement)* EOF ;
statement      → func_def | class_def | if_stmt | while_stmt
               | return_stmt | pass_stmt | simple_stmt ;
func_def       → "def" IDENT "(" parameters? ")" block ;
class_def      → "class" IDENT ( "(" expression ")" )? block ;
if_stmt        → "if" expression block
                 ( "elif" expression block )*
                 ( "else" block )? ;
while_stmt     → "while" expression block ;
return_stmt    → "return" expression? NEWLINE ;
pass_stmt      → "pass" NEWLINE ;
simple_stmt    → target "=" expression NEWLINE
               | target ("+="|"-="|"*="|"/=") expression NEWLINE
               | expression NEWLINE ;
block          → ":" NEWLINE INDENT statement+ DEDENT ;
parameters     → IDENT ( "," IDENT )* ;
expression     → or_expr ;
or_expr        → and_expr ( "or" and_expr )* ;
and_expr       → not_expr ( "and" not_expr )* ;
not_expr       → "not" not_expr | comparison ;
comparison     → term ( ( "<" | ">" | "==" ) term )* ;
term           → factor ( ( "+" | "-" ) factor )* ;
factor         → unary ( ( "*" | "/" ) unary )* ;
unary          → "-" unary | postfix ;
postfix        → primary ( "(" arguments? ")" | "." IDENT
                         | "[" expression "]" )* ;
arguments      → expression ( "," expression )* ;
primary        → INT | STRING | IDENT | "(" expression ")"
               | list_literal | dict_literal ;
```

Assignment targets are re-interpreted from parsed expressions (a bare
identifier, an attribute access, or an index access); anything else is an
"Invalid assignment target" error.  Grouping parentheses produce no tree
node, and a `-` folds into an integer literal where possible (otherwise
it desugars to `0 - x`).  `pass` parses to a no-op expression statement.

Each produced statement (and every call expression) carries a [`Loc`]:
its 1-based line number plus the raw text of that source line, consumed
later by diagnostic traceback frames.
*/

use std::rc::Rc;

use log::{debug, info};

use crate::error::{MiniPyError, Result};
use crate::expr::{BinOp, Expr, Loc};
use crate::stmt::{Stmt, Target};
use crate::token::{Token, TokenType};

/// Top-level parser over an owned token vector.
pub struct Parser {
    tokens: Vec<Token>,
    lines: Vec<String>,
    current: usize,
}

impl Parser {
    /// Construct a new parser.  `source` is the original program text,
    /// retained line-by-line so statement locations can carry the raw
    /// source line for tracebacks.
    pub fn new(tokens: Vec<Token>, source: &str) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            lines: source.lines().map(str::to_owned).collect(),
            current: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if self.matches(TokenType::NEWLINE) {
                continue;
            }

            let result = self.statement();

            if result.is_err() {
                self.synchronize();
            }

            statements.push(result?);
        }

        Ok(statements)
    }

    // ──────────────────────── statement rules ─────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement");

        if self.matches(TokenType::DEF) {
            self.function_def()
        } else if self.matches(TokenType::CLASS) {
            self.class_def()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::PASS) {
            self.pass_statement()
        } else {
            self.simple_statement()
        }
    }

    fn function_def(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expected function name")?;
        let loc = self.loc_at(name.line);

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name")?;

        let mut params: Vec<String> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    return Err(MiniPyError::parse(
                        name.line,
                        "Cannot have more than 255 parameters",
                    ));
                }

                let param = self.consume(TokenType::IDENTIFIER, "Expected parameter name")?;
                params.push(param.lexeme);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        let body = self.block()?;

        Ok(Stmt::FunctionDef {
            name: name.lexeme,
            params,
            body: Rc::new(body),
            loc,
        })
    }

    fn class_def(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expected class name")?;
        let loc = self.loc_at(name.line);

        // Optional single base class in parentheses; absent defaults to
        // the root object type at runtime.
        let base: Option<Expr> = if self.matches(TokenType::LEFT_PAREN) {
            let base = if self.check(TokenType::RIGHT_PAREN) {
                None
            } else {
                Some(self.expression()?)
            };

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after base class")?;
            base
        } else {
            None
        };

        let body = self.block()?;

        Ok(Stmt::ClassDef {
            name: name.lexeme,
            base,
            body,
            loc,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let line = self.previous_line();
        let loc = self.loc_at(line);

        let condition = self.expression()?;
        let body = self.block()?;

        let mut branches: Vec<(Expr, Vec<Stmt>)> = vec![(condition, body)];

        while self.matches(TokenType::ELIF) {
            let condition = self.expression()?;
            let body = self.block()?;
            branches.push((condition, body));
        }

        let else_body = if self.matches(TokenType::ELSE) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            branches,
            else_body,
            loc,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let line = self.previous_line();
        let loc = self.loc_at(line);

        let condition = self.expression()?;
        let body = self.block()?;

        Ok(Stmt::While {
            condition,
            body,
            loc,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let line = self.previous_line();
        let loc = self.loc_at(line);

        let value: Option<Expr> = if self.check(TokenType::NEWLINE) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::NEWLINE, "Expected end of line after return")?;

        Ok(Stmt::Return { value, loc })
    }

    /// `pass` is a no-op: an expression statement evaluating `None`.
    fn pass_statement(&mut self) -> Result<Stmt> {
        let line = self.previous_line();
        let loc = self.loc_at(line);

        self.consume(TokenType::NEWLINE, "Expected end of line after pass")?;

        Ok(Stmt::Expression {
            expr: Expr::Identifier {
                name: "None".to_string(),
                line,
            },
            loc,
        })
    }

    /// Assignment, augmented assignment, or a bare expression statement.
    fn simple_statement(&mut self) -> Result<Stmt> {
        let line = self.peek_line();
        let loc = self.loc_at(line);

        let expr = self.expression()?;

        let aug_op = match self.peek().token_type {
            TokenType::PLUS_EQUAL => Some(BinOp::Add),
            TokenType::MINUS_EQUAL => Some(BinOp::Sub),
            TokenType::STAR_EQUAL => Some(BinOp::Mul),
            TokenType::SLASH_EQUAL => Some(BinOp::Div),
            _ => None,
        };

        if let Some(op) = aug_op {
            self.advance();
            let target = self.to_target(expr, line)?;
            let value = self.expression()?;
            self.consume(TokenType::NEWLINE, "Expected end of line after assignment")?;

            return Ok(Stmt::AugAssign {
                target,
                op,
                value,
                loc,
            });
        }

        if self.matches(TokenType::EQUAL) {
            let target = self.to_target(expr, line)?;
            let value = self.expression()?;
            self.consume(TokenType::NEWLINE, "Expected end of line after assignment")?;

            return Ok(Stmt::Assign { target, value, loc });
        }

        self.consume(TokenType::NEWLINE, "Expected end of line after expression")?;

        Ok(Stmt::Expression { expr, loc })
    }

    /// Re-interpret a parsed expression as an assignment target.
    fn to_target(&self, expr: Expr, line: usize) -> Result<Target> {
        match expr {
            Expr::Identifier { name, .. } => Ok(Target::Name(name)),

            Expr::AttributeGet { object, name, .. } => Ok(Target::Attribute {
                object: *object,
                name,
            }),

            Expr::Index { object, index, .. } => Ok(Target::Index {
                object: *object,
                index: *index,
            }),

            _ => Err(MiniPyError::parse(line, "Invalid assignment target")),
        }
    }

    /// `":" NEWLINE INDENT statement+ DEDENT`
    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenType::COLON, "Expected ':'")?;
        self.consume(TokenType::NEWLINE, "Expected newline after ':'")?;
        self.consume(TokenType::INDENT, "Expected an indented block")?;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::DEDENT) && !self.is_at_end() {
            if self.matches(TokenType::NEWLINE) {
                continue;
            }

            statements.push(self.statement()?);
        }

        self.consume(TokenType::DEDENT, "Expected dedent after block")?;

        if statements.is_empty() {
            return Err(MiniPyError::parse(self.peek_line(), "Empty block"));
        }

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.and_expr()?;

        while self.matches(TokenType::OR) {
            let line = self.previous_line();
            let right = self.and_expr()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinOp::Or,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.not_expr()?;

        while self.matches(TokenType::AND) {
            let line = self.previous_line();
            let right = self.not_expr()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinOp::And,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if self.matches(TokenType::NOT) {
            let line = self.previous_line();
            let operand = self.not_expr()?;

            return Ok(Expr::Not {
                operand: Box::new(operand),
                line,
            });
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::LESS => BinOp::Lt,
                TokenType::GREATER => BinOp::Gt,
                TokenType::EQUAL_EQUAL => BinOp::Eq,
                _ => break,
            };

            self.advance();
            let line = self.previous_line();
            let right = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::PLUS => BinOp::Add,
                TokenType::MINUS => BinOp::Sub,
                _ => break,
            };

            self.advance();
            let line = self.previous_line();
            let right = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::STAR => BinOp::Mul,
                TokenType::SLASH => BinOp::Div,
                _ => break,
            };

            self.advance();
            let line = self.previous_line();
            let right = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    /// A leading `-` folds into an integer literal where possible and
    /// otherwise desugars to `0 - x`, keeping the tree's operator set to
    /// binary operators plus `not`.
    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::MINUS) {
            let line = self.previous_line();
            let operand = self.unary()?;

            return Ok(match operand {
                Expr::Int(n) => Expr::Int(-n),

                other => Expr::Binary {
                    left: Box::new(Expr::Int(0)),
                    op: BinOp::Sub,
                    right: Box::new(other),
                    line,
                },
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name = self.consume(TokenType::IDENTIFIER, "Expected attribute name after '.'")?;

                expr = Expr::AttributeGet {
                    object: Box::new(expr),
                    name: name.lexeme,
                    line: name.line,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let line = self.previous_line();
                let index = self.expression()?;
                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let line = self.previous_line();
        let mut args: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if args.len() >= 255 {
                    return Err(MiniPyError::parse(
                        self.peek_line(),
                        "Cannot have more than 255 arguments",
                    ));
                }

                args.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            loc: self.loc_at(line),
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::INT(0)) {
            if let TokenType::INT(n) = self.previous().token_type {
                return Ok(Expr::Int(n));
            }
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            let s = s.clone();
            self.advance();
            return Ok(Expr::Str(s));
        }

        if self.matches(TokenType::IDENTIFIER) {
            let token = self.previous();

            return Ok(Expr::Identifier {
                name: token.lexeme.clone(),
                line: token.line,
            });
        }

        // Grouping: no tree node of its own.
        if self.matches(TokenType::LEFT_PAREN) {
            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(expr);
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            return self.list_literal();
        }

        if self.matches(TokenType::LEFT_BRACE) {
            return self.dict_literal();
        }

        Err(MiniPyError::parse(self.peek_line(), "Expected expression"))
    }

    fn list_literal(&mut self) -> Result<Expr> {
        let mut elements: Vec<Expr> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACKET) {
            elements.push(self.expression()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after list elements")?;

        Ok(Expr::List(elements))
    }

    fn dict_literal(&mut self) -> Result<Expr> {
        let mut pairs: Vec<(Expr, Expr)> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) {
            let key = self.expression()?;
            self.consume(TokenType::COLON, "Expected ':' after dict key")?;
            let value = self.expression()?;
            pairs.push((key, value));

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after dict entries")?;

        Ok(Expr::Dict(pairs))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn loc_at(&self, line: usize) -> Loc {
        Loc {
            line,
            text: self
                .lines
                .get(line.saturating_sub(1))
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn peek_line(&self) -> usize {
        self.peek().line
    }

    fn previous_line(&self) -> usize {
        self.previous().line
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        Err(MiniPyError::parse(self.peek_line(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.current >= self.tokens.len() {
            return false;
        }

        self.peek().token_type == ttype
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::NEWLINE) {
                return;
            }

            match self.peek().token_type {
                TokenType::DEF
                | TokenType::CLASS
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
