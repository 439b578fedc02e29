use crate::ast::{BinaryOp, RelExpr, ScalarExpr, SetOpKind};
use crate::error::{Error, Result};
use crate::tokenizer::Token;
use crate::value::Value;

/// Recursive-descent parser turning a token stream into a [RelExpr] tree.
///
/// Grammar, lowest to highest precedence:
/// ```text
/// query      := joinExpr ( (∪|∩|−) joinExpr )*
/// joinExpr   := unary ( ⋈ condition? unary )*
/// unary      := σ condition '(' query ')'
///             | π identList '(' query ')'
///             | ρ IDENT '(' query ')'
///             | primary
/// primary    := IDENT | '(' query ')'
/// condition  := orExpr
/// orExpr     := andExpr ( OR andExpr )*
/// andExpr    := notExpr ( AND notExpr )*
/// notExpr    := NOT notExpr | '(' condition ')' | comparison
/// comparison := operand ( (=|!=|<|<=|>|>=) operand )?
/// operand    := STRING | NUMBER | IDENT ('.' IDENT)?
/// identList  := IDENT (',' IDENT)*
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses a complete query. The end-of-input token must follow the
    /// top-level expression; trailing tokens are an error.
    ///
    /// # Errors
    /// Returns a parse error (token position, expected vs. found) on any
    /// grammar violation.
    ///
    /// # Example
    /// ```
    /// # use relalg::parser::Parser;
    /// # use relalg::tokenizer::Tokenizer;
    /// let tokens = Tokenizer::new("π Name (Employees)").tokenize().unwrap();
    /// let ast = Parser::new(tokens).parse().unwrap();
    /// assert_eq!(ast.to_string(), "π Name (Employees)");
    /// ```
    pub fn parse(&mut self) -> Result<RelExpr> {
        let expr = self.parse_set_expr()?;
        if !self.is_at_end() {
            return Err(self.error("end of input"));
        }
        Ok(expr)
    }

    // query := joinExpr ( (∪ | ∩ | −) joinExpr )*
    fn parse_set_expr(&mut self) -> Result<RelExpr> {
        let mut left = self.parse_join_expr()?;
        loop {
            let kind = match self.current_token() {
                Token::Union => SetOpKind::Union,
                Token::Intersect => SetOpKind::Intersect,
                Token::Minus => SetOpKind::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_join_expr()?;
            left = RelExpr::SetOp {
                kind,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // joinExpr := unary ( ⋈ condition? unary )*
    fn parse_join_expr(&mut self) -> Result<RelExpr> {
        let mut left = self.parse_unary()?;
        while matches!(self.current_token(), Token::Join) {
            self.advance();
            // Only parse a condition if the tokens don't look like the start
            // of the right-hand relation.
            let on = if self.starts_condition() && !self.looks_like_right_relation_start() {
                Some(self.parse_condition()?)
            } else {
                None
            };
            let right = self.parse_unary()?;
            left = RelExpr::Join {
                left: Box::new(left),
                right: Box::new(right),
                on,
            };
        }
        Ok(left)
    }

    /// Could the current token begin a condition expression?
    fn starts_condition(&self) -> bool {
        matches!(
            self.current_token(),
            Token::Ident(_)
                | Token::Int(_)
                | Token::Double(_)
                | Token::Str(_)
                | Token::LParen
                | Token::Not
        )
    }

    /// Lookahead heuristic after a JOIN token: an identifier followed by
    /// anything other than a comparison operator or a dot is probably the
    /// right-hand relation, not the first operand of a condition. This
    /// cannot tell a relation name from an attribute name in every case;
    /// the ambiguity is inherent to the grammar.
    fn looks_like_right_relation_start(&self) -> bool {
        if !matches!(self.current_token(), Token::Ident(_)) {
            return false;
        }
        !matches!(
            self.peek_next(),
            Token::Equal
                | Token::NotEqual
                | Token::Lt
                | Token::Lte
                | Token::Gt
                | Token::Gte
                | Token::Dot
        )
    }

    // unary := σ condition '(' query ')' | π identList '(' query ')'
    //        | ρ IDENT '(' query ')' | primary
    fn parse_unary(&mut self) -> Result<RelExpr> {
        match self.current_token() {
            Token::Sigma => {
                self.advance();
                let condition = self.parse_condition()?;
                self.consume(&Token::LParen)?;
                let child = self.parse_set_expr()?;
                self.consume(&Token::RParen)?;
                Ok(RelExpr::Selection {
                    condition,
                    child: Box::new(child),
                })
            }
            Token::Pi => {
                self.advance();
                let attrs = self.parse_ident_list()?;
                self.consume(&Token::LParen)?;
                let child = self.parse_set_expr()?;
                self.consume(&Token::RParen)?;
                Ok(RelExpr::Projection {
                    attrs,
                    child: Box::new(child),
                })
            }
            Token::Rho => {
                self.advance();
                let name = self.consume_ident()?;
                self.consume(&Token::LParen)?;
                let child = self.parse_set_expr()?;
                self.consume(&Token::RParen)?;
                Ok(RelExpr::Rename {
                    name,
                    child: Box::new(child),
                })
            }
            _ => self.parse_primary(),
        }
    }

    // primary := IDENT | '(' query ')'
    fn parse_primary(&mut self) -> Result<RelExpr> {
        match self.current_token() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(RelExpr::Relation(name))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_set_expr()?;
                self.consume(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(self.error("relation name or '('")),
        }
    }

    // ---------- conditions (precedence: OR < AND < NOT < comparison) ----------

    fn parse_condition(&mut self) -> Result<ScalarExpr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<ScalarExpr> {
        let mut left = self.parse_and()?;
        while matches!(self.current_token(), Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = ScalarExpr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<ScalarExpr> {
        let mut left = self.parse_not()?;
        while matches!(self.current_token(), Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = ScalarExpr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<ScalarExpr> {
        if matches!(self.current_token(), Token::Not) {
            self.advance();
            return Ok(ScalarExpr::Not(Box::new(self.parse_not()?)));
        }
        if matches!(self.current_token(), Token::LParen) {
            self.advance();
            let inner = self.parse_condition()?;
            self.consume(&Token::RParen)?;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    // comparison := operand ( (=|!=|<|<=|>|>=) operand )?
    fn parse_comparison(&mut self) -> Result<ScalarExpr> {
        let left = self.parse_operand()?;
        let op = match self.current_token() {
            Token::Equal => BinaryOp::Eq,
            Token::NotEqual => BinaryOp::Neq,
            Token::Lt => BinaryOp::Lt,
            Token::Lte => BinaryOp::Lte,
            Token::Gt => BinaryOp::Gt,
            Token::Gte => BinaryOp::Gte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_operand()?;
        Ok(ScalarExpr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    // operand := STRING | NUMBER | IDENT ('.' IDENT)?
    fn parse_operand(&mut self) -> Result<ScalarExpr> {
        match self.current_token() {
            Token::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(ScalarExpr::Literal(Value::Text(s.into())))
            }
            Token::Int(i) => {
                let i = *i;
                self.advance();
                Ok(ScalarExpr::Literal(Value::Int(i)))
            }
            Token::Double(d) => {
                let d = *d;
                self.advance();
                Ok(ScalarExpr::Literal(Value::Double(d)))
            }
            Token::Ident(_) => {
                let name = self.consume_ident()?;
                if matches!(self.current_token(), Token::Dot) {
                    self.advance();
                    let attr = self.consume_ident()?;
                    return Ok(ScalarExpr::AttrRef(format!("{name}.{attr}")));
                }
                Ok(ScalarExpr::AttrRef(name))
            }
            _ => Err(self.error("string, number or identifier")),
        }
    }

    // identList := IDENT (',' IDENT)*
    fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.consume_ident()?];
        while matches!(self.current_token(), Token::Comma) {
            self.advance();
            names.push(self.consume_ident()?);
        }
        Ok(names)
    }

    // ---------- token helpers ----------

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek_next(&self) -> &Token {
        self.tokens.get(self.position + 1).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: &Token) -> Result<()> {
        if self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("{expected:?}")))
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn error(&self, expected: &str) -> Error {
        Error::Parse {
            position: self.position,
            expected: expected.to_string(),
            found: format!("{:?}", self.current_token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse(input: &str) -> Result<RelExpr> {
        let tokens = Tokenizer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parse_relation() {
        assert_eq!(parse("Employees").unwrap(), RelExpr::Relation("Employees".into()));
    }

    #[test]
    fn test_parse_selection() {
        let ast = parse("σ Age > 30 (Employees)").unwrap();
        let RelExpr::Selection { condition, child } = ast else {
            panic!("expected selection, got {ast:?}");
        };
        assert_eq!(*child, RelExpr::Relation("Employees".into()));
        assert_eq!(
            condition,
            ScalarExpr::Binary {
                left: Box::new(ScalarExpr::AttrRef("Age".into())),
                op: BinaryOp::Gt,
                right: Box::new(ScalarExpr::Literal(Value::Int(30))),
            }
        );
    }

    #[test]
    fn test_keyword_and_glyph_forms_agree() {
        assert_eq!(
            parse("select Age > 30 (Employees)").unwrap(),
            parse("σ Age > 30 (Employees)").unwrap()
        );
        assert_eq!(
            parse("project Name (Employees)").unwrap(),
            parse("π Name (Employees)").unwrap()
        );
    }

    #[test]
    fn test_parse_projection_list() {
        let ast = parse("π Name, Age (Employees)").unwrap();
        let RelExpr::Projection { attrs, .. } = ast else {
            panic!("expected projection");
        };
        assert_eq!(attrs, vec!["Name".to_string(), "Age".to_string()]);
    }

    #[test]
    fn test_parse_rename() {
        let ast = parse("ρ Emp (Employees)").unwrap();
        assert_eq!(
            ast,
            RelExpr::Rename {
                name: "Emp".into(),
                child: Box::new(RelExpr::Relation("Employees".into())),
            }
        );
    }

    #[test]
    fn test_join_with_condition() {
        let ast = parse("Employees ⋈ EID = SID Takes").unwrap();
        let RelExpr::Join { left, right, on } = ast else {
            panic!("expected join");
        };
        assert_eq!(*left, RelExpr::Relation("Employees".into()));
        assert_eq!(*right, RelExpr::Relation("Takes".into()));
        assert!(on.is_some());
    }

    #[test]
    fn test_join_without_condition() {
        let ast = parse("A join B").unwrap();
        let RelExpr::Join { on, .. } = ast else {
            panic!("expected join");
        };
        assert!(on.is_none());
    }

    #[test]
    fn test_join_lookahead_dot_means_condition() {
        // "E.Age" after the join token starts a condition, not a relation
        let ast = parse("A ⋈ E.Age > 30 B").unwrap();
        let RelExpr::Join { on, .. } = ast else {
            panic!("expected join");
        };
        assert_eq!(
            on.unwrap(),
            ScalarExpr::Binary {
                left: Box::new(ScalarExpr::AttrRef("E.Age".into())),
                op: BinaryOp::Gt,
                right: Box::new(ScalarExpr::Literal(Value::Int(30))),
            }
        );
    }

    #[test]
    fn test_set_ops_left_associative() {
        let ast = parse("A ∪ B − C").unwrap();
        let RelExpr::SetOp { kind, left, .. } = ast else {
            panic!("expected set op");
        };
        assert_eq!(kind, SetOpKind::Minus);
        assert!(matches!(
            *left,
            RelExpr::SetOp {
                kind: SetOpKind::Union,
                ..
            }
        ));
    }

    #[test]
    fn test_join_binds_tighter_than_set_ops() {
        let ast = parse("A ∪ B ⋈ C").unwrap();
        let RelExpr::SetOp { kind, right, .. } = ast else {
            panic!("expected set op at the top");
        };
        assert_eq!(kind, SetOpKind::Union);
        assert!(matches!(*right, RelExpr::Join { .. }));
    }

    #[test]
    fn test_condition_precedence() {
        // or is looser than and
        let ast = parse("σ a = 1 or b = 2 and c = 3 (R)").unwrap();
        let RelExpr::Selection { condition, .. } = ast else {
            panic!("expected selection");
        };
        let ScalarExpr::Binary { op, right, .. } = condition else {
            panic!("expected binary condition");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(
            *right,
            ScalarExpr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_not_and_parens() {
        let ast = parse("σ not (a = 1 or b = 2) (R)").unwrap();
        let RelExpr::Selection { condition, .. } = ast else {
            panic!("expected selection");
        };
        assert!(matches!(condition, ScalarExpr::Not(_)));
    }

    #[test]
    fn test_double_literal() {
        let ast = parse("σ Price >= 9.99 (Products)").unwrap();
        let RelExpr::Selection { condition, .. } = ast else {
            panic!("expected selection");
        };
        let ScalarExpr::Binary { right, .. } = condition else {
            panic!("expected comparison");
        };
        assert_eq!(*right, ScalarExpr::Literal(Value::Double(9.99)));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("Employees Employees").unwrap_err();
        assert!(matches!(err, Error::Parse { position: 1, .. }));
    }

    #[test]
    fn test_missing_paren() {
        assert!(parse("σ Age > 30 Employees)").is_err());
        assert!(parse("π Name (Employees").is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_empty_token_vector_rejected() {
        // No Eof terminator at all; the parser must error, not index
        // out of bounds
        assert!(matches!(
            Parser::new(vec![]).parse(),
            Err(Error::Parse { position: 0, .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let queries = [
            "Employees",
            "σ Age > 30 (Employees)",
            "π Name, Age (σ Age >= 30 (Employees))",
            "ρ Emp (Employees)",
            "Employees ⋈ EID = SID Takes",
            "A join B",
            "A ⋈ E.Age > 30 B",
            "A ∪ B ∩ C − D",
            "(A ∪ B) ⋈ C",
            "σ not (a = 1 or b = 2) and c != 'x' (R)",
            "A ⋈ x = y (B ∪ C)",
            "σ X < 0.0000001 (R)",
            "σ Price >= 9.99 (Products)",
        ];
        for q in queries {
            let ast = parse(q).unwrap();
            let reparsed = parse(&ast.to_string())
                .unwrap_or_else(|e| panic!("canonical form of {q:?} failed to parse: {e}"));
            assert_eq!(ast, reparsed, "round trip mismatch for {q:?}");
        }
    }
}
