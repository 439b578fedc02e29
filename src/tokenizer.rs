use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the query language.
///
/// Every operator has two spellings: an algebra glyph (σ, π, ρ, ⋈, ∪, ∩, −)
/// and an ASCII keyword. Both map onto the same token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- Punctuation ---
    /// Left parenthesis `(`
    LParen,
    /// Right parenthesis `)`
    RParen,
    /// Comma `,`
    Comma,
    /// Dot `.` (qualified attribute references)
    Dot,

    // --- Comparison operators ---
    Equal,
    NotEqual,
    Lt,
    Lte,
    Gt,
    Gte,

    // --- Algebra operators ---
    /// σ / `select` / `sigma`
    Sigma,
    /// π / `project` / `pi`
    Pi,
    /// ρ / `rename` / `rho`
    Rho,
    /// ⋈ or ⨝ / `join`
    Join,
    /// ∪ / `union`
    Union,
    /// ∩ / `intersect`
    Intersect,
    /// − or `-` (no keyword spelling)
    Minus,

    // --- Condition keywords ---
    And,
    Or,
    Not,

    // --- Identifiers & Literals ---
    /// A name referring to a relation or an attribute (e.g., `Employees`, `Age`).
    Ident(String),
    /// A decimal integer literal (digits only).
    Int(i64),
    /// A decimal floating literal (digits with a `.`).
    Double(f64),
    /// A string literal between single or double quotes, no escape processing.
    Str(String),

    // --- Special ---
    /// Represents the end of the input.
    Eof,
}

/// A lexical scanner that converts raw query text into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens, always
    /// terminated by [Token::Eof].
    ///
    /// # Errors
    /// Returns a lex error (with the character offset) on an unrecognized
    /// character, a bare `!`, a malformed number, or an unterminated string.
    ///
    /// # Example
    /// ```
    /// # use relalg::tokenizer::{Token, Tokenizer};
    /// let tokens = Tokenizer::new("π Name (Employees)").tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Pi);
    /// assert_eq!(tokens[1], Token::Ident("Name".into()));
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => {
                self.advance();
                Ok(Token::LParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RParen)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            '.' => {
                self.advance();
                Ok(Token::Dot)
            }
            '=' => {
                self.advance();
                Ok(Token::Equal)
            }
            '!' => {
                let offset = self.position;
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::NotEqual)
                } else {
                    Err(Error::Lex {
                        offset,
                        message: "unexpected '!'".to_string(),
                    })
                }
            }
            '<' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::Lte)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::Gte)
                } else {
                    Ok(Token::Gt)
                }
            }
            'σ' => {
                self.advance();
                Ok(Token::Sigma)
            }
            'π' => {
                self.advance();
                Ok(Token::Pi)
            }
            'ρ' => {
                self.advance();
                Ok(Token::Rho)
            }
            '⋈' | '⨝' => {
                self.advance();
                Ok(Token::Join)
            }
            '∪' => {
                self.advance();
                Ok(Token::Union)
            }
            '∩' => {
                self.advance();
                Ok(Token::Intersect)
            }
            '−' | '-' => {
                self.advance();
                Ok(Token::Minus)
            }
            '\'' | '"' => self.read_string(),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            _ => Err(self.err(&format!("unexpected character: {ch:?}"))),
        }
    }

    // --- Navigation helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn err(&self, message: &str) -> Error {
        Error::Lex {
            offset: self.position,
            message: message.to_string(),
        }
    }

    // --- Extraction logic ---

    /// Reads an identifier and reclassifies it as an operator token if it
    /// matches a keyword, case-insensitively.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_lowercase().as_str() {
            "select" | "sigma" => Token::Sigma,
            "project" | "pi" => Token::Pi,
            "rename" | "rho" => Token::Rho,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "join" => Token::Join,
            "union" => Token::Union,
            "intersect" => Token::Intersect,
            _ => Token::Ident(ident),
        }
    }

    /// Reads a numeric literal. A single interior `.` makes it a
    /// [Token::Double], otherwise it is a [Token::Int].
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        let mut has_dot = false;

        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || (self.current_char() == '.' && !has_dot))
        {
            if self.current_char() == '.' {
                has_dot = true;
            }
            number.push(self.current_char());
            self.advance();
        }

        if !self.is_at_end() && self.current_char() == '.' {
            return Err(self.err("multiple dots are not allowed in a number"));
        }

        // The dot must be interior: at least one digit has to follow it
        if number.ends_with('.') {
            return Err(self.err("expected a digit after '.'"));
        }

        if has_dot {
            return number
                .parse::<f64>()
                .map(Token::Double)
                .map_err(|e| self.err(&e.to_string()));
        }

        number
            .parse::<i64>()
            .map(Token::Int)
            .map_err(|e| self.err(&e.to_string()))
    }

    /// Reads a string literal enclosed in single or double quotes. There is
    /// no escape processing; the literal ends at the next matching quote.
    fn read_string(&mut self) -> Result<Token> {
        let quote = self.current_char();
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(self.err("unterminated string"));
        }

        // Skip the closing quote
        self.advance();

        Ok(Token::Str(string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_selection_with_glyphs() {
        let tokens = Tokenizer::new("σ Age > 30 (Employees)").tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Sigma,
                Token::Ident("Age".into()),
                Token::Gt,
                Token::Int(30),
                Token::LParen,
                Token::Ident("Employees".into()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = Tokenizer::new("SELECT PrOjEcT rho AND or NOT Join UNION intersect")
            .tokenize()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Sigma,
                Token::Pi,
                Token::Rho,
                Token::And,
                Token::Or,
                Token::Not,
                Token::Join,
                Token::Union,
                Token::Intersect,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_glyph_and_ascii_set_operators() {
        let glyphs = Tokenizer::new("A ∪ B ∩ C − D").tokenize().unwrap();
        let ascii = Tokenizer::new("A union B intersect C - D").tokenize().unwrap();
        assert_eq!(glyphs, ascii);
    }

    #[test]
    fn test_both_join_glyphs() {
        let a = Tokenizer::new("A ⋈ B").tokenize().unwrap();
        let b = Tokenizer::new("A ⨝ B").tokenize().unwrap();
        assert_eq!(a, b);
        assert_eq!(a[1], Token::Join);
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = Tokenizer::new("= != < <= > >=").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::Lt,
                Token::Lte,
                Token::Gt,
                Token::Gte,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Tokenizer::new("42 3.14 0").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(42),
                Token::Double(3.14),
                Token::Int(0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_number_with_two_dots() {
        let result = Tokenizer::new("1.2.3").tokenize();
        assert!(matches!(result, Err(Error::Lex { .. })));
    }

    #[test]
    fn test_number_with_trailing_dot() {
        // The dot of a double must sit between digits
        assert!(matches!(
            Tokenizer::new("1.").tokenize(),
            Err(Error::Lex { .. })
        ));
        assert!(matches!(
            Tokenizer::new("σ X > 1. (R)").tokenize(),
            Err(Error::Lex { .. })
        ));
    }

    #[test]
    fn test_strings_single_and_double_quoted() {
        let tokens = Tokenizer::new("'Alice' \"Bob Dylan\" ''").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Str("Alice".into()),
                Token::Str("Bob Dylan".into()),
                Token::Str(String::new()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let result = Tokenizer::new("'hello").tokenize();
        assert!(matches!(result, Err(Error::Lex { .. })));
    }

    #[test]
    fn test_qualified_attribute() {
        let tokens = Tokenizer::new("E.Age").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("E".into()),
                Token::Dot,
                Token::Ident("Age".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_bare_bang_is_error() {
        let result = Tokenizer::new("a ! b").tokenize();
        assert!(matches!(result, Err(Error::Lex { offset: 2, .. })));
    }

    #[test]
    fn test_unknown_character_reports_offset() {
        let result = Tokenizer::new("ab @").tokenize();
        assert!(matches!(result, Err(Error::Lex { offset: 3, .. })));
    }

    #[test]
    fn test_identifier_with_underscore() {
        let tokens = Tokenizer::new("_emp_2 selected").tokenize().unwrap();
        // "selected" is not the keyword "select"
        assert_eq!(
            tokens,
            vec![
                Token::Ident("_emp_2".into()),
                Token::Ident("selected".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_input_is_just_eof() {
        let tokens = Tokenizer::new("   ").tokenize().unwrap();
        assert_eq!(tokens, vec![Token::Eof]);
    }
}
