//! Lexer for Zinc's natural-English surface syntax.
//!
//! The control vocabulary is multi-word phrases ("is greater than", "there
//! is a", "the square root of"). The phrase table is ordered longest-first;
//! at each position the first full match followed by a word boundary wins,
//! so the lexer never backtracks across more than one phrase attempt.

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Declarations
    ThereIs,
    Let,
    Be,
    WhichIs,
    Called,
    Is,

    // Types
    Number,
    Decimal,
    Letter,
    Text,
    YesOrNo,
    Boolean,
    Nothing,
    PointerTo,
    ListOf,

    // Literal keywords
    Yes,
    No,
    Null,

    // Assignment
    Change,
    Set,
    Now,
    Make,
    To,
    EqualTo,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Increase,
    Decrease,
    Plus,
    Minus,
    Times,
    DividedBy,
    Modulo,
    ToThePowerOf,

    // Math functions
    SquareRootOf,
    AbsoluteValueOf,
    TheSumOf,
    Negative,

    // Comparisons
    GreaterThan,
    LessThan,
    Equals,
    SameAs,
    NotEqualTo,
    AtLeast,
    AtMost,
    Between,
    Positive,
    IsNegative,
    IsZero,
    IsEven,
    IsOdd,
    Contains,
    IsEmpty,

    // Logic
    And,
    Or,
    Not,
    ItIsNotTheCaseThat,

    // Control flow
    If,
    Then,
    Otherwise,
    End,

    // Loops
    Repeat,
    While,
    ForEach,
    From,
    DownTo,
    In,
    StopTheLoop,
    SkipToNext,
    LeaveTheLoop,
    ContinueNext,
    KeepDoing,

    // Functions
    Return,
    ResultOf,
    AndReturn,

    // Output
    Say,
    Print,
    Show,
    Display,
    AndThen,
    FollowedBy,
    TheValueOf,

    // Input
    AskUserFor,
    StoreIn,
    Read,
    Into,
    GetInput,

    // Arrays
    Containing,
    FirstItemIn,
    LastItemIn,
    ItemNumber,
    LengthOf,
    SizeOf,
    HowManyIn,
    AddToList,
    RemoveFrom,
    ElementOf,

    // Structures
    Define,
    AsHaving,
    Has,
    ApostropheS,

    // Pointers / memory
    AddressOf,
    ValueAt,
    PointsTo,
    Allocate,
    Free,
    SpaceFor,

    // Includes
    Include,
    Use,
    StandardIo,
    StandardMath,
    StringFunctions,
    FileFunctions,
    RandomFunctions,
    RaylibGraphics,

    // GUI
    OpenWindow,
    CloseWindow,
    WindowShouldClose,
    BeginDrawing,
    EndDrawing,
    ClearScreen,
    DrawRectangle,
    DrawText,
    MouseX,
    MouseY,
    MousePressed,

    // Files
    FileCalled,
    Opens,
    ForReading,
    ForWriting,
    FailedToOpen,
    CloseFile,
    AnotherLineIn,
    ReadLineFrom,

    // Program control
    StopProgram,
    DoMain,

    // Comments
    Note,
    Notes,
    EndNotes,
    Reminder,

    // Random
    RandomNumber,

    // Literals and identifiers
    StringLiteral,
    NumberLiteral,
    DecimalLiteral,
    CharLiteral,
    Identifier,

    // Punctuation
    Colon,
    Comma,
    Newline,

    // Filler words
    A,
    An,
    The,
    Of,
    With,

    Eof,
}

/// A lexical unit with its source position (1-indexed line and column).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Token {
        Token {
            kind,
            value: value.into(),
            line,
            column,
        }
    }
}

/// Multi-word phrases and their token kinds. Order matters: longer phrases
/// come before their prefixes, and the first match wins.
const PHRASES: &[(&str, TokenKind)] = &[
    ("it is not the case that", TokenKind::ItIsNotTheCaseThat),
    ("ask the user for a number and store it in", TokenKind::AskUserFor),
    ("ask the user for a decimal and store it in", TokenKind::AskUserFor),
    ("ask the user for a letter and store it in", TokenKind::AskUserFor),
    ("ask the user for text and store it in", TokenKind::AskUserFor),
    ("the standard input and output", TokenKind::StandardIo),
    ("the standard math functions", TokenKind::StandardMath),
    ("the string functions", TokenKind::StringFunctions),
    ("the file functions", TokenKind::FileFunctions),
    ("the random functions", TokenKind::RandomFunctions),
    ("the graphics library", TokenKind::RaylibGraphics),
    ("raylib graphics", TokenKind::RaylibGraphics),
    ("open a window sized", TokenKind::OpenWindow),
    ("open window sized", TokenKind::OpenWindow),
    ("close the window", TokenKind::CloseWindow),
    ("the window should close", TokenKind::WindowShouldClose),
    ("window should close", TokenKind::WindowShouldClose),
    ("begin drawing", TokenKind::BeginDrawing),
    ("start drawing", TokenKind::BeginDrawing),
    ("end drawing", TokenKind::EndDrawing),
    ("stop drawing", TokenKind::EndDrawing),
    ("clear the screen with", TokenKind::ClearScreen),
    ("clear screen with", TokenKind::ClearScreen),
    ("draw a rectangle at", TokenKind::DrawRectangle),
    ("draw rectangle at", TokenKind::DrawRectangle),
    ("draw text", TokenKind::DrawText),
    ("the mouse x position", TokenKind::MouseX),
    ("mouse x", TokenKind::MouseX),
    ("the mouse y position", TokenKind::MouseY),
    ("mouse y", TokenKind::MouseY),
    ("the mouse was clicked", TokenKind::MousePressed),
    ("mouse is pressed", TokenKind::MousePressed),
    ("mouse was pressed", TokenKind::MousePressed),
    ("a random number between", TokenKind::RandomNumber),
    ("continue with the next iteration", TokenKind::ContinueNext),
    ("skip to the next one", TokenKind::SkipToNext),
    ("leave the loop", TokenKind::LeaveTheLoop),
    ("stop the loop", TokenKind::StopTheLoop),
    ("stop the program", TokenKind::StopProgram),
    ("do the main thing", TokenKind::DoMain),
    ("the absolute value of", TokenKind::AbsoluteValueOf),
    ("the square root of", TokenKind::SquareRootOf),
    ("to the power of", TokenKind::ToThePowerOf),
    ("the sum of", TokenKind::TheSumOf),
    ("there is another line in", TokenKind::AnotherLineIn),
    ("read a line from", TokenKind::ReadLineFrom),
    ("failed to open", TokenKind::FailedToOpen),
    ("close the file", TokenKind::CloseFile),
    ("for reading", TokenKind::ForReading),
    ("for writing", TokenKind::ForWriting),
    ("the file called", TokenKind::FileCalled),
    ("the result of", TokenKind::ResultOf),
    ("the value that", TokenKind::ValueAt),
    ("the value of", TokenKind::TheValueOf),
    ("the value at", TokenKind::ValueAt),
    ("the address of", TokenKind::AddressOf),
    ("points to", TokenKind::PointsTo),
    ("allocate space for", TokenKind::Allocate),
    ("free the memory at", TokenKind::Free),
    ("space for", TokenKind::SpaceFor),
    ("and call it", TokenKind::Called),
    ("pointer to", TokenKind::PointerTo),
    ("list of", TokenKind::ListOf),
    ("is greater than", TokenKind::GreaterThan),
    ("is less than", TokenKind::LessThan),
    ("is the same as", TokenKind::SameAs),
    ("is not equal to", TokenKind::NotEqualTo),
    ("not equal to", TokenKind::NotEqualTo),
    ("is at least", TokenKind::AtLeast),
    ("is at most", TokenKind::AtMost),
    ("is between", TokenKind::Between),
    ("is positive", TokenKind::Positive),
    ("is negative", TokenKind::IsNegative),
    ("is zero", TokenKind::IsZero),
    ("is even", TokenKind::IsEven),
    ("is odd", TokenKind::IsOdd),
    ("is empty", TokenKind::IsEmpty),
    ("is not", TokenKind::NotEqualTo),
    ("is yes", TokenKind::Yes),
    ("is no", TokenKind::No),
    ("equals yes", TokenKind::Yes),
    ("equals no", TokenKind::No),
    ("yes or no", TokenKind::YesOrNo),
    ("divided by", TokenKind::DividedBy),
    ("and then", TokenKind::AndThen),
    ("followed by", TokenKind::FollowedBy),
    ("down to", TokenKind::DownTo),
    ("for each", TokenKind::ForEach),
    ("there is a file called", TokenKind::ThereIs),
    ("there is a", TokenKind::ThereIs),
    ("there is an", TokenKind::ThereIs),
    ("there is", TokenKind::ThereIs),
    ("which is", TokenKind::WhichIs),
    ("which has", TokenKind::Has),
    ("which opens", TokenKind::Opens),
    ("equal to", TokenKind::EqualTo),
    ("make equal to", TokenKind::EqualTo),
    ("the first item in", TokenKind::FirstItemIn),
    ("first item in", TokenKind::FirstItemIn),
    ("the last item in", TokenKind::LastItemIn),
    ("last item in", TokenKind::LastItemIn),
    ("item number", TokenKind::ItemNumber),
    ("the length of", TokenKind::LengthOf),
    ("length of", TokenKind::LengthOf),
    ("the size of", TokenKind::SizeOf),
    ("how many items are in", TokenKind::HowManyIn),
    ("add to", TokenKind::AddToList),
    ("remove the last item from", TokenKind::RemoveFrom),
    ("element of", TokenKind::ElementOf),
    ("as having", TokenKind::AsHaving),
    ("and return", TokenKind::AndReturn),
    ("the character at position", TokenKind::ItemNumber),
    ("keep doing this while", TokenKind::KeepDoing),
    ("get input from the user as", TokenKind::GetInput),
    ("read a number into", TokenKind::Read),
    ("read text into", TokenKind::Read),
    ("print the value of", TokenKind::Print),
    ("end notes", TokenKind::EndNotes),
];

/// Single-word keywords. Identifiers are rewritten through this map.
fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "include" => TokenKind::Include,
        "use" => TokenKind::Use,
        "let" => TokenKind::Let,
        "be" => TokenKind::Be,
        "called" => TokenKind::Called,
        "is" => TokenKind::Is,
        "number" | "numbers" => TokenKind::Number,
        "decimal" | "decimals" => TokenKind::Decimal,
        "letter" | "letters" => TokenKind::Letter,
        "text" => TokenKind::Text,
        "boolean" => TokenKind::Boolean,
        "nothing" => TokenKind::Nothing,
        "yes" => TokenKind::Yes,
        "no" => TokenKind::No,
        "null" => TokenKind::Null,
        "change" => TokenKind::Change,
        "set" => TokenKind::Set,
        "now" => TokenKind::Now,
        "make" => TokenKind::Make,
        "to" => TokenKind::To,
        "add" => TokenKind::Add,
        "subtract" => TokenKind::Subtract,
        "multiply" => TokenKind::Multiply,
        "divide" => TokenKind::Divide,
        "increase" => TokenKind::Increase,
        "decrease" => TokenKind::Decrease,
        "plus" => TokenKind::Plus,
        "minus" => TokenKind::Minus,
        "times" => TokenKind::Times,
        "modulo" => TokenKind::Modulo,
        "negative" => TokenKind::Negative,
        "equals" => TokenKind::Equals,
        "contains" => TokenKind::Contains,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "otherwise" => TokenKind::Otherwise,
        "end" => TokenKind::End,
        "repeat" => TokenKind::Repeat,
        "while" => TokenKind::While,
        "from" => TokenKind::From,
        "in" => TokenKind::In,
        "return" => TokenKind::Return,
        "say" => TokenKind::Say,
        "print" => TokenKind::Print,
        "show" => TokenKind::Show,
        "display" => TokenKind::Display,
        "containing" => TokenKind::Containing,
        "define" => TokenKind::Define,
        "has" => TokenKind::Has,
        "a" => TokenKind::A,
        "an" => TokenKind::An,
        "the" => TokenKind::The,
        "of" => TokenKind::Of,
        "with" => TokenKind::With,
        "note" => TokenKind::Note,
        "notes" => TokenKind::Notes,
        "reminder" => TokenKind::Reminder,
        "into" => TokenKind::Into,
        "opens" => TokenKind::Opens,
        "store" => TokenKind::StoreIn,
        // "multiply x by 2" reads "by" as the operator word
        "by" => TokenKind::Times,
        _ => return None,
    })
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn error(&self, msg: &str) -> String {
        format!(
            "Lexer error at line {}, column {}: {}",
            self.line, self.column, msg
        )
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\r') {
            self.advance();
        }
    }

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn read_string(&mut self) -> Result<String, String> {
        self.advance(); // opening quote
        let mut result = String::new();
        while self.peek() != '"' && self.peek() != '\0' {
            if self.peek() == '\\' {
                self.advance();
                let ch = self.advance();
                match ch {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    '\'' => result.push('\''),
                    other => result.push(other),
                }
            } else {
                result.push(self.advance());
            }
        }
        if self.peek() == '\0' {
            return Err(self.error("Unterminated string literal"));
        }
        self.advance(); // closing quote
        Ok(result)
    }

    fn read_char_literal(&mut self) -> Result<char, String> {
        self.advance(); // opening quote
        let value = if self.peek() == '\\' {
            self.advance();
            match self.advance() {
                'n' => '\n',
                't' => '\t',
                other => other,
            }
        } else {
            self.advance()
        };
        if self.peek() != '\'' {
            return Err(self.error("Unterminated character literal"));
        }
        self.advance(); // closing quote
        Ok(value)
    }

    /// Reads a numeric literal; returns its text and whether it is a decimal
    /// (a dot counts only when followed by a digit).
    fn read_number(&mut self) -> (String, bool) {
        let mut result = String::new();
        let mut is_decimal = false;

        if self.peek() == '-' {
            result.push(self.advance());
        }
        while self.peek().is_ascii_digit() {
            result.push(self.advance());
        }
        if self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
            is_decimal = true;
            result.push(self.advance());
            while self.peek().is_ascii_digit() {
                result.push(self.advance());
            }
        }

        (result, is_decimal)
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while Self::is_word_char(self.peek()) {
            result.push(self.advance());
        }
        result
    }

    /// Longest-prefix phrase match at the current position, with a word
    /// boundary required after the phrase.
    fn try_match_phrase(&self) -> Option<(&'static str, TokenKind)> {
        for &(phrase, kind) in PHRASES {
            if self.phrase_matches(phrase) {
                let boundary = self.peek_at(phrase.chars().count());
                if Self::is_word_char(boundary) {
                    continue;
                }
                return Some((phrase, kind));
            }
        }
        None
    }

    fn phrase_matches(&self, phrase: &str) -> bool {
        for (i, expected) in phrase.chars().enumerate() {
            let actual = self.peek_at(i);
            if actual.to_ascii_lowercase() != expected {
                return false;
            }
        }
        true
    }

    fn add_token(&mut self, kind: TokenKind, value: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, value, line, column));
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        while self.pos < self.chars.len() {
            self.skip_whitespace();
            if self.pos >= self.chars.len() {
                break;
            }

            let ch = self.peek();
            let line = self.line;
            let column = self.column;

            // Newlines are statement separators, so they become tokens.
            if ch == '\n' {
                self.advance();
                self.add_token(TokenKind::Newline, "\n", line, column);
                continue;
            }

            // '#' comments run to end of line.
            if ch == '#' {
                while self.peek() != '\n' && self.peek() != '\0' {
                    self.advance();
                }
                continue;
            }

            if ch == '"' {
                let value = self.read_string()?;
                self.add_token(TokenKind::StringLiteral, value, line, column);
                continue;
            }

            // Possessive 's must be checked before character literals.
            if ch == '\'' && self.peek_at(1) == 's' && !self.peek_at(2).is_alphanumeric() {
                self.advance();
                self.advance();
                self.add_token(TokenKind::ApostropheS, "'s", line, column);
                continue;
            }

            if ch == '\'' {
                let value = self.read_char_literal()?;
                self.add_token(TokenKind::CharLiteral, value.to_string(), line, column);
                continue;
            }

            if ch.is_ascii_digit() || (ch == '-' && self.peek_at(1).is_ascii_digit()) {
                let (value, is_decimal) = self.read_number();
                let kind = if is_decimal {
                    TokenKind::DecimalLiteral
                } else {
                    TokenKind::NumberLiteral
                };
                self.add_token(kind, value, line, column);
                continue;
            }

            if ch == ':' {
                self.advance();
                self.add_token(TokenKind::Colon, ":", line, column);
                continue;
            }

            if ch == ',' {
                self.advance();
                self.add_token(TokenKind::Comma, ",", line, column);
                continue;
            }

            // Multi-word phrases take precedence over single words.
            if let Some((phrase, kind)) = self.try_match_phrase() {
                for _ in phrase.chars() {
                    self.advance();
                }
                self.add_token(kind, phrase, line, column);
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                let word = self.read_word();
                let lower = word.to_lowercase();
                match keyword(&lower) {
                    Some(kind) => self.add_token(kind, word, line, column),
                    None => self.add_token(TokenKind::Identifier, word, line, column),
                }
                continue;
            }

            // Stray characters are skipped.
            self.advance();
        }

        self.add_token(TokenKind::Eof, "", self.line, self.column);
        Ok(self.tokens)
    }
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Newline)
            .collect()
    }

    #[test]
    fn test_phrase_longest_match() {
        // "is greater than" must win over "is" + words
        let ks = kinds("x is greater than 3");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier,
                TokenKind::GreaterThan,
                TokenKind::NumberLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_phrase_requires_word_boundary() {
        // "ended" must not match the "end" keyword path through a phrase;
        // "for each" must not match inside "for eachother"
        let ks = kinds("for eachother");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier, // "for" is not a keyword on its own
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        let ks = kinds("for each");
        assert_eq!(ks, vec![TokenKind::ForEach, TokenKind::Eof]);
    }

    #[test]
    fn test_case_insensitive_phrases_and_keywords() {
        let ks = kinds("If X Is Greater Than 2 Then");
        assert_eq!(
            ks,
            vec![
                TokenKind::If,
                TokenKind::Identifier,
                TokenKind::GreaterThan,
                TokenKind::NumberLiteral,
                TokenKind::Then,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        let tokens = tokenize(r#"say "a\tb\n\"q\"""#).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].value, "a\tb\n\"q\"");
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let err = tokenize("say \"oops").unwrap_err();
        assert!(err.contains("Unterminated string literal"));
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_char_literal_and_possessive() {
        let tokens = tokenize("p's name is 'x'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::ApostropheS);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Is);
        assert_eq!(tokens[4].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[4].value, "x");
    }

    #[test]
    fn test_unterminated_char_literal_is_fatal() {
        let err = tokenize("'ab").unwrap_err();
        assert!(err.contains("Unterminated character literal"));
    }

    #[test]
    fn test_numeric_literals() {
        let tokens = tokenize("5 -12 3.25 7.").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[0].value, "5");
        assert_eq!(tokens[1].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[1].value, "-12");
        assert_eq!(tokens[2].kind, TokenKind::DecimalLiteral);
        assert_eq!(tokens[2].value, "3.25");
        // a dot not followed by a digit is not part of the number
        assert_eq!(tokens[3].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[3].value, "7");
    }

    #[test]
    fn test_hash_comment_consumed_to_eol() {
        let ks = kinds("# a comment with keywords if then end\nsay 1");
        assert_eq!(
            ks,
            vec![TokenKind::Say, TokenKind::NumberLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        let tokens = tokenize("say 1\nsay 2").unwrap();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline));
    }

    #[test]
    fn test_line_and_column_positions() {
        let tokens = tokenize("say 1\n  say 2").unwrap();
        let second_say = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Say)
            .nth(1)
            .unwrap();
        assert_eq!(second_say.line, 2);
        assert_eq!(second_say.column, 3);
    }

    #[test]
    fn test_declaration_phrases() {
        let ks = kinds("there is a number called x which is 5");
        assert_eq!(
            ks,
            vec![
                TokenKind::ThereIs,
                TokenKind::Number,
                TokenKind::Called,
                TokenKind::Identifier,
                TokenKind::WhichIs,
                TokenKind::NumberLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_include_phrase() {
        let ks = kinds("include the standard input and output");
        assert_eq!(ks, vec![TokenKind::Include, TokenKind::StandardIo, TokenKind::Eof]);
    }

    #[test]
    fn test_plural_type_words() {
        let ks = kinds("allocate space for 10 numbers");
        assert_eq!(
            ks,
            vec![
                TokenKind::Allocate,
                TokenKind::NumberLiteral,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_values_reconstruct_source_words() {
        let source = "there is a number called x which is 5";
        let tokens = tokenize(source).unwrap();
        let joined: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(joined.join(" "), source);
    }
}
