use arch::op::Mnemonic;
use arch::reg::Reg;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

// ----------------------------------------------------------------------------
// Token

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Op(Mnemonic),
    /// Condition-code branch; flags are (n, z, p).
    Br(bool, bool, bool),
    Reg(Reg),
    Num(i32),
    Str(String),
    Word(String),
    Comma,
    Colon,
    Period,
    Equals,
    Newline,
    /// A lexeme the lexer could not classify. Not an immediate failure: the
    /// statement builder reports it as an unexpected token with its exact
    /// source location.
    Err(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

impl Token {
    /// Surface form for diagnostics.
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Op(m) => m.to_string(),
            TokenKind::Br(n, z, p) => format!(
                "BR{}{}{}",
                if *n { "n" } else { "" },
                if *z { "z" } else { "" },
                if *p { "p" } else { "" }
            ),
            TokenKind::Reg(r) => r.to_string(),
            TokenKind::Num(v) => format!("#{v}"),
            TokenKind::Str(s) => format!("\"{s}\""),
            TokenKind::Word(w) | TokenKind::Err(w) => w.clone(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::Period => ".".to_string(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::Newline => "\\n".to_string(),
        }
    }
}

static BRANCHES: Lazy<HashMap<&'static str, (bool, bool, bool)>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("BR", (true, true, true));
    map.insert("BRn", (true, false, false));
    map.insert("BRz", (false, true, false));
    map.insert("BRp", (false, false, true));
    map.insert("BRnz", (true, true, false));
    map.insert("BRnp", (true, false, true));
    map.insert("BRzp", (false, true, true));
    map.insert("BRnzp", (true, true, true));
    map
});

// ----------------------------------------------------------------------------
// Lexer

/// Lazy token stream over one source text. Comments are stripped; logical
/// lines are delimited by [`TokenKind::Newline`].
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn string(&mut self, line: u32, col: u32) -> Token {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Token { kind: TokenKind::Str(out), line, col },
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('x') => {
                        let digits: String = [self.bump(), self.bump()]
                            .into_iter()
                            .flatten()
                            .collect();
                        match u8::from_str_radix(&digits, 16) {
                            // each escaped byte maps to one char in U+0000..=U+00FF
                            Ok(byte) => out.push(byte as char),
                            Err(_) => {
                                return Token {
                                    kind: TokenKind::Err(format!("\\x{digits}")),
                                    line,
                                    col,
                                }
                            }
                        }
                    }
                    Some(other) => out.push(other),
                    None => {
                        return Token { kind: TokenKind::Err(format!("\"{out}")), line, col }
                    }
                },
                // a string does not span lines
                Some('\n') | None => {
                    return Token { kind: TokenKind::Err(format!("\"{out}")), line, col }
                }
                Some(other) => out.push(other),
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        // 0. Skip horizontal whitespace
        while matches!(self.chars.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }

        // 1. Comment runs to end of line
        if self.chars.peek() == Some(&';') {
            while !matches!(self.chars.peek(), Some('\n') | None) {
                self.bump();
            }
        }

        let (line, col) = (self.line, self.col);
        let c = self.bump()?;

        // 2. Separators and string literals
        let kind = match c {
            '\n' => Some(TokenKind::Newline),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            '.' => Some(TokenKind::Period),
            '=' => Some(TokenKind::Equals),
            '"' => return Some(self.string(line, col)),
            _ => None,
        };
        if let Some(kind) = kind {
            return Some(Token { kind, line, col });
        }

        // 3. Bareword: mnemonic, register, number, or label
        let mut lexeme = String::from(c);
        while let Some(&next) = self.chars.peek() {
            if next.is_whitespace() || matches!(next, ',' | ':' | '.' | '=' | ';' | '"') {
                break;
            }
            lexeme.push(next);
            self.bump();
        }
        Some(Token { kind: classify(lexeme), line, col })
    }
}

fn classify(lexeme: String) -> TokenKind {
    if let Some(&(n, z, p)) = BRANCHES.get(lexeme.as_str()) {
        return TokenKind::Br(n, z, p);
    }
    if let Ok(op) = Mnemonic::parse(&lexeme) {
        return TokenKind::Op(op);
    }
    if let Ok(reg) = Reg::parse(&lexeme) {
        return TokenKind::Reg(reg);
    }
    match number(&lexeme) {
        Ok(Some(value)) => return TokenKind::Num(value),
        Ok(None) => {}
        Err(()) => return TokenKind::Err(lexeme),
    }
    TokenKind::Word(lexeme)
}

/// `#` decimal, `x` hexadecimal, `b` binary, optionally negative after the
/// prefix. `Ok(None)` when the lexeme is not number-shaped at all; `Err`
/// when it claims `#` but the digits do not parse (`x`/`b` fall through,
/// since a label may start with those letters).
fn number(lexeme: &str) -> Result<Option<i32>, ()> {
    let (radix, strict) = match lexeme.as_bytes().first() {
        Some(b'#') => (10, true),
        Some(b'x') => (16, false),
        Some(b'b') => (2, false),
        _ => return Ok(None),
    };
    match i32::from_str_radix(&lexeme[1..], radix) {
        Ok(value) => Ok(Some(value)),
        Err(_) if strict => Err(()),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new(text).map(|t| t.kind).collect()
    }

    #[test]
    fn basic_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("ADD R1, #10\n"),
            vec![
                Op(Mnemonic::ADD),
                Reg(arch::reg::Reg::R1),
                Comma,
                Num(10),
                Newline,
            ]
        );
    }

    #[test]
    fn comments_and_radixes() {
        use TokenKind::*;
        assert_eq!(
            kinds("ADD\nADD R1,R0\n; note b1010\nADD R0, x-a"),
            vec![
                Op(Mnemonic::ADD),
                Newline,
                Op(Mnemonic::ADD),
                Reg(arch::reg::Reg::R1),
                Comma,
                Reg(arch::reg::Reg::R0),
                Newline,
                Newline,
                Op(Mnemonic::ADD),
                Reg(arch::reg::Reg::R0),
                Comma,
                Num(-10),
            ]
        );
        assert_eq!(kinds("b1010"), vec![Num(0b1010)]);
        assert_eq!(kinds("x1F"), vec![Num(0x1F)]);
    }

    #[test]
    fn crlf() {
        use TokenKind::*;
        assert_eq!(
            kinds("XOR R0, R0, R0\r\n"),
            vec![
                Op(Mnemonic::XOR),
                Reg(arch::reg::Reg::R0),
                Comma,
                Reg(arch::reg::Reg::R0),
                Comma,
                Reg(arch::reg::Reg::R0),
                Newline,
            ]
        );
    }

    #[test]
    fn branch_variants() {
        assert_eq!(kinds("BR"), vec![TokenKind::Br(true, true, true)]);
        assert_eq!(kinds("BRnp"), vec![TokenKind::Br(true, false, true)]);
        assert_eq!(kinds("BRz"), vec![TokenKind::Br(false, true, false)]);
        // not a branch variant: plain label
        assert_eq!(kinds("BRq"), vec![TokenKind::Word("BRq".to_string())]);
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds("\"hello \\\" !!\""),
            vec![TokenKind::Str("hello \" !!".to_string())]
        );
        assert_eq!(kinds("\"\\x69\""), vec![TokenKind::Str("i".to_string())]);
    }

    #[test]
    fn error_marked_lexemes() {
        assert!(matches!(kinds("#zz")[0], TokenKind::Err(_)));
        assert!(matches!(kinds("\"open")[0], TokenKind::Err(_)));
        // unknown barewords stay words for the label grammar to judge
        assert_eq!(kinds("xyz"), vec![TokenKind::Word("xyz".to_string())]);
    }

    #[test]
    fn positions() {
        let tokens: Vec<Token> = Lexer::new("ADD R0\nfoo: RET").collect();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].col), (1, 5));
        assert_eq!((tokens[2].line, tokens[2].col), (1, 7)); // newline
        assert_eq!((tokens[3].line, tokens[3].col), (2, 1)); // foo
        assert_eq!((tokens[4].line, tokens[4].col), (2, 4)); // colon
        assert_eq!((tokens[5].line, tokens[5].col), (2, 6)); // RET
    }

    #[test]
    fn restartable() {
        let text = "AND R0, R0, #0";
        assert_eq!(kinds(text), kinds(text));
    }
}
