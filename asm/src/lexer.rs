use std::iter::{Enumerate, Peekable};
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Ident(String),
    Number(u16),
    Str(String),
    Colon,
    Comma,
    Plus,
    Period,
    LBracket,
    RBracket,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Kind,
    /// 1-based character column
    pub col: usize,
}

/// Splits one source line into tokens. Comments run from `;` to the end of
/// the line and produce no token.
pub struct LineLexer<'a> {
    line: &'a str,
    iter: Peekable<Enumerate<CharIndices<'a>>>,
}

impl<'a> LineLexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            iter: line.char_indices().enumerate().peekable(),
        }
    }

    pub fn parse(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    /// Byte offset just past the run of characters matching `pred`.
    fn take_while(&mut self, mut end: usize, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(_, (ptr, ch))) = self.iter.peek() {
            if !pred(ch) {
                return ptr;
            }
            self.iter.next();
            end = ptr + ch.len_utf8();
        }
        end
    }

    fn next_token(&mut self) -> Option<Token> {
        // 0. Skip whitespaces
        while self
            .iter
            .next_if(|(_, (_, ch))| ch.is_whitespace())
            .is_some()
        {}

        // 1. End of line
        let (idx, (start, c)) = self.iter.next()?;

        // 2. Comment
        if c == ';' {
            while self.iter.next().is_some() {}
            return None;
        }

        // 3. Single character token
        let single = match c {
            ':' => Some(Kind::Colon),
            ',' => Some(Kind::Comma),
            '+' => Some(Kind::Plus),
            '.' => Some(Kind::Period),
            '[' => Some(Kind::LBracket),
            ']' => Some(Kind::RBracket),
            _ => None,
        };
        if let Some(kind) = single {
            return self.token(kind, idx);
        }

        // 4. String literal
        if c == '"' {
            let body = start + 1;
            while let Some((_, (ptr, ch))) = self.iter.next() {
                if ch == '"' {
                    let s = self.line[body..ptr].to_string();
                    return self.token(Kind::Str(s), idx);
                }
            }
            return self.token(Kind::Error("Missing \"".to_string()), idx);
        }

        // 5. Identifier
        if c.is_ascii_alphabetic() || c == '_' {
            let end = self.take_while(start + 1, |ch| ch.is_ascii_alphanumeric() || ch == '_');
            let lexeme = &self.line[start..end];
            return self.token(Kind::Ident(lexeme.to_string()), idx);
        }

        // 6. Number literal
        if c.is_ascii_digit() {
            let end = self.take_while(start + 1, |ch| ch.is_ascii_alphanumeric());
            let lexeme = &self.line[start..end];
            let value = match lexeme.strip_prefix("0x").or(lexeme.strip_prefix("0X")) {
                Some(hex) if !hex.is_empty() && hex.len() <= 4 => u16::from_str_radix(hex, 16).ok(),
                Some(_) => None,
                None => lexeme.parse::<u16>().ok(),
            };
            return match value {
                Some(v) => self.token(Kind::Number(v), idx),
                None => self.token(Kind::Error(format!("Invalid number `{}`", lexeme)), idx),
            };
        }

        // 7. Error
        self.token(Kind::Error(format!("Unexpected character `{}`", c)), idx)
    }

    fn token(&self, kind: Kind, idx: usize) -> Option<Token> {
        Some(Token { kind, col: idx + 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<Kind> {
        LineLexer::new(line).parse().into_iter().map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> Kind {
        Kind::Ident(s.to_string())
    }

    #[test]
    fn instruction_line() {
        assert_eq!(
            kinds(":loop\tSET [0x2000+I], [A] ; copy"),
            vec![
                Kind::Colon,
                ident("loop"),
                ident("SET"),
                Kind::LBracket,
                Kind::Number(0x2000),
                Kind::Plus,
                ident("I"),
                Kind::RBracket,
                Kind::Comma,
                Kind::LBracket,
                ident("A"),
                Kind::RBracket,
            ]
        );
    }

    #[test]
    fn data_line() {
        assert_eq!(
            kinds("dat \"Hello; world!\", 0"),
            vec![
                ident("dat"),
                Kind::Str("Hello; world!".to_string()),
                Kind::Comma,
                Kind::Number(0),
            ]
        );
    }

    #[test]
    fn columns() {
        let toks = LineLexer::new("  set a, 1").parse();
        let cols: Vec<usize> = toks.iter().map(|t| t.col).collect();
        assert_eq!(cols, vec![3, 7, 8, 10]);
    }

    #[test]
    fn errors() {
        assert_eq!(
            kinds("0x12345"),
            vec![Kind::Error("Invalid number `0x12345`".to_string())]
        );
        assert_eq!(
            kinds("70000"),
            vec![Kind::Error("Invalid number `70000`".to_string())]
        );
        assert_eq!(kinds("\"open"), vec![Kind::Error("Missing \"".to_string())]);
        assert_eq!(
            kinds("set a, #"),
            vec![
                ident("set"),
                ident("a"),
                Kind::Comma,
                Kind::Error("Unexpected character `#`".to_string())
            ]
        );
    }

    #[test]
    fn directives_and_externals() {
        assert_eq!(
            kinds(".library \"lib/io.asm\""),
            vec![
                Kind::Period,
                ident("library"),
                Kind::Str("lib/io.asm".to_string())
            ]
        );
        assert_eq!(kinds("jsr _print"), vec![ident("jsr"), ident("_print")]);
    }
}
