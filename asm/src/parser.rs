use std::path::Path;

use arch::{
    inst::Instruction,
    op::Mnemonic,
    operand::{Imm, Operand},
    reg::Reg,
};

use crate::{
    block::{Block, Data, DataItem},
    error::{Error, SyntaxError},
    lexer::{Kind, LineLexer, Token},
    library::{LibRef, Library},
};

/// Block that receives statements before the first `.block` directive.
pub const DEFAULT_BLOCK: &str = "main";

// ----------------------------------------------------------------------------
// Cursor over the tokens of one line

struct Cursor<'a> {
    file: &'a str,
    line_no: usize,
    line: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(file: &'a str, line_no: usize, line: &'a str) -> Self {
        Cursor {
            file,
            line_no,
            line,
            tokens: LineLexer::new(line).parse(),
            pos: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Kind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Kind> {
        let token = self.tokens.get(self.pos)?.kind.clone();
        self.pos += 1;
        Some(token)
    }

    fn skip(&mut self, kind: &Kind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Column of the current token, or just past the end of the line.
    fn col(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(token) => token.col,
            None => self.line.chars().count() + 1,
        }
    }

    /// Error at the current token.
    fn error(&self, msg: &str) -> SyntaxError {
        self.error_at(msg, self.col())
    }

    /// Error at the token just consumed.
    fn error_prev(&self, msg: &str) -> SyntaxError {
        let col = match self.pos.checked_sub(1).and_then(|p| self.tokens.get(p)) {
            Some(token) => token.col,
            None => self.col(),
        };
        self.error_at(msg, col)
    }

    fn error_at(&self, msg: &str, col: usize) -> SyntaxError {
        SyntaxError {
            msg: msg.to_string(),
            file: self.file.to_string(),
            line: self.line_no,
            col,
            source_line: self.line.to_string(),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match self.next() {
            Some(Kind::Ident(name)) => Ok(name),
            Some(Kind::Error(msg)) => Err(self.error_prev(&msg)),
            _ => Err(self.error_prev(&format!("Missing {}", what))),
        }
    }

    // ------------------------------------------------------------------------
    // Operands

    fn operand(&mut self) -> Result<Operand, SyntaxError> {
        match self.next() {
            Some(Kind::Ident(name)) => Ok(match Reg::parse(&name) {
                Ok(reg) => Operand::Register(reg),
                Err(_) => Operand::symbol(&name),
            }),
            Some(Kind::Number(v)) => Ok(Operand::Literal(v)),
            Some(Kind::LBracket) => {
                let open = self.pos - 1;
                let inner = self.indirect(open)?;
                if !self.skip(&Kind::RBracket) {
                    return Err(self.error("Missing ]"));
                }
                Ok(inner)
            }
            Some(Kind::Error(msg)) => Err(self.error_prev(&msg)),
            Some(_) => Err(self.error_prev("Unknown value")),
            None => Err(self.error("Missing value")),
        }
    }

    /// Contents of `[...]`: a location, or `reg+offset` in either order.
    fn indirect(&mut self, open: usize) -> Result<Operand, SyntaxError> {
        let left = self.operand()?;
        if !self.skip(&Kind::Plus) {
            return Operand::indirect(left).map_err(|e| {
                let col = self.tokens[open].col;
                self.error_at(&e.to_string(), col)
            });
        }
        let right = self.operand()?;

        let (reg, imm) = match (left, right) {
            (Operand::Register(reg), imm) | (imm, Operand::Register(reg)) => (reg, imm),
            _ => return Err(self.error_prev("One side of `+` must be a register")),
        };
        let imm = match imm {
            Operand::Literal(v) => Imm::Lit(v),
            Operand::Label(name) => Imm::Label(name),
            _ => return Err(self.error_prev("Offset must be a number or a label")),
        };
        Operand::offset(reg, imm).map_err(|e| self.error_prev(&e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Instructions

    /// Instruction whose mnemonic has just been consumed.
    fn instruction(&mut self, mnemonic: Mnemonic, name: &str) -> Result<Instruction, SyntaxError> {
        let a = self.operand()?;
        match mnemonic {
            Mnemonic::Basic(op) => {
                if !self.skip(&Kind::Comma) {
                    return Err(self.error(&format!(
                        "{} requires two arguments",
                        name.to_ascii_uppercase()
                    )));
                }
                let b = self.operand()?;
                Ok(Instruction::Basic(op, a, b))
            }
            Mnemonic::NonBasic(op) => Ok(Instruction::NonBasic(op, a)),
        }
    }

    fn data(&mut self) -> Result<Data, SyntaxError> {
        let mut items = vec![];
        loop {
            let item = match self.next() {
                Some(Kind::Str(s)) => DataItem::Str(s),
                Some(Kind::Number(v)) => DataItem::Int(v),
                Some(Kind::Ident(name)) => DataItem::Label(name),
                Some(Kind::Error(msg)) => return Err(self.error_prev(&msg)),
                Some(_) => return Err(self.error_prev("Unknown data")),
                None => return Err(self.error("Missing data")),
            };
            items.push(item);
            if !self.skip(&Kind::Comma) {
                return Ok(Data::Words(items));
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Parser

/// Builds a library from textual source, one line at a time.
pub struct Parser<'a> {
    file: &'a str,
    lib: Library,
    block: Option<String>,
}

impl<'a> Parser<'a> {
    pub fn new(file: &'a str, lib: Library) -> Self {
        Parser {
            file,
            lib,
            block: None,
        }
    }

    pub fn parse(mut self, src: &str) -> Result<Library, Error> {
        for (idx, line) in src.lines().enumerate() {
            let mut cur = Cursor::new(self.file, idx + 1, line);
            while !cur.done() {
                self.statement(&mut cur)?;
            }
        }
        Ok(self.lib)
    }

    fn current(&mut self) -> &mut Block {
        let name = self
            .block
            .get_or_insert_with(|| DEFAULT_BLOCK.to_string())
            .clone();
        self.lib.blocks.entry(name).or_default()
    }

    fn statement(&mut self, cur: &mut Cursor) -> Result<(), SyntaxError> {
        match cur.next() {
            // :label
            Some(Kind::Colon) => {
                let name = cur.ident("label name")?;
                self.current().label(&name);
            }
            // .library / .block
            Some(Kind::Period) => {
                let directive = cur.ident("directive")?;
                match directive.as_str() {
                    "library" => match cur.next() {
                        Some(Kind::Ident(name)) => {
                            self.lib.library(LibRef::Named(name));
                        }
                        Some(Kind::Str(path)) => {
                            self.lib.library(LibRef::Path(path.into()));
                        }
                        _ => return Err(cur.error_prev("Unknown library")),
                    },
                    "block" => {
                        let name = cur.ident("block name")?;
                        if self.lib.blocks.contains_key(&name) {
                            return Err(
                                cur.error_prev(&format!("Block `{}` is already defined", name))
                            );
                        }
                        self.lib.blocks.insert(name.clone(), Block::new());
                        self.block = Some(name);
                    }
                    _ => return Err(cur.error_prev(&format!("Unknown directive `.{}`", directive))),
                }
            }
            Some(Kind::Ident(word)) if word.eq_ignore_ascii_case("dat") => {
                let data = cur.data()?;
                self.current().raw(data);
            }
            Some(Kind::Ident(word)) => match Mnemonic::parse(&word) {
                Ok(mnemonic) => {
                    let inst = cur.instruction(mnemonic, &word)?;
                    self.current().inst(inst);
                }
                Err(_) => return Err(cur.error_prev("Unknown instruction")),
            },
            Some(Kind::Error(msg)) => return Err(cur.error_prev(&msg)),
            _ => return Err(cur.error_prev("Unknown instruction")),
        }
        Ok(())
    }
}

/// Parse `src` into a library whose relative paths resolve against `scope`.
pub fn parse(file: &str, src: &str, scope: &Path) -> Result<Library, Error> {
    Parser::new(file, Library::with_scope(scope)).parse(src)
}

pub fn parse_file(path: &Path) -> Result<Library, Error> {
    let name = path.display().to_string();
    let src = std::fs::read_to_string(path).map_err(|e| Error::FileOpen(name.clone(), e))?;
    let scope = path.parent().unwrap_or(Path::new("."));
    parse(&name, &src, scope)
}

fn single<T>(
    src: &str,
    what: &str,
    f: impl FnOnce(&mut Cursor) -> Result<T, SyntaxError>,
) -> Result<T, Error> {
    let mut cur = Cursor::new(what, 1, src);
    let value = f(&mut cur)?;
    if !cur.done() {
        return Err(cur.error("Unexpected trailing input").into());
    }
    Ok(value)
}

/// One instruction, e.g. `SET [0x2000+i], [a]`.
pub fn parse_instruction(src: &str) -> Result<Instruction, Error> {
    single(src, "<inst>", |cur| match cur.next() {
        Some(Kind::Ident(word)) => match Mnemonic::parse(&word) {
            Ok(mnemonic) => cur.instruction(mnemonic, &word),
            Err(_) => Err(cur.error_prev("Unknown instruction")),
        },
        _ => Err(cur.error_prev("Unknown instruction")),
    })
}

/// One operand, e.g. `[j+2]`.
pub fn parse_operand(src: &str) -> Result<Operand, Error> {
    single(src, "<operand>", |cur| cur.operand())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ind, off, Item};
    use arch::op::{BasicOp, NonBasicOp};
    use Reg::*;

    fn lib(src: &str) -> Library {
        parse("test.asm", src, Path::new(".")).unwrap()
    }

    fn syntax(src: &str) -> SyntaxError {
        match parse("test.asm", src, Path::new(".")) {
            Err(Error::Syntax(err)) => err,
            other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn instructions_and_labels() {
        let lib = lib(":loop SET [0x2000+I], [A]\n  jsr _lib ; call\n  set pc, loop");
        let mut expect = Block::new();
        expect
            .label("loop")
            .set(off(I, 0x2000), ind(A))
            .jsr("_lib")
            .set(PC, "loop");
        assert_eq!(lib.blocks.get(DEFAULT_BLOCK), Some(&expect));
    }

    #[test]
    fn offset_in_either_order() {
        assert_eq!(parse_operand("[a+1]").unwrap(), off(A, 1));
        assert_eq!(parse_operand("[1+a]").unwrap(), off(A, 1));
        assert_eq!(parse_operand("[data+i]").unwrap(), off(I, "data"));
        assert_eq!(parse_operand("[i+data]").unwrap(), off(I, "data"));
        assert_eq!(parse_operand("[0x1000]").unwrap(), ind(0x1000));
        assert_eq!(parse_operand("PEEK").unwrap(), Operand::Register(PEEK));
    }

    #[test]
    fn data_and_directives() {
        let lib = lib(
            ".library screen\n.library \"io.asm\"\n.block text\n:msg dat \"hi\", 0, msg",
        );
        assert_eq!(
            lib.libraries,
            vec![
                LibRef::Named("screen".to_string()),
                LibRef::Path("io.asm".into())
            ]
        );
        let text = lib.blocks.get("text").unwrap();
        assert_eq!(
            text.items()[1],
            Item::Data(Data::Words(vec![
                DataItem::Str("hi".to_string()),
                DataItem::Int(0),
                DataItem::Label("msg".to_string()),
            ]))
        );
        assert!(lib.blocks.get(DEFAULT_BLOCK).is_none());
    }

    #[test]
    fn single_instruction() {
        assert_eq!(
            parse_instruction("IFE [data+i], 0").unwrap(),
            Instruction::Basic(BasicOp::IFE, off(I, "data"), Operand::Literal(0))
        );
        assert_eq!(
            parse_instruction("JSR testsub").unwrap(),
            Instruction::NonBasic(NonBasicOp::JSR, Operand::Label("testsub".to_string()))
        );
        assert!(parse_instruction("SET a, 1 2").is_err());
    }

    #[test]
    fn syntax_errors() {
        let err = syntax("set a, 1\n  SET A\n");
        assert_eq!(err.msg, "SET requires two arguments");
        assert_eq!((err.line, err.col), (2, 8));
        assert_eq!(err.source_line, "  SET A");

        let err = syntax("set [a, 1");
        assert_eq!(err.msg, "Missing ]");
        assert_eq!(err.col, 7);

        let err = syntax("hoge a, 1");
        assert_eq!(err.msg, "Unknown instruction");
        assert_eq!(err.col, 1);

        let err = syntax("set [sp], 1");
        assert_eq!(err.col, 5);

        let err = syntax("set [a+b], 1");
        assert_eq!(err.msg, "Offset must be a number or a label");

        let err = syntax("dat \"unterminated");
        assert_eq!(err.msg, "Missing \"");

        let err = syntax(".block a\n.block a");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn caret_keeps_tabs() {
        let err = syntax("\t\tSET A");
        assert_eq!(err.caret_padding(), "\t\t     ");
    }
}
