use crate::error::Error;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::parser;
use arch::reg::Reg;
use indexmap::IndexMap;

// ----------------------------------------------------------------------------
// Statement

/// One parsed source line, pinned to the address it was assigned when
/// parsed. Immutable once added to a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub addr: u16,
    pub line: u32,
    pub body: StmtBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StmtBody {
    /// Fully encoded instruction word.
    Word(u16),
    /// `DB`/`DW` payload; label items resolve at link time.
    Data(Vec<DataWord>),
    /// Zero padding emitted by the origin directive.
    Fill(u16),
    /// Label definition; emits nothing.
    Label(String),
    /// PC-relative references, encoded at link time.
    Branch { n: bool, z: bool, p: bool, label: String },
    Lea(Reg, String),
    Jsr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataWord {
    Lit(u16),
    Label(String),
}

// ----------------------------------------------------------------------------
// Symbol table

#[derive(Debug, Clone, Default)]
pub(crate) struct Symbol {
    /// Absent until the label is defined; references may come first.
    pub addr: Option<u16>,
    /// Statement indices that name this symbol.
    pub refs: Vec<usize>,
}

// ----------------------------------------------------------------------------
// Translation unit

/// The mutable aggregate of the parse phase: ordered statements, symbol
/// table and location counter for one source, or for a chain of sources
/// built with [`parse_extend`](Self::parse_extend). Opaque to callers;
/// consumed read-only by [`link`](crate::link).
#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub(crate) stmts: Vec<Statement>,
    pub(crate) symbols: IndexMap<String, Symbol>,
    pub(crate) loc: u16,
}

impl TranslationUnit {
    /// Parse one source text into a fresh unit starting at address 0.
    /// On error nothing is returned; there is no partial unit.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::default().append(text)
    }

    /// Parse more source, continuing `previous`'s location counter,
    /// statement list and label scope. The antecedent is consumed: a unit
    /// has at most one live derivation, and the result supersedes it. On
    /// error the antecedent is discarded along with the partial state.
    pub fn parse_extend(text: &str, previous: Self) -> Result<Self, Error> {
        previous.append(text)
    }

    fn append(mut self, text: &str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(text);
        let mut line: Vec<Token> = vec![];
        loop {
            let token = lexer.next();
            match token {
                Some(Token { kind: TokenKind::Newline, .. }) | None => {
                    let end = token.is_none();
                    parser::parse_line(&mut self, &line)?;
                    line.clear();
                    if end {
                        return Ok(self);
                    }
                }
                Some(token) => line.push(token),
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Accessors

impl TranslationUnit {
    /// Number of statements across the whole chain, label definitions
    /// included.
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// The address the next statement would be assigned.
    pub fn location(&self) -> u16 {
        self.loc
    }

    /// Address of a defined label, anywhere in the chain.
    pub fn lookup(&self, label: &str) -> Option<u16> {
        self.symbols.get(label)?.addr
    }

    /// Labels defined but never referenced, in definition order.
    pub fn unreferenced(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|(_, sym)| sym.addr.is_some() && sym.refs.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Construction (statement builder side)

impl TranslationUnit {
    pub(crate) fn define(&mut self, name: String, line: u32) -> Result<(), Error> {
        let loc = self.loc;
        let sym = self.symbols.entry(name.clone()).or_default();
        if sym.addr.is_some() {
            // one definition per chain
            return Err(Error::LabelSyntax(name, line));
        }
        sym.addr = Some(loc);
        self.stmts.push(Statement { addr: loc, line, body: StmtBody::Label(name) });
        Ok(())
    }

    pub(crate) fn push_word(&mut self, word: u16, line: u32) {
        self.stmts.push(Statement { addr: self.loc, line, body: StmtBody::Word(word) });
        self.loc = self.loc.wrapping_add(1);
    }

    pub(crate) fn push_pending(&mut self, body: StmtBody, line: u32) {
        let index = self.stmts.len();
        match &body {
            StmtBody::Branch { label, .. } | StmtBody::Lea(_, label) | StmtBody::Jsr(label) => {
                self.reference(label, index);
            }
            _ => {}
        }
        self.stmts.push(Statement { addr: self.loc, line, body });
        self.loc = self.loc.wrapping_add(1);
    }

    pub(crate) fn push_data(&mut self, items: Vec<DataWord>, line: u32) {
        let index = self.stmts.len();
        for item in &items {
            if let DataWord::Label(name) = item {
                self.reference(name, index);
            }
        }
        let len = items.len() as u16;
        self.stmts.push(Statement { addr: self.loc, line, body: StmtBody::Data(items) });
        self.loc = self.loc.wrapping_add(len);
    }

    pub(crate) fn set_location(&mut self, target: u16, line: u32) -> Result<(), Error> {
        if target < self.loc {
            // the counter never regresses below emitted code
            return Err(Error::CannotSetLocation(line));
        }
        let gap = target - self.loc;
        if gap > 0 {
            self.stmts.push(Statement { addr: self.loc, line, body: StmtBody::Fill(gap) });
        }
        self.loc = target;
        Ok(())
    }

    fn reference(&mut self, name: &str, index: usize) {
        self.symbols.entry(name.to_string()).or_default().refs.push(index);
    }
}
