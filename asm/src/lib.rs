//! Two-pass assembler and linker for the LC-3b architecture.
//!
//! Source text is parsed into a [`TranslationUnit`]: the ordered statement
//! list, symbol table and location counter of one source (or of a chain of
//! sources, via [`TranslationUnit::parse_extend`]). Linking resolves every
//! label reference, range-checks the PC-relative fields, and produces the
//! final sequence of 16-bit machine words.
//!
//! ```
//! use lcasm::{link, TranslationUnit};
//!
//! let unit = TranslationUnit::parse("main:\nAND R0, R0, #0\nADD R0, R0, #10").unwrap();
//! let unit = TranslationUnit::parse_extend("BR main", unit).unwrap();
//! let words = link(&unit).unwrap();
//! assert_eq!(words.len(), 3);
//! ```
//!
//! Parsing and linking are pure transformations; independent units can be
//! used from different threads. A unit has at most one live derivation:
//! `parse_extend` consumes its antecedent.

pub mod error;
pub mod ffi;
pub mod lexer;
pub mod linker;
pub mod parser;
pub mod unit;

pub use error::Error;
pub use linker::link;
pub use unit::TranslationUnit;
