//! Line-numbered BASIC interpreter engine
//!
//! An interactive interpreter for a classic 8-bit style BASIC dialect. Program
//! lines and immediate commands are fed in one raw line at a time; the engine
//! stores the program by line number, runs it under an explicit program
//! counter and exposes an append-only output buffer. The only suspension point
//! is INPUT, which hands control back to the caller until a value is supplied.

pub mod config;
pub mod executor;
pub mod filesystem;
pub mod help;
pub mod memory;
pub mod output;
pub mod parser;
pub mod program;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{BasicError, Result};
pub use config::InterpreterConfig;
pub use executor::Executor;
pub use filesystem::{DirectoryStorage, MemoryStorage, ProgramSnapshot, ProgramStorage};
pub use memory::MemoryManager;
pub use parser::{BinaryOperator, Expression, Statement, UnaryOperator};
pub use program::ProgramStore;
pub use tokenizer::Token;
pub use variables::{Value, VariableStore};

/// Core error handling types for the interpreter
pub mod error {
    use std::fmt;

    /// Result type for interpreter operations
    pub type Result<T> = std::result::Result<T, BasicError>;

    /// Error conditions surfaced to the BASIC user.
    ///
    /// `Display` renders the upper-case message shown after the `?` prefix.
    #[derive(Debug, Clone, PartialEq)]
    pub enum BasicError {
        // Syntax errors
        SyntaxError(String),

        // Undefined references
        UndefinedLine(u32),
        UndefinedFunction(String),

        // Runtime and type errors
        TypeMismatch,
        BadSubscript(String),
        RedimensionedArray(String),
        IllegalQuantity,
        OutOfData,
        DivisionByZero,
        Unsupported(String),

        // Control-flow misuse
        NextWithoutFor,
        NextWithoutForVariable(String),
        ReturnWithoutGosub,
        CantContinue,

        // File system errors
        BadFileName,
        FileNotFound(String),
        FileLoadError(String),
        Io(String),
    }

    impl BasicError {
        /// Shorthand for a syntax error carrying a diagnostic detail
        pub fn syntax(detail: impl Into<String>) -> Self {
            BasicError::SyntaxError(detail.into())
        }
    }

    impl fmt::Display for BasicError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                BasicError::SyntaxError(_) => write!(f, "SYNTAX ERROR"),
                BasicError::UndefinedLine(_) => write!(f, "LINE NOT FOUND"),
                BasicError::UndefinedFunction(_) => write!(f, "UNDEF'D FUNCTION"),
                BasicError::TypeMismatch => write!(f, "TYPE MISMATCH"),
                BasicError::BadSubscript(_) => write!(f, "BAD SUBSCRIPT"),
                BasicError::RedimensionedArray(_) => write!(f, "REDIM'D ARRAY"),
                BasicError::IllegalQuantity => write!(f, "ILLEGAL QUANTITY"),
                BasicError::OutOfData => write!(f, "OUT OF DATA"),
                BasicError::DivisionByZero => write!(f, "DIVISION BY ZERO"),
                BasicError::Unsupported(what) => write!(f, "{} NOT SUPPORTED", what),
                BasicError::NextWithoutFor => write!(f, "NEXT WITHOUT FOR"),
                BasicError::NextWithoutForVariable(name) => {
                    write!(f, "NEXT WITHOUT FOR {}", name)
                }
                BasicError::ReturnWithoutGosub => write!(f, "RETURN WITHOUT GOSUB"),
                BasicError::CantContinue => write!(f, "CAN'T CONTINUE"),
                BasicError::BadFileName => write!(f, "BAD FILE NAME"),
                BasicError::FileNotFound(_) => write!(f, "FILE NOT FOUND"),
                BasicError::FileLoadError(_) => write!(f, "FILE LOAD ERROR"),
                BasicError::Io(_) => write!(f, "I/O ERROR"),
            }
        }
    }

    impl std::error::Error for BasicError {}

    impl From<std::io::Error> for BasicError {
        fn from(err: std::io::Error) -> Self {
            BasicError::Io(err.to_string())
        }
    }

}
