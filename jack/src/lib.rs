pub mod compile;
pub mod constants;
pub mod driver;
mod error;
pub mod lex;

pub use self::compile::compile_str;

/// Version of this crate, as reported by the command line.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        compile::{CompilationEngine, VmWriter},
        driver::DriverConf,
        error::{JackError, JackResult, LexError, LexErrorKind, Location, SyntaxError, SyntaxErrorKind},
        lex::{Lexer, TokenListing},
    };
}
