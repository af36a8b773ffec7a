//! Compiler from Jack classes to VM code.
mod engine;
mod symbol;
mod vm_writer;

use crate::{error::JackResult, lex::Lexer};

/// Compile the source of one class to VM code text.
pub fn compile_str(file_name: &str, source_code: impl AsRef<str>) -> JackResult<String> {
    let lexer = Lexer::new(file_name, source_code.as_ref());
    let engine = CompilationEngine::new(lexer, Vec::new())?;
    let bytes = engine.compile_class()?;
    Ok(String::from_utf8(bytes)?)
}

pub use self::{
    engine::{CallTarget, CompilationEngine, Receiver, ReturnType, SubroutineKind},
    symbol::{Symbol, SymbolKind, SymbolTable},
    vm_writer::{Command, Instruction, Segment, VmWriter},
};
