//! Recursive descent compilation engine.
//!
//! Each grammar production has its own routine, which checks the tokens
//! it consumes and emits VM code as a side effect. There is no syntax
//! tree and no second pass over the source.
use std::{fmt, io::Write};

use log::{debug, warn};
use smol_str::SmolStr;

use super::{
    symbol::{Symbol, SymbolKind, SymbolTable},
    vm_writer::{Command, Segment, VmWriter},
};
use crate::{
    constants::*,
    error::{JackError, JackResult, Location, SyntaxError, SyntaxErrorKind},
    lex::{Keyword, Lexer, TokenKind, TokenStream},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    /// Allocates and returns a new object.
    Constructor,
    /// Static function without a receiver.
    Function,
    /// Operates on the receiver passed as argument 0.
    Method,
}

impl fmt::Display for SubroutineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constructor => write!(f, "constructor"),
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(SmolStr),
}

/// State of the subroutine being compiled.
#[derive(Debug)]
struct Subroutine {
    name: SmolStr,
    return_type: ReturnType,
}

/// Object a method is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// The current object, `pointer 0`.
    This,
    /// Object stored in a variable.
    Variable(Symbol),
}

/// Resolved target of a subroutine call.
///
/// Whether a call is a method call is decided purely by symbol table
/// presence: `x.f()` is a method call when `x` is a variable, and a
/// function or constructor call on class `x` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Function { class: SmolStr, name: SmolStr },
    Method { receiver: Receiver, class: SmolStr, name: SmolStr },
}

impl CallTarget {
    /// VM function name, `Class.name`.
    pub fn full_name(&self) -> String {
        match self {
            Self::Function { class, name } | Self::Method { class, name, .. } => {
                format!("{class}.{name}")
            }
        }
    }

    /// Number of arguments passed in addition to the explicit list.
    pub fn implicit_args(&self) -> u16 {
        match self {
            Self::Function { .. } => 0,
            Self::Method { .. } => 1,
        }
    }

    /// Total number of arguments passed to the callee.
    ///
    /// Returns `None` when the count doesn't fit a call instruction.
    pub fn arg_count(&self, explicit: u16) -> Option<u16> {
        explicit.checked_add(self.implicit_args())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl BinaryOp {
    #[rustfmt::skip]
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '&' => Some(Self::And),
            '|' => Some(Self::Or),
            '<' => Some(Self::Lt),
            '>' => Some(Self::Gt),
            '=' => Some(Self::Eq),
            _   => None,
        }
    }
}

/// Compiles one class from the token stream into VM code.
pub struct CompilationEngine<'a, W> {
    tokens: TokenStream<'a>,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    class_name: SmolStr,
    subroutine: Option<Subroutine>,
    /// Suffix for the next generated label.
    label_counter: u32,
    /// Current nesting of statement blocks and terms.
    depth: u32,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    pub fn new(lexer: Lexer<'a>, out: W) -> JackResult<Self> {
        Ok(Self {
            tokens: TokenStream::new(lexer)?,
            writer: VmWriter::new(out),
            symbols: SymbolTable::new(),
            class_name: SmolStr::default(),
            subroutine: None,
            label_counter: 0,
            depth: 0,
        })
    }

    /// Compile a complete class.
    ///
    /// `class` name `{` classVarDec* subroutineDec* `}`
    ///
    /// Returns the output when the whole source was compiled.
    pub fn compile_class(mut self) -> JackResult<W> {
        debug!("compiling {}", self.tokens.file_name());

        self.tokens.consume_keyword(Keyword::Class)?;
        self.class_name = self.tokens.consume_ident()?;
        self.symbols.start_class();
        self.label_counter = 0;
        self.tokens.consume_symbol('{')?;

        while matches!(self.tokens.peek_keyword(), Some(Keyword::Static | Keyword::Field)) {
            self.compile_class_var_dec()?;
        }

        while matches!(
            self.tokens.peek_keyword(),
            Some(Keyword::Constructor | Keyword::Function | Keyword::Method)
        ) {
            self.compile_subroutine()?;
        }

        self.tokens.consume_symbol('}')?;

        // One class per file.
        if self.tokens.peek().is_some() {
            return Err(self.tokens.error("end of file"));
        }

        self.writer.close()
    }

    /// Emit the next unique label suffix.
    fn next_label(&mut self) -> u32 {
        let label = self.label_counter;
        self.label_counter += 1;
        label
    }

    /// Lookup a variable, failing if it's not declared.
    fn resolve(&self, name: SmolStr, location: Location) -> JackResult<Symbol> {
        match self.symbols.lookup(&name) {
            Some(symbol) => Ok(symbol.clone()),
            None => Err(SyntaxError {
                location,
                kind: SyntaxErrorKind::UndefinedVariable(name),
            }
            .into()),
        }
    }

    /// Add a variable to the symbol table.
    fn define(&mut self, name: SmolStr, ty: SmolStr, kind: SymbolKind, location: Location) -> JackResult<()> {
        match self.symbols.define(name, ty, kind) {
            Some(_) => Ok(()),
            None => {
                let what = match kind {
                    SymbolKind::Static => "static variables",
                    SymbolKind::Field => "fields",
                    SymbolKind::Argument => "arguments",
                    SymbolKind::Local => "local variables",
                };
                Err(SyntaxError {
                    location,
                    kind: SyntaxErrorKind::TooMany(what),
                }
                .into())
            }
        }
    }

    /// Descend one level, failing when the source nests too deep.
    ///
    /// Must be paired with [`CompilationEngine::leave`] on success.
    fn enter(&mut self) -> JackResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError {
                location: self.tokens.location(),
                kind: SyntaxErrorKind::NestingTooDeep,
            }
            .into());
        }
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth -= 1;
    }

    #[inline(never)]
    #[cold]
    fn too_many(&self, what: &'static str) -> JackError {
        SyntaxError {
            location: self.tokens.location(),
            kind: SyntaxErrorKind::TooMany(what),
        }
        .into()
    }

    #[inline]
    fn push_variable(&mut self, symbol: &Symbol) -> JackResult<()> {
        self.writer.write_push(symbol.segment(), symbol.index)
    }

    #[inline]
    fn pop_variable(&mut self, symbol: &Symbol) -> JackResult<()> {
        self.writer.write_pop(symbol.segment(), symbol.index)
    }
}

/// Declarations
impl<'a, W: Write> CompilationEngine<'a, W> {
    /// (`static` | `field`) type name (`,` name)* `;`
    fn compile_class_var_dec(&mut self) -> JackResult<()> {
        let kind = match self.tokens.consume_any_keyword(&[Keyword::Static, Keyword::Field])? {
            Keyword::Static => SymbolKind::Static,
            _ => SymbolKind::Field,
        };
        let ty = self.compile_type()?;
        self.compile_var_names(ty, kind)
    }

    /// `var` type name (`,` name)* `;`
    fn compile_var_dec(&mut self) -> JackResult<()> {
        self.tokens.consume_keyword(Keyword::Var)?;
        let ty = self.compile_type()?;
        self.compile_var_names(ty, SymbolKind::Local)
    }

    fn compile_var_names(&mut self, ty: SmolStr, kind: SymbolKind) -> JackResult<()> {
        loop {
            let location = self.tokens.location();
            let name = self.tokens.consume_ident()?;
            self.define(name, ty.clone(), kind, location)?;

            if !self.tokens.match_token(TokenKind::Symbol(','))? {
                break;
            }
        }

        self.tokens.consume_symbol(';')?;
        Ok(())
    }

    /// `int` | `char` | `boolean` | className
    fn compile_type(&mut self) -> JackResult<SmolStr> {
        match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(keyword @ (Keyword::Int | Keyword::Char | Keyword::Boolean))) => {
                self.tokens.next_token()?;
                Ok(SmolStr::from(keyword.as_str()))
            }
            Some(TokenKind::Ident) => self.tokens.consume_ident(),
            _ => Err(self.tokens.error("type")),
        }
    }

    /// (`constructor` | `function` | `method`) (`void` | type) name `(` parameterList `)` body
    fn compile_subroutine(&mut self) -> JackResult<()> {
        let kind = match self.tokens.consume_any_keyword(&[
            Keyword::Constructor,
            Keyword::Function,
            Keyword::Method,
        ])? {
            Keyword::Constructor => SubroutineKind::Constructor,
            Keyword::Method => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };

        self.symbols.start_subroutine();

        let return_type = if self.tokens.match_token(TokenKind::Keyword(Keyword::Void))? {
            ReturnType::Void
        } else {
            ReturnType::Type(self.compile_type()?)
        };
        let location = self.tokens.location();
        let name = self.tokens.consume_ident()?;
        let function_name = format!("{}.{name}", self.class_name);
        debug!("compiling {kind} {function_name}");

        // The receiver always occupies argument 0.
        if kind == SubroutineKind::Method {
            self.define(RECEIVER.into(), self.class_name.clone(), SymbolKind::Argument, location)?;
        }

        self.subroutine = Some(Subroutine { name, return_type });

        self.tokens.consume_symbol('(')?;
        self.compile_parameter_list()?;
        self.tokens.consume_symbol(')')?;

        self.compile_subroutine_body(&function_name, kind)?;
        self.subroutine = None;

        Ok(())
    }

    /// ((type name) (`,` type name)*)?
    fn compile_parameter_list(&mut self) -> JackResult<()> {
        if self.tokens.at_symbol(')') {
            return Ok(());
        }

        loop {
            let ty = self.compile_type()?;
            let location = self.tokens.location();
            let name = self.tokens.consume_ident()?;
            self.define(name, ty, SymbolKind::Argument, location)?;

            if !self.tokens.match_token(TokenKind::Symbol(','))? {
                return Ok(());
            }
        }
    }

    /// `{` varDec* statements `}`
    fn compile_subroutine_body(&mut self, function_name: &str, kind: SubroutineKind) -> JackResult<()> {
        self.tokens.consume_symbol('{')?;

        while self.tokens.peek_keyword() == Some(Keyword::Var) {
            self.compile_var_dec()?;
        }

        // Locals must all be declared before the header can be written.
        let n_locals = self.symbols.var_count(SymbolKind::Local);
        self.writer.write_function(function_name, n_locals)?;

        match kind {
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.var_count(SymbolKind::Field);
                self.writer.write_push(Segment::Constant, n_fields)?;
                self.writer.write_call(MEMORY_ALLOC, 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.tokens.consume_symbol('}')?;

        Ok(())
    }
}

/// Statements
impl<'a, W: Write> CompilationEngine<'a, W> {
    /// statement*
    fn compile_statements(&mut self) -> JackResult<()> {
        self.enter()?;

        loop {
            match self.tokens.peek_keyword() {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => break,
            }
        }

        self.leave();
        Ok(())
    }

    /// `let` name (`[` expression `]`)? `=` expression `;`
    fn compile_let(&mut self) -> JackResult<()> {
        self.tokens.consume_keyword(Keyword::Let)?;

        let location = self.tokens.location();
        let name = self.tokens.consume_ident()?;
        let target = self.resolve(name, location)?;

        if self.tokens.match_token(TokenKind::Symbol('['))? {
            self.compile_array_address(&target)?;
            self.tokens.consume_symbol('=')?;
            self.compile_expression()?;
            self.tokens.consume_symbol(';')?;

            // The right hand side may have moved `that` itself,
            // so the value waits in temp while the address is set.
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.tokens.consume_symbol('=')?;
            self.compile_expression()?;
            self.tokens.consume_symbol(';')?;
            self.pop_variable(&target)?;
        }

        Ok(())
    }

    /// `if` `(` expression `)` `{` statements `}` (`else` `{` statements `}`)?
    fn compile_if(&mut self) -> JackResult<()> {
        self.tokens.consume_keyword(Keyword::If)?;
        self.tokens.consume_symbol('(')?;
        self.compile_expression()?;
        self.tokens.consume_symbol(')')?;

        let label = self.next_label();
        let if_false = format!("{LABEL_IF_FALSE}{label}");

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&if_false)?;

        self.tokens.consume_symbol('{')?;
        self.compile_statements()?;
        self.tokens.consume_symbol('}')?;

        if self.tokens.match_token(TokenKind::Keyword(Keyword::Else))? {
            let if_end = format!("{LABEL_IF_END}{label}");
            self.writer.write_goto(&if_end)?;
            self.writer.write_label(&if_false)?;

            self.tokens.consume_symbol('{')?;
            self.compile_statements()?;
            self.tokens.consume_symbol('}')?;

            self.writer.write_label(&if_end)?;
        } else {
            self.writer.write_label(&if_false)?;
        }

        Ok(())
    }

    /// `while` `(` expression `)` `{` statements `}`
    fn compile_while(&mut self) -> JackResult<()> {
        let label = self.next_label();
        let while_exp = format!("{LABEL_WHILE_EXP}{label}");
        let while_end = format!("{LABEL_WHILE_END}{label}");

        self.tokens.consume_keyword(Keyword::While)?;
        self.writer.write_label(&while_exp)?;

        self.tokens.consume_symbol('(')?;
        self.compile_expression()?;
        self.tokens.consume_symbol(')')?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&while_end)?;

        self.tokens.consume_symbol('{')?;
        self.compile_statements()?;
        self.tokens.consume_symbol('}')?;

        self.writer.write_goto(&while_exp)?;
        self.writer.write_label(&while_end)?;

        Ok(())
    }

    /// `do` subroutineCall `;`
    fn compile_do(&mut self) -> JackResult<()> {
        self.tokens.consume_keyword(Keyword::Do)?;
        let name = self.tokens.consume_ident()?;
        self.compile_subroutine_call(name)?;
        self.tokens.consume_symbol(';')?;

        // Discard the returned value.
        self.writer.write_pop(Segment::Temp, 0)
    }

    /// `return` expression? `;`
    fn compile_return(&mut self) -> JackResult<()> {
        self.tokens.consume_keyword(Keyword::Return)?;

        if self.tokens.at_symbol(';') {
            if let Some(Subroutine {
                name,
                return_type: ReturnType::Type(ty),
            }) = &self.subroutine
            {
                warn!(
                    "{}: subroutine {name} returns {ty}, but returns without a value",
                    self.tokens.location()
                );
            }

            // Every call leaves exactly one value on the stack.
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }

        self.tokens.consume_symbol(';')?;
        self.writer.write_return()
    }
}

/// Expressions
impl<'a, W: Write> CompilationEngine<'a, W> {
    /// term (op expression)?
    ///
    /// Operators associate to the right and have no precedence,
    /// `a - b - c` is `a - (b - c)`. All operands are pushed first,
    /// then the operators are applied from the last to the first.
    fn compile_expression(&mut self) -> JackResult<()> {
        self.compile_term()?;

        let mut pending = vec![];
        while let Some(op) = self.tokens.peek_symbol().and_then(BinaryOp::from_symbol) {
            self.tokens.next_token()?;
            self.compile_term()?;
            pending.push(op);
        }

        for op in pending.into_iter().rev() {
            self.compile_binary_op(op)?;
        }

        Ok(())
    }

    fn compile_binary_op(&mut self, op: BinaryOp) -> JackResult<()> {
        match op {
            BinaryOp::Add => self.writer.write_arithmetic(Command::Add),
            BinaryOp::Sub => self.writer.write_arithmetic(Command::Sub),
            BinaryOp::And => self.writer.write_arithmetic(Command::And),
            BinaryOp::Or => self.writer.write_arithmetic(Command::Or),
            BinaryOp::Lt => self.writer.write_arithmetic(Command::Lt),
            BinaryOp::Gt => self.writer.write_arithmetic(Command::Gt),
            BinaryOp::Eq => self.writer.write_arithmetic(Command::Eq),
            // No native instructions.
            BinaryOp::Mul => self.writer.write_call(MATH_MULTIPLY, 2),
            BinaryOp::Div => self.writer.write_call(MATH_DIVIDE, 2),
        }
    }

    /// Constant, variable, array element, call, `(` expression `)` or unary op term.
    fn compile_term(&mut self) -> JackResult<()> {
        self.enter()?;
        self.compile_operand()?;
        self.leave();
        Ok(())
    }

    fn compile_operand(&mut self) -> JackResult<()> {
        match self.tokens.peek_kind() {
            Some(TokenKind::IntConst) => {
                let value = self.tokens.int_val().ok_or_else(|| self.tokens.error("integer constant"))?;
                self.tokens.next_token()?;
                self.writer.write_push(Segment::Constant, value)
            }
            Some(TokenKind::StringConst) => {
                let text = self.tokens.string_val().unwrap_or_default();
                if u16::try_from(text.len()).map_or(true, |len| len > MAX_INT) {
                    return Err(self.tokens.error("shorter string constant"));
                }
                self.tokens.next_token()?;
                self.compile_string(text)
            }
            Some(TokenKind::Keyword(keyword)) => self.compile_keyword_constant(keyword),
            Some(TokenKind::Symbol('(')) => {
                self.tokens.next_token()?;
                self.compile_expression()?;
                self.tokens.consume_symbol(')')?;
                Ok(())
            }
            Some(TokenKind::Symbol(symbol @ ('-' | '~'))) => {
                self.tokens.next_token()?;
                self.compile_term()?;
                let command = if symbol == '-' { Command::Neg } else { Command::Not };
                self.writer.write_arithmetic(command)
            }
            Some(TokenKind::Ident) => {
                let location = self.tokens.location();
                let name = self.tokens.consume_ident()?;

                match self.tokens.peek_symbol() {
                    Some('[') => {
                        self.tokens.next_token()?;
                        let array = self.resolve(name, location)?;
                        self.compile_array_address(&array)?;
                        self.writer.write_pop(Segment::Pointer, 1)?;
                        self.writer.write_push(Segment::That, 0)
                    }
                    Some('(' | '.') => self.compile_subroutine_call(name),
                    _ => {
                        let variable = self.resolve(name, location)?;
                        self.push_variable(&variable)
                    }
                }
            }
            _ => Err(self.tokens.error("term")),
        }
    }

    /// `true` | `false` | `null` | `this`
    fn compile_keyword_constant(&mut self, keyword: Keyword) -> JackResult<()> {
        match keyword {
            Keyword::True => {
                self.tokens.next_token()?;
                // All bits set.
                self.writer.write_push(Segment::Constant, 1)?;
                self.writer.write_arithmetic(Command::Neg)
            }
            Keyword::False | Keyword::Null => {
                self.tokens.next_token()?;
                self.writer.write_push(Segment::Constant, 0)
            }
            Keyword::This => {
                self.tokens.next_token()?;
                self.writer.write_push(Segment::Pointer, 0)
            }
            _ => Err(self.tokens.error("one of: 'true', 'false', 'null', 'this'")),
        }
    }

    /// Build a string object, one character at a time.
    fn compile_string(&mut self, text: &str) -> JackResult<()> {
        // Length was checked by the caller, and the lexer only accepts ASCII.
        self.writer.write_push(Segment::Constant, text.len() as u16)?;
        self.writer.write_call(STRING_NEW, 1)?;

        for byte in text.bytes() {
            self.writer.write_push(Segment::Constant, u16::from(byte))?;
            self.writer.write_call(STRING_APPEND_CHAR, 2)?;
        }

        Ok(())
    }

    /// Leave the address of an array element on the stack.
    ///
    /// The `[` has already been consumed. Consumes the index expression and `]`.
    fn compile_array_address(&mut self, array: &Symbol) -> JackResult<()> {
        self.push_variable(array)?;
        self.compile_expression()?;
        self.tokens.consume_symbol(']')?;
        self.writer.write_arithmetic(Command::Add)
    }

    /// Decide what a call refers to.
    ///
    /// The first identifier has already been consumed. Consumes `.` name
    /// when the call is qualified.
    fn resolve_call(&mut self, first: SmolStr) -> JackResult<CallTarget> {
        if !self.tokens.match_token(TokenKind::Symbol('.'))? {
            // Bare calls are methods on the current object.
            return Ok(CallTarget::Method {
                receiver: Receiver::This,
                class: self.class_name.clone(),
                name: first,
            });
        }

        let name = self.tokens.consume_ident()?;

        Ok(match self.symbols.lookup(&first) {
            Some(symbol) => CallTarget::Method {
                receiver: Receiver::Variable(symbol.clone()),
                class: symbol.ty.clone(),
                name,
            },
            None => CallTarget::Function { class: first, name },
        })
    }

    /// name `(` expressionList `)` | (className | varName) `.` name `(` expressionList `)`
    ///
    /// The first identifier has already been consumed.
    fn compile_subroutine_call(&mut self, first: SmolStr) -> JackResult<()> {
        let target = self.resolve_call(first)?;
        self.tokens.consume_symbol('(')?;

        match &target {
            CallTarget::Method {
                receiver: Receiver::This,
                ..
            } => self.writer.write_push(Segment::Pointer, 0)?,
            CallTarget::Method {
                receiver: Receiver::Variable(symbol),
                ..
            } => self.push_variable(symbol)?,
            CallTarget::Function { .. } => {}
        }

        let explicit = self.compile_expression_list()?;
        let n_args = target.arg_count(explicit).ok_or_else(|| self.too_many("arguments"))?;
        self.tokens.consume_symbol(')')?;

        self.writer.write_call(&target.full_name(), n_args)
    }

    /// (expression (`,` expression)*)?
    ///
    /// Returns the number of expressions.
    fn compile_expression_list(&mut self) -> JackResult<u16> {
        if self.tokens.at_symbol(')') {
            return Ok(0);
        }

        let mut count = 0;
        loop {
            self.compile_expression()?;
            count = u16::checked_add(count, 1).ok_or_else(|| self.too_many("arguments"))?;

            if !self.tokens.match_token(TokenKind::Symbol(','))? {
                return Ok(count);
            }
        }
    }
}
