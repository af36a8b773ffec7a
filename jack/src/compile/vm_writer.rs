//! VM code output.
use std::{fmt, io::Write};

use log::trace;

use crate::error::JackResult;

/// Memory segments of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    /// Fields of the current object.
    This,
    /// Array element pointed to by `pointer 1`.
    That,
    /// `pointer 0` is the base of `this`, `pointer 1` the base of `that`.
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constant => write!(f, "constant"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
            Self::Static   => write!(f, "static"),
            Self::This     => write!(f, "this"),
            Self::That     => write!(f, "that"),
            Self::Pointer  => write!(f, "pointer"),
            Self::Temp     => write!(f, "temp"),
        }
    }
}

/// Arithmetic and logical commands, operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Sub => write!(f, "sub"),
            Self::Neg => write!(f, "neg"),
            Self::Eq  => write!(f, "eq"),
            Self::Gt  => write!(f, "gt"),
            Self::Lt  => write!(f, "lt"),
            Self::And => write!(f, "and"),
            Self::Or  => write!(f, "or"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// One VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(Command),
    Label(&'a str),
    Goto(&'a str),
    IfGoto(&'a str),
    /// Function name and number of arguments.
    Call(&'a str, u16),
    /// Function name and number of locals.
    Function(&'a str, u16),
    Return,
}

/// Outputs instruction as VM code text.
impl<'a> fmt::Display for Instruction<'a> {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Push(segment, index)  => write!(f, "push {segment} {index}"),
            Self::Pop(segment, index)   => write!(f, "pop {segment} {index}"),
            Self::Arithmetic(command)   => write!(f, "{command}"),
            Self::Label(label)          => write!(f, "label {label}"),
            Self::Goto(label)           => write!(f, "goto {label}"),
            Self::IfGoto(label)         => write!(f, "if-goto {label}"),
            Self::Call(name, n_args)    => write!(f, "call {name} {n_args}"),
            Self::Function(name, n_locals) => write!(f, "function {name} {n_locals}"),
            Self::Return                => write!(f, "return"),
        }
    }
}

/// Writes VM instructions, one per line, to the output.
///
/// Writing is not buffered by this type. Wrap the output in a
/// [`std::io::BufWriter`] when writing to a file directly.
pub struct VmWriter<W> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn emit(&mut self, instruction: Instruction) -> JackResult<()> {
        trace!("{instruction}");
        writeln!(self.out, "{instruction}")?;
        Ok(())
    }

    #[inline]
    pub fn write_push(&mut self, segment: Segment, index: u16) -> JackResult<()> {
        self.emit(Instruction::Push(segment, index))
    }

    #[inline]
    pub fn write_pop(&mut self, segment: Segment, index: u16) -> JackResult<()> {
        self.emit(Instruction::Pop(segment, index))
    }

    #[inline]
    pub fn write_arithmetic(&mut self, command: Command) -> JackResult<()> {
        self.emit(Instruction::Arithmetic(command))
    }

    #[inline]
    pub fn write_label(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instruction::Label(label))
    }

    #[inline]
    pub fn write_goto(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instruction::Goto(label))
    }

    #[inline]
    pub fn write_if(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instruction::IfGoto(label))
    }

    #[inline]
    pub fn write_call(&mut self, name: &str, n_args: u16) -> JackResult<()> {
        self.emit(Instruction::Call(name, n_args))
    }

    #[inline]
    pub fn write_function(&mut self, name: &str, n_locals: u16) -> JackResult<()> {
        self.emit(Instruction::Function(name, n_locals))
    }

    #[inline]
    pub fn write_return(&mut self) -> JackResult<()> {
        self.emit(Instruction::Return)
    }

    /// Flush the output and give it back.
    ///
    /// Consumes the writer, so it can only be closed once.
    pub fn close(mut self) -> JackResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let mut writer = VmWriter::new(Vec::new());

        writer.write_function("Main.main", 2).unwrap();
        writer.write_push(Segment::Constant, 7).unwrap();
        writer.write_pop(Segment::Local, 1).unwrap();
        writer.write_arithmetic(Command::Neg).unwrap();
        writer.write_label("WHILE_EXP0").unwrap();
        writer.write_if("WHILE_END0").unwrap();
        writer.write_goto("WHILE_EXP0").unwrap();
        writer.write_call("Math.multiply", 2).unwrap();
        writer.write_push(Segment::Pointer, 0).unwrap();
        writer.write_pop(Segment::That, 0).unwrap();
        writer.write_return().unwrap();

        let text = String::from_utf8(writer.close().unwrap()).unwrap();
        let expected = "\
function Main.main 2
push constant 7
pop local 1
neg
label WHILE_EXP0
if-goto WHILE_END0
goto WHILE_EXP0
call Math.multiply 2
push pointer 0
pop that 0
return
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_segment_names() {
        let names = [
            Segment::Constant,
            Segment::Argument,
            Segment::Local,
            Segment::Static,
            Segment::This,
            Segment::That,
            Segment::Pointer,
            Segment::Temp,
        ]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

        assert_eq!(
            names,
            ["constant", "argument", "local", "static", "this", "that", "pointer", "temp"]
        );
    }

    #[test]
    fn test_command_names() {
        let names = [
            Command::Add,
            Command::Sub,
            Command::Neg,
            Command::Eq,
            Command::Gt,
            Command::Lt,
            Command::And,
            Command::Or,
            Command::Not,
        ]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

        assert_eq!(names, ["add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not"]);
    }
}
