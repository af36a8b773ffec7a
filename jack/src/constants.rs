//! Constant values of the Jack platform.

/// Largest integer constant the VM can push.
pub const MAX_INT: u16 = 0x7FFF; // 32767

/// Deepest nesting of expressions and statements the compiler accepts.
pub const MAX_NESTING: u32 = 128;

/// Extension of Jack source files.
pub const SOURCE_EXT: &str = "jack";

/// Extension of generated VM code files.
pub const VM_EXT: &str = "vm";

/// Suffix replacing the extension of token listings, `Main.jack` -> `MainT.xml`.
pub const LISTING_SUFFIX: &str = "T.xml";

// ----------------------------------------------------------------------------
// Operating system routines called by generated code.

/// Allocates a block of heap memory, sized in words.
pub const MEMORY_ALLOC: &str = "Memory.alloc";
pub const MATH_MULTIPLY: &str = "Math.multiply";
pub const MATH_DIVIDE: &str = "Math.divide";
/// Constructs a string with the given maximum length.
pub const STRING_NEW: &str = "String.new";
pub const STRING_APPEND_CHAR: &str = "String.appendChar";

// ----------------------------------------------------------------------------
// Label prefixes, suffixed with a counter unique to the compiled class.

pub const LABEL_IF_FALSE: &str = "IF_FALSE";
pub const LABEL_IF_END: &str = "IF_END";
pub const LABEL_WHILE_EXP: &str = "WHILE_EXP";
pub const LABEL_WHILE_END: &str = "WHILE_END";

/// Name of the implicit receiver argument of methods.
pub const RECEIVER: &str = "this";
