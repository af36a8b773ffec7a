use jack::prelude::*;

fn assert_compiles_to(file_name: &str, source: &str, expected: &str) {
    match jack::compile_str(file_name, source) {
        Ok(vm_code) => {
            for (line, (actual, expected)) in vm_code.lines().zip(expected.lines()).enumerate() {
                assert_eq!(actual, expected, "{file_name}: output line {}", line + 1);
            }
            assert_eq!(vm_code, expected);
        }
        Err(err) => {
            panic!("{}", err)
        }
    }
}

#[test]
fn test_compile_point() {
    assert_compiles_to("Point.jack", include_str!("Point.jack"), include_str!("Point.vm"));
}

#[test]
fn test_compile_main() {
    assert_compiles_to("Main.jack", include_str!("Main.jack"), include_str!("Main.vm"));
}

#[test]
fn test_engine_writes_to_sink() {
    let lexer = Lexer::new("Main.jack", "class Main { function int one() { return 1; } }");
    let out = CompilationEngine::new(lexer, Vec::new())
        .and_then(|engine| engine.compile_class())
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "function Main.one 0\npush constant 1\nreturn\n"
    );
}

#[test]
fn test_undefined_variable_location() {
    let source = "class Main {\n    function void main() {\n        let total = 0;\n        return;\n    }\n}\n";

    match jack::compile_str("Main.jack", source) {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.location.line, 3);
            assert_eq!(err.kind, SyntaxErrorKind::UndefinedVariable("total".into()));
            assert_eq!(err.to_string(), "Main.jack:3: variable 'total' is not defined");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_grammar_mismatch_is_fatal() {
    let source = "class Main {\n    function void main() {\n        do Output.printInt(1)\n        return;\n    }\n}\n";

    let err = jack::compile_str("Main.jack", source).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Main.jack:4: encountered unexpected token 'return', expected ';'"
    );
}

#[test]
fn test_lexical_error() {
    let source = "class Main {\n  /* never closed\n}\n";

    match jack::compile_str("Main.jack", source) {
        Err(JackError::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
            assert_eq!(err.location.line, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_integer_out_of_range() {
    let source = "class Main { function int big() { return 32768; } }";

    match jack::compile_str("Main.jack", source) {
        Err(JackError::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::IntegerOverflow("32768".into()));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_largest_integer() {
    let vm_code = jack::compile_str("Main.jack", "class Main { function int big() { return 32767; } }").unwrap();
    assert!(vm_code.contains("push constant 32767\n"));
}
