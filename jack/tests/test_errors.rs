use jack::{compile_str, syntax::TokenClass, JackError, LexErrorKind, ResolutionErrorKind};

const BROKEN_LET: &str = "\
class Main {
    function void main() {
        var int x;
        let x 1;
        return;
    }
}";

#[test]
fn test_syntax_error_position() {
    let err = match compile_str(BROKEN_LET) {
        Err(JackError::Syntax(err)) => err,
        other => panic!("expected syntax error, got {:?}", other),
    };

    assert_eq!(err.found, TokenClass::Integer);
    assert_eq!(err.fragment, "1");
    assert_eq!(err.expected, "symbol '='");
    assert_eq!(err.production, "letStatement");
    assert_eq!((err.loc.line, err.loc.column), (4, 15));

    assert_eq!(
        err.to_string(),
        concat!(
            "syntax error at 4:15: expected symbol '=' in letStatement, found integer constant '1'\n",
            "  |\n",
            "4 |         let x 1;\n",
            "  |               ^",
        )
    );
}

#[test]
fn test_unexpected_end_of_file() {
    match compile_str("class Main {\n  function void main() {\n") {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.found, TokenClass::EOF);
            assert_eq!(err.production, "statements");
            assert!(err.to_string().contains("found end-of-file"));
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_trailing_tokens() {
    match compile_str("class A { } class B { }") {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.expected, "end-of-file");
            assert_eq!(err.fragment, "class");
            assert_eq!(err.loc.column, 13);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_lex_error() {
    match compile_str("class Main {\n  function void main() {\n    do Output.printInt(40000);\n") {
        Err(JackError::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::IntegerOverflow);
            assert_eq!((err.loc.line, err.loc.column), (3, 24));
        }
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn test_redefinition() {
    const CODE: &str = "\
class Main {
    field int x;
    static boolean x;
}";
    match compile_str(CODE) {
        Err(JackError::Resolution(err)) => {
            assert_eq!(
                err.kind,
                ResolutionErrorKind::Redefined {
                    name: "x".into(),
                    kind: jack::symbol::VarKind::Field,
                }
            );
            assert_eq!((err.loc.line, err.loc.column), (3, 20));
            assert!(err
                .to_string()
                .starts_with("resolution error at 3:20: field 'x' is already defined in this scope\n"));
        }
        other => panic!("expected resolution error, got {:?}", other),
    }
}

#[test]
fn test_parameter_redefined_as_local() {
    const CODE: &str = "class A { function void f(int a) { var char a; return; } }";
    match compile_str(CODE) {
        Err(JackError::Resolution(err)) => assert!(matches!(
            err.kind,
            ResolutionErrorKind::Redefined { ref name, .. } if name == "a"
        )),
        other => panic!("expected resolution error, got {:?}", other),
    }
}

#[test]
fn test_same_name_in_sibling_subroutines() {
    const CODE: &str = "\
class A {
    function int f(int a) { var int b; return a + b; }
    function int g(int b) { var int a; return a + b; }
}";
    assert!(compile_str(CODE).is_ok());
}
