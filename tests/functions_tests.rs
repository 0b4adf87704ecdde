// tests/functions_tests.rs

use classad_lang::{ClassAd, Evaluator, Lexer, Parser, Record, Value};

fn eval(expr: &str) -> Value {
    eval_with(expr, None)
}

fn eval_with(expr: &str, my: Option<&ClassAd>) -> Value {
    let mut parser = Parser::new(Lexer::new(expr)).unwrap();
    let (tree, _) = parser.parse().unwrap();
    Evaluator::new().eval(&tree, my.map(|ad| ad as &dyn Record), None)
}

// ============================================================================
// Type predicates
// ============================================================================

#[test]
fn test_type_predicates() {
    assert_eq!(eval("isUndefined(NoSuch)"), Value::Integer(1));
    assert_eq!(eval("isUndefined(1)"), Value::Integer(0));
    assert_eq!(eval("isError(1 / 0)"), Value::Integer(1));
    assert_eq!(eval("isString(\"x\")"), Value::Integer(1));
    assert_eq!(eval("isInteger(3)"), Value::Integer(1));
    assert_eq!(eval("isInteger(3.0)"), Value::Integer(0));
    assert_eq!(eval("isReal(3.0)"), Value::Integer(1));
}

#[test]
fn test_is_boolean_accepts_zero_and_one() {
    assert_eq!(eval("isBoolean(TRUE)"), Value::Integer(1));
    assert_eq!(eval("isBoolean(0)"), Value::Integer(1));
    assert_eq!(eval("isBoolean(2)"), Value::Integer(0));
}

#[test]
fn test_predicates_check_arity() {
    assert_eq!(eval("isUndefined()"), Value::Error);
    assert_eq!(eval("isUndefined(1, 2)"), Value::Error);
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_string_conversion() {
    assert_eq!(eval("string(4)"), Value::Str("4".to_string()));
    assert_eq!(eval("string(2.5)"), Value::Str("2.500000".to_string()));
    assert_eq!(eval("string(\"as-is\")"), Value::Str("as-is".to_string()));
    // unknown is not broken: it passes through unconverted
    assert_eq!(eval("string(NoSuch)"), Value::Undefined);
    assert_eq!(eval("string(1 / 0)"), Value::Error);
}

#[test]
fn test_real_conversion() {
    assert_eq!(eval("real(3)"), Value::Float(3.0));
    assert_eq!(eval("real(3.5)"), Value::Float(3.5));
    assert_eq!(eval("real(TRUE)"), Value::Float(1.0));
    assert_eq!(eval("real(\"2.5\")"), Value::Float(2.5));
    assert_eq!(eval("real(\"pony\")"), Value::Error);
    assert_eq!(eval("real(NoSuch)"), Value::Error);
}

#[test]
fn test_int_conversion() {
    assert_eq!(eval("int(3)"), Value::Integer(3));
    assert_eq!(eval("int(3.9)"), Value::Integer(3));
    assert_eq!(eval("int(-3.9)"), Value::Integer(-3));
    assert_eq!(eval("int(\"42\")"), Value::Integer(42));
    assert_eq!(eval("int(\"3.9\")"), Value::Integer(3));
    assert_eq!(eval("int(\"x\")"), Value::Error);
}

#[test]
fn test_rounding() {
    assert_eq!(eval("floor(3.9)"), Value::Integer(3));
    assert_eq!(eval("ceiling(3.1)"), Value::Integer(4));
    assert_eq!(eval("round(3.5)"), Value::Integer(4));
    assert_eq!(eval("round(2.5)"), Value::Integer(2)); // ties to even
    assert_eq!(eval("floor(7)"), Value::Integer(7));
    assert_eq!(eval("floor(\"3.9\")"), Value::Integer(3));
}

// ============================================================================
// String functions
// ============================================================================

#[test]
fn test_strcat_coerces_arguments() {
    assert_eq!(
        eval(r#"strcat("slot", 1)"#),
        Value::Str("slot1".to_string())
    );
    assert_eq!(
        eval(r#"strcat("x=", 2.5)"#),
        Value::Str("x=2.500000".to_string())
    );
    assert_eq!(eval("strcat()"), Value::Str(String::new()));
    // force-coercion renders even the non-values
    assert_eq!(
        eval("strcat(\"got \", NoSuch)"),
        Value::Str("got UNDEFINED".to_string())
    );
}

#[test]
fn test_substr_perl_semantics() {
    assert_eq!(eval(r#"substr("hello", -3)"#), Value::Str("llo".to_string()));
    assert_eq!(eval(r#"substr("hello", 1, -2)"#), Value::Str("el".to_string()));
    assert_eq!(eval(r#"substr("hello", 10)"#), Value::Str(String::new()));
    assert_eq!(eval(r#"substr("hello", 0, 2)"#), Value::Str("he".to_string()));
    assert_eq!(eval(r#"substr("hello", 2)"#), Value::Str("llo".to_string()));
    assert_eq!(eval(r#"substr("hello", -99)"#), Value::Str(String::new()));
    assert_eq!(eval(r#"substr("hello", 0, 99)"#), Value::Str("hello".to_string()));
}

#[test]
fn test_substr_type_checks() {
    assert_eq!(eval("substr(5, 0)"), Value::Error);
    assert_eq!(eval(r#"substr("s", "x")"#), Value::Error);
    assert_eq!(eval(r#"substr("s")"#), Value::Error);
}

#[test]
fn test_strcmp_family() {
    assert_eq!(eval(r#"strcmp("a", "b")"#), Value::Integer(-1));
    assert_eq!(eval(r#"strcmp("b", "a")"#), Value::Integer(1));
    assert_eq!(eval(r#"strcmp("a", "a")"#), Value::Integer(0));
    assert_eq!(eval(r#"strcmp("a", "A")"#), Value::Integer(1));
    assert_eq!(eval(r#"stricmp("a", "A")"#), Value::Integer(0));
    // arguments coerce first, so numbers compare as their text
    assert_eq!(eval(r#"strcmp(10, "10")"#), Value::Integer(0));
}

#[test]
fn test_case_conversion() {
    assert_eq!(eval(r#"toUpper("mixed Case")"#), Value::Str("MIXED CASE".to_string()));
    assert_eq!(eval(r#"toLower("MIXED Case")"#), Value::Str("mixed case".to_string()));
    assert_eq!(eval("toUpper(1.5)"), Value::Str("1.500000".to_string()));
}

#[test]
fn test_size() {
    assert_eq!(eval(r#"size("hello")"#), Value::Integer(5));
    assert_eq!(eval(r#"size("")"#), Value::Integer(0));
    assert_eq!(eval("size(1234)"), Value::Integer(4));
}

// ============================================================================
// String lists
// ============================================================================

#[test]
fn test_string_list_size() {
    assert_eq!(eval(r#"stringListSize("1, 2, 3")"#), Value::Integer(3));
    assert_eq!(eval(r#"stringListSize("a;b;c", ";")"#), Value::Integer(3));
    assert_eq!(eval(r#"stringListSize("")"#), Value::Integer(0));
    assert_eq!(eval("stringListSize(5)"), Value::Error);
}

#[test]
fn test_string_list_sum() {
    assert_eq!(eval(r#"stringListSum("1,2,3")"#), Value::Integer(6));
    assert_eq!(eval(r#"stringListSum("")"#), Value::Integer(0));
    assert_eq!(eval(r#"stringListSum("1,2,x")"#), Value::Error);
    // one real entry promotes the whole aggregate
    assert_eq!(eval(r#"stringListSum("1,2.5")"#), Value::Float(3.5));
}

#[test]
fn test_string_list_min_max() {
    assert_eq!(eval(r#"stringListMin("3,1,2")"#), Value::Integer(1));
    assert_eq!(eval(r#"stringListMax("3,1,2")"#), Value::Integer(3));
    assert_eq!(eval(r#"stringListMin("")"#), Value::Undefined);
    assert_eq!(eval(r#"stringListMax("")"#), Value::Undefined);
    assert_eq!(eval(r#"stringListMax("-3,-1,-2")"#), Value::Integer(-1));
    assert_eq!(eval(r#"stringListMin("1.5,2")"#), Value::Float(1.5));
}

#[test]
fn test_string_list_avg() {
    assert_eq!(eval(r#"stringListAvg("1,2,3,4")"#), Value::Float(2.5));
    assert_eq!(eval(r#"stringListAvg("")"#), Value::Float(0.0));
}

#[test]
fn test_string_list_member() {
    assert_eq!(eval(r#"stringListMember("b", "a,b,c")"#), Value::Integer(1));
    assert_eq!(eval(r#"stringListMember("B", "a,b,c")"#), Value::Integer(0));
    assert_eq!(eval(r#"stringListIMember("B", "a,b,c")"#), Value::Integer(1));
    assert_eq!(eval(r#"stringListMember("x", "a,b,c")"#), Value::Integer(0));
}

#[test]
fn test_string_list_regexp_member() {
    assert_eq!(
        eval(r#"stringListRegexpMember("^sl.t", "node, slot1")"#),
        Value::Integer(1)
    );
    assert_eq!(
        eval(r#"stringListRegexpMember("^SL.T$", "node, slot1")"#),
        Value::Integer(0)
    );
    assert_eq!(
        eval(r#"stringListRegexpMember("SLOT1", "node, slot1", " ,", "i")"#),
        Value::Integer(1)
    );
    assert_eq!(
        eval(r#"stringListRegexpMember("(", "a,b")"#),
        Value::Error
    );
}

// ============================================================================
// Regular expressions
// ============================================================================

#[test]
fn test_regexp() {
    assert_eq!(eval(r#"regexp("^ab.*f$", "abcdef")"#), Value::Integer(1));
    assert_eq!(eval(r#"regexp("^xyz", "abcdef")"#), Value::Integer(0));
    assert_eq!(eval(r#"regexp("ABC", "xabcx", "i")"#), Value::Integer(1));
    assert_eq!(eval(r#"regexp("(", "x")"#), Value::Error);
    assert_eq!(eval(r#"regexp(1, "x")"#), Value::Error);
}

#[test]
fn test_regexps_substitution() {
    assert_eq!(
        eval(r#"regexps("slot([0-9]+)", "name is slot12", "slot number \1")"#),
        Value::Str("slot number 12".to_string())
    );
    assert_eq!(
        eval(r#"regexps("(a+)(b+)", "xaabbbx", "\2-\1")"#),
        Value::Str("bbb-aa".to_string())
    );
    // group 0 is the whole match
    assert_eq!(
        eval(r#"regexps("a+", "xaaax", "[\0]")"#),
        Value::Str("[aaa]".to_string())
    );
    // no match yields the empty string, not an error
    assert_eq!(
        eval(r#"regexps("z+", "abc", "\1")"#),
        Value::Str(String::new())
    );
    // a backslash before a non-digit passes through
    assert_eq!(
        eval(r#"regexps("a", "a", "x\\y")"#),
        Value::Str("x\\y".to_string())
    );
}

// ============================================================================
// Time functions
// ============================================================================

#[test]
fn test_time_returns_epoch_seconds() {
    match eval("time()") {
        Value::Integer(t) => assert!(t > 1_500_000_000),
        other => panic!("Expected integer epoch, got {:?}", other),
    }
    match eval("getTime()") {
        Value::Integer(t) => assert!(t > 1_500_000_000),
        other => panic!("Expected integer epoch, got {:?}", other),
    }
}

#[test]
fn test_interval_formatting() {
    assert_eq!(eval("interval(1)"), Value::Str("0:00:01".to_string()));
    assert_eq!(eval("interval(3661)"), Value::Str("1:01:01".to_string()));
    assert_eq!(eval("interval(90061)"), Value::Str("1+01:01:01".to_string()));
    assert_eq!(eval("interval(\"x\")"), Value::Error);
    assert_eq!(eval("interval(1, 2)"), Value::Error);
}

#[test]
fn test_format_time() {
    // epoch 1_000_000_000 is 2001-09-09 in every timezone
    match eval(r#"formatTime(1000000000, "%Y")"#) {
        Value::Str(s) => assert_eq!(s, "2001"),
        other => panic!("Expected string, got {:?}", other),
    }
    assert!(matches!(eval("formatTime()"), Value::Str(_)));
    assert_eq!(eval(r#"formatTime(-5)"#), Value::Error);
    assert_eq!(eval(r#"formatTime(0, 5)"#), Value::Error);
    assert_eq!(eval(r#"formatTime(0, "%Y", "x")"#), Value::Error);
}

// ============================================================================
// Conditional, eval, random
// ============================================================================

#[test]
fn test_if_then_else() {
    assert_eq!(eval("ifThenElse(1 < 2, \"yes\", \"no\")"), Value::Str("yes".to_string()));
    assert_eq!(eval("ifThenElse(0, \"yes\", \"no\")"), Value::Str("no".to_string()));
    assert_eq!(eval("ifThenElse(NoSuch, 1, 2)"), Value::Undefined);
    assert_eq!(eval("ifThenElse(\"str\", 1, 2)"), Value::Error);
    assert_eq!(eval("ifThenElse(1 / 0, 1, 2)"), Value::Error);
    assert_eq!(eval("ifThenElse(1, 2)"), Value::Error);
}

#[test]
fn test_if_then_else_is_lazy() {
    // the unselected branch would be a cycle error if it were evaluated
    let my = ClassAd::parse("Bad = Bad").unwrap();
    assert_eq!(
        eval_with("ifThenElse(FALSE, Bad, 3)", Some(&my)),
        Value::Integer(3)
    );
    assert_eq!(
        eval_with("ifThenElse(TRUE, 3, Bad)", Some(&my)),
        Value::Integer(3)
    );
}

#[test]
fn test_eval_builtin() {
    assert_eq!(eval(r#"eval("1 + 2")"#), Value::Integer(3));
    assert_eq!(eval(r#"eval("1 +")"#), Value::Error);

    // evaluates in the caller's scope
    let my = ClassAd::parse("Formula = \"Memory * 2\"\nMemory = 4").unwrap();
    assert_eq!(eval_with("eval(Formula)", Some(&my)), Value::Integer(8));
}

#[test]
fn test_random_ranges() {
    for _ in 0..50 {
        match eval("random()") {
            Value::Float(f) => assert!((0.0..1.0).contains(&f)),
            other => panic!("Expected float, got {:?}", other),
        }
        match eval("random(10)") {
            Value::Integer(n) => assert!((0..10).contains(&n)),
            other => panic!("Expected integer, got {:?}", other),
        }
    }
    assert_eq!(eval("random(0)"), Value::Error);
    assert_eq!(eval("random(-3)"), Value::Error);
    assert_eq!(eval("random(1, 2)"), Value::Error);
}

#[test]
fn test_debug_returns_its_argument() {
    assert_eq!(eval("debug(1 + 2)"), Value::Integer(3));
    assert_eq!(eval("debug()"), Value::Error);
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_function_names_are_case_insensitive() {
    assert_eq!(eval("IFTHENELSE(1, 2, 3)"), Value::Integer(2));
    assert_eq!(eval(r#"SUBSTR("hello", 1, 2)"#), Value::Str("el".to_string()));
    assert_eq!(eval("IsUndefined(NoSuch)"), Value::Integer(1));
}

#[test]
fn test_unknown_function_without_library_is_error() {
    // no CLASSAD_LIB_PATH configured in the test environment
    assert_eq!(eval("definitelyNotAFunction(1)"), Value::Error);
}
