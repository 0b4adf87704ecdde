//! The builtin function library.
//!
//! Dispatch is by case-insensitive name. Every builtin receives its
//! arguments pre-evaluated except `ifThenElse` (only the selected branch
//! is evaluated) and `debug` (which turns the evaluation trace on for its
//! argument). Builtins documented as operating on strings get every
//! argument force-coerced to a string first; if any argument will not
//! coerce the whole call is an error before the function body runs.
//!
//! Arity or type violations yield [`Value::Error`], never a panic. A name
//! matching no builtin falls through to the shared-library extension
//! point.

use std::fmt::Write as _;

use chrono::{Local, TimeZone, Utc};
use rand::Rng;
use regex::{Regex, RegexBuilder};

use crate::{
    ast::ExprTree,
    evaluator::{EvalState, Evaluator, Scope},
    lexer::Lexer,
    parser::Parser,
    shared,
    value::Value,
};

/// Builtins whose arguments are all coerced to strings before dispatch.
fn wants_string_args(name: &str) -> bool {
    matches!(
        name,
        "strcat" | "strcmp" | "stricmp" | "toupper" | "tolower" | "size" | "eval"
    )
}

impl Evaluator {
    pub(crate) fn eval_call(
        &self,
        name: &str,
        args: &[ExprTree],
        scope: Scope<'_>,
        state: &mut EvalState,
    ) -> Value {
        let lname = name.to_ascii_lowercase();

        // lazy: only the selected branch may be evaluated
        if lname == "ifthenelse" {
            return self.fn_if_then_else(args, scope, state);
        }

        // debug(e) traces e's entire evaluation; the caller restores the
        // flag once the call (and its trace line) is done
        if lname == "debug" {
            state.debug = true;
        }

        let coerce = wants_string_args(&lname);
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let mut value = self.eval_expr(arg, scope, state);
            if coerce && !value.coerce_to_string(true) {
                return Value::Error;
            }
            values.push(value);
        }

        match lname.as_str() {
            "gettime" | "time" => Value::Integer(Utc::now().timestamp()),
            "interval" => fn_interval(&values),
            "random" => fn_random(&values),
            "isundefined" => fn_type_predicate(&values, |v| matches!(v, Value::Undefined)),
            "iserror" => fn_type_predicate(&values, |v| matches!(v, Value::Error)),
            "isstring" => fn_type_predicate(&values, |v| matches!(v, Value::Str(_))),
            "isinteger" => fn_type_predicate(&values, |v| matches!(v, Value::Integer(_))),
            "isreal" => fn_type_predicate(&values, |v| matches!(v, Value::Float(_))),
            "isboolean" => fn_type_predicate(&values, |v| {
                matches!(v, Value::Boolean(_) | Value::Integer(0) | Value::Integer(1))
            }),
            "string" => fn_string(&values),
            "real" => fn_real(&values),
            "int" => fn_int(&values),
            "floor" => fn_rounding(&values, f64::floor),
            "round" => fn_rounding(&values, f64::round_ties_even),
            "ceiling" => fn_rounding(&values, f64::ceil),
            "strcat" => fn_strcat(&values),
            "substr" => fn_substr(&values),
            "strcmp" => fn_strcmp(&values, false),
            "stricmp" => fn_strcmp(&values, true),
            "toupper" => fn_case(&values, true),
            "tolower" => fn_case(&values, false),
            "size" => fn_size(&values),
            "stringlistsize" => fn_string_list_size(&values),
            "stringlistsum" => fn_string_list_sum(&values),
            "stringlistavg" => fn_string_list_avg(&values),
            "stringlistmin" => fn_string_list_extreme(&values, true),
            "stringlistmax" => fn_string_list_extreme(&values, false),
            "stringlistmember" => fn_string_list_member(&values, false),
            "stringlistimember" => fn_string_list_member(&values, true),
            "stringlistregexpmember" | "stringlist_regexpmember" => {
                fn_string_list_regexp_member(&values)
            }
            "regexp" => fn_regexp(&values),
            "regexps" => fn_regexps(&values),
            "formattime" => fn_format_time(&values),
            "eval" => self.fn_eval(&values, scope, state),
            "debug" => {
                if values.len() == 1 {
                    values.pop().unwrap_or(Value::Error)
                } else {
                    Value::Error
                }
            }
            // no builtin by that name: try the shared-library extension
            // point, under the name as written
            _ => shared::dispatch(name, &values),
        }
    }

    /// ifThenElse(c, t, e) - lazily evaluate the branch `c` selects.
    ///
    /// An Undefined condition yields Undefined; a String or Error
    /// condition (or any arity but 3) yields Error.
    fn fn_if_then_else(
        &self,
        args: &[ExprTree],
        scope: Scope<'_>,
        state: &mut EvalState,
    ) -> Value {
        if args.len() != 3 {
            return Value::Error;
        }

        let condition = self.eval_expr(&args[0], scope, state);
        match condition {
            Value::Undefined => Value::Undefined,
            _ => match condition.truth() {
                Some(true) => self.eval_expr(&args[1], scope, state),
                Some(false) => self.eval_expr(&args[2], scope, state),
                None => Value::Error,
            },
        }
    }

    /// eval(s) - re-parse `s` and evaluate it in the caller's scope.
    fn fn_eval(&self, args: &[Value], scope: Scope<'_>, state: &mut EvalState) -> Value {
        if args.len() != 1 {
            return Value::Error;
        }
        let Some(text) = args[0].as_str() else {
            return Value::Error;
        };

        let tree = Parser::new(Lexer::new(text)).and_then(|mut p| p.parse());
        match tree {
            Ok((expr, _)) => self.eval_expr(&expr, scope, state),
            Err(_) => Value::Error,
        }
    }
}

fn fn_type_predicate(args: &[Value], pred: impl Fn(&Value) -> bool) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    Value::Integer(pred(&args[0]) as i64)
}

/// string(x) - coerce to String.
///
/// Undefined stays Undefined (unknown, not broken); Error stays Error.
fn fn_string(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    let mut value = args[0].clone();
    if value == Value::Null {
        return Value::Error;
    }
    value.coerce_to_string(false);
    value
}

/// real(x) - numeric coercion to Float.
fn fn_real(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    match &args[0] {
        Value::Float(n) => Value::Float(*n),
        Value::Integer(n) => Value::Float(*n as f64),
        Value::Boolean(b) => Value::Float(*b as i64 as f64),
        Value::Str(s) => match s.trim().parse::<f64>() {
            Ok(n) => Value::Float(n),
            Err(_) => Value::Error,
        },
        _ => Value::Error,
    }
}

/// int(x) - numeric coercion to Integer; floats truncate toward zero.
fn fn_int(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    match &args[0] {
        Value::Integer(n) => Value::Integer(*n),
        Value::Float(n) => Value::Integer(*n as i64),
        Value::Boolean(b) => Value::Integer(*b as i64),
        Value::Str(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Value::Integer(n)
            } else if let Ok(n) = s.parse::<f64>() {
                Value::Integer(n as i64)
            } else {
                Value::Error
            }
        }
        _ => Value::Error,
    }
}

/// floor/round/ceiling - Integer passthrough, otherwise coerce to Real
/// and apply the math function.
fn fn_rounding(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    if let Value::Integer(n) = args[0] {
        return Value::Integer(n);
    }
    match fn_real(args) {
        Value::Float(n) => Value::Integer(f(n) as i64),
        _ => Value::Error,
    }
}

/// strcat(...) - concatenate; arguments arrive already string-coerced.
fn fn_strcat(args: &[Value]) -> Value {
    let mut result = String::new();
    for arg in args {
        match arg.as_str() {
            Some(s) => result.push_str(s),
            None => return Value::Error,
        }
    }
    Value::Str(result)
}

/// substr(s, offset [, len]) - Perl-style substring.
///
/// Negative offset counts from the end; negative len trims from the end
/// of the rest-of-string; out-of-range clips to empty, never errors.
fn fn_substr(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::Error;
    }
    let Value::Str(s) = &args[0] else {
        return Value::Error;
    };
    let Value::Integer(raw_offset) = args[1] else {
        return Value::Error;
    };

    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;

    let mut offset = raw_offset;
    if offset < 0 {
        offset += n;
    }

    let mut length = if args.len() == 3 {
        let Value::Integer(len) = args[2] else {
            return Value::Error;
        };
        len
    } else {
        n - offset
    };

    if offset < 0 || offset > n {
        return Value::Str(String::new());
    }
    if length > n - offset {
        length = n - offset;
    }
    if length < 0 {
        length = n - offset + length;
    }
    if length <= 0 {
        return Value::Str(String::new());
    }

    let start = offset as usize;
    let end = start + length as usize;
    Value::Str(chars[start..end].iter().collect())
}

/// strcmp/stricmp - lexicographic comparator returning -1/0/1.
fn fn_strcmp(args: &[Value], ignore_case: bool) -> Value {
    if args.len() != 2 {
        return Value::Error;
    }
    let (Some(a), Some(b)) = (args[0].as_str(), args[1].as_str()) else {
        return Value::Error;
    };

    let ordering = if ignore_case {
        a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
    } else {
        a.cmp(b)
    };
    Value::Integer(match ordering {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    })
}

/// toUpper/toLower - ASCII case conversion.
fn fn_case(args: &[Value], upper: bool) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    match args[0].as_str() {
        Some(s) => Value::Str(if upper {
            s.to_ascii_uppercase()
        } else {
            s.to_ascii_lowercase()
        }),
        None => Value::Error,
    }
}

/// size(s) - string length in characters.
fn fn_size(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    match args[0].as_str() {
        Some(s) => Value::Integer(s.chars().count() as i64),
        None => Value::Error,
    }
}

/// interval(n) - seconds rendered as `d+hh:mm:ss`, or `h:mm:ss` under a
/// day.
fn fn_interval(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Error;
    }
    let Value::Integer(total) = args[0] else {
        return Value::Error;
    };

    let sign = if total < 0 { "-" } else { "" };
    let t = total.abs();
    let days = t / 86400;
    let hours = (t / 3600) % 24;
    let mins = (t / 60) % 60;
    let secs = t % 60;

    let text = if days > 0 {
        format!("{sign}{days}+{hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{sign}{hours}:{mins:02}:{secs:02}")
    };
    Value::Str(text)
}

/// random() in [0,1); random(n) in [0,n) keeping the argument's kind.
fn fn_random(args: &[Value]) -> Value {
    let mut rng = rand::rng();
    match args {
        [] => Value::Float(rng.random::<f64>()),
        [Value::Integer(n)] => {
            if *n <= 0 {
                Value::Error
            } else {
                Value::Integer(rng.random_range(0..*n))
            }
        }
        [Value::Float(n)] => Value::Float(rng.random::<f64>() * n),
        _ => Value::Error,
    }
}

// ---------------------------------------------------------------------------
// string lists
// ---------------------------------------------------------------------------

const DEFAULT_DELIMS: &str = " ,";

/// Split on any delimiter character, dropping empty entries.
fn split_list<'a>(list: &'a str, delims: &str) -> Vec<&'a str> {
    list.split(|c| delims.contains(c))
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Common argument handling: (list [, delims]) both strict strings.
fn list_and_delims(args: &[Value]) -> Option<(&str, &str)> {
    if args.is_empty() || args.len() > 2 {
        return None;
    }
    let Value::Str(list) = &args[0] else {
        return None;
    };
    let delims = if args.len() == 2 {
        let Value::Str(d) = &args[1] else {
            return None;
        };
        d.as_str()
    } else {
        DEFAULT_DELIMS
    };
    Some((list, delims))
}

/// A parsed list entry: its value, and whether it only used integer
/// characters (anything else promotes the aggregate to Float).
fn parse_entries(list: &str, delims: &str) -> Option<Vec<(f64, bool)>> {
    let mut entries = vec![];
    for entry in split_list(list, delims) {
        let value = entry.parse::<f64>().ok()?;
        let integral = entry
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-');
        entries.push((value, integral));
    }
    Some(entries)
}

/// stringListSize(l [, d]) - number of entries.
fn fn_string_list_size(args: &[Value]) -> Value {
    match list_and_delims(args) {
        Some((list, delims)) => Value::Integer(split_list(list, delims).len() as i64),
        None => Value::Error,
    }
}

/// stringListSum(l [, d]) - sum of numeric entries; empty list sums to 0.
fn fn_string_list_sum(args: &[Value]) -> Value {
    let Some((list, delims)) = list_and_delims(args) else {
        return Value::Error;
    };
    let Some(entries) = parse_entries(list, delims) else {
        return Value::Error;
    };
    if entries.is_empty() {
        return Value::Integer(0);
    }

    let sum: f64 = entries.iter().map(|(v, _)| v).sum();
    if entries.iter().all(|(_, integral)| *integral) {
        Value::Integer(sum as i64)
    } else {
        Value::Float(sum)
    }
}

/// stringListAvg(l [, d]) - average as a Float; empty list averages to 0.
fn fn_string_list_avg(args: &[Value]) -> Value {
    let Some((list, delims)) = list_and_delims(args) else {
        return Value::Error;
    };
    let Some(entries) = parse_entries(list, delims) else {
        return Value::Error;
    };
    if entries.is_empty() {
        return Value::Float(0.0);
    }

    let sum: f64 = entries.iter().map(|(v, _)| v).sum();
    Value::Float(sum / entries.len() as f64)
}

/// stringListMin/Max(l [, d]) - extreme of numeric entries; empty list is
/// Undefined.
fn fn_string_list_extreme(args: &[Value], min: bool) -> Value {
    let Some((list, delims)) = list_and_delims(args) else {
        return Value::Error;
    };
    let Some(entries) = parse_entries(list, delims) else {
        return Value::Error;
    };
    if entries.is_empty() {
        return Value::Undefined;
    }

    let mut best = entries[0].0;
    for (value, _) in &entries[1..] {
        if (min && *value < best) || (!min && *value > best) {
            best = *value;
        }
    }
    if entries.iter().all(|(_, integral)| *integral) {
        Value::Integer(best as i64)
    } else {
        Value::Float(best)
    }
}

/// stringListMember/IMember(x, l [, d]) - membership test.
fn fn_string_list_member(args: &[Value], ignore_case: bool) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::Error;
    }
    let (Value::Str(needle), Value::Str(list)) = (&args[0], &args[1]) else {
        return Value::Error;
    };
    let delims = if args.len() == 3 {
        let Value::Str(d) = &args[2] else {
            return Value::Error;
        };
        d.as_str()
    } else {
        DEFAULT_DELIMS
    };

    let found = split_list(list, delims).into_iter().any(|entry| {
        if ignore_case {
            entry.eq_ignore_ascii_case(needle)
        } else {
            entry == needle.as_str()
        }
    });
    Value::Integer(found as i64)
}

/// stringListRegexpMember(pat, l [, d] [, opts]) - true when the pattern
/// matches any entry.
fn fn_string_list_regexp_member(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 4 {
        return Value::Error;
    }
    let (Value::Str(pattern), Value::Str(list)) = (&args[0], &args[1]) else {
        return Value::Error;
    };
    let delims = match args.get(2) {
        Some(Value::Str(d)) => d.as_str(),
        Some(_) => return Value::Error,
        None => DEFAULT_DELIMS,
    };
    let options = match args.get(3) {
        Some(Value::Str(o)) => o.as_str(),
        Some(_) => return Value::Error,
        None => "",
    };

    let Some(re) = compile_pattern(pattern, options) else {
        return Value::Error;
    };
    let found = split_list(list, delims)
        .into_iter()
        .any(|entry| re.is_match(entry));
    Value::Integer(found as i64)
}

// ---------------------------------------------------------------------------
// regular expressions
// ---------------------------------------------------------------------------

/// Map the option letters onto the builder; unknown letters are ignored
/// for forward compatibility.
fn compile_pattern(pattern: &str, options: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for opt in options.chars() {
        match opt.to_ascii_lowercase() {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => {}
        }
    }
    builder.build().ok()
}

/// regexp(pat, target [, opts]) - boolean match.
fn fn_regexp(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::Error;
    }
    let (Value::Str(pattern), Value::Str(target)) = (&args[0], &args[1]) else {
        return Value::Error;
    };
    let options = match args.get(2) {
        Some(Value::Str(o)) => o.as_str(),
        Some(_) => return Value::Error,
        None => "",
    };

    match compile_pattern(pattern, options) {
        Some(re) => Value::Integer(re.is_match(target) as i64),
        None => Value::Error,
    }
}

/// regexps(pat, target, subst [, opts]) - match, then substitute `\N`
/// backreferences into `subst`. No match yields the empty string.
fn fn_regexps(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() > 4 {
        return Value::Error;
    }
    let (Value::Str(pattern), Value::Str(target), Value::Str(subst)) =
        (&args[0], &args[1], &args[2])
    else {
        return Value::Error;
    };
    let options = match args.get(3) {
        Some(Value::Str(o)) => o.as_str(),
        Some(_) => return Value::Error,
        None => "",
    };

    let Some(re) = compile_pattern(pattern, options) else {
        return Value::Error;
    };
    let Some(captures) = re.captures(target) else {
        return Value::Str(String::new());
    };

    let mut output = String::new();
    let mut chars = subst.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek().and_then(|c| c.to_digit(10)) {
                Some(group) => {
                    chars.next();
                    if let Some(m) = captures.get(group as usize) {
                        output.push_str(m.as_str());
                    }
                }
                None => output.push('\\'),
            }
        } else {
            output.push(ch);
        }
    }
    Value::Str(output)
}

/// formatTime([epoch] [, fmt]) - strftime rendering in local time,
/// defaulting to now and `"%c"`. A format chrono rejects renders as the
/// empty string, like a zero-length strftime result.
fn fn_format_time(args: &[Value]) -> Value {
    if args.len() > 2 {
        return Value::Error;
    }

    let epoch = match args.first() {
        Some(Value::Integer(t)) if *t >= 0 => *t,
        Some(_) => return Value::Error,
        None => Utc::now().timestamp(),
    };
    let format = match args.get(1) {
        Some(Value::Str(f)) => f.as_str(),
        Some(_) => return Value::Error,
        None => "%c",
    };

    let Some(datetime) = Local.timestamp_opt(epoch, 0).single() else {
        return Value::Error;
    };

    let mut output = String::new();
    match write!(output, "{}", datetime.format(format)) {
        Ok(()) => Value::Str(output),
        Err(_) => Value::Str(String::new()),
    }
}
