//! Tree-walking evaluation of eval expressions

use super::{
    parser::{BinaryOp, CompareOp, Expr, UnaryOp},
    value::{Number, Value},
    Bindings, EvalError,
};
use std::cmp::Ordering;

/// Upper bound on strings produced by repetition
const MAX_STRING_LEN: usize = 1 << 20;

pub(super) fn eval(expr: &Expr, bindings: &dyn Bindings) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => lookup_name(name, bindings),
        Expr::Unary(op, operand) => {
            let value = eval(operand, bindings)?;
            unary(*op, value)
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = eval(left, bindings)?;
            if !left.truthy() {
                return Ok(left);
            }
            eval(right, bindings)
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = eval(left, bindings)?;
            if left.truthy() {
                return Ok(left);
            }
            eval(right, bindings)
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, bindings)?;
            let right = eval(right, bindings)?;
            binary(*op, left, right)
        }
        Expr::Compare(first, rest) => {
            let mut left = eval(first, bindings)?;
            for (op, right) in rest {
                let right = eval(right, bindings)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, bindings)?.truthy() {
                eval(then, bindings)
            } else {
                eval(otherwise, bindings)
            }
        }
        Expr::Call(function, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            call(function, args, bindings)
        }
    }
}

fn lookup_name(name: &str, bindings: &dyn Bindings) -> Result<Value, EvalError> {
    match name {
        "pi" => Ok(Value::Float(std::f64::consts::PI)),
        "e" => Ok(Value::Float(std::f64::consts::E)),
        _ => match bindings.arg(name)? {
            Some(raw) => Ok(Value::from_auto(&raw)),
            None => Err(EvalError::UnknownIdentifier(name.to_string())),
        },
    }
}

fn mismatch(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!value.truthy()));
    }
    let number = value.as_number().ok_or_else(|| {
        EvalError::TypeMismatch(format!("bad operand type for unary operator: '{}'", value.type_name()))
    })?;
    Ok(match (op, number) {
        (UnaryOp::Neg, Number::Int(n)) => Value::Int(n.checked_neg().ok_or(EvalError::Overflow)?),
        (UnaryOp::Neg, Number::Float(f)) => Value::Float(-f),
        (_, n) => n.into(),
    })
}

fn repeat(s: &str, count: i64) -> Result<Value, EvalError> {
    let count = usize::try_from(count.max(0)).map_err(|_| EvalError::Overflow)?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::Str(s.repeat(count))),
        _ => Err(EvalError::Overflow),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (op, &left, &right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            return repeat(s, *n);
        }
        _ => {}
    }

    let symbol = match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    };
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(mismatch(symbol, &left, &right));
    };

    match (a, b) {
        (Number::Int(a), Number::Int(b)) => int_binary(op, a, b),
        _ => float_binary(op, a.as_f64(), b.as_f64()),
    }
}

fn logical_in_arithmetic() -> EvalError {
    EvalError::TypeMismatch("logical operator used as arithmetic".to_string())
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_binary(op, a as f64, b as f64),
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::FloorDiv => {
            let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
            Some(if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q })
        }
        BinaryOp::Mod => {
            let r = a.checked_rem(b).ok_or(EvalError::Overflow)?;
            Some(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        }
        BinaryOp::Pow if b < 0 => return float_binary(op, a as f64, b as f64),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        BinaryOp::And | BinaryOp::Or => return Err(logical_in_arithmetic()),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::DivisionByZero)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow if a == 0.0 && b < 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Pow => a.powf(b),
        BinaryOp::And | BinaryOp::Or => return Err(logical_in_arithmetic()),
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => Some(a.cmp(&b)),
            (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()),
            // Mixed string/number: only equality is defined, and it never holds
            _ => {
                return match op {
                    CompareOp::Eq => Ok(false),
                    CompareOp::Ne => Ok(true),
                    _ => Err(mismatch("comparison", left, right)),
                };
            }
        },
    };

    // NaN compares unequal to everything
    let Some(ordering) = ordering else {
        return Ok(op == CompareOp::Ne);
    };
    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

fn check_arity(function: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = match (min, max) {
            (0, 0) => "no",
            (1, 1) => "exactly 1",
            (2, 2) => "exactly 2",
            (1, 2) => "1 or 2",
            _ => "at least 1",
        };
        return Err(EvalError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn string_arg(function: &str, value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(EvalError::TypeMismatch(format!(
            "{}() expects a string, got '{}'",
            function,
            other.type_name()
        ))),
    }
}

fn number_arg(function: &str, value: &Value) -> Result<Number, EvalError> {
    value.as_number().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "{}() expects a number, got '{}'",
            function,
            value.type_name()
        ))
    })
}

fn float_to_int(f: f64) -> Result<i64, EvalError> {
    if !f.is_finite() || f.abs() >= i64::MAX as f64 {
        return Err(EvalError::Overflow);
    }
    Ok(f as i64)
}

/// Round half to even
fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

fn call(function: &str, args: Vec<Value>, bindings: &dyn Bindings) -> Result<Value, EvalError> {
    match function {
        "arg" => {
            check_arity(function, &args, 1, 1)?;
            let name = string_arg(function, &args[0])?;
            match bindings.arg(&name)? {
                Some(value) => Ok(Value::Str(value)),
                None => Err(EvalError::UnknownIdentifier(name)),
            }
        }
        "env" => {
            check_arity(function, &args, 1, 1)?;
            let name = string_arg(function, &args[0])?;
            bindings
                .env(&name)
                .map(Value::Str)
                .ok_or_else(|| EvalError::Lookup(format!("environment variable '{}' is not set", name)))
        }
        "optenv" => {
            check_arity(function, &args, 1, 2)?;
            let name = string_arg(function, &args[0])?;
            Ok(Value::Str(match bindings.env(&name) {
                Some(value) => value,
                None => args.get(1).map(Value::to_string).unwrap_or_default(),
            }))
        }
        "find" => {
            check_arity(function, &args, 1, 1)?;
            let package = string_arg(function, &args[0])?;
            bindings
                .find(&package)
                .map(Value::Str)
                .ok_or_else(|| EvalError::Lookup(format!("package '{}' not found", package)))
        }
        "anon" => {
            check_arity(function, &args, 1, 1)?;
            let name = string_arg(function, &args[0])?;
            Ok(Value::Str(bindings.anon(&name)))
        }
        "dirname" => {
            check_arity(function, &args, 0, 0)?;
            bindings
                .dirname()
                .map(Value::Str)
                .ok_or_else(|| EvalError::Lookup("dirname() outside of a launch file".to_string()))
        }
        "str" => {
            check_arity(function, &args, 1, 1)?;
            Ok(Value::Str(args[0].to_string()))
        }
        "int" => {
            check_arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    EvalError::TypeMismatch(format!("invalid literal for int(): '{}'", s))
                }),
                other => match number_arg(function, other)? {
                    Number::Int(n) => Ok(Value::Int(n)),
                    Number::Float(f) => float_to_int(f.trunc()).map(Value::Int),
                },
            }
        }
        "float" => {
            check_arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    EvalError::TypeMismatch(format!("could not convert string to float: '{}'", s))
                }),
                other => Ok(Value::Float(number_arg(function, other)?.as_f64())),
            }
        }
        "bool" => {
            check_arity(function, &args, 1, 1)?;
            Ok(Value::Bool(args[0].truthy()))
        }
        "abs" => {
            check_arity(function, &args, 1, 1)?;
            Ok(match number_arg(function, &args[0])? {
                Number::Int(n) => Value::Int(n.checked_abs().ok_or(EvalError::Overflow)?),
                Number::Float(f) => Value::Float(f.abs()),
            })
        }
        "min" | "max" => {
            check_arity(function, &args, 1, usize::MAX)?;
            let want = if function == "min" { CompareOp::Lt } else { CompareOp::Gt };
            let mut iter = args.into_iter();
            let mut best = iter.next().ok_or(EvalError::Arity {
                function: function.to_string(),
                expected: "at least 1",
                got: 0,
            })?;
            for candidate in iter {
                if compare(want, &candidate, &best)? {
                    best = candidate;
                }
            }
            Ok(best)
        }
        "round" => {
            check_arity(function, &args, 1, 2)?;
            let x = number_arg(function, &args[0])?.as_f64();
            match args.get(1) {
                None => float_to_int(round_half_even(x)).map(Value::Int),
                Some(digits) => {
                    let Number::Int(digits) = number_arg(function, digits)? else {
                        return Err(EvalError::TypeMismatch(
                            "round() digits must be an integer".to_string(),
                        ));
                    };
                    let factor = 10f64.powi(digits.clamp(-308, 308) as i32);
                    Ok(Value::Float(round_half_even(x * factor) / factor))
                }
            }
        }
        "len" => {
            check_arity(function, &args, 1, 1)?;
            let s = string_arg(function, &args[0])?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        "sqrt" => {
            check_arity(function, &args, 1, 1)?;
            let x = number_arg(function, &args[0])?.as_f64();
            if x < 0.0 {
                return Err(EvalError::TypeMismatch("math domain error".to_string()));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "floor" | "ceil" => {
            check_arity(function, &args, 1, 1)?;
            match number_arg(function, &args[0])? {
                Number::Int(n) => Ok(Value::Int(n)),
                Number::Float(f) => {
                    let rounded = if function == "floor" { f.floor() } else { f.ceil() };
                    float_to_int(rounded).map(Value::Int)
                }
            }
        }
        "pow" => {
            check_arity(function, &args, 2, 2)?;
            let base = number_arg(function, &args[0])?.as_f64();
            let exponent = number_arg(function, &args[1])?.as_f64();
            float_binary(BinaryOp::Pow, base, exponent)
        }
        _ => Err(EvalError::UnknownFunction(function.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{evaluate, testing::MapBindings};
    use super::*;

    fn value(source: &str) -> Value {
        evaluate(source, &MapBindings::default()).unwrap()
    }

    #[test]
    fn test_bools_are_numbers_in_arithmetic() {
        assert_eq!(value("True + 1"), Value::Int(2));
        assert_eq!(value("1 == True"), Value::Bool(true));
    }

    #[test]
    fn test_mixed_equality_is_false() {
        assert_eq!(value("'1' == 1"), Value::Bool(false));
        assert_eq!(value("'1' != 1"), Value::Bool(true));
    }

    #[test]
    fn test_power_with_negative_exponent_is_float() {
        assert_eq!(value("2 ** -1"), Value::Float(0.5));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = evaluate("9223372036854775807 + 1", &MapBindings::default()).unwrap_err();
        assert_eq!(err, EvalError::Overflow);
    }

    #[test]
    fn test_huge_string_repeat_is_reported() {
        let bindings = MapBindings::default();
        assert_eq!(
            evaluate("'ab' * 9223372036854775807", &bindings).unwrap_err(),
            EvalError::Overflow
        );
        assert_eq!(
            evaluate("2000000 * 'x'", &bindings).unwrap_err(),
            EvalError::Overflow
        );
        assert_eq!(value("'ab' * 3"), Value::Str("ababab".to_string()));
        assert_eq!(value("'ab' * -1"), Value::Str(String::new()));
        assert_eq!(value("'' * 9223372036854775807"), Value::Str(String::new()));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(value("round(0.5)"), Value::Int(0));
        assert_eq!(value("round(1.5)"), Value::Int(2));
        assert_eq!(value("round(-2.5)"), Value::Int(-2));
    }

    #[test]
    fn test_call_errors() {
        let bindings = MapBindings::default();
        assert!(matches!(
            evaluate("nope(1)", &bindings),
            Err(EvalError::UnknownFunction(_))
        ));
        assert!(matches!(
            evaluate("len('a', 'b')", &bindings),
            Err(EvalError::Arity { got: 2, .. })
        ));
        assert!(matches!(
            evaluate("find('missing')", &bindings),
            Err(EvalError::Lookup(_))
        ));
    }
}
