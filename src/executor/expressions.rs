//! Expression evaluation
//!
//! Walks the parsed expression tree. Subscripts and function arguments are
//! evaluated first, innermost outward, before the enclosing operator applies.

use super::Executor;
use crate::error::{BasicError, Result};
use crate::output::format_number;
use crate::parser::{BinaryOperator, Expression, UnaryOperator};
use crate::variables::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Truth values produced by comparisons and logical operators
const TRUE: f64 = -1.0;
const FALSE: f64 = 0.0;

fn truth(condition: bool) -> Value {
    Value::Number(if condition { TRUE } else { FALSE })
}

/// Reject NaN and infinities produced by arithmetic
fn finite(value: f64) -> Result<Value> {
    if value.is_finite() {
        Ok(Value::Number(value))
    } else {
        Err(BasicError::IllegalQuantity)
    }
}

impl Executor {
    /// Evaluate an expression to a value
    pub fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::Str(s.clone())),
            Expression::Variable(name) => Ok(self.variables.get(name)),
            Expression::ArrayAccess { name, indices } => {
                if name.starts_with("FN") && !self.variables.has_array(name) {
                    return Err(BasicError::UndefinedFunction(name.clone()));
                }
                let indices = self.eval_indices(indices)?;
                self.variables.get_array_element(name, &indices)
            }
            Expression::FunctionCall { name, args } => self.eval_function(name, args),
            Expression::BinaryOp { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                eval_binary(*op, left, right)
            }
            Expression::UnaryOp { op, operand } => {
                let value = self.eval_number(operand)?;
                match op {
                    UnaryOperator::Plus => Ok(Value::Number(value)),
                    UnaryOperator::Minus => Ok(Value::Number(-value)),
                    UnaryOperator::Not => Ok(Value::Number(!(value.trunc() as i64) as f64)),
                }
            }
        }
    }

    /// Evaluate an expression that must be numeric
    pub(super) fn eval_number(&mut self, expr: &Expression) -> Result<f64> {
        self.evaluate(expr)?.as_number()
    }

    /// Evaluate an expression that must be a string
    pub(super) fn eval_string(&mut self, expr: &Expression) -> Result<String> {
        match self.evaluate(expr)? {
            Value::Str(s) => Ok(s),
            Value::Number(_) => Err(BasicError::TypeMismatch),
        }
    }

    pub(super) fn eval_indices(&mut self, indices: &[Expression]) -> Result<Vec<f64>> {
        indices.iter().map(|index| self.eval_number(index)).collect()
    }

    /// Evaluate a built-in function call
    fn eval_function(&mut self, name: &str, args: &[Expression]) -> Result<Value> {
        match name {
            "ABS" => self.numeric_function(name, args, f64::abs),
            "ATN" => self.numeric_function(name, args, f64::atan),
            "COS" => self.numeric_function(name, args, f64::cos),
            "SIN" => self.numeric_function(name, args, f64::sin),
            "TAN" => self.numeric_function(name, args, f64::tan),
            "EXP" => self.numeric_function(name, args, f64::exp),
            "INT" => self.numeric_function(name, args, f64::floor),
            "SGN" => self.numeric_function(name, args, |x| {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }),
            "LOG" => {
                let x = self.single_number(name, args)?;
                if x <= 0.0 {
                    return Err(BasicError::IllegalQuantity);
                }
                Ok(Value::Number(x.ln()))
            }
            "SQR" => {
                let x = self.single_number(name, args)?;
                if x < 0.0 {
                    return Err(BasicError::IllegalQuantity);
                }
                Ok(Value::Number(x.sqrt()))
            }
            "ASC" => {
                check_arity(name, args, 1, 1)?;
                let s = self.eval_string(&args[0])?;
                let first = s.chars().next().ok_or(BasicError::IllegalQuantity)?;
                Ok(Value::Number(u32::from(first) as f64))
            }
            "CHR$" => {
                let code = self.single_number(name, args)?.trunc();
                if !(0.0..=255.0).contains(&code) {
                    return Err(BasicError::IllegalQuantity);
                }
                Ok(Value::Str(char::from(code as u8).to_string()))
            }
            "LEN" => {
                check_arity(name, args, 1, 1)?;
                let s = self.eval_string(&args[0])?;
                Ok(Value::Number(s.chars().count() as f64))
            }
            "LEFT$" => {
                check_arity(name, args, 2, 2)?;
                let s = self.eval_string(&args[0])?;
                let count = self.eval_count(&args[1])?;
                Ok(Value::Str(s.chars().take(count).collect()))
            }
            "RIGHT$" => {
                check_arity(name, args, 2, 2)?;
                let s = self.eval_string(&args[0])?;
                let count = self.eval_count(&args[1])?;
                let skip = s.chars().count().saturating_sub(count);
                Ok(Value::Str(s.chars().skip(skip).collect()))
            }
            "MID$" => {
                check_arity(name, args, 2, 3)?;
                let s = self.eval_string(&args[0])?;
                let start = self.eval_number(&args[1])?.trunc();
                if start < 1.0 {
                    return Err(BasicError::IllegalQuantity);
                }
                let rest = s.chars().skip(start as usize - 1);
                let result = match args.get(2) {
                    Some(len) => {
                        let count = self.eval_count(len)?;
                        rest.take(count).collect()
                    }
                    None => rest.collect(),
                };
                Ok(Value::Str(result))
            }
            "PEEK" => {
                let address = self.single_number(name, args)?.trunc();
                let byte = self.memory.peek(address as i64)?;
                Ok(Value::Number(byte as f64))
            }
            "RND" => {
                let x = self.single_number(name, args)?;
                Ok(Value::Number(self.next_random(x)))
            }
            "STR$" => {
                let x = self.single_number(name, args)?;
                Ok(Value::Str(format_number(x)))
            }
            "VAL" => {
                check_arity(name, args, 1, 1)?;
                let s = self.eval_string(&args[0])?;
                Ok(Value::Number(parse_leading_number(&s)))
            }
            _ => Err(BasicError::UndefinedFunction(name.to_string())),
        }
    }

    fn single_number(&mut self, name: &str, args: &[Expression]) -> Result<f64> {
        check_arity(name, args, 1, 1)?;
        self.eval_number(&args[0])
    }

    fn numeric_function(
        &mut self,
        name: &str,
        args: &[Expression],
        f: impl Fn(f64) -> f64,
    ) -> Result<Value> {
        let x = self.single_number(name, args)?;
        finite(f(x))
    }

    /// Evaluate a character count for LEFT$, RIGHT$ and MID$
    fn eval_count(&mut self, expr: &Expression) -> Result<usize> {
        let count = self.eval_number(expr)?.trunc();
        if count < 0.0 {
            return Err(BasicError::IllegalQuantity);
        }
        Ok(count.min(usize::MAX as f64) as usize)
    }

    /// RND: negative reseeds, zero repeats the last value, positive draws the next one
    fn next_random(&mut self, x: f64) -> f64 {
        if x == 0.0 {
            return self.last_rnd;
        }
        if x < 0.0 {
            self.rng = StdRng::seed_from_u64(x.to_bits());
        }
        self.last_rnd = self.rng.gen::<f64>();
        self.last_rnd
    }
}

fn check_arity(name: &str, args: &[Expression], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(BasicError::syntax(format!(
            "{} takes {} argument(s), got {}",
            name,
            if min == max {
                min.to_string()
            } else {
                format!("{}-{}", min, max)
            },
            args.len()
        )));
    }
    Ok(())
}

/// VAL: parse the longest numeric prefix, 0 if there is none
fn parse_leading_number(text: &str) -> f64 {
    let text = text.trim();
    let numeric_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'E' | 'e')))
        .unwrap_or(text.len());
    let candidate = &text[..numeric_len];

    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Apply a binary operator
fn eval_binary(op: BinaryOperator, left: Value, right: Value) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match op {
            BinaryOperator::Add => finite(a + b),
            BinaryOperator::Subtract => finite(a - b),
            BinaryOperator::Multiply => finite(a * b),
            BinaryOperator::Divide => {
                if b == 0.0 {
                    Err(BasicError::DivisionByZero)
                } else {
                    finite(a / b)
                }
            }
            BinaryOperator::Power => finite(a.powf(b)),
            BinaryOperator::Equal => Ok(truth(a == b)),
            BinaryOperator::NotEqual => Ok(truth(a != b)),
            BinaryOperator::LessThan => Ok(truth(a < b)),
            BinaryOperator::LessThanOrEqual => Ok(truth(a <= b)),
            BinaryOperator::GreaterThan => Ok(truth(a > b)),
            BinaryOperator::GreaterThanOrEqual => Ok(truth(a >= b)),
            BinaryOperator::And => Ok(Value::Number(((a.trunc() as i64) & (b.trunc() as i64)) as f64)),
            BinaryOperator::Or => Ok(Value::Number(((a.trunc() as i64) | (b.trunc() as i64)) as f64)),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOperator::Add => Ok(Value::Str(a + &b)),
            BinaryOperator::Equal => Ok(truth(a == b)),
            BinaryOperator::NotEqual => Ok(truth(a != b)),
            BinaryOperator::LessThan => Ok(truth(a < b)),
            BinaryOperator::LessThanOrEqual => Ok(truth(a <= b)),
            BinaryOperator::GreaterThan => Ok(truth(a > b)),
            BinaryOperator::GreaterThanOrEqual => Ok(truth(a >= b)),
            _ => Err(BasicError::TypeMismatch),
        },
        _ => Err(BasicError::TypeMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;
    use crate::filesystem::MemoryStorage;
    use crate::parser::parse_expression;
    use crate::tokenizer::tokenize;

    fn executor() -> Executor {
        Executor::with_storage(
            InterpreterConfig::default().with_seed(99),
            Box::new(MemoryStorage::new()),
        )
    }

    fn eval(exec: &mut Executor, text: &str) -> Result<Value> {
        let tokens = tokenize(text)?;
        let expr = parse_expression(&tokens)?;
        exec.evaluate(&expr)
    }

    fn num(exec: &mut Executor, source: &str) -> f64 {
        eval(exec, source).unwrap().as_number().unwrap()
    }

    fn text(exec: &mut Executor, source: &str) -> String {
        match eval(exec, source).unwrap() {
            Value::Str(s) => s,
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_precedence() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "2 + 3 * 4"), 14.0);
        assert_eq!(num(&mut exec, "(2 + 3) * 4"), 20.0);
        assert_eq!(num(&mut exec, "10 - 4 - 3"), 3.0);
        assert_eq!(num(&mut exec, "2 ^ 3 ^ 2"), 64.0);
        assert_eq!(num(&mut exec, "-2 ^ 2"), -4.0);
        assert_eq!(num(&mut exec, "7 / 2"), 3.5);
    }

    #[test]
    fn test_comparisons_yield_minus_one() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "3 > 2"), -1.0);
        assert_eq!(num(&mut exec, "3 < 2"), 0.0);
        assert_eq!(num(&mut exec, "\"ABC\" < \"ABD\""), -1.0);
        assert_eq!(num(&mut exec, "1 = 1 AND 2 = 3"), 0.0);
        assert_eq!(num(&mut exec, "1 = 1 OR 2 = 3"), -1.0);
        assert_eq!(num(&mut exec, "NOT 0"), -1.0);
        assert_eq!(num(&mut exec, "NOT 1 = 1"), 0.0);
    }

    #[test]
    fn test_string_concatenation() {
        let mut exec = executor();
        assert_eq!(text(&mut exec, "\"AB\" + \"CD\""), "ABCD");
        assert_eq!(eval(&mut exec, "\"AB\" + 1"), Err(BasicError::TypeMismatch));
        assert_eq!(eval(&mut exec, "\"AB\" * \"C\""), Err(BasicError::TypeMismatch));
    }

    #[test]
    fn test_division_by_zero() {
        let mut exec = executor();
        assert_eq!(eval(&mut exec, "1 / 0"), Err(BasicError::DivisionByZero));
    }

    #[test]
    fn test_undefined_variables_read_default() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "Q + 1"), 1.0);
        assert_eq!(text(&mut exec, "Q$"), "");
    }

    #[test]
    fn test_numeric_functions() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "ABS(-3)"), 3.0);
        assert_eq!(num(&mut exec, "INT(-2.5)"), -3.0);
        assert_eq!(num(&mut exec, "SGN(-7)"), -1.0);
        assert_eq!(num(&mut exec, "SQR(16)"), 4.0);
        assert_eq!(num(&mut exec, "SIN(0)"), 0.0);
        assert_eq!(num(&mut exec, "COS(0)"), 1.0);
        assert!((num(&mut exec, "ATN(1) * 4") - std::f64::consts::PI).abs() < 1e-12);
        assert!((num(&mut exec, "LOG(EXP(2))") - 2.0).abs() < 1e-12);
        assert_eq!(eval(&mut exec, "SQR(-1)"), Err(BasicError::IllegalQuantity));
        assert_eq!(eval(&mut exec, "LOG(0)"), Err(BasicError::IllegalQuantity));
    }

    #[test]
    fn test_string_functions() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "LEN(\"HELLO\")"), 5.0);
        assert_eq!(text(&mut exec, "LEFT$(\"HELLO\", 2)"), "HE");
        assert_eq!(text(&mut exec, "RIGHT$(\"HELLO\", 3)"), "LLO");
        assert_eq!(text(&mut exec, "RIGHT$(\"HI\", 9)"), "HI");
        assert_eq!(text(&mut exec, "MID$(\"HELLO\", 2, 3)"), "ELL");
        assert_eq!(text(&mut exec, "MID$(\"HELLO\", 3)"), "LLO");
        assert_eq!(text(&mut exec, "MID$(\"HELLO\", 9)"), "");
        assert_eq!(num(&mut exec, "ASC(\"A\")"), 65.0);
        assert_eq!(text(&mut exec, "CHR$(66)"), "B");
        assert_eq!(text(&mut exec, "STR$(2.5)"), "2.5");
        assert_eq!(text(&mut exec, "STR$(10)"), "10");
        assert_eq!(num(&mut exec, "VAL(\" 12.5 \")"), 12.5);
        assert_eq!(num(&mut exec, "VAL(\"42ABC\")"), 42.0);
        assert_eq!(num(&mut exec, "VAL(\"ABC\")"), 0.0);
        assert_eq!(eval(&mut exec, "MID$(\"HELLO\", 0)"), Err(BasicError::IllegalQuantity));
        assert_eq!(eval(&mut exec, "ASC(\"\")"), Err(BasicError::IllegalQuantity));
        assert_eq!(eval(&mut exec, "LEN(5)"), Err(BasicError::TypeMismatch));
    }

    #[test]
    fn test_nested_calls_resolve_innermost_first() {
        let mut exec = executor();
        exec.enter_line("DIM A(3)");
        exec.enter_line("A(2) = 7");
        assert_eq!(num(&mut exec, "A(LEN(\"AB\")) * 2"), 14.0);
        assert_eq!(text(&mut exec, "LEFT$(STR$(A(2) * 11), 1)"), "7");
    }

    #[test]
    fn test_function_arity() {
        let mut exec = executor();
        assert!(matches!(eval(&mut exec, "ABS(1, 2)"), Err(BasicError::SyntaxError(_))));
        assert!(matches!(eval(&mut exec, "MID$(\"A\")"), Err(BasicError::SyntaxError(_))));
    }

    #[test]
    fn test_undeclared_array_and_function() {
        let mut exec = executor();
        assert_eq!(
            eval(&mut exec, "Z(1)"),
            Err(BasicError::BadSubscript("Z".to_string()))
        );
        assert_eq!(
            eval(&mut exec, "FNA(1)"),
            Err(BasicError::UndefinedFunction("FNA".to_string()))
        );
    }

    #[test]
    fn test_peek_range() {
        let mut exec = executor();
        assert_eq!(num(&mut exec, "PEEK(0)"), 0.0);
        assert_eq!(eval(&mut exec, "PEEK(70000)"), Err(BasicError::IllegalQuantity));
        assert_eq!(eval(&mut exec, "PEEK(-1)"), Err(BasicError::IllegalQuantity));
    }

    #[test]
    fn test_rnd_semantics() {
        let mut exec = executor();
        let first = num(&mut exec, "RND(1)");
        assert!((0.0..1.0).contains(&first));
        assert_eq!(num(&mut exec, "RND(0)"), first);

        let second = num(&mut exec, "RND(1)");
        assert!((0.0..1.0).contains(&second));

        // Reseeding with the same negative argument replays the sequence
        let a = num(&mut exec, "RND(-5)");
        let b = num(&mut exec, "RND(1)");
        let c = num(&mut exec, "RND(-5)");
        let d = num(&mut exec, "RND(1)");
        assert_eq!(a, c);
        assert_eq!(b, d);
    }

    #[test]
    fn test_seeded_executors_agree() {
        let mut one = executor();
        let mut two = executor();
        assert_eq!(num(&mut one, "RND(1)"), num(&mut two, "RND(1)"));
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("3.5"), 3.5);
        assert_eq!(parse_leading_number("-2e2x"), -200.0);
        assert_eq!(parse_leading_number("1E"), 1.0);
        assert_eq!(parse_leading_number("inf"), 0.0);
        assert_eq!(parse_leading_number(""), 0.0);
    }
}
