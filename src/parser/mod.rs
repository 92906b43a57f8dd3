//! Parser for BASIC statements and expressions
//!
//! Turns the text of one statement into a [`Statement`] tree. The leading
//! command keyword selects the statement form; unknown keywords fall back to an
//! implicit LET when the text contains `=`.

use crate::error::{BasicError, Result};
use crate::filesystem::parse_file_name;
use crate::tokenizer::{find_keyword, parse_line_number, split_keyword, tokenize, Keyword, Token};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Scalar variable reference
    Variable(String),
    /// Array element `NAME(i[,j...])`
    ArrayAccess {
        name: String,
        indices: Vec<Expression>,
    },
    /// Built-in function call
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    /// Binary operation
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

/// Assignable location: a scalar variable or an array element
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Variable(String),
    ArrayElement {
        name: String,
        indices: Vec<Expression>,
    },
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Variable(name) => name,
            Target::ArrayElement { name, .. } => name,
        }
    }

    /// String-typed locations carry a `$` suffix
    pub fn is_string(&self) -> bool {
        self.name().ends_with('$')
    }
}

/// Print item types for PRINT statements
#[derive(Debug, Clone, PartialEq)]
pub enum PrintItem {
    Expression(Expression),
    Semicolon, // ;
    Comma,     // ,
}

/// Literal values listed by DATA statements
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Number(f64),
    String(String),
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// PRINT item list
    Print { items: Vec<PrintItem> },
    /// LET, explicit or elided
    Let { target: Target, expression: Expression },
    /// INPUT with optional prompt
    Input { prompt: Option<String>, target: Target },
    Goto { line_number: u32 },
    Gosub { line_number: u32 },
    /// IF condition THEN statement (THEN <line> is stored as a GOTO)
    If {
        condition: Expression,
        then_part: Box<Statement>,
    },
    For {
        variable: String,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
    },
    /// NEXT with zero or more loop variables
    Next { variables: Vec<String> },
    Return,
    End,
    Cls,
    Rem { comment: String },
    Dim { arrays: Vec<(String, Vec<Expression>)> },
    Read { targets: Vec<Target> },
    /// DATA is pre-scanned at RUN; executing it does nothing
    Data { values: Vec<DataValue> },
    Restore,
    Poke { address: Expression, value: Expression },
    /// ON selector GOTO/GOSUB line list
    On {
        selector: Expression,
        gosub: bool,
        targets: Vec<u32>,
    },
    Save { name: String },
    Load { name: String },
    Files,
    Kill { name: String },
    Auto { start: Option<u32>, increment: Option<u32> },
    Help { topic: Option<String> },
    Run { line_number: Option<u32> },
    List { from: Option<u32>, to: Option<u32> },
    New,
}

impl Statement {
    /// Commands that only make sense typed at the prompt
    pub fn is_immediate_only(&self) -> bool {
        matches!(
            self,
            Statement::List { .. } | Statement::New | Statement::Run { .. }
        )
    }
}

/// Built-in functions available in expressions
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "ABS", "ASC", "ATN", "CHR$", "COS", "EXP", "INT", "LEFT$", "LEN", "LOG", "MID$", "PEEK",
    "RIGHT$", "RND", "SGN", "SIN", "SQR", "STR$", "TAN", "VAL",
];

pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

/// Parse the text of one statement
pub fn parse_statement(text: &str) -> Result<Statement> {
    let (keyword, rest) = split_keyword(text);

    match keyword.as_str() {
        "PRINT" => parse_print_statement(&tokenize(rest)?),
        "LET" => parse_assignment(&tokenize(rest)?),
        "INPUT" => parse_input_statement(&tokenize(rest)?),
        "GOTO" => Ok(Statement::Goto {
            line_number: parse_line_number(rest)?,
        }),
        "GOSUB" => Ok(Statement::Gosub {
            line_number: parse_line_number(rest)?,
        }),
        "IF" => parse_if_statement(rest),
        "FOR" => parse_for_statement(&tokenize(rest)?),
        "NEXT" => parse_next_statement(&tokenize(rest)?),
        "RETURN" => without_arguments(rest, Statement::Return),
        "END" => without_arguments(rest, Statement::End),
        "CLS" => without_arguments(rest, Statement::Cls),
        "DIM" => parse_dim_statement(&tokenize(rest)?),
        "READ" => parse_read_statement(&tokenize(rest)?),
        "DATA" => Ok(Statement::Data {
            values: parse_data_values(rest)?,
        }),
        "RESTORE" => without_arguments(rest, Statement::Restore),
        "POKE" => parse_poke_statement(&tokenize(rest)?),
        "ON" => parse_on_statement(&tokenize(rest)?),
        "SAVE" => Ok(Statement::Save {
            name: parse_file_name(rest)?,
        }),
        "LOAD" => Ok(Statement::Load {
            name: parse_file_name(rest)?,
        }),
        "FILES" => without_arguments(rest, Statement::Files),
        "KILL" => Ok(Statement::Kill {
            name: parse_file_name(rest)?,
        }),
        "AUTO" => parse_auto_statement(rest),
        "HELP" => {
            let topic = rest.trim().to_ascii_uppercase();
            Ok(Statement::Help {
                topic: if topic.is_empty() { None } else { Some(topic) },
            })
        }
        "RUN" => {
            let line_number = if rest.trim().is_empty() {
                None
            } else {
                Some(parse_line_number(rest)?)
            };
            Ok(Statement::Run { line_number })
        }
        "LIST" => parse_list_statement(rest),
        "NEW" => without_arguments(rest, Statement::New),
        "REM" => Ok(Statement::Rem {
            comment: rest.trim().to_string(),
        }),
        // LET may be elided
        _ if text.contains('=') => parse_assignment(&tokenize(text)?),
        // REMARK and friends are comments unless they assign
        k if k.starts_with("REM") => Ok(Statement::Rem {
            comment: rest.trim().to_string(),
        }),
        _ => Err(BasicError::syntax(format!("unknown statement '{}'", keyword))),
    }
}

fn without_arguments(rest: &str, statement: Statement) -> Result<Statement> {
    if rest.trim().is_empty() {
        Ok(statement)
    } else {
        Err(BasicError::syntax(format!("unexpected '{}'", rest.trim())))
    }
}

/// Parse PRINT statement
fn parse_print_statement(tokens: &[Token]) -> Result<Statement> {
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        match &tokens[pos] {
            Token::Separator(';') => {
                items.push(PrintItem::Semicolon);
                pos += 1;
            }
            Token::Separator(',') => {
                items.push(PrintItem::Comma);
                pos += 1;
            }
            _ => {
                let expr = parse_expr_precedence(tokens, &mut pos, 0)?;
                items.push(PrintItem::Expression(expr));
                // Adjacent expressions need a separator between them
                if pos < tokens.len() && !matches!(tokens[pos], Token::Separator(';') | Token::Separator(',')) {
                    return Err(BasicError::syntax(format!(
                        "unexpected token in PRINT: {:?}",
                        tokens[pos]
                    )));
                }
            }
        }
    }

    Ok(Statement::Print { items })
}

/// Parse assignment statement (A = 42 or LET A(1) = 42)
fn parse_assignment(tokens: &[Token]) -> Result<Statement> {
    let mut pos = 0;
    let target = parse_target(tokens, &mut pos)?;

    if pos >= tokens.len() || tokens[pos] != Token::Operator("=") {
        return Err(BasicError::syntax("expected '=' in assignment"));
    }
    pos += 1;

    let expression = parse_expression(&tokens[pos..])?;
    Ok(Statement::Let { target, expression })
}

/// Parse a variable or array element reference
fn parse_target(tokens: &[Token], pos: &mut usize) -> Result<Target> {
    let name = match tokens.get(*pos) {
        Some(Token::Identifier(name)) => name.clone(),
        other => {
            return Err(BasicError::syntax(format!(
                "expected variable name, found {:?}",
                other
            )))
        }
    };
    *pos += 1;

    if *pos < tokens.len() && tokens[*pos] == Token::Separator('(') {
        *pos += 1;
        let indices = parse_argument_list(tokens, pos)?;
        Ok(Target::ArrayElement { name, indices })
    } else {
        Ok(Target::Variable(name))
    }
}

/// Parse a comma-separated argument list; the opening '(' is already consumed
fn parse_argument_list(tokens: &[Token], pos: &mut usize) -> Result<Vec<Expression>> {
    let mut args = Vec::new();

    if *pos < tokens.len() && tokens[*pos] == Token::Separator(')') {
        *pos += 1;
        return Ok(args);
    }

    loop {
        args.push(parse_expr_precedence(tokens, pos, 0)?);

        match tokens.get(*pos) {
            Some(Token::Separator(',')) => *pos += 1,
            Some(Token::Separator(')')) => {
                *pos += 1;
                return Ok(args);
            }
            _ => return Err(BasicError::syntax("expected ')'")),
        }
    }
}

/// Parse INPUT statement: INPUT ["prompt";] target
fn parse_input_statement(tokens: &[Token]) -> Result<Statement> {
    let mut pos = 0;
    let mut prompt = None;

    if let Some(Token::String(text)) = tokens.first() {
        if !matches!(tokens.get(1), Some(Token::Separator(';')) | Some(Token::Separator(','))) {
            return Err(BasicError::syntax("expected ';' after INPUT prompt"));
        }
        prompt = Some(text.clone());
        pos = 2;
    }

    let target = parse_target(tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(BasicError::syntax("INPUT accepts a single variable"));
    }

    Ok(Statement::Input { prompt, target })
}

/// Parse IF statement: IF condition THEN line|statement, or IF condition GOTO line
fn parse_if_statement(rest: &str) -> Result<Statement> {
    let (condition_text, branch_text) = if let Some(then_pos) = find_keyword(rest, "THEN") {
        (&rest[..then_pos], &rest[then_pos + "THEN".len()..])
    } else if let Some(goto_pos) = find_keyword(rest, "GOTO") {
        (&rest[..goto_pos], &rest[goto_pos..])
    } else {
        return Err(BasicError::syntax("expected THEN after IF condition"));
    };

    let condition = parse_expression(&tokenize(condition_text)?)?;

    let branch = branch_text.trim();
    if branch.is_empty() {
        return Err(BasicError::syntax("expected statement after THEN"));
    }

    let then_part = if branch.starts_with(|c: char| c.is_ascii_digit()) {
        Statement::Goto {
            line_number: parse_line_number(branch)?,
        }
    } else {
        parse_statement(branch)?
    };

    Ok(Statement::If {
        condition,
        then_part: Box::new(then_part),
    })
}

/// Parse FOR statement: FOR var = start TO end [STEP step]
fn parse_for_statement(tokens: &[Token]) -> Result<Statement> {
    let variable = match tokens.first() {
        Some(Token::Identifier(name)) if !name.ends_with('$') => name.clone(),
        _ => return Err(BasicError::syntax("expected numeric variable after FOR")),
    };

    if tokens.get(1) != Some(&Token::Operator("=")) {
        return Err(BasicError::syntax("expected '=' in FOR statement"));
    }

    let mut pos = 2;
    let start = parse_expr_precedence(tokens, &mut pos, 0)?;

    if tokens.get(pos) != Some(&Token::Keyword(Keyword::To)) {
        return Err(BasicError::syntax("expected TO in FOR statement"));
    }
    pos += 1;
    let end = parse_expr_precedence(tokens, &mut pos, 0)?;

    let step = if tokens.get(pos) == Some(&Token::Keyword(Keyword::Step)) {
        pos += 1;
        Some(parse_expr_precedence(tokens, &mut pos, 0)?)
    } else {
        None
    };

    if pos != tokens.len() {
        return Err(BasicError::syntax("unexpected tokens after FOR"));
    }

    Ok(Statement::For {
        variable,
        start,
        end,
        step,
    })
}

/// Parse NEXT statement
fn parse_next_statement(tokens: &[Token]) -> Result<Statement> {
    let mut variables = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        match &tokens[pos] {
            Token::Identifier(name) => variables.push(name.clone()),
            other => {
                return Err(BasicError::syntax(format!(
                    "expected loop variable in NEXT, found {:?}",
                    other
                )))
            }
        }
        pos += 1;

        match tokens.get(pos) {
            None => break,
            Some(Token::Separator(',')) => pos += 1,
            Some(_) => return Err(BasicError::syntax("expected ',' in NEXT")),
        }
    }

    Ok(Statement::Next { variables })
}

/// Parse DIM statement
fn parse_dim_statement(tokens: &[Token]) -> Result<Statement> {
    let mut arrays = Vec::new();
    let mut pos = 0;

    loop {
        match parse_target(tokens, &mut pos)? {
            Target::ArrayElement { name, indices } if !indices.is_empty() => {
                arrays.push((name, indices));
            }
            _ => return Err(BasicError::syntax("expected array declaration in DIM")),
        }

        match tokens.get(pos) {
            None => break,
            Some(Token::Separator(',')) => pos += 1,
            Some(_) => return Err(BasicError::syntax("expected ',' between DIM arrays")),
        }
    }

    Ok(Statement::Dim { arrays })
}

/// Parse READ statement
fn parse_read_statement(tokens: &[Token]) -> Result<Statement> {
    let mut targets = Vec::new();
    let mut pos = 0;

    loop {
        targets.push(parse_target(tokens, &mut pos)?);

        match tokens.get(pos) {
            None => break,
            Some(Token::Separator(',')) => pos += 1,
            Some(_) => return Err(BasicError::syntax("expected ',' in READ")),
        }
    }

    Ok(Statement::Read { targets })
}

/// Parse the literal list of a DATA statement.
///
/// Items are separated by commas outside quotes. Quoted items are strings,
/// items that parse as numbers are numbers and anything else is kept as an
/// unquoted string.
pub fn parse_data_values(text: &str) -> Result<Vec<DataValue>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    for ch in text.chars() {
        match ch {
            '"' => {
                in_string = !in_string;
                current.push(ch);
            }
            ',' if !in_string => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_string {
        return Err(BasicError::syntax("unterminated string in DATA"));
    }
    items.push(current);

    items
        .iter()
        .map(|item| {
            let item = item.trim();
            if let Some(quoted) = item.strip_prefix('"') {
                match quoted.strip_suffix('"') {
                    Some(inner) if !inner.contains('"') => Ok(DataValue::String(inner.to_string())),
                    _ => Err(BasicError::syntax(format!("malformed DATA item {}", item))),
                }
            } else if let Ok(number) = item.parse::<f64>() {
                Ok(DataValue::Number(number))
            } else {
                Ok(DataValue::String(item.to_string()))
            }
        })
        .collect()
}

/// Parse POKE statement: POKE address, value
fn parse_poke_statement(tokens: &[Token]) -> Result<Statement> {
    let mut pos = 0;
    let address = parse_expr_precedence(tokens, &mut pos, 0)?;

    if tokens.get(pos) != Some(&Token::Separator(',')) {
        return Err(BasicError::syntax("expected ',' in POKE"));
    }
    pos += 1;

    let value = parse_expression(&tokens[pos..])?;
    Ok(Statement::Poke { address, value })
}

/// Parse ON statement: ON expr GOTO|GOSUB line[,line...]
fn parse_on_statement(tokens: &[Token]) -> Result<Statement> {
    let mut pos = 0;
    let selector = parse_expr_precedence(tokens, &mut pos, 0)?;

    let gosub = match tokens.get(pos) {
        Some(Token::Keyword(Keyword::Goto)) => false,
        Some(Token::Keyword(Keyword::Gosub)) => true,
        _ => return Err(BasicError::syntax("expected GOTO or GOSUB in ON")),
    };
    pos += 1;

    let mut targets = Vec::new();
    loop {
        match tokens.get(pos) {
            Some(Token::Number(n)) if *n >= 1.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => {
                targets.push(*n as u32)
            }
            _ => return Err(BasicError::syntax("expected line number in ON list")),
        }
        pos += 1;

        match tokens.get(pos) {
            None => break,
            Some(Token::Separator(',')) => pos += 1,
            Some(_) => return Err(BasicError::syntax("expected ',' in ON list")),
        }
    }

    Ok(Statement::On {
        selector,
        gosub,
        targets,
    })
}

/// Parse AUTO statement: AUTO [start[,increment]]
fn parse_auto_statement(rest: &str) -> Result<Statement> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Statement::Auto {
            start: None,
            increment: None,
        });
    }

    let mut parts = rest.splitn(2, ',');
    let start = parts.next().map(parse_line_number).transpose()?;
    let increment = parts.next().map(parse_line_number).transpose()?;
    Ok(Statement::Auto { start, increment })
}

/// Parse LIST statement: LIST [from][-[to]]
fn parse_list_statement(rest: &str) -> Result<Statement> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Statement::List { from: None, to: None });
    }

    let bound = |text: &str| -> Result<Option<u32>> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            parse_line_number(text).map(Some)
        }
    };

    match rest.split_once('-') {
        Some((from, to)) => Ok(Statement::List {
            from: bound(from)?,
            to: bound(to)?,
        }),
        None => {
            let line = parse_line_number(rest)?;
            Ok(Statement::List {
                from: Some(line),
                to: Some(line),
            })
        }
    }
}

/// Parse a sequence of tokens into an expression, consuming all of them
pub fn parse_expression(tokens: &[Token]) -> Result<Expression> {
    if tokens.is_empty() {
        return Err(BasicError::syntax("expected expression"));
    }

    let mut pos = 0;
    let expr = parse_expr_precedence(tokens, &mut pos, 0)?;
    if pos != tokens.len() {
        return Err(BasicError::syntax(format!(
            "unexpected token in expression: {:?}",
            tokens[pos]
        )));
    }
    Ok(expr)
}

// Binding strength of unary operators
const NOT_PRECEDENCE: u8 = 30;
const NEGATE_PRECEDENCE: u8 = 60;

/// Get binary operator precedence (higher number = higher precedence)
fn get_precedence(token: &Token) -> Option<(u8, BinaryOperator)> {
    match token {
        Token::Keyword(Keyword::Or) => Some((10, BinaryOperator::Or)),
        Token::Keyword(Keyword::And) => Some((20, BinaryOperator::And)),
        Token::Operator(op) => match *op {
            "=" => Some((30, BinaryOperator::Equal)),
            "<>" => Some((30, BinaryOperator::NotEqual)),
            "<" => Some((30, BinaryOperator::LessThan)),
            "<=" => Some((30, BinaryOperator::LessThanOrEqual)),
            ">" => Some((30, BinaryOperator::GreaterThan)),
            ">=" => Some((30, BinaryOperator::GreaterThanOrEqual)),
            "+" => Some((40, BinaryOperator::Add)),
            "-" => Some((40, BinaryOperator::Subtract)),
            "*" => Some((50, BinaryOperator::Multiply)),
            "/" => Some((50, BinaryOperator::Divide)),
            "^" => Some((60, BinaryOperator::Power)),
            _ => None,
        },
        _ => None,
    }
}

/// Parse expression with precedence climbing; same-precedence operators group left
fn parse_expr_precedence(tokens: &[Token], pos: &mut usize, min_prec: u8) -> Result<Expression> {
    let mut left = parse_primary(tokens, pos)?;

    while *pos < tokens.len() {
        let (prec, op) = match get_precedence(&tokens[*pos]) {
            Some((p, op)) if p >= min_prec => (p, op),
            _ => break,
        };

        *pos += 1; // consume operator

        let right = parse_expr_precedence(tokens, pos, prec + 1)?;

        left = Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        };
    }

    Ok(left)
}

/// Parse a primary expression (literal, variable, call, subscript or parenthesized expression)
fn parse_primary(tokens: &[Token], pos: &mut usize) -> Result<Expression> {
    let token = tokens
        .get(*pos)
        .ok_or_else(|| BasicError::syntax("unexpected end of expression"))?;

    match token {
        Token::Number(val) => {
            *pos += 1;
            Ok(Expression::Number(*val))
        }
        Token::String(s) => {
            *pos += 1;
            Ok(Expression::String(s.clone()))
        }

        Token::Identifier(name) => {
            *pos += 1;
            if *pos < tokens.len() && tokens[*pos] == Token::Separator('(') {
                *pos += 1;
                let args = parse_argument_list(tokens, pos)?;
                if is_builtin_function(name) {
                    Ok(Expression::FunctionCall {
                        name: name.clone(),
                        args,
                    })
                } else {
                    Ok(Expression::ArrayAccess {
                        name: name.clone(),
                        indices: args,
                    })
                }
            } else {
                Ok(Expression::Variable(name.clone()))
            }
        }

        Token::Operator("-") => {
            *pos += 1;
            let operand = parse_expr_precedence(tokens, pos, NEGATE_PRECEDENCE)?;
            Ok(Expression::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(operand),
            })
        }
        Token::Operator("+") => {
            *pos += 1;
            let operand = parse_expr_precedence(tokens, pos, NEGATE_PRECEDENCE)?;
            Ok(Expression::UnaryOp {
                op: UnaryOperator::Plus,
                operand: Box::new(operand),
            })
        }
        Token::Keyword(Keyword::Not) => {
            *pos += 1;
            let operand = parse_expr_precedence(tokens, pos, NOT_PRECEDENCE)?;
            Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            })
        }

        Token::Separator('(') => {
            *pos += 1;
            let expr = parse_expr_precedence(tokens, pos, 0)?;

            if tokens.get(*pos) != Some(&Token::Separator(')')) {
                return Err(BasicError::syntax("expected ')'"));
            }
            *pos += 1;
            Ok(expr)
        }

        _ => Err(BasicError::syntax(format!(
            "unexpected token in expression: {:?}",
            token
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expression> {
        Box::new(Expression::Number(n))
    }

    #[test]
    fn test_statement_classification() {
        assert!(Statement::New.is_immediate_only());
        assert!(Statement::Run { line_number: None }.is_immediate_only());
        assert!(!Statement::Auto {
            start: None,
            increment: None
        }
        .is_immediate_only());
        assert!(!Statement::Return.is_immediate_only());
    }

    #[test]
    fn test_parse_simple_addition() {
        let tokens = tokenize("2 + 3").unwrap();
        assert_eq!(
            parse_expression(&tokens).unwrap(),
            Expression::BinaryOp {
                left: num(2.0),
                op: BinaryOperator::Add,
                right: num(3.0),
            }
        );
    }

    #[test]
    fn test_parse_operator_precedence() {
        // 2 + 3 * 4 groups as 2 + (3 * 4)
        let tokens = tokenize("2 + 3 * 4").unwrap();
        assert_eq!(
            parse_expression(&tokens).unwrap(),
            Expression::BinaryOp {
                left: num(2.0),
                op: BinaryOperator::Add,
                right: Box::new(Expression::BinaryOp {
                    left: num(3.0),
                    op: BinaryOperator::Multiply,
                    right: num(4.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_left_associativity() {
        // 8 - 3 - 2 groups as (8 - 3) - 2
        let tokens = tokenize("8 - 3 - 2").unwrap();
        assert_eq!(
            parse_expression(&tokens).unwrap(),
            Expression::BinaryOp {
                left: Box::new(Expression::BinaryOp {
                    left: num(8.0),
                    op: BinaryOperator::Subtract,
                    right: num(3.0),
                }),
                op: BinaryOperator::Subtract,
                right: num(2.0),
            }
        );
    }

    #[test]
    fn test_parse_negation_binds_looser_than_power() {
        let tokens = tokenize("-2^2").unwrap();
        assert_eq!(
            parse_expression(&tokens).unwrap(),
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(Expression::BinaryOp {
                    left: num(2.0),
                    op: BinaryOperator::Power,
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_function_call_and_array_access() {
        let tokens = tokenize("SIN(X) + A(1, 2)").unwrap();
        assert_eq!(
            parse_expression(&tokens).unwrap(),
            Expression::BinaryOp {
                left: Box::new(Expression::FunctionCall {
                    name: "SIN".to_string(),
                    args: vec![Expression::Variable("X".to_string())],
                }),
                op: BinaryOperator::Add,
                right: Box::new(Expression::ArrayAccess {
                    name: "A".to_string(),
                    indices: vec![Expression::Number(1.0), Expression::Number(2.0)],
                }),
            }
        );
    }

    #[test]
    fn test_parse_nested_calls() {
        let tokens = tokenize(r#"LEN(MID$("HELLO", 2))"#).unwrap();
        let expr = parse_expression(&tokens).unwrap();
        assert_eq!(
            expr,
            Expression::FunctionCall {
                name: "LEN".to_string(),
                args: vec![Expression::FunctionCall {
                    name: "MID$".to_string(),
                    args: vec![
                        Expression::String("HELLO".to_string()),
                        Expression::Number(2.0)
                    ],
                }],
            }
        );
    }

    #[test]
    fn test_parse_unbalanced_parentheses() {
        assert!(parse_expression(&tokenize("(1 + 2").unwrap()).is_err());
        assert!(parse_expression(&tokenize("1 + 2)").unwrap()).is_err());
    }

    #[test]
    fn test_parse_print_separators() {
        let stmt = parse_statement(r#"PRINT "A", X; "B";"#).unwrap();
        assert_eq!(
            stmt,
            Statement::Print {
                items: vec![
                    PrintItem::Expression(Expression::String("A".to_string())),
                    PrintItem::Comma,
                    PrintItem::Expression(Expression::Variable("X".to_string())),
                    PrintItem::Semicolon,
                    PrintItem::Expression(Expression::String("B".to_string())),
                    PrintItem::Semicolon,
                ],
            }
        );
    }

    #[test]
    fn test_parse_question_mark_print() {
        assert_eq!(
            parse_statement("? 42").unwrap(),
            Statement::Print {
                items: vec![PrintItem::Expression(Expression::Number(42.0))],
            }
        );
    }

    #[test]
    fn test_parse_let_and_implicit_let() {
        let explicit = parse_statement("LET X = 5").unwrap();
        let implicit = parse_statement("x=5").unwrap();
        assert_eq!(explicit, implicit);
        assert_eq!(
            implicit,
            Statement::Let {
                target: Target::Variable("X".to_string()),
                expression: Expression::Number(5.0),
            }
        );
    }

    #[test]
    fn test_parse_array_assignment() {
        let stmt = parse_statement("A(2) = A(1) + 1").unwrap();
        match stmt {
            Statement::Let {
                target: Target::ArrayElement { name, indices },
                ..
            } => {
                assert_eq!(name, "A");
                assert_eq!(indices, vec![Expression::Number(2.0)]);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_unknown_keyword_without_equals_is_syntax_error() {
        assert!(matches!(
            parse_statement("FROB 10"),
            Err(BasicError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_parse_for_loop_with_step() {
        let stmt = parse_statement("FOR I = 10 TO 1 STEP -1").unwrap();
        assert_eq!(
            stmt,
            Statement::For {
                variable: "I".to_string(),
                start: Expression::Number(10.0),
                end: Expression::Number(1.0),
                step: Some(Expression::UnaryOp {
                    op: UnaryOperator::Minus,
                    operand: num(1.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_bad_for_forms() {
        assert!(parse_statement("FOR I 1 TO 5").is_err());
        assert!(parse_statement("FOR I = 1").is_err());
        assert!(parse_statement("FOR A$ = 1 TO 2").is_err());
    }

    #[test]
    fn test_parse_next_variants() {
        assert_eq!(
            parse_statement("NEXT").unwrap(),
            Statement::Next { variables: vec![] }
        );
        assert_eq!(
            parse_statement("NEXT J, I").unwrap(),
            Statement::Next {
                variables: vec!["J".to_string(), "I".to_string()]
            }
        );
    }

    #[test]
    fn test_parse_goto_and_gosub() {
        assert_eq!(
            parse_statement("GOTO 100").unwrap(),
            Statement::Goto { line_number: 100 }
        );
        assert_eq!(
            parse_statement("GOSUB 1000").unwrap(),
            Statement::Gosub { line_number: 1000 }
        );
        assert!(parse_statement("GOTO X").is_err());
    }

    #[test]
    fn test_parse_if_then_forms() {
        let stmt = parse_statement("IF X > 10 THEN 200").unwrap();
        assert_eq!(
            stmt,
            Statement::If {
                condition: Expression::BinaryOp {
                    left: Box::new(Expression::Variable("X".to_string())),
                    op: BinaryOperator::GreaterThan,
                    right: num(10.0),
                },
                then_part: Box::new(Statement::Goto { line_number: 200 }),
            }
        );

        let stmt = parse_statement(r#"IF A$ = "Y" THEN PRINT "YES""#).unwrap();
        assert!(matches!(
            stmt,
            Statement::If { then_part, .. } if matches!(*then_part, Statement::Print { .. })
        ));

        let stmt = parse_statement("IF X GOTO 50").unwrap();
        assert!(matches!(
            stmt,
            Statement::If { then_part, .. } if *then_part == Statement::Goto { line_number: 50 }
        ));

        assert!(parse_statement("IF X > 1 PRINT X").is_err());
    }

    #[test]
    fn test_parse_input_with_prompt() {
        assert_eq!(
            parse_statement(r#"INPUT "NAME"; N$"#).unwrap(),
            Statement::Input {
                prompt: Some("NAME".to_string()),
                target: Target::Variable("N$".to_string()),
            }
        );
        assert!(parse_statement("INPUT A, B").is_err());
    }

    #[test]
    fn test_parse_dim() {
        let stmt = parse_statement("DIM A(10), B$(5, 5)").unwrap();
        assert_eq!(
            stmt,
            Statement::Dim {
                arrays: vec![
                    ("A".to_string(), vec![Expression::Number(10.0)]),
                    (
                        "B$".to_string(),
                        vec![Expression::Number(5.0), Expression::Number(5.0)]
                    ),
                ],
            }
        );
        assert!(parse_statement("DIM A").is_err());
    }

    #[test]
    fn test_parse_data_values() {
        let values = parse_data_values(r#" 1, -2.5, "A, B", HELLO "#).unwrap();
        assert_eq!(
            values,
            vec![
                DataValue::Number(1.0),
                DataValue::Number(-2.5),
                DataValue::String("A, B".to_string()),
                DataValue::String("HELLO".to_string()),
            ]
        );
        assert!(parse_data_values(r#""open"#).is_err());
    }

    #[test]
    fn test_parse_poke_and_on() {
        assert_eq!(
            parse_statement("POKE 1024, 65").unwrap(),
            Statement::Poke {
                address: Expression::Number(1024.0),
                value: Expression::Number(65.0),
            }
        );
        assert!(parse_statement("POKE 1024").is_err());

        assert_eq!(
            parse_statement("ON X GOSUB 100, 200").unwrap(),
            Statement::On {
                selector: Expression::Variable("X".to_string()),
                gosub: true,
                targets: vec![100, 200],
            }
        );
        assert!(parse_statement("ON X PRINT 100").is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_statement("AUTO").unwrap(),
            Statement::Auto {
                start: None,
                increment: None
            }
        );
        assert_eq!(
            parse_statement("AUTO 100, 5").unwrap(),
            Statement::Auto {
                start: Some(100),
                increment: Some(5)
            }
        );
        assert!(parse_statement("AUTO X").is_err());
        assert_eq!(
            parse_statement("LIST 10-50").unwrap(),
            Statement::List {
                from: Some(10),
                to: Some(50)
            }
        );
        assert_eq!(
            parse_statement("LIST -50").unwrap(),
            Statement::List {
                from: None,
                to: Some(50)
            }
        );
        assert_eq!(
            parse_statement("RUN").unwrap(),
            Statement::Run { line_number: None }
        );
        assert_eq!(
            parse_statement("help goto").unwrap(),
            Statement::Help {
                topic: Some("GOTO".to_string())
            }
        );
        assert_eq!(
            parse_statement(r#"SAVE "Demo""#).unwrap(),
            Statement::Save {
                name: "demo".to_string()
            }
        );
        assert!(matches!(
            parse_statement("LOAD demo"),
            Err(BasicError::BadFileName)
        ));
    }

    #[test]
    fn test_parse_rem_keeps_comment() {
        assert_eq!(
            parse_statement("REM hello = world").unwrap(),
            Statement::Rem {
                comment: "hello = world".to_string()
            }
        );
        assert_eq!(
            parse_statement("REMARK nothing to see").unwrap(),
            Statement::Rem {
                comment: "nothing to see".to_string()
            }
        );
    }

    #[test]
    fn test_rem_prefixed_variable_is_assigned() {
        assert_eq!(
            parse_statement("REMAINDER = 5").unwrap(),
            Statement::Let {
                target: Target::Variable("REMAINDER".to_string()),
                expression: Expression::Number(5.0),
            }
        );
    }
}
