//! Tree-walking interpreter for validated constraints.
//!
//! The interpreter only understands the node tags the validator allows; any
//! other tag is reported as a runtime error rather than evaluated.

use std::cmp::Ordering;

use crate::ast::{BinOp, BoolOp, CmpOp, Comprehension, Expr, ExprKind, Literal, UnaryOp};
use crate::error::ExprError;
use crate::validate::VERSION_NAME;
use crate::value::{Value, VersionTuple, MAX_SEQUENCE_LEN};

/// Upper bound on evaluated nodes per call.
pub const MAX_STEPS: u64 = 1_000_000;

/// Upper bound on the bytes of strings and sequences produced per call.
pub const MAX_ALLOCATED: usize = 128 * 1024 * 1024;

/// Evaluates one expression against one version.
pub struct Interpreter {
    ver: VersionTuple,
    /// Comprehension bindings, innermost last.
    scopes: Vec<(String, Value)>,
    steps: u64,
    /// Running total of [`Value::weight`] for every sequence produced.
    allocated: usize,
}

impl Interpreter {
    pub fn new(ver: VersionTuple) -> Self {
        Self {
            ver,
            scopes: Vec::new(),
            steps: 0,
            allocated: 0,
        }
    }

    /// Evaluate `expr`.
    ///
    /// # Errors
    /// Returns `ExprError::Runtime` for unknown names, type errors, bad
    /// indices, arithmetic faults and exhausted evaluation limits.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, ExprError> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return Err(ExprError::runtime("evaluation step limit exceeded"));
        }

        let value = self.eval_node(expr)?;
        if matches!(value, Value::Str(_) | Value::Tuple(_) | Value::List(_)) {
            self.charge(value.weight())?;
        }
        Ok(value)
    }

    fn charge(&mut self, weight: usize) -> Result<(), ExprError> {
        self.allocated = self.allocated.saturating_add(weight);
        if self.allocated > MAX_ALLOCATED {
            return Err(memory_limit());
        }
        Ok(())
    }

    /// Refuse `seq * count` up front when the result could not be paid for.
    fn check_repeat(&self, left: &Value, right: &Value) -> Result<(), ExprError> {
        let (seq, count) = match (left.as_int(), right.as_int()) {
            (None, Some(count)) => (left, count),
            (Some(count), None) => (right, count),
            _ => return Ok(()),
        };
        let count = usize::try_from(count).unwrap_or(0);
        let projected = seq.weight().saturating_mul(count);
        if self.allocated.saturating_add(projected) > MAX_ALLOCATED {
            return Err(memory_limit());
        }
        Ok(())
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, ExprError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            ExprKind::Name(name) => self.lookup(name),
            ExprKind::Tuple(elts) => Ok(Value::Tuple(self.eval_all(elts)?)),
            ExprKind::List(elts) => Ok(Value::List(self.eval_all(elts)?)),
            ExprKind::Attribute { value, attr } => {
                let value = self.eval(value)?;
                attribute(&value, attr)
            }
            ExprKind::Subscript { value, index } => {
                let value = self.eval(value)?;
                if let ExprKind::Slice { lower, upper, step } = &index.kind {
                    let lower = self.eval_slice_part(lower.as_deref())?;
                    let upper = self.eval_slice_part(upper.as_deref())?;
                    let step = self.eval_slice_part(step.as_deref())?;
                    slice(&value, lower, upper, step)
                } else {
                    let index = self.eval(index)?;
                    subscript(&value, &index)
                }
            }
            ExprKind::BinOp { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                if *op == BinOp::Mul {
                    self.check_repeat(&left, &right)?;
                }
                binary(*op, &left, &right)
            }
            ExprKind::UnaryOp { op, operand } => {
                let operand = self.eval(operand)?;
                unary(*op, &operand)
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut left = self.eval(left)?;
                for (op, right) in ops.iter().zip(comparators) {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::BoolOp { op, values } => {
                let mut last = Value::None;
                for value in values {
                    last = self.eval(value)?;
                    let done = match op {
                        BoolOp::And => !last.is_truthy(),
                        BoolOp::Or => last.is_truthy(),
                    };
                    if done {
                        break;
                    }
                }
                Ok(last)
            }
            ExprKind::ListComp { elt, generators } => {
                let mut out = Vec::new();
                let depth = self.scopes.len();
                let result = self.eval_comprehension(elt, generators, &mut out);
                self.scopes.truncate(depth);
                result.map(|()| Value::List(out))
            }
            ExprKind::Slice { .. } => Err(ExprError::runtime("slice outside of a subscript")),
            other => Err(ExprError::runtime(format!(
                "cannot evaluate {:?} node",
                other.node_kind()
            ))),
        }
    }

    fn eval_all(&mut self, elts: &[Expr]) -> Result<Vec<Value>, ExprError> {
        elts.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_slice_part(&mut self, part: Option<&Expr>) -> Result<Option<i64>, ExprError> {
        let Some(part) = part else {
            return Ok(None);
        };
        match self.eval(part)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                ExprError::runtime(
                    "slice indices must be integers or None or have an __index__ method",
                )
            }),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, ExprError> {
        if let Some((_, value)) = self.scopes.iter().rev().find(|(bound, _)| bound == name) {
            return Ok(value.clone());
        }
        if name == VERSION_NAME {
            return Ok(Value::Version(self.ver));
        }
        Err(ExprError::runtime(format!("name '{name}' is not defined")))
    }

    fn eval_comprehension(
        &mut self,
        elt: &Expr,
        generators: &[Comprehension],
        out: &mut Vec<Value>,
    ) -> Result<(), ExprError> {
        let Some((first, rest)) = generators.split_first() else {
            if out.len() >= MAX_SEQUENCE_LEN {
                return Err(ExprError::runtime("sequence too long"));
            }
            let value = self.eval(elt)?;
            out.push(value);
            return Ok(());
        };

        let items = self.eval(&first.iter)?.iter_items()?;
        self.charge(items.iter().map(Value::weight).fold(0, usize::saturating_add))?;
        'items: for item in items {
            let depth = self.scopes.len();
            self.bind(&first.target, item)?;
            for cond in &first.ifs {
                if !self.eval(cond)?.is_truthy() {
                    self.scopes.truncate(depth);
                    continue 'items;
                }
            }
            self.eval_comprehension(elt, rest, out)?;
            self.scopes.truncate(depth);
        }
        Ok(())
    }

    fn bind(&mut self, target: &Expr, value: Value) -> Result<(), ExprError> {
        match &target.kind {
            ExprKind::Name(name) => {
                self.scopes.push((name.clone(), value));
                Ok(())
            }
            ExprKind::Tuple(targets) => {
                let items = value.iter_items()?;
                match items.len().cmp(&targets.len()) {
                    Ordering::Less => Err(ExprError::runtime(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    ))),
                    Ordering::Greater => Err(ExprError::runtime(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    ))),
                    Ordering::Equal => targets
                        .iter()
                        .zip(items)
                        .try_for_each(|(target, item)| self.bind(target, item)),
                }
            }
            _ => Err(ExprError::runtime("cannot assign to expression")),
        }
    }
}

fn attribute(value: &Value, attr: &str) -> Result<Value, ExprError> {
    match value {
        Value::Version(v) => v
            .attribute(attr)
            .map(|n| Value::Int(i64::from(n)))
            .ok_or_else(|| no_attribute(value, attr)),
        _ => Err(no_attribute(value, attr)),
    }
}

fn memory_limit() -> ExprError {
    ExprError::runtime("evaluation memory limit exceeded")
}

fn no_attribute(value: &Value, attr: &str) -> ExprError {
    ExprError::runtime(format!(
        "'{}' object has no attribute '{attr}'",
        value.type_name()
    ))
}

/// Normalize a possibly negative index against `len`.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn subscript(value: &Value, index: &Value) -> Result<Value, ExprError> {
    let Some(i) = index.as_int() else {
        return Err(ExprError::runtime(format!(
            "{} indices must be integers or slices, not {}",
            value.type_name(),
            index.type_name()
        )));
    };

    let out_of_range = || ExprError::runtime(format!("{} index out of range", value.type_name()));

    match value {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(i, chars.len()).ok_or_else(out_of_range)?;
            Ok(Value::Str(chars[i].to_string()))
        }
        Value::List(items) => {
            let i = normalize_index(i, items.len()).ok_or_else(out_of_range)?;
            Ok(items[i].clone())
        }
        other => {
            let items = other.tuple_items().ok_or_else(|| {
                ExprError::runtime(format!(
                    "'{}' object is not subscriptable",
                    other.type_name()
                ))
            })?;
            let i = normalize_index(i, items.len()).ok_or_else(out_of_range)?;
            Ok(items[i].clone())
        }
    }
}

/// Indices selected by `[lower:upper:step]` on a sequence of length `len`.
fn slice_indices(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, ExprError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ExprError::runtime("slice step cannot be zero"));
    }
    let len = i64::try_from(len).map_err(|_| ExprError::runtime("sequence too long"))?;

    // Clamp as CPython does: negative positions count from the end, the
    // result is bounded to [0, len] going forward and [-1, len - 1] backward.
    let clamp = |pos: i64, lo: i64, hi: i64| {
        let pos = if pos < 0 { pos.saturating_add(len) } else { pos };
        pos.clamp(lo, hi)
    };
    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |p| clamp(p, 0, len)),
            upper.map_or(len, |p| clamp(p, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |p| clamp(p, -1, len - 1)),
            upper.map_or(-1, |p| clamp(p, -1, len - 1)),
        )
    };

    let mut indices = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(index) = usize::try_from(i) {
            indices.push(index);
        }
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(indices)
}

fn slice(
    value: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Value, ExprError> {
    match value {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice_indices(chars.len(), lower, upper, step)?;
            Ok(Value::Str(picked.into_iter().map(|i| chars[i]).collect()))
        }
        Value::List(items) => {
            let picked = slice_indices(items.len(), lower, upper, step)?;
            Ok(Value::List(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        other => {
            let items = other.tuple_items().ok_or_else(|| {
                ExprError::runtime(format!(
                    "'{}' object is not subscriptable",
                    other.type_name()
                ))
            })?;
            let picked = slice_indices(items.len(), lower, upper, step)?;
            Ok(Value::Tuple(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> ExprError {
    ExprError::runtime(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn overflow() -> ExprError {
    ExprError::runtime("integer overflow")
}

fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        // bool op bool stays boolean for the bitwise operators
        if let (Value::Bool(x), Value::Bool(y)) = (left, right) {
            match op {
                BinOp::BitAnd => return Ok(Value::Bool(x & y)),
                BinOp::BitOr => return Ok(Value::Bool(x | y)),
                BinOp::BitXor => return Ok(Value::Bool(x ^ y)),
                _ => {}
            }
        }
        return int_binary(op, a, b).ok_or_else(|| unsupported(op, left, right))?;
    }

    if left.is_number() && right.is_number() {
        if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
            return float_binary(op, a, b).ok_or_else(|| unsupported(op, left, right))?;
        }
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            check_len(a.len().saturating_add(b.len()))?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinOp::Add, _, _) => match (left.tuple_items(), right.tuple_items()) {
            (Some(a), Some(b)) => {
                check_len(a.len().saturating_add(b.len()))?;
                Ok(Value::Tuple(a.into_iter().chain(b).collect()))
            }
            _ => Err(unsupported(op, left, right)),
        },
        (BinOp::Mul, seq, count) | (BinOp::Mul, count, seq) if count.as_int().is_some() => {
            repeat(seq, count.as_int().unwrap_or(0)).ok_or_else(|| unsupported(op, left, right))?
        }
        _ => Err(unsupported(op, left, right)),
    }
}

fn check_len(len: usize) -> Result<(), ExprError> {
    if len > MAX_SEQUENCE_LEN {
        Err(ExprError::runtime("sequence too long"))
    } else {
        Ok(())
    }
}

fn repeat(seq: &Value, count: i64) -> Option<Result<Value, ExprError>> {
    let count = usize::try_from(count.max(0)).unwrap_or(usize::MAX);
    let repeat_items = |items: &[Value]| -> Result<Vec<Value>, ExprError> {
        check_len(items.len().saturating_mul(count))?;
        Ok(items.iter().cloned().cycle().take(items.len() * count).collect())
    };
    Some(match seq {
        Value::Str(s) => check_len(s.len().saturating_mul(count)).map(|()| Value::Str(s.repeat(count))),
        Value::List(items) => repeat_items(items).map(Value::List),
        other => {
            let items = other.tuple_items()?;
            repeat_items(&items).map(Value::Tuple)
        }
    })
}

fn int_binary(op: BinOp, a: i64, b: i64) -> Option<Result<Value, ExprError>> {
    let zero_div = || ExprError::runtime("division by zero");
    let int = |r: Option<i64>| r.map(Value::Int).ok_or_else(overflow);

    Some(match op {
        BinOp::Add => int(a.checked_add(b)),
        BinOp::Sub => int(a.checked_sub(b)),
        BinOp::Mul => int(a.checked_mul(b)),
        #[allow(clippy::cast_precision_loss)]
        BinOp::Div => {
            if b == 0 {
                Err(zero_div())
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinOp::FloorDiv => {
            if b == 0 {
                Err(zero_div())
            } else {
                int(floor_div(a, b))
            }
        }
        BinOp::Mod => {
            if b == 0 {
                Err(zero_div())
            } else {
                int(floor_mod(a, b))
            }
        }
        BinOp::Pow => {
            if b < 0 {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                let result = (a as f64).powi(b.max(i64::from(i32::MIN)) as i32);
                if a == 0 {
                    Err(ExprError::runtime(
                        "0.0 cannot be raised to a negative power",
                    ))
                } else {
                    Ok(Value::Float(result))
                }
            } else {
                int(u32::try_from(b).ok().and_then(|b| a.checked_pow(b)))
            }
        }
        BinOp::LShift => {
            if b < 0 {
                Err(ExprError::runtime("negative shift count"))
            } else if a == 0 {
                Ok(Value::Int(0))
            } else {
                let shifted = u32::try_from(b)
                    .ok()
                    .filter(|s| *s < 64)
                    .and_then(|s| a.checked_shl(s))
                    .filter(|r| r >> b == a);
                int(shifted)
            }
        }
        BinOp::RShift => {
            if b < 0 {
                Err(ExprError::runtime("negative shift count"))
            } else {
                let s = u32::try_from(b.min(63)).unwrap_or(63);
                Ok(Value::Int(a >> s))
            }
        }
        BinOp::BitAnd => Ok(Value::Int(a & b)),
        BinOp::BitOr => Ok(Value::Int(a | b)),
        BinOp::BitXor => Ok(Value::Int(a ^ b)),
        BinOp::MatMul => return None,
    })
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Option<Result<Value, ExprError>> {
    let zero_div = || ExprError::runtime("float division by zero");
    Some(match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                Err(zero_div())
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                Err(zero_div())
            } else {
                Ok(Value::Float((a / b).floor()))
            }
        }
        BinOp::Mod => {
            if b == 0.0 {
                Err(zero_div())
            } else {
                let r = a % b;
                Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else {
                    r
                }))
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                Err(ExprError::runtime(
                    "0.0 cannot be raised to a negative power",
                ))
            } else {
                Ok(Value::Float(a.powf(b)))
            }
        }
        _ => return None,
    })
}

fn unary(op: UnaryOp, operand: &Value) -> Result<Value, ExprError> {
    let bad = || {
        let symbol = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
        };
        ExprError::runtime(format!(
            "bad operand type for unary {symbol}: '{}'",
            operand.type_name()
        ))
    };

    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Float(f) => Ok(Value::Float(-f)),
            other => {
                let n = other.as_int().ok_or_else(bad)?;
                n.checked_neg().map(Value::Int).ok_or_else(overflow)
            }
        },
        UnaryOp::Pos => match operand {
            Value::Float(f) => Ok(Value::Float(*f)),
            other => other.as_int().map(Value::Int).ok_or_else(bad),
        },
        UnaryOp::Invert => operand.as_int().map(|n| Value::Int(!n)).ok_or_else(bad),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    Ok(match op {
        CmpOp::Eq => left.equals(right),
        CmpOp::NotEq => !left.equals(right),
        CmpOp::Lt => left.compare(right, op.symbol())? == Some(Ordering::Less),
        CmpOp::LtE => matches!(
            left.compare(right, op.symbol())?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => left.compare(right, op.symbol())? == Some(Ordering::Greater),
        CmpOp::GtE => matches!(
            left.compare(right, op.symbol())?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CmpOp::In => right.contains(left)?,
        CmpOp::NotIn => !right.contains(left)?,
        CmpOp::Is => left.is_same(right),
        CmpOp::IsNot => !left.is_same(right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::ast::StmtKind;

    fn eval_with(source: &str, ver: VersionTuple) -> Result<Value, ExprError> {
        let program = parse(source)?;
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("not an expression: {source}");
        };
        Interpreter::new(ver).eval(expr)
    }

    fn eval(source: &str) -> Value {
        eval_with(source, VersionTuple::new(1, 9, 0)).unwrap()
    }

    #[test]
    fn test_version_attributes_and_indexing() {
        assert_eq!(eval("ver.major"), Value::Int(1));
        assert_eq!(eval("ver.minor"), Value::Int(9));
        assert_eq!(eval("ver[-1]"), Value::Int(0));
        assert_eq!(
            eval("ver[:2]"),
            Value::Tuple(vec![Value::Int(1), Value::Int(9)])
        );
    }

    #[test]
    fn test_arithmetic_follows_floor_semantics() {
        assert_eq!(eval("-7 // 2"), Value::Int(-4));
        assert_eq!(eval("-7 % 3"), Value::Int(2));
        assert_eq!(eval("7 % -3"), Value::Int(-2));
        assert_eq!(eval("7 / 2"), Value::Float(3.5));
        assert_eq!(eval("2 ** 10"), Value::Int(1024));
        assert_eq!(eval("-2 ** 2"), Value::Int(-4));
        assert_eq!(eval("1 << 4 | 1"), Value::Int(17));
        assert_eq!(eval("~0"), Value::Int(-1));
    }

    #[test]
    fn test_arithmetic_errors() {
        let ver = VersionTuple::default();
        assert!(eval_with("1 // 0", ver).is_err());
        assert!(eval_with("1 % 0", ver).is_err());
        assert!(eval_with("9223372036854775807 + 1", ver).is_err());
        assert!(eval_with("1 << -1", ver).is_err());
        assert!(eval_with("1 + 'a'", ver).is_err());
    }

    #[test]
    fn test_sequences() {
        assert_eq!(eval("(1, 2) + (3,)"), eval("(1, 2, 3)"));
        assert_eq!(eval("[0] * 3"), eval("[0, 0, 0]"));
        assert_eq!(eval("2 * 'ab'"), Value::Str("abab".into()));
        assert_eq!(eval("(1, 2, 3, 4)[::-2]"), eval("(4, 2)"));
        assert_eq!(eval("'hello'[1:-1]"), Value::Str("ell".into()));
        assert_eq!(eval("[1, 2, 3][5:]"), Value::List(vec![]));
        assert!(eval_with("(1,)[::0]", VersionTuple::default()).is_err());
        assert!(eval_with("(1,)[3]", VersionTuple::default()).is_err());
    }

    #[test]
    fn test_repetition_limit() {
        let err = eval_with("(0,) * 2000000", VersionTuple::default()).unwrap_err();
        assert_eq!(err, ExprError::Runtime("sequence too long".into()));
    }

    #[test]
    fn test_memory_limit_on_repeated_large_values() {
        let limited = ExprError::Runtime("evaluation memory limit exceeded".into());
        for source in [
            "[s for s in ['a' * 999999] for a in [0] * 1000 for b in [0] * 1000]",
            "['a' * 999999] * 1000000",
            "[[0] * 100000 for a in (0,) * 1000]",
        ] {
            assert_eq!(
                eval_with(source, VersionTuple::default()).unwrap_err(),
                limited,
                "{source}"
            );
        }
    }

    #[test]
    fn test_weight_counts_nested_bytes() {
        let small = eval("('ab', [1])").weight();
        let large = eval("('ab' * 1000, [1] * 1000)").weight();
        assert!(large > small + 2000);
    }

    #[test]
    fn test_boolean_operators_return_operands() {
        assert_eq!(eval("0 or 'x'"), Value::Str("x".into()));
        assert_eq!(eval("1 and 0"), Value::Int(0));
        assert_eq!(eval("not ()"), Value::Bool(true));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("1 < 2 < 3"), Value::Bool(true));
        assert_eq!(eval("1 < 3 < 2"), Value::Bool(false));
        assert_eq!(eval("ver == (1, 9, 0)"), Value::Bool(true));
        assert_eq!(eval("ver >= (1, 9)"), Value::Bool(true));
        assert_eq!(eval("9 in ver"), Value::Bool(true));
        assert_eq!(eval("'b' not in 'abc'"), Value::Bool(false));
        assert_eq!(eval("None is None"), Value::Bool(true));
        assert_eq!(eval("1 is not True"), Value::Bool(true));
    }

    #[test]
    fn test_chain_short_circuits_before_type_error() {
        // The second comparison would fail on int < str.
        assert_eq!(eval("2 < 1 < 'a'"), Value::Bool(false));
    }

    #[test]
    fn test_list_comprehension() {
        assert_eq!(eval("[x * 2 for x in (1, 2, 3) if x > 1]"), eval("[4, 6]"));
        assert_eq!(
            eval("[a + b for a, b in [(1, 2), (3, 4)]]"),
            eval("[3, 7]")
        );
        assert_eq!(eval("[x for x in ver if x]"), eval("[1, 9]"));
        assert_eq!(
            eval("[(x, y) for x in (1, 2) for y in 'ab']"),
            eval("[(1, 'a'), (1, 'b'), (2, 'a'), (2, 'b')]")
        );
    }

    #[test]
    fn test_comprehension_names_do_not_leak() {
        let err = eval_with("[x for x in (1,)] and x", VersionTuple::default()).unwrap_err();
        assert_eq!(err.to_string(), "name 'x' is not defined");
    }

    #[test]
    fn test_unknown_name() {
        let err = eval_with("version > 1", VersionTuple::default()).unwrap_err();
        assert_eq!(err.to_string(), "name 'version' is not defined");
    }

    #[test]
    fn test_step_limit() {
        let source = "[0 for a in (0,) * 1000 for b in (0,) * 1000 for c in (0,) * 10]";
        let err = eval_with(source, VersionTuple::default()).unwrap_err();
        assert!(matches!(err, ExprError::Runtime(_)));
    }
}
