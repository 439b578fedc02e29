use std::collections::{HashMap, HashSet};

use crate::ast::{BinaryOp, RelExpr, ScalarExpr, SetOpKind};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::Schema;
use crate::table::Table;
use crate::value::Value;

/// The execution catalog: a read-only mapping from relation names to base
/// tables, threaded explicitly into every evaluation. There is no ambient
/// global catalog; this object is the sole channel for shared state.
pub struct EvaluationContext {
    catalog: HashMap<String, Table>,
}

impl EvaluationContext {
    /// Creates a context from a name→table map. The context takes ownership
    /// of the map and never mutates it afterwards.
    pub fn new(catalog: HashMap<String, Table>) -> Self {
        Self { catalog }
    }

    /// Resolves a relation by exact name.
    ///
    /// # Errors
    /// Returns an error if no such relation exists.
    pub fn lookup(&self, name: &str) -> Result<&Table> {
        self.catalog
            .get(name)
            .ok_or_else(|| Error::UnknownRelation(name.to_string()))
    }
}

/// The execution engine: recursively interprets a [RelExpr] tree into a
/// materialized [Table], children before parents. Every operator fails fast
/// on the first violated invariant; a failing subtree aborts the whole
/// evaluation.
pub struct Evaluator<'a> {
    ctx: &'a EvaluationContext,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a EvaluationContext) -> Self {
        Self { ctx }
    }

    /// Evaluates a relational expression against the catalog.
    ///
    /// # Example
    /// ```
    /// # use std::collections::HashMap;
    /// # use relalg::{EvaluationContext, Evaluator, Parser, Tokenizer};
    /// # use relalg::schema::{Attribute, Schema};
    /// # use relalg::table::Table;
    /// # use relalg::row::Row;
    /// # use relalg::value::Value;
    /// # use relalg::data_type::DataType;
    /// let schema = Schema::new(vec![Attribute::new("X", DataType::Int).unwrap()]).unwrap();
    /// let mut t = Table::new(schema);
    /// t.insert(Row::new().with("X", Value::Int(1))).unwrap();
    /// let ctx = EvaluationContext::new(HashMap::from([("A".to_string(), t)]));
    ///
    /// let tokens = Tokenizer::new("σ X = 1 (A)").tokenize().unwrap();
    /// let ast = Parser::new(tokens).parse().unwrap();
    /// let result = Evaluator::new(&ctx).eval(&ast).unwrap();
    /// assert_eq!(result.len(), 1);
    /// ```
    pub fn eval(&self, expr: &RelExpr) -> Result<Table> {
        match expr {
            RelExpr::Relation(name) => Ok(self.ctx.lookup(name)?.clone()),
            RelExpr::Selection { condition, child } => {
                let child = self.eval(child)?;
                eval_selection(condition, &child)
            }
            RelExpr::Projection { attrs, child } => {
                let child = self.eval(child)?;
                eval_projection(attrs, &child)
            }
            // ρ is parsed but inert: the schema model has no relation-name
            // tag for the new name to land on.
            RelExpr::Rename { child, .. } => self.eval(child),
            RelExpr::Join { left, right, on } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_join(&left, &right, on.as_ref())
            }
            RelExpr::SetOp { kind, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match kind {
                    SetOpKind::Union => eval_union(&left, &right),
                    SetOpKind::Intersect => eval_intersect(&left, &right),
                    SetOpKind::Minus => eval_minus(&left, &right),
                }
            }
        }
    }
}

// --- Selection (σ) ---

fn eval_selection(condition: &ScalarExpr, input: &Table) -> Result<Table> {
    let mut out = Table::new(input.schema().clone());
    for row in input.rows() {
        if condition_holds(condition, row)? {
            out.insert(row.clone())?;
        }
    }
    Ok(out)
}

// --- Projection (π) ---

fn eval_projection(attrs: &[String], input: &Table) -> Result<Table> {
    let indices = attrs
        .iter()
        .map(|a| input.schema().index_of(a))
        .collect::<Result<Vec<_>>>()?;
    let schema = input.schema().project(&indices)?;

    let mut out = Table::new(schema);
    for row in input.rows() {
        let projected = attrs
            .iter()
            .map(|a| (a.clone(), row.get(a).cloned().unwrap_or(Value::Null)))
            .collect::<Row>();
        out.insert(projected)?;
    }
    Ok(out)
}

// --- Join (⋈) ---

fn eval_join(left: &Table, right: &Table, on: Option<&ScalarExpr>) -> Result<Table> {
    // The merged heading is built before any row; a shared attribute name
    // fails here, so the name-keyed row overlay below never sees a collision.
    let schema = Schema::merge(left.schema(), right.schema())?;
    let mut out = Table::new(schema);

    for lrow in left.rows() {
        for rrow in right.rows() {
            let mut combined = lrow.clone();
            for (name, value) in rrow.iter() {
                combined = combined.with(name, value.clone());
            }
            let keep = match on {
                Some(cond) => condition_holds(cond, &combined)?,
                None => true,
            };
            if keep {
                out.insert(combined)?;
            }
        }
    }
    Ok(out)
}

// --- Set operations (∪ ∩ −) ---

fn eval_union(a: &Table, b: &Table) -> Result<Table> {
    check_compatible(a, b)?;
    let mut out = Table::new(a.schema().clone());
    let mut seen = HashSet::new();
    for row in a.rows() {
        if seen.insert(row.clone()) {
            out.insert(row.clone())?;
        }
    }
    for row in b.rows() {
        let row = rebind(row, b.schema(), a.schema());
        if seen.insert(row.clone()) {
            out.insert(row)?;
        }
    }
    Ok(out)
}

fn eval_intersect(a: &Table, b: &Table) -> Result<Table> {
    check_compatible(a, b)?;
    let members: HashSet<Row> = b.rows().iter().map(|r| rebind(r, b.schema(), a.schema())).collect();
    let mut out = Table::new(a.schema().clone());
    // Left duplicates are kept: this is a membership test, not a
    // de-duplication pass.
    for row in a.rows() {
        if members.contains(row) {
            out.insert(row.clone())?;
        }
    }
    Ok(out)
}

fn eval_minus(a: &Table, b: &Table) -> Result<Table> {
    check_compatible(a, b)?;
    let members: HashSet<Row> = b.rows().iter().map(|r| rebind(r, b.schema(), a.schema())).collect();
    let mut out = Table::new(a.schema().clone());
    for row in a.rows() {
        if !members.contains(row) {
            out.insert(row.clone())?;
        }
    }
    Ok(out)
}

fn check_compatible(a: &Table, b: &Table) -> Result<()> {
    if !a.schema().is_compatible(b.schema()) {
        return Err(Error::IncompatibleSchema {
            left: a.schema().to_string(),
            right: b.schema().to_string(),
        });
    }
    Ok(())
}

/// Rebinds a row of the `from` schema to the attribute names of `to`,
/// position by position. Compatibility only constrains arity and positional
/// types, so the right side of a set operation may use different names; the
/// output heading is the left schema's, and membership is positional.
fn rebind(row: &Row, from: &Schema, to: &Schema) -> Row {
    to.attributes()
        .iter()
        .zip(from.attributes())
        .map(|(target, source)| {
            let value = row.get(&source.name).cloned().unwrap_or(Value::Null);
            (target.name.clone(), value)
        })
        .collect()
}

// --- Scalar (condition) evaluation ---

/// Evaluates a condition and requires a boolean result.
fn condition_holds(condition: &ScalarExpr, row: &Row) -> Result<bool> {
    match eval_scalar(condition, row)? {
        Value::Bool(b) => Ok(b),
        other => Err(Error::ScalarType(format!(
            "condition must evaluate to a boolean, got {other:?}"
        ))),
    }
}

/// Evaluates a scalar expression against one row's bindings.
///
/// A reference to an attribute the row does not bind yields [Value::Null]
/// rather than an error; an operator that then requires a boolean or an
/// ordered operand fails with a type error.
pub fn eval_scalar(expr: &ScalarExpr, row: &Row) -> Result<Value> {
    match expr {
        ScalarExpr::Literal(v) => Ok(v.clone()),
        ScalarExpr::AttrRef(name) => Ok(row.get(name).cloned().unwrap_or(Value::Null)),
        ScalarExpr::Not(inner) => match eval_scalar(inner, row)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(Error::ScalarType(format!(
                "not requires a boolean operand, got {other:?}"
            ))),
        },
        ScalarExpr::Binary { left, op, right } => {
            let lv = eval_scalar(left, row)?;
            let rv = eval_scalar(right, row)?;
            match op {
                BinaryOp::And | BinaryOp::Or => {
                    // Both operands must already be boolean; there is no
                    // coercion and no short-circuit.
                    let (Value::Bool(l), Value::Bool(r)) = (&lv, &rv) else {
                        return Err(Error::ScalarType(format!(
                            "{op} requires boolean operands, got {lv:?} and {rv:?}"
                        )));
                    };
                    Ok(Value::Bool(match op {
                        BinaryOp::And => *l && *r,
                        _ => *l || *r,
                    }))
                }
                // Equality is total over values: mismatched kinds compare
                // unequal, Null equals only Null. No cross-kind coercion.
                BinaryOp::Eq => Ok(Value::Bool(lv == rv)),
                BinaryOp::Neq => Ok(Value::Bool(lv != rv)),
                BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                    compare_ordered(&lv, *op, &rv)
                }
            }
        }
    }
}

/// Ordering comparisons require both operands of the same ordered kind.
fn compare_ordered(left: &Value, op: BinaryOp, right: &Value) -> Result<Value> {
    use std::cmp::Ordering;

    let ord = match (left, right) {
        (Value::Int(l), Value::Int(r)) => l.cmp(r),
        (Value::Double(l), Value::Double(r)) => l.partial_cmp(r).ok_or_else(|| {
            Error::ScalarType(format!("cannot order {left:?} against {right:?}"))
        })?,
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        _ => {
            return Err(Error::ScalarType(format!(
                "cannot compare {left:?} with {right:?}"
            )));
        }
    };

    Ok(Value::Bool(match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Lte => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::Gte => ord != Ordering::Less,
        // reached only from the ordering arm of eval_scalar
        _ => unreachable!("non-ordering operator {op}"),
    }))
}
