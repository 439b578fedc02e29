use std::fmt;

use crate::value::Value;

/// Binary operators of the scalar condition sub-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
        };
        write!(f, "{s}")
    }
}

/// A scalar condition expression: given one row's bindings it evaluates to a
/// single [Value]. Selections and join conditions are built from these.
///
/// Scalar and relational nodes are distinct types on purpose: a relational
/// operator can never be evaluated as a condition (or vice versa), so the
/// mismatch is unrepresentable instead of a runtime failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// A constant produced by a literal token.
    Literal(Value),
    /// A reference to an attribute of the current row, possibly qualified
    /// (`Emp.Age` is a single name containing the dot).
    AttrRef(String),
    /// Logical negation.
    Not(Box<ScalarExpr>),
    /// A binary operation (logical connective or comparison).
    Binary {
        left: Box<ScalarExpr>,
        op: BinaryOp,
        right: Box<ScalarExpr>,
    },
}

/// Kinds of set operation between two relations of compatible schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Minus,
}

/// A relational algebra operator: given a catalog it evaluates to a whole
/// relation. The other half of the AST, see [ScalarExpr].
#[derive(Debug, Clone, PartialEq)]
pub enum RelExpr {
    /// A base relation looked up in the catalog by name.
    Relation(String),
    /// σ: keep the child's rows satisfying the condition.
    Selection {
        condition: ScalarExpr,
        child: Box<RelExpr>,
    },
    /// π: reduce the child to the named attributes, in the given order.
    Projection {
        attrs: Vec<String>,
        child: Box<RelExpr>,
    },
    /// ρ: rename the child relation. Currently inert at evaluation time
    /// (the schema model carries no relation-name tag).
    Rename { name: String, child: Box<RelExpr> },
    /// ⋈: combine every pair of left/right rows, optionally filtered by a
    /// condition over the combined bindings. Without a condition this is the
    /// full Cartesian product.
    Join {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
        on: Option<ScalarExpr>,
    },
    /// ∪ ∩ − between two schema-compatible relations.
    SetOp {
        kind: SetOpKind,
        left: Box<RelExpr>,
        right: Box<RelExpr>,
    },
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Literal(Value::Text(s)) => write!(f, "'{s}'"),
            ScalarExpr::Literal(v) => write!(f, "{v}"),
            ScalarExpr::AttrRef(name) => write!(f, "{name}"),
            ScalarExpr::Not(inner) => write!(f, "not {inner}"),
            ScalarExpr::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

impl ScalarExpr {
    /// Writes the expression where the grammar expects a join or selection
    /// condition. Binaries and negations are already self-delimiting; a bare
    /// operand is parenthesized so the parser reads it as a condition rather
    /// than the start of a relation.
    fn fmt_condition(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Binary { .. } | ScalarExpr::Not(_) => write!(f, "{self}"),
            _ => write!(f, "({self})"),
        }
    }
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetOpKind::Union => "∪",
            SetOpKind::Intersect => "∩",
            SetOpKind::Minus => "−",
        };
        write!(f, "{s}")
    }
}

/// Canonical textual form. Re-parsing the output of `Display` yields a
/// structurally identical tree for every parser-producible AST. Operands are
/// parenthesized exactly where the grammar demands a tighter-binding form.
impl fmt::Display for RelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelExpr::Relation(name) => write!(f, "{name}"),
            RelExpr::Selection { condition, child } => {
                write!(f, "σ ")?;
                condition.fmt_condition(f)?;
                write!(f, " ({child})")
            }
            RelExpr::Projection { attrs, child } => {
                write!(f, "π {} ({child})", attrs.join(", "))
            }
            RelExpr::Rename { name, child } => write!(f, "ρ {name} ({child})"),
            RelExpr::Join { left, right, on } => {
                // Left side may itself be a join (left-associative chain);
                // a set operation needs parentheses on either side.
                left.fmt_operand(f, matches!(**left, RelExpr::SetOp { .. }))?;
                write!(f, " ⋈ ")?;
                if let Some(cond) = on {
                    cond.fmt_condition(f)?;
                    write!(f, " ")?;
                }
                right.fmt_operand(
                    f,
                    matches!(**right, RelExpr::SetOp { .. } | RelExpr::Join { .. }),
                )
            }
            RelExpr::SetOp { kind, left, right } => {
                left.fmt_operand(f, false)?;
                write!(f, " {kind} ")?;
                right.fmt_operand(f, matches!(**right, RelExpr::SetOp { .. }))
            }
        }
    }
}

impl RelExpr {
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Box<ScalarExpr> {
        Box::new(ScalarExpr::AttrRef(name.into()))
    }

    fn rel(name: &str) -> Box<RelExpr> {
        Box::new(RelExpr::Relation(name.into()))
    }

    #[test]
    fn test_scalar_display() {
        let cond = ScalarExpr::Binary {
            left: attr("Age"),
            op: BinaryOp::Gt,
            right: Box::new(ScalarExpr::Literal(Value::Int(30))),
        };
        assert_eq!(cond.to_string(), "(Age > 30)");

        let not = ScalarExpr::Not(Box::new(cond));
        assert_eq!(not.to_string(), "not (Age > 30)");
    }

    #[test]
    fn test_string_literal_quoted() {
        let lit = ScalarExpr::Literal(Value::Text("COMP3005".into()));
        assert_eq!(lit.to_string(), "'COMP3005'");
    }

    #[test]
    fn test_selection_display() {
        let e = RelExpr::Selection {
            condition: ScalarExpr::Binary {
                left: attr("Age"),
                op: BinaryOp::Gte,
                right: Box::new(ScalarExpr::Literal(Value::Int(30))),
            },
            child: rel("Employees"),
        };
        assert_eq!(e.to_string(), "σ (Age >= 30) (Employees)");
    }

    #[test]
    fn test_projection_display() {
        let e = RelExpr::Projection {
            attrs: vec!["Name".into(), "Age".into()],
            child: rel("Employees"),
        };
        assert_eq!(e.to_string(), "π Name, Age (Employees)");
    }

    #[test]
    fn test_join_display_with_condition() {
        let e = RelExpr::Join {
            left: rel("Employees"),
            right: rel("Takes"),
            on: Some(ScalarExpr::Binary {
                left: attr("EID"),
                op: BinaryOp::Eq,
                right: attr("SID"),
            }),
        };
        assert_eq!(e.to_string(), "Employees ⋈ (EID = SID) Takes");
    }

    #[test]
    fn test_set_op_operand_parens() {
        // (A ∪ B) ⋈ C: a set op under a join must keep its parentheses
        let e = RelExpr::Join {
            left: Box::new(RelExpr::SetOp {
                kind: SetOpKind::Union,
                left: rel("A"),
                right: rel("B"),
            }),
            right: rel("C"),
            on: None,
        };
        assert_eq!(e.to_string(), "(A ∪ B) ⋈ C");
    }
}
