use arbor_core::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `table."column"`, or `"column"` without a table
    Column {
        table: Option<String>,
        name: String,
    },

    /// A bound argument
    Value(Value),

    /// A trusted SQL fragment, emitted in parentheses
    Raw(String),

    And(Vec<Expr>),
    Or(Vec<Expr>),

    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    /// `LOWER(expr)`
    Lower(Box<Expr>),

    /// `expr::ty`
    Cast {
        expr: Box<Expr>,
        ty: String,
    },

    /// `expr [I]LIKE pattern`
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        case_insensitive: bool,
    },

    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },

    IsNull {
        expr: Box<Expr>,
        negate: bool,
    },

    /// A function call such as `COUNT(DISTINCT t0."id")`
    Func {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// `*`
    Star,

    /// `TRUE` / `FALSE`
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    /// Conjunction of `operands`, flattening nested conjunctions and
    /// collapsing a single operand.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::Bool(true))
        } else {
            Expr::And(flat)
        }
    }

    /// Disjunction of `operands`, collapsing a single operand.
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::Bool(false))
        } else {
            Expr::Or(flat)
        }
    }

    pub fn binary_op(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn lower(expr: Expr) -> Expr {
        Expr::Lower(Box::new(expr))
    }

    pub fn cast(expr: Expr, ty: impl Into<String>) -> Expr {
        Expr::Cast {
            expr: Box::new(expr),
            ty: ty.into(),
        }
    }

    pub fn like(expr: Expr, pattern: Expr, case_insensitive: bool) -> Expr {
        Expr::Like {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
            case_insensitive,
        }
    }

    pub fn in_list(expr: Expr, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(expr),
            list,
        }
    }

    pub fn is_null(expr: Expr, negate: bool) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr),
            negate,
        }
    }

    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Func {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    pub fn count_star() -> Expr {
        Expr::func("COUNT", vec![Expr::Star])
    }

    pub fn count_distinct(args: Vec<Expr>) -> Expr {
        Expr::Func {
            name: "COUNT".to_string(),
            args,
            distinct: true,
        }
    }

    /// Returns `true` for an empty conjunction.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::Bool(true)) || matches!(self, Expr::And(operands) if operands.is_empty())
    }
}
