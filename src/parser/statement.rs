use crate::types::ScalarType;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        if_not_exists: bool,
        name: String,
        source: TableSource,
    },
    DropTable {
        name: String,
        if_exists: bool,
    },
    LoadData {
        infile: String,
        table: String,
        ignore_lines: u64,
    },
    Select(Select),
}

/// Where a new table's schema comes from: exactly one of a literal field
/// list or a query whose output shape (and rows) seed the table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Schema(Vec<FieldDef>),
    Query(Box<Select>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub scalar_type: ScalarType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Empty means `*`.
    pub projections: Vec<Projection>,
    pub outfile: Option<String>,
    pub table: String,
    pub filter: Option<Condition>,
    pub group_by: Vec<String>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Min,
    Max,
    Avg,
    Sum,
    Count,
}

impl AggregateFunction {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "avg" => Some(Self::Avg),
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Count => "count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionExpr {
    Field(String),
    Aggregate {
        function: AggregateFunction,
        field: String,
    },
}

impl ProjectionExpr {
    /// The table field the expression reads.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Field(field) | Self::Aggregate { field, .. } => field,
        }
    }

    /// Identifier used when no `AS` is given: the field name, or
    /// `func(field)` for an aggregate.
    #[must_use]
    pub fn default_identifier(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProjectionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.write_str(field),
            Self::Aggregate { function, field } => write!(f, "{}({field})", function.keyword()),
        }
    }
}

/// One output column of a SELECT with its resolved output identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub expr: ProjectionExpr,
    pub identifier: String,
}

impl Projection {
    #[must_use]
    pub fn new(expr: ProjectionExpr, alias: Option<String>) -> Self {
        let identifier = alias.unwrap_or_else(|| expr.default_identifier());
        Self { expr, identifier }
    }

    #[must_use]
    pub fn field(name: &str) -> Self {
        Self::new(ProjectionExpr::Field(name.to_string()), None)
    }

    #[must_use]
    pub fn aggregate(function: AggregateFunction, field: &str, alias: Option<&str>) -> Self {
        Self::new(
            ProjectionExpr::Aggregate {
                function,
                field: field.to_string(),
            },
            alias.map(str::to_string),
        )
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self.expr, ProjectionExpr::Aggregate { .. })
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identifier == self.expr.default_identifier() {
            write!(f, "{}", self.expr)
        } else {
            write!(f, "{} AS {}", self.expr, self.identifier)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    Is,
    IsNot,
}

impl CompareOp {
    #[must_use]
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "=" => Some(Self::Eq),
            ">=" => Some(Self::Ge),
            ">" => Some(Self::Gt),
            "<>" => Some(Self::Ne),
            _ => None,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Ne => "<>",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Number(f64),
    Text(String),
    Null,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Null => f.write_str("NULL"),
        }
    }
}

/// `field op constant`, used by both WHERE and HAVING.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub constant: Constant,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.symbol(), self.constant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderField {
    pub field: String,
    pub order: SortOrder,
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        write!(f, "{} {order}", self.field)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.projections.is_empty() {
            f.write_str("SELECT *")?;
        } else {
            write!(f, "SELECT {}", join(&self.projections))?;
        }
        if let Some(outfile) = &self.outfile {
            write!(f, " INTO OUTFILE \"{outfile}\"")?;
        }
        write!(f, " FROM {}", self.table)?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.join(", "))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", join(&self.order_by))?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable {
                if_not_exists,
                name,
                source,
            } => {
                f.write_str("CREATE TABLE ")?;
                if *if_not_exists {
                    f.write_str("IF NOT EXISTS ")?;
                }
                match source {
                    TableSource::Schema(fields) => {
                        let fields: Vec<String> = fields
                            .iter()
                            .map(|def| format!("{} {}", def.name, def.scalar_type.keyword().to_uppercase()))
                            .collect();
                        write!(f, "{name} ({});", fields.join(", "))
                    }
                    TableSource::Query(select) => write!(f, "{name} AS {select};"),
                }
            }
            Self::DropTable { name, if_exists } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                write!(f, "DROP TABLE {guard}{name};")
            }
            Self::LoadData {
                infile,
                table,
                ignore_lines,
            } => {
                write!(f, "LOAD DATA INFILE \"{infile}\" INTO TABLE {table}")?;
                if *ignore_lines > 0 {
                    write!(f, " IGNORE {ignore_lines} LINES")?;
                }
                f.write_str(";")
            }
            Self::Select(select) => write!(f, "{select};"),
        }
    }
}
