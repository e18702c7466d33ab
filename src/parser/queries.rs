/// SELECT rule and the shared `field op constant` condition rule.
use super::lexer::TokenKind;
use super::statement::{
    AggregateFunction, CompareOp, Condition, Constant, OrderField, Projection, ProjectionExpr,
    Select, SortOrder,
};
use super::Parser;
use crate::types::SyntaxError;

const COMPARISON_OPERATORS: &[&str] = &["<", "<=", "=", ">=", ">", "<>"];

impl Parser<'_> {
    /// ```text
    /// SELECT ( * | projection {, projection} )
    ///     [INTO OUTFILE "path"]
    ///     FROM table
    ///     [WHERE condition]
    ///     [GROUP BY field {, field}]
    ///     [HAVING condition]
    ///     [ORDER BY field [ASC|DESC] {, field [ASC|DESC]}] ;
    /// ```
    pub(super) fn parse_select(&mut self) -> Result<Select, SyntaxError> {
        self.expect_keyword("select")?;
        self.advance()?;

        let projections = if self.at_operator("*") {
            self.advance()?;
            Vec::new()
        } else {
            self.parse_projections()?
        };

        let mut outfile = None;
        if self.at_keyword("into") {
            self.expect_next_keyword("outfile")?;
            self.expect_next(&[TokenKind::LiteralString], &[])?;
            outfile = Some(self.token.text.clone());
            self.advance()?;
        }

        self.expect_keyword("from")?;
        self.advance()?;
        let table = self.table_name()?;
        self.advance()?;

        let mut filter = None;
        if self.at_keyword("where") {
            filter = Some(self.parse_condition()?);
        }

        let mut group_by = Vec::new();
        if self.at_keyword("group") {
            self.expect_next_keyword("by")?;
            loop {
                group_by.push(self.expect_next_identifier()?);
                self.advance()?;
                if !self.at_operator(",") {
                    break;
                }
            }
        }

        let mut having = None;
        if self.at_keyword("having") {
            having = Some(self.parse_condition()?);
        }

        let mut order_by = Vec::new();
        if self.at_keyword("order") {
            self.expect_next_keyword("by")?;
            loop {
                let field = self.expect_next_identifier()?;
                self.advance()?;
                let mut order = SortOrder::default();
                if self.token.kind == TokenKind::Keyword {
                    self.expect_current(&[TokenKind::Keyword], &["asc", "desc"])?;
                    if self.at_keyword("desc") {
                        order = SortOrder::Desc;
                    }
                    self.advance()?;
                }
                order_by.push(OrderField { field, order });
                if !self.at_operator(",") {
                    break;
                }
            }
        }

        self.expect_terminator()?;
        Ok(Select {
            projections,
            outfile,
            table,
            filter,
            group_by,
            having,
            order_by,
        })
    }

    /// Projection list up to (not including) `INTO` / `FROM`.
    fn parse_projections(&mut self) -> Result<Vec<Projection>, SyntaxError> {
        let mut projections = Vec::new();
        loop {
            self.expect_current(&[TokenKind::Keyword, TokenKind::Identifier], &[])?;
            let expr = if self.token.kind == TokenKind::Keyword {
                let function = AggregateFunction::from_keyword(&self.token.text).ok_or_else(|| {
                    self.error(format!("Unexpected keyword {:?} in projection", self.token.text))
                })?;
                self.expect_next(&[TokenKind::Operator], &["("])?;
                let field = self.expect_next_identifier()?;
                self.expect_next(&[TokenKind::Operator], &[")"])?;
                ProjectionExpr::Aggregate { function, field }
            } else {
                ProjectionExpr::Field(self.token.text.clone())
            };
            self.advance()?;

            let mut alias = None;
            if self.at_keyword("as") {
                alias = Some(self.expect_next_identifier()?);
                self.advance()?;
            }
            projections.push(Projection::new(expr, alias));

            if !self.at_operator(",") {
                return Ok(projections);
            }
            self.advance()?;
        }
    }

    /// Parses `field op constant` following the current WHERE / HAVING
    /// keyword and leaves the token after the constant current.
    pub(super) fn parse_condition(&mut self) -> Result<Condition, SyntaxError> {
        let field = self.expect_next_identifier()?;
        self.advance()?;

        self.expect_current(&[TokenKind::Keyword, TokenKind::Operator], &[])?;
        let op = if self.token.kind == TokenKind::Keyword {
            self.expect_keyword("is")?;
            self.advance()?;
            if self.at_keyword("not") {
                self.advance()?;
                CompareOp::IsNot
            } else {
                CompareOp::Is
            }
        } else {
            self.expect_current(&[TokenKind::Operator], COMPARISON_OPERATORS)?;
            let op = CompareOp::from_operator(&self.token.text)
                .ok_or_else(|| self.error(format!("Unknown operator {}", self.token.text)))?;
            self.advance()?;
            op
        };

        self.expect_current(
            &[TokenKind::LiteralNumber, TokenKind::LiteralString, TokenKind::Keyword],
            &[],
        )?;
        if matches!(op, CompareOp::Is | CompareOp::IsNot) && !self.at_keyword("null") {
            return Err(self.error(format!("IS expects NULL, found {:?}", self.token.text)));
        }
        let constant = match self.token.kind {
            TokenKind::LiteralNumber => {
                let number = self
                    .token
                    .text
                    .parse::<f64>()
                    .map_err(|_| self.error(format!("Malformed number {}", self.token.text)))?;
                Constant::Number(number)
            }
            TokenKind::LiteralString => Constant::Text(self.token.text.clone()),
            _ => {
                self.expect_keyword("null")?;
                Constant::Null
            }
        };
        self.advance()?;

        Ok(Condition {
            field,
            op,
            constant,
        })
    }
}
