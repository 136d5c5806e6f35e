//! Boolean gene-protein-reaction expressions.
//!
//! A rule such as `(b0001 and b0002) or b0003` reads as: the reaction is catalysed either
//! by the complex of the products of `b0001` and `b0002`, or by the product of `b0003`.
//! [`parse_gpr`] turns the text into a [`GprExpr`] tree and [`GprExpr::to_dnf`] flattens
//! the tree into one gene list per alternative enzyme.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::gpr::error::GprError;

/// Gene token marking an incomplete rule in some legacy exports.
pub const ELLIPSIS: &str = "...";

/// A gene-protein-reaction rule as an AST.
#[derive(Debug, Clone, PartialEq)]
pub enum GprExpr {
    /// A single gene
    Gene(String),
    /// All operands are needed (a complex)
    And(Vec<GprExpr>),
    /// Any operand is sufficient (isozymes)
    Or(Vec<GprExpr>),
}

impl GprExpr {
    pub fn gene(id: impl Into<String>) -> Self {
        GprExpr::Gene(id.into())
    }

    /// Conjunction of the operands, flattening nested conjunctions.
    ///
    /// A single operand is returned as is.
    pub fn and(operands: Vec<GprExpr>) -> Self {
        Self::flatten(operands, true)
    }

    /// Disjunction of the operands, flattening nested disjunctions.
    pub fn or(operands: Vec<GprExpr>) -> Self {
        Self::flatten(operands, false)
    }

    fn flatten(operands: Vec<GprExpr>, conjunction: bool) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand {
                GprExpr::And(inner) if conjunction => flat.extend(inner),
                GprExpr::Or(inner) if !conjunction => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            return flat.remove(0);
        }
        if conjunction {
            GprExpr::And(flat)
        } else {
            GprExpr::Or(flat)
        }
    }

    /// Distinct genes of the expression, in order of appearance.
    pub fn genes(&self) -> Vec<&str> {
        match self {
            GprExpr::Gene(id) => vec![id.as_str()],
            GprExpr::And(operands) | GprExpr::Or(operands) => operands
                .iter()
                .flat_map(GprExpr::genes)
                .unique()
                .collect(),
        }
    }

    /// Disjunctive normal form: one gene list per alternative enzyme.
    ///
    /// Genes repeated within a clause and repeated clauses are removed.
    pub fn to_dnf(&self) -> Vec<Vec<String>> {
        match self {
            GprExpr::Gene(id) => vec![vec![id.clone()]],
            GprExpr::Or(operands) => operands
                .iter()
                .flat_map(GprExpr::to_dnf)
                .unique()
                .collect(),
            GprExpr::And(operands) => operands
                .iter()
                .map(|operand| operand.to_dnf().into_iter())
                .multi_cartesian_product()
                .map(|combination| {
                    combination
                        .into_iter()
                        .flatten()
                        .unique()
                        .collect::<Vec<_>>()
                })
                .unique()
                .collect(),
        }
    }

    fn write_operand(
        f: &mut Formatter<'_>,
        operand: &GprExpr,
        parent_is_and: bool,
    ) -> std::fmt::Result {
        let needs_parentheses = match operand {
            GprExpr::Gene(_) => false,
            GprExpr::And(_) => !parent_is_and,
            GprExpr::Or(_) => parent_is_and,
        };
        if needs_parentheses {
            write!(f, "({operand})")
        } else {
            write!(f, "{operand}")
        }
    }
}

impl Display for GprExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (operands, separator, is_and) = match self {
            GprExpr::Gene(id) => return write!(f, "{id}"),
            GprExpr::And(operands) => (operands, " and ", true),
            GprExpr::Or(operands) => (operands, " or ", false),
        };

        for (index, operand) in operands.iter().enumerate() {
            if index > 0 {
                write!(f, "{separator}")?;
            }
            Self::write_operand(f, operand, is_and)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Gene(String),
}

fn tokenize(text: &str) -> Vec<(Token, usize)> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' | '[' => tokens.push((Token::Open, position)),
            ')' | ']' => tokens.push((Token::Close, position)),
            _ => {
                let mut word = String::from(c);
                while let Some((_, next)) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | '[' | ']') {
                        break;
                    }
                    word.push(*next);
                    chars.next();
                }

                let token = match word.to_lowercase().as_str() {
                    "and" | "&" | "&&" => Token::And,
                    "or" | "|" | "||" => Token::Or,
                    _ => Token::Gene(word),
                };
                tokens.push((token, position));
            }
        }
    }

    tokens
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn bump(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn unexpected(token: Token, position: usize) -> GprError {
        let token = match token {
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::And => "and".to_string(),
            Token::Or => "or".to_string(),
            Token::Gene(id) => id,
        };
        GprError::UnexpectedToken { token, position }
    }

    fn disjunction(&mut self) -> Result<GprExpr, GprError> {
        let mut operands = vec![self.conjunction()?];
        while self.peek() == Some(&Token::Or) {
            self.bump();
            operands.push(self.conjunction()?);
        }
        Ok(GprExpr::or(operands))
    }

    fn conjunction(&mut self) -> Result<GprExpr, GprError> {
        let mut operands = vec![self.operand()?];
        while self.peek() == Some(&Token::And) {
            self.bump();
            operands.push(self.operand()?);
        }
        Ok(GprExpr::and(operands))
    }

    fn operand(&mut self) -> Result<GprExpr, GprError> {
        match self.bump() {
            Some((Token::Gene(id), _)) => Ok(GprExpr::Gene(id)),
            Some((Token::Open, _)) => {
                let inner = self.disjunction()?;
                match self.bump() {
                    Some((Token::Close, _)) => Ok(inner),
                    _ => Err(GprError::UnbalancedParentheses),
                }
            }
            Some((token, position)) => Err(Self::unexpected(token, position)),
            None => Err(GprError::UnexpectedEnd),
        }
    }
}

/// Parses a textual gene association.
///
/// Operators are case-insensitive (`and`/`AND`/`&&`, `or`/`OR`/`||`) and square
/// brackets are accepted as parentheses.
pub fn parse_gpr(text: &str) -> Result<GprExpr, GprError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(GprError::Empty);
    }

    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let expr = parser.disjunction()?;

    match parser.bump() {
        None => Ok(expr),
        Some((Token::Close, _)) => Err(GprError::UnbalancedParentheses),
        Some((token, position)) => Err(Parser::unexpected(token, position)),
    }
}
