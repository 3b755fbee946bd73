//! Condition expression parsing.
//!
//! Grammar, highest to lowest precedence: `!` negates a single name,
//! space-separated names form an AND-chain, comma-separated AND-chains form
//! an OR-chain. `!draft,web production` parses to
//! `Or(Not(draft), And(web, production))`.

use std::collections::HashSet;
use std::fmt;

/// A boolean formula over named visibility flags.
///
/// NOT binds tighter than AND, AND tighter than OR. The parser produces
/// right-leaning `And`/`Or` chains; [`fmt::Display`] prints the canonical
/// text form, so parsing the printed form yields the same tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    /// A bare condition name.
    Name(String),
    /// Negation of a single name.
    Not(Box<ConditionExpr>),
    /// Both operands must hold.
    And(Box<ConditionExpr>, Box<ConditionExpr>),
    /// Either operand must hold.
    Or(Box<ConditionExpr>, Box<ConditionExpr>),
}

/// Condition expression syntax error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionParseError {
    #[error("empty condition expression")]
    Empty,
    #[error("empty condition after NOT operator")]
    EmptyNegation,
    #[error("invalid condition name: {0}")]
    InvalidName(String),
}

impl ConditionExpr {
    /// Parse a condition expression.
    ///
    /// Splits on `,` for OR operands, then on whitespace for AND operands,
    /// then strips a leading `!` per atom. Names must match
    /// `[A-Za-z_][A-Za-z0-9_-]*`.
    ///
    /// # Example
    ///
    /// ```
    /// use mdpp_core::ConditionExpr;
    ///
    /// let expr = ConditionExpr::parse("!internal,web").unwrap();
    /// assert_eq!(expr.to_string(), "!internal,web");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ConditionParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConditionParseError::Empty);
        }

        let mut or_operands = Vec::new();
        for chain in input.split(',') {
            let chain = chain.trim();
            if chain.is_empty() {
                return Err(ConditionParseError::Empty);
            }

            let mut and_operands = Vec::new();
            for atom in chain.split_whitespace() {
                and_operands.push(Self::parse_atom(atom)?);
            }
            or_operands.push(
                combine(and_operands, |l, r| Self::And(Box::new(l), Box::new(r)))
                    .ok_or(ConditionParseError::Empty)?,
            );
        }

        combine(or_operands, |l, r| Self::Or(Box::new(l), Box::new(r)))
            .ok_or(ConditionParseError::Empty)
    }

    fn parse_atom(atom: &str) -> Result<Self, ConditionParseError> {
        if let Some(name) = atom.strip_prefix('!') {
            if name.is_empty() {
                return Err(ConditionParseError::EmptyNegation);
            }
            Ok(Self::Not(Box::new(Self::parse_name(name)?)))
        } else {
            Self::parse_name(atom)
        }
    }

    fn parse_name(name: &str) -> Result<Self, ConditionParseError> {
        if is_valid_name(name) {
            Ok(Self::Name(name.to_owned()))
        } else {
            Err(ConditionParseError::InvalidName(name.to_owned()))
        }
    }

    /// Evaluate against an externally supplied set of visible condition names.
    ///
    /// Which names are visible for a build target is decided outside this
    /// core; this only applies the formula.
    #[must_use]
    pub fn evaluate(&self, visible: &HashSet<String>) -> bool {
        match self {
            Self::Name(name) => visible.contains(name),
            Self::Not(inner) => !inner.evaluate(visible),
            Self::And(left, right) => left.evaluate(visible) && right.evaluate(visible),
            Self::Or(left, right) => left.evaluate(visible) || right.evaluate(visible),
        }
    }
}

/// Fold operands into a right-leaning chain; `None` when empty.
fn combine<F>(operands: Vec<ConditionExpr>, mut join: F) -> Option<ConditionExpr>
where
    F: FnMut(ConditionExpr, ConditionExpr) -> ConditionExpr,
{
    operands.into_iter().rev().reduce(|acc, e| join(e, acc))
}

/// Check a condition name: alphanumeric, hyphen, underscore, not starting
/// with a digit or hyphen.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::And(left, right) => write!(f, "{left} {right}"),
            Self::Or(left, right) => write!(f, "{left},{right}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> ConditionExpr {
        ConditionExpr::Name(s.to_owned())
    }

    fn not(e: ConditionExpr) -> ConditionExpr {
        ConditionExpr::Not(Box::new(e))
    }

    fn and(l: ConditionExpr, r: ConditionExpr) -> ConditionExpr {
        ConditionExpr::And(Box::new(l), Box::new(r))
    }

    fn or(l: ConditionExpr, r: ConditionExpr) -> ConditionExpr {
        ConditionExpr::Or(Box::new(l), Box::new(r))
    }

    #[test]
    fn test_single_name() {
        assert_eq!(ConditionExpr::parse("web").unwrap(), name("web"));
    }

    #[test]
    fn test_negation() {
        assert_eq!(ConditionExpr::parse("!draft").unwrap(), not(name("draft")));
    }

    #[test]
    fn test_and_chain() {
        assert_eq!(
            ConditionExpr::parse("web production").unwrap(),
            and(name("web"), name("production"))
        );
    }

    #[test]
    fn test_and_chain_is_right_leaning() {
        assert_eq!(
            ConditionExpr::parse("a b c").unwrap(),
            and(name("a"), and(name("b"), name("c")))
        );
    }

    #[test]
    fn test_or_of_not_and_and() {
        assert_eq!(
            ConditionExpr::parse("!draft,web production").unwrap(),
            or(not(name("draft")), and(name("web"), name("production")))
        );
    }

    #[test]
    fn test_or_of_not_and_name() {
        assert_eq!(
            ConditionExpr::parse("!internal,web").unwrap(),
            or(not(name("internal")), name("web"))
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(
            ConditionExpr::parse("  "),
            Err(ConditionParseError::Empty)
        );
    }

    #[test]
    fn test_empty_or_operand() {
        assert_eq!(
            ConditionExpr::parse("web,"),
            Err(ConditionParseError::Empty)
        );
    }

    #[test]
    fn test_bare_not() {
        assert_eq!(
            ConditionExpr::parse("!"),
            Err(ConditionParseError::EmptyNegation)
        );
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(
            ConditionExpr::parse("web$"),
            Err(ConditionParseError::InvalidName("web$".to_owned()))
        );
        assert_eq!(
            ConditionExpr::parse("9lives"),
            Err(ConditionParseError::InvalidName("9lives".to_owned()))
        );
    }

    #[test]
    fn test_hyphen_and_underscore_names() {
        assert!(ConditionExpr::parse("print-only _beta").is_ok());
    }

    #[test]
    fn test_round_trip_stability() {
        for input in [
            "web",
            "!draft",
            "web production",
            "!draft,web production",
            "a b c,d !e,f",
            "!internal,web",
        ] {
            let parsed = ConditionExpr::parse(input).unwrap();
            let printed = parsed.to_string();
            let reparsed = ConditionExpr::parse(&printed).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {input:?}");
        }
    }

    #[test]
    fn test_evaluate() {
        let visible: HashSet<String> =
            ["web".to_owned(), "production".to_owned()].into_iter().collect();

        let expr = ConditionExpr::parse("!draft,web production").unwrap();
        assert!(expr.evaluate(&visible));

        let expr = ConditionExpr::parse("draft internal").unwrap();
        assert!(!expr.evaluate(&visible));

        let expr = ConditionExpr::parse("!web").unwrap();
        assert!(!expr.evaluate(&visible));
    }
}
