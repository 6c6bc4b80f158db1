//! Expression parser
//!
//! Parses condition strings into `ConditionExpr` AST nodes.
//!
//! Supported syntax:
//! - Environment paths: `{user.role}`, `{tables}`
//! - Literals: `42`, `-3.5`, `'text'`, `"text"`, `true`, `false`, bare words
//! - Sequences: `['admin', 'analyst']`
//! - Comparisons: ` in `, ` contains `, `>=`, `<=`, `==`, `!=`, `>`, `<`
//! - Boolean operators: `||`, `&&`, `!` / `not `
//! - Parentheses for grouping
//!
//! Precedence, low to high: OR, AND, NOT, parenthesized group, comparison.
//! Splitting on `||`, `&&` and `,` is top-level only: the scanner tracks
//! nesting depth over `(`, `[`, `{` and skips separators inside quoted
//! strings.

use crate::error::{ParseError, Result};
use semgate_core::ast::{CompareOp, ConditionExpr, Operand};

/// Expression parser
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parse a condition expression from a string.
    pub fn parse(input: &str) -> Result<ConditionExpr> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression(
                "empty expression".to_string(),
            ));
        }
        Self::parse_expression(input)
    }

    fn parse_expression(input: &str) -> Result<ConditionExpr> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression(
                "empty sub-expression".to_string(),
            ));
        }

        // OR has the lowest precedence
        let parts = split_top_level(input, "||");
        if parts.len() > 1 {
            return Self::fold_binary(&parts, ConditionExpr::or);
        }

        let parts = split_top_level(input, "&&");
        if parts.len() > 1 {
            return Self::fold_binary(&parts, ConditionExpr::and);
        }

        // NOT binds looser than a comparison: !a == b negates the whole
        // comparison. Guard against consuming the '!' of '!='.
        if let Some(rest) = input.strip_prefix('!') {
            if !rest.starts_with('=') {
                return Ok(ConditionExpr::not(Self::parse_expression(rest)?));
            }
        }
        // input.get keeps the slice on a char boundary; a multi-byte
        // character straddling the prefix just means there is no "not "
        let not_prefixed = input
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("not "));
        if not_prefixed && input.len() > 4 {
            return Ok(ConditionExpr::not(Self::parse_expression(&input[4..])?));
        }

        // A single outer matched parenthesis pair is unwrapped
        if is_wrapped(input) {
            return Self::parse_expression(&input[1..input.len() - 1]);
        }

        if let Some((left, op, right)) = split_comparison(input) {
            return Ok(ConditionExpr::compare(
                Self::parse_operand(left)?,
                op,
                Self::parse_operand(right)?,
            ));
        }

        // No recognized comparison operator: bare true/false, else false
        Ok(ConditionExpr::Literal(input.eq_ignore_ascii_case("true")))
    }

    fn fold_binary(
        parts: &[&str],
        combine: fn(ConditionExpr, ConditionExpr) -> ConditionExpr,
    ) -> Result<ConditionExpr> {
        let mut iter = parts.iter();
        let first = iter
            .next()
            .ok_or_else(|| ParseError::InvalidExpression("empty operand list".to_string()))?;
        let mut expr = Self::parse_expression(first)?;
        for part in iter {
            expr = combine(expr, Self::parse_expression(part)?);
        }
        Ok(expr)
    }

    /// Parse one side of a comparison as a value.
    pub fn parse_operand(token: &str) -> Result<Operand> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseError::InvalidExpression("empty operand".to_string()));
        }

        // {path.to.value}
        if token.starts_with('{') && token.ends_with('}') && token.len() >= 2 {
            let inner = &token[1..token.len() - 1];
            let segments = inner.split('.').map(|s| s.trim().to_string()).collect();
            return Ok(Operand::Path(segments));
        }

        // [a, b, c]
        if token.starts_with('[') && token.ends_with(']') && token.len() >= 2 {
            let inner = token[1..token.len() - 1].trim();
            if inner.is_empty() {
                return Ok(Operand::List(Vec::new()));
            }
            let items = split_top_level(inner, ",")
                .iter()
                .map(|item| Self::parse_operand(item))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Operand::List(items));
        }

        // Quoted string literal
        for quote in ['\'', '"'] {
            if token.starts_with(quote) {
                if token.len() >= 2 && token.ends_with(quote) {
                    return Ok(Operand::String(token[1..token.len() - 1].to_string()));
                }
                return Err(ParseError::UnterminatedString(token.to_string()));
            }
        }

        if token.eq_ignore_ascii_case("true") {
            return Ok(Operand::Bool(true));
        }
        if token.eq_ignore_ascii_case("false") {
            return Ok(Operand::Bool(false));
        }

        if is_number_literal(token) {
            let n = token.parse::<f64>().map_err(|e| {
                ParseError::InvalidExpression(format!("bad number '{}': {}", token, e))
            })?;
            return Ok(Operand::Number(n));
        }

        // Anything else is a literal string token
        Ok(Operand::String(token.to_string()))
    }
}

/// Split on every top-level occurrence of `separator`, ignoring separators
/// nested inside `(`/`[`/`{` or quoted strings. Parts come back trimmed; a
/// string with no top-level separator yields itself as the single part.
pub fn split_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let bytes = input.as_bytes();
    let sep = separator.as_bytes();
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }

        if depth == 0 && bytes[i..].starts_with(sep) {
            parts.push(input[start..i].trim());
            i += sep.len();
            start = i;
            continue;
        }

        i += 1;
    }

    parts.push(input[start..].trim());
    parts
}

/// Byte offset of the first top-level occurrence of `token`, if any.
pub fn find_top_level(input: &str, token: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let tok = token.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }

        if depth == 0 && bytes[i..].starts_with(tok) {
            return Some(i);
        }

        i += 1;
    }

    None
}

/// Find the first comparison to split on. Operators are tried in the fixed
/// scan order (` in `, ` contains `, `>=`, `<=`, `==`, `!=`, `>`, `<`); the
/// first operator with a top-level occurrence wins, at its leftmost
/// position.
fn split_comparison(input: &str) -> Option<(&str, CompareOp, &str)> {
    for op in CompareOp::SCAN_ORDER {
        let token = op.token();
        if let Some(idx) = find_top_level(input, token) {
            let left = input[..idx].trim();
            let right = input[idx + token.len()..].trim();
            return Some((left, op, right));
        }
    }
    None
}

/// True when the input is a single matched outer parenthesis pair.
fn is_wrapped(input: &str) -> bool {
    if !(input.starts_with('(') && input.ends_with(')') && input.len() >= 2) {
        return false;
    }
    let bytes = input.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                // the opening paren closed before the end
                if depth == 0 && i != bytes.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn is_number_literal(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() {
        return false;
    }
    let mut halves = digits.splitn(2, '.');
    let int_part = halves.next().unwrap_or("");
    let frac_part = halves.next();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_respects_quotes() {
        // must not split inside the quoted string
        let parts = split_top_level("{user.permissions} contains 'x,y' && true", "&&");
        assert_eq!(parts, vec!["{user.permissions} contains 'x,y'", "true"]);

        let parts = split_top_level("'a && b' && c", "&&");
        assert_eq!(parts, vec!["'a && b'", "c"]);
    }

    #[test]
    fn test_split_top_level_respects_brackets() {
        let parts = split_top_level("[1, 2], 3, {a, b}", ",");
        assert_eq!(parts, vec!["[1, 2]", "3", "{a, b}"]);

        let parts = split_top_level("(a || b) || c", "||");
        assert_eq!(parts, vec!["(a || b)", "c"]);
    }

    #[test]
    fn test_operator_scan_order_in_before_eq() {
        // ` in ` is scanned before `==`, so the split point is at ` in `
        let expr = ExpressionParser::parse("a in [1,2] == true").unwrap();
        match expr {
            ConditionExpr::Compare { left, op, right } => {
                assert_eq!(op, CompareOp::In);
                assert_eq!(left, Operand::String("a".to_string()));
                // the remainder of the text is one raw operand token
                assert_eq!(right, Operand::String("[1,2] == true".to_string()));
            }
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_priority_le_before_gt() {
        let expr = ExpressionParser::parse("a > b <= c").unwrap();
        match expr {
            ConditionExpr::Compare { left, op, right } => {
                assert_eq!(op, CompareOp::Le);
                assert_eq!(left, Operand::String("a > b".to_string()));
                assert_eq!(right, Operand::String("c".to_string()));
            }
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_comparison() {
        let expr = ExpressionParser::parse("{user.role} == 'admin'").unwrap();
        assert_eq!(
            expr,
            ConditionExpr::compare(
                Operand::path(&["user", "role"]),
                CompareOp::Eq,
                Operand::string("admin"),
            )
        );
    }

    #[test]
    fn test_parse_membership() {
        let expr = ExpressionParser::parse("'users' in {tables}").unwrap();
        assert_eq!(
            expr,
            ConditionExpr::compare(
                Operand::string("users"),
                CompareOp::In,
                Operand::path(&["tables"]),
            )
        );
    }

    #[test]
    fn test_parse_list_literal() {
        let expr = ExpressionParser::parse("{user.role} in ['admin', 'analyst']").unwrap();
        match expr {
            ConditionExpr::Compare { right, .. } => {
                assert_eq!(
                    right,
                    Operand::List(vec![Operand::string("admin"), Operand::string("analyst")])
                );
            }
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_list() {
        let op = ExpressionParser::parse_operand("[[1, 2], 3]").unwrap();
        assert_eq!(
            op,
            Operand::List(vec![
                Operand::List(vec![Operand::Number(1.0), Operand::Number(2.0)]),
                Operand::Number(3.0),
            ])
        );
    }

    #[test]
    fn test_parse_number_literals() {
        assert_eq!(
            ExpressionParser::parse_operand("42").unwrap(),
            Operand::Number(42.0)
        );
        assert_eq!(
            ExpressionParser::parse_operand("-3.5").unwrap(),
            Operand::Number(-3.5)
        );
        assert_eq!(
            ExpressionParser::parse_operand("+7").unwrap(),
            Operand::Number(7.0)
        );
        // not numbers
        assert_eq!(
            ExpressionParser::parse_operand("1.2.3").unwrap(),
            Operand::String("1.2.3".to_string())
        );
        assert_eq!(
            ExpressionParser::parse_operand("3h").unwrap(),
            Operand::String("3h".to_string())
        );
    }

    #[test]
    fn test_parse_bool_and_bare_word() {
        assert_eq!(
            ExpressionParser::parse_operand("TRUE").unwrap(),
            Operand::Bool(true)
        );
        assert_eq!(
            ExpressionParser::parse_operand("admin").unwrap(),
            Operand::String("admin".to_string())
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(ExpressionParser::parse_operand("'oops").is_err());
    }

    #[test]
    fn test_boolean_precedence_or_lowest() {
        // a && b || c  parses as  (a && b) || c
        let expr = ExpressionParser::parse("true && false || true").unwrap();
        match expr {
            ConditionExpr::Or(left, right) => {
                assert!(matches!(*left, ConditionExpr::And(_, _)));
                assert_eq!(*right, ConditionExpr::Literal(true));
            }
            other => panic!("expected Or, got {:?}", other),
        }
    }

    #[test]
    fn test_not_forms() {
        let bang = ExpressionParser::parse("!true").unwrap();
        assert_eq!(bang, ConditionExpr::not(ConditionExpr::Literal(true)));

        let word = ExpressionParser::parse("not true").unwrap();
        assert_eq!(word, ConditionExpr::not(ConditionExpr::Literal(true)));
    }

    #[test]
    fn test_non_ascii_input_never_panics() {
        // the 4th byte falls inside '€' / 'ï'; the NOT-prefix scan must not
        // slice mid-character
        assert_eq!(
            ExpressionParser::parse("abc€").unwrap(),
            ConditionExpr::Literal(false)
        );

        let expr = ExpressionParser::parse("'naïve' == {column}").unwrap();
        assert_eq!(
            expr,
            ConditionExpr::compare(
                Operand::string("naïve"),
                CompareOp::Eq,
                Operand::path(&["column"]),
            )
        );

        assert_eq!(
            ExpressionParser::parse("not 'naïve' == {column}").unwrap(),
            ConditionExpr::not(expr)
        );
    }

    #[test]
    fn test_not_does_not_eat_ne_operator() {
        let expr = ExpressionParser::parse("{a} != 1").unwrap();
        assert!(matches!(
            expr,
            ConditionExpr::Compare {
                op: CompareOp::Ne,
                ..
            }
        ));
    }

    #[test]
    fn test_outer_parens_unwrapped() {
        let wrapped = ExpressionParser::parse("({user.role} == 'admin')").unwrap();
        let plain = ExpressionParser::parse("{user.role} == 'admin'").unwrap();
        assert_eq!(wrapped, plain);

        // (a) || (b) is not a single wrapped pair
        let expr = ExpressionParser::parse("(true) || (false)").unwrap();
        assert!(matches!(expr, ConditionExpr::Or(_, _)));
    }

    #[test]
    fn test_parens_group_boolean_operators() {
        // a && (b || c): the || inside parens must not be split at top level
        let expr = ExpressionParser::parse("true && (false || true)").unwrap();
        match expr {
            ConditionExpr::And(left, right) => {
                assert_eq!(*left, ConditionExpr::Literal(true));
                assert!(matches!(*right, ConditionExpr::Or(_, _)));
            }
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_text_literals() {
        assert_eq!(
            ExpressionParser::parse("true").unwrap(),
            ConditionExpr::Literal(true)
        );
        assert_eq!(
            ExpressionParser::parse("FALSE").unwrap(),
            ConditionExpr::Literal(false)
        );
        assert_eq!(
            ExpressionParser::parse("whatever").unwrap(),
            ConditionExpr::Literal(false)
        );
    }

    #[test]
    fn test_empty_expression_is_an_error() {
        assert!(ExpressionParser::parse("").is_err());
        assert!(ExpressionParser::parse("   ").is_err());
        assert!(ExpressionParser::parse("true && ").is_err());
    }
}
