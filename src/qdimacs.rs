//! Line-oriented parser for the QDIMACS input format
//! (<https://www.qbflib.org/qdimacs.html>).
//!
//! Comment lines are skipped wholesale, the header and every
//! quantifier line must be complete on their line, and clause lines
//! hold one or more `0`-terminated clauses. Diagnostics carry the
//! span of the offending token.

use crate::{
    literal::{Lit, Var},
    QuantTy,
};
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// A [`ParseError`] bundled with the raw input, for rendering the
/// error span against the source.
#[derive(Debug, Error, Diagnostic)]
#[error("the input is not valid QDIMACS")]
#[diagnostic()]
pub struct ExtendedParseError {
    #[source_code]
    pub source_code: Vec<u8>,

    #[related]
    pub related: Vec<ParseError>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("missing `p cnf` header line")]
    MissingHeader,

    #[error("malformed header: {reason}")]
    #[diagnostic()]
    InvalidHeader {
        reason: HeaderError,

        #[label]
        span: SourceSpan,
    },

    #[error("unexpected token")]
    #[diagnostic()]
    UnexpectedToken {
        #[label]
        span: SourceSpan,
    },

    #[error("token is not a valid integer")]
    InvalidInt {
        #[label]
        span: SourceSpan,
    },

    #[error("variable {val} is outside the supported range")]
    VariableOutOfBound {
        val: i64,

        #[label]
        span: SourceSpan,
    },

    #[error("literal {val} is outside the supported range")]
    LiteralOutOfBound {
        val: i64,

        #[label]
        span: SourceSpan,
    },

    #[error("line is not terminated by `0`")]
    MissingTerminator {
        #[label]
        span: SourceSpan,
    },

    #[error("header declares {expected} clauses, but the matrix holds {found}")]
    NumClausesMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Error, Diagnostic)]
pub enum HeaderError {
    #[error("the line does not start with `p cnf`")]
    InvalidPrefix,

    #[error("the variable count is not a nonnegative integer")]
    InvalidVariableCount,

    #[error("the clause count is not a nonnegative integer")]
    InvalidClauseCount,
}

/// Sink for the parsed representation: the parser feeds header
/// counts, quantifier blocks, and clauses into any implementor.
pub trait FromQdimacs: Default {
    fn set_num_variables(&mut self, variables: u32);
    fn set_num_clauses(&mut self, clauses: u32);
    fn quantify(&mut self, quant: QuantTy, vars: &[Var]);
    fn add_clause(&mut self, lits: &[Lit]);
}

/// A whitespace-delimited token together with its byte offset in the
/// input, the unit of error reporting.
#[derive(Debug, Clone, Copy)]
struct Token<'i> {
    offset: usize,
    bytes: &'i [u8],
}

impl Token<'_> {
    fn span(&self) -> SourceSpan {
        (self.offset..self.offset + self.bytes.len()).into()
    }

    fn to_int(&self) -> Result<i64, ParseError> {
        std::str::from_utf8(self.bytes)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or(ParseError::InvalidInt { span: self.span() })
    }
}

/// Splits one input line into its tokens.
#[derive(Debug)]
struct Tokens<'i> {
    line: &'i [u8],
    base: usize,
    pos: usize,
}

impl<'i> Iterator for Tokens<'i> {
    type Item = Token<'i>;

    fn next(&mut self) -> Option<Token<'i>> {
        while self.pos < self.line.len() && self.line[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.line.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.line.len() && !self.line[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(Token { offset: self.base + start, bytes: &self.line[start..self.pos] })
    }
}

#[derive(Debug)]
pub struct QdimacsParser<'i> {
    input: &'i [u8],
    header_seen: bool,
    in_matrix: bool,
    num_clauses: u32,
    num_clauses_read: u32,
}

impl<'i> QdimacsParser<'i> {
    pub fn new(input: &'i [u8]) -> Self {
        Self { input, header_seen: false, in_matrix: false, num_clauses: 0, num_clauses_read: 0 }
    }

    /// Parses the QDIMACS input and returns the representation `Q`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the input is not valid QDIMACS.
    pub fn parse<Q: FromQdimacs>(&mut self) -> Result<Q, ParseError> {
        let mut result = Q::default();
        let input = self.input;
        let mut offset = 0;
        for line in input.split(|&byte| byte == b'\n') {
            let base = offset;
            offset += line.len() + 1;
            self.parse_line(line, base, &mut result)?;
        }

        if !self.header_seen {
            return Err(ParseError::MissingHeader);
        }
        // check that number of clauses match the header
        if self.num_clauses_read != self.num_clauses {
            return Err(ParseError::NumClausesMismatch {
                expected: self.num_clauses,
                found: self.num_clauses_read,
            });
        }

        Ok(result)
    }

    /// Dispatches one line on its first token: comment, header,
    /// quantifier line, or clause line. Blank lines are skipped.
    fn parse_line<Q: FromQdimacs>(
        &mut self,
        line: &[u8],
        base: usize,
        result: &mut Q,
    ) -> Result<(), ParseError> {
        let mut tokens = Tokens { line, base, pos: 0 };
        let Some(first) = tokens.next() else {
            return Ok(());
        };
        match first.bytes[0] {
            b'c' => Ok(()),
            b'p' => self.parse_header(first, tokens, result),
            b'a' | b'e' if first.bytes.len() == 1 => self.parse_prefix_line(first, tokens, result),
            b'-' | b'0'..=b'9' => self.parse_clause_line(first, tokens, result),
            _ => Err(ParseError::UnexpectedToken { span: first.span() }),
        }
    }

    /// `p cnf [NUM_VARIABLES] [NUM_CLAUSES]`
    fn parse_header<Q: FromQdimacs>(
        &mut self,
        first: Token<'_>,
        mut tokens: Tokens<'_>,
        result: &mut Q,
    ) -> Result<(), ParseError> {
        if self.header_seen {
            return Err(ParseError::UnexpectedToken { span: first.span() });
        }
        if first.bytes != b"p" {
            return Err(ParseError::InvalidHeader {
                reason: HeaderError::InvalidPrefix,
                span: first.span(),
            });
        }
        match tokens.next() {
            Some(tag) if tag.bytes == b"cnf" => {}
            Some(tag) => {
                return Err(ParseError::InvalidHeader {
                    reason: HeaderError::InvalidPrefix,
                    span: tag.span(),
                })
            }
            None => {
                return Err(ParseError::InvalidHeader {
                    reason: HeaderError::InvalidPrefix,
                    span: first.span(),
                })
            }
        }
        let num_variables = header_count(tokens.next(), first, HeaderError::InvalidVariableCount)?;
        let num_clauses = header_count(tokens.next(), first, HeaderError::InvalidClauseCount)?;
        if let Some(extra) = tokens.next() {
            return Err(ParseError::UnexpectedToken { span: extra.span() });
        }

        self.header_seen = true;
        self.num_clauses = num_clauses;
        result.set_num_variables(num_variables);
        result.set_num_clauses(num_clauses);
        Ok(())
    }

    /// Either `e ...` or `a ...`, terminated by `0`.
    fn parse_prefix_line<Q: FromQdimacs>(
        &mut self,
        quant_token: Token<'_>,
        mut tokens: Tokens<'_>,
        result: &mut Q,
    ) -> Result<(), ParseError> {
        if !self.header_seen {
            return Err(ParseError::MissingHeader);
        }
        if self.in_matrix {
            // the quantifier prefix precedes the matrix
            return Err(ParseError::UnexpectedToken { span: quant_token.span() });
        }
        let quant = match quant_token.bytes {
            b"a" => QuantTy::Forall,
            b"e" => QuantTy::Exists,
            _ => unreachable!("the caller dispatched on the quantifier byte"),
        };
        let mut vars = Vec::new();
        let mut last = quant_token;
        loop {
            let Some(token) = tokens.next() else {
                return Err(ParseError::MissingTerminator { span: last.span() });
            };
            last = token;
            let value = token.to_int()?;
            if value == 0 {
                break;
            }
            if !(1..=i64::from(Var::MAX_VAR.to_dimacs())).contains(&value) {
                return Err(ParseError::VariableOutOfBound { val: value, span: token.span() });
            }
            vars.push(Var::from_dimacs(value.try_into().unwrap()));
        }
        if let Some(extra) = tokens.next() {
            return Err(ParseError::UnexpectedToken { span: extra.span() });
        }
        result.quantify(quant, &vars);
        Ok(())
    }

    /// One or more `0`-terminated clauses on a single line.
    fn parse_clause_line<'t, Q: FromQdimacs>(
        &mut self,
        first: Token<'t>,
        tokens: Tokens<'t>,
        result: &mut Q,
    ) -> Result<(), ParseError> {
        if !self.header_seen {
            return Err(ParseError::MissingHeader);
        }
        self.in_matrix = true;
        let mut clause = Vec::new();
        let mut last = first;
        let mut terminated = true;
        for token in std::iter::once(first).chain(tokens) {
            last = token;
            let value = token.to_int()?;
            if value == 0 {
                result.add_clause(&clause);
                self.num_clauses_read += 1;
                clause.clear();
                terminated = true;
                continue;
            }
            let bounds = i64::from(Lit::MIN_LIT.to_dimacs())..=i64::from(Lit::MAX_LIT.to_dimacs());
            if !bounds.contains(&value) {
                return Err(ParseError::LiteralOutOfBound { val: value, span: token.span() });
            }
            clause.push(Lit::from_dimacs(value.try_into().unwrap()));
            terminated = false;
        }
        if !terminated {
            return Err(ParseError::MissingTerminator { span: last.span() });
        }
        Ok(())
    }
}

fn header_count(
    token: Option<Token<'_>>,
    line: Token<'_>,
    reason: HeaderError,
) -> Result<u32, ParseError> {
    let Some(token) = token else {
        return Err(ParseError::InvalidHeader { reason, span: line.span() });
    };
    token
        .to_int()
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or(ParseError::InvalidHeader { reason, span: token.span() })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::Spec;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn doesnt_crash(s in ".*") {
            let _spec: Option<Spec> = QdimacsParser::new(s.as_bytes()).parse().ok();
        }

        #[test]
        fn roundtrip_from_spec(input in crate::spec::strategy::spec(0..5usize, 0..5usize, 0..20usize, 1..6usize)) {
            let qdimacs = format!("{input}");
            let parsed: Spec = QdimacsParser::new(qdimacs.as_bytes()).parse()?;
            assert_eq!(parsed, input);
        }
    }

    macro_rules! expect_error {
        ( $input:expr, $pat:pat ) => {
            match QdimacsParser::new(&$input[..]).parse::<Spec>() {
                Ok(parsed) => panic!("Expected error but got {:?}", parsed),
                Err(err) => match err {
                    $pat => (),
                    _ => panic!("Unexpected error {:?}", err),
                },
            }
        };
    }

    #[test]
    fn minimal() -> Result<(), ParseError> {
        let spec: Spec = QdimacsParser::new(b"p cnf 0 0").parse()?;
        println!("{spec}");
        Ok(())
    }

    #[test]
    fn no_matrix() -> Result<(), ParseError> {
        let qdimacs = b"p cnf 10 0\na 1 2 3 0\ne 4 5 6 0\n";
        let spec: Spec = QdimacsParser::new(qdimacs).parse()?;
        println!("{spec}");
        Ok(())
    }

    #[test]
    fn no_prefix() -> Result<(), ParseError> {
        let qdimacs = b"p cnf 10 2\n1 2 3 0\n4 5 6 0\n";
        let spec: Spec = QdimacsParser::new(qdimacs).parse()?;
        println!("{spec}");
        Ok(())
    }

    #[test]
    fn simple() -> Result<(), ParseError> {
        let qdimacs = "
		c forced.qdimacs
		p cnf 3 4
		a 1 0
		c inner comments are tolerated
		e 2 3 0
		-1 2 -3 0
		2 3 0
		-2 3 0
		1 3 0
		";
        let spec: Spec = QdimacsParser::new(qdimacs.as_bytes()).parse()?;
        println!("{spec}");
        Ok(())
    }

    #[test]
    fn blank_lines_and_whitespace() -> Result<(), ParseError> {
        let qdimacs = b"p cnf   3  2\n\n\na 1 0\n\ne 2   3 0\n  1   -2 0\n\n-1 3 0\n\n";
        let spec: Spec = QdimacsParser::new(qdimacs).parse()?;
        assert_eq!(spec.matrix().len(), 2);
        Ok(())
    }

    #[test]
    fn several_clauses_on_one_line() -> Result<(), ParseError> {
        let qdimacs = b"p cnf 2 2\na 1 0\ne 2 0\n1 2 0 -1 -2 0\n";
        let spec: Spec = QdimacsParser::new(qdimacs).parse()?;
        assert_eq!(spec.matrix().len(), 2);
        Ok(())
    }

    #[test]
    fn missing_header() {
        expect_error!(b"", ParseError::MissingHeader);
        expect_error!(b"c comment\nc comments\n\n", ParseError::MissingHeader);
        expect_error!(b"a 1 0\np cnf 1 0", ParseError::MissingHeader);
        expect_error!(b"1 2 0\np cnf 2 1", ParseError::MissingHeader);
    }

    #[test]
    fn out_of_bound() {
        // i32::MAX = 2147483647 is the largest representable literal
        // i32::MIN = -2147483648 is not a valid literal
        expect_error!(b"p cnf 0 0\n1 2147483648 3 0", ParseError::LiteralOutOfBound { .. });
        expect_error!(b"p cnf 0 0\n1 -2147483648 3 0", ParseError::LiteralOutOfBound { .. });
    }

    #[test]
    fn unterminated_lines() {
        expect_error!(b"p cnf 3 2\n1 2 3 0\n-1 2 3", ParseError::MissingTerminator { .. });
        expect_error!(b"p cnf 3 0\ne 1 2 3\n", ParseError::MissingTerminator { .. });
    }

    #[test]
    fn prefix_after_matrix() {
        expect_error!(b"p cnf 2 1\na 1 0\n1 2 0\ne 2 0\n", ParseError::UnexpectedToken { .. });
    }

    #[test]
    fn trailing_tokens() {
        expect_error!(b"p cnf 2 0\ne 1 0 2\n", ParseError::UnexpectedToken { .. });
        expect_error!(b"p cnf 2 0 extra\n", ParseError::UnexpectedToken { .. });
    }

    #[test]
    fn header() -> Result<(), ParseError> {
        let _spec: Spec = QdimacsParser::new(b"p cnf     10      0").parse()?;

        expect_error!(
            b"p dnf 2 2",
            ParseError::InvalidHeader { reason: HeaderError::InvalidPrefix, .. }
        );
        expect_error!(
            b"pcnf 2 2",
            ParseError::InvalidHeader { reason: HeaderError::InvalidPrefix, .. }
        );
        expect_error!(
            b"p cnf -2 2",
            ParseError::InvalidHeader { reason: HeaderError::InvalidVariableCount, .. }
        );
        expect_error!(
            b"p cnf 2 -2",
            ParseError::InvalidHeader { reason: HeaderError::InvalidClauseCount, .. }
        );
        Ok(())
    }

    #[test]
    fn num_clauses() {
        expect_error!(
            b"p cnf 3 2\n1 -2 0\n2 -3 0\n3 -1 0\n",
            ParseError::NumClausesMismatch { expected: 2, found: 3 }
        );
    }
}
