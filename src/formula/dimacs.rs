use crate::formula::{Clause, Formula, InvalidLiteral, Literal};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, BufReader, Read};

pub fn parse<R: Read>(reader: R) -> Result<Formula, DimacsParseError> {
    let reader = BufReader::new(reader);

    let mut clauses = vec![];
    let mut num_clauses = None;
    let mut clause = vec![];

    for line in reader.lines() {
        let line = line?;
        let mut line = line.split_whitespace().peekable();

        match line.peek() {
            Some(&"c") | None => continue,
            Some(&"p") => {
                let _ = line.next();

                if line.next() != Some("cnf") {
                    return Err(DimacsParseError::Format("missing 'cnf'".into()));
                }

                let _num_variables = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_variables".into()))?;

                num_clauses = Some(
                    line.next()
                        .and_then(|c| c.parse::<usize>().ok())
                        .ok_or_else(|| DimacsParseError::Format("invalid num_clauses".into()))?,
                );
            }
            Some(_) => {
                let expected = num_clauses
                    .ok_or_else(|| DimacsParseError::Format("missing 'p' line before clauses".into()))?;

                // a clause may span lines; it ends at its terminating 0
                for x in line {
                    match parse_literal(x)? {
                        Some(l) => clause.push(l),
                        None => clauses.push(Clause::new(clause.drain(..))),
                    }
                }

                if clauses.len() >= expected {
                    break;
                }
            }
        }
    }

    if num_clauses.is_none() {
        return Err(DimacsParseError::Format("missing 'p' line before clauses".into()));
    }
    if !clause.is_empty() {
        clauses.push(Clause::new(clause));
    }

    Ok(Formula::new(clauses))
}

fn parse_literal(s: &str) -> Result<Option<Literal>, DimacsParseError> {
    let l = s
        .parse::<i32>()
        .map_err(|_| DimacsParseError::Format(format!("invalid literal '{}'", s)))?;
    match Literal::try_from(l) {
        Ok(l) => Ok(Some(l)),
        Err(InvalidLiteral::Zero) => Ok(None),
        Err(InvalidLiteral::OutOfRange) => {
            Err(DimacsParseError::Format(format!("literal out of range '{}'", s)))
        }
    }
}

#[derive(Debug)]
pub enum DimacsParseError {
    Io(std::io::Error),
    Format(String),
}

impl From<std::io::Error> for DimacsParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Display for DimacsParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DimacsParseError::Io(e) => write!(f, "io error: {}", e),
            DimacsParseError::Format(msg) => write!(f, "format error: {}", msg),
        }
    }
}

impl std::error::Error for DimacsParseError {}
