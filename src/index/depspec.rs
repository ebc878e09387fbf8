// src/index/depspec.rs

//! Dependency string grammar
//!
//! apk writes provides/depends/install-if entries as `name[<op><version>]`,
//! e.g. `so:libc.musl-x86_64.so.1`, `cmd:sh=1.36.1-r2` or `python>=3.12`.
//! The same split is used when storing provides and when looking names up,
//! so both sides always agree on what the name is.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a dependency string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepOp {
    /// `><`
    Between,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `~=`
    FuzzyEqual,
    /// `=~`
    EqualFuzzy,
    /// `=`
    Equal,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `~`
    Fuzzy,
}

impl DepOp {
    /// Scan order: every operator comes before any operator that is a
    /// substring of it.
    pub const SCAN_ORDER: [DepOp; 9] = [
        DepOp::Between,
        DepOp::GreaterOrEqual,
        DepOp::LessOrEqual,
        DepOp::FuzzyEqual,
        DepOp::EqualFuzzy,
        DepOp::Equal,
        DepOp::Greater,
        DepOp::Less,
        DepOp::Fuzzy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepOp::Between => "><",
            DepOp::GreaterOrEqual => ">=",
            DepOp::LessOrEqual => "<=",
            DepOp::FuzzyEqual => "~=",
            DepOp::EqualFuzzy => "=~",
            DepOp::Equal => "=",
            DepOp::Greater => ">",
            DepOp::Less => "<",
            DepOp::Fuzzy => "~",
        }
    }
}

impl fmt::Display for DepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DepOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for DepOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DepOp::SCAN_ORDER
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("Invalid dependency operator: {s}"))
    }
}

/// A parsed `name[<op><version>]` token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DepSpec {
    pub name: String,
    pub op: Option<DepOp>,
    pub version: Option<String>,
}

impl DepSpec {
    /// Parse a token
    ///
    /// Never fails: a token without an operator, or one whose name part
    /// would be empty, becomes a name-only spec.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();

        for op in DepOp::SCAN_ORDER {
            if let Some((name, version)) = token.split_once(op.as_str()) {
                if name.is_empty() {
                    break;
                }
                return Self {
                    name: name.to_string(),
                    op: Some(op),
                    version: Some(version.to_string()),
                };
            }
        }

        Self::name_only(token)
    }

    pub fn name_only(name: &str) -> Self {
        Self {
            name: name.to_string(),
            op: None,
            version: None,
        }
    }
}

impl fmt::Display for DepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(op) = self.op {
            write!(f, "{op}")?;
        }
        if let Some(version) = &self.version {
            f.write_str(version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, op: Option<DepOp>, version: Option<&str>) -> DepSpec {
        DepSpec {
            name: name.to_string(),
            op,
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_with_operator() {
        assert_eq!(
            DepSpec::parse("foo>=1.2.3"),
            spec("foo", Some(DepOp::GreaterOrEqual), Some("1.2.3"))
        );
        assert_eq!(
            DepSpec::parse("cmd:sh=1.36.1-r2"),
            spec("cmd:sh", Some(DepOp::Equal), Some("1.36.1-r2"))
        );
        assert_eq!(
            DepSpec::parse("bar<2"),
            spec("bar", Some(DepOp::Less), Some("2"))
        );
    }

    #[test]
    fn test_parse_name_only() {
        assert_eq!(DepSpec::parse("foo"), spec("foo", None, None));
        assert_eq!(
            DepSpec::parse("so:libc.musl-x86_64.so.1"),
            spec("so:libc.musl-x86_64.so.1", None, None)
        );
    }

    #[test]
    fn test_two_char_operator_wins_over_substring() {
        assert_eq!(
            DepSpec::parse("foo><1.0"),
            spec("foo", Some(DepOp::Between), Some("1.0"))
        );
        assert_eq!(
            DepSpec::parse("foo~=1.0"),
            spec("foo", Some(DepOp::FuzzyEqual), Some("1.0"))
        );
        assert_eq!(
            DepSpec::parse("foo=~1.0"),
            spec("foo", Some(DepOp::EqualFuzzy), Some("1.0"))
        );
        assert_eq!(
            DepSpec::parse("foo<=1.0"),
            spec("foo", Some(DepOp::LessOrEqual), Some("1.0"))
        );
    }

    #[test]
    fn test_malformed_degrades_to_name() {
        assert_eq!(DepSpec::parse("=1.0"), spec("=1.0", None, None));
        assert_eq!(DepSpec::parse(""), spec("", None, None));
    }

    #[test]
    fn test_conflict_marker_stays_in_name() {
        assert_eq!(DepSpec::parse("!foo"), spec("!foo", None, None));
    }

    #[test]
    fn test_display_round_trips_token() {
        for token in ["foo>=1.2.3", "foo", "so:libfoo.so.1=1"] {
            assert_eq!(DepSpec::parse(token).to_string(), token);
        }
    }

    #[test]
    fn test_op_from_str() {
        assert_eq!("><".parse::<DepOp>().unwrap(), DepOp::Between);
        assert!("!=".parse::<DepOp>().is_err());
    }
}
