// src/version/mod.rs

//! Version ordering for apk package versions
//!
//! apk versions look like `1.2.3b_rc2_p1-r4`: dotted numbers, an optional
//! letter, any number of `_suffix[N]` parts and an optional `-rN` revision.
//! Pre-release suffixes sort before the plain release, post-release
//! suffixes after it.

use std::cmp::Ordering;

/// Comparison primitive used when ranking providers
pub trait VersionCompare {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// apk ordering, falling back to byte order for unparseable input
#[derive(Debug, Clone, Copy, Default)]
pub struct ApkVersionOrder;

impl VersionCompare for ApkVersionOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (ApkVersion::parse(a), ApkVersion::parse(b)) {
            (Some(va), Some(vb)) => va.cmp(&vb),
            _ => a.cmp(b),
        }
    }
}

/// Release suffix; declaration order is sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Suffix {
    Alpha,
    Beta,
    Pre,
    Rc,
    /// Stand-in for "no more suffixes" when comparing suffix lists
    Release,
    Cvs,
    Svn,
    Git,
    Hg,
    P,
}

impl Suffix {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "alpha" => Suffix::Alpha,
            "beta" => Suffix::Beta,
            "pre" => Suffix::Pre,
            "rc" => Suffix::Rc,
            "cvs" => Suffix::Cvs,
            "svn" => Suffix::Svn,
            "git" => Suffix::Git,
            "hg" => Suffix::Hg,
            "p" => Suffix::P,
            _ => return None,
        })
    }
}

/// A parsed apk version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkVersion {
    numbers: Vec<u64>,
    letter: Option<char>,
    suffixes: Vec<(Suffix, u64)>,
    hash: Option<String>,
    revision: u64,
}

impl ApkVersion {
    /// Parse a version string, returning `None` if it is not apk-shaped
    pub fn parse(s: &str) -> Option<Self> {
        let (body, revision) = match s.rsplit_once("-r") {
            Some((body, rev)) => (body, rev.parse::<u64>().ok()?),
            None => (s, 0),
        };
        let (body, hash) = match body.split_once('~') {
            Some((body, hash)) if !hash.is_empty() => (body, Some(hash.to_string())),
            Some(_) => return None,
            None => (body, None),
        };

        let mut parts = body.split('_');
        let head = parts.next()?;

        let (digits, letter) = match head.chars().last() {
            Some(c) if c.is_ascii_lowercase() => (&head[..head.len() - 1], Some(c)),
            _ => (head, None),
        };
        let numbers = digits
            .split('.')
            .map(|n| n.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        let mut suffixes = Vec::new();
        for part in parts {
            let split = part
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(part.len());
            let (name, num) = part.split_at(split);
            let suffix = Suffix::parse(name)?;
            let num = if num.is_empty() { 0 } else { num.parse().ok()? };
            suffixes.push((suffix, num));
        }

        Some(Self {
            numbers,
            letter,
            suffixes,
            hash,
            revision,
        })
    }
}

impl Ord for ApkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec ordering already makes 1.2.1 > 1.2
        self.numbers
            .cmp(&other.numbers)
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| compare_suffixes(&self.suffixes, &other.suffixes))
            .then_with(|| self.hash.cmp(&other.hash))
            .then_with(|| self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for ApkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_suffixes(a: &[(Suffix, u64)], b: &[(Suffix, u64)]) -> Ordering {
    let len = a.len().max(b.len());
    let release = (Suffix::Release, 0);

    for i in 0..len {
        let sa = a.get(i).unwrap_or(&release);
        let sb = b.get(i).unwrap_or(&release);
        match sa.cmp(sb) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}
