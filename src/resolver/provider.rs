// src/resolver/provider.rs

//! Choosing between several packages that provide the same name

use crate::version::VersionCompare;
use serde::Serialize;
use std::cmp::Ordering;

/// Priority assumed for providers that do not declare one
pub const DEFAULT_PROVIDER_PRIORITY: i64 = -1;

/// A package that provides a requested name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCandidate {
    pub package_id: i64,
    pub name: String,
    pub repo: String,
    pub arch: String,
    /// Version declared on the provide entry itself
    pub provided_version: Option<String>,
    pub provider_priority: Option<i64>,
}

impl ProviderCandidate {
    fn priority(&self) -> i64 {
        self.provider_priority.unwrap_or(DEFAULT_PROVIDER_PRIORITY)
    }
}

/// Rank two candidates: provided version first, then provider priority
pub fn compare_candidates(
    a: &ProviderCandidate,
    b: &ProviderCandidate,
    order: &impl VersionCompare,
) -> Ordering {
    let by_version = match (&a.provided_version, &b.provided_version) {
        (Some(va), Some(vb)) => order.compare(va, vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    by_version.then_with(|| a.priority().cmp(&b.priority()))
}

/// Pick the best provider
///
/// On a full tie the earliest candidate wins, so the result only depends
/// on the input order.
pub fn select_provider<'a>(
    candidates: &'a [ProviderCandidate],
    order: &impl VersionCompare,
) -> Option<&'a ProviderCandidate> {
    let mut best: Option<&ProviderCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current)
                if compare_candidates(candidate, current, order) != Ordering::Greater => {}
            _ => best = Some(candidate),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ApkVersionOrder;

    fn candidate(id: i64, version: Option<&str>, priority: Option<i64>) -> ProviderCandidate {
        ProviderCandidate {
            package_id: id,
            name: format!("pkg{id}"),
            repo: "main".to_string(),
            arch: "x86_64".to_string(),
            provided_version: version.map(str::to_string),
            provider_priority: priority,
        }
    }

    fn pick(candidates: &[ProviderCandidate]) -> Option<i64> {
        select_provider(candidates, &ApkVersionOrder).map(|c| c.package_id)
    }

    #[test]
    fn test_higher_version_wins() {
        let candidates = [candidate(1, Some("1.0"), None), candidate(2, Some("1.1"), None)];
        assert_eq!(pick(&candidates), Some(2));
    }

    #[test]
    fn test_priority_breaks_version_tie() {
        let candidates = [candidate(1, Some("1.0"), Some(5)), candidate(2, Some("1.0"), Some(0))];
        assert_eq!(pick(&candidates), Some(1));

        let candidates = [candidate(1, Some("1.0"), None), candidate(2, Some("1.0"), Some(0))];
        assert_eq!(pick(&candidates), Some(2));
    }

    #[test]
    fn test_version_beats_priority() {
        let candidates = [candidate(1, Some("1.0"), Some(100)), candidate(2, Some("2.0"), None)];
        assert_eq!(pick(&candidates), Some(2));
    }

    #[test]
    fn test_unversioned_provide_ranks_lowest() {
        let candidates = [candidate(1, None, Some(100)), candidate(2, Some("0.1"), None)];
        assert_eq!(pick(&candidates), Some(2));
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let candidates = [
            candidate(3, Some("1.0"), Some(1)),
            candidate(4, Some("1.0"), Some(1)),
        ];
        assert_eq!(pick(&candidates), Some(3));
        assert_eq!(pick(&candidates), Some(3));
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(pick(&[]), None);
        assert_eq!(pick(&[candidate(7, None, None)]), Some(7));
    }
}
