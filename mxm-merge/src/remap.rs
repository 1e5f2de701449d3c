//! Path remapping
//!
//! A [`ReplacementTable`] is an ordered list of `from -> to` prefix rules.
//! Lookups scan the rules in order and the first rule whose `from` is a
//! prefix of the subject wins; there is no longest-prefix preference.
//! Only the leading occurrence is replaced.

use crate::report::SkipReason;
use mxm_common::{normalize_path, Error, Result};
use std::collections::HashSet;

/// One prefix substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub from: String,
    pub to: String,
}

impl ReplacementRule {
    /// Replace the leading `from` of `subject`, or `None` if it does not start with it
    pub fn replace(&self, subject: &str) -> Option<String> {
        subject
            .strip_prefix(self.from.as_str())
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

/// Remapped `(directory, location)` pair of a track location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPaths {
    pub directory: String,
    pub location: String,
}

/// Ordered, validated prefix replacements
///
/// Immutable once built; the merge borrows it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTable {
    rules: Vec<ReplacementRule>,
}

impl ReplacementTable {
    /// Build a table, rejecting empty tables, empty prefixes and duplicate prefixes
    pub fn new<I, F, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();

        for (from, to) in pairs {
            let from = from.into();
            if from.is_empty() {
                return Err(Error::InvalidReplacementTable(
                    "replacement prefix must not be empty".to_string(),
                ));
            }
            if !seen.insert(from.clone()) {
                return Err(Error::InvalidReplacementTable(format!(
                    "prefix \"{}\" is listed more than once",
                    from
                )));
            }
            rules.push(ReplacementRule { from, to: to.into() });
        }

        if rules.is_empty() {
            return Err(Error::InvalidReplacementTable(
                "at least one replacement is required".to_string(),
            ));
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// First rule whose `from` is a prefix of `subject` (equality counts)
    pub fn matching_rule(&self, subject: &str) -> Option<&ReplacementRule> {
        self.rules.iter().find(|rule| subject.starts_with(rule.from.as_str()))
    }

    /// Remap a single path, passing it through unchanged if no rule matches
    pub fn apply(&self, subject: &str) -> String {
        self.matching_rule(subject)
            .and_then(|rule| rule.replace(subject))
            .unwrap_or_else(|| subject.to_string())
    }

    /// Remap a track location's `(directory, location)` pair
    ///
    /// The rule is chosen from `directory` alone and then applied to both
    /// fields, so the two never end up under different roots. A `location`
    /// that does not begin with the chosen prefix is left as it is. Missing
    /// or empty fields make the pair unremappable.
    pub fn apply_location(
        &self,
        directory: Option<&str>,
        location: Option<&str>,
    ) -> std::result::Result<LocationPaths, SkipReason> {
        let directory = directory
            .filter(|d| !d.is_empty())
            .ok_or(SkipReason::MissingDirectory)?;
        let location = location
            .filter(|l| !l.is_empty())
            .ok_or(SkipReason::MissingLocation)?;

        let paths = match self.matching_rule(directory) {
            Some(rule) => LocationPaths {
                directory: rule
                    .replace(directory)
                    .unwrap_or_else(|| directory.to_string()),
                location: rule
                    .replace(location)
                    .unwrap_or_else(|| location.to_string()),
            },
            None => LocationPaths {
                directory: directory.to_string(),
                location: location.to_string(),
            },
        };
        Ok(paths)
    }
}

/// Parse a command-line `FROM=TO` replacement, normalising both sides
///
/// Splits at the first `=`; a `=` inside the target path is kept.
pub fn parse_replacement_arg(arg: &str) -> Result<(String, String)> {
    let (from, to) = arg.split_once('=').ok_or_else(|| {
        Error::InvalidInput(format!("expected FROM=TO, got \"{}\"", arg))
    })?;
    Ok((normalize_path(from), normalize_path(to)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> ReplacementTable {
        ReplacementTable::new(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_first_match_wins_not_longest() {
        let t = table(&[("/a", "/x"), ("/a/b", "/y")]);
        assert_eq!(t.apply("/a/b/c"), "/x/b/c");
    }

    #[test]
    fn test_table_order_is_the_tie_break() {
        let t = table(&[("/a/b", "/y"), ("/a", "/x")]);
        assert_eq!(t.apply("/a/b/c"), "/y/c");
        assert_eq!(t.apply("/a/z"), "/x/z");
    }

    #[test]
    fn test_no_match_passes_through() {
        let t = table(&[("/music", "/newmusic")]);
        assert_eq!(t.apply("/other/song.mp3"), "/other/song.mp3");
        assert_eq!(t.apply(""), "");
        // Prefix test is literal, not path-segment aware, and not anywhere in the string
        assert_eq!(t.apply("/data/music/x"), "/data/music/x");
    }

    #[test]
    fn test_exact_subject_matches() {
        let t = table(&[("/music", "/newmusic")]);
        assert_eq!(t.apply("/music"), "/newmusic");
    }

    #[test]
    fn test_only_leading_occurrence_replaced() {
        let t = table(&[("/music", "/m")]);
        assert_eq!(t.apply("/music/music/music.mp3"), "/m/music/music.mp3");
    }

    #[test]
    fn test_remap_is_idempotent_for_source_rooted_tables() {
        let t = table(&[("/music", "/newmusic"), ("D:/Tracks", "/mnt/tracks")]);
        for subject in ["/music/a.mp3", "D:/Tracks/b/c.flac", "/elsewhere/d.ogg"] {
            let once = t.apply(subject);
            assert_eq!(t.apply(&once), once, "second pass changed {}", subject);
        }
    }

    #[test]
    fn test_location_pair_uses_same_rule() {
        let t = table(&[("/a", "/b")]);
        let paths = t.apply_location(Some("/a"), Some("/a/song.mp3")).unwrap();
        assert_eq!(
            paths,
            LocationPaths {
                directory: "/b".to_string(),
                location: "/b/song.mp3".to_string(),
            }
        );
    }

    #[test]
    fn test_location_rule_chosen_from_directory_only() {
        // The location alone would match the second rule; the directory picks the first
        let t = table(&[("/lib", "/x"), ("/lib/deep", "/y")]);
        let paths = t
            .apply_location(Some("/lib"), Some("/lib/deep/song.mp3"))
            .unwrap();
        assert_eq!(paths.directory, "/x");
        assert_eq!(paths.location, "/x/deep/song.mp3");
    }

    #[test]
    fn test_location_not_under_directory_prefix_left_alone() {
        let t = table(&[("/a", "/b")]);
        let paths = t.apply_location(Some("/a/x"), Some("/c/song.mp3")).unwrap();
        assert_eq!(paths.directory, "/b/x");
        assert_eq!(paths.location, "/c/song.mp3");
    }

    #[test]
    fn test_location_pair_passthrough() {
        let t = table(&[("/a", "/b")]);
        let paths = t.apply_location(Some("/z"), Some("/a/song.mp3")).unwrap();
        assert_eq!(paths.directory, "/z");
        assert_eq!(paths.location, "/a/song.mp3");
    }

    #[test]
    fn test_missing_fields_are_not_remappable() {
        let t = table(&[("/a", "/b")]);
        assert_eq!(
            t.apply_location(None, Some("/a/song.mp3")),
            Err(SkipReason::MissingDirectory)
        );
        assert_eq!(
            t.apply_location(Some("/a"), None),
            Err(SkipReason::MissingLocation)
        );
        assert_eq!(
            t.apply_location(Some(""), Some("/a/song.mp3")),
            Err(SkipReason::MissingDirectory)
        );
        assert_eq!(
            t.apply_location(Some("/a"), Some("")),
            Err(SkipReason::MissingLocation)
        );
    }

    #[test]
    fn test_rejects_invalid_tables() {
        let empty: Vec<(String, String)> = Vec::new();
        assert!(matches!(
            ReplacementTable::new(empty),
            Err(Error::InvalidReplacementTable(_))
        ));
        assert!(matches!(
            ReplacementTable::new([("", "/x")]),
            Err(Error::InvalidReplacementTable(_))
        ));
        assert!(matches!(
            ReplacementTable::new([("/a", "/x"), ("/a", "/y")]),
            Err(Error::InvalidReplacementTable(_))
        ));
    }

    #[test]
    fn test_empty_target_prefix_is_allowed() {
        let t = table(&[("/mnt/usb", "")]);
        assert_eq!(t.apply("/mnt/usb/set"), "/set");
    }

    #[test]
    fn test_parse_replacement_arg() {
        assert_eq!(
            parse_replacement_arg(r#""C:\Music"=/mnt/music"#).unwrap(),
            ("C:/Music".to_string(), "/mnt/music".to_string())
        );
        assert_eq!(
            parse_replacement_arg("/a=/b=c").unwrap(),
            ("/a".to_string(), "/b=c".to_string())
        );
        assert!(matches!(
            parse_replacement_arg("/no-separator"),
            Err(Error::InvalidInput(_))
        ));
    }
}
