//! Icon resolution: map a component's name/kind/hint onto an image file from
//! the asset directory. Exact candidates first, then fuzzy matching against
//! asset stems, then category fallbacks. A miss is not an error; the node
//! renderer falls back to a colored box.

use crate::error::RenderError;
use crate::ir::Component;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "svg"];
const PROVIDERS: [&str; 3] = ["aws", "azure", "gcp"];
const ROLE_TOKENS: [&str; 6] = ["user", "role", "team", "analyst", "admin", "customer"];
const FUZZY_CUTOFF: f32 = 0.6;

/// Snapshot of the asset directory, taken once per render pass. Lookups are
/// case-insensitive on filename; iteration order is sorted so fuzzy ties
/// resolve the same way every run.
#[derive(Debug, Clone)]
pub struct IconLibrary {
    dir: PathBuf,
    /// lowercased filename -> filename as found on disk
    files: BTreeMap<String, String>,
    /// lowercased stem (extension stripped) -> filename as found on disk
    stems: BTreeMap<String, String>,
}

impl IconLibrary {
    /// A library with no assets; every component resolves to the fallback
    /// visual.
    pub fn empty() -> Self {
        Self {
            dir: PathBuf::new(),
            files: BTreeMap::new(),
            stems: BTreeMap::new(),
        }
    }

    /// Read the asset directory listing. A directory that cannot be read is
    /// fatal for the render that asked for it.
    pub fn scan(dir: &Path) -> Result<Self, RenderError> {
        let entries = std::fs::read_dir(dir).map_err(|source| RenderError::Assets {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RenderError::Assets {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if has_known_extension(name) {
                names.push(name.to_string());
            }
        }
        Ok(Self::from_names(dir, names))
    }

    /// Build a library from an explicit file listing. Used by `scan` and by
    /// tests that don't want to touch the filesystem.
    pub fn from_names<I, S>(dir: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files = BTreeMap::new();
        let mut stems = BTreeMap::new();
        for name in names {
            let name = name.into();
            let lower = name.to_lowercase();
            let stem = match lower.rsplit_once('.') {
                Some((stem, _ext)) => stem.to_string(),
                None => lower.clone(),
            };
            stems.entry(stem).or_insert_with(|| name.clone());
            files.entry(lower).or_insert(name);
        }
        Self {
            dir: dir.into(),
            files,
            stems,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Resolution pipeline, first match wins. Pure with respect to the
    /// snapshot: the same component against the same listing always yields
    /// the same answer.
    pub fn resolve(&self, component: &Component) -> Option<PathBuf> {
        if self.files.is_empty() {
            return None;
        }

        if let Some(hint) = component.icon_hint.as_deref()
            && let Some(path) = self.lookup_name(hint)
        {
            return Some(path);
        }

        let name_slug = slug(&component.name);
        let kind_slug = slug(&component.kind);
        let mut candidates = vec![
            name_slug.clone(),
            kind_slug.clone(),
            first_token(&name_slug),
            first_token(&kind_slug),
        ];
        for provider in PROVIDERS {
            if name_slug.contains(provider) || kind_slug.contains(provider) {
                candidates.push(provider.to_string());
                break;
            }
        }
        for candidate in &candidates {
            if let Some(path) = self.lookup_stem(candidate) {
                return Some(path);
            }
        }

        if !name_slug.is_empty()
            && let Some(stem) = closest_match(&name_slug, self.stems.keys(), FUZZY_CUTOFF)
        {
            debug!(
                "fuzzy icon match for `{}`: `{name_slug}` -> `{stem}`",
                component.name
            );
            return self.lookup_stem(stem);
        }

        self.category_fallback(&kind_slug)
    }

    fn category_fallback(&self, kind_slug: &str) -> Option<PathBuf> {
        if kind_slug.contains("database") || kind_slug.contains("storage") {
            return self.lookup_stem("database");
        }
        if kind_slug.contains("api") {
            return self.lookup_stem("api");
        }
        if ROLE_TOKENS.iter().any(|token| kind_slug.contains(token)) {
            return self.lookup_stem("user");
        }
        None
    }

    /// Case-insensitive lookup of a filename, trying known extensions when
    /// the name doesn't carry one.
    fn lookup_name(&self, name: &str) -> Option<PathBuf> {
        let lower = name.to_lowercase();
        if let Some(actual) = self.files.get(&lower) {
            return Some(self.dir.join(actual));
        }
        if !has_known_extension(&lower) {
            for ext in EXTENSIONS {
                if let Some(actual) = self.files.get(&format!("{lower}.{ext}")) {
                    return Some(self.dir.join(actual));
                }
            }
        }
        None
    }

    fn lookup_stem(&self, stem: &str) -> Option<PathBuf> {
        if stem.is_empty() {
            return None;
        }
        self.stems.get(stem).map(|actual| self.dir.join(actual))
    }
}

fn has_known_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Normalize a display name into a candidate filename stem:
/// `"AWS Lambda"` -> `"aws-lambda"`.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() || ch == '.' {
            out.push(ch);
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn first_token(slug: &str) -> String {
    slug.split('-').next().unwrap_or_default().to_string()
}

/// Best candidate above `cutoff` by normalized edit-distance similarity.
/// Candidates must arrive in a stable order; the first of equally-good
/// matches wins.
pub(crate) fn closest_match<'a, I>(query: &str, candidates: I, cutoff: f32) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut best: Option<(&'a str, f32)> = None;
    for candidate in candidates {
        let score = similarity(query, candidate);
        if score >= cutoff && best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn similarity(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, kind: &str, hint: Option<&str>) -> Component {
        Component {
            name: name.into(),
            kind: kind.into(),
            group: None,
            icon_hint: hint.map(Into::into),
        }
    }

    fn library(names: &[&str]) -> IconLibrary {
        IconLibrary::from_names("icons", names.iter().copied())
    }

    #[test]
    fn hint_wins_when_present() {
        let lib = library(&["aws-lambda.png", "custom.png"]);
        let resolved = lib.resolve(&component("Lambda Functions", "serverless", Some("custom.png")));
        assert_eq!(resolved, Some(PathBuf::from("icons/custom.png")));
    }

    #[test]
    fn hint_without_extension_still_matches() {
        let lib = library(&["Custom.PNG"]);
        let resolved = lib.resolve(&component("X", "misc", Some("custom")));
        assert_eq!(resolved, Some(PathBuf::from("icons/Custom.PNG")));
    }

    #[test]
    fn missing_hint_falls_through_to_name() {
        let lib = library(&["aws-lambda.png"]);
        let resolved = lib.resolve(&component("AWS Lambda", "serverless", Some("nope.png")));
        assert_eq!(resolved, Some(PathBuf::from("icons/aws-lambda.png")));
    }

    #[test]
    fn kind_slug_is_second_candidate() {
        let lib = library(&["object-storage.svg"]);
        let resolved = lib.resolve(&component("Staging Bucket", "Object Storage", None));
        assert_eq!(resolved, Some(PathBuf::from("icons/object-storage.svg")));
    }

    #[test]
    fn provider_generic_before_fuzzy() {
        let lib = library(&["aws.png", "aws-step-functions.png"]);
        let resolved = lib.resolve(&component("AWS Glue", "etl_service", None));
        assert_eq!(resolved, Some(PathBuf::from("icons/aws.png")));
    }

    #[test]
    fn fuzzy_matches_near_names() {
        let lib = library(&["postgresql.png"]);
        let resolved = lib.resolve(&component("PostgreSQL DB", "internal", None));
        assert_eq!(resolved, Some(PathBuf::from("icons/postgresql.png")));
    }

    #[test]
    fn category_fallback_for_databases() {
        let lib = library(&["database.png", "api.png", "user.png"]);
        assert_eq!(
            lib.resolve(&component("Ledger", "graph database", None)),
            Some(PathBuf::from("icons/database.png"))
        );
        assert_eq!(
            lib.resolve(&component("Gateway", "rest api", None)),
            Some(PathBuf::from("icons/api.png"))
        );
        assert_eq!(
            lib.resolve(&component("Ops", "admin team", None)),
            Some(PathBuf::from("icons/user.png"))
        );
    }

    #[test]
    fn category_fallback_requires_the_generic_file() {
        let lib = library(&["unrelated.png"]);
        assert_eq!(lib.resolve(&component("Ledger", "database", None)), None);
    }

    #[test]
    fn unresolvable_is_none_not_error() {
        let lib = library(&["zebra.png"]);
        assert_eq!(lib.resolve(&component("Quartz Scheduler", "misc", None)), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let lib = library(&["alpha.png", "alphb.png", "alphc.png"]);
        let c = component("alphx", "misc", None);
        let first = lib.resolve(&c);
        for _ in 0..10 {
            assert_eq!(lib.resolve(&c), first);
        }
        // Equal similarity: sorted order breaks the tie.
        assert_eq!(first, Some(PathBuf::from("icons/alpha.png")));
    }

    #[test]
    fn slug_normalizes_separators() {
        assert_eq!(slug("AWS Lambda"), "aws-lambda");
        assert_eq!(slug("S3 Bucket (CSV)"), "s3-bucket-csv");
        assert_eq!(slug("step__functions"), "step-functions");
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn closest_match_honors_cutoff() {
        let stems = vec!["postgresql".to_string(), "tableau".to_string()];
        assert_eq!(
            closest_match("postgres", stems.iter(), 0.6),
            Some("postgresql")
        );
        assert_eq!(closest_match("zzzzzz", stems.iter(), 0.6), None);
    }
}
