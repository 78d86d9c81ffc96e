//! Project analyzer: turns a directory into [`ProjectSignals`].
//!
//! Every check is read-only. A missing or unreadable project never produces
//! an error: unreadable entries are skipped and the affected signal falls
//! back to zero / `unknown` / `false`.

use crate::types::{Complexity, ProjectType};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

const LANGUAGE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("python", &["py"]),
    ("javascript", &["js", "jsx"]),
    ("typescript", &["ts", "tsx"]),
    ("java", &["java"]),
    ("go", &["go"]),
    ("rust", &["rs"]),
    ("c", &["c", "h"]),
    ("cpp", &["cpp", "hpp", "cc"]),
];

const FRAMEWORK_MARKERS: &[(&str, &[&str])] = &[
    ("react", &["package.json", "src/App.jsx", "src/App.tsx"]),
    ("vue", &["vue.config.js", "src/App.vue"]),
    ("angular", &["angular.json", "src/app/app.component.ts"]),
    ("django", &["manage.py", "settings.py", "urls.py"]),
    ("flask", &["app.py", "main.py", "wsgi.py"]),
    ("fastapi", &["main.py", "app.py"]),
    ("spring", &["pom.xml", "build.gradle", "Application.java"]),
    ("express", &["package.json", "server.js", "app.js"]),
];

const TEST_FILE_PATTERNS: &[&str] = &[
    "test_*.py",
    "*_test.py",
    "*.test.js",
    "*.spec.js",
    "*.test.ts",
    "*.spec.ts",
];

const DOC_FILE_PATTERNS: &[&str] = &["README*", "*.md", "*.rst"];

static TEST_GLOBS: OnceLock<GlobSet> = OnceLock::new();
static DOC_GLOBS: OnceLock<GlobSet> = OnceLock::new();

fn glob_set(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern, error = %e, "skipping invalid glob"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "glob set failed to build; matching nothing");
        GlobSet::empty()
    })
}

fn test_globs() -> &'static GlobSet {
    TEST_GLOBS.get_or_init(|| glob_set(TEST_FILE_PATTERNS))
}

fn doc_globs() -> &'static GlobSet {
    DOC_GLOBS.get_or_init(|| glob_set(DOC_FILE_PATTERNS))
}

fn language_for_extension(ext: &str) -> Option<&'static str> {
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(_, exts)| exts.contains(&ext))
        .map(|(lang, _)| *lang)
}

// ---------------------------------------------------------------------------
// ProjectSignals
// ---------------------------------------------------------------------------

/// Structural snapshot of a project at analysis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSignals {
    pub file_count: usize,
    /// Ratio-of-test-files heuristic, not a measured coverage figure.
    pub test_coverage_estimate: u8,
    pub project_type: ProjectType,
    pub complexity: Complexity,
    pub frameworks: BTreeMap<String, bool>,
    pub languages: BTreeMap<String, usize>,
    pub has_tests: bool,
    pub has_docs: bool,
}

impl Default for ProjectSignals {
    fn default() -> Self {
        Self {
            file_count: 0,
            test_coverage_estimate: 0,
            project_type: ProjectType::Unknown,
            complexity: Complexity::Small,
            frameworks: FRAMEWORK_MARKERS
                .iter()
                .map(|(name, _)| (name.to_string(), false))
                .collect(),
            languages: BTreeMap::new(),
            has_tests: false,
            has_docs: false,
        }
    }
}

impl ProjectSignals {
    pub fn detected_frameworks(&self) -> Vec<&str> {
        self.frameworks
            .iter()
            .filter(|(_, found)| **found)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Listing (single directory walk)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Listing {
    files: Vec<PathBuf>,
    dir_names: Vec<String>,
}

impl Listing {
    fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
    }

    fn source_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for path in &self.files {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if let Some(lang) = language_for_extension(ext) {
                *counts.entry(lang.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn source_count(&self) -> usize {
        self.source_counts().values().sum()
    }

    fn test_count(&self) -> usize {
        let globs = test_globs();
        self.file_names().filter(|n| globs.is_match(n)).count()
    }

    fn any_name_contains(&self, needle: &str) -> bool {
        self.file_names()
            .chain(self.dir_names.iter().map(String::as_str))
            .any(|n| n.contains(needle))
    }
}

// ---------------------------------------------------------------------------
// ProjectAnalyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProjectAnalyzer {
    project_path: PathBuf,
}

impl ProjectAnalyzer {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Collect every file and directory below the project root. Entries
    /// that cannot be read are skipped.
    fn scan(&self) -> Listing {
        let mut listing = Listing::default();
        if !self.project_path.exists() {
            tracing::debug!(path = %self.project_path.display(), "project path missing");
            return listing;
        }
        for entry in WalkDir::new(&self.project_path).min_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                listing
                    .dir_names
                    .push(entry.file_name().to_string_lossy().into_owned());
            } else if entry.file_type().is_file() {
                listing.files.push(entry.into_path());
            }
        }
        listing
    }

    fn has_marker(&self, relative: &str) -> bool {
        self.project_path.join(relative).exists()
    }

    // -----------------------------------------------------------------------
    // Individual checks
    // -----------------------------------------------------------------------

    /// Number of files with a known source extension, recursively.
    /// Zero when the path does not exist.
    pub fn count_source_files(&self) -> usize {
        self.scan().source_count()
    }

    /// First matching marker wins; `unknown` when nothing matches.
    pub fn detect_project_type(&self) -> ProjectType {
        self.detect_project_type_from(&self.scan())
    }

    fn detect_project_type_from(&self, listing: &Listing) -> ProjectType {
        if !self.project_path.exists() {
            return ProjectType::Unknown;
        }

        if let Some(pt) = self.package_json_type() {
            return pt;
        }
        if self.has_marker("manage.py") {
            return ProjectType::WebApplication;
        }
        if self.has_marker("main.py") {
            return ProjectType::Script;
        }
        if self.has_marker("setup.py") {
            return ProjectType::Library;
        }
        if listing.any_name_contains("api") {
            return ProjectType::Api;
        }
        if listing.any_name_contains("web") || listing.any_name_contains("html") {
            return ProjectType::WebApplication;
        }
        ProjectType::Unknown
    }

    /// React or Express in `package.json` dependencies. Unreadable or
    /// malformed manifests are ignored.
    fn package_json_type(&self) -> Option<ProjectType> {
        let path = self.project_path.join("package.json");
        let content = std::fs::read_to_string(&path).ok()?;
        let manifest: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed package.json");
                return None;
            }
        };
        let deps = manifest.get("dependencies")?.as_object()?;
        if deps.contains_key("react") {
            Some(ProjectType::WebApplication)
        } else if deps.contains_key("express") {
            Some(ProjectType::Api)
        } else {
            None
        }
    }

    pub fn analyze_complexity(&self) -> Complexity {
        Complexity::from_file_count(self.count_source_files())
    }

    /// Coarse estimate (0-100) from the ratio of test files to source files.
    /// This is not a coverage measurement; treat it as a hint.
    pub fn estimate_test_coverage(&self) -> u8 {
        Self::coverage_from_counts(self.scan().test_count(), self.count_source_files())
    }

    fn coverage_from_counts(tests: usize, sources: usize) -> u8 {
        if sources == 0 || tests == 0 {
            return 0;
        }
        let ratio = tests as f64 / sources as f64;
        if ratio >= 0.8 {
            90
        } else if ratio >= 0.5 {
            75
        } else if ratio >= 0.3 {
            60
        } else if ratio >= 0.1 {
            40
        } else {
            20
        }
    }

    pub fn identify_frameworks(&self) -> BTreeMap<String, bool> {
        FRAMEWORK_MARKERS
            .iter()
            .map(|(name, markers)| {
                let found = markers.iter().any(|m| self.has_marker(m));
                (name.to_string(), found)
            })
            .collect()
    }

    /// Source file count per language; languages without files are omitted.
    pub fn identify_languages(&self) -> BTreeMap<String, usize> {
        self.scan().source_counts()
    }

    pub fn has_test_files(&self) -> bool {
        Self::has_tests_in(&self.scan())
    }

    fn has_tests_in(listing: &Listing) -> bool {
        listing.test_count() > 0 || listing.dir_names.iter().any(|d| d == "tests")
    }

    pub fn has_documentation(&self) -> bool {
        Self::has_docs_in(&self.scan())
    }

    fn has_docs_in(listing: &Listing) -> bool {
        let globs = doc_globs();
        listing.file_names().any(|n| globs.is_match(n))
            || listing.dir_names.iter().any(|d| d == "docs")
    }

    // -----------------------------------------------------------------------
    // Full analysis
    // -----------------------------------------------------------------------

    /// Every signal from one walk of the project directory.
    pub fn analyze(&self) -> ProjectSignals {
        let listing = self.scan();
        let languages = listing.source_counts();
        let file_count: usize = languages.values().sum();

        let signals = ProjectSignals {
            file_count,
            test_coverage_estimate: Self::coverage_from_counts(listing.test_count(), file_count),
            project_type: self.detect_project_type_from(&listing),
            complexity: Complexity::from_file_count(file_count),
            frameworks: self.identify_frameworks(),
            languages,
            has_tests: Self::has_tests_in(&listing),
            has_docs: Self::has_docs_in(&listing),
        };

        tracing::debug!(
            path = %self.project_path.display(),
            files = signals.file_count,
            complexity = %signals.complexity,
            project_type = %signals.project_type,
            "project analyzed"
        );
        signals
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    fn project_with_sources(n: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        for i in 0..n {
            touch(dir.path(), &format!("src/mod_{i}.rs"));
        }
        dir
    }

    #[test]
    fn missing_directory_degrades_to_defaults() {
        let analyzer = ProjectAnalyzer::new("/definitely/not/a/real/project");
        assert_eq!(analyzer.count_source_files(), 0);
        assert_eq!(analyzer.detect_project_type(), ProjectType::Unknown);
        assert_eq!(analyzer.estimate_test_coverage(), 0);
        assert_eq!(analyzer.analyze_complexity(), Complexity::Small);
        assert!(!analyzer.has_test_files());

        let signals = analyzer.analyze();
        assert_eq!(signals.file_count, 0);
        assert!(signals.frameworks.values().all(|found| !found));
        assert!(signals.languages.is_empty());
    }

    #[test]
    fn counts_sources_by_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py");
        touch(dir.path(), "web/b.jsx");
        touch(dir.path(), "deep/nested/c.tsx");
        touch(dir.path(), "lib.h");
        touch(dir.path(), "notes.txt");
        let analyzer = ProjectAnalyzer::new(dir.path());
        assert_eq!(analyzer.count_source_files(), 4);

        let languages = analyzer.identify_languages();
        assert_eq!(languages.get("python"), Some(&1));
        assert_eq!(languages.get("javascript"), Some(&1));
        assert_eq!(languages.get("typescript"), Some(&1));
        assert_eq!(languages.get("c"), Some(&1));
        assert!(!languages.contains_key("go"));
    }

    #[test]
    fn ten_files_is_small_eleven_is_medium() {
        let ten = project_with_sources(10);
        assert_eq!(
            ProjectAnalyzer::new(ten.path()).analyze_complexity(),
            Complexity::Small
        );
        let eleven = project_with_sources(11);
        assert_eq!(
            ProjectAnalyzer::new(eleven.path()).analyze_complexity(),
            Complexity::Medium
        );
    }

    #[test]
    fn react_package_json_is_web_application() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^18.0.0"}}"#,
        )
        .unwrap();
        let analyzer = ProjectAnalyzer::new(dir.path());
        assert_eq!(analyzer.detect_project_type(), ProjectType::WebApplication);
        assert_eq!(analyzer.identify_frameworks().get("react"), Some(&true));
    }

    #[test]
    fn express_package_json_is_api() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"express": "4"}}"#,
        )
        .unwrap();
        assert_eq!(
            ProjectAnalyzer::new(dir.path()).detect_project_type(),
            ProjectType::Api
        );
    }

    #[test]
    fn malformed_package_json_falls_through() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        touch(dir.path(), "setup.py");
        assert_eq!(
            ProjectAnalyzer::new(dir.path()).detect_project_type(),
            ProjectType::Library
        );
    }

    #[test]
    fn marker_files_are_checked_in_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.py");
        touch(dir.path(), "setup.py");
        assert_eq!(
            ProjectAnalyzer::new(dir.path()).detect_project_type(),
            ProjectType::Script
        );

        touch(dir.path(), "manage.py");
        assert_eq!(
            ProjectAnalyzer::new(dir.path()).detect_project_type(),
            ProjectType::WebApplication
        );
    }

    #[test]
    fn api_named_entry_marks_api() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "services/rest_api/handler.go");
        assert_eq!(
            ProjectAnalyzer::new(dir.path()).detect_project_type(),
            ProjectType::Api
        );
    }

    #[test]
    fn coverage_thresholds() {
        assert_eq!(ProjectAnalyzer::coverage_from_counts(0, 10), 0);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(5, 0), 0);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(8, 10), 90);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(5, 10), 75);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(3, 10), 60);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(1, 10), 40);
        assert_eq!(ProjectAnalyzer::coverage_from_counts(1, 20), 20);
    }

    #[test]
    fn estimates_coverage_from_test_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app/core.py");
        touch(dir.path(), "tests/test_core.py");
        // both files are python sources, one of them a test: ratio 0.5
        let analyzer = ProjectAnalyzer::new(dir.path());
        assert_eq!(analyzer.estimate_test_coverage(), 75);
        assert!(analyzer.has_test_files());
    }

    #[test]
    fn documentation_detection() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.rs");
        assert!(!ProjectAnalyzer::new(dir.path()).has_documentation());
        touch(dir.path(), "README");
        assert!(ProjectAnalyzer::new(dir.path()).has_documentation());
    }

    #[test]
    fn analyze_agrees_with_individual_checks() {
        let dir = project_with_sources(12);
        touch(dir.path(), "manage.py");
        touch(dir.path(), "docs/guide.md");
        let analyzer = ProjectAnalyzer::new(dir.path());
        let signals = analyzer.analyze();
        assert_eq!(signals.file_count, analyzer.count_source_files());
        assert_eq!(signals.file_count, 13);
        assert_eq!(signals.complexity, analyzer.analyze_complexity());
        assert_eq!(signals.project_type, analyzer.detect_project_type());
        assert_eq!(signals.frameworks, analyzer.identify_frameworks());
        assert_eq!(signals.detected_frameworks(), vec!["django"]);
        assert!(signals.has_docs);
    }
}
