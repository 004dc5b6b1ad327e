use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Source extensions the detectors understand
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "html", "htm", "css", "scss", "less",
];

/// Enumerates candidate files under a root, honoring `.gitignore` plus
/// explicit glob exclusions.
pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: default_excludes(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns.extend(patterns);
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            // One unreadable entry (broken symlink, permission hole) must not
            // abort the enumeration; skip it and keep the rest of the tree.
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("walk entry skipped: {e}");
                    continue;
                }
            };
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if !self.extensions.iter().any(|e| *e == ext) {
            return false;
        }

        let path_str = path.to_string_lossy();
        for pattern in &self.exclude_patterns {
            if glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
            {
                return false;
            }
        }

        true
    }
}

pub fn default_excludes() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/dist/**",
        "**/build/**",
        "**/.next/**",
        "**/coverage/**",
        "**/.git/**",
        "**/*.min.js",
        "**/*.min.css",
        "**/vendor/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
