use std::path::Path;

/// Maps native paths to the portable form written to the manifest.
///
/// Backslashes become forward slashes. If a strip prefix is configured and the path
/// starts with it, that prefix is replaced (by nothing unless a replacement is given).
/// Prefixes are matched after slash normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathNormalizer {
    strip_prefix: Option<String>,
    replace_prefix: String,
}

impl PathNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite paths starting with `strip` to start with `replace` instead.
    #[must_use]
    pub fn with_prefix_rewrite(mut self, strip: impl AsRef<str>, replace: impl AsRef<str>) -> Self {
        self.strip_prefix = Some(to_forward_slashes(strip.as_ref()));
        self.replace_prefix = to_forward_slashes(replace.as_ref());
        self
    }

    #[must_use]
    pub fn normalize(&self, path: &Path) -> String {
        let normalized = to_forward_slashes(&path.to_string_lossy());

        match &self.strip_prefix {
            Some(strip) if !strip.is_empty() => match normalized.strip_prefix(strip.as_str()) {
                Some(rest) => format!("{}{rest}", self.replace_prefix),
                None => normalized,
            },
            _ => normalized,
        }
    }
}

fn to_forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}
