use std::cmp::Ordering;
use std::fmt;

/// A parsed Gradle version, comparable numerically.
///
/// Only the dotted numeric prefix participates in ordering; qualifiers like
/// `-rc-1` or `-milestone-2` are ignored, matching how the compatibility
/// matrix is keyed. Missing components compare as zero, so `8.5 == 8.5.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GradleVersion {
    parts: Vec<u32>,
}

impl GradleVersion {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let base = text.split(['-', '+']).next().unwrap_or(text);
        if base.is_empty() {
            return None;
        }

        let mut parts = Vec::new();
        for component in base.split('.') {
            parts.push(component.parse::<u32>().ok()?);
        }
        Some(Self { parts })
    }

    fn part(&self, idx: usize) -> u32 {
        self.parts.get(idx).copied().unwrap_or(0)
    }
}

impl PartialOrd for GradleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GradleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for idx in 0..len {
            match self.part(idx).cmp(&other.part(idx)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for GradleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, part) in self.parts.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
