//! Wrapper distribution sniffing.
//!
//! Before any Gradle process runs we can read the wrapper's pinned version
//! out of `gradle-wrapper.properties`, which makes version-compatibility
//! errors actionable without a connection.

use std::path::Path;

/// The Gradle version the project wrapper pins, when it can be determined.
pub fn wrapper_gradle_version(project_root: &Path) -> Option<String> {
    let properties = project_root
        .join("gradle")
        .join("wrapper")
        .join("gradle-wrapper.properties");
    let contents = std::fs::read_to_string(properties).ok()?;
    version_from_wrapper_properties(&contents)
}

fn version_from_wrapper_properties(contents: &str) -> Option<String> {
    let url = contents.lines().find_map(|line| {
        let line = line.trim();
        line.strip_prefix("distributionUrl")?
            .trim_start()
            .strip_prefix('=')
            .map(str::trim)
    })?;

    // e.g. https\://services.gradle.org/distributions/gradle-8.5-bin.zip
    let file_name = url.rsplit('/').next()?;
    let rest = file_name.strip_prefix("gradle-")?;
    let version: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    (!version.is_empty()).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_version_from_distribution_url() {
        let contents = "\
distributionBase=GRADLE_USER_HOME
distributionPath=wrapper/dists
distributionUrl=https\\://services.gradle.org/distributions/gradle-8.5-bin.zip
zipStoreBase=GRADLE_USER_HOME
";
        assert_eq!(
            version_from_wrapper_properties(contents),
            Some("8.5".to_string())
        );
    }

    #[test]
    fn handles_all_distributions_and_patch_versions() {
        let contents =
            "distributionUrl=https\\://services.gradle.org/distributions/gradle-7.6.4-all.zip\n";
        assert_eq!(
            version_from_wrapper_properties(contents),
            Some("7.6.4".to_string())
        );
    }

    #[test]
    fn missing_or_odd_urls_yield_none() {
        assert_eq!(version_from_wrapper_properties(""), None);
        assert_eq!(
            version_from_wrapper_properties("distributionUrl=https\\://example.com/custom.zip\n"),
            None
        );
    }
}
