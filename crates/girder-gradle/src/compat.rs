//! Gradle ↔ JDK compatibility, per the published compatibility matrix.

use girder_model::GradleVersion;

/// Minimum Gradle version per JDK feature release, newest first. A Gradle
/// version maps to the first row it is at or above.
const COMPATIBILITY_MATRIX: &[(&str, &str)] = &[
    ("8.8", "22"),
    ("8.5", "21"),
    ("8.3", "20"),
    ("7.6", "19"),
    ("7.5", "18"),
    ("7.3", "17"),
    ("7.0", "16"),
    ("6.7", "15"),
    ("6.3", "14"),
    ("6.0", "13"),
    ("5.4", "12"),
    ("5.0", "11"),
    ("4.7", "10"),
    ("4.3", "9"),
    ("2.0", "1.8"),
];

/// The highest JDK version a given Gradle version supports, or the empty
/// string when the version is unknown or predates the matrix.
pub fn latest_compatible_java_version(gradle_version: &str) -> String {
    let Some(version) = GradleVersion::parse(gradle_version) else {
        return String::new();
    };

    for (minimum, java) in COMPATIBILITY_MATRIX {
        let row = GradleVersion::parse(minimum).expect("valid matrix row");
        if version >= row {
            return (*java).to_string();
        }
    }
    String::new()
}

/// The oldest JDK any supported Gradle version runs on.
pub fn oldest_compatible_java_version() -> String {
    "1.8".to_string()
}

/// A Gradle version is supported iff the compatibility matrix knows it.
pub fn is_supported_gradle_version(gradle_version: &str) -> bool {
    !latest_compatible_java_version(gradle_version).is_empty()
}

/// The oldest Gradle version the server accepts.
pub fn minimum_supported_gradle_version() -> &'static str {
    COMPATIBILITY_MATRIX
        .last()
        .map(|(minimum, _)| *minimum)
        .expect("non-empty matrix")
}
