//! Task and display-name conventions shared by the JVM and Android paths.

/// Qualifies a task name with its project path: task `classes` in `:app`
/// is addressed `:app:classes`, and `:classes` in the root project.
pub(crate) fn full_task_name(project_path: &str, task_name: &str) -> String {
    if project_path == ":" {
        format!(":{task_name}")
    } else {
        format!("{project_path}:{task_name}")
    }
}

/// `"<project> [<sourceSet>]"`, where `<project>` is the project path with
/// its leading `:` stripped, falling back to the project name for the root.
pub(crate) fn display_name(project_path: &str, project_name: &str, source_set: &str) -> String {
    let stripped = project_path.strip_prefix(':').unwrap_or(project_path);
    let project = if stripped.is_empty() {
        project_name
    } else {
        stripped
    };
    format!("{project} [{source_set}]")
}

/// `assembleDebug`-style task fragments need the variant capitalized.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_tasks_with_project_path() {
        assert_eq!(full_task_name(":", "classes"), ":classes");
        assert_eq!(full_task_name(":app", "classes"), ":app:classes");
        assert_eq!(full_task_name(":lib:core", "clean"), ":lib:core:clean");
    }

    #[test]
    fn display_name_strips_path_prefix() {
        assert_eq!(display_name(":app", "app", "main"), "app [main]");
        assert_eq!(display_name(":lib:core", "core", "test"), "lib:core [test]");
        assert_eq!(display_name(":", "root", "main"), "root [main]");
    }

    #[test]
    fn capitalizes_variant_names() {
        assert_eq!(capitalize("debug"), "Debug");
        assert_eq!(capitalize("debugUnitTest"), "DebugUnitTest");
        assert_eq!(capitalize(""), "");
    }
}
