//! Inter-project dependency linking.
//!
//! Runs once over the flat model list after aggregation. Classpath entries
//! are matched against every model's output directories and archive files:
//! a hit on a sibling's output adds a [`BuildTargetDependency`] edge, and a
//! hit on an archive with a known class-directory expansion substitutes the
//! expansion for the archive in place. The pass is idempotent and preserves
//! classpath order modulo that substitution.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::{BuildTargetDependency, SourceSetModel};

/// Rewrites every model's `compile_classpath` and `build_target_dependencies`
/// in place.
pub fn link_source_sets(models: &mut [SourceSetModel]) {
    // Map each output dir and archive file to the index of its owning model.
    let mut outputs: HashMap<PathBuf, usize> = HashMap::new();
    let mut archive_expansion: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for (idx, model) in models.iter().enumerate() {
        for dir in model
            .source_output_dirs
            .iter()
            .chain(model.resource_output_dirs.iter())
        {
            outputs.insert(dir.clone(), idx);
        }
        for (archive, class_dirs) in &model.archive_output_files {
            outputs.insert(archive.clone(), idx);
            archive_expansion
                .entry(archive.clone())
                .or_default()
                .extend(class_dirs.iter().cloned());
        }
    }

    for idx in 0..models.len() {
        let (classpath, dependencies) = relink_one(models, idx, &outputs, &archive_expansion);
        models[idx].compile_classpath = classpath;
        models[idx].build_target_dependencies = dependencies;
    }
}

fn relink_one(
    models: &[SourceSetModel],
    idx: usize,
    outputs: &HashMap<PathBuf, usize>,
    archive_expansion: &HashMap<PathBuf, Vec<PathBuf>>,
) -> (Vec<PathBuf>, BTreeSet<BuildTargetDependency>) {
    let model = &models[idx];
    let mut classpath = Vec::with_capacity(model.compile_classpath.len());
    let mut dependencies = BTreeSet::new();

    for entry in &model.compile_classpath {
        // A source set's own archive on its own classpath must not create a
        // self edge.
        if let Some(&owner) = outputs.get(entry) {
            if owner != idx {
                dependencies.insert(models[owner].identity());
            }
        }
        match archive_expansion.get(entry) {
            Some(expansion) => classpath.extend(expansion.iter().cloned()),
            None => classpath.push(entry.clone()),
        }
    }

    (classpath, dependencies)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::BuildTargetDependency;

    fn model(project: &str, source_set: &str) -> SourceSetModel {
        let project_dir = PathBuf::from(format!("/ws/{project}"));
        SourceSetModel {
            gradle_version: "8.5".into(),
            display_name: format!("{project} [{source_set}]"),
            project_name: project.into(),
            project_path: format!(":{project}"),
            project_dir: project_dir.clone(),
            root_dir: PathBuf::from("/ws"),
            source_set_name: source_set.into(),
            classes_task_name: Some(format!(":{project}:classes")),
            clean_task_name: format!(":{project}:clean"),
            task_names: Default::default(),
            source_dirs: Default::default(),
            generated_source_dirs: Default::default(),
            resource_dirs: Default::default(),
            source_output_dirs: Default::default(),
            resource_output_dirs: Default::default(),
            archive_output_files: BTreeMap::new(),
            compile_classpath: Vec::new(),
            module_dependencies: Default::default(),
            build_target_dependencies: Default::default(),
            has_tests: false,
            extensions: Default::default(),
        }
    }

    #[test]
    fn jar_on_sibling_classpath_is_replaced_by_class_dirs() {
        let mut foo = model("foo", "main");
        let foo_jar = PathBuf::from("/ws/foo/build/libs/foo.jar");
        let foo_classes = PathBuf::from("/ws/foo/build/classes/java/main");
        foo.source_output_dirs.insert(foo_classes.clone());
        foo.archive_output_files
            .insert(foo_jar.clone(), vec![foo_classes.clone()]);

        let mut bar = model("bar", "main");
        let dep_jar = PathBuf::from("/deps/guava.jar");
        bar.compile_classpath = vec![dep_jar.clone(), foo_jar.clone()];

        let mut models = vec![foo, bar];
        link_source_sets(&mut models);

        let bar = &models[1];
        assert_eq!(bar.compile_classpath, vec![dep_jar, foo_classes]);
        assert_eq!(
            bar.build_target_dependencies,
            BTreeSet::from([BuildTargetDependency::new("/ws/foo", "main")])
        );
    }

    #[test]
    fn sibling_output_dir_creates_dependency_without_rewrite() {
        let mut foo = model("foo", "main");
        let foo_classes = PathBuf::from("/ws/foo/build/classes/java/main");
        foo.source_output_dirs.insert(foo_classes.clone());

        let mut test = model("foo", "test");
        test.compile_classpath = vec![foo_classes.clone()];

        let mut models = vec![foo, test];
        link_source_sets(&mut models);

        assert_eq!(models[1].compile_classpath, vec![foo_classes]);
        assert_eq!(
            models[1].build_target_dependencies,
            BTreeSet::from([BuildTargetDependency::new("/ws/foo", "main")])
        );
    }

    #[test]
    fn own_archive_does_not_create_self_dependency() {
        let mut main = model("app", "main");
        let jar = PathBuf::from("/ws/app/build/libs/app.jar");
        let classes = PathBuf::from("/ws/app/build/classes/java/main");
        main.source_output_dirs.insert(classes.clone());
        main.archive_output_files.insert(jar.clone(), vec![classes.clone()]);
        // Unusual but possible: the project's own jar ends up on its own
        // compile classpath.
        main.compile_classpath = vec![jar];

        let mut models = vec![main];
        link_source_sets(&mut models);

        assert!(models[0].build_target_dependencies.is_empty());
        assert_eq!(models[0].compile_classpath, vec![classes]);
    }

    #[test]
    fn resource_output_dir_also_links() {
        let mut foo = model("foo", "main");
        let res_out = PathBuf::from("/ws/foo/build/resources/main");
        foo.resource_output_dirs.insert(res_out.clone());

        let mut bar = model("bar", "main");
        bar.compile_classpath = vec![res_out.clone()];

        let mut models = vec![foo, bar];
        link_source_sets(&mut models);

        assert_eq!(
            models[1].build_target_dependencies,
            BTreeSet::from([BuildTargetDependency::new("/ws/foo", "main")])
        );
        assert_eq!(models[1].compile_classpath, vec![res_out]);
    }

    #[test]
    fn linking_is_idempotent() {
        let mut foo = model("foo", "main");
        let foo_jar = PathBuf::from("/ws/foo/build/libs/foo.jar");
        let foo_classes = PathBuf::from("/ws/foo/build/classes/java/main");
        foo.source_output_dirs.insert(foo_classes.clone());
        foo.archive_output_files.insert(foo_jar.clone(), vec![foo_classes]);

        let mut bar = model("bar", "main");
        bar.compile_classpath = vec![PathBuf::from("/deps/a.jar"), foo_jar];

        let mut once = vec![foo, bar];
        link_source_sets(&mut once);
        let mut twice = once.clone();
        link_source_sets(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn no_archive_key_survives_on_any_classpath() {
        let mut foo = model("foo", "main");
        let foo_jar = PathBuf::from("/ws/foo/build/libs/foo.jar");
        foo.archive_output_files
            .insert(foo_jar.clone(), vec![PathBuf::from("/ws/foo/out")]);

        let mut bar = model("bar", "main");
        bar.compile_classpath = vec![foo_jar.clone()];
        let mut baz = model("baz", "main");
        baz.compile_classpath = vec![foo_jar.clone()];

        let mut models = vec![foo, bar, baz];
        link_source_sets(&mut models);

        for model in &models {
            assert!(!model.compile_classpath.contains(&foo_jar));
        }
    }

    #[test]
    fn classpath_order_is_preserved_around_substitution() {
        let mut foo = model("foo", "main");
        let foo_jar = PathBuf::from("/ws/foo/build/libs/foo.jar");
        let c1 = PathBuf::from("/ws/foo/build/classes/java/main");
        let c2 = PathBuf::from("/ws/foo/build/resources/main");
        foo.archive_output_files
            .insert(foo_jar.clone(), vec![c1.clone(), c2.clone()]);

        let mut bar = model("bar", "main");
        let before = PathBuf::from("/deps/before.jar");
        let after = PathBuf::from("/deps/after.jar");
        bar.compile_classpath = vec![before.clone(), foo_jar, after.clone()];

        let mut models = vec![foo, bar];
        link_source_sets(&mut models);

        assert_eq!(models[1].compile_classpath, vec![before, c1, c2, after]);
    }
}
