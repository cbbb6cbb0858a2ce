//! Init-script injection.
//!
//! The probe plugin ships as a Gradle init script kept under the server's
//! plugin directory. Init scripts apply to every build in a composite, so
//! each build (root and included alike) registers a `girderWorkspaceModel`
//! task that prints its own payload block; the root task additionally chains
//! the included builds' tasks so one invocation emits every block.

use std::path::PathBuf;

use crate::DriverError;

/// Sentinels delimiting one build's JSON block in Gradle's output.
pub const BUILD_JSON_BEGIN: &str = "GIRDER_BUILD_JSON_BEGIN";
pub const BUILD_JSON_END: &str = "GIRDER_BUILD_JSON_END";

/// Task the init script registers on every build's root project.
pub const WORKSPACE_MODEL_TASK: &str = "girderWorkspaceModel";

const INIT_SCRIPT_NAME: &str = "init.gradle";

/// Writes the probe init script under the server's plugin directory and
/// hands out its path.
#[derive(Debug, Clone)]
pub struct PluginInjector {
    plugin_dir: PathBuf,
}

impl PluginInjector {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// The filesystem path of the init script, writing or refreshing the file
    /// as needed.
    pub fn init_script_path(&self) -> Result<PathBuf, DriverError> {
        let path = self.plugin_dir.join(INIT_SCRIPT_NAME);

        let current = std::fs::read_to_string(&path).ok();
        if current.as_deref() != Some(INIT_SCRIPT) {
            std::fs::create_dir_all(&self.plugin_dir).map_err(|source| DriverError::Io {
                path: self.plugin_dir.clone(),
                source,
            })?;
            std::fs::write(&path, INIT_SCRIPT).map_err(|source| DriverError::Io {
                path: path.clone(),
                source,
            })?;
        }

        Ok(path)
    }
}

const INIT_SCRIPT: &str = r##"import groovy.json.JsonOutput

// Girder probe. Applied to every build in the composite; each build prints
// one JSON block describing its projects.

def girderTryGet = { closure ->
    try {
        return closure()
    } catch (Throwable ignored) {
        return null
    }
}

def girderPaths = { files ->
    def out = []
    try {
        files.each { out << it.absolutePath }
    } catch (Throwable ignored) {}
    out
}

def girderJavaPayload = { proj, compileTask ->
    if (compileTask == null) {
        return null
    }
    def java = [:]
    java.sourceCompatibility = girderTryGet { compileTask.sourceCompatibility }
    java.targetCompatibility = girderTryGet { compileTask.targetCompatibility }
    java.toolchainVersion = girderTryGet {
        proj.extensions.getByName('java').toolchain.languageVersion.orNull?.toString()
    }
    java.declaredCompilerArgs = girderTryGet { compileTask.options.compilerArgs } ?: []
    def options = girderTryGet {
        def opts = compileTask.options
        [
            release: opts.release.orNull,
            encoding: opts.encoding,
            debug: opts.debugOptions == null ? opts.debug : opts.debug,
            deprecation: opts.deprecation,
            warnings: opts.warnings,
        ]
    }
    if (options != null) {
        java.compileOptions = options
    }
    java
}

def girderTestTaskPayload = { proj, ss ->
    def match = null
    proj.tasks.withType(org.gradle.api.tasks.testing.Test).each { testTask ->
        def classesDirs = girderTryGet { testTask.testClassesDirs.files } ?: []
        def outputs = girderTryGet { ss.output.classesDirs.files } ?: []
        if (!match && classesDirs.any { dir -> outputs.contains(dir) }) {
            match = testTask
        }
    }
    if (match == null) {
        return null
    }
    [name: match.name, hasSources: !(girderTryGet { ss.allSource.isEmpty() } ?: true)]
}

def girderArchives = { proj, ss ->
    def archives = []
    proj.tasks.withType(org.gradle.api.tasks.bundling.AbstractArchiveTask).each { archiveTask ->
        def classesDirs = girderTryGet { ss.output.classesDirs.files } ?: []
        def inputs = girderTryGet { archiveTask.inputs.files.files } ?: []
        def bundled = classesDirs.findAll { dir -> inputs.contains(dir) }
        if (!bundled.isEmpty()) {
            def file = girderTryGet { archiveTask.archiveFile.get().asFile.absolutePath }
            if (file != null) {
                archives << [file: file, classDirs: bundled.collect { it.absolutePath }]
            }
        }
    }
    archives
}

def girderModuleDependencies = { proj, ss ->
    def deps = []
    def configuration = girderTryGet {
        proj.configurations.getByName(ss.compileClasspathConfigurationName)
    }
    if (configuration == null) {
        return deps
    }
    girderTryGet {
        configuration.resolvedConfiguration.lenientConfiguration.artifacts.each { artifact ->
            def id = artifact.moduleVersion.id
            deps << [
                group: id.group,
                name: id.name,
                version: id.version,
                artifacts: [[uri: artifact.file.toURI().toString(), classifier: artifact.classifier]],
            ]
        }
    }
    deps
}

def girderSourceSetPayload = { proj, ss ->
    def compileTask = proj.tasks.findByName(ss.compileJavaTaskName)
    def payload = [:]
    payload.name = ss.name
    payload.classesTaskName = ss.classesTaskName
    payload.taskNames = [ss.compileJavaTaskName, ss.processResourcesTaskName, ss.classesTaskName]
    if (ss.name == 'main' && proj.pluginManager.hasPlugin('application')) {
        payload.taskNames << 'run'
    }
    payload.sourceDirs = girderPaths(girderTryGet { ss.allJava.srcDirs } ?: []) +
        girderPaths(girderTryGet { ss.allSource.srcDirs } ?: [])
    payload.compileTaskSources = compileTask == null ? [] :
        girderPaths(girderTryGet { compileTask.source.files } ?: [])
    payload.resourceDirs = girderPaths(girderTryGet { ss.resources.srcDirs } ?: [])
    payload.sourceOutputDirs = girderPaths(girderTryGet { ss.output.classesDirs.files } ?: [])
    payload.resourceOutputDir = girderTryGet { ss.output.resourcesDir?.absolutePath }
    payload.archives = girderArchives(proj, ss)
    payload.compileClasspath = girderPaths(girderTryGet { ss.compileClasspath.files } ?: [])
    payload.moduleDependencies = girderModuleDependencies(proj, ss)
    def languages = ['java']
    if (proj.pluginManager.hasPlugin('scala')) { languages << 'scala' }
    if (proj.pluginManager.hasPlugin('groovy')) { languages << 'groovy' }
    if (proj.pluginManager.hasPlugin('org.jetbrains.kotlin.jvm')) { languages << 'kotlin' }
    payload.languages = languages
    def testTask = girderTestTaskPayload(proj, ss)
    if (testTask != null) {
        payload.testTask = testTask
    }
    def java = girderJavaPayload(proj, compileTask)
    if (java != null) {
        payload.java = java
    }
    payload
}

def girderAndroidVariantPayload = { proj, variant, girderPathsRef ->
    def payload = [:]
    payload.name = girderTryGet { variant.name }
    if (girderTryGet { variant.hasProperty('testedVariant') && variant.testedVariant != null }) {
        payload.testedVariant = [name: girderTryGet { variant.testedVariant.name }]
    }
    payload.sourceSets = (girderTryGet { variant.sourceSets } ?: []).collect { ss ->
        [
            javaDirectories: girderPathsRef(girderTryGet { ss.javaDirectories } ?: []),
            resDirectories: girderPathsRef(girderTryGet { ss.resDirectories } ?: []),
            resourcesDirectories: girderPathsRef(girderTryGet { ss.resourcesDirectories } ?: []),
        ]
    }
    def resTask = girderTryGet { variant.processJavaResourcesProvider.get() }
    if (resTask != null) {
        payload.processJavaResourcesProvider =
            [destinationDir: girderTryGet { resTask.destinationDir.absolutePath }]
    }
    def mergeTask = girderTryGet { variant.mergeResourcesProvider.get() }
    if (mergeTask != null) {
        payload.mergeResourcesProvider =
            [outputDir: girderTryGet { mergeTask.outputDir.get().asFile.absolutePath }]
    }
    def javaCompile = girderTryGet { variant.javaCompileProvider.get() }
    if (javaCompile != null) {
        payload.javaCompileProvider = [
            destinationDir: girderTryGet { javaCompile.destinationDirectory.get().asFile.absolutePath },
            sources: girderPathsRef(girderTryGet { javaCompile.source.files } ?: []),
            sourceCompatibility: girderTryGet { javaCompile.sourceCompatibility },
            targetCompatibility: girderTryGet { javaCompile.targetCompatibility },
            declaredCompilerArgs: girderTryGet { javaCompile.options.compilerArgs } ?: [],
        ]
    }
    payload.compileConfiguration =
        [files: girderPathsRef(girderTryGet { variant.compileConfiguration.files } ?: [])]
    def rJar = girderTryGet {
        proj.tasks.findByName("process${payload.name.capitalize()}Resources")?.RClassOutputJar?.get()?.asFile
    }
    if (rJar != null && rJar.exists()) {
        payload.rClassOutputJar = rJar.absolutePath
    }
    payload
}

def girderAndroidPayload = { proj, girderPathsRef, variantPayloadRef ->
    def android = girderTryGet { proj.extensions.findByName('android') }
    if (android == null) {
        return null
    }
    def payload = [:]
    payload.plugins = [
        'com.android.application', 'com.android.library', 'com.android.dynamic-feature',
        'com.android.feature', 'com.android.test',
    ].findAll { id -> proj.pluginManager.hasPlugin(id) }
    payload.bootClasspath = girderPathsRef(girderTryGet {
        proj.extensions.findByName('androidComponents').sdkComponents.bootclasspathProvider.get().get()
            .collect { it.asFile }
    } ?: [])
    ['applicationVariants', 'libraryVariants', 'featureVariants', 'testVariants',
     'unitTestVariants'].each { collection ->
        def variants = girderTryGet { android."${collection}" }
        if (variants != null) {
            payload."${collection}" = variants.collect { variantPayloadRef(proj, it, girderPathsRef) }
        }
    }
    payload
}

def girderProjectPayload = { proj, girderPathsRef, androidRef, variantRef, sourceSetRef ->
    try {
        def payload = [:]
        payload.projectName = proj.name
        payload.projectPath = proj.path
        payload.projectDir = proj.projectDir.absolutePath
        payload.rootDir = proj.rootDir.absolutePath
        payload.gradleVersion = proj.gradle.gradleVersion
        payload.javaHome = girderTryGet { System.getProperty('java.home') }
        def android = androidRef(proj, girderPathsRef, variantRef)
        if (android != null) {
            payload.android = android
        } else {
            def sourceSets = girderTryGet { proj.sourceSets }
            payload.sourceSets = sourceSets == null ? [] :
                sourceSets.collect { sourceSetRef(proj, it) }
        }
        return payload
    } catch (Throwable t) {
        return [projectPath: proj.path, error: t.toString()]
    }
}

projectsEvaluated { g ->
    def root = g.rootProject
    root.tasks.register('girderWorkspaceModel') { task ->
        g.includedBuilds.each { included ->
            girderTryGet { task.dependsOn(included.task(':girderWorkspaceModel')) }
        }
        task.doLast {
            def payload = [
                gradleVersion: g.gradleVersion,
                rootProjectName: root.name,
                projects: root.allprojects.collect {
                    girderProjectPayload(it, girderPaths, girderAndroidPayload,
                        girderAndroidVariantPayload, girderSourceSetPayload)
                },
            ]
            println 'GIRDER_BUILD_JSON_BEGIN'
            println JsonOutput.toJson(payload)
            println 'GIRDER_BUILD_JSON_END'
        }
    }
}
"##;
