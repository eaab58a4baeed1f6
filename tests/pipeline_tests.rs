//! End-to-end pipeline runs with a shell script standing in for the JVM.
//!
//! `java = "sh"` и `jvm_flags = [script]` дают команду
//! `sh fake-java.sh -jar compiler.jar <flags>`.

#![cfg(unix)]

use ccompiler::{
    CompilationOptions, CompilerLocator, FailureReason, FileGroup, Pipeline, RunOutcome,
    SuccessPolicy, TaskConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Пишет склеенные исходники в `--js_output_file`, аргументы в args.txt,
/// сводку в stderr. Источник `bad.js` даёт код 1 и пустой вывод.
const FAKE_JAVA: &str = r#"
out=""
prev=""
mode=""
srcs=""
for arg in "$@"; do
  if [ "$prev" = "--js_output_file" ]; then out="$arg"; fi
  if [ "$mode" = "js" ]; then srcs="$srcs $arg"; fi
  if [ "$arg" = "--js" ]; then mode="js"; fi
  prev="$arg"
done
printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
case "$srcs" in
  *bad.js*) exit 1 ;;
esac
for s in $srcs; do cat "$s" >> "$out"; done
echo "0 error(s), 0 warning(s)" >&2
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fake-java.sh"), FAKE_JAVA).unwrap();
        fs::write(dir.path().join("compiler.jar"), "").unwrap();
        fs::write(dir.path().join("first.js"), "var first = 1;\n").unwrap();
        fs::write(dir.path().join("second.js"), "var second = 2;\n").unwrap();
        fs::write(dir.path().join("bad.js"), "var = ;\n").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn options(&self) -> CompilationOptions {
        let mut options = CompilationOptions::new()
            .with_closure_path(self.path("compiler.jar"))
            .with_flag("compilation_level", "SIMPLE");
        options.java = Some("sh".to_string());
        options.jvm_flags = Some(vec![self.path("fake-java.sh").to_string_lossy().into_owned()]);
        options.log_file = Some(self.path("closure.log"));
        options
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new().locator(CompilerLocator::new())
    }

    fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.path("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn compiles_group_and_appends_source_mapping() {
    let project = Project::new();
    let group = FileGroup::new(
        project.path("build dir/app.min.js"),
        [project.path("first.js"), project.path("second.js")],
    );

    let outcomes = project.pipeline().run(&project.options(), &[group]).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_success(), "{:?}", outcomes[0]);
    assert_eq!(
        read(&project.path("build dir/app.min.js")),
        "var first = 1;\nvar second = 2;\n//# sourceMappingURL=app.min.js.map\n"
    );
    assert_eq!(read(&project.path("closure.log")), "0 error(s), 0 warning(s)\n");
}

#[test]
fn passes_arguments_without_shell_splitting() {
    let project = Project::new();
    let dest = project.path("build dir/app.min.js");
    let group = FileGroup::new(&dest, [project.path("first.js")]);

    project.pipeline().run(&project.options(), &[group]).unwrap();

    let args = project.recorded_args();
    let dest = dest.to_string_lossy().into_owned();
    assert_eq!(args[0], "-jar");
    assert_eq!(args[2..4], ["--compilation_level", "SIMPLE"]);
    assert_eq!(args[4], "--create_source_map");
    assert_eq!(args[5], format!("{}.map", dest));
    assert_eq!(args[6], "--js_output_file");
    assert_eq!(args[7], dest);
    assert_eq!(args[8], "--js");
}

#[test]
fn override_replaces_generated_flags() {
    let project = Project::new();
    let options = project
        .options()
        .with_override("--compilation_level WHITESPACE_ONLY --angular_pass");
    let group = FileGroup::new(project.path("out.min.js"), [project.path("first.js")]);

    project.pipeline().run(&options, &[group]).unwrap();

    let args = project.recorded_args();
    assert_eq!(
        args[2..6],
        ["--compilation_level", "WHITESPACE_ONLY", "--angular_pass", "--create_source_map"]
    );
}

#[test]
fn failed_group_does_not_stop_the_run() {
    let project = Project::new();
    let mut options = project.options();
    options.success = Some(SuccessPolicy::ExitStatus);
    let groups = vec![
        FileGroup::new(project.path("bad.min.js"), [project.path("bad.js")]),
        FileGroup::new(project.path("good.min.js"), [project.path("first.js")]),
    ];

    let outcomes = project.pipeline().run(&options, &groups).unwrap();

    match &outcomes[0] {
        RunOutcome::Failure(failure) => {
            assert_eq!(failure.reason, FailureReason::ExitStatus(Some(1)))
        }
        other => panic!("expected failure: {:?}", other),
    }
    assert!(outcomes[1].is_success());
    assert_eq!(read(&project.path("bad.min.js")), "");
    assert_eq!(read(&project.path("closure.log")), "0 error(s), 0 warning(s)\n");
}

#[test]
fn log_accumulates_across_runs() {
    let project = Project::new();
    let group = FileGroup::new(project.path("out.min.js"), [project.path("first.js")]);

    let pipeline = project.pipeline();
    pipeline.run(&project.options(), &[group.clone()]).unwrap();
    pipeline.run(&project.options(), &[group]).unwrap();

    assert_eq!(
        read(&project.path("closure.log")),
        "0 error(s), 0 warning(s)\n0 error(s), 0 warning(s)\n"
    );
}

#[test]
fn runs_targets_from_config() {
    let project = Project::new();
    let root = project.dir.path().to_string_lossy().into_owned();
    let config = TaskConfig::from_toml(&format!(
        r#"
jobs = 2

[options]
closure_path = "{root}/compiler.jar"
java = "sh"
jvm_flags = ["{root}/fake-java.sh"]
log_file = "{root}/closure.log"

[targets.first.files]
"{root}/dist/first.min.js" = ["{root}/first.js"]
"{root}/dist/both.min.js" = ["{root}/first.js", "{root}/second.js"]

[targets.second.options]
compilation_level = "ADVANCED"

[targets.second.files]
"{root}/dist/second.min.js" = ["{root}/second.js"]
"#
    ))
    .unwrap();

    let pipeline = project.pipeline().jobs(config.jobs.unwrap_or(1));
    let mut dests = Vec::new();
    for target in config.resolve_targets(&[]).unwrap() {
        for outcome in pipeline.run(&target.options, &target.groups).unwrap() {
            assert!(outcome.is_success(), "{:?}", outcome);
            dests.push(outcome.dest().to_path_buf());
        }
    }

    assert_eq!(
        dests,
        vec![
            project.path("dist/first.min.js"),
            project.path("dist/both.min.js"),
            project.path("dist/second.min.js"),
        ]
    );
    assert!(read(&project.path("dist/both.min.js")).starts_with("var first = 1;\nvar second = 2;\n"));
    assert_eq!(read(&project.path("closure.log")).lines().count(), 3);
}
