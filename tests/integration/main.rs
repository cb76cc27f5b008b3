//! Integration tests for Gantry

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn gantry() -> Command {
        cargo_bin_cmd!("gantry")
    }

    /// A throwaway project with its own config file so tests never touch
    /// the user's real config or cache store.
    struct Project {
        dir: TempDir,
        config: std::path::PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let cache_dir = dir.path().join("store");
            let config = dir.path().join("config.toml");
            std::fs::write(
                &config,
                format!("[cache]\ndir = \"{}\"\n", cache_dir.display()),
            )
            .unwrap();
            Self { dir, config }
        }

        fn write_pipeline(&self, content: &str) {
            std::fs::write(self.dir.path().join("gantry.toml"), content).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = gantry();
            cmd.current_dir(self.dir.path());
            cmd.args(["--config", &self.config.display().to_string()]);
            cmd
        }
    }

    const LOCAL_PIPELINE: &str = r#"
name = "toy"

[[steps]]
name = "prepare"
command = ["sh", "-c", "echo GREETING=hello >> \"$GANTRY_ENV\""]

[[steps]]
name = "check"
command = ["sh", "-c", "test \"$GREETING\" = hello && touch checked"]
"#;

    #[test]
    fn help_displays() {
        // The about line comes from Cargo.toml's description
        gantry()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Revision-cached build and test pipeline runner",
            ));
    }

    #[test]
    fn version_displays() {
        gantry()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gantry"));
    }

    #[test]
    fn init_creates_pipeline_file() {
        let project = Project::new();
        project
            .cmd()
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("gantry.toml"));
        assert!(project.dir.path().join("gantry.toml").exists());

        // A second init without --force must refuse
        project
            .cmd()
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        project.cmd().args(["init", "--force"]).assert().success();
    }

    #[test]
    fn steps_lists_pipeline() {
        let project = Project::new();
        project.write_pipeline(LOCAL_PIPELINE);

        project
            .cmd()
            .arg("steps")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("prepare").and(predicate::str::contains("check")),
            );
    }

    #[test]
    fn run_without_pipeline_hints_init() {
        let project = Project::new();
        project
            .cmd()
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("gantry init"));
    }

    #[test]
    fn run_passes_env_between_steps() {
        let project = Project::new();
        project.write_pipeline(LOCAL_PIPELINE);

        project
            .cmd()
            .arg("run")
            .assert()
            .success()
            .stdout(predicate::str::contains("passed"));

        // The second step only creates this file when it saw the first
        // step's exported variable.
        assert!(project.dir.path().join("checked").exists());

        // Run state lands under .gantry/runs/<cell>
        let runs = project.dir.path().join(".gantry").join("runs");
        assert!(runs.exists());
    }

    #[test]
    fn run_fails_fast_and_skips_rest() {
        let project = Project::new();
        project.write_pipeline(
            r#"
name = "failing"

[[steps]]
name = "boom"
command = ["sh", "-c", "exit 3"]

[[steps]]
name = "after"
command = ["sh", "-c", "touch should-not-exist"]
"#,
        );

        project
            .cmd()
            .arg("run")
            .assert()
            .failure()
            .stdout(predicate::str::contains("failed"));
        assert!(!project.dir.path().join("should-not-exist").exists());
    }

    #[test]
    fn run_unknown_step_fails() {
        let project = Project::new();
        project.write_pipeline(LOCAL_PIPELINE);

        project
            .cmd()
            .args(["run", "nonsense"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nonsense"));
    }

    #[test]
    fn run_subset_by_number() {
        let project = Project::new();
        project.write_pipeline(LOCAL_PIPELINE);

        // Step 1 alone passes; it only writes the env file
        project.cmd().args(["run", "1"]).assert().success();
        assert!(!project.dir.path().join("checked").exists());
    }

    #[test]
    fn run_unknown_cell_fails() {
        let project = Project::new();
        project.write_pipeline(LOCAL_PIPELINE);

        project
            .cmd()
            .args(["run", "--cell", "windows-2022/default"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("windows-2022/default"));
    }

    #[test]
    fn cache_list_empty() {
        let project = Project::new();
        project
            .cmd()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("empty"));

        project
            .cmd()
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn cache_gc_empty() {
        let project = Project::new();
        project
            .cmd()
            .args(["cache", "gc", "--days", "7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No entries"));
    }

    #[test]
    fn cache_clear_empty() {
        let project = Project::new();
        project
            .cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("empty"));
    }

    #[test]
    fn config_path_and_show() {
        let project = Project::new();
        project
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        project
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_set_roundtrip() {
        let project = Project::new();
        project
            .cmd()
            .args(["config", "set", "cache.gc_days", "7"])
            .assert()
            .success();

        project
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("gc_days = 7"));

        project
            .cmd()
            .args(["config", "set", "bogus.key", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn status_runs() {
        let project = Project::new();
        project
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("git client"));
    }
}

/// End-to-end cache gate tests against a local git repository. These need
/// a git binary; they are skipped when none is on PATH.
mod cache_gate_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git_available() -> bool {
        StdCommand::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.org")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.org")
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Create a local upstream repository with one commit on main
    fn make_upstream(root: &Path) -> std::path::PathBuf {
        let upstream = root.join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        git(&upstream, &["init", "-b", "main"]);
        std::fs::write(upstream.join("README"), "upstream\n").unwrap();
        git(&upstream, &["add", "."]);
        git(&upstream, &["commit", "-m", "initial"]);
        upstream
    }

    fn write_project(root: &Path, upstream: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let project = root.join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join("gantry.toml"),
            format!(
                r#"
name = "gated"

[upstream]
url = "{}"
ref = "main"

[cache]
path = "builds"

[[steps]]
name = "build"
command = ["sh", "-c", "mkdir -p builds && date +%s%N > builds/artifact && echo built >> '{}'"]
cached = true

[[steps]]
name = "test"
command = ["sh", "-c", "test -f builds/artifact"]
"#,
                upstream.display(),
                root.join("build-count").display()
            ),
        )
        .unwrap();

        let config = root.join("config.toml");
        std::fs::write(
            &config,
            format!("[cache]\ndir = \"{}\"\n", root.join("store").display()),
        )
        .unwrap();
        (project, config)
    }

    fn run(project: &Path, config: &Path, extra: &[&str]) -> assert_cmd::assert::Assert {
        let mut cmd: Command = cargo_bin_cmd!("gantry");
        cmd.current_dir(project)
            .args(["--config", &config.display().to_string()])
            .arg("run")
            .args(extra);
        cmd.assert()
    }

    #[test]
    fn miss_builds_then_hit_restores() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        let upstream = make_upstream(root.path());
        let (project, config) = write_project(root.path(), &upstream);

        // First run: miss, build executes and the entry is stored
        run(&project, &config, &[]).success().stdout(
            predicate::str::contains("miss").and(predicate::str::contains("passed")),
        );
        let count = std::fs::read_to_string(root.path().join("build-count")).unwrap();
        assert_eq!(count.lines().count(), 1);

        let artifact_after_build =
            std::fs::read_to_string(project.join("builds").join("artifact")).unwrap();

        // Second run: same revision, hit; the build step is skipped and
        // the stored artifact comes back verbatim.
        std::fs::remove_dir_all(project.join("builds")).unwrap();
        run(&project, &config, &[]).success().stdout(
            predicate::str::contains("hit").and(predicate::str::contains("passed")),
        );
        let count = std::fs::read_to_string(root.path().join("build-count")).unwrap();
        assert_eq!(count.lines().count(), 1, "cached build ran again");
        let artifact_restored =
            std::fs::read_to_string(project.join("builds").join("artifact")).unwrap();
        assert_eq!(artifact_after_build, artifact_restored);
    }

    #[test]
    fn new_revision_misses() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        let upstream = make_upstream(root.path());
        let (project, config) = write_project(root.path(), &upstream);

        run(&project, &config, &[]).success();

        // Advance the upstream; the old entry no longer matches
        std::fs::write(upstream.join("README"), "changed\n").unwrap();
        git(&upstream, &["add", "."]);
        git(&upstream, &["commit", "-m", "change"]);

        run(&project, &config, &[])
            .success()
            .stdout(predicate::str::contains("miss"));
        let count = std::fs::read_to_string(root.path().join("build-count")).unwrap();
        assert_eq!(count.lines().count(), 2);
    }

    #[test]
    fn fresh_rebuilds_despite_entry() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        let upstream = make_upstream(root.path());
        let (project, config) = write_project(root.path(), &upstream);

        run(&project, &config, &[]).success();
        run(&project, &config, &["--fresh"])
            .success()
            .stdout(predicate::str::contains("miss"));
        let count = std::fs::read_to_string(root.path().join("build-count")).unwrap();
        assert_eq!(count.lines().count(), 2);
    }

    #[test]
    fn unreachable_upstream_is_fatal() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        let upstream = make_upstream(root.path());
        let (project, config) = write_project(root.path(), &upstream);

        // Point the pipeline at a repository that does not exist
        std::fs::remove_dir_all(&upstream).unwrap();
        run(&project, &config, &[]).failure();
        assert!(!root.path().join("build-count").exists());
    }

    #[test]
    fn no_cache_bypasses_gate() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        let upstream = make_upstream(root.path());
        let (project, config) = write_project(root.path(), &upstream);

        run(&project, &config, &["--no-cache"])
            .success()
            .stdout(predicate::str::contains("off"));
        // Bypassed runs store nothing
        assert!(
            std::fs::read_dir(root.path().join("store"))
                .map(|mut d| d.next().is_none())
                .unwrap_or(true)
        );

        // cache info reports the key as a miss afterwards
        let mut cmd: Command = cargo_bin_cmd!("gantry");
        cmd.current_dir(&project)
            .args(["--config", &config.display().to_string()])
            .args(["cache", "info"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("miss"));
    }
}
