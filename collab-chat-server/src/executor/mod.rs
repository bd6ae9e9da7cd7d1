use crate::errors::execution_error::ExecutionError;
use languages::{Language, default_languages};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

pub mod languages;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<i32>,
    /// Wall-clock seconds
    pub duration: f64,
}

impl ExecutionResult {
    fn failed(error: ExecutionError, duration: Duration) -> Self {
        let (stdout, exit_status) = match &error {
            ExecutionError::CompileFailed {
                stdout,
                exit_status,
                ..
            } => (stdout.clone(), *exit_status),
            _ => (String::new(), None),
        };

        let stderr = match &error {
            ExecutionError::Timeout(_) => String::from("Execution timed out"),
            error => error.to_string(),
        };

        ExecutionResult {
            success: false,
            stdout,
            stderr,
            exit_status,
            duration: duration.as_secs_f64(),
        }
    }
}

/// Runs source snippets in a fresh temporary directory per run
#[derive(Debug, Clone)]
pub struct CodeExecutor {
    languages: Arc<Vec<Language>>,
    work_root: PathBuf,
}

impl Default for CodeExecutor {
    fn default() -> Self {
        CodeExecutor::new(default_languages())
    }
}

impl CodeExecutor {
    pub fn new(languages: Vec<Language>) -> Self {
        CodeExecutor {
            languages: Arc::new(languages),
            work_root: std::env::temp_dir(),
        }
    }

    /// Parent directory for the per-run work dirs
    pub fn with_work_dir(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = work_root.into();
        self
    }

    pub fn language(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|language| language.name == name)
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|language| language.name.clone())
            .collect()
    }

    /// Like `execute`, but folds failures into an unsuccessful result for clients
    pub async fn run(&self, code: &str, language: &str, stdin: &str) -> ExecutionResult {
        let started = Instant::now();
        match self.execute(code, language, stdin).await {
            Ok(result) => result,
            Err(error) => {
                warn!("Execution of {language} code failed: {error}");
                ExecutionResult::failed(error, started.elapsed())
            }
        }
    }

    pub async fn execute(
        &self,
        code: &str,
        language: &str,
        stdin: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let Some(language) = self.language(language) else {
            return Err(ExecutionError::UnsupportedLanguage(language.to_string()));
        };

        let started = Instant::now();

        // Removed with everything in it when dropped, whichever way we leave
        let work_dir = tempfile::Builder::new()
            .prefix("exec-")
            .tempdir_in(&self.work_root)?;

        let placeholders = Placeholders {
            class: java_class_name(code),
            dir: work_dir.path().to_path_buf(),
        };

        let source_file = placeholders.fill(&language.source_file);
        tokio::fs::write(work_dir.path().join(&source_file), code).await?;

        if let Some(compile) = &language.compile {
            let argv = placeholders.fill_all(compile, &source_file);
            let output = run_process(&argv, work_dir.path(), "", language.timeout).await?;

            if !output.status.success() {
                return Err(ExecutionError::CompileFailed {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_status: output.status.code(),
                });
            }
        }

        let argv = placeholders.fill_all(&language.run, &source_file);
        let output = run_process(&argv, work_dir.path(), stdin, language.timeout).await?;
        let duration = started.elapsed();

        debug!(
            "{} run finished with {:?} in {:.2}s",
            language.name,
            output.status.code(),
            duration.as_secs_f64()
        );

        Ok(ExecutionResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_status: output.status.code(),
            duration: duration.as_secs_f64(),
        })
    }
}

struct Placeholders {
    class: String,
    dir: PathBuf,
}

impl Placeholders {
    fn fill(&self, template: &str) -> String {
        let dir = self.dir.to_string_lossy();
        template
            .replace("{class}", &self.class)
            .replace("{binary}", &self.dir.join("program").to_string_lossy())
            .replace("{dir}", &dir)
    }

    fn fill_all(&self, templates: &[String], source_file: &str) -> Vec<String> {
        templates
            .iter()
            .map(|template| self.fill(&template.replace("{source}", source_file)))
            .collect()
    }
}

fn java_class_name(code: &str) -> String {
    Regex::new(r"public\s+class\s+(\w+)")
        .ok()
        .and_then(|regex| regex.captures(code))
        .and_then(|captures| captures.get(1))
        .map(|class| class.as_str().to_string())
        .unwrap_or_else(|| String::from("Main"))
}

async fn run_process(
    argv: &[String],
    dir: &Path,
    stdin: &str,
    limit: Duration,
) -> Result<Output, ExecutionError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ExecutionError::Spawn {
            program: String::new(),
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        });
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group so a timeout also takes down anything the program forked
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
        program: program.clone(),
        source,
    })?;

    let pid = child.id();
    if let Some(mut child_stdin) = child.stdin.take() {
        let input = stdin.as_bytes().to_vec();
        tokio::spawn(async move {
            // The program may exit without reading its input
            if let Err(error) = child_stdin.write_all(&input).await {
                debug!("Could not write program input: {error}");
            }
        });
    }

    match timeout(limit, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            kill_process_group(pid);
            Err(ExecutionError::Timeout(limit))
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };

    // SAFETY: killpg only sends a signal to the group the child leads
    unsafe {
        libc::killpg(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
