use std::time::Duration;

/// How to build and run source written in one language.
///
/// Command templates may use `{source}` (the source file name), `{binary}`
/// (an executable path inside the work dir), `{class}` (the Java public class
/// name) and `{dir}` (the work dir itself).
#[derive(Debug, Clone)]
pub struct Language {
    pub name: String,
    pub extension: String,
    pub comment_prefix: String,
    /// Name of the source file inside the work dir, same placeholders as commands
    pub source_file: String,
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
    pub timeout: Duration,
}

impl Language {
    pub fn interpreted(
        name: &str,
        extension: &str,
        comment_prefix: &str,
        run: &[&str],
        timeout: Duration,
    ) -> Self {
        Language {
            name: name.to_string(),
            extension: extension.to_string(),
            comment_prefix: comment_prefix.to_string(),
            source_file: format!("main.{extension}"),
            compile: None,
            run: to_strings(run),
            timeout,
        }
    }

    pub fn compiled(
        name: &str,
        extension: &str,
        comment_prefix: &str,
        compile: &[&str],
        run: &[&str],
        timeout: Duration,
    ) -> Self {
        Language {
            compile: Some(to_strings(compile)),
            ..Language::interpreted(name, extension, comment_prefix, run, timeout)
        }
    }
}

fn to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

pub fn default_languages() -> Vec<Language> {
    let mut java = Language::compiled(
        "java",
        "java",
        "//",
        &["javac", "{source}"],
        &["java", "-cp", "{dir}", "{class}"],
        Duration::from_secs(45),
    );
    java.source_file = "{class}.java".to_string();

    vec![
        Language::interpreted(
            "python",
            "py",
            "#",
            &["python3", "{source}"],
            Duration::from_secs(30),
        ),
        Language::interpreted(
            "javascript",
            "js",
            "//",
            &["node", "{source}"],
            Duration::from_secs(30),
        ),
        java,
        Language::compiled(
            "cpp",
            "cpp",
            "//",
            &["g++", "{source}", "-o", "{binary}"],
            &["{binary}"],
            Duration::from_secs(45),
        ),
        Language::compiled(
            "c",
            "c",
            "//",
            &["gcc", "{source}", "-o", "{binary}"],
            &["{binary}"],
            Duration::from_secs(45),
        ),
    ]
}
