//! Command-line tool for inspecting and exercising redirect rules.
//!
//! Works offline against a configuration file (or the built-in rules): print
//! decisions for paths, answer an edge runtime event, or validate a config.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use edge_redirect::config::{load_config, EdgeConfig};
use edge_redirect::edge::handle_json;
use edge_redirect::redirect::{Action, RedirectRule, RedirectTable};

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Inspect and exercise edge redirect rules", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in rules are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decision for each request path
    Decide {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Handle an edge runtime event (JSON) and print the output
    Handle {
        /// Event file; stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Validate a configuration file and print its redirect table
    Check,
}

#[derive(Serialize)]
struct Decision<'a> {
    path: &'a str,
    #[serde(flatten)]
    action: Action,
}

#[derive(Serialize)]
struct Summary<'a> {
    bind_address: &'a str,
    origin: &'a str,
    passthrough: Vec<&'a str>,
    rules: &'a [RedirectRule],
    default_target: &'a str,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();
    run(cli, io::stdin().lock(), io::stdout().lock())
}

/// Execute one command. Events without `--event` are read from `input`.
fn run(cli: Cli, mut input: impl Read, mut out: impl Write) -> CliResult {
    if matches!(cli.command, Commands::Check) && cli.config.is_none() {
        return Err("check requires --config".into());
    }

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    let table: RedirectTable = config.redirects.build_table()?;

    match cli.command {
        Commands::Decide { paths } => {
            for path in &paths {
                let decision = Decision {
                    path,
                    action: table.decide(path),
                };
                writeln!(out, "{}", serde_json::to_string(&decision)?)?;
            }
        }
        Commands::Handle { event } => {
            let event = match event {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    input.read_to_string(&mut buf)?;
                    buf
                }
            };
            writeln!(out, "{}", handle_json(&table, &event)?)?;
        }
        Commands::Check => {
            let summary = Summary {
                bind_address: &config.listener.bind_address,
                origin: &config.origin.url,
                passthrough: table.passthrough_paths(),
                rules: table.rules(),
                default_target: table.default_target(),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const CONFIG: &str = r#"
        [redirects]
        passthrough = ["/keep"]
        default_target = "https://fallback.example/"

        [[redirects.rules]]
        match_path = "/go"
        target_url = "https://go.example/"
    "#;

    fn exec(args: &[&str], stdin: &str) -> Result<String, String> {
        let cli = Cli::try_parse_from(std::iter::once("edge-cli").chain(args.iter().copied()))
            .map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        run(cli, stdin.as_bytes(), &mut out).map_err(|e| e.to_string())?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn lines(output: &str) -> Vec<Value> {
        output.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[test]
    fn test_decide_with_builtin_rules() {
        let output = exec(&["decide", "/", "/page1.html", "/missing"], "").unwrap();
        let decisions = lines(&output);

        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0]["path"], "/");
        assert_eq!(decisions[0]["action"], "passthrough");
        assert_eq!(decisions[1]["action"], "redirect");
        assert_eq!(
            decisions[1]["location"],
            "https://docs.aws.amazon.com/ja_jp/AmazonCloudFront/latest/DeveloperGuide/Introduction.html"
        );
        assert_eq!(decisions[2]["location"], "https://aws.amazon.com/jp/");
    }

    #[test]
    fn test_decide_with_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(&path, CONFIG).unwrap();
        let config = path.to_str().unwrap();

        let output = exec(&["decide", "--config", config, "/keep", "/go", "/"], "").unwrap();
        let decisions = lines(&output);

        assert_eq!(decisions[0]["action"], "passthrough");
        assert_eq!(decisions[1]["location"], "https://go.example/");
        assert_eq!(decisions[2]["location"], "https://fallback.example/");
    }

    #[test]
    fn test_decide_requires_a_path() {
        assert!(exec(&["decide"], "").is_err());
    }

    #[test]
    fn test_handle_reads_event_from_stdin() {
        let output = exec(&["handle"], r#"{"request": {"uri": "/page1.html"}}"#).unwrap();
        let response: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(response["statusCode"], 301);
        assert_eq!(response["statusDescription"], "Moved Permanently");
        assert_eq!(
            response["headers"]["location"]["value"],
            "https://docs.aws.amazon.com/ja_jp/AmazonCloudFront/latest/DeveloperGuide/Introduction.html"
        );
    }

    #[test]
    fn test_handle_reads_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        fs::write(&path, r#"{"request": {"uri": "/", "method": "GET"}}"#).unwrap();

        let output = exec(&["handle", "--event", path.to_str().unwrap()], "").unwrap();
        let request: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(request["uri"], "/");
        assert_eq!(request["method"], "GET");
    }

    #[test]
    fn test_handle_rejects_malformed_event() {
        assert!(exec(&["handle"], "{not json").is_err());
    }

    #[test]
    fn test_check_requires_config() {
        let err = exec(&["check"], "").unwrap_err();
        assert_eq!(err, "check requires --config");
    }

    #[test]
    fn test_check_summarises_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(&path, CONFIG).unwrap();

        let output = exec(&["check", "--config", path.to_str().unwrap()], "").unwrap();
        let summary: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(summary["passthrough"], serde_json::json!(["/keep"]));
        assert_eq!(summary["rules"][0]["match_path"], "/go");
        assert_eq!(summary["default_target"], "https://fallback.example/");
    }

    #[test]
    fn test_check_reports_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let err = exec(&["check", "--config", path.to_str().unwrap()], "").unwrap_err();
        assert!(err.contains("timeouts.request_secs"), "{err}");
    }
}
