use anyhow::{bail, Context, Result};
use cirrus_api::StackConfig;
use cirrus_core::{plan_stack, project_outputs, validate_stack};
use cirrus_engine::{load_state, save_state, Applier, MemoryProvider};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::fmt::init as tracing_init;

const USAGE: &str = "\
Usage: cirrus <command> <stack.yaml> [options]

Commands:
  validate    Check the stack configuration and exit
  plan        Show what applying the stack would change
  apply       Realize the stack and print its outputs

Options:
  --state <path>   State file (default: cirrus.state.json)
  --dry-run        Apply against a throwaway provider; leave state untouched
";

#[derive(Debug, PartialEq)]
struct Args {
    command: String,
    stack_path: PathBuf,
    state_path: PathBuf,
    dry_run: bool,
}

/// Parse command-line arguments; `None` means help was requested
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut positional = Vec::new();
    let mut state_path = PathBuf::from("cirrus.state.json");
    let mut dry_run = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state" => {
                let value = args.next().context("--state needs a path")?;
                state_path = PathBuf::from(value);
            }
            "--dry-run" => dry_run = true,
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => bail!("unknown option {other}\n\n{USAGE}"),
            other => positional.push(other.to_string()),
        }
    }

    let Ok([command, stack_path]) = <[String; 2]>::try_from(positional) else {
        bail!("{USAGE}");
    };

    Ok(Some(Args {
        command,
        stack_path: PathBuf::from(stack_path),
        state_path,
        dry_run,
    }))
}

fn load_config(path: &PathBuf) -> Result<StackConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading stack file {}", path.display()))?;
    serde_yaml::from_str(&data).with_context(|| format!("parsing stack file {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        print!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    };
    let config = load_config(&args.stack_path)?;
    let stack = config.into_stack();

    match args.command.as_str() {
        "validate" => {
            if let Err(failure) = validate_stack(&stack) {
                eprintln!("{failure}");
                return Ok(ExitCode::FAILURE);
            }
            println!("Stack is valid: {} declarations", stack.len());
            Ok(ExitCode::SUCCESS)
        }
        "plan" => {
            if let Err(failure) = validate_stack(&stack) {
                eprintln!("{failure}");
                return Ok(ExitCode::FAILURE);
            }
            let snapshot = load_state(&args.state_path)?;
            let plan = plan_stack(&stack, &snapshot)?;
            for step in &plan.steps {
                println!("  {} {} ({})", step.action.symbol(), step.id, step.action);
            }
            println!("Plan: {} step(s), {} changing", plan.steps.len(), plan.changes());
            Ok(ExitCode::SUCCESS)
        }
        "apply" => {
            let snapshot = load_state(&args.state_path)?;
            let provider = MemoryProvider::from_snapshot(&snapshot);
            let applier = Applier::new(&provider);

            let (next, report) = applier.apply(&stack, &snapshot).await?;
            info!(
                "Applied: {} created, {} updated, {} deleted, {} unchanged",
                report.created.len(),
                report.updated.len(),
                report.deleted.len(),
                report.unchanged.len()
            );

            if args.dry_run {
                println!("Dry run; state not written");
            } else {
                save_state(&args.state_path, &next)?;
            }

            if !report.fully_realized() {
                for (id, message) in &report.failed {
                    eprintln!("failed: {id}: {message}");
                }
                for id in &report.skipped {
                    eprintln!("skipped: {id}");
                }
                return Ok(ExitCode::FAILURE);
            }

            let outputs = project_outputs(&stack, &next)?;
            print!("{}", serde_yaml::to_string(&outputs)?);
            Ok(ExitCode::SUCCESS)
        }
        other => bail!("unknown command {other}\n\n{USAGE}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_positionals_parse_in_order() {
        let args = parse(&["plan", "stack.yaml"]).unwrap().unwrap();
        assert_eq!(args.command, "plan");
        assert_eq!(args.stack_path, PathBuf::from("stack.yaml"));
        assert_eq!(args.state_path, PathBuf::from("cirrus.state.json"));
        assert!(!args.dry_run);
    }

    #[test]
    fn test_options_anywhere() {
        let args = parse(&["--state", "s.json", "apply", "stack.yaml", "--dry-run"])
            .unwrap()
            .unwrap();
        assert_eq!(args.command, "apply");
        assert_eq!(args.state_path, PathBuf::from("s.json"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(parse(&["--help"]).unwrap().is_none());
        assert!(parse(&["-h"]).unwrap().is_none());
        assert!(parse(&["apply", "stack.yaml", "--help"]).unwrap().is_none());
    }

    #[test]
    fn test_wrong_arity_and_unknown_options_fail() {
        assert!(parse(&["plan"]).is_err());
        assert!(parse(&["plan", "a.yaml", "extra"]).is_err());
        assert!(parse(&["plan", "a.yaml", "--verbose"]).is_err());
    }
}
