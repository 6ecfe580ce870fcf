//! verdict CLI — driving adapter for the verdict rule engine.
//!
//! Subcommands:
//! - `check <config>` — validate a rule set config
//! - `eval <config> [--value json] [--error kind=message [--meta key=value...] [--field field=message...]]... [--trace]`
//!   — map an outcome through the rule set and print the response
//! - `info` — print registered reason kinds
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::process;

use serde_json::Value;
use verdict::{EvalTrace, HttpResponse, ReasonRegistry, RuleSet};
use verdict_test::{OutcomeSpec, ReasonSpec};

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "eval" => cmd_eval(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "info" => cmd_info(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("eval requires a config file path".into());
    }

    let rules = load_rule_set(&args[0])?;
    let eval = parse_eval_args(&args[1..])?;
    tracing::debug!(rules = rules.len(), reasons = eval.outcome.errors.len(), "evaluating");

    if eval.trace {
        let trace = eval.outcome.trace_with(&rules).map_err(|e| e.to_string())?;
        print!("{}", render_trace(&trace));
        return Ok(());
    }

    let response = eval
        .outcome
        .map_with(&rules)
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("mapping failed: {e}"))?;
    print!("{}", render_response(&response));
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a config file path".into());
    }

    let rules = load_rule_set(&args[0])?;
    println!("Config valid ({} rules)", rules.len());
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_info() -> Result<(), String> {
    let registry = build_registry();

    println!("Registered reason kinds:");
    for name in registry.names() {
        println!("  {name}");
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> ReasonRegistry {
    let builder = verdict::ReasonRegistryBuilder::new();
    verdict_test::register(builder).build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_rule_set(path: &str) -> Result<RuleSet, String> {
    let config = load_config(path)?;
    build_registry()
        .load_rule_set_value(config)
        .map_err(|e| format!("config invalid: {e}"))
}

fn load_config(path: &str) -> Result<Value, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct EvalArgs {
    outcome: OutcomeSpec,
    trace: bool,
}

/// Parse `eval` options. `--meta` and `--field` attach to the preceding `--error`.
fn parse_eval_args(args: &[String]) -> Result<EvalArgs, String> {
    let mut eval = EvalArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--trace" => eval.trace = true,
            "--value" => {
                let raw = next_value(&mut iter, arg)?;
                let value = serde_json::from_str(raw)
                    .map_err(|e| format!("invalid --value \"{raw}\": {e}"))?;
                eval.outcome.value = Some(value);
            }
            "--error" => {
                let raw = next_value(&mut iter, arg)?;
                let (kind, message) = raw.split_once('=').unwrap_or((raw, ""));
                eval.outcome.errors.push(ReasonSpec::new(kind, message));
            }
            "--meta" => {
                let (key, value) = split_pair(next_value(&mut iter, arg)?)?;
                let reason = last_error(&mut eval.outcome, arg)?;
                *reason = reason.clone().with_metadata(key, parse_scalar(value));
            }
            "--field" => {
                let (field, message) = split_pair(next_value(&mut iter, arg)?)?;
                let reason = last_error(&mut eval.outcome, arg)?;
                *reason = reason.clone().with_field_error(field, message);
            }
            other => return Err(format!("unexpected argument \"{other}\"")),
        }
    }

    Ok(eval)
}

fn next_value<'a>(iter: &mut std::slice::Iter<'a, String>, flag: &str) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn split_pair(pair: &str) -> Result<(&str, &str), String> {
    pair.split_once('=')
        .ok_or_else(|| format!("invalid pair \"{pair}\", expected key=value"))
}

fn last_error<'a>(outcome: &'a mut OutcomeSpec, flag: &str) -> Result<&'a mut ReasonSpec, String> {
    outcome
        .errors
        .last_mut()
        .ok_or_else(|| format!("{flag} must follow an --error"))
}

/// JSON if it parses, otherwise the raw string.
fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════════════════════════

fn render_response(response: &HttpResponse) -> String {
    let status = response.status();
    let mut out = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    for (name, value) in response.headers() {
        out.push_str(&format!("{name}: {value}\n"));
    }
    if let Some(content_type) = response.content_type() {
        out.push_str(&format!("Content-Type: {content_type}\n"));
    }
    if let Some(body) = response.body() {
        out.push('\n');
        match serde_json::from_slice::<Value>(body) {
            Ok(json) => out.push_str(&serde_json::to_string_pretty(&json).unwrap_or_default()),
            Err(_) => out.push_str(&String::from_utf8_lossy(body)),
        }
        out.push('\n');
    }
    out
}

fn render_trace(trace: &EvalTrace) -> String {
    let mut out = String::new();
    for step in &trace.steps {
        let label = step
            .name
            .as_deref()
            .map_or_else(|| format!("#{}", step.index), |name| format!("#{} \"{name}\"", step.index));
        let verdict = if step.matched { "matched" } else { "skipped" };
        out.push_str(&format!("{label}: {verdict}\n"));
    }
    if trace.used_default {
        out.push_str("default success rule answered\n");
    }
    match &trace.result {
        Ok(response) => {
            out.push('\n');
            out.push_str(&render_response(response));
        }
        Err(e) => out.push_str(&format!("\nmapping failed: {e}\n")),
    }
    out
}

fn print_usage() {
    eprintln!(
        "Usage: verdict <command> [options]

Commands:
  check <config>                    Validate config
  eval <config> [options]           Map an outcome and print the response
      --value <json>                Success value
      --error <kind>=<message>      Add a failure reason (repeatable)
      --meta <key>=<value>          Metadata on the last --error
      --field <field>=<message>     Field error on the last --error
      --trace                       Print the rule-by-rule trace
  info                              Print registered reason kinds
  help                              Show this help"
    );
}
