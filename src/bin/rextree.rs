//! Command-line interface for rextree
//!
//! Usage:
//!   rextree inspect `<regex>` [--format `<format>`]   - Print the structural tree
//!   rextree check `<regex>`                         - Validate a regex
//!   rextree filter `<regex>` `<filter>`               - Show filter visibility marks

use clap::{Arg, Command};

use rextree::rextree::diag::StderrDiagnostics;
use rextree::rextree::models::tokens::TokenTreeModel;
use rextree::rextree::snapshot::{render_text, snapshot_tokens};
use rextree::rextree::validation::{EngineValidator, RegexValidator};

fn main() {
    let matches = Command::new("rextree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit regular expressions as structural trees")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("inspect")
                .about("Print the structural tree of a regex")
                .arg(
                    Arg::new("regex")
                        .help("The regular expression to decompose")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('text' or 'json')")
                        .default_value("text"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a regex against the engine")
                .arg(
                    Arg::new("regex")
                        .help("The regular expression to validate")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("filter")
                .about("Show which tree rows a filter keeps visible")
                .arg(
                    Arg::new("regex")
                        .help("The regular expression to decompose")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("filter")
                        .help("Case-insensitive filter over node values")
                        .required(true)
                        .index(2),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("inspect", sub)) => {
            let regex = sub.get_one::<String>("regex").unwrap();
            let format = sub.get_one::<String>("format").unwrap();
            handle_inspect(regex, format);
        }
        Some(("check", sub)) => {
            let regex = sub.get_one::<String>("regex").unwrap();
            handle_check(regex);
        }
        Some(("filter", sub)) => {
            let regex = sub.get_one::<String>("regex").unwrap();
            let filter = sub.get_one::<String>("filter").unwrap();
            handle_filter(regex, filter);
        }
        _ => unreachable!(),
    }
}

fn build_model(regex: &str) -> TokenTreeModel {
    let mut model =
        TokenTreeModel::with_ports(Box::new(EngineValidator), Box::new(StderrDiagnostics));
    model.set_used_regex(regex);
    if model.tree().child_count(model.tree().root()) == 0 && !regex.is_empty() {
        eprintln!("Error: the regex did not compile");
        std::process::exit(1);
    }
    model
}

fn handle_inspect(regex: &str, format: &str) {
    let model = build_model(regex);
    let snapshot = snapshot_tokens(model.tree());
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&snapshot).unwrap_or_else(|e| {
                eprintln!("Error serializing tree: {}", e);
                std::process::exit(1);
            });
            println!("{}", json);
        }
        "text" => print!("{}", render_text(&snapshot)),
        other => {
            eprintln!("Error: unknown format '{}'", other);
            std::process::exit(1);
        }
    }
}

fn handle_check(regex: &str) {
    match EngineValidator.validate(regex) {
        Ok(()) => println!("ok"),
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    }
}

fn handle_filter(regex: &str, filter: &str) {
    let mut model = build_model(regex);
    let entries = model.filter_tokens(filter);
    let snapshot = snapshot_tokens(model.tree());
    print!("{}", render_text(&snapshot));
    let visible = entries.iter().filter(|e| !e.filtered).count();
    println!("{} of {} rows visible", visible, entries.len());
}
