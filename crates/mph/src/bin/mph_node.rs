//! Inspect and edit the model tree of a snapshot from the command line.
//!
//! ```text
//! mph-node <snapshot.json> <path>                     list children
//! mph-node <snapshot.json> <path> <property>          print property as JSON
//! mph-node <snapshot.json> <path> <property> <json>   set property, print it
//! mph-node --config [option]                          print configuration
//! ```
//!
//! Changes are not written back to the snapshot.

use log::error;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use mph::config::OPTIONS;
use mph::memory::MemoryDocument;
use mph::{Config, Error, HostValue, Model};

const USAGE: &str = "usage: mph-node <snapshot.json> <path> [property [value]]
       mph-node --config [option]";

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("--config") if args.len() <= 2 => Config::discover()
            .map_err(Error::from)
            .and_then(|config| show_config(&config, args.get(1).map(String::as_str))),
        _ if (2..=4).contains(&args.len()) => run(&args),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("mph-node: {err}");
            ExitCode::FAILURE
        }
    }
}

/// One `name = value` line per option, or the value of the named one.
fn show_config(config: &Config, name: Option<&str>) -> Result<String, Error> {
    if let Some(name) = name {
        return Ok(config.option(name)?.to_string());
    }
    let lines = OPTIONS
        .iter()
        .map(|name| -> Result<String, Error> { Ok(format!("{name} = {}", config.option(name)?)) })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn run(args: &[String]) -> Result<String, Error> {
    let document = MemoryDocument::load(&PathBuf::from(&args[0]))?;
    let model = Model::new(document)?;
    let node = model.node(&args[1]);
    if !node.exists()? {
        return Err(Error::Lookup(format!("node \"{node}\" does not exist in model tree")));
    }
    match (args.get(2), args.get(3)) {
        (None, _) => Ok(node
            .children()?
            .iter()
            .map(|child| child.path().to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        (Some(name), None) => Ok(node.property(name)?.to_json().to_string()),
        (Some(name), Some(raw)) => {
            let json: serde_json::Value = serde_json::from_str(raw)?;
            node.set_property(name, HostValue::from_json(&json)?)?;
            Ok(node.property(name)?.to_json().to_string())
        }
    }
}
