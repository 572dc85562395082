use crossterm::style::Stylize;
use jotform_export::config::Config;
use jotform_export::{Report, SubmissionClient, SubmissionError};
use std::io;

fn print_help() {
    println!("{}", "jotform-export - Export form submissions".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  jotform-export [OPTIONS]");
    println!();
    println!("  Without options: print all submissions, then save them as JSON and CSV.");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}     - Initialize configuration with wizard",
        "--init-config".green()
    );
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Environment:".yellow());
    println!("  JOTFORM_API_KEY, JOTFORM_FORM_ID, JOTFORM_BASE_URL, JOTFORM_TIMEOUT_SECS");
    println!("  RUST_LOG controls log output on stderr");
    println!();
}

/// Print the outcome of one step. Failures are reported and never stop later steps.
fn report(step: &str, outcome: Result<Report, SubmissionError>) {
    match outcome {
        Ok(Report::Printed { .. }) => {}
        Ok(saved @ Report::Saved { .. }) => println!("{}", saved.to_string().green()),
        Ok(notice) => println!("{}", notice.to_string().yellow()),
        Err(e) if e.is_transport() => {
            eprintln!("{}", format!("{}: error fetching data: {}", step, e).red());
            println!("{}", "No data available.".yellow());
        }
        Err(e) => eprintln!("{}", format!("{}: {}", step, e).red()),
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // Check for config initialization
    if args.iter().any(|a| a == "--init-config") {
        match Config::init_wizard() {
            Ok(_) => {
                println!("\nConfiguration initialized successfully!");
                return Ok(());
            }
            Err(e) => {
                eprintln!("Error initializing config: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    // Check for config file generation
    if args.iter().any(|a| a == "--generate-config") {
        let path = Config::get_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Config::create_default_with_comments())?;
        println!("Configuration file created at: {:?}", path);
        println!("Add your API key and form ID, or set JOTFORM_API_KEY and JOTFORM_FORM_ID.");
        return Ok(());
    }

    if let Some(unknown) = args.first() {
        eprintln!("{}", format!("Unknown argument: {}", unknown).red());
        print_help();
        std::process::exit(2);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Error loading config: {:#}", e).red());
            std::process::exit(1);
        }
    };
    jotform_export::logging::init_tracing(&config.logging.level);

    let client = match SubmissionClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            eprintln!("Set JOTFORM_API_KEY and JOTFORM_FORM_ID, or run with --init-config.");
            std::process::exit(1);
        }
    };

    report("print", client.print_submissions(&mut io::stdout().lock()));
    report("save json", client.save_json(&config.output.json_path));
    report("save csv", client.save_csv(&config.output.csv_path));

    Ok(())
}
