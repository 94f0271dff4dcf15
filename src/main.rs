// Entry point and CLI flow.
//
// `validate` and `report` run once and exit. With no subcommand the binary
// falls back to the interactive menu:
// - Option [1] loads a survey file and prints ingestion diagnostics.
// - Option [2] computes statistics, writes the JSON and CSV outputs and
//   prints previews.
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use survey_report::pipeline::{Ingestion, Pipeline, Session};
use survey_report::{output, reports, util, IngestError, Settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "survey_report")]
#[command(about = "Validate construction-site survey spreadsheets and compute their statistics", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a survey file and print its diagnostics without writing reports
    Validate {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Ingest a survey file and write statistics and summary tables
    Report {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory for the generated files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    let settings = match path {
        Some(p) => Settings::load(p).map_err(|e| format!("{}: {}", p.display(), e))?,
        None => Settings::default(),
    };
    Ok(settings.with_env())
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_problems(err: &IngestError) {
    if err.problems().is_empty() {
        eprintln!("Error: {}", err);
        return;
    }
    eprintln!("The file was rejected:");
    for p in err.problems() {
        eprintln!("  - {}", p);
    }
}

fn run_validate(settings: &Settings, input: &Path) -> ExitCode {
    match Pipeline::new(settings).ingest_file(input) {
        Ok(ingestion) => {
            print_ingestion(&ingestion);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(path = %input.display(), "dataset rejected");
            print_problems(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_ingestion(ingestion: &Ingestion) {
    let report = &ingestion.report;
    println!(
        "Processing dataset... ({} rows loaded, {} records built)",
        util::format_int(report.rows),
        util::format_int(report.records)
    );
    if !report.skipped.is_empty() {
        println!(
            "Note: {} rows skipped due to missing or invalid coordinates.",
            util::format_int(report.skipped.len())
        );
    }
    let defaulted = report.normalization.total_defaulted();
    if defaulted > 0 {
        println!(
            "Info: {} unreadable cells were replaced by defaults.",
            util::format_int(defaulted)
        );
    }
    if report.consistency_warnings > 0 {
        println!(
            "Warning: {} rows report a worker total that differs from the sum by category.",
            util::format_int(report.consistency_warnings)
        );
    }
    if report.geographic.total > 0 {
        println!(
            "Warning: {} points fall outside the expected region.",
            util::format_int(report.geographic.total)
        );
    }
    if report.start_after_submission > 0 {
        println!(
            "Warning: {} records were started after their submission date.",
            util::format_int(report.start_after_submission)
        );
    }
    println!();
}

/// Writes every output for `ingestion` into `dir` and prints previews.
fn generate_reports(
    settings: &Settings,
    ingestion: &Ingestion,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating reports...");
    println!("Outputs saved to {}\n", dir.display());

    let stats = ingestion.statistics(settings);
    output::write_json(output::output_path(dir, "estadisticas.json")?, &stats)?;
    output::write_json(output::output_path(dir, "ingesta.json")?, &ingestion.report)?;

    let core = &stats.statistics;

    let statuses = reports::status_report(core);
    let file = output::output_path(dir, "estados_obra.csv")?;
    output::write_csv(&file, &statuses)?;
    println!("Report 1: Work status\n");
    output::preview_table_rows(&statuses, 5);
    println!("(Full table exported to {})\n", file.display());

    let workforce = reports::workforce_report(core);
    let file = output::output_path(dir, "recursos_humanos.csv")?;
    output::write_csv(&file, &workforce)?;
    println!("Report 2: Workforce by category\n");
    output::preview_table_rows(&workforce, 5);
    println!("(Full table exported to {})\n", file.display());

    let machinery = reports::machinery_report(core);
    let file = output::output_path(dir, "maquinaria.csv")?;
    output::write_csv(&file, &machinery)?;
    println!("Report 3: Machinery hours\n");
    output::preview_table_rows(&machinery, 5);
    println!("(Full table exported to {})\n", file.display());

    let groups = reports::activity_group_report(core);
    let file = output::output_path(dir, "actividades_por_grupo.csv")?;
    output::write_csv(&file, &groups)?;
    println!("Report 4: Construction activities by group\n");
    output::preview_table_rows(&groups, 5);
    println!("(Full table exported to {})\n", file.display());

    let top = reports::top_activity_report(core);
    let file = output::output_path(dir, "actividades_principales.csv")?;
    output::write_csv(&file, &top)?;
    println!("Report 5: Most common activities\n");
    output::preview_table_rows(&top, settings.top_activities);
    println!("(Full table exported to {})\n", file.display());

    let interventions =
        reports::intervention_report(ingestion.repository.records(), &settings.bounding_box);
    let file = output::output_path(dir, "intervenciones.csv")?;
    output::write_csv(&file, &interventions)?;
    println!("Report 6: Interventions\n");
    output::preview_table_rows(&interventions, 3);
    println!("(Full table exported to {})\n", file.display());

    let summary = reports::generate_summary(core);
    println!("Summary Stats (estadisticas.json):");
    println!(
        "{{\"total_trabajadores\": {}, \"total_horas_hombre\": {}, \"cobertura_actividades\": {}%}}\n",
        util::format_number(summary.total_trabajadores, 0),
        util::format_number(summary.total_horas_hombre, 2),
        util::format_number(summary.cobertura_actividades, 2)
    );
    info!(dir = %dir.display(), "reports written");
    Ok(())
}

fn run_report(settings: &Settings, input: &Path, output_dir: Option<PathBuf>) -> ExitCode {
    let ingestion = match Pipeline::new(settings).ingest_file(input) {
        Ok(i) => i,
        Err(e) => {
            print_problems(&e);
            return ExitCode::FAILURE;
        }
    };
    print_ingestion(&ingestion);
    let dir = output_dir.unwrap_or_else(|| PathBuf::from(&settings.output_dir));
    match generate_reports(settings, &ingestion, &dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Write error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to Report Selection (Y/N): ")
            .to_uppercase()
            .as_str()
        {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(settings: &Settings, session: &mut Session) {
    let path = match &settings.input_path {
        Some(p) => p.clone(),
        None => read_line("Survey file path: "),
    };
    let loaded = session.load_file(settings, &path).map(print_ingestion);
    if let Err(e) = loaded {
        print_problems(&e);
        if session.current().is_some() {
            println!("The previously loaded dataset is still active.");
        }
        println!();
    }
}

fn handle_generate_reports(settings: &Settings, session: &Session) {
    let Some(ingestion) = session.current() else {
        println!("Error: No data loaded. Please load a survey file first (option 1).\n");
        return;
    };
    if let Err(e) = generate_reports(settings, ingestion, Path::new(&settings.output_dir)) {
        eprintln!("Write error: {}", e);
    }
}

fn run_menu(settings: &Settings) -> ExitCode {
    let mut session = Session::new();
    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(settings, &mut session),
            "2" => {
                println!();
                handle_generate_reports(settings, &session);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    return ExitCode::SUCCESS;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid settings file {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match cli.command {
        Some(Commands::Validate { input }) => run_validate(&settings, &input),
        Some(Commands::Report { input, output_dir }) => run_report(&settings, &input, output_dir),
        None => run_menu(&settings),
    }
}
