//! Resultsheet CLI - department-wise result sheets from raw exam marks
//!
//! # Main Commands
//!
//! ```bash
//! resultsheet generate marks.xlsx              # Build Generated_Result_Sheets.xlsx
//! resultsheet export marks.xlsx -d CSE         # One department only
//! resultsheet serve                            # Start HTTP server (port 3000)
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! resultsheet parse marks.csv                  # Decoded rows as JSON
//! resultsheet curriculum                       # Departments and courses
//! resultsheet classify P F AB "B+" ""          # Status labels for raw values
//! ```
//!
//! `RESULTSHEET_CURRICULUM` and `RESULTSHEET_PORT` (also read from `.env`)
//! set the curriculum file and port; flags take precedence.

use clap::{Parser, Subcommand};
use resultsheet::{
    classify, department_csv, department_file_name, detect_format,
    export::department_csv_file_name, generate_file, server::DEFAULT_PORT, server::PORT_ENV,
    CsvDecoder, GenerateOptions, JsonEncoder, ReportEncoder, SheetDecoder, SourceFormat,
    WorkbookDecoder, WorkbookEncoder,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resultsheet")]
#[command(about = "Build department-wise result sheets from raw exam marks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: result file → workbook with one sheet per department
    Generate {
        /// Input file (.xlsx, .xls, .ods or .csv)
        input: PathBuf,

        /// Curriculum JSON file (default: $RESULTSHEET_CURRICULUM or embedded)
        #[arg(short, long)]
        curriculum: Option<PathBuf>,

        /// Output workbook (default: Generated_Result_Sheets.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the reports as JSON ("-" for stdout)
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Decode a result file and output its rows as JSON
    Parse {
        /// Input file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Worksheet to read (default: first)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the curriculum registry
    Curriculum {
        /// Curriculum JSON file (default: $RESULTSHEET_CURRICULUM or embedded)
        #[arg(short, long)]
        curriculum: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a single department's sheet
    Export {
        /// Input file
        input: PathBuf,

        /// Department code
        #[arg(short, long)]
        department: String,

        /// Curriculum JSON file
        #[arg(short, long)]
        curriculum: Option<PathBuf>,

        /// Output file (default: <DEPT>_Result_Sheet.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write CSV instead of a workbook
        #[arg(long)]
        csv: bool,
    },

    /// Classify raw result values
    Classify {
        /// Values to classify (empty string for a missing result)
        values: Vec<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $RESULTSHEET_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Curriculum JSON file
        #[arg(short, long)]
        curriculum: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            curriculum,
            output,
            json,
        } => cmd_generate(&input, curriculum, output.as_deref(), json.as_deref()),

        Commands::Parse {
            input,
            delimiter,
            sheet,
            output,
        } => cmd_parse(&input, delimiter, sheet, output.as_deref()),

        Commands::Curriculum { curriculum, json } => cmd_curriculum(curriculum, json),

        Commands::Export {
            input,
            department,
            curriculum,
            output,
            csv,
        } => cmd_export(&input, &department, curriculum, output.as_deref(), csv),

        Commands::Classify { values } => cmd_classify(&values),

        Commands::Serve { port, curriculum } => cmd_serve(port, curriculum).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Env defaults, overridden by an explicit `--curriculum`.
fn options_with(curriculum: Option<PathBuf>) -> GenerateOptions {
    let mut options = GenerateOptions::from_env();
    if curriculum.is_some() {
        options.curriculum_path = curriculum;
    }
    options
}

fn cmd_generate(
    input: &Path,
    curriculum: Option<PathBuf>,
    output: Option<&Path>,
    json_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = options_with(curriculum);
    let registry = options.load_curriculum()?;
    let outcome = generate_file(input, &registry, &options)?;

    eprintln!("\n📊 Summary");
    eprintln!("   Rows read:          {}", outcome.summary.rows_read);
    eprintln!("   Rows without id:    {}", outcome.summary.rows_without_id);
    eprintln!("   Students:           {}", outcome.summary.students_aggregated);
    eprintln!("   Unassigned:         {}", outcome.summary.unassigned_students);
    for report in &outcome.reports {
        eprintln!(
            "   {:<8} {:>4} students, {} courses",
            report.department,
            report.rows.len(),
            report.courses.len()
        );
    }

    let workbook_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&options.workbook_name));
    fs::write(&workbook_path, WorkbookEncoder.encode(&outcome.reports)?)?;
    eprintln!("\n💾 Workbook written to: {}", workbook_path.display());

    if let Some(path) = json_output {
        let json = String::from_utf8(JsonEncoder.encode(&outcome.reports)?)?;
        let target = (path != Path::new("-")).then_some(path);
        write_output(&json, target)?;
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    sheet: Option<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let bytes = fs::read(input)?;
    let result = match detect_format(&bytes) {
        SourceFormat::Workbook => WorkbookDecoder { sheet }.decode(&bytes)?,
        SourceFormat::Csv => CsvDecoder { delimiter }.decode(&bytes)?,
    };

    eprintln!("   Format: {}", result.format);
    if let Some(ref encoding) = result.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(d) = result.delimiter {
        eprintln!(
            "   Delimiter: '{}'{}",
            format_delimiter(d),
            if delimiter.is_none() { " (auto-detected)" } else { "" }
        );
    }
    if let Some(ref sheet) = result.sheet {
        eprintln!("   Sheet: {}", sheet);
    }
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_curriculum(curriculum: Option<PathBuf>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = options_with(curriculum).load_curriculum()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registry)?);
        return Ok(());
    }

    eprintln!(
        "📋 {} departments, {} unique courses\n",
        registry.len(),
        registry.unique_course_count()
    );
    for department in registry.iter() {
        match &department.title {
            Some(title) => println!("  {} - {}", department.code, title),
            None => println!("  {}", department.code),
        }
        for course in &department.courses {
            match &course.title {
                Some(title) => println!("     {:<10} {}", course.code, title),
                None => println!("     {}", course.code),
            }
        }
        println!();
    }

    Ok(())
}

fn cmd_export(
    input: &Path,
    department: &str,
    curriculum: Option<PathBuf>,
    output: Option<&Path>,
    as_csv: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = options_with(curriculum);
    let registry = options.load_curriculum()?;

    if !registry.contains(department) {
        return Err(format!(
            "Unknown department '{}'. Known: {}",
            department,
            registry.departments().join(", ")
        )
        .into());
    }

    eprintln!("📄 Processing: {}", input.display());
    let outcome = generate_file(input, &registry, &options)?;

    let report = outcome
        .reports
        .get(department)
        .ok_or_else(|| format!("No student of {} found in {}", department, input.display()))?;

    let (bytes, default_name) = if as_csv {
        (department_csv(report, b',')?, department_csv_file_name(department))
    } else {
        (WorkbookEncoder.encode_department(report)?, department_file_name(department))
    };

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_name));
    fs::write(&path, bytes)?;

    eprintln!(
        "💾 {} ({} students) written to: {}",
        department,
        report.rows.len(),
        path.display()
    );
    Ok(())
}

fn cmd_classify(values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if values.is_empty() {
        return Err("Nothing to classify".into());
    }

    for value in values {
        let raw = Some(value.as_str()).filter(|v| !v.trim().is_empty());
        println!("{:<12} → {}", format!("{:?}", value), classify(raw));
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>, curriculum: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let port = match port {
        Some(p) => p,
        None => match std::env::var(PORT_ENV) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| format!("Invalid {} '{}': {}", PORT_ENV, value, e))?,
            Err(_) => DEFAULT_PORT,
        },
    };

    let options = options_with(curriculum);
    let registry = options.load_curriculum()?;
    resultsheet::server::start_server(port, registry, options).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
