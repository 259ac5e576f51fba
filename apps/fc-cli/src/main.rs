use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use fc_core::Value;
use fc_engine::{EvalResult, FieldCalculator, ScriptRecorder};
use fc_library::{LibraryResult, build_calculator, load_context, load_yaml};

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(about = "fieldcalc CLI - Field expression calculator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate library file syntax and structure
    Validate {
        /// Path to the library YAML file
        library_path: PathBuf,
    },
    /// List named expressions in a library
    List {
        /// Path to the library YAML file
        library_path: PathBuf,
    },
    /// Show the compiled postfix program for one expression
    Compile {
        /// Path to the library YAML file
        library_path: PathBuf,
        /// Expression name
        name: String,
    },
    /// Evaluate an expression against a field context
    Eval {
        /// Path to the library YAML file
        library_path: PathBuf,
        /// Expression name
        name: String,
        /// Path to the field context file (YAML or JSON)
        #[arg(short, long)]
        context: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> LibraryResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { library_path } => cmd_validate(&library_path),
        Commands::List { library_path } => cmd_list(&library_path),
        Commands::Compile { library_path, name } => cmd_compile(&library_path, &name),
        Commands::Eval {
            library_path,
            name,
            context,
            output,
        } => cmd_eval(&library_path, &name, &context, output.as_deref()),
    }
}

fn cmd_validate(library_path: &Path) -> LibraryResult<()> {
    println!("Validating library: {}", library_path.display());
    let library = load_yaml(library_path)?;
    // loading migrates and validates; building proves every expression compiles
    build_calculator(&library)?;
    println!("✓ Library is valid");
    Ok(())
}

fn cmd_list(library_path: &Path) -> LibraryResult<()> {
    let library = load_yaml(library_path)?;
    let calc = build_calculator(&library)?;

    if calc.is_empty() {
        println!("No expressions found in library");
        return Ok(());
    }

    println!("Expressions in '{}':", library.name);
    for entry in calc.iter() {
        println!(
            "  {:<24} {:<8} {:>4} instrs  {}",
            entry.name,
            entry.kind.label(),
            entry.program.len(),
            &entry.fingerprint[..12]
        );
    }
    Ok(())
}

fn cmd_compile(library_path: &Path, name: &str) -> LibraryResult<()> {
    let library = load_yaml(library_path)?;
    let calc = build_calculator(&library)?;

    let entry = lookup(&calc, name)?;
    println!(
        "{} ({}, {} instructions, fingerprint {})",
        entry.name,
        entry.kind.label(),
        entry.program.len(),
        &entry.fingerprint[..12]
    );

    println!("\nPostfix program:");
    for line in entry.program.to_string().lines() {
        println!("  {line}");
    }

    // full replay script, dependencies included
    let mut recorder = ScriptRecorder::new();
    calc.replay_onto(name, &mut recorder)?;
    println!("\nReplay script:");
    for line in recorder.lines() {
        println!("  {line}");
    }

    Ok(())
}

fn cmd_eval(
    library_path: &Path,
    name: &str,
    context_path: &Path,
    output: Option<&Path>,
) -> LibraryResult<()> {
    let library = load_yaml(library_path)?;
    let calc = build_calculator(&library)?;
    lookup(&calc, name)?;

    let ctx = load_context(context_path)?;
    let result = calc.evaluate(name, &ctx)?;

    match &result {
        EvalResult::Value(value) => {
            println!("✓ {name} = {value}");
            if let Some(path) = output {
                std::fs::write(path, uniform_csv(value))?;
                println!("✓ Wrote {}", path.display());
            }
        }
        EvalResult::Field(field) => {
            let csv = field_csv(field.values());
            if let Some(path) = output {
                std::fs::write(path, csv)?;
                println!(
                    "✓ Exported {} data points to {}",
                    field.len(),
                    path.display()
                );
            } else {
                print!("{csv}");
            }
        }
    }

    Ok(())
}

fn lookup<'a>(
    calc: &'a FieldCalculator,
    name: &str,
) -> LibraryResult<&'a fc_engine::NamedExpression> {
    calc.get(name).ok_or_else(|| {
        fc_engine::EngineError::UnknownNamed {
            name: name.to_string(),
        }
        .into()
    })
}

fn uniform_csv(value: &Value) -> String {
    match value {
        Value::Scalar(v) => format!("value\n{v}\n"),
        Value::Complex(c) => format!("re,im\n{},{}\n", c.re, c.im),
        Value::Vector(v) => format!("x,y,z\n{},{},{}\n", v.x, v.y, v.z),
    }
}

fn field_csv(values: &[Value]) -> String {
    let mut csv = String::new();
    match values.first() {
        Some(Value::Complex(_)) => csv.push_str("index,re,im\n"),
        Some(Value::Vector(_)) => csv.push_str("index,x,y,z\n"),
        _ => csv.push_str("index,value\n"),
    }
    for (i, value) in values.iter().enumerate() {
        match value {
            Value::Scalar(v) => csv.push_str(&format!("{i},{v}\n")),
            Value::Complex(c) => csv.push_str(&format!("{i},{},{}\n", c.re, c.im)),
            Value::Vector(v) => csv.push_str(&format!("{i},{},{},{}\n", v.x, v.y, v.z)),
        }
    }
    csv
}
