//! mastery CLI: administration and batch replay for the progress engine.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod workspace;

#[derive(Parser)]
#[command(
    name = "mastery",
    version,
    about = "Curriculum progress and consistency engine"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample curriculum
    Init,

    /// Validate a curriculum file
    Validate {
        /// Curriculum file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Create progress records for students
    Enroll {
        /// Student ids
        students: Vec<String>,

        /// Roster file with one student id per line
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Add a question to the bank
    AddQuestion {
        /// Question id
        #[arg(long)]
        id: String,

        /// Question text; a leading 【label】 sets the category
        #[arg(long)]
        text: String,

        /// Subtopic the question belongs to
        #[arg(long)]
        topic: String,

        /// Unit of the subtopic (looked up in the catalog when omitted)
        #[arg(long)]
        unit: Option<String>,

        /// Where the question came from
        #[arg(long, default_value = "manual")]
        source: String,

        /// Student who authored the question
        #[arg(long)]
        author: Option<String>,
    },

    /// List the question bank
    Questions {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Set a question's category
    SetType {
        /// Question id
        id: String,

        /// Category label (e.g. "calculation" or "計算題")
        qa_type: String,
    },

    /// Apply graded answers from a JSON Lines file
    Ingest {
        /// File with one graded answer per line
        file: PathBuf,
    },

    /// Start tracking the next subtopic if the student is ready
    Advance {
        /// Student id
        student: String,

        /// Subtopic the student is advancing from
        topic: String,
    },

    /// Show a student's progress
    Progress {
        /// Student id
        student: String,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show subtopic accuracy across all students
    Topics {
        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Clear student records or the question bank
    Reset {
        /// Remove every student record
        #[arg(long)]
        students: bool,

        /// Remove every question
        #[arg(long)]
        questions: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mastery=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { catalog } => commands::validate::execute(catalog, config),
        Commands::Enroll { students, file } => commands::enroll::execute(students, file, config),
        Commands::AddQuestion {
            id,
            text,
            topic,
            unit,
            source,
            author,
        } => commands::add_question::execute(id, text, topic, unit, source, author, config),
        Commands::Questions { format } => commands::questions::execute(format, config),
        Commands::SetType { id, qa_type } => commands::set_type::execute(id, qa_type, config),
        Commands::Ingest { file } => commands::ingest::execute(file, config),
        Commands::Advance { student, topic } => commands::advance::execute(student, topic, config),
        Commands::Progress {
            student,
            format,
            output,
        } => commands::progress::execute(student, format, output, config),
        Commands::Topics { format } => commands::topics::execute(format, config),
        Commands::Reset {
            students,
            questions,
        } => commands::reset::execute(students, questions, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
