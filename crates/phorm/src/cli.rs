//! Clap CLI definitions for the `phorm` command.
//!
//! Defines the complete CLI structure using clap 4 derive macros.

use clap::{Args, Parser, Subcommand};

/// phorm -- pharmaceutical forms with cross-form dependencies.
#[derive(Parser, Debug)]
#[command(
    name = "phorm",
    about = "Pharmaceutical forms with cross-form dependencies",
    long_about = "Manage form definitions, submissions, and the dependency rules \
                  that copy, look up, calculate, and validate values across forms.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: auto-discover .phorm/phorm.db).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Actor name for audit stamps (default: $PHORM_ACTOR, config, $USER).
    #[arg(long, global = true, env = "PHORM_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a phorm database in the current directory.
    Init(InitArgs),

    /// Manage form definitions.
    Form(FormArgs),

    /// Create a submission for a form (runs dependencies and validation).
    Submit(SubmitArgs),

    /// Inspect submissions.
    Submission(SubmissionArgs),

    /// Manage dependencies between form fields.
    Dep(DepArgs),

    /// Run dependencies against a document and print the result.
    Process(ProcessArgs),

    /// Run validation rules against a document and report failures.
    Validate(ValidateArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if a database already exists.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// form
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct FormArgs {
    #[command(subcommand)]
    pub command: FormCommands,
}

#[derive(Subcommand, Debug)]
pub enum FormCommands {
    /// Create a form definition from a JSON file.
    #[command(alias = "new")]
    Create(FormCreateArgs),

    /// Show a form definition.
    #[command(alias = "view")]
    Show(FormShowArgs),

    /// List form definitions.
    List(PageArgs),

    /// Search form definitions by name or description.
    Search(FormSearchArgs),

    /// Publish a form definition.
    Publish(FormShowArgs),

    /// Delete a form definition and its submissions.
    Delete(FormShowArgs),
}

#[derive(Args, Debug)]
pub struct FormCreateArgs {
    /// Path to a JSON form definition file ('-' for stdin).
    pub file: String,
}

#[derive(Args, Debug)]
pub struct FormShowArgs {
    /// Form id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct FormSearchArgs {
    /// Search term (matches name and description).
    pub term: String,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Pagination flags shared by listing commands.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Page number (1-based).
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size (default from config).
    #[arg(long)]
    pub page_size: Option<u32>,
}

// ---------------------------------------------------------------------------
// submit / submission
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Form id.
    pub form_id: String,

    /// Path to a JSON document with the field values ('-' for stdin).
    pub file: String,

    /// Store the raw document without running dependencies.
    #[arg(long)]
    pub no_process: bool,

    /// Store even if validation rules fail.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SubmissionArgs {
    #[command(subcommand)]
    pub command: SubmissionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SubmissionCommands {
    /// Show a submission.
    #[command(alias = "view")]
    Show(SubmissionShowArgs),

    /// List submissions for a form, newest first.
    List(SubmissionListArgs),
}

#[derive(Args, Debug)]
pub struct SubmissionShowArgs {
    /// Submission id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SubmissionListArgs {
    /// Form id.
    pub form_id: String,

    #[command(flatten)]
    pub page: PageArgs,
}

// ---------------------------------------------------------------------------
// dep
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency between two form fields.
    Add(DepAddArgs),

    /// Update an existing dependency.
    Update(DepUpdateArgs),

    /// Remove a dependency.
    #[command(alias = "remove")]
    Rm(DepRmArgs),

    /// List dependencies, optionally for one form.
    List(DepListArgs),

    /// Check whether an edge could be added without creating a cycle.
    Check(DepCheckArgs),
}

#[derive(Args, Debug)]
pub struct DepAddArgs {
    /// Dependency kind: value, lookup, visibility, validation, calculation.
    pub kind: String,

    /// Source endpoint as form.field.
    pub source: String,

    /// Target endpoint as form.field.
    pub target: String,

    /// Expression (required for calculation/visibility/validation).
    #[arg(long, short = 'e')]
    pub expression: Option<String>,

    /// Lookup key (required for lookup).
    #[arg(long, short = 'k')]
    pub lookup_key: Option<String>,

    /// Description, used as the validation failure message.
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Execution order within a processing pass (ascending).
    #[arg(long, short = 'o', default_value_t = 0)]
    pub order: i32,
}

#[derive(Args, Debug)]
pub struct DepUpdateArgs {
    /// Dependency id.
    pub id: String,

    /// New expression.
    #[arg(long, short = 'e')]
    pub expression: Option<String>,

    /// New description.
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New execution order.
    #[arg(long, short = 'o')]
    pub order: Option<i32>,

    /// Activate or deactivate the dependency.
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DepRmArgs {
    /// Dependency id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct DepListArgs {
    /// Restrict to dependencies touching this form.
    #[arg(long)]
    pub form: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct DepCheckArgs {
    /// Source endpoint as form.field.
    pub source: String,

    /// Target endpoint as form.field.
    pub target: String,
}

// ---------------------------------------------------------------------------
// process / validate
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Form id.
    pub form_id: String,

    /// Path to a JSON document ('-' for stdin). Defaults to the form's
    /// latest submission.
    pub file: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Form id.
    pub form_id: String,

    /// Path to a JSON document ('-' for stdin). Defaults to the form's
    /// latest submission.
    pub file: Option<String>,
}
