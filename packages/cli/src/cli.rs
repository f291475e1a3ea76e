//! Command-line interface for nusach.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;

use nusach_engine::config::DEFAULT_START_NUMBER;
use nusach_engine::{
    build_tree, render_document, resolve_with_diagnostics, AssemblyOptions, Diagnostic,
    DocumentAssembler, DocumentKind, GenderProfile, ProfileAssignment, SectionProfiles,
    VariableContext,
};

use crate::config::{DEFAULT_WRAP_WIDTH, MIN_WRAP_WIDTH};
use crate::error::{CliError, Result};
use crate::input::{
    load_context, load_engine, load_records, load_template, parse_actor_profile, parse_kind,
    parse_profile,
};
use crate::output::{format_json, format_text, print_diagnostics};

/// Nusach - Hebrew legal document drafting.
#[derive(Parser)]
#[command(name = "nusach")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that renders text.
#[derive(Args, Debug, Clone)]
pub struct DraftingArgs {
    /// Form data file (.json, otherwise YAML)
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Gender profile: male, female, plural or organization
    #[arg(short, long, default_value = "male", value_parser = parse_profile)]
    pub profile: GenderProfile,

    /// Document kind selecting the protected phrases
    #[arg(short, long, default_value = "general", value_parser = parse_kind)]
    pub kind: DocumentKind,

    /// Extra YAML rule table applied after the built-in rules
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and gender a single template.
    Render {
        /// Template file
        template: PathBuf,

        #[command(flatten)]
        drafting: DraftingArgs,
    },

    /// Build, render and number a sectioned document.
    Assemble {
        /// Section catalog (.json, otherwise YAML)
        sections: PathBuf,

        #[command(flatten)]
        drafting: DraftingArgs,

        /// Profile for every section title
        #[arg(long, value_parser = parse_profile)]
        title_profile: Option<GenderProfile>,

        /// Profile for sections of one actor (NAME=PROFILE, repeatable)
        #[arg(long = "actor", value_parser = parse_actor_profile)]
        actors: Vec<(String, GenderProfile)>,

        /// Profile for one section (ID=PROFILE, repeatable)
        #[arg(long = "section", value_parser = parse_actor_profile)]
        sections_profiles: Vec<(String, GenderProfile)>,

        /// Number of the first top-level section
        #[arg(
            long,
            default_value_t = DEFAULT_START_NUMBER,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        start_at: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Wrap text output at this column
        #[arg(short, long, default_value_t = DEFAULT_WRAP_WIDTH)]
        width: usize,
    },

    /// Check a section catalog for orphaned, duplicate and malformed records.
    Lint {
        /// Section catalog (.json, otherwise YAML)
        sections: PathBuf,

        /// Exit with an error when any issue is found
        #[arg(long)]
        strict: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    execute(cli, &mut stdout.lock())
}

/// Execute a parsed command, writing its output to `out`.
pub fn execute(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Render { template, drafting } => render_command(&template, &drafting, out),
        Commands::Assemble {
            sections,
            drafting,
            title_profile,
            actors,
            sections_profiles,
            start_at,
            format,
            width,
        } => {
            let profiles = profile_assignment(
                drafting.profile,
                title_profile,
                actors,
                sections_profiles,
            );
            let options = AssemblyOptions::new()
                .with_start_at(start_at)
                .with_profiles(profiles);
            assemble_command(&sections, &drafting, options, format, width, out)
        }
        Commands::Lint { sections, strict } => lint_command(&sections, strict, out),
    }
}

/// Uniform unless any per-title, per-actor or per-section profile is given.
fn profile_assignment(
    default: GenderProfile,
    title_profile: Option<GenderProfile>,
    actors: Vec<(String, GenderProfile)>,
    sections: Vec<(String, GenderProfile)>,
) -> ProfileAssignment {
    if title_profile.is_none() && actors.is_empty() && sections.is_empty() {
        return ProfileAssignment::Uniform(default);
    }

    let mut profiles = SectionProfiles::new(default);
    if let Some(profile) = title_profile {
        profiles = profiles.with_title_profile(profile);
    }
    for (actor, profile) in actors {
        profiles = profiles.with_actor(actor, profile);
    }
    for (id, profile) in sections {
        profiles = profiles.with_section(id, profile);
    }
    profiles.into()
}

/// Execute the render command.
fn render_command(template: &Path, drafting: &DraftingArgs, out: &mut impl Write) -> Result<()> {
    let text = load_template(template)?;
    let ctx = load_context(drafting.context.as_deref())?;
    let engine = load_engine(drafting.kind, drafting.rules.as_deref())?;

    let rendered = render_document(&text, &ctx, &engine, drafting.profile);
    print_diagnostics(&rendered.diagnostics);
    write!(out, "{}", rendered.text)?;
    if !rendered.text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

/// Execute the assemble command.
fn assemble_command(
    sections: &Path,
    drafting: &DraftingArgs,
    options: AssemblyOptions,
    format: OutputFormat,
    width: usize,
    out: &mut impl Write,
) -> Result<()> {
    if width < MIN_WRAP_WIDTH {
        return Err(CliError::InvalidArgument(format!(
            "--width must be at least {MIN_WRAP_WIDTH}, got {width}"
        )));
    }

    let records = load_records(sections)?;
    let ctx = load_context(drafting.context.as_deref())?;
    let engine = load_engine(drafting.kind, drafting.rules.as_deref())?;

    let built = build_tree(&records);
    let mut stream = DocumentAssembler::new(&engine)
        .with_options(options)
        .assemble(&built.tree, &ctx);

    let mut diagnostics = built.diagnostics;
    diagnostics.extend(std::mem::take(&mut stream.diagnostics));
    stream.diagnostics = diagnostics;

    match format {
        OutputFormat::Text => {
            print_diagnostics(&stream.diagnostics);
            writeln!(out, "{}", format_text(&stream, width))?;
        }
        OutputFormat::Json => writeln!(out, "{}", format_json(&stream)?)?,
    }
    Ok(())
}

/// Execute the lint command.
fn lint_command(sections: &Path, strict: bool, out: &mut impl Write) -> Result<()> {
    let records = load_records(sections)?;
    let built = build_tree(&records);

    let mut issues: Vec<String> = built.diagnostics.iter().map(ToString::to_string).collect();

    // Template syntax: an empty context surfaces only malformed constructs
    let empty = VariableContext::new();
    for record in &records {
        for text in [&record.title, &record.content] {
            let resolution = resolve_with_diagnostics(text, &empty);
            for diagnostic in &resolution.diagnostics {
                if matches!(
                    diagnostic,
                    Diagnostic::UnbalancedBlock { .. } | Diagnostic::UnresolvedPlaceholder { .. }
                ) {
                    issues.push(format!("Section '{}': {diagnostic}", record.id));
                }
            }
        }
    }

    for issue in &issues {
        writeln!(out, "{} {issue}", style("✗").red())?;
    }

    if issues.is_empty() {
        writeln!(
            out,
            "{} {} sections, no issues",
            style("✓").green().bold(),
            records.len()
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "{} sections, {}",
        records.len(),
        style(format!("{} issue(s)", issues.len())).yellow().bold()
    )?;
    if strict {
        return Err(CliError::LintFailed(issues.len()));
    }
    Ok(())
}
