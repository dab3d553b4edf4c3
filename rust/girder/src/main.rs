//! girder: generate multi-target bindings for a service contract.
//!
//! Reads a JSON introspection document, builds the validated service model,
//! and runs the selected backends. All diagnostics go to stderr; generated
//! files go under `--out`.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use girder_codegen::{builtin_registry, derive_adapters, GenContext, OutputSet};
use girder_schema::{build_service, Introspection, InvalidMethodPolicy};

#[derive(Debug, Parser)]
#[command(name = "girder", version, about = "Generate service bindings from an introspection document")]
struct Args {
    /// Introspection document (JSON) describing types and interfaces.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Name of the interface declaration to generate for.
    #[arg(long, value_name = "NAME")]
    service: String,

    /// Directory generated files are written under.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Abort on the first invalid method instead of dropping it with a
    /// warning.
    #[arg(long)]
    strict: bool,

    /// Backends to run, in order. Defaults to every registered backend.
    #[arg(value_name = "BACKEND")]
    backends: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let intro: Introspection = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let policy = if args.strict {
        InvalidMethodPolicy::Abort
    } else {
        InvalidMethodPolicy::Drop
    };
    let service = build_service(&intro, &args.service, policy)
        .with_context(|| format!("building the {} service model", args.service))?;
    let adapters = derive_adapters(&service);
    let cx = GenContext::new(&service, &intro.types, &adapters);

    let registry = builtin_registry();
    let backends = if args.backends.is_empty() {
        registry.names().iter().map(|s| s.to_string()).collect()
    } else {
        args.backends.clone()
    };

    let mut out = OutputSet::new();
    registry.run(&backends, &cx, &mut out)?;
    out.flush(&args.out)?;

    tracing::info!(
        files = out.len(),
        dir = %args.out.display(),
        "generation complete"
    );
    Ok(())
}
