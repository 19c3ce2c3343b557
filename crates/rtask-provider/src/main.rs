//! `rtask` command line: validate and plan recurring tasks offline

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rtask_engine::{EngineConfig, ReconcileMode, VariantDispatcher};
use rtask_provider::{create_payload, input, patch_payload, ProviderConfig};
use rtask_variant::{Presence, VariantRegistry};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("rtask")
        .version(rtask_provider::VERSION)
        .about("Validate and plan directory server recurring tasks")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Provider configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a desired record against its variant")
                .arg(
                    Arg::new("desired")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Desired record (.json, .yaml or .yml)"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show what create or update would send")
                .arg(
                    Arg::new("desired")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Desired record (.json, .yaml or .yml)"),
                )
                .arg(
                    Arg::new("observed")
                        .long("observed")
                        .value_parser(value_parser!(PathBuf))
                        .help("Current server object; omit to plan a create"),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .default_value("recurring-task")
                        .help("Object id used in the create payload"),
                )
                .arg(
                    Arg::new("adopt")
                        .long("adopt")
                        .action(ArgAction::SetTrue)
                        .requires("observed")
                        .help("Reconcile into the observed object instead of creating"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the request body as JSON"),
                ),
        )
        .subcommand(Command::new("variants").about("List recurring task variants and their fields"))
}

fn init_tracing(filter: EnvFilter, json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<ProviderConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => ProviderConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(ProviderConfig::default()),
    }
}

/// Mode for `plan`: without an observed object there is nothing to adopt
fn plan_config(config: EngineConfig, adopt_flag: bool, has_observed: bool) -> EngineConfig {
    match (has_observed, adopt_flag) {
        (false, _) => config.with_mode(ReconcileMode::Create),
        (true, true) => config.with_mode(ReconcileMode::Adopt),
        (true, false) => config,
    }
}

fn validate(args: &ArgMatches, registry: &'static VariantRegistry) -> Result<bool> {
    let Some(path) = args.get_one::<PathBuf>("desired") else {
        bail!("missing desired record");
    };
    let desired = input::desired_record(&input::read_document(path)?, registry)?;
    let plan = VariantDispatcher::new(registry).reconcile(&desired, None)?;

    if plan.is_valid() {
        println!("{}: valid {} task", path.display(), desired.task_type());
    } else {
        for error in &plan.errors {
            println!("{}: {}", path.display(), error);
        }
    }
    Ok(plan.is_valid())
}

fn plan(args: &ArgMatches, registry: &'static VariantRegistry, config: EngineConfig) -> Result<bool> {
    let Some(path) = args.get_one::<PathBuf>("desired") else {
        bail!("missing desired record");
    };
    let desired = input::desired_record(&input::read_document(path)?, registry)?;
    let observed = match args.get_one::<PathBuf>("observed") {
        Some(observed) => Some(input::observed_record(&input::read_document(observed)?, registry)?),
        None => None,
    };

    let config = plan_config(config, args.get_flag("adopt"), observed.is_some());
    let result = VariantDispatcher::with_config(registry, config).reconcile(&desired, observed.as_ref())?;
    if !result.is_valid() {
        for error in &result.errors {
            eprintln!("{error}");
        }
        return Ok(false);
    }

    let json = args.get_flag("json");
    match observed {
        None => {
            let variant = registry.lookup(desired.task_type())?;
            let id = args.get_one::<String>("id").map_or("recurring-task", String::as_str);
            if json {
                println!("{}", serde_json::to_string_pretty(&create_payload(id, &result.record, variant))?);
            } else {
                println!("create {} '{}':", variant.name(), id);
                for (name, value) in result.record.fields() {
                    println!("  {} = {}", name, serde_json::to_string(value)?);
                }
            }
        }
        Some(_) if json => println!("{}", serde_json::to_string_pretty(&patch_payload(&result.patch))?),
        Some(_) if result.patch.is_empty() => println!("no changes"),
        Some(_) => {
            println!("update ({} operation(s)):", result.patch.len());
            for op in &result.patch {
                println!("  {op}");
            }
        }
    }
    Ok(true)
}

fn variants(registry: &VariantRegistry) {
    for variant in registry.iter() {
        println!("{}", variant.name());
        for (name, spec) in variant.declared_fields() {
            let presence = match spec.presence {
                Presence::Shared => continue,
                Presence::Required => "required",
                Presence::Optional => "optional",
            };
            match variant.default_for(name.as_str()) {
                Some(default) => println!("  {name:<48} {:<7} {presence} (default {})", spec.kind, serde_json::to_string(default).unwrap_or_default()),
                None => println!("  {name:<48} {:<7} {presence}", spec.kind),
            }
        }
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let settings = load_config(&matches)?;
    init_tracing(settings.env_filter()?, settings.log_json || matches.get_flag("log-json"));
    tracing::debug!("Effective settings: {:?}", settings);

    let registry = VariantRegistry::recurring_tasks();
    let config = settings.engine_config();

    let ok = match matches.subcommand() {
        Some(("validate", args)) => validate(args, registry)?,
        Some(("plan", args)) => plan(args, registry, config)?,
        Some(("variants", _)) => {
            variants(registry);
            true
        }
        _ => unreachable!("subcommand is required"),
    };

    std::process::exit(if ok { 0 } else { 1 });
}
