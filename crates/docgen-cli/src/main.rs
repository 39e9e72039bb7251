use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docgen_ai::{OpenAiClient, TextGenerator, UnavailableGenerator};
use docgen_core::{
    document_key, DocgenConfig, DocumentGenerator, DocumentService, DocumentStore, FsStore,
    GenerationResult,
};
use docgen_model::RawInput;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let store = Arg::new("store")
        .long("store")
        .default_value("documents")
        .value_parser(value_parser!(PathBuf))
        .help("Directory holding generated documents and input snapshots");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");
    let api_key = Arg::new("api-key")
        .long("api-key")
        .env("OPENAI_API_KEY")
        .hide_env_values(true)
        .help("Text-generation service API key");
    let offline = Arg::new("offline")
        .long("offline")
        .action(ArgAction::SetTrue)
        .help("Skip the text-generation service and produce template-only documents");

    Command::new("docgen")
        .version(docgen_core::VERSION)
        .about("Generate consumer dispute documents")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a document from a form submission")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with the form submission"),
                )
                .arg(store.clone())
                .arg(config.clone())
                .arg(api_key.clone())
                .arg(offline.clone()),
        )
        .subcommand(
            Command::new("regenerate")
                .about("Regenerate a stored document from its input snapshot")
                .arg(
                    Arg::new("filename")
                        .long("filename")
                        .required(true)
                        .help("Filename of the stored document"),
                )
                .arg(store.clone())
                .arg(config)
                .arg(api_key)
                .arg(offline),
        )
        .subcommand(
            Command::new("show")
                .about("Print a stored document")
                .arg(
                    Arg::new("filename")
                        .long("filename")
                        .required(true)
                        .help("Filename of the stored document"),
                )
                .arg(store),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<DocgenConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => DocgenConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(DocgenConfig::default()),
    }
}

fn text_generator(args: &ArgMatches, config: &DocgenConfig) -> Result<Arc<dyn TextGenerator>> {
    if args.get_flag("offline") {
        tracing::info!("offline mode: documents will use the fallback path");
        return Ok(Arc::new(UnavailableGenerator::new("offline mode")));
    }
    let api_key = args.get_one::<String>("api-key").cloned();
    if api_key.is_none() {
        tracing::warn!("no API key configured; documents will use the fallback path");
        return Ok(Arc::new(UnavailableGenerator::new("no API key configured")));
    }
    let client = OpenAiClient::new(
        config.generation.endpoint.clone(),
        api_key,
        config.request_timeout(),
    )
    .context("building text-generation client")?;
    Ok(Arc::new(client))
}

fn service(args: &ArgMatches) -> Result<DocumentService> {
    let config = load_config(args)?;
    let generator = DocumentGenerator::from_config(&config, text_generator(args, &config)?);
    Ok(DocumentService::new(generator, Arc::new(store(args)?)))
}

fn store(args: &ArgMatches) -> Result<FsStore> {
    let root = args
        .get_one::<PathBuf>("store")
        .context("missing --store")?;
    Ok(FsStore::new(root.clone()))
}

fn read_input(path: &Path) -> Result<RawInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading input from {}", path.display()))?;
    RawInput::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_result(result: &GenerationResult) -> Result<()> {
    let summary = serde_json::json!({
        "success": result.success,
        "isFallback": result.is_fallback,
        "filename": result.filename,
        "documentType": result.document_type,
        "customerName": result.customer_name,
        "mechanicName": result.mechanic_name,
        "warning": result.warning,
        "regenerationAvailable": result.regeneration_available,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("generate", args)) => {
            let input = args
                .get_one::<PathBuf>("input")
                .context("missing --input")?;
            let raw = read_input(input)?;
            let result = service(args)?.generate_and_store(&raw).await?;
            print_result(&result)
        }
        Some(("regenerate", args)) => {
            let filename = args
                .get_one::<String>("filename")
                .context("missing --filename")?;
            let result = service(args)?.regenerate(filename).await?;
            print_result(&result)
        }
        Some(("show", args)) => {
            let filename = args
                .get_one::<String>("filename")
                .context("missing --filename")?;
            let key = document_key(filename);
            match store(args)?.get(&key).await? {
                Some(bytes) => {
                    let text = String::from_utf8(bytes)
                        .with_context(|| format!("{key} is not valid UTF-8"))?;
                    println!("{text}");
                    Ok(())
                }
                None => bail!("no stored document named '{filename}'"),
            }
        }
        _ => bail!("unknown command"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    run(matches).await
}
