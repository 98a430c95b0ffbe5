use std::path::PathBuf;

use clap::Parser;
use reqwest::Method;
use serde_json::Value;

use rest_proxy::binding::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor, TypeShape};
use rest_proxy::config::{load_config, ClientSettings};
use rest_proxy::observability::logging::init_logging;
use rest_proxy::{Arg, RestClient};

const METHOD: &str = "call";

#[derive(Parser)]
#[command(name = "rest-cli")]
#[command(about = "Call a REST endpoint through a runtime-described proxy", long_about = None)]
struct Cli {
    /// Client settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL, overrides the settings file
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Default header `name:value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// HTTP verb (GET, POST, PURGE, ...)
    verb: String,

    /// Path template, e.g. `/orders/{id}`
    path: String,

    /// Path template value `name=value` (repeatable)
    #[arg(long = "path", value_parser = parse_pair)]
    path_params: Vec<(String, String)>,

    /// Query parameter `name=value` (repeatable)
    #[arg(long = "query", value_parser = parse_pair)]
    query_params: Vec<(String, String)>,

    /// Matrix parameter `name=value` (repeatable)
    #[arg(long = "matrix", value_parser = parse_pair)]
    matrix_params: Vec<(String, String)>,

    /// Request body; JSON if it parses, a string otherwise
    #[arg(long)]
    body: Option<String>,

    /// Consumed media type
    #[arg(long)]
    consumes: Option<String>,

    /// Produced media type
    #[arg(long)]
    produces: Option<String>,

    /// Dispatch asynchronously and wait on the pending call
    #[arg(long = "async")]
    deferred: bool,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{s}`"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name:value, got `{s}`"))
}

/// One-method interface for the command line, with its arguments.
fn describe(cli: &Cli) -> Result<(InterfaceDescriptor, Vec<Arg>), Box<dyn std::error::Error>> {
    let verb = Method::from_bytes(cli.verb.to_ascii_uppercase().as_bytes())?;
    let returns = if cli.deferred {
        TypeShape::pending(TypeShape::Json)
    } else {
        TypeShape::Json
    };

    let mut method = MethodDescriptor::new(METHOD)
        .verb(verb)
        .path(cli.path.clone())
        .returns_shape(returns);
    let mut args = Vec::new();

    for (name, value) in &cli.path_params {
        method = method.param(ParamDescriptor::of::<String>().path(name.clone()));
        args.push(Arg::of(value));
    }
    for (name, value) in &cli.query_params {
        method = method.param(ParamDescriptor::of::<String>().query(name.clone()));
        args.push(Arg::of(value));
    }
    for (name, value) in &cli.matrix_params {
        method = method.param(ParamDescriptor::of::<String>().matrix(name.clone()));
        args.push(Arg::of(value));
    }
    if let Some(body) = &cli.body {
        let payload = serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.clone()));
        method = method.param(ParamDescriptor::of::<Value>());
        args.push(Arg::from_value(payload));
    }
    if let Some(consumes) = &cli.consumes {
        method = method.consumes([consumes.clone()]);
    }
    if let Some(produces) = &cli.produces {
        method = method.produces([produces.clone()]);
    }

    Ok((InterfaceDescriptor::new("cli").method(method), args))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientSettings::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    init_logging(&settings.observability);

    let client = RestClient::from_settings(&settings)?;
    for (name, value) in &cli.headers {
        client.add_default_header(name.clone(), value.clone());
    }

    let (descriptor, args) = describe(&cli)?;
    let outcome = client.dynamic_proxy(descriptor).invoke::<Value>(METHOD, args)?;
    if outcome.is_pending() {
        tracing::info!("Request dispatched, waiting for completion");
    }

    let result = outcome.wait()?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
