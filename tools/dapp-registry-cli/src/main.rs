mod logging;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use dapp_filter::{
    abi::{ICurvePool, IDaiJoin, IERC20, ILido, IPot, IVat},
    decode_multicall, encode_transaction, BatchResult, Call, CallReport, DappRegistry, MultiCall, RegistryConfig,
};
use dapp_filter_types::{format_selector, ListId};

use crate::logging::{init_logging, LogFormat};

/// Check multicall batches against a dapp registry configuration before they are submitted.
///
/// Reports are printed to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, value_enum, default_value = "human", env = "LOG_FORMAT", global = true)]
    log_format: LogFormat,

    /// Log filter (eg, `info`, `dapp_filter=debug`). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "warn", env = "LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a batch and print per-call verdicts plus the batch outcome.
    ///
    /// Exits with status 2 when the batch would be rejected.
    Check(CheckArgs),

    /// Print the lists and entries a registry configuration produces.
    Lists {
        #[arg(long, env = "DAPP_REGISTRY")]
        registry: PathBuf,
    },

    /// Print the methods each built-in filter allows.
    Selectors,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Registry configuration (TOML).
    #[arg(long, env = "DAPP_REGISTRY")]
    registry: PathBuf,

    /// Batch file (JSON): `{ "wallet": "0x..", "calls": [{ "to": "0x..", "value": "0x0", "data": "0x.." }] }`.
    #[arg(long, conflicts_with = "calldata", required_unless_present = "calldata")]
    batch: Option<PathBuf>,

    /// Hex-encoded `multiCall(address,(address,uint256,bytes)[])` calldata.
    #[arg(long)]
    calldata: Option<String>,

    /// Also write the report to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
struct BatchFile {
    #[serde(default)]
    wallet: Address,
    calls: Vec<CallEntry>,
}

#[derive(Deserialize, Debug)]
struct CallEntry {
    to: Address,
    #[serde(default)]
    value: U256,
    #[serde(default)]
    data: Bytes,
}

#[derive(Serialize, Debug)]
struct CheckReport {
    wallet: Address,
    lists: Vec<ListId>,
    calls: Vec<CallReport>,
    result: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    failing_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    match cli.command {
        Command::Check(args) => check(&args),
        Command::Lists { registry } => {
            print_json(&list_registry(&registry)?)?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Selectors => {
            print_json(&selector_table())?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn load_registry(path: &Path) -> Result<(RegistryConfig, DappRegistry)> {
    let config = RegistryConfig::from_file(path)
        .with_context(|| format!("failed loading registry config {}", path.display()))?;
    let registry = DappRegistry::from_config(&config)
        .with_context(|| format!("failed building registry from {}", path.display()))?;
    Ok((config, registry))
}

fn check(args: &CheckArgs) -> Result<ExitCode> {
    let (config, registry) = load_registry(&args.registry)?;
    let (wallet, calls) = load_batch(args)?;
    info!(%wallet, calls = calls.len(), "checking batch");

    let executor = MultiCall::with_lists(&registry, config.executor.lists.clone());
    let outcome = executor.check(wallet, &calls);
    let report = CheckReport {
        wallet,
        lists: executor.lists().to_vec(),
        calls: executor.validate(&calls),
        result: match &outcome {
            Ok(()) => BatchResult::committed(),
            Err(e) => BatchResult::rejected(e),
        },
        failing_index: outcome.as_ref().err().map(|e| e.index()),
        detail: outcome.as_ref().err().map(|e| e.to_string()),
    };

    let value = serde_json::to_value(&report).context("failed serialising report")?;
    print_json(&value)?;
    if let Some(path) = &args.output {
        write_json_atomic(path, &value)?;
    }
    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn load_batch(args: &CheckArgs) -> Result<(Address, Vec<Call>)> {
    if let Some(calldata) = &args.calldata {
        let trimmed = calldata.trim();
        let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .context("calldata is not valid hex")?;
        return decode_multicall(&raw).context("failed decoding multiCall calldata");
    }

    let path = args
        .batch
        .as_ref()
        .ok_or_else(|| anyhow!("missing batch: provide --batch or --calldata"))?;
    let text = fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    parse_batch(&text).with_context(|| format!("failed parsing batch JSON in {}", path.display()))
}

fn parse_batch(text: &str) -> Result<(Address, Vec<Call>)> {
    let batch: BatchFile = serde_json::from_str(text)?;
    debug!(wallet = %batch.wallet, calls = batch.calls.len(), "parsed batch file");
    let calls = batch
        .calls
        .into_iter()
        .map(|c| encode_transaction(c.to, c.value, c.data))
        .collect();
    Ok((batch.wallet, calls))
}

fn list_registry(path: &Path) -> Result<Value> {
    let (config, registry) = load_registry(path)?;
    let snapshot = registry.snapshot();
    let lists: Vec<Value> = snapshot
        .lists()
        .map(|(id, enabled)| {
            let entries: Vec<Value> = snapshot
                .entries(id)
                .into_iter()
                .map(|(target, filter)| json!({ "target": target, "filter": filter }))
                .collect();
            json!({ "id": id, "enabled": enabled, "entries": entries })
        })
        .collect();
    Ok(json!({ "lists": lists, "executor": { "lists": config.executor.lists } }))
}

fn method<C: SolCall>(filter: &str, note: Option<&str>) -> Value {
    json!({
        "filter": filter,
        "signature": C::SIGNATURE,
        "selector": format_selector(&C::SELECTOR),
        "note": note,
    })
}

fn selector_table() -> Value {
    json!([
        { "filter": "lido", "signature": null, "selector": null, "note": "bare value transfer (staked by fallback)" },
        method::<ILido::submitCall>("lido", None),
        method::<ICurvePool::exchangeCall>("curve", None),
        method::<IERC20::approveCall>("curve", Some("token call naming the pool as spender")),
        method::<IPot::dripCall>("pot", None),
        method::<IPot::joinCall>("pot", None),
        method::<IPot::exitCall>("pot", None),
        method::<IDaiJoin::joinCall>("dai_join", None),
        method::<IDaiJoin::exitCall>("dai_join", None),
        method::<IERC20::approveCall>("dai_join", Some("token call naming the adapter as spender")),
        method::<IVat::hopeCall>("vat", Some("usr must be the pot or the DAI join adapter")),
        method::<IVat::nopeCall>("vat", Some("usr must be the pot or the DAI join adapter")),
    ])
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed serialising JSON")?;
    println!("{rendered}");
    Ok(())
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent).with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising report JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
