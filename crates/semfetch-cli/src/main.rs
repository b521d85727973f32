// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! `semfetch` command-line front end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use semfetch::dialect::turtle::TurtleInterpreter;
use semfetch::dialect::{Interpreter, ParseTarget};
use semfetch::store::ntriples;
use semfetch::{FetchOptions, FetchResult, Fetcher, FetcherConfig, MemoryStore, Store, Term};

#[derive(Parser)]
#[command(
    name = "semfetch",
    about = "Linked-data document fetcher",
    version,
    after_help = "Run 'semfetch <command> --help' for details on each command."
)]
struct Cli {
    /// JSON config file, overlaid on the defaults and SEMFETCH_* variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch documents into an in-memory store
    Fetch {
        /// Document URIs (fragments are ignored)
        #[arg(required = true)]
        uris: Vec<String>,
        /// Ignore fetch state and ask caches to revalidate
        #[arg(long)]
        force: bool,
        /// Interpret every body as this content type
        #[arg(long)]
        content_type: Option<String>,
        /// Skip the RDFa pass over (X)HTML
        #[arg(long)]
        no_rdfa: bool,
        /// Do not record request/response provenance
        #[arg(long)]
        no_meta: bool,
        /// Per-request deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print the loaded statements as N-Triples
        #[arg(long)]
        dump: bool,
    },
    /// Copy a resource from one URI to another
    Copy {
        from: String,
        to: String,
        #[arg(long, default_value = "text/turtle")]
        content_type: String,
    },
    /// Delete a resource
    Delete { uri: String },
    /// Upload a local Turtle file as the contents of a document
    Put {
        /// Turtle file to read
        file: PathBuf,
        /// Target document URI
        uri: String,
        #[arg(long, default_value = "text/turtle")]
        content_type: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn print_results(results: &[(String, FetchResult)], json: bool) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|(uri, result)| match result {
                Ok(response) => serde_json::json!({ "uri": uri, "ok": true, "response": response }),
                Err(failure) => serde_json::json!({ "uri": uri, "ok": false, "failure": failure }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for (uri, result) in results {
        match result {
            Ok(response) if response.from_cache => println!("  {uri}: already loaded"),
            Ok(response) => {
                let dialect = response
                    .dialect
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "uninterpreted".to_string());
                println!(
                    "  {uri}: {} {} ({dialect}, {} statements)",
                    response.status, response.status_text, response.statements_added
                );
                if response.final_uri != *uri {
                    println!("    via {}", response.final_uri);
                }
            }
            Err(failure) => println!("  {uri}: FAILED {failure}"),
        }
    }
    Ok(())
}

fn new_fetcher(config: FetcherConfig) -> (Fetcher, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Fetcher::with_http(config, store.clone());
    (fetcher, store)
}

async fn run(cli: Cli) -> Result<bool> {
    let config = FetcherConfig::resolve(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(?config, "resolved configuration");

    let results = match cli.command {
        Commands::Fetch {
            uris,
            force,
            content_type,
            no_rdfa,
            no_meta,
            timeout_ms,
            dump,
        } => {
            let (fetcher, store) = new_fetcher(config);
            let options = FetchOptions {
                force,
                force_content_type: content_type,
                no_rdfa,
                no_meta,
                timeout: timeout_ms.map(Duration::from_millis),
                ..FetchOptions::default()
            };
            let results = fetcher.fetch_all(&uris, &options).await;
            if dump {
                let statements = store.match_pattern(None, None, None, None);
                let text = ntriples::serialize(&statements, "application/n-triples")?;
                print!("{text}");
            }
            uris.into_iter().zip(results).collect::<Vec<_>>()
        }
        Commands::Copy {
            from,
            to,
            content_type,
        } => {
            let (fetcher, _) = new_fetcher(config);
            vec![(to.clone(), fetcher.web_copy(&from, &to, &content_type).await)]
        }
        Commands::Delete { uri } => {
            let (fetcher, _) = new_fetcher(config);
            let result = fetcher.delete(&uri, &FetchOptions::default()).await;
            vec![(uri, result)]
        }
        Commands::Put {
            file,
            uri,
            content_type,
        } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let (fetcher, store) = new_fetcher(config);
            let doc = semfetch::uri::document_uri(&uri);
            let triples = TurtleInterpreter
                .interpret(&ParseTarget::new(doc.clone()), &text)
                .with_context(|| format!("parsing {}", file.display()))?;
            tracing::info!(file = %file.display(), statements = triples.len(), "loaded local file");
            let graph = Term::named(&doc);
            for triple in triples {
                store.add(triple.subject, triple.predicate, triple.object, graph.clone());
            }
            let options = FetchOptions {
                content_type: Some(content_type),
                ..FetchOptions::default()
            };
            vec![(uri, fetcher.put_back(&doc, &options).await)]
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "semfetch", &mut std::io::stdout());
            return Ok(true);
        }
    };

    print_results(&results, cli.json)?;
    Ok(results.iter().all(|(_, r)| r.is_ok()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    match run(cli).await {
        Ok(true) => Ok(()),
        // Per-document failures were already printed.
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "error": true, "message": format!("{e:#}") })
                );
            } else {
                eprintln!("  Error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}
