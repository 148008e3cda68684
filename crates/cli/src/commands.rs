//! Subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use corelib::loader::load_file;
use corelib::report::{discover_ring, RingReport};
use corelib::{JoinOutcome, NodeRef, Peer, RingNode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use transport::{NodeServer, RemoteNode, TcpConnector, TransportConfig};

use crate::config::NodeFileConfig;

pub type CommandResult = anyhow::Result<()>;

/// Upper bound on members visited when walking the ring for a report.
const MAX_REPORT_MEMBERS: usize = 1024;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a ring node, optionally joining an existing ring.
    Node(NodeArgs),
    /// Interactive lookups and inserts through a running node.
    Client {
        /// Address of the node to talk to.
        #[arg(long)]
        node: String,
    },
    /// Insert every `word: definition` line of a file.
    Load {
        #[arg(long)]
        node: String,
        file: PathBuf,
    },
    /// Walk the ring from a node and write the network report.
    Report {
        #[arg(long)]
        node: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Address to accept peer connections on.
    #[arg(long)]
    pub listen: String,
    /// Address other nodes use to reach this one; defaults to the bound address.
    #[arg(long)]
    pub advertise: Option<String>,
    /// Fixed ring identifier; hashed from the advertised address when absent.
    #[arg(long)]
    pub id: Option<u64>,
    /// Any member of the ring to join. Starts a new ring when absent.
    #[arg(long)]
    pub bootstrap: Option<String>,
    /// Dictionary file to load once joined.
    #[arg(long)]
    pub dictionary: Option<PathBuf>,
    /// Write a ring report here once joined (and loaded).
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// JSON file with `ring` and `transport` sections.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Command {
    pub async fn execute(self) -> CommandResult {
        match self {
            Command::Node(args) => run_node(args).await,
            Command::Client { node } => run_client(&node).await,
            Command::Load { node, file } => run_load(&node, &file).await,
            Command::Report { node, out } => run_report(&node, &out).await,
        }
    }
}

async fn run_node(args: NodeArgs) -> CommandResult {
    let file_config = match &args.config {
        Some(path) => NodeFileConfig::from_file(path)?,
        None => NodeFileConfig::default(),
    };
    let NodeFileConfig { ring, transport } = file_config;

    let server = NodeServer::bind(&args.listen, transport.clone())
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    let url = match args.advertise {
        Some(url) => url,
        None => server.local_addr()?.to_string(),
    };
    let me = match args.id {
        Some(id) => NodeRef::new(id, url),
        None => NodeRef::from_url(url, &ring.identifier_hash()?),
    };

    let connector = Arc::new(TcpConnector::new(transport));
    let node = RingNode::new(me, ring, connector.clone())?;
    let server_task = server.spawn(node.clone());

    let bootstrap = match &args.bootstrap {
        Some(addr) => Some(connector.dial_addr(addr).await?),
        None => None,
    };
    match node.join(bootstrap).await? {
        JoinOutcome::Joined => {}
        JoinOutcome::LockContended => {
            bail!("bootstrap node is admitting another node, try again later")
        }
    }
    println!(
        "Node {} (id {}) is part of the ring.",
        node.node_ref().url,
        node.node_ref().id
    );

    if let Some(path) = &args.dictionary {
        let summary = load_file(node.as_ref(), path).await?;
        println!(
            "Loaded {} words ({} lines skipped, {} failed).",
            summary.inserted, summary.skipped, summary.failed
        );
    }
    if let Some(path) = &args.report {
        write_report(node.node_ref(), connector.as_ref(), path).await?;
    }

    tokio::select! {
        served = server_task => {
            served??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(node = %node.node_ref(), "shutting down");
        }
    }
    Ok(())
}

async fn connect(addr: &str, config: TransportConfig) -> anyhow::Result<RemoteNode> {
    let connector = TcpConnector::new(config.clone());
    let node = connector
        .dial_addr(addr)
        .await
        .with_context(|| format!("unable to connect to the node at {}", addr))?;
    Ok(RemoteNode::new(node, config))
}

async fn run_client(addr: &str) -> CommandResult {
    let node = connect(addr, TransportConfig::default()).await?;
    println!("Connected to node at {}", node.node_ref());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("Enter 1 to lookup, 2 to insert, or 3 to exit:");
        let Some(choice) = lines.next_line().await? else {
            return Ok(());
        };
        match choice.trim() {
            "1" => {
                println!("Enter a word:");
                let Some(word) = lines.next_line().await? else {
                    return Ok(());
                };
                let definition = node.lookup(word.trim().to_string()).await?;
                println!("Definition: {}", definition);
            }
            "2" => {
                println!("Enter a word:");
                let Some(word) = lines.next_line().await? else {
                    return Ok(());
                };
                println!("Enter the definition:");
                let Some(definition) = lines.next_line().await? else {
                    return Ok(());
                };
                let owner = node
                    .insert(word.trim().to_string(), Some(definition.trim().to_string()))
                    .await?;
                println!("Inserted at {}.", owner);
            }
            "3" => {
                println!("Exiting...");
                return Ok(());
            }
            _ => println!("Invalid choice."),
        }
    }
}

async fn run_load(addr: &str, file: &Path) -> CommandResult {
    let node = connect(addr, TransportConfig::default()).await?;
    let summary = load_file(&node, file)
        .await
        .with_context(|| format!("loading {}", file.display()))?;
    println!(
        "Loaded {} words ({} lines skipped, {} failed).",
        summary.inserted, summary.skipped, summary.failed
    );
    Ok(())
}

async fn run_report(addr: &str, out: &Path) -> CommandResult {
    let config = TransportConfig::default();
    let connector = TcpConnector::new(config.clone());
    let entry = connector
        .dial_addr(addr)
        .await
        .with_context(|| format!("unable to connect to the node at {}", addr))?;
    write_report(&entry, &connector, out).await
}

async fn write_report(entry: &NodeRef, connector: &TcpConnector, out: &Path) -> CommandResult {
    let members = discover_ring(entry, connector, MAX_REPORT_MEMBERS).await?;
    let report = RingReport::collect(&members, connector).await;
    std::fs::write(out, report.render())
        .with_context(|| format!("writing report to {}", out.display()))?;
    info!(
        path = %out.display(),
        nodes = members.len(),
        words = report.total_words(),
        "report written"
    );
    println!("Report generated at {}", out.display());
    Ok(())
}
