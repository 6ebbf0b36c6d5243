//! Command line access to an in memory indexed merkle tree.
//!
//! The tree is populated from `--seed KEY:VALUE` records and the requested root or proof is
//! written to stdout as a `0x` prefixed hex string. Proofs use the ABI export format.

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{eyre, Context as _};
use indexed_merkle_tree_db::{
    abi, HashDBStore, IndexedTree, IndexedTreeDBMutBuilder, IndexedTreeMut, Keccak, MemoryNodeDB,
    Poseidon, TreeHasher, Word,
};
use tracing::info;

/// Command-line interface definition
#[derive(Debug, Parser)]
#[command(name = "imt")]
#[command(about = "Indexed merkle tree roots and proofs")]
struct Cli {
    /// Depth of the tree
    #[arg(long, env = "IMT_DEPTH", default_value_t = 16)]
    depth: usize,
    /// Hash function of the tree
    #[arg(long, env = "IMT_HASHER", value_enum, default_value_t = HasherKind::Poseidon)]
    hasher: HasherKind,
    /// Records inserted before the command runs, as `KEY:VALUE`
    #[arg(long = "seed", value_parser = parse_seed, default_values = ["123:456"])]
    seeds: Vec<(Word, Word)>,
    /// Cli subcommands
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HasherKind {
    Poseidon,
    Keccak,
}

/// Cli subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tree root
    #[command(name = "getTreeRoot")]
    GetTreeRoot,
    /// Print the encoded inclusion proof of a key
    #[command(name = "getInclusionProof")]
    GetInclusionProof { key: Word },
    /// Print the encoded exclusion proof of a key
    #[command(name = "getExclusionProof")]
    GetExclusionProof { key: Word },
}

fn parse_seed(s: &str) -> Result<(Word, Word), String> {
    let (key, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected KEY:VALUE, found `{s}`"))?;
    let key = key.parse::<Word>().map_err(|e| e.to_string())?;
    let value = value.parse::<Word>().map_err(|e| e.to_string())?;
    Ok((key, value))
}

fn init_tracing() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize tracing: {:?}", e))
}

fn run<H: TreeHasher>(cli: &Cli) -> eyre::Result<String> {
    let mut db = MemoryNodeDB::<Keccak>::default();
    let store = HashDBStore::<Keccak>::new(&mut db);
    let mut tree = IndexedTreeDBMutBuilder::<_, H>::new(store, cli.depth)?.build()?;

    for (key, value) in &cli.seeds {
        tree.insert(*key, *value)
            .wrap_err_with(|| format!("failed to insert seed {key}:{value}"))?;
    }
    info!(size = tree.size(), "tree populated");

    let output = match &cli.command {
        Command::GetTreeRoot => tree.root()?.to_vec(),
        Command::GetInclusionProof { key } => abi::encode_proof(&tree.prove_inclusion(key)?),
        Command::GetExclusionProof { key } => abi::encode_proof(&tree.prove_exclusion(key)?),
    };
    Ok(format!("0x{}", hex::encode(output)))
}

fn main() -> eyre::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let output = match cli.hasher {
        HasherKind::Poseidon => run::<Poseidon>(&cli)?,
        HasherKind::Keccak => run::<Keccak>(&cli)?,
    };
    println!("{output}");

    Ok(())
}
