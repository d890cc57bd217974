//! # CLI Interface
//!
//! Defines the command-line argument structure for `algo-tool` using
//! `clap` derive. Every subcommand reads and writes transaction files of
//! concatenated canonical encodings, so the steps of an offline signing
//! ceremony can run on different machines.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Offline wallet tooling.
///
/// Builds transactions, signs them with single keys or multisig members,
/// merges partial multisig signatures, and groups transactions for atomic
/// submission. Nothing here talks to a node.
#[derive(Parser, Debug)]
#[command(
    name = "algo-tool",
    about = "Offline transaction building and signing",
    version,
    propagate_version = true
)]
pub struct AlgoToolCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ALGO_TOOL_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh keypair and print its address, private key and mnemonic.
    Keygen,
    /// Convert between addresses and raw public keys.
    #[command(subcommand)]
    Address(AddressCommand),
    /// Derive the address of a multisig account.
    MsigAddress(MultisigArgs),
    /// Build an unsigned payment and write it to a file.
    Pay(PayArgs),
    /// Sign every transaction in a file with a single key.
    Sign(SignArgs),
    /// Add one member's signature to every transaction in a file.
    MsigSign(MsigSignArgs),
    /// Merge partially signed multisig files into one.
    Merge(MergeArgs),
    /// Assign a shared group id to the transactions of a file.
    Group(GroupArgs),
    /// Print the transactions of a file as JSON.
    Inspect(InspectArgs),
    /// Check every signature in a file of signed transactions.
    Verify(VerifyArgs),
    /// Derive the escrow address of a contract template.
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Subcommand, Debug)]
pub enum AddressCommand {
    /// Encode a hex public key as an address.
    Encode {
        /// 32-byte public key, hex.
        public_key: String,
    },
    /// Decode an address to its hex public key.
    Decode {
        address: String,
    },
}

/// Multisig account description shared by several subcommands.
#[derive(Args, Debug)]
pub struct MultisigArgs {
    /// Multisig version.
    #[arg(id = "msig_version", long = "msig-version", default_value_t = 1)]
    pub version: u8,

    /// Number of signatures required.
    #[arg(long)]
    pub threshold: u8,

    /// Member addresses, in account order. Order changes the address.
    #[arg(long = "member", required = true)]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    #[arg(long)]
    pub from: String,

    #[arg(long)]
    pub to: String,

    /// Amount in micro-units.
    #[arg(long)]
    pub amount: u64,

    /// Account to close the sender's remaining balance to.
    #[arg(long)]
    pub close_to: Option<String>,

    /// Fee. A per-byte rate unless `--flat-fee` is set.
    #[arg(long, default_value_t = 0)]
    pub fee: u64,

    #[arg(long)]
    pub flat_fee: bool,

    #[arg(long)]
    pub first_valid: u64,

    #[arg(long)]
    pub last_valid: u64,

    #[arg(long, env = "ALGO_TOOL_GENESIS_ID", default_value = "")]
    pub genesis_id: String,

    /// Genesis hash, base64.
    #[arg(long, env = "ALGO_TOOL_GENESIS_HASH")]
    pub genesis_hash: Option<String>,

    /// Free-form note, UTF-8.
    #[arg(long)]
    pub note: Option<String>,

    /// Output file.
    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// File of unsigned transactions.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Private key, base64, or its 25-word mnemonic.
    ///
    /// **Prefer the environment variable** so the key stays out of shell history.
    #[arg(long, env = "ALGO_TOOL_KEY", hide_env_values = true)]
    pub key: String,
}

#[derive(Args, Debug)]
pub struct MsigSignArgs {
    /// File of unsigned transactions or partially signed multisig transactions.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    #[arg(long, short = 'o')]
    pub out: PathBuf,

    #[arg(long, env = "ALGO_TOOL_KEY", hide_env_values = true)]
    pub key: String,

    /// Multisig version, for unsigned input.
    #[arg(id = "msig_version", long = "msig-version", default_value_t = 1)]
    pub version: u8,

    /// Signatures required. Needed only when the input is unsigned.
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Member addresses, in account order. Needed only when the input is unsigned.
    #[arg(long = "member")]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Partially signed files, one per signer. Each must hold the same
    /// transactions in the same order.
    #[arg(required = true, num_args = 2..)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

/// What a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileKind {
    Unsigned,
    Signed,
    Multisig,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value = "signed")]
    pub kind: FileKind,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    pub input: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Hash time-locked contract.
    Htlc {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        receiver: String,
        /// Hash image, hex.
        #[arg(long)]
        image: String,
        /// Use keccak256 instead of sha256.
        #[arg(long)]
        keccak: bool,
        #[arg(long)]
        expiry_round: u64,
        #[arg(long)]
        max_fee: u64,
    },
    /// Ratio split between two receivers.
    Split {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        receiver_1: String,
        #[arg(long)]
        receiver_2: String,
        #[arg(long)]
        ratio_n: u64,
        #[arg(long)]
        ratio_d: u64,
        #[arg(long)]
        min_pay: u64,
        #[arg(long)]
        expiry_round: u64,
        #[arg(long)]
        max_fee: u64,
    },
}
