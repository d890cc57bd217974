// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Wallet Tool
//!
//! Entry point for the `algo-tool` binary. Parses CLI arguments,
//! initializes logging, and runs one offline step of a transaction's life:
//!
//! - `keygen`, `address`, `msig-address` - identities
//! - `pay`                                - build an unsigned payment file
//! - `sign`, `msig-sign`, `merge`         - authorize
//! - `group`                              - bind transactions atomically
//! - `inspect`, `verify`                  - look before you submit
//! - `template`                           - escrow addresses of contract templates

mod cli;
mod logging;

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use serde::Serialize;

use algo_protocol::crypto::{mnemonic, Address, Keypair};
use algo_protocol::storage::{read_from_file, write_to_file};
use algo_protocol::transaction::{
    assign_group_id, compute_group_id, Multisig, MultisigTransaction, PaymentFields,
    SignedTransaction, Transaction, TransactionBuilder,
};
use algo_templates::{HashFunction, Htlc, HtlcParams, Split, SplitParams, Template};

use cli::{AddressCommand, AlgoToolCli, Commands, FileKind, TemplateCommand};

fn main() -> Result<()> {
    let cli = AlgoToolCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Address(cmd) => address(cmd),
        Commands::MsigAddress(args) => {
            let msig = multisig_account(&args.members, args.version, args.threshold)?;
            println!("{}", msig.address());
            Ok(())
        }
        Commands::Pay(args) => pay(args),
        Commands::Sign(args) => sign(args),
        Commands::MsigSign(args) => msig_sign(args),
        Commands::Merge(args) => merge(args),
        Commands::Group(args) => group(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Verify(args) => verify(args),
        Commands::Template(cmd) => template(cmd),
    }
}

#[derive(Serialize)]
struct GeneratedKey {
    address: String,
    private_key: String,
    mnemonic: String,
}

fn keygen() -> Result<()> {
    let keypair = Keypair::generate();
    let out = GeneratedKey {
        address: keypair.address().encode(),
        private_key: keypair.private_key_b64(),
        mnemonic: mnemonic::from_private_key(&keypair.private_key())?,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    tracing::info!(address = %out.address, "generated keypair");
    Ok(())
}

fn address(cmd: AddressCommand) -> Result<()> {
    match cmd {
        AddressCommand::Encode { public_key } => {
            let bytes = hex::decode(public_key.trim()).context("public key is not hex")?;
            let addr = Address::try_from_slice(&bytes)?;
            println!("{addr}");
        }
        AddressCommand::Decode { address } => {
            let addr = parse_address(&address)?;
            println!("{}", hex::encode(addr.as_bytes()));
        }
    }
    Ok(())
}

fn pay(args: cli::PayArgs) -> Result<()> {
    let mut fields = PaymentFields::new(parse_address(&args.to)?, args.amount);
    if let Some(close_to) = &args.close_to {
        fields = fields.close_remainder_to(parse_address(close_to)?);
    }

    let mut builder = TransactionBuilder::new(parse_address(&args.from)?)
        .fee(args.fee)
        .flat_fee(args.flat_fee)
        .validity(args.first_valid, args.last_valid)
        .genesis_id(&args.genesis_id)
        .payment(fields);
    if let Some(hash) = &args.genesis_hash {
        builder = builder.genesis_hash(parse_hash(hash)?);
    }
    if let Some(note) = args.note {
        builder = builder.note(note.into_bytes());
    }

    let txn = builder.build().context("invalid payment")?;
    write_to_file(&args.out, std::slice::from_ref(&txn))
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(txid = %txn.id_string(), fee = txn.fee(), out = %args.out.display(), "wrote payment");
    println!("{}", txn.id_string());
    Ok(())
}

fn sign(args: cli::SignArgs) -> Result<()> {
    let keypair = parse_key(&args.key)?;
    let txns: Vec<Transaction> = read(&args.input)?;
    let signed: Vec<SignedTransaction> = txns.iter().map(|t| t.sign(&keypair)).collect();

    for stx in &signed {
        if stx.auth_addr.is_some() {
            tracing::warn!(txid = %stx.id_string(), signer = %keypair.address(), "key is not the sender's; recorded as authorizer");
        }
    }
    write(&args.out, &signed)?;
    tracing::info!(count = signed.len(), out = %args.out.display(), "signed");
    Ok(())
}

fn msig_sign(args: cli::MsigSignArgs) -> Result<()> {
    let keypair = parse_key(&args.key)?;

    let pending: Vec<MultisigTransaction> = match args.threshold {
        Some(threshold) => {
            let msig = multisig_account(&args.members, args.version, threshold)?;
            read::<Transaction>(&args.input)?
                .into_iter()
                .map(|t| MultisigTransaction::new(t, &msig))
                .collect::<Result<_, _>>()?
        }
        None => {
            ensure!(
                args.members.is_empty(),
                "--member given without --threshold"
            );
            read(&args.input)?
        }
    };

    let signed = pending
        .iter()
        .map(|m| m.sign(&keypair))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("{} is not a member of the account", keypair.address()))?;

    write(&args.out, &signed)?;
    for m in &signed {
        tracing::info!(
            txid = %m.txn.id_string(),
            signatures = m.msig.populated(),
            threshold = m.msig.threshold,
            "multisig signed"
        );
    }
    Ok(())
}

fn merge(args: cli::MergeArgs) -> Result<()> {
    let files = args
        .inputs
        .iter()
        .map(|p| read::<MultisigTransaction>(p))
        .collect::<Result<Vec<_>>>()?;

    let len = files.first().map_or(0, Vec::len);
    ensure!(
        files.iter().all(|f| f.len() == len),
        "inputs hold different numbers of transactions"
    );

    let mut merged = Vec::with_capacity(len);
    for i in 0..len {
        let parts: Vec<MultisigTransaction> = files.iter().map(|f| f[i].clone()).collect();
        let m = MultisigTransaction::merge(&parts)
            .with_context(|| format!("cannot merge transaction {i}"))?;
        if !m.is_broadcast_eligible() {
            tracing::warn!(
                txid = %m.txn.id_string(),
                signatures = m.msig.populated(),
                threshold = m.msig.threshold,
                "merged transaction is still below threshold"
            );
        }
        merged.push(m);
    }

    write(&args.out, &merged)?;
    tracing::info!(count = merged.len(), out = %args.out.display(), "merged");
    Ok(())
}

fn group(args: cli::GroupArgs) -> Result<()> {
    let txns: Vec<Transaction> = read(&args.input)?;
    let gid = compute_group_id(&txns)?;
    let grouped = assign_group_id(&txns)?;
    write(&args.out, &grouped)?;
    println!("{}", STANDARD.encode(gid));
    Ok(())
}

fn inspect(args: cli::InspectArgs) -> Result<()> {
    let json = match args.kind {
        FileKind::Unsigned => serde_json::to_string_pretty(&read::<Transaction>(&args.input)?)?,
        FileKind::Signed => {
            serde_json::to_string_pretty(&read::<SignedTransaction>(&args.input)?)?
        }
        FileKind::Multisig => {
            serde_json::to_string_pretty(&read::<MultisigTransaction>(&args.input)?)?
        }
    };
    println!("{json}");
    Ok(())
}

fn verify(args: cli::VerifyArgs) -> Result<()> {
    let signed: Vec<SignedTransaction> = read(&args.input)?;
    let mut failed = 0usize;
    for stx in &signed {
        match stx.verify() {
            Ok(()) => println!("{} ok", stx.id_string()),
            Err(e) => {
                failed += 1;
                println!("{} FAILED: {e}", stx.id_string());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} transactions failed verification", signed.len());
    }
    Ok(())
}

fn template(cmd: TemplateCommand) -> Result<()> {
    let addr = match cmd {
        TemplateCommand::Htlc {
            owner,
            receiver,
            image,
            keccak,
            expiry_round,
            max_fee,
        } => {
            let image: [u8; 32] = hex::decode(image.trim())
                .context("hash image is not hex")?
                .try_into()
                .map_err(|v: Vec<u8>| anyhow::anyhow!("hash image must be 32 bytes, got {}", v.len()))?;
            Htlc::new(HtlcParams {
                owner: parse_address(&owner)?,
                receiver: parse_address(&receiver)?,
                hash_function: if keccak {
                    HashFunction::Keccak256
                } else {
                    HashFunction::Sha256
                },
                hash_image: image,
                expiry_round,
                max_fee,
            })?
            .address()
        }
        TemplateCommand::Split {
            owner,
            receiver_1,
            receiver_2,
            ratio_n,
            ratio_d,
            min_pay,
            expiry_round,
            max_fee,
        } => Split::new(SplitParams {
            owner: parse_address(&owner)?,
            receiver_1: parse_address(&receiver_1)?,
            receiver_2: parse_address(&receiver_2)?,
            ratio_n,
            ratio_d,
            min_pay,
            expiry_round,
            max_fee,
        })?
        .address(),
    };
    println!("{addr}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_address(text: &str) -> Result<Address> {
    Address::decode(text.trim()).with_context(|| format!("invalid address {text:?}"))
}

/// A base64 private key, or a 25-word mnemonic when the text has spaces.
fn parse_key(text: &str) -> Result<Keypair> {
    let text = text.trim();
    if text.contains(char::is_whitespace) {
        return mnemonic::to_keypair(text).context("invalid mnemonic");
    }
    Keypair::from_private_key_b64(text).context("invalid private key")
}

fn parse_hash(b64: &str) -> Result<[u8; 32]> {
    let bytes = STANDARD.decode(b64.trim()).context("genesis hash is not base64")?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| anyhow::anyhow!("genesis hash must be 32 bytes, got {}", v.len()))
}

fn multisig_account(members: &[String], version: u8, threshold: u8) -> Result<Multisig> {
    let keys = members
        .iter()
        .map(|m| parse_address(m))
        .collect::<Result<Vec<_>>>()?;
    Ok(Multisig::new(version, threshold, keys)?)
}

fn read<T: algo_protocol::encoding::CanonicalDecode>(path: &Path) -> Result<Vec<T>> {
    read_from_file(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write<T: algo_protocol::encoding::CanonicalEncode>(path: &Path, items: &[T]) -> Result<()> {
    write_to_file(path, items).with_context(|| format!("failed to write {}", path.display()))
}
