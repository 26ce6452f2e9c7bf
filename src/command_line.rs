use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use aws_local_dev::provision::{self, CreateOutcome, ProvisionReport, BUCKET_NAME, TABLE_NAME};
use aws_local_dev::stack::{self, StackStatus};
use aws_local_dev::{ConnectionConfig, DEFAULT_REGION};
use tracing::info;

/// Provision mock AWS resources on a local emulator
#[derive(Debug, clap::Parser)]
#[command(name = "aws-local-dev", version)]
#[command(about = "Provision mock AWS resources on a local emulator", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Emulator endpoint, overriding LOCALSTACK_HOSTNAME
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Create the application bucket and the users table
    Init {
        /// AWS region to use
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },

    /// Apply the full infrastructure stack to the emulator
    Deploy,

    /// Print the infrastructure stack as a CloudFormation template
    Synth {
        /// Write the template to a file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check that the stack's resources exist with the expected settings
    Verify {
        /// Print the observed state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every bucket and table on the emulator
    Teardown {
        /// Actually delete; without it only the resources are listed
        #[arg(long)]
        force: bool,
    },
}

/// Runs one command against the endpoint described by `config`.
pub async fn run(command: Command, config: ConnectionConfig) -> Result<()> {
    match command {
        Command::Init { region } => init(config.with_region(region)).await,
        Command::Deploy => deploy(&config).await,
        Command::Synth { output } => synth(output),
        Command::Verify { json } => verify(&config, json).await,
        Command::Teardown { force } => teardown(&config, force).await,
    }
}

async fn init(config: ConnectionConfig) -> Result<()> {
    println!("Target: {}", config.target_display());

    let report = provision::provision(&config).await;
    print_outcome("S3 bucket", BUCKET_NAME, &report.bucket);
    print_outcome("DynamoDB table", TABLE_NAME, &report.table);

    if !report.is_success() {
        bail!("provisioning failed: {}", failure_summary(&report));
    }
    Ok(())
}

fn print_outcome(kind: &str, name: &str, outcome: &Result<CreateOutcome, aws_local_dev::Error>) {
    match outcome {
        Ok(CreateOutcome::Created) => println!("Created {kind} '{name}' successfully!"),
        Ok(CreateOutcome::AlreadyExists) => println!("{kind} '{name}' already exists"),
        Err(e) => println!("Failed to create {kind} '{name}': {e}"),
    }
}

fn failure_summary(report: &ProvisionReport) -> String {
    [("bucket", &report.bucket), ("table", &report.table)]
        .into_iter()
        .filter(|(_, outcome)| outcome.is_err())
        .map(|(kind, _)| kind)
        .collect::<Vec<_>>()
        .join(" and ")
}

async fn deploy(config: &ConnectionConfig) -> Result<()> {
    let stack = stack::base_stack();
    println!("Target: {}", config.target_display());

    let report = stack::deploy(config, &stack)
        .await
        .with_context(|| format!("deploying {}", stack.name))?;

    println!("{} '{}': {}", stack.bucket_id, stack.bucket.name(), report.bucket);
    println!("{} '{}': {}", stack.table_id, stack.table.name(), report.table);
    println!("{} deployed successfully.", stack.name);
    Ok(())
}

fn synth(output: Option<PathBuf>) -> Result<()> {
    let template = stack::synth(&stack::base_stack());
    let rendered = serde_json::to_string_pretty(&template)?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered + "\n")
                .with_context(|| format!("writing template to {}", path.display()))?;
            info!("Template written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn verify(config: &ConnectionConfig, json: bool) -> Result<()> {
    let stack = stack::base_stack();
    let status = stack::verify(config, &stack).await?;
    let problems = status.problems(&stack);

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    if !problems.is_empty() {
        for problem in &problems {
            println!("  - {problem}");
        }
        bail!("{} problem(s) found", problems.len());
    }
    Ok(())
}

fn print_status(status: &StackStatus) {
    println!("\n--- Stack Status ---");
    println!(
        "Bucket '{}': {}",
        status.bucket,
        if status.bucket_exists { "present" } else { "missing" }
    );
    if let Some(versioning) = &status.bucket_versioning {
        println!("  Versioning: {versioning}");
    }
    println!(
        "Table '{}': {}",
        status.table,
        if status.table_exists { "present" } else { "missing" }
    );
    for key in &status.table_keys {
        println!(
            "  {} ({}, {})",
            key.name,
            key.key_type,
            key.attribute_type.unwrap_or("?")
        );
    }
    println!("--------------------\n");
}

async fn teardown(config: &ConnectionConfig, force: bool) -> Result<()> {
    if !force {
        let buckets = config.s3()?.list_buckets().await?;
        let tables = config.dynamodb()?.list_tables().await?;
        println!("Would delete buckets: {buckets:?}");
        println!("Would delete tables: {tables:?}");
        println!("Re-run with --force to delete them.");
        return Ok(());
    }

    let report = stack::teardown(config).await?;
    println!("Deleted buckets: {:?}", report.buckets_deleted);
    println!("Deleted tables: {:?}", report.tables_deleted);
    if report.failures > 0 {
        bail!("{} resource(s) could not be deleted", report.failures);
    }
    Ok(())
}
