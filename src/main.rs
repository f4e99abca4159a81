use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use receipts_ledger::audit::{ActorContextProvider, EnvActorProvider};
use receipts_ledger::cli::{
    handle_account_command, handle_audit_command, handle_receipt_command, AccountCommands,
    AuditCommands, ReceiptCommands,
};
use receipts_ledger::config::{paths::LedgerPaths, settings::Settings};
use receipts_ledger::logging::{init_logging, resolve_format};
use receipts_ledger::storage::Ledger;

#[derive(Parser)]
#[command(
    name = "receipts",
    version,
    about = "Receipts, accounts and transactions ledger with an audit trail",
    long_about = "Records receipts, their line items and the transactions that post \
                  them to accounts. Every change is written together with an \
                  immutable audit record naming who made it. The acting user is read \
                  from RECEIPTS_USER_ID, RECEIPTS_API_KEY_ID, RECEIPTS_IP_ADDRESS and \
                  RECEIPTS_USER_AGENT."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Receipt management commands
    #[command(subcommand)]
    Receipt(ReceiptCommands),

    /// Audit trail queries
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(settings.log_format);

    let Some(command) = cli.command else {
        println!("receipts - receipts ledger with an audit trail");
        println!();
        println!("Run 'receipts --help' for usage information.");
        return Ok(());
    };

    if let Commands::Config = command {
        println!("Receipts Ledger Configuration");
        println!("=============================");
        println!("Base directory: {}", paths.base_dir().display());
        println!("Ledger file:    {}", paths.ledger_file().display());
        println!("Settings file:  {}", paths.settings_file().display());
        println!();
        println!("Settings:");
        println!("  Audit retention days: {}", settings.audit_retention_days);
        println!("  Recent audit limit:   {}", settings.recent_audit_limit);
        println!("  Log format:           {:?}", resolve_format(settings.log_format));
        return Ok(());
    }

    let ledger = Ledger::open(&paths)?;
    let actor = EnvActorProvider.current();
    debug!(user_id = ?actor.user_id, "Resolved actor");

    match command {
        Commands::Account(cmd) => handle_account_command(&ledger, actor, cmd)?,
        Commands::Receipt(cmd) => handle_receipt_command(&ledger, actor, cmd)?,
        Commands::Audit(cmd) => handle_audit_command(&ledger, &settings, cmd)?,
        Commands::Config => {}
    }

    Ok(())
}
