use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
mod auth;
use pwvault::{CharClass, CredentialEntry, CredentialError, KdfParams, Vault, VaultConfig, generator};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pwvault")]
#[command(version, about = "Local, offline password vault and generator.")]
struct Cli {
    /// Path to the vault container file
    #[arg(long, global = true, value_name = "PATH", env = "PWVAULT_PATH")]
    vault: Option<PathBuf>,

    /// Directory for timestamped backups (default: `backups/` next to the vault)
    #[arg(long, global = true, value_name = "DIR", env = "PWVAULT_BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// Number of backups to keep (default: 5)
    #[arg(long, global = true, value_name = "N", env = "PWVAULT_MAX_BACKUPS")]
    max_backups: Option<usize>,

    /// PBKDF2 iterations (default and minimum: 480000)
    #[arg(long, global = true, value_name = "N", env = "PWVAULT_KDF_ITERATIONS")]
    kdf_iterations: Option<u32>,

    /// Log vault operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> Result<VaultConfig> {
        let mut config = match &self.vault {
            Some(path) => {
                let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                VaultConfig {
                    vault_path: path.clone(),
                    ..VaultConfig::in_dir(dir)
                }
            }
            None => VaultConfig::platform_default()?,
        };

        if let Some(dir) = &self.backup_dir {
            config.backup_dir = dir.clone();
        }
        if let Some(max) = self.max_backups {
            config.max_backups = max;
        }
        if let Some(iterations) = self.kdf_iterations {
            config.kdf = KdfParams::new(iterations)?;
        }
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates a random password
    Generate {
        /// Password length
        #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(8..=32))]
        length: u16,

        /// Leave out uppercase letters
        #[arg(long)]
        no_upper: bool,

        /// Leave out lowercase letters
        #[arg(long)]
        no_lower: bool,

        /// Leave out digits
        #[arg(long)]
        no_digits: bool,

        /// Leave out symbols
        #[arg(long)]
        no_symbols: bool,

        /// Copy the password to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,

        /// Store the password under this service name
        #[arg(long, value_name = "SERVICE", requires = "account", value_parser = non_empty)]
        save: Option<String>,

        /// Account id stored with --save
        #[arg(long, requires = "save", value_parser = non_empty)]
        account: Option<String>,
    },

    /// Stores a new credential
    #[command(arg_required_else_help = true)]
    Add {
        #[arg(value_parser = non_empty)]
        service: String,
        #[arg(value_parser = non_empty)]
        account: String,
        #[arg(value_parser = non_empty)]
        password: String,
    },

    /// Shows the credential stored for a service
    #[command(arg_required_else_help = true)]
    Get { service: String },

    /// Lists stored services
    List {
        /// Print services with their account ids
        #[arg(short, long, default_value_t = false)]
        all: bool,
    },

    /// Finds services by service name or account id
    #[command(arg_required_else_help = true)]
    Search { term: String },

    /// Changes the name, account id or password of a credential
    #[command(arg_required_else_help = true)]
    #[command(group(
        ArgGroup::new("changes")
            .required(true)
            .multiple(true)
            .args(["rename", "account", "password"])
    ))]
    Edit {
        service: String,

        /// New service name
        #[arg(long, value_parser = non_empty)]
        rename: Option<String>,

        /// New account id
        #[arg(long, value_parser = non_empty)]
        account: Option<String>,

        /// New password
        #[arg(long, value_parser = non_empty)]
        password: Option<String>,
    },

    /// Removes a credential
    #[command(arg_required_else_help = true)]
    Remove { service: String },

    /// Re-encrypts the vault under a new master password
    ChangePassphrase,

    /// Copies the vault into the backup ring now
    Backup,
}

fn non_empty(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("value cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "pwvault=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("PWVAULT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_vault(config: &VaultConfig) -> Result<Vault> {
    let password = if config.vault_path.exists() {
        auth::read_password()?
    } else {
        auth::read_initial_password()?
    };
    Ok(Vault::open(config, password)?)
}

fn lookup<'a>(vault: &'a Vault, service: &str) -> Result<&'a CredentialEntry> {
    Ok(vault
        .get(service)
        .ok_or_else(|| CredentialError::ServiceNotFound(service.to_string()))?)
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text)
        .context("failed to copy password to clipboard")?;
    Ok(())
}

fn print_table(rows: &[(&str, &CredentialEntry)]) {
    if rows.is_empty() {
        println!("No credentials stored.");
        return;
    }

    let service_width = rows
        .iter()
        .map(|(service, _)| service.chars().count())
        .chain(std::iter::once("Service".len()))
        .max()
        .unwrap_or_default();

    let account_width = rows
        .iter()
        .map(|(_, e)| e.account_id().chars().count())
        .chain(std::iter::once("Account".len()))
        .max()
        .unwrap_or_default();

    println!("{:<service_width$}  {:<account_width$}", "Service", "Account");
    println!("{:-<service_width$}  {:-<account_width$}", "", "");

    for (service, e) in rows {
        println!("{:<service_width$}  {:<account_width$}", service, e.account_id());
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    init_tracing(args.verbose);

    match &args.command {
        Commands::Generate {
            length,
            no_upper,
            no_lower,
            no_digits,
            no_symbols,
            copy,
            save,
            account,
        } => {
            let classes: Vec<CharClass> = [
                (CharClass::Upper, *no_upper),
                (CharClass::Lower, *no_lower),
                (CharClass::Digit, *no_digits),
                (CharClass::Symbol, *no_symbols),
            ]
            .into_iter()
            .filter(|(_, excluded)| !excluded)
            .map(|(class, _)| class)
            .collect();

            let password = generator::generate(usize::from(*length), &classes)?;

            if *copy {
                copy_to_clipboard(&password)?;
                println!("password copied to clipboard");
            } else {
                println!("{}", password.as_str());
            }

            if let (Some(service), Some(account)) = (save, account) {
                let mut vault = open_vault(&args.config()?)?;
                vault.add(service, account, &password)?;
                println!("stored password for '{service}'");
            }
        }
        Commands::Add {
            service,
            account,
            password,
        } => {
            let mut vault = open_vault(&args.config()?)?;
            vault.add(service, account, password)?;
            println!("stored password for '{service}'");
        }
        Commands::Get { service } => {
            let vault = open_vault(&args.config()?)?;
            let entry = lookup(&vault, service)?;
            println!("account:  {}", entry.account_id());
            println!("password: {}", entry.secret());
        }
        Commands::List { all } => {
            let vault = open_vault(&args.config()?)?;
            if *all {
                print_table(&vault.entries());
            } else if vault.is_empty() {
                println!("No credentials stored.");
            } else {
                for service in vault.service_names() {
                    println!("{service}");
                }
            }
        }
        Commands::Search { term } => {
            let vault = open_vault(&args.config()?)?;
            let found = vault.search(term);
            if found.is_empty() {
                println!("no matches for '{term}'");
            } else {
                print_table(&found);
            }
        }
        Commands::Edit {
            service,
            rename,
            account,
            password,
        } => {
            let mut vault = open_vault(&args.config()?)?;
            let entry = lookup(&vault, service)?;

            let new_service = rename.clone().unwrap_or_else(|| service.clone());
            let new_account = account
                .clone()
                .unwrap_or_else(|| entry.account_id().to_string());
            let new_password = zeroize::Zeroizing::new(
                password
                    .clone()
                    .unwrap_or_else(|| entry.secret().to_string()),
            );

            if new_service == *service
                && new_account == entry.account_id()
                && new_password.as_str() == entry.secret()
            {
                println!("nothing changed");
                return Ok(());
            }

            vault.update(service, &new_service, &new_account, &new_password)?;
            println!("updated '{new_service}'");
        }
        Commands::Remove { service } => {
            let mut vault = open_vault(&args.config()?)?;
            vault.remove(service)?;
            println!("'{service}' removed successfully");
        }
        Commands::ChangePassphrase => {
            let config = args.config()?;
            if !config.vault_path.exists() {
                anyhow::bail!("vault does not exist: {}", config.vault_path.display());
            }
            let mut vault = Vault::open(&config, auth::read_password()?)?;
            let new_password = auth::read_new_password_with_confirmation()?;
            vault.change_passphrase(new_password)?;
            println!("master password changed");
        }
        Commands::Backup => {
            let config = args.config()?;
            let rotator = pwvault::BackupRotator::new(&config.backup_dir, config.max_backups);
            match rotator.rotate(&config.vault_path)? {
                Some(path) => println!("backup written to {}", path.display()),
                None => println!("no vault to back up"),
            }
        }
    }

    Ok(())
}
