//! adrive CLI - Interact with Aliyun Drive through the open platform API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aliyundrive_open::config::DEFAULT_API_BASE;
use aliyundrive_open::models::format_size;
use aliyundrive_open::{
    AuthClient, AuthorizeOptions, ClientConfig, DriveClient, QrStatus, Session, Transport,
};

/// CLI tool for interacting with Aliyun Drive.
#[derive(Parser)]
#[command(name = "adrive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Open platform application id.
    #[arg(long, env = "ALIYUNDRIVE_CLIENT_ID")]
    client_id: String,

    /// Open platform application secret.
    #[arg(long, env = "ALIYUNDRIVE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// File holding the authorized session.
    #[arg(long, env = "ALIYUNDRIVE_SESSION", default_value = ".aliyundrive-session.json")]
    session: PathBuf,

    /// API base URL.
    #[arg(long, env = "ALIYUNDRIVE_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in by scanning a QR code and store the session.
    Login,

    /// Refresh the stored access token.
    Refresh,

    #[command(flatten)]
    Drive(DriveCommand),
}

/// Commands that run against the drive with a stored session.
#[derive(Subcommand)]
enum DriveCommand {
    /// Show drive and space information.
    Info,

    /// List files in a folder.
    #[command(visible_alias = "ls")]
    List {
        /// Folder ID.
        #[arg(default_value = "root")]
        folder: String,
    },

    /// Upload files to a folder.
    Upload {
        /// File patterns to upload (supports glob patterns like *.tar, file_{1,2,3}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination folder ID.
        #[arg(long, short = 't', default_value = "root")]
        to: String,
    },

    /// Download a file to local filesystem.
    Download {
        /// File ID to download.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Print a temporary download URL.
    Url {
        /// File ID.
        file: String,
    },

    /// Move a file into another folder.
    #[command(visible_alias = "mv")]
    Move {
        file: String,
        #[arg(long, short = 't')]
        to: String,
    },

    /// Copy a file into another folder.
    #[command(visible_alias = "cp")]
    Copy {
        file: String,
        #[arg(long, short = 't')]
        to: String,
    },

    /// Rename a file.
    Rename { file: String, name: String },

    /// Replace text in the name of a file, or of every file in a folder.
    ReplaceName {
        file: String,
        old: String,
        new: String,
    },

    /// Move a file to the recycle bin.
    Trash { file: String },

    /// Delete a file permanently.
    #[command(visible_alias = "rm")]
    Delete { file: String },

    /// Create a folder.
    Mkdir {
        name: String,
        #[arg(long, short = 'p', default_value = "root")]
        parent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aliyundrive_open=info,adrive=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::default().with_base_url(cli.api_base.as_str());
    let transport = Transport::new(&config).context("Failed to build HTTP client")?;
    let auth = AuthClient::new(
        cli.client_id.as_str(),
        cli.client_secret.as_str(),
        transport.clone(),
    );

    match cli.command {
        Commands::Login => {
            let session = login(&auth).await?;
            save_session(&cli.session, &session)?;
            println!("Logged in. Drive: {}", session.drive_id);
        }

        Commands::Refresh => {
            let session = load_session(&cli.session)?;
            refresh(&auth, &cli.session, &session).await?;
            println!("Token refreshed.");
        }

        Commands::Drive(command) => {
            let mut session = load_session(&cli.session)?;
            if session.is_expired() {
                session = refresh(&auth, &cli.session, &session).await?;
            }

            let client = DriveClient::new(transport, session).with_part_size(config.part_size);
            run(&client, command).await?;
        }
    }

    Ok(())
}

async fn run(client: &DriveClient, command: DriveCommand) -> Result<()> {
    match command {
        DriveCommand::Info => {
            let drive = client.drive_info().await.context("Failed to get drive info")?;
            let space = client.space_info().await.context("Failed to get space info")?;

            println!("User:   {}", drive.nick_name.as_deref().unwrap_or(&drive.user_id));
            println!("Drive:  {}", client.drive_id());
            println!(
                "Space:  {} / {}",
                format_size(space.personal_space_info.used_size),
                format_size(space.personal_space_info.total_size)
            );
        }

        DriveCommand::List { folder } => {
            let files = client
                .list_all(&folder)
                .await
                .with_context(|| format!("Failed to list files in folder: {}", folder))?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<40} {:>10} {:<8} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(80));
                for file in files {
                    println!("{}", file);
                }
            }
        }

        DriveCommand::Upload { patterns, to } => {
            let files_to_upload = expand_patterns(&patterns)?;

            if files_to_upload.is_empty() {
                anyhow::bail!("No files to upload");
            }

            println!("Uploading {} file(s) to {}...", files_to_upload.len(), to);

            for (idx, file_path) in files_to_upload.iter().enumerate() {
                let filename = file_path.file_name().unwrap_or_default().to_string_lossy();
                println!("[{}/{}] Uploading {}... ", idx + 1, files_to_upload.len(), filename);

                match client.upload_file(file_path, &to).await {
                    Ok(metadata) => {
                        println!("OK ({})", metadata.file_id);
                    }
                    Err(e) => {
                        println!("FAILED");
                        eprintln!("  Error: {}", e);
                    }
                }
            }

            println!("Done.");
        }

        DriveCommand::Download { file, to } => {
            if to.is_dir() || to.to_string_lossy().ends_with('/') {
                std::fs::create_dir_all(&to)
                    .with_context(|| format!("Failed to create directory: {:?}", to))?;
            } else if let Some(parent) = to.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory: {:?}", parent))?;
                }
            }

            println!("Downloading {}... ", file);

            let (_, final_path) = client
                .download_file(&file, &to)
                .await
                .with_context(|| format!("Failed to download file: {}", file))?;

            println!("Saved to: {:?}", final_path);
        }

        DriveCommand::Url { file } => {
            let link = client
                .download_url(aliyundrive_open::FileOptions::download_url(&file))
                .await
                .with_context(|| format!("Failed to get download URL: {}", file))?;
            println!("{}", link.url);
            if let Some(expiration) = link.expiration {
                println!("Expires: {}", expiration);
            }
        }

        DriveCommand::Move { file, to } => {
            let task = client
                .move_to(&file, &to)
                .await
                .with_context(|| format!("Failed to move file: {}", file))?;
            println!("Moved {} -> {}", task.file_id, to);
        }

        DriveCommand::Copy { file, to } => {
            let task = client
                .copy_to(&file, &to)
                .await
                .with_context(|| format!("Failed to copy file: {}", file))?;
            println!("Copied to {} ({})", to, task.file_id);
        }

        DriveCommand::Rename { file, name } => {
            let metadata = client
                .rename(&file, &name)
                .await
                .with_context(|| format!("Failed to rename file: {}", file))?;
            println!("Renamed to {}", metadata.name);
        }

        DriveCommand::ReplaceName { file, old, new } => {
            client
                .replace_name(&file, &old, &new)
                .await
                .with_context(|| format!("Failed to replace {:?} in names under {}", old, file))?;
            println!("Done.");
        }

        DriveCommand::Trash { file } => {
            client
                .trash(&file)
                .await
                .with_context(|| format!("Failed to trash file: {}", file))?;
            println!("Moved {} to the recycle bin.", file);
        }

        DriveCommand::Delete { file } => {
            client
                .delete(&file)
                .await
                .with_context(|| format!("Failed to delete file: {}", file))?;
            println!("Deleted {}.", file);
        }

        DriveCommand::Mkdir { name, parent } => {
            let created = client
                .create_folder(&parent, &name)
                .await
                .with_context(|| format!("Failed to create folder: {}", name))?;
            println!("Created {} ({})", created.file_name, created.file_id);
        }
    }

    Ok(())
}

/// Exchange the stored refresh token and persist the new session.
async fn refresh(auth: &AuthClient, path: &Path, session: &Session) -> Result<Session> {
    let session = auth
        .refresh(session)
        .await
        .context("Failed to refresh access token")?;
    save_session(path, &session)?;
    Ok(session)
}

/// Run the QR code flow, polling once per second until the scan is confirmed.
async fn login(auth: &AuthClient) -> Result<Session> {
    let qr = auth
        .qr_code(&AuthorizeOptions::qr_code())
        .await
        .context("Failed to get login QR code")?;

    println!("Open this URL and scan the QR code with the Aliyun Drive app:");
    println!("{}", qr.qr_code_url);

    let mut scanned = false;
    let auth_code = loop {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let status = auth
            .qr_code_status(&qr.sid)
            .await
            .context("Failed to get QR code status")?;

        match status.status {
            QrStatus::WaitLogin => {}
            QrStatus::ScanSuccess => {
                if !scanned {
                    info!("QR code scanned, waiting for confirmation");
                    scanned = true;
                }
            }
            QrStatus::LoginSuccess => match status.auth_code {
                Some(code) if !code.is_empty() => break code,
                _ => anyhow::bail!("Login confirmed but no auth code was returned"),
            },
            QrStatus::Other(other) => {
                warn!(status = %other, "Unrecognized QR code status");
                anyhow::bail!("QR code login ended with status: {}", other);
            }
        }
    };

    auth.authorize(&auth_code)
        .await
        .context("Failed to exchange auth code")
}

fn load_session(path: &Path) -> Result<Session> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!("No session at {:?}; run `adrive login` first", path)
    })?;
    serde_json::from_str(&content).with_context(|| format!("Invalid session file: {:?}", path))
}

fn save_session(path: &Path, session: &Session) -> Result<()> {
    let content = serde_json::to_string_pretty(session)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write session: {:?}", path))
}

/// Expand glob and brace patterns into a sorted, de-duplicated file list.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        for expanded_pattern in expand_braces(pattern) {
            let matches: Vec<PathBuf> = glob(&expanded_pattern)
                .with_context(|| format!("Invalid glob pattern: {}", expanded_pattern))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                // If no glob matches, treat as literal path
                let path = PathBuf::from(&expanded_pattern);
                if path.is_file() {
                    files.push(path);
                } else {
                    eprintln!("Warning: No files matched pattern: {}", expanded_pattern);
                }
            } else {
                files.extend(matches);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand brace patterns like file_{1,2,3}.txt into multiple patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}') {
            let end = start + end;
            let prefix = &pattern[..start];
            let suffix = &pattern[end + 1..];
            let alternatives = &pattern[start + 1..end];

            return alternatives
                .split(',')
                .flat_map(|alt| {
                    let expanded = format!("{}{}{}", prefix, alt.trim(), suffix);
                    expand_braces(&expanded)
                })
                .collect();
        }
    }

    vec![pattern.to_string()]
}
