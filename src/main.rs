use clap::{Parser, Subcommand};
use folio::auth::{has_session, require_user};
use folio::collections::{self, CollectionDraft};
use folio::config::{self, ConfigError, FolioConfig};
use folio::error::FolioError;
use folio::gateway::{AuthApi, GatewayError, ObjectStore, RestGateway};
use folio::images::{self, UploadFile};
use folio::imaging::RustBackend;
use folio::types::CollectionUpdate;
use folio::{naming, output};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Manage portfolio collections and images")]
#[command(long_about = "\
Manage portfolio collections and images

Collections are titled groups of images owned by the signed-in user. Each
collection gets a URL slug derived from its title plus a random suffix.
Uploaded images are downscaled (longest edge 1600px by default), stored in
the backend's object store, and recorded against their collection.

Connection settings come from folio.toml, overridden by FOLIO_URL,
FOLIO_ANON_KEY, FOLIO_ACCESS_TOKEN and FOLIO_BUCKET.

Run 'folio gen-config' to generate a documented folio.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    /// Print a JSON envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr: -v info, -vv debug (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a collection owned by the signed-in user
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Hide the collection from public listings
        #[arg(long)]
        private: bool,
    },
    /// List collections, newest first
    List {
        /// Owner to list (defaults to the signed-in user)
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a collection and its images
    Show {
        slug: String,
        /// Also find private collections
        #[arg(long)]
        include_private: bool,
    },
    /// Change a collection's title, description or visibility
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
    },
    /// Delete a collection with all its images
    Delete { id: String },
    /// Downscale and upload images into a collection
    Upload {
        collection_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a single image
    DeleteImage { id: String },
    /// Print the public URL of a stored image
    Url { file_path: String },
    /// Print the slug a title would get (suffix is random)
    Slug { title: String },
    /// Report whether a session is active
    Session,
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Backend client error: {0}")]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Folio(#[from] FolioError),
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct SessionReport {
    signed_in: bool,
    user: Option<folio::types::User>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.json {
                let envelope = match &err {
                    CliError::Folio(e) => output::json_failure(e),
                    other => serde_json::json!({ "success": false, "error": other.to_string() }),
                };
                println!("{envelope}");
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "folio=warn",
        1 => "folio=info",
        _ => "folio=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print `data` as a JSON envelope, or its text lines.
fn emit<T: Serialize>(json: bool, data: &T, lines: impl FnOnce() -> Vec<String>) {
    if json {
        println!("{}", output::json_success(data));
    } else {
        output::print_lines(&lines());
    }
}

fn connect(config: &FolioConfig) -> Result<RestGateway, CliError> {
    config.require_backend()?;
    Ok(RestGateway::new(&config.backend)?)
}

fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    UploadFile::from_path(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    // Offline commands first: they need neither config nor backend.
    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Slug { title } => {
            let slug = naming::slugify(title);
            emit(cli.json, &slug, || vec![slug.clone()]);
            return Ok(());
        }
        _ => {}
    }

    let config = config::load_config(&cli.config)?;
    let gateway = connect(&config)?;

    match &cli.command {
        Command::Create {
            title,
            description,
            private,
        } => {
            let draft = CollectionDraft::new(title.as_str())
                .description(description.as_str())
                .public(!private);
            let created = collections::create_collection(&gateway, &draft).await?;
            emit(cli.json, &created, || output::format_collection(&created));
        }
        Command::List { user } => {
            let user_id = match user {
                Some(id) => id.clone(),
                None => require_user(&gateway).await?.id,
            };
            let list = collections::list_collections(&gateway, &user_id).await?;
            emit(cli.json, &list, || output::format_collection_list(&list));
        }
        Command::Show {
            slug,
            include_private,
        } => {
            let detail =
                collections::get_collection_by_slug(&gateway, slug, *include_private).await?;
            emit(cli.json, &detail, || {
                output::format_collection_detail(&detail, |key| gateway.public_url(key))
            });
        }
        Command::Update {
            id,
            title,
            description,
            public,
            private,
        } => {
            let is_public = match (*public, *private) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = CollectionUpdate {
                title: title.clone(),
                description: description.clone(),
                is_public,
            };
            let updated = collections::update_collection(&gateway, id, update).await?;
            emit(cli.json, &updated, || output::format_collection(&updated));
        }
        Command::Delete { id } => {
            let deletion = collections::delete_collection(&gateway, id).await?;
            emit(cli.json, &deletion, || output::format_deletion(id, &deletion));
        }
        Command::Upload {
            collection_id,
            files,
        } => {
            let backend = RustBackend::new();
            let mut uploaded = Vec::with_capacity(files.len());
            for path in files {
                let file = read_upload(path)?;
                let image =
                    images::upload_image(&gateway, &backend, &file, collection_id, &config.upload)
                        .await?;
                if !cli.json {
                    let url = gateway.public_url(&image.file_path);
                    output::print_lines(&output::format_upload(&image, &url));
                }
                uploaded.push(image);
            }
            if cli.json {
                println!("{}", output::json_success(&uploaded));
            }
        }
        Command::DeleteImage { id } => {
            images::delete_image(&gateway, id).await?;
            emit(cli.json, id, || vec![format!("Deleted image {id}")]);
        }
        Command::Url { file_path } => {
            let url = images::image_url(&gateway, file_path)?;
            emit(cli.json, &url, || vec![url.clone()]);
        }
        Command::Session => {
            let signed_in = has_session(&gateway).await?;
            let user = if signed_in {
                gateway
                    .current_user()
                    .await
                    .map_err(|source| FolioError::Store {
                        context: "fetching current user",
                        source,
                    })?
            } else {
                None
            };
            let report = SessionReport { signed_in, user };
            emit(cli.json, &report, || match &report.user {
                Some(u) => vec![format!(
                    "Signed in as {}",
                    u.email.as_deref().unwrap_or(&u.id)
                )],
                None if report.signed_in => vec!["Signed in".to_string()],
                None => vec!["Not signed in".to_string()],
            });
        }
        Command::GenConfig | Command::Slug { .. } => {}
    }

    Ok(())
}
