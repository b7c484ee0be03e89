use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use govdigest_ai::GeminiClient;
use govdigest_app::{IngestService, VoteService};
use govdigest_core::config::{self, Config};
use govdigest_core::policy::VoteChoice;
use govdigest_core::view::{self, SortOrder, ViewState};
use govdigest_store::{AuthClient, AuthError, DocumentStore, FirestoreStore};
use govdigest_sync::FederalRegisterClient;

mod display;

#[derive(Parser)]
#[command(name = "govdigest", version, about = "Government policy digests with community votes")]
struct Cli {
    #[arg(long, env = "GOVDIGEST_POLICY_API_URL", default_value = config::DEFAULT_POLICY_API_URL)]
    policy_api_url: String,

    /// Documents fetched per ingestion cycle, newest first.
    #[arg(long, env = "GOVDIGEST_PAGE_SIZE", default_value_t = config::DEFAULT_PAGE_SIZE)]
    page_size: u32,

    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    gemini_api_key: String,

    #[arg(long, env = "GOVDIGEST_GEMINI_MODEL", default_value = config::DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    #[arg(long, env = "GOVDIGEST_SUMMARIZE_TIMEOUT_SECS", default_value_t = config::DEFAULT_SUMMARIZE_TIMEOUT_SECS)]
    summarize_timeout_secs: u64,

    #[arg(long, env = "FIREBASE_API_KEY", default_value = "", hide_env_values = true)]
    firebase_api_key: String,

    #[arg(long, env = "FIREBASE_PROJECT_ID", default_value = "")]
    firebase_project_id: String,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            policy_api_url: self.policy_api_url.clone(),
            page_size: self.page_size,
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_model: self.gemini_model.clone(),
            summarize_timeout_secs: self.summarize_timeout_secs,
            firebase_api_key: self.firebase_api_key.clone(),
            firebase_project_id: self.firebase_project_id.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the newest policies, summarize them, and store the new ones
    Ingest,
    /// Browse stored policies
    List {
        /// Substring search over title, abstract, and summary
        #[arg(long)]
        search: Option<String>,
        /// Exact type label: Rule, Notice, Proposed Rule, ...
        #[arg(long = "type")]
        doc_type: Option<String>,
        /// Oldest first instead of newest first
        #[arg(long)]
        oldest: bool,
        /// Expand the card for this document number
        #[arg(long)]
        expand: Option<String>,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GOVDIGEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GOVDIGEST_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Upvote or downvote a document
    Vote {
        document_number: String,
        choice: ChoiceArg,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GOVDIGEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChoiceArg {
    Up,
    Down,
}

impl From<ChoiceArg> for VoteChoice {
    fn from(arg: ChoiceArg) -> Self {
        match arg {
            ChoiceArg::Up => VoteChoice::Upvote,
            ChoiceArg::Down => VoteChoice::Downvote,
        }
    }
}

fn surface_auth(err: AuthError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("govdigest v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();
    let cfg = cli.config();

    match cli.command {
        Command::Ingest => {
            let store = Arc::new(FirestoreStore::new(&cfg.firebase_project_id));
            let source = FederalRegisterClient::new(cfg.policy_api_url, cfg.page_size);
            let summarizer = GeminiClient::new(
                cfg.gemini_api_key,
                cfg.gemini_model,
                Duration::from_secs(cfg.summarize_timeout_secs),
            );
            let report = IngestService::new(store, source, summarizer)
                .ingest_latest()
                .await?;
            println!(
                "fetched {}, inserted {}, skipped {}, fallbacks {}",
                report.fetched, report.inserted, report.skipped, report.fallbacks
            );
        }

        Command::List {
            search,
            doc_type,
            oldest,
            expand,
        } => {
            let store = FirestoreStore::new(&cfg.firebase_project_id);
            let policies = store.list_policies().await?;
            let state = ViewState {
                query: search.unwrap_or_default(),
                type_filter: doc_type,
                sort: if oldest {
                    SortOrder::Oldest
                } else {
                    SortOrder::Newest
                },
                expanded: expand,
                ..ViewState::default()
            };
            let shown = view::visible(&state, &policies);
            if shown.is_empty() {
                println!("no matching policies");
            }
            for policy in shown {
                let expanded = state.expanded.as_deref() == Some(policy.document_number.as_str());
                display::print_policy_card(policy, expanded);
            }
        }

        Command::Login { email, password } => {
            let auth = AuthClient::new(cfg.firebase_api_key.clone());
            let session = auth.sign_in(&email, &password).await.map_err(surface_auth)?;
            println!("signed in as {} ({})", session.email, session.uid);
        }

        Command::Signup {
            email,
            password,
            confirm_password,
        } => {
            let auth = AuthClient::new(cfg.firebase_api_key.clone());
            let session = auth
                .sign_up(&email, &password, &confirm_password)
                .await
                .map_err(surface_auth)?;
            println!("account created for {} ({})", session.email, session.uid);
        }

        Command::Vote {
            document_number,
            choice,
            email,
            password,
        } => {
            let auth = AuthClient::new(cfg.firebase_api_key.clone());
            let session = auth.sign_in(&email, &password).await.map_err(surface_auth)?;
            let store = Arc::new(
                FirestoreStore::new(&cfg.firebase_project_id).with_token(session.id_token.clone()),
            );
            let service = VoteService::new(store);
            let receipt = service
                .apply_vote(Some(&session), &document_number, choice.into())
                .await?;
            let standing = match receipt.choice {
                Some(c) => c.as_str(),
                None => "retracted",
            };
            println!(
                "{document_number}: {standing}  (▲ {}  ▼ {})",
                receipt.counts.upvotes, receipt.counts.downvotes
            );
        }
    }

    Ok(())
}
