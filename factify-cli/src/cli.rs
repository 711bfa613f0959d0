use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use factify_appcore::AnalysisService;
use factify_core::social::NewPost;
use factify_core::types::{AnalysisKind, AnalysisRequest};
use factify_runtime::config_store::ConfigStore;
use factify_runtime::identity::ENV_TOKEN;
use factify_runtime::paths::default_config_path;

use crate::{render, upload};

#[derive(Parser)]
#[command(name = "factify")]
#[command(about = "Check text and images for AI generation, manipulation and sources")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "FACTIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Ai,
    Manipulation,
    Sources,
}

impl From<KindArg> for AnalysisKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Ai => AnalysisKind::AiDetection,
            KindArg::Manipulation => AnalysisKind::Manipulation,
            KindArg::Sources => AnalysisKind::FindSources,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Submit text or a document and wait for the result
    Analyze {
        #[arg(value_enum)]
        kind: KindArg,
        /// Text to analyse
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Document to upload instead of text
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether an image is AI-generated
    Image {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user's profile
    Profile,

    /// List the signed-in user's past analyses stored by the service
    Predictions {
        #[arg(long)]
        json: bool,
    },

    /// Show the community feed, newest first
    Feed {
        #[arg(long)]
        json: bool,
    },

    /// Share, edit or delete a feed post
    Post {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Like a post, or remove your like
    Like { post_id: String },

    /// Read or write comments on a post
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Show or clear the local analysis history
    History {
        #[arg(long)]
        clear: bool,
    },

    /// Store an access token in the OS keyring
    Login {
        #[arg(long, env = "FACTIFY_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Remove the stored access token
    Logout,

    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Share text, one of your analyses, or both
    Share {
        #[arg(long, required_unless_present = "analysis")]
        text: Option<String>,
        /// Analysis id from `factify post analyses`
        #[arg(long)]
        analysis: Option<String>,
    },
    /// Replace the text of your post
    Edit { post_id: String, text: String },
    /// Delete your post and its comments
    Delete { post_id: String },
    /// List your recent analyses that can be attached to a post
    Analyses {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    List {
        post_id: String,
        #[arg(long)]
        json: bool,
    },
    Add { post_id: String, text: String },
    Edit { comment_id: String, text: String },
    Delete { comment_id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set one value, e.g. `config set base_url https://factify.example/api`
    Set { key: String, value: String },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(p) => p,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Analyze {
            kind,
            text,
            file,
            json,
        } => {
            let request = match (text, file) {
                (Some(t), _) => AnalysisRequest::text(t),
                (None, Some(path)) => AnalysisRequest::File(upload::load(&path)?),
                (None, None) => anyhow::bail!("pass --text or --file"),
            };
            cmd_analyze(&config_path, kind.into(), request, json).await
        }
        Commands::Image { file, json } => cmd_image(&config_path, &file, json).await,
        Commands::Profile => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let profile = svc.profile().await.map_err(sign_in_hint)?;
            print!("{}", render::profile(&profile));
            Ok(())
        }
        Commands::Predictions { json } => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let items = svc.predictions().await.map_err(sign_in_hint)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print!("{}", render::predictions(&items));
            }
            Ok(())
        }
        Commands::Feed { json } => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let posts = svc.social().feed().await.map_err(sign_in_hint)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                let viewer = svc.session().user_id;
                print!("{}", render::feed(&posts, viewer.as_deref()));
            }
            Ok(())
        }
        Commands::Post { command } => cmd_post(&config_path, command).await,
        Commands::Like { post_id } => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let liked = svc
                .social()
                .toggle_like(&post_id)
                .await
                .map_err(sign_in_hint)?;
            eprintln!("{}", if liked { "Liked." } else { "Like removed." });
            Ok(())
        }
        Commands::Comment { command } => cmd_comment(&config_path, command).await,
        Commands::History { clear } => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            if clear {
                svc.clear_history()?;
                eprintln!("History cleared.");
            } else {
                print!("{}", render::history(&svc.history()?));
            }
            Ok(())
        }
        Commands::Login { token } => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let claims = svc.sign_in(&token)?;
            let who = claims.preferred_username.unwrap_or(claims.sub);
            eprintln!("Signed in as {who}.");
            Ok(())
        }
        Commands::Logout => {
            let svc = AnalysisService::open_with_keyring(config_path)?;
            let env_still_set = svc.sign_out()?;
            eprintln!("Signed out.");
            if let Some(note) = logout_notice(env_still_set) {
                eprintln!("{note}");
            }
            Ok(())
        }
        Commands::Config { command } => {
            let store = ConfigStore::at_path(config_path);
            match command {
                ConfigCommands::Show => {
                    let cfg = store.load_effective()?;
                    println!("# {}", store.path().display());
                    println!("{}", serde_json::to_string_pretty(&cfg)?);
                }
                ConfigCommands::Set { key, value } => {
                    store
                        .set(&key, &value)
                        .with_context(|| format!("failed to set {key}"))?;
                    eprintln!("Updated {key}.");
                }
            }
            Ok(())
        }
    }
}

async fn cmd_analyze(
    config_path: &Path,
    kind: AnalysisKind,
    request: AnalysisRequest,
    json: bool,
) -> anyhow::Result<()> {
    let svc = AnalysisService::open_with_keyring(config_path.to_path_buf())?;

    let outcome = svc
        .analyze_with_hook(kind, request, |stage| async move {
            if !json {
                eprintln!("{stage}...");
            }
        })
        .await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&render::outcome_json(&outcome))?
        );
    }

    match &outcome.result {
        Ok(payload) => {
            if !json {
                print!("{}", render::payload(payload));
            }
            Ok(())
        }
        Err(_) if outcome.needs_sign_in() => {
            anyhow::bail!("Please sign in to run this analysis (factify login --token <TOKEN>).")
        }
        Err(_) => anyhow::bail!(
            "{}",
            outcome
                .error_message()
                .unwrap_or_else(|| "analysis failed".to_string())
        ),
    }
}

async fn cmd_image(config_path: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let svc = AnalysisService::open_with_keyring(config_path.to_path_buf())?;
    let image = upload::load(file)?;
    let detection = svc.detect_image(&image).await.map_err(sign_in_hint)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
    } else {
        print!("{}", render::image(&detection));
    }
    Ok(())
}

async fn cmd_post(config_path: &Path, command: PostCommands) -> anyhow::Result<()> {
    let svc = AnalysisService::open_with_keyring(config_path.to_path_buf())?;
    let social = svc.social();
    match command {
        PostCommands::Share { text, analysis } => {
            let post = NewPost::new(text, analysis)?;
            let id = social.share(&post).await.map_err(sign_in_hint)?;
            println!("{id}");
            eprintln!("Posted.");
        }
        PostCommands::Edit { post_id, text } => {
            social.edit_post(&post_id, &text).await.map_err(sign_in_hint)?;
            eprintln!("Post updated.");
        }
        PostCommands::Delete { post_id } => {
            social.delete_post(&post_id).await.map_err(sign_in_hint)?;
            eprintln!("Post deleted.");
        }
        PostCommands::Analyses { json } => {
            let items = social.my_analyses().await.map_err(sign_in_hint)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print!("{}", render::analysis_summaries(&items));
            }
        }
    }
    Ok(())
}

async fn cmd_comment(config_path: &Path, command: CommentCommands) -> anyhow::Result<()> {
    let svc = AnalysisService::open_with_keyring(config_path.to_path_buf())?;
    let social = svc.social();
    match command {
        CommentCommands::List { post_id, json } => {
            let comments = social.comments(&post_id).await.map_err(sign_in_hint)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&comments)?);
            } else {
                print!("{}", render::comments(&comments));
            }
        }
        CommentCommands::Add { post_id, text } => {
            social.add_comment(&post_id, &text).await.map_err(sign_in_hint)?;
            eprintln!("Comment added.");
        }
        CommentCommands::Edit { comment_id, text } => {
            social
                .edit_comment(&comment_id, &text)
                .await
                .map_err(sign_in_hint)?;
            eprintln!("Comment updated.");
        }
        CommentCommands::Delete { comment_id } => {
            social.delete_comment(&comment_id).await.map_err(sign_in_hint)?;
            eprintln!("Comment deleted.");
        }
    }
    Ok(())
}

/// The environment token outranks the stored one, so logging out does not end
/// a session that comes from `FACTIFY_TOKEN`.
fn logout_notice(env_token_set: bool) -> Option<String> {
    env_token_set.then(|| {
        format!("{ENV_TOKEN} is still set and keeps you signed in; unset it to sign out fully.")
    })
}

fn sign_in_hint(e: factify_core::error::AnalysisError) -> anyhow::Error {
    if e.needs_sign_in() {
        anyhow::anyhow!("{e}. Sign in with `factify login --token <TOKEN>`.")
    } else {
        anyhow::Error::new(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_needs_exactly_one_input() {
        assert!(Cli::try_parse_from(["factify", "analyze", "ai"]).is_err());
        assert!(
            Cli::try_parse_from(["factify", "analyze", "ai", "--text", "x", "--file", "a.pdf"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["factify", "analyze", "sources", "--file", "a.pdf"]).is_ok());
    }

    #[test]
    fn social_commands_parse() {
        assert!(Cli::try_parse_from(["factify", "post", "share"]).is_err());
        assert!(Cli::try_parse_from(["factify", "post", "share", "--analysis", "a1"]).is_ok());
        assert!(Cli::try_parse_from(["factify", "comment", "add", "p1", "Source?"]).is_ok());
        assert!(Cli::try_parse_from(["factify", "comment", "edit", "c1"]).is_err());
        assert!(Cli::try_parse_from(["factify", "like", "p1"]).is_ok());
        assert!(Cli::try_parse_from(["factify", "feed", "--json"]).is_ok());
    }

    #[test]
    fn logout_warns_while_env_token_is_set() {
        assert_eq!(logout_notice(false), None);
        let note = logout_notice(true).unwrap();
        assert!(note.starts_with("FACTIFY_TOKEN is still set"));
    }

    #[test]
    fn kind_names_map_to_endpoints() {
        assert_eq!(AnalysisKind::from(KindArg::Ai).endpoint(), "ai");
        assert_eq!(AnalysisKind::from(KindArg::Sources).endpoint(), "find_sources");
    }
}
