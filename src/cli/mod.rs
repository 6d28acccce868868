//! CLI module for the MediAI command-line client.
//!
//! Every command builds the application context, runs the session bootstrap
//! and then asks the view router whether the requested screen is reachable:
//! - `status` - Show backend health and who is signed in
//! - `login` / `register` / `logout` / `whoami` - Manage the session
//! - `chat` - Talk to the assistant, one message or interactively
//! - `conversations list|show` - Browse past conversations
//! - `catalog` - Show the reference lists used by the checkers
//! - `symptoms` / `drugs` / `labs` - Run one of the guided checkers

mod prompt;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::validation::validate_conversation_id;
use crate::api::{chat as chat_api, drugs, health, labs, symptoms as symptoms_api, Gender};
use crate::chat::ChatScreen;
use crate::config::Config;
use crate::gateway::GatewayError;
use crate::router::Screen;
use crate::session::RegistrationForm;
use crate::wizard::{DrugChecker, LabInterpreter, SymptomChecker, WizardError};
use crate::AppContext;
use prompt::prompt_secret;

const NOT_LOGGED_IN: &str = "Not logged in. Run 'mediai login' first.";
const SESSION_EXPIRED: &str = "Your session has expired. Run 'mediai login' again.";

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "mediai")]
#[command(author, version, about = "Command-line client for the MediAI health assistant", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mediai.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL (overrides [api].base_url)
    #[arg(long, env = "MEDIAI_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show backend health and the signed-in user
    Status,

    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        full_name: Option<String>,
        /// Prompted for (twice) when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored credential
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Chat with the assistant
    Chat {
        /// Send one message and exit. Without it, start an interactive session.
        message: Option<String>,
        /// Continue a previous conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Conversation history
    #[command(subcommand)]
    Conversations(ConversationsCommands),

    /// Show a reference catalog
    Catalog {
        #[arg(value_enum)]
        kind: CatalogKind,
    },

    /// Analyze symptoms
    Symptoms {
        /// NAME[:SEVERITY[:DAYS]], repeatable
        #[arg(short, long = "symptom", value_parser = parse_symptom)]
        symptoms: Vec<SymptomSpec>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<Gender>,
    },

    /// Check interactions between medications
    Drugs {
        /// NAME[:DOSAGE[:FREQUENCY]], repeatable
        #[arg(short, long = "med", value_parser = parse_medication)]
        meds: Vec<MedicationSpec>,
        /// Skip food interactions
        #[arg(long)]
        no_food: bool,
        /// Skip alcohol interactions
        #[arg(long)]
        no_alcohol: bool,
    },

    /// Interpret lab results
    Labs {
        /// NAME=VALUE[:UNIT], repeatable. The unit defaults from the lab catalog.
        #[arg(short, long = "lab", value_parser = parse_lab)]
        labs: Vec<LabSpec>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<Gender>,
    },
}

/// Conversations subcommands
#[derive(Subcommand, Debug)]
pub enum ConversationsCommands {
    /// List past conversations
    List,
    /// Show the messages of one conversation
    Show {
        /// Conversation ID
        id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Symptoms,
    Medications,
    LabTests,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomSpec {
    pub name: String,
    pub severity: Option<u8>,
    pub duration_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicationSpec {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabSpec {
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
}

// ============================================================================
// Argument Parsers
// ============================================================================

fn parse_symptom(raw: &str) -> Result<SymptomSpec, String> {
    let mut parts = raw.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err("symptom name is required".to_string());
    }

    let severity = parts
        .next()
        .map(|s| {
            s.trim()
                .parse::<u8>()
                .map_err(|_| format!("invalid severity '{}'", s))
        })
        .transpose()?;
    let duration_days = parts
        .next()
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid duration '{}'", s))
        })
        .transpose()?;
    if parts.next().is_some() {
        return Err("expected NAME[:SEVERITY[:DAYS]]".to_string());
    }

    Ok(SymptomSpec {
        name: name.to_string(),
        severity,
        duration_days,
    })
}

fn parse_medication(raw: &str) -> Result<MedicationSpec, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err("medication name is required".to_string());
    }
    Ok(MedicationSpec {
        name: name.to_string(),
        dosage: parts.next().unwrap_or_default().trim().to_string(),
        frequency: parts.next().unwrap_or_default().trim().to_string(),
    })
}

fn parse_lab(raw: &str) -> Result<LabSpec, String> {
    let (name, rest) = raw
        .split_once('=')
        .ok_or_else(|| "expected NAME=VALUE[:UNIT]".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("lab test name is required".to_string());
    }

    let (value, unit) = match rest.split_once(':') {
        Some((value, unit)) => (value, Some(unit.trim().to_string())),
        None => (rest, None),
    };
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("a value is required for '{}'", name));
    }

    Ok(LabSpec {
        name: name.to_string(),
        value: value.to_string(),
        unit,
    })
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: Config) -> Result<()> {
    let mut ctx = AppContext::start(config)
        .await
        .context("Failed to initialize client")?;

    match &cli.command {
        Commands::Status => cmd_status(&ctx).await,
        Commands::Login { email, password } => cmd_login(&mut ctx, email, password.as_deref()).await,
        Commands::Register {
            email,
            username,
            full_name,
            password,
        } => {
            let form = RegistrationForm {
                email: email.clone(),
                username: username.clone(),
                full_name: full_name.clone().unwrap_or_default(),
                ..Default::default()
            };
            cmd_register(&mut ctx, form, password.as_deref()).await
        }
        Commands::Logout => cmd_logout(&mut ctx),
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::Chat {
            message,
            conversation,
        } => cmd_chat(&mut ctx, message.as_deref(), conversation.as_deref()).await,
        Commands::Conversations(ConversationsCommands::List) => cmd_conversations_list(&mut ctx).await,
        Commands::Conversations(ConversationsCommands::Show { id }) => {
            cmd_conversations_show(&mut ctx, id).await
        }
        Commands::Catalog { kind } => cmd_catalog(&ctx, *kind).await,
        Commands::Symptoms {
            symptoms,
            age,
            gender,
        } => cmd_symptoms(&mut ctx, symptoms, *age, *gender).await,
        Commands::Drugs {
            meds,
            no_food,
            no_alcohol,
        } => cmd_drugs(&mut ctx, meds, !*no_food, !*no_alcohol).await,
        Commands::Labs { labs, age, gender } => cmd_labs(&mut ctx, labs, *age, *gender).await,
    }
}

/// Display backend status
async fn cmd_status(ctx: &AppContext) -> Result<()> {
    println!("Connecting to {}...", ctx.gateway.base_url());

    let status = health::check(&ctx.gateway)
        .await
        .context("Failed to reach the MediAI backend. Is it running?")?;

    render::status(&status, ctx.gateway.base_url(), ctx.session.profile());
    Ok(())
}

async fn cmd_login(ctx: &mut AppContext, email: &str, password: Option<&str>) -> Result<()> {
    ctx.router.show_login();
    let password = match password {
        Some(password) => password.to_string(),
        None => prompt_secret("Password: ")?,
    };

    let user = ctx
        .session
        .login(email, &password)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    println!("{} Logged in as {}", "[OK]".green(), user.display_name().bold());
    Ok(())
}

async fn cmd_register(
    ctx: &mut AppContext,
    mut form: RegistrationForm,
    password: Option<&str>,
) -> Result<()> {
    ctx.router.show_register();
    match password {
        Some(password) => {
            form.password = password.to_string();
            form.confirm_password = password.to_string();
        }
        None => {
            form.password = prompt_secret("Password: ")?;
            form.confirm_password = prompt_secret("Confirm password: ")?;
        }
    }

    let user = ctx
        .session
        .register_form(&form)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    println!(
        "{} Account created. Logged in as {}",
        "[OK]".green(),
        user.display_name().bold()
    );
    Ok(())
}

fn cmd_logout(ctx: &mut AppContext) -> Result<()> {
    ctx.session.logout();
    println!("Logged out.");
    Ok(())
}

fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    match ctx.session.profile() {
        Some(user) => {
            render::profile(user);
            Ok(())
        }
        None => bail!(NOT_LOGGED_IN),
    }
}

async fn cmd_chat(
    ctx: &mut AppContext,
    message: Option<&str>,
    conversation: Option<&str>,
) -> Result<()> {
    open_screen(ctx, Screen::Chat)?;

    let screen = match conversation {
        Some(id) => ChatScreen::resume(ctx.gateway.clone(), id)
            .await
            .context("Failed to open conversation")?,
        None => ChatScreen::new(ctx.gateway.clone()),
    };

    if let Some(message) = message {
        let reply = screen.send_message(message).await?;
        render::chat_message(&reply);
        if reply.role == crate::chat::Role::Error {
            bail!("Chat request failed");
        }
        return Ok(());
    }

    for earlier in screen.messages() {
        render::chat_message(&earlier);
    }
    render::quick_questions(screen.quick_questions());
    println!("{}", "Type a message, /q N for a quick question, or /quit to leave.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        let text = match line {
            "" => continue,
            "/quit" | "/exit" => break,
            _ => match line.strip_prefix("/q ") {
                Some(index) => match quick_question(screen.quick_questions(), index) {
                    Some(question) => question,
                    None => {
                        println!("{}", "Unknown quick question.".yellow());
                        continue;
                    }
                },
                None => line,
            },
        };

        let reply = screen.send_message(text).await?;
        println!();
        render::chat_message(&reply);
    }

    Ok(())
}

fn quick_question<'a>(questions: &[&'a str], index: &str) -> Option<&'a str> {
    let index: usize = index.trim().parse().ok()?;
    questions.get(index.checked_sub(1)?).copied()
}

async fn cmd_conversations_list(ctx: &mut AppContext) -> Result<()> {
    open_screen(ctx, Screen::Chat)?;

    let conversations = chat_api::list_conversations(&ctx.gateway)
        .await
        .map_err(|e| request_failed(e, "Failed to load conversations"))?;

    render::conversations(&conversations);
    Ok(())
}

async fn cmd_conversations_show(ctx: &mut AppContext, id: &str) -> Result<()> {
    open_screen(ctx, Screen::Chat)?;
    validate_conversation_id(id).map_err(|e| anyhow!(e))?;

    let history = chat_api::conversation(&ctx.gateway, id)
        .await
        .map_err(|e| request_failed(e, "Failed to load conversation"))?;

    let title = if history.conversation.title.is_empty() {
        history.conversation.id.as_str()
    } else {
        history.conversation.title.as_str()
    };
    println!();
    println!("{}", title.bold());
    println!();
    for message in &history.messages {
        let role = if message.role.eq_ignore_ascii_case("user") {
            "You".bold()
        } else {
            "MediAI".green().bold()
        };
        println!(
            "{} {}",
            role,
            render::format_timestamp(&message.created_at).dimmed()
        );
        println!("{}", message.content);
        println!();
    }
    Ok(())
}

/// Reference catalogs are public; no session is required.
async fn cmd_catalog(ctx: &AppContext, kind: CatalogKind) -> Result<()> {
    let gateway = &ctx.gateway;
    match kind {
        CatalogKind::Symptoms => {
            let catalog = symptoms_api::common_symptoms(gateway)
                .await
                .context("Failed to load catalog")?;
            render::catalog("Common Symptoms", &catalog, String::clone);
        }
        CatalogKind::Medications => {
            let catalog = drugs::common_medications(gateway)
                .await
                .context("Failed to load catalog")?;
            render::catalog("Common Medications", &catalog, String::clone);
        }
        CatalogKind::LabTests => {
            let catalog = labs::common_lab_tests(gateway)
                .await
                .context("Failed to load catalog")?;
            render::catalog("Common Lab Tests", &catalog, render::lab_template);
        }
    }
    Ok(())
}

async fn cmd_symptoms(
    ctx: &mut AppContext,
    symptoms: &[SymptomSpec],
    age: Option<u32>,
    gender: Option<Gender>,
) -> Result<()> {
    open_screen(ctx, Screen::SymptomChecker)?;
    let wizard = SymptomChecker::mount(ctx.gateway.clone()).await;

    for spec in symptoms {
        if !wizard.add_symptom(&spec.name)? {
            println!("{} '{}' listed twice, using the first", "[!]".yellow(), spec.name);
            continue;
        }
        if let Some(severity) = spec.severity {
            wizard.set_severity(&spec.name, severity)?;
        }
        if let Some(days) = spec.duration_days {
            wizard.set_duration(&spec.name, days)?;
        }
    }
    wizard.set_age(age)?;
    wizard.set_gender(gender)?;
    wizard.next()?;

    println!("Analyzing {} symptom(s)...", symptoms.len());
    let result = wizard.analyze().await.map_err(wizard_failed)?;
    render::symptom_result(&result);
    Ok(())
}

async fn cmd_drugs(
    ctx: &mut AppContext,
    meds: &[MedicationSpec],
    include_food: bool,
    include_alcohol: bool,
) -> Result<()> {
    open_screen(ctx, Screen::DrugChecker)?;
    let wizard = DrugChecker::mount(ctx.gateway.clone()).await;

    for spec in meds {
        if !wizard.add_medication(&spec.name)? {
            println!("{} '{}' listed twice, using the first", "[!]".yellow(), spec.name);
            continue;
        }
        wizard.set_dosage(&spec.name, &spec.dosage)?;
        wizard.set_frequency(&spec.name, &spec.frequency)?;
    }
    wizard.set_include_food(include_food)?;
    wizard.set_include_alcohol(include_alcohol)?;

    let result = wizard.check().await.map_err(wizard_failed)?;
    render::interaction_result(&result);
    Ok(())
}

async fn cmd_labs(
    ctx: &mut AppContext,
    labs: &[LabSpec],
    age: Option<u32>,
    gender: Option<Gender>,
) -> Result<()> {
    open_screen(ctx, Screen::LabInterpreter)?;
    let wizard = LabInterpreter::mount(ctx.gateway.clone()).await;

    for spec in labs {
        let unit = match &spec.unit {
            Some(unit) => unit.clone(),
            None => wizard.unit_for(&spec.name).unwrap_or_default().to_string(),
        };
        if !wizard.add_test(&spec.name, &unit)? {
            println!("{} '{}' listed twice, using the first", "[!]".yellow(), spec.name);
            continue;
        }
        let index = wizard.rows().len() - 1;
        wizard.set_value(index, &spec.value)?;
    }
    wizard.set_age(age)?;
    wizard.set_gender(gender)?;

    let result = wizard.interpret().await.map_err(wizard_failed)?;
    render::lab_result(&result);
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Select a protected screen, failing if the session cannot show it.
fn open_screen(ctx: &mut AppContext, screen: Screen) -> Result<()> {
    ctx.router.open(screen);
    let view = ctx.view();
    tracing::debug!(screen = screen.title(), ?view, "Routing");
    if !view.is_protected() {
        bail!(NOT_LOGGED_IN);
    }
    Ok(())
}

fn request_failed(e: GatewayError, what: &'static str) -> anyhow::Error {
    if e.is_unauthorized() {
        anyhow!(SESSION_EXPIRED)
    } else {
        anyhow::Error::new(e).context(what)
    }
}

fn wizard_failed(e: WizardError) -> anyhow::Error {
    match e {
        WizardError::Request { source, .. } if source.is_unauthorized() => anyhow!(SESSION_EXPIRED),
        other => other.into(),
    }
}
