use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use maple::companion::CompanionFormatter;
use maple::core::Sender;
use maple::scheduler::{Driver, Pace};
use maple::{Config, InteractionAction, Session, SessionEvent};

pub use commands::{Args, Commands, ConfigCommands};
use repl::{ReplCommand, HELP};

mod commands;
mod repl;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub instant: bool,
}

impl RunOptions {
    pub fn from_args(args: &Args) -> Self {
        RunOptions {
            data_dir: args.data_dir.clone(),
            seed: args.seed,
            instant: args.instant,
        }
    }

    fn pace(&self) -> Pace {
        if self.instant {
            Pace::Instant
        } else {
            Pace::Realtime
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = Config::new(self.data_dir.clone()).context("Failed to load config.json")?;
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        Ok(config)
    }
}

pub async fn handle_status(opts: &RunOptions) -> Result<()> {
    let config = opts.load_config()?;
    let session = Session::new(&config).context("Failed to start session")?;
    print_status(&session);
    Ok(())
}

pub async fn handle_interact(opts: &RunOptions, action: InteractionAction) -> Result<()> {
    let config = opts.load_config()?;
    let mut session = Session::new(&config).context("Failed to start session")?;
    let mut events = session.subscribe();
    let driver = Driver::new(opts.pace());

    let reaction = session.interact(action);
    println!("{}", CompanionFormatter::format_reaction(session.companion(), &reaction));
    drain_events(&mut events, &session, true);

    while driver.step(&mut session).await.is_some() {
        drain_events(&mut events, &session, true);
    }
    Ok(())
}

pub async fn handle_chat(opts: &RunOptions, message: &str) -> Result<()> {
    let config = opts.load_config()?;
    let mut session = Session::new(&config).context("Failed to start session")?;
    let mut events = session.subscribe();
    let driver = Driver::new(opts.pace());

    if session.send_message(message).is_none() {
        anyhow::bail!("Message is empty");
    }
    drain_events(&mut events, &session, false);

    while driver.step(&mut session).await.is_some() {
        drain_events(&mut events, &session, false);
    }
    Ok(())
}

pub async fn handle_repl(opts: &RunOptions) -> Result<()> {
    let config = opts.load_config()?;
    let mut session = Session::new(&config).context("Failed to start session")?;
    let mut events = session.subscribe();
    let driver = Driver::new(opts.pace());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(welcome) = session.chat().log().last() {
        println!("🍁 {}: {}", session.companion().name, welcome.content);
    }
    println!("(type /help for commands)");

    loop {
        let wait = session.time_until_next();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                driver.catch_up(&mut session);
                drain_events(&mut events, &session, true);

                match ReplCommand::parse(&line) {
                    ReplCommand::Quit => break,
                    command => run_repl_command(&mut session, command),
                }
                drain_events(&mut events, &session, true);
            }
            _ = sleep_or_forever(wait.map(|w| driver.delay(w))) => {
                if let Some(waited) = wait {
                    driver.fire_after(&mut session, waited);
                }
                drain_events(&mut events, &session, true);
            }
        }
    }

    println!("👋 See you soon!");
    Ok(())
}

fn run_repl_command(session: &mut Session, command: ReplCommand) {
    match command {
        ReplCommand::Say(text) => {
            session.send_message(&text);
        }
        ReplCommand::Interact(action) => {
            let reaction = session.interact(action);
            println!("{}", CompanionFormatter::format_reaction(session.companion(), &reaction));
        }
        ReplCommand::Status => print_status(session),
        ReplCommand::Personality(traits) => session.edit_personality(traits),
        ReplCommand::Login { email } => session.login(&email),
        ReplCommand::Signup { email, username } => session.signup(&email, &username),
        ReplCommand::Guest => session.continue_as_guest(),
        ReplCommand::Logout => session.logout(),
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Invalid(reason) => eprintln!("❌ {}", reason),
        ReplCommand::Empty | ReplCommand::Quit => {}
    }
}

async fn sleep_or_forever(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}

pub async fn handle_config(opts: &RunOptions, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { force } => {
            let config = Config::new(opts.data_dir.clone()).context("Failed to load config.json")?;
            let path = config.config_path();
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let written = config.save().context("Failed to write config.json")?;
            println!("✅ Config written to {}", written.display());
        }
        ConfigCommands::Show => {
            let config = opts.load_config()?;
            println!("📁 {}", config.config_path().display());
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?
            );
        }
    }
    Ok(())
}

fn print_status(session: &Session) {
    println!(
        "{}",
        CompanionFormatter::format_status(
            session.companion(),
            session.identity().display_name(),
            session.chat().total_messages(),
        )
    );
}

fn drain_events(events: &mut broadcast::Receiver<SessionEvent>, session: &Session, verbose: bool) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(line) = render_event(&event, &session.companion().name, verbose) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Dropped session events");
            }
            Err(_) => break,
        }
    }
}

/// Terminal rendering of an event. The quiet mode only shows chat traffic.
fn render_event(event: &SessionEvent, name: &str, verbose: bool) -> Option<String> {
    match event {
        SessionEvent::MessageAppended { message } => match message.sender {
            Sender::User if verbose => None,
            Sender::User => Some(format!("🧑 You: {}", message.content)),
            Sender::Companion => Some(format!("🍁 {}: {}", name, message.content)),
        },
        SessionEvent::TypingChanged { typing: true } => Some(format!("   {} is typing...", name)),
        SessionEvent::TypingChanged { typing: false } => None,
        _ if !verbose => None,
        SessionEvent::CueChanged { cue } => Some(format!("   🎬 animation: {}", cue)),
        SessionEvent::Spoke { text, success } => Some(format!(
            "   🔊 {}{}",
            text,
            if *success { "" } else { " (speech failed)" }
        )),
        SessionEvent::IdentityChanged { display_name, authenticated } => Some(format!(
            "   👤 {} ({})",
            display_name,
            if *authenticated { "signed in" } else { "guest" }
        )),
        SessionEvent::CompanionChanged { state } => Some(format!(
            "   {} {} | ⚡ {}",
            state.mood.emoji(),
            state.mood.label(),
            state.energy
        )),
        SessionEvent::SpeakingChanged { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple::core::Message;
    use maple::AnimationCue;

    #[test]
    fn test_quiet_rendering_shows_chat_only() {
        let now = chrono::Utc::now();
        let user = SessionEvent::MessageAppended {
            message: Message::text("hi", Sender::User, now),
        };
        let cue = SessionEvent::CueChanged { cue: AnimationCue::Jump };

        assert_eq!(render_event(&user, "Maple", false), Some("🧑 You: hi".to_string()));
        assert_eq!(render_event(&user, "Maple", true), None);
        assert_eq!(render_event(&cue, "Maple", false), None);
        assert_eq!(
            render_event(&cue, "Maple", true),
            Some("   🎬 animation: jump".to_string())
        );
    }

    #[tokio::test]
    async fn test_instant_chat_round_trip() {
        let config = Config {
            rng_seed: Some(5),
            ..Config::default()
        };
        let mut session = Session::new(&config).unwrap();
        let driver = Driver::new(Pace::Instant);

        session.send_message("how are you");
        driver.settle(&mut session).await;

        let reply = session.chat().log().last().unwrap();
        assert_eq!(reply.sender, Sender::Companion);
        assert!(reply.content.starts_with("I'm feeling energetic"));
    }
}
