use maple::core::PersonalityTraits;
use maple::InteractionAction;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Say(String),
    Interact(InteractionAction),
    Status,
    Personality(PersonalityTraits),
    Login { email: String },
    Signup { email: String, username: String },
    Guest,
    Logout,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
Type a message to chat, or a command:
  /play /feed /chat /rest        interact with the companion
  /status                        show the status card
  /personality F H U E           set friendliness, helpfulness, humor, empathy (0-1)
  /login EMAIL                   log in (simulated)
  /signup EMAIL USERNAME         sign up (simulated)
  /guest  /logout                switch identity
  /help  /quit";

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Say(line.to_string());
        };

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let rest: Vec<&str> = parts.collect();

        match (name.as_str(), rest.as_slice()) {
            ("play" | "feed" | "chat" | "rest", []) => match name.parse() {
                Ok(action) => ReplCommand::Interact(action),
                Err(e) => ReplCommand::Invalid(e),
            },
            ("status", []) => ReplCommand::Status,
            ("personality", [f, h, u, e]) => {
                let values: Result<Vec<f32>, _> = [f, h, u, e].iter().map(|v| v.parse::<f32>()).collect();
                match values.as_deref() {
                    Ok([f, h, u, e]) => ReplCommand::Personality(PersonalityTraits::new(*f, *h, *u, *e)),
                    _ => ReplCommand::Invalid("personality values must be numbers".to_string()),
                }
            }
            ("login", [email]) => ReplCommand::Login { email: email.to_string() },
            ("signup", [email, username]) => ReplCommand::Signup {
                email: email.to_string(),
                username: username.to_string(),
            },
            ("guest", []) => ReplCommand::Guest,
            ("logout", []) => ReplCommand::Logout,
            ("help", []) => ReplCommand::Help,
            ("quit" | "exit", []) => ReplCommand::Quit,
            _ => ReplCommand::Invalid(format!("unknown command '/{}', try /help", command)),
        }
    }
}
