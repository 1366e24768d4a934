// Terminal front-end for the ballot session.

use crate::auth::BiometricService;
use crate::config::BiometricMode;
use crate::models::{CandidateId, CategoryGroup};
use crate::session::{BallotSession, Confirmation, Presenter, SessionState};
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

// Stdin is shared between the command loop and the biometric prompt.
pub type InputLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> InputLines {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

async fn next_line(input: &InputLines) -> Option<String> {
    input.lock().await.next_line().await.ok().flatten()
}

pub struct ConsolePresenter {
    window: Duration,
}

impl ConsolePresenter {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

#[async_trait]
impl Presenter for ConsolePresenter {
    fn notice(&self, message: &str) {
        println!("! {}", message);
    }

    async fn confirm(&self, confirmation: &Confirmation) {
        match confirmation {
            Confirmation::VoteRecorded { position } => println!("✓ Vote for {} recorded", position),
            Confirmation::BallotSubmitted { votes } => {
                println!("✓ Ballot submitted ({} votes). Thank you for voting!", votes)
            }
        }
        tokio::time::sleep(self.window).await;
    }
}

// Stands in for the device sensor: the voter confirms at the keyboard.
pub struct ConsoleBiometric {
    mode: BiometricMode,
    input: InputLines,
}

impl ConsoleBiometric {
    pub fn new(mode: BiometricMode, input: InputLines) -> Self {
        Self { mode, input }
    }
}

#[async_trait]
impl BiometricService for ConsoleBiometric {
    async fn has_hardware(&self) -> bool {
        self.mode != BiometricMode::Absent
    }

    async fn is_enrolled(&self) -> bool {
        self.mode == BiometricMode::Enrolled
    }

    async fn authenticate(&self, prompt: &str) -> bool {
        println!("[biometric] {} (Enter to confirm, 'cancel' to abort)", prompt);
        match next_line(&self.input).await {
            Some(line) => is_confirmation(&line),
            None => false,
        }
    }
}

fn is_confirmation(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Pick(usize),
    Select(String),
    Vote,
    Submit,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next();

    match (name.as_str(), arg) {
        ("pick", Some(n)) => match n.parse::<usize>() {
            Ok(n) => Command::Pick(n),
            Err(_) => Command::Unknown(line.trim().to_string()),
        },
        ("select", Some(id)) => Command::Select(id.to_string()),
        ("vote", None) => Command::Vote,
        ("submit", None) => Command::Submit,
        ("help", _) | ("", None) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    }
}

// `pick` counts from 1 in display order; `select` matches the candidate id text
fn resolve_choice(category: &CategoryGroup, command: &Command) -> Option<CandidateId> {
    match command {
        Command::Pick(n) if *n >= 1 => category.candidates.get(n - 1).map(|c| c.id.clone()),
        Command::Select(id) => category
            .candidates
            .iter()
            .find(|c| c.id.to_string() == *id)
            .map(|c| c.id.clone()),
        _ => None,
    }
}

fn render(session: &BallotSession) {
    match session.state() {
        SessionState::Ready(i) => {
            let category = &session.categories()[*i];
            let selected = session.selections().get(&category.position);
            println!();
            println!("== {} ({}/{}) ==", category.position, session.cursor() + 1, session.categories().len());
            for (n, candidate) in category.candidates.iter().enumerate() {
                let mark = if Some(&candidate.id) == selected { "x" } else { " " };
                let dept = if candidate.dept.is_empty() {
                    String::new()
                } else {
                    format!(" - {}", candidate.dept)
                };
                println!("[{}] {}. {}{} (id {})", mark, n + 1, candidate.name, dept, candidate.id);
                if let Some(image) = &candidate.image {
                    println!("      photo: {}", image);
                }
            }
            println!("pick <n> | select <id> | vote | quit");
        }
        SessionState::Reviewing => {
            println!();
            println!("== Review your ballot ==");
            for line in session.review() {
                let name = line.candidate_name.unwrap_or_else(|| "Unknown Candidate".to_string());
                println!("{}: {} (id {})", line.position, name, line.candidate_id);
            }
            println!("submit | quit");
        }
        _ => {}
    }
}

fn is_finished(state: &SessionState) -> bool {
    matches!(state, SessionState::Closed | SessionState::NoData | SessionState::Error(_))
}

// Drives a loaded session from stdin until it closes or input ends.
pub async fn run(session: &mut BallotSession, input: InputLines) {
    while !is_finished(session.state()) {
        render(session);

        let Some(line) = next_line(&input).await else {
            info!("Input closed, abandoning ballot");
            let _ = session.abandon();
            break;
        };

        let command = parse_command(&line);
        // Failures are already shown to the voter by the presenter
        let result = match &command {
            Command::Pick(_) | Command::Select(_) => {
                let choice = session
                    .current_category()
                    .and_then(|category| resolve_choice(category, &command));
                match choice {
                    Some(id) => session.select(id),
                    None => {
                        println!("! No such candidate in this category.");
                        Ok(())
                    }
                }
            }
            Command::Vote => session.cast_vote().await,
            Command::Submit => session.submit_ballot().await,
            Command::Quit => session.abandon(),
            Command::Help => {
                println!("Commands: pick <n>, select <id>, vote, submit, quit");
                Ok(())
            }
            Command::Unknown(text) => {
                println!("! Unknown command: {}", text);
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!("Command {:?} failed: {}", command, e);
        }
    }
}
