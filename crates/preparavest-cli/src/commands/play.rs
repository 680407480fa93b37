//! The `preparavest play` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use preparavest_backends::{create_backend, load_config_from};
use preparavest_core::model::OptionLabel;
use preparavest_core::profile::load_profile;
use preparavest_core::quiz::Quiz;
use preparavest_core::report::AttemptReport;
use preparavest_core::scoring::ScoringMode;
use preparavest_core::session::{SessionStatus, SessionView, Step};

use super::ranking::ranking_table;

pub async fn execute(
    config_path: Option<PathBuf>,
    bank: Option<PathBuf>,
    scoring: Option<ScoringMode>,
    save_report: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if bank.is_some() {
        config.question_bank = bank;
    }
    if let Some(mode) = scoring {
        config.scoring_mode = mode;
    }

    let profile_path = config.profile_path();
    let user = load_profile(&profile_path)?.with_context(|| {
        format!(
            "no profile at {}; run `preparavest profile set` first",
            profile_path.display()
        )
    })?;

    let backend = create_backend(&config)?;
    tracing::debug!(
        user = user.id,
        questions = backend.questions.name(),
        scoring = %config.scoring_mode,
        "starting quiz"
    );
    let mut options = config.quiz_options();
    options.seed = seed;
    let mut quiz = Quiz::new(
        backend.questions,
        backend.scoring,
        backend.ranking,
        user,
        options,
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut terminal = Terminal::new(stdin.lock(), stdout.lock());
    terminal.open(&mut quiz).await?;
    terminal.run(&mut quiz).await?;

    if let Some(path) = save_report {
        let report = quiz.session().and_then(|s| {
            AttemptReport::from_session(s, quiz.user().id, quiz.scoring_mode())
        });
        match report {
            Some(report) => {
                report.save_json(&path)?;
                eprintln!("Report written to {}", path.display());
            }
            None => eprintln!("Session not finished, no report written."),
        }
    }

    Ok(())
}

/// A user intent typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Select(OptionLabel),
    Next,
    Previous,
    Restart,
    Ranking,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim().to_lowercase();
    match word.as_str() {
        "n" | "next" | "" => Some(Command::Next),
        "p" | "prev" | "previous" => Some(Command::Previous),
        "r" | "restart" => Some(Command::Restart),
        "k" | "ranking" => Some(Command::Ranking),
        "?" | "h" | "help" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        other => other.parse().ok().map(Command::Select),
    }
}

const HELP: &str = "a-e select  n next  p previous  r restart  k ranking  q quit";

/// Line-oriented presenter. Reads intents from `input` and renders the
/// session view to `output` after each one.
struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Start the first session. A failure is shown and the prompt still
    /// opens, so the user can retry with `r`.
    async fn open(&mut self, quiz: &mut Quiz) -> Result<()> {
        if let Err(e) = quiz.start().await {
            tracing::warn!("could not start a session: {e}");
            writeln!(self.output, "! {e}")?;
        }
        Ok(())
    }

    async fn run(&mut self, quiz: &mut Quiz) -> Result<()> {
        writeln!(self.output, "Good luck, {}! ({HELP})", quiz.user().name)?;
        self.render(quiz)?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            let Some(command) = parse_command(&line) else {
                writeln!(self.output, "Unknown command. {HELP}")?;
                continue;
            };

            match command {
                Command::Quit => break,
                Command::Help => writeln!(self.output, "{HELP}")?,
                Command::Ranking => self.render_ranking(quiz)?,
                Command::Select(label) => match quiz.select(label) {
                    Ok(()) => self.render(quiz)?,
                    Err(e) => writeln!(self.output, "! {e}")?,
                },
                Command::Previous => match quiz.previous() {
                    Ok(_) => self.render(quiz)?,
                    Err(e) => writeln!(self.output, "! {e}")?,
                },
                Command::Next => match quiz.next().await {
                    Ok(Step::Moved { .. }) => self.render(quiz)?,
                    Ok(Step::Finished(_)) => {
                        self.render(quiz)?;
                        self.render_ranking(quiz)?;
                    }
                    Err(e) => writeln!(self.output, "! {e}")?,
                },
                Command::Restart => match quiz.restart().await {
                    Ok(_) => self.render(quiz)?,
                    Err(e) => writeln!(self.output, "! could not restart: {e}")?,
                },
            }
        }

        Ok(())
    }

    fn render(&mut self, quiz: &Quiz) -> Result<()> {
        let Some(view) = quiz.view() else {
            writeln!(self.output, "No active session. Press r to start one.")?;
            return Ok(());
        };

        match view.status {
            SessionStatus::InProgress => self.render_question(&view),
            SessionStatus::Finished => self.render_result(&view),
        }
    }

    fn render_question(&mut self, view: &SessionView) -> Result<()> {
        let q = &view.question;
        writeln!(self.output)?;
        writeln!(self.output, "Question {}/{}", view.index + 1, view.total)?;
        writeln!(self.output, "{}", q.prompt())?;
        if let Some(image) = q.image() {
            writeln!(self.output, "(image: {image})")?;
        }
        for (label, text) in q.options() {
            let marker = if view.selected == Some(label) { '*' } else { ' ' };
            writeln!(self.output, " {marker}{label}) {text}")?;
        }
        if view.is_last {
            writeln!(self.output, "(last question: n to finish)")?;
        }
        Ok(())
    }

    fn render_result(&mut self, view: &SessionView) -> Result<()> {
        writeln!(self.output)?;
        match view.score {
            Some(score) => writeln!(
                self.output,
                "Finished: {}/{} correct ({:.0}%), grade {:.1}",
                score.correct,
                score.total,
                score.percentage(),
                score.grade()
            )?,
            None => writeln!(self.output, "Finished: scoring...")?,
        }
        if let Some(err) = &view.score_error {
            writeln!(self.output, "! {err}")?;
        }
        writeln!(self.output, "Press r to play again or q to quit.")?;
        Ok(())
    }

    fn render_ranking(&mut self, quiz: &Quiz) -> Result<()> {
        if let Some(err) = quiz.ranking_error() {
            writeln!(self.output, "! ranking unavailable: {err}")?;
        }
        let top = quiz.ranking();
        if top.is_empty() {
            writeln!(self.output, "No scores yet.")?;
        } else {
            writeln!(self.output, "{}", ranking_table(&top))?;
        }
        Ok(())
    }
}
