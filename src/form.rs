use crate::database::ScoredPassage;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::rag::ChatModel;
use crate::session::{Session, Transcript};
use log::{error, info};
use std::io::{BufRead, Write};

pub const TITLE: &str = "Welcome to the Thailand Relocation Assistant!";
pub const INTRO: &str = "I'm here to help you navigate your move to Thailand. \
Ask me anything about visas, housing, healthcare, and more.";
pub const PROMPT: &str = "Ask me anything about Thailand: ";

const HOW_IT_WORKS: &[&str] = &[
    "Loads the .txt files of the documents directory",
    "Splits them into overlapping passages",
    "Embeds every passage with the hosted embedding model",
    "Keeps the vectors in an in-memory index",
    "Answers with the chat model from the closest passages",
];

/// Print the welcome banner and the short description of the pipeline
pub fn render_banner<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", INTRO)?;
    writeln!(out)?;
    writeln!(out, "How this works:")?;
    for step in HOW_IT_WORKS {
        writeln!(out, "  - {}", step)?;
    }
    writeln!(out, "Commands: :sources, :history, exit")?;
    Ok(())
}

pub fn render_transcript<W: Write>(out: &mut W, transcript: &Transcript) -> Result<()> {
    for turn in transcript.history() {
        writeln!(out, "{}", turn)?;
    }
    Ok(())
}

/// The expanded sources panel: file name, then the passage text
pub fn render_sources<W: Write>(out: &mut W, sources: &[ScoredPassage]) -> Result<()> {
    if sources.is_empty() {
        writeln!(out, "No sources for the last answer.")?;
        return Ok(());
    }
    for scored in sources {
        writeln!(out, "**{}**", scored.passage.source_id)?;
        writeln!(out, "{}", scored.passage.text)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Read questions line by line until `exit`, `quit` or end of input
pub async fn run_form<E, L, R, W>(session: &Session<E, L>, mut input: R, mut out: W) -> Result<()>
where
    E: Embedder,
    L: ChatModel,
    R: BufRead,
    W: Write,
{
    render_banner(&mut out)?;
    let mut buffer = String::new();

    loop {
        write!(out, "\n{}", PROMPT)?;
        out.flush()?;

        buffer.clear();
        if input.read_line(&mut buffer)? == 0 {
            break;
        }

        let question = buffer.trim();
        match question {
            "" => continue,
            ":sources" => {
                render_sources(&mut out, &session.last_sources())?;
                continue;
            }
            ":history" => {
                render_transcript(&mut out, session.transcript())?;
                continue;
            }
            _ => {}
        }

        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            info!("Goodbye!");
            break;
        }

        writeln!(out, "Thinking...")?;
        match session.ask(question).await {
            Ok(result) => {
                render_transcript(&mut out, session.transcript())?;
                if !result.sources.is_empty() {
                    writeln!(
                        out,
                        "Sources ({}) - type :sources to expand",
                        result.sources.len()
                    )?;
                }
            }
            Err(err) => {
                error!("Failed to answer question: {}", err);
                writeln!(out, "Error: {}", err)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
