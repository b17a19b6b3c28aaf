//! Line-oriented interactive session over [`Session`]

use anyhow::{anyhow, bail, Result};
use moodcheck_ai_trainer::{DataSource, Session};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::input::record_from_pairs;
use crate::render;

const HELP: &str = "\
Commands:
  load <path|url>            load a CSV dataset (drops the current model)
  summary                    describe the loaded dataset
  train [test_size] [seed]   train and evaluate a Random Forest
  predict name=value ...     predict one record
  save [path]                save the trained model
  open [path]                load a saved model
  model                      describe the current model
  reset                      forget dataset and model
  help                       show this help
  quit                       leave the session";

enum Flow {
    Continue,
    Quit,
}

/// Run commands from `input` until `quit` or end of input
///
/// A failing command prints its error and the session carries on.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "moodcheck session. Type 'help' for commands.")?;

    loop {
        write!(output, "moodcheck> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match execute(session, line, output) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => writeln!(output, "error: {:#}", e)?,
        }
    }
    Ok(())
}

fn execute<W: Write>(session: &mut Session, line: &str, output: &mut W) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match command {
        "help" | "?" => writeln!(output, "{}", HELP)?,
        "quit" | "exit" => return Ok(Flow::Quit),
        "load" => {
            let target = args
                .first()
                .ok_or_else(|| anyhow!("usage: load <path|url>"))?;
            let dataset = session.load(DataSource::parse(target))?;
            writeln!(
                output,
                "Loaded {} rows x {} columns",
                dataset.n_rows(),
                dataset.n_columns()
            )?;
        }
        "summary" => {
            let summary = session.summary()?;
            write!(
                output,
                "{}",
                render::summary(&summary, &session.config().target_column)
            )?;
        }
        "train" => {
            let test_size = args
                .first()
                .map(|s| s.parse::<f64>())
                .transpose()
                .map_err(|_| anyhow!("test_size must be a number"))?;
            let seed = args
                .get(1)
                .map(|s| s.parse::<u64>())
                .transpose()
                .map_err(|_| anyhow!("seed must be a non-negative integer"))?;
            let artifact = session.train(test_size, seed)?;
            write!(output, "{}", render::training(artifact))?;
        }
        "predict" => {
            if args.is_empty() {
                bail!("usage: predict name=value ...");
            }
            // Re-join so values with spaces survive: Mood=Very good
            let record = record_from_pairs(&split_fields(&args))?;
            let prediction = session.predict(&record)?;
            write!(output, "{}", render::prediction(&prediction))?;
        }
        "save" => {
            let path = session.save_model(args.first().map(Path::new))?;
            writeln!(output, "Saved model to {}", path.display())?;
        }
        "open" => {
            let artifact = session.load_model(args.first().map(Path::new))?;
            write!(output, "{}", render::artifact(artifact))?;
        }
        "model" => {
            let artifact = session
                .artifact()
                .ok_or_else(|| anyhow!("no model trained or loaded"))?;
            write!(output, "{}", render::artifact(artifact))?;
        }
        "reset" => {
            session.reset();
            writeln!(output, "Session cleared")?;
        }
        other => bail!("unknown command '{}'; type 'help'", other),
    }
    Ok(Flow::Continue)
}

/// Group words into `name=value` fields; words without `=` extend the
/// previous value
fn split_fields(words: &[&str]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for word in words {
        match fields.last_mut() {
            Some(last) if !word.contains('=') => {
                last.push(' ');
                last.push_str(word);
            }
            _ => fields.push(word.to_string()),
        }
    }
    fields
}
