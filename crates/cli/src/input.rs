//! Command-line input parsing: `key=value` pairs, JSON files and prompts

use anyhow::{anyhow, bail, Context, Result};
use moodcheck_ai_core::schema::{FeatureRecord, FeatureValue};
use moodcheck_screening::{Responses, QUESTIONS};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

/// Split `key=value`; the value may itself contain `=`
pub fn parse_pair(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{}'", raw);
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn responses_from_pairs(pairs: &[String]) -> Result<Responses> {
    let parsed = pairs
        .iter()
        .map(|p| parse_pair(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(Responses::from_pairs(parsed)?)
}

/// Read a JSON object of `{"mood": "Good", ...}`
pub fn responses_from_file(path: &Path) -> Result<Responses> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse responses in {}", path.display()))
}

/// Feature record from `name=value` pairs; values are typed like CSV cells
pub fn record_from_pairs(pairs: &[String]) -> Result<FeatureRecord> {
    let mut record = FeatureRecord::new();
    for pair in pairs {
        let (name, value) = parse_pair(pair)?;
        record.insert(name, FeatureValue::parse(&value));
    }
    Ok(record)
}

/// Feature record from a flat JSON object
pub fn record_from_json(value: &Value) -> Result<FeatureRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("feature record must be a JSON object"))?;

    let mut record = FeatureRecord::new();
    for (name, field) in object {
        let value = match field {
            Value::Null => FeatureValue::Missing,
            Value::Number(n) => n
                .as_f64()
                .map(FeatureValue::Number)
                .ok_or_else(|| anyhow!("field '{}' is out of range", name))?,
            Value::String(s) => FeatureValue::parse(s),
            Value::Bool(b) => FeatureValue::Text(b.to_string()),
            _ => bail!("field '{}' must be a number, string or null", name),
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}

/// One record per object; a top-level array yields several
pub fn records_from_file(path: &Path) -> Result<Vec<FeatureRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    match &value {
        Value::Array(items) => items.iter().map(record_from_json).collect(),
        _ => Ok(vec![record_from_json(&value)?]),
    }
}

/// Ask every catalogue question on `output`, reading answers from `input`
///
/// Answers are an option number or the option text. A blank line skips the
/// question; end of input stops asking.
pub fn prompt_questionnaire<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Responses> {
    let mut responses = Responses::new();
    let mut category = None;

    'questions: for question in QUESTIONS {
        if category != Some(question.category) {
            category = Some(question.category);
            writeln!(output, "\n── {} ──", question.category.title())?;
        }
        if question.sensitive {
            writeln!(
                output,
                "The next question is sensitive. If you are in crisis, call or text 988."
            )?;
        }
        writeln!(output, "{}", question.prompt)?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(output, "  {}) {}", i + 1, option)?;
        }

        loop {
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break 'questions;
            }
            let answer = line.trim();
            if answer.is_empty() {
                break;
            }

            let chosen = match answer.parse::<usize>() {
                Ok(n) if (1..=question.options.len()).contains(&n) => Some(question.options[n - 1]),
                _ => question
                    .options
                    .iter()
                    .copied()
                    .find(|o| o.eq_ignore_ascii_case(answer)),
            };
            match chosen {
                Some(option) => {
                    responses.insert(question.dimension, option);
                    break;
                }
                None => writeln!(output, "Please pick 1-{} or leave blank to skip.", question.options.len())?,
            }
        }
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_screening::Dimension;
    use std::io::Cursor;

    #[test]
    fn pairs() {
        assert_eq!(
            parse_pair("mood = Very good").unwrap(),
            ("mood".to_string(), "Very good".to_string())
        );
        assert_eq!(parse_pair("a=b=c").unwrap().1, "b=c");
        assert!(parse_pair("mood").is_err());
        assert!(parse_pair("=Good").is_err());
    }

    #[test]
    fn records_are_typed() {
        let record =
            record_from_pairs(&["Age=31".into(), "Mood=Good".into(), "Sleep=NA".into()]).unwrap();
        assert_eq!(record["Age"], FeatureValue::Number(31.0));
        assert_eq!(record["Mood"], FeatureValue::Text("Good".into()));
        assert_eq!(record["Sleep"], FeatureValue::Missing);

        let json = serde_json::json!({"Age": 31, "Mood": "Good", "Sleep": null});
        assert_eq!(record_from_json(&json).unwrap(), record);
        assert!(record_from_json(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn unknown_answer_key_is_rejected() {
        assert!(responses_from_pairs(&["happiness=Good".into()]).is_err());
        let responses = responses_from_pairs(&["Mood=Good".into()]).unwrap();
        assert_eq!(responses.get(Dimension::Mood), Some("Good"));
    }

    #[test]
    fn answer_file_keys_are_case_insensitive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Mood": "Poor", "SUICIDAL": "Never"}}"#).unwrap();
        let from_file = responses_from_file(file.path()).unwrap();
        let from_flags =
            responses_from_pairs(&["Mood=Poor".into(), "SUICIDAL=Never".into()]).unwrap();
        assert_eq!(from_file, from_flags);
    }

    #[test]
    fn prompts_accept_numbers_text_and_skips() {
        // mood: 4 (Poor); interest: retry then text; anxiety: skipped; then EOF
        let mut input = Cursor::new("4\n9\nlittle interest\n\n");
        let mut output = Vec::new();
        let responses = prompt_questionnaire(&mut input, &mut output).unwrap();

        assert_eq!(responses.get(Dimension::Mood), Some("Poor"));
        assert_eq!(responses.get(Dimension::Interest), Some("Little interest"));
        assert_eq!(responses.get(Dimension::Anxiety), None);
        assert_eq!(responses.len(), 2);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Core Symptoms"));
        assert!(shown.contains("Please pick 1-5"));
    }
}
