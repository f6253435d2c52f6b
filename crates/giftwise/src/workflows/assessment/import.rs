use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::Answer;

/// Errors raised while reading an answer sheet.
#[derive(Debug, thiserror::Error)]
pub enum AnswerImportError {
    #[error("failed to open answer sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse answer sheet: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    #[serde(alias = "questionId", alias = "Question")]
    question_id: String,
    #[serde(alias = "giftKey", alias = "Gift")]
    gift_key: String,
    #[serde(alias = "Value")]
    value: i64,
}

/// Parse a `question_id,gift_key,value` sheet. Values are kept as written so the
/// scorer can report and clamp out-of-range entries.
pub fn parse_answers<R: Read>(reader: R) -> Result<Vec<Answer>, AnswerImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut answers = Vec::new();
    for row in csv_reader.deserialize::<AnswerRow>() {
        let row = row?;
        answers.push(Answer::new(row.question_id, row.gift_key, row.value));
    }

    Ok(answers)
}

pub fn load_answers(path: &Path) -> Result<Vec<Answer>, AnswerImportError> {
    let file = File::open(path)?;
    parse_answers(file)
}
