// src/services/import.rs

//! Question upload: JSON and CSV files, `.docx` explicitly refused.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::assessment::{AssessmentType, Question, validate_questions},
};

/// Parsed upload. Nothing is applied until the caller saves it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedQuestions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Deserialize)]
struct JsonQuestionFile {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    questions: Option<Vec<Question>>,
}

/// Dispatches on the file extension, then applies the same question checks
/// as assessment create/update.
pub fn parse_question_file(filename: &str, content: &str) -> Result<ImportedQuestions, AppError> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let imported = match extension.as_str() {
        "json" => parse_json(content)?,
        "csv" => parse_csv(content)?,
        "docx" => {
            return Err(AppError::BadRequest(
                "Word (.docx) structured content parsing is not supported. Please upload a JSON or CSV file."
                    .to_string(),
            ));
        }
        _ => {
            return Err(AppError::BadRequest(
                "Unsupported file type. Please upload a JSON or CSV file.".to_string(),
            ));
        }
    };

    validate_questions(&imported.questions).map_err(|e| {
        AppError::BadRequest(format!("Invalid question in file: {}", e.code))
    })?;
    Ok(imported)
}

fn parse_json(content: &str) -> Result<ImportedQuestions, AppError> {
    let file: JsonQuestionFile = serde_json::from_str(content)
        .map_err(|e| AppError::BadRequest(format!("Error processing file: {}", e)))?;

    let title = file.title.filter(|t| !t.trim().is_empty());
    let description = file.description.filter(|d| !d.trim().is_empty());

    let (Some(title), Some(description), Some(mut questions)) = (title, description, file.questions)
    else {
        return Err(AppError::BadRequest(
            "Invalid JSON format in file for assessment. Missing title, description, or questions array."
                .to_string(),
        ));
    };

    let batch = batch_suffix();
    for (i, q) in questions.iter_mut().enumerate() {
        if q.id.trim().is_empty() {
            q.id = format!("json-q-{}-{}", i + 1, batch);
        }
    }

    Ok(ImportedQuestions {
        title: Some(title),
        description: Some(description),
        questions,
    })
}

/// Header row, then one question per line. Recognised columns:
/// `QuestionText, Type, Points, TimeLimit, CorrectAnswerIndex, Option1..N`.
/// Values are split on commas with no quoting support.
fn parse_csv(content: &str) -> Result<ImportedQuestions, AppError> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(AppError::BadRequest(
            "CSV file is empty or malformed (requires header and at least one question row)."
                .to_string(),
        ));
    }

    let headers: Vec<&str> = lines[0].split(',').map(str::trim).collect();
    let batch = batch_suffix();
    let mut questions = Vec::new();

    for (row_no, line) in lines.iter().enumerate().skip(1) {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let row: HashMap<&str, &str> = headers
            .iter()
            .zip(values.iter())
            .map(|(h, v)| (*h, *v))
            .collect();

        match question_from_row(&row, format!("csv-q-{}-{}", row_no, batch)) {
            Some(q) => questions.push(q),
            None => tracing::debug!("Skipping CSV row {}: missing or invalid columns", row_no),
        }
    }

    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "No valid questions found in CSV file. Please check format and ensure all required columns are present."
                .to_string(),
        ));
    }

    Ok(ImportedQuestions {
        title: None,
        description: None,
        questions,
    })
}

fn question_from_row(row: &HashMap<&str, &str>, id: String) -> Option<Question> {
    let text = row.get("QuestionText").filter(|t| !t.is_empty())?;

    let options: Vec<String> = (1..)
        .map(|j| row.get(format!("Option{}", j).as_str()).copied())
        .take_while(|v| v.is_some_and(|v| !v.is_empty()))
        .flatten()
        .map(str::to_string)
        .collect();
    if options.is_empty() {
        return None;
    }

    let correct_answer: usize = row.get("CorrectAnswerIndex")?.parse().ok()?;

    let question_type = match row.get("Type").copied().unwrap_or_default() {
        "" => AssessmentType::PointBased,
        other => AssessmentType::parse(other)?,
    };
    if question_type == AssessmentType::PointBased && correct_answer >= options.len() {
        return None;
    }

    let points = row
        .get("Points")
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let time_limit = row
        .get("TimeLimit")
        .and_then(|t| t.parse::<u32>().ok())
        .unwrap_or(0);

    Some(Question {
        id,
        text: text.to_string(),
        question_type,
        options,
        points,
        time_limit,
        correct_answer: Some(correct_answer),
        option_points: None,
    })
}

fn batch_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_reordered_columns() {
        let csv = "QuestionText,Option1,Option2,CorrectAnswerIndex,Points\nWhat is 2+2?,4,5,0,2\n";
        let imported = parse_question_file("quiz.csv", csv).unwrap();

        assert_eq!(imported.questions.len(), 1);
        let q = &imported.questions[0];
        assert_eq!(q.text, "What is 2+2?");
        assert_eq!(q.options, vec!["4", "5"]);
        assert_eq!(q.correct_answer, Some(0));
        assert_eq!(q.points, 2);
        assert_eq!(q.question_type, AssessmentType::PointBased);
        assert!(q.id.starts_with("csv-q-1-"));
    }

    #[test]
    fn csv_full_header_and_defaults() {
        let csv = "QuestionText, Type, Points, TimeLimit, CorrectAnswerIndex, Option1, Option2, Option3\r\n\
                   I enjoy teamwork, likert, , 30, 0, Disagree, Neutral, Agree\r\n\
                   \r\n\
                   Pick B, , abc, , 1, A, B,\r\n";
        let imported = parse_question_file("Upload.CSV", csv).unwrap();
        assert_eq!(imported.questions.len(), 2);

        let likert = &imported.questions[0];
        assert_eq!(likert.question_type, AssessmentType::Likert);
        assert_eq!(likert.time_limit, 30);
        assert_eq!(likert.points, 1);
        assert_eq!(likert.options.len(), 3);

        let pick = &imported.questions[1];
        assert_eq!(pick.question_type, AssessmentType::PointBased);
        assert_eq!(pick.points, 1);
        assert_eq!(pick.options, vec!["A", "B"]);
    }

    #[test]
    fn csv_rows_without_required_columns_are_skipped() {
        let csv = "QuestionText,Option1,CorrectAnswerIndex\n,A,0\nNo options,,0\nNo index,A,\nGood,A,0\n";
        let imported = parse_question_file("q.csv", csv).unwrap();
        assert_eq!(imported.questions.len(), 1);
        assert_eq!(imported.questions[0].text, "Good");
    }

    #[test]
    fn csv_answer_index_outside_options_is_skipped() {
        let csv = "QuestionText,Option1,Option2,CorrectAnswerIndex\nOut of range,A,B,7\nFine,A,B,1\n";
        let imported = parse_question_file("q.csv", csv).unwrap();
        assert_eq!(imported.questions.len(), 1);
        assert_eq!(imported.questions[0].text, "Fine");

        let only_bad = "QuestionText,Option1,Option2,CorrectAnswerIndex\nQ,A,B,7\n";
        assert!(parse_question_file("q.csv", only_bad).is_err());
    }

    #[test]
    fn json_question_without_options_is_rejected() {
        let json = r#"{"title": "T", "description": "D",
            "questions": [{"text": "Nothing to pick", "options": []}]}"#;
        let err = parse_question_file("set.json", json).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("options_cannot_be_empty")));
    }

    #[test]
    fn json_answer_index_outside_options_is_rejected() {
        let json = r#"{"title": "T", "description": "D",
            "questions": [{"text": "Pick", "type": "point_based", "options": ["a"], "correctAnswer": 4}]}"#;
        let err = parse_question_file("set.json", json).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("correct_answer_out_of_range")));
    }

    #[test]
    fn csv_header_only_is_rejected() {
        let err = parse_question_file("q.csv", "QuestionText,Option1\n").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn csv_with_no_valid_rows_is_rejected() {
        let err = parse_question_file("q.csv", "Foo,Bar\n1,2\n").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("No valid questions")));
    }

    #[test]
    fn json_import_fills_missing_ids() {
        let json = r#"{
            "title": "Teamwork",
            "description": "Self check",
            "questions": [
                {"text": "I listen", "options": ["No", "Yes"]},
                {"id": "given", "text": "Pick", "type": "point_based", "options": ["a", "b"],
                 "points": 3, "correctAnswer": 1, "branchLogic": "ignored"}
            ]
        }"#;
        let imported = parse_question_file("set.json", json).unwrap();

        assert_eq!(imported.title.as_deref(), Some("Teamwork"));
        assert_eq!(imported.questions.len(), 2);
        assert!(imported.questions[0].id.starts_with("json-q-1-"));
        assert_eq!(imported.questions[0].question_type, AssessmentType::Likert);
        assert_eq!(imported.questions[1].id, "given");
        assert_eq!(imported.questions[1].correct_answer, Some(1));
    }

    #[test]
    fn json_without_title_is_rejected() {
        let err = parse_question_file("set.json", r#"{"description": "x", "questions": []}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("Missing title")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_question_file("set.json", "{").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.starts_with("Error processing file")));
    }

    #[test]
    fn docx_and_unknown_extensions_are_rejected() {
        let err = parse_question_file("questions.docx", "PK...").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains(".docx")));

        let err = parse_question_file("questions.txt", "hello").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("Unsupported")));
    }
}
