//! Word-compatible PDP report.
//!
//! The document is HTML carrying the Office namespaces, prefixed with a UTF-8
//! byte order mark and saved with a `.doc` extension, which word processors
//! open as `application/msword`.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::models::{AnswerKind, DigitalDimension, Session, SoftSkill, SurveyData, SwotQuadrant, SURVEY_QUESTIONS};
use crate::insights::humanize;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const BOM: &str = "\u{feff}";

const STYLE: &str = "\
body { font-family: 'Arial', sans-serif; line-height: 1.5; color: #333; }
h1 { color: #003359; font-size: 24pt; border-bottom: 2px solid #4ABfac; padding-bottom: 10px; }
h2 { color: #003359; font-size: 18pt; margin-top: 20px; background-color: #EAF2F5; padding: 5px; }
h3 { color: #4ABfac; font-size: 14pt; margin-top: 15px; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }";

/// `Hospitour_PDP_{name}.doc`, whitespace runs in the name collapsed to `_`.
pub fn file_name(name: &str) -> String {
    let name = WHITESPACE.replace_all(name, "_");
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!("Hospitour_PDP_{}.doc", safe)
}

pub fn write_report(dir: &Path, session: &Session, survey: &SurveyData) -> Result<PathBuf> {
    let html = render(session, survey, &chrono::Local::now().format("%d/%m/%Y").to_string())?;

    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name(&session.profile.name));
    std::fs::write(&path, format!("{}{}", BOM, html))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    tracing::info!(path = %path.display(), "Report written");
    Ok(path)
}

pub fn render(session: &Session, survey: &SurveyData, date: &str) -> Result<String> {
    let pdp = session
        .pdp_result
        .as_ref()
        .ok_or_else(|| anyhow!("No development plan to export. Generate a plan first."))?;
    let profile = &session.profile;

    let mut out = String::new();
    out.push_str(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\n",
    );
    let _ = writeln!(out, "<head>\n<meta charset=\"utf-8\">\n<title>PDP Report</title>\n<style>\n{}\n</style>\n</head>", STYLE);
    out.push_str("<body>\n<h1>Personal Development Plan</h1>\n");
    let _ = writeln!(out, "<p><strong>Generated for:</strong> {}</p>", escape(&profile.name));
    let _ = writeln!(out, "<p><strong>Date:</strong> {}</p>", escape(date));

    out.push_str("<h2>1. Professional Profile</h2>\n");
    for (label, value) in [
        ("Career Goal", &profile.career_goal),
        ("Motivation", &profile.career_reason),
        ("MBTI Type", &profile.mbti),
        ("Leadership Style", &profile.leadership_style),
    ] {
        let _ = writeln!(out, "<p><strong>{}:</strong> {}</p>", label, escape(value));
    }

    out.push_str("<h2>2. Digital Capability Audit (JISC)</h2>\n<ul>\n");
    for dim in DigitalDimension::ALL {
        let _ = writeln!(out, "<li>{}: {}</li>", dim.label(), session.digital_audit.get(dim));
    }
    out.push_str("</ul>\n");

    out.push_str("<h2>3. Soft Skills Audit (1-5 Scale)</h2>\n<ul>\n");
    for skill in SoftSkill::ALL {
        let _ = writeln!(out, "<li>{}: {}</li>", humanize(skill.field_name()), session.soft_skills.get(skill));
    }
    out.push_str("</ul>\n");
    if !session.soft_skills.custom.is_empty() {
        out.push_str("<h3>Recommended Specialized Skills</h3>\n<ul>\n");
        for s in &session.soft_skills.custom {
            let _ = writeln!(
                out,
                "<li><strong>{}</strong> ({}): {}/5 <br/><em>Why: {}</em></li>",
                escape(&s.label),
                s.category.map(|c| c.as_str()).unwrap_or("Skill"),
                s.score,
                escape(&s.desc)
            );
        }
        out.push_str("</ul>\n");
    }

    out.push_str("<h2>4. SWOT Analysis</h2>\n");
    for quadrant in SwotQuadrant::ALL {
        let scope = match quadrant {
            SwotQuadrant::Strengths | SwotQuadrant::Weaknesses => "Internal",
            SwotQuadrant::Opportunities | SwotQuadrant::Threats => "External",
        };
        let _ = writeln!(out, "<h3>{} ({})</h3>", quadrant.label(), scope);
        let _ = writeln!(out, "<p>{}</p>", multiline(session.swot.get(quadrant)));
    }

    out.push_str("<h2>5. SMART Action Plan</h2>\n");
    if !pdp.introduction.trim().is_empty() {
        let _ = writeln!(out, "<p>{}</p>", multiline(&pdp.introduction));
    }
    for goal in &pdp.goals {
        out.push_str("<div style=\"border: 1px solid #ccc; padding: 10px; margin-bottom: 15px;\">\n");
        let _ = writeln!(out, "<h3>{} ({})</h3>", escape(&goal.skill), goal.goal_type.as_str());
        let status = if goal.is_completed() { "Complete" } else { "Pending" };
        let _ = writeln!(out, "<p><strong>Status:</strong> {}</p>", status);
        for (label, value) in [
            ("Activity", &goal.activity),
            ("Rationale", &goal.rationale),
            ("Resources", &goal.resources),
            ("Success Criteria", &goal.success_criteria),
            ("Target Date", &goal.target_date),
        ] {
            let _ = writeln!(out, "<p><strong>{}:</strong> {}</p>", label, escape(value));
        }
        if let Some(feedback) = &goal.feedback {
            let _ = writeln!(
                out,
                "<p style=\"font-style:italic; color:#666;\">AI Coach Feedback: {} (Score: {})</p>",
                escape(&feedback.critique),
                feedback.score
            );
        }
        out.push_str("</div>\n");
    }

    out.push_str("<h2>6. Feedback Survey Responses</h2>\n<table>\n<tr><th>Question</th><th>Response</th></tr>\n");
    for (i, question) in SURVEY_QUESTIONS.iter().enumerate() {
        let answer = survey.answer(i);
        let answer = match question.kind {
            AnswerKind::Rating => format!("{}/5", answer),
            AnswerKind::YesNo | AnswerKind::Text => escape(&answer),
        };
        let _ = writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", question.label, answer);
    }
    out.push_str("</table>\n</body>\n</html>\n");

    Ok(out)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn multiline(text: &str) -> String {
    if text.is_empty() {
        return "<em>Not provided</em>".to_string();
    }
    escape(text).replace('\n', "<br/>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalFeedback, PdpResult, SmartGoal};

    fn finished_session() -> Session {
        let mut session = Session::default();
        session.profile.name = "Ana  María Silva".to_string();
        session.profile.career_reason = "Guests & teams".to_string();
        session.swot.strengths = "- Friendly\n- Calm".to_string();
        let mut goal = SmartGoal::placeholder("a1b2c3d".to_string());
        goal.skill = "Digital Identity".to_string();
        goal.completed = Some(true);
        goal.feedback = Some(GoalFeedback {
            score: 85,
            is_smart: true,
            critique: "Clear <and> measurable".to_string(),
            suggestions: String::new(),
        });
        session.pdp_result = Some(PdpResult {
            introduction: "Your plan".to_string(),
            goals: vec![goal, SmartGoal::placeholder("e4f5g6h".to_string())],
        });
        session
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Ana  María Silva"), "Hospitour_PDP_Ana_María_Silva.doc");
        assert_eq!(file_name("a/b"), "Hospitour_PDP_a_b.doc");
        assert_eq!(file_name(""), "Hospitour_PDP_.doc");
    }

    #[test]
    fn test_render_sections() {
        let mut survey = SurveyData::default();
        survey.q4_useful_skills = 5;
        survey.q13_feedback = "Loved it".to_string();
        let html = render(&finished_session(), &survey, "17/10/2026").unwrap();

        assert!(html.starts_with("<html xmlns:o='urn:schemas-microsoft-com:office:office'"));
        assert!(html.contains("<p><strong>Date:</strong> 17/10/2026</p>"));
        assert!(html.contains("<p><strong>Motivation:</strong> Guests &amp; teams</p>"));
        assert!(html.contains("<li>Digital Identity: Developing</li>"));
        assert!(html.contains("<li>Decision Making: 3</li>"));
        assert!(html.contains("<p>- Friendly<br/>- Calm</p>"));
        assert!(html.contains("<h3>Threats (External)</h3>\n<p><em>Not provided</em></p>"));
        assert!(html.contains("<p><strong>Status:</strong> Complete</p>"));
        assert!(html.contains("<p><strong>Status:</strong> Pending</p>"));
        assert!(html.contains("AI Coach Feedback: Clear &lt;and&gt; measurable (Score: 85)"));
        assert!(html.contains("<tr><td>Useful Skills</td><td>5/5</td></tr>"));
        assert!(html.contains("<tr><td>Comments</td><td>Loved it</td></tr>"));
        assert!(!html.contains("Recommended Specialized Skills"));
    }

    #[test]
    fn test_render_requires_plan() {
        assert!(render(&Session::default(), &SurveyData::default(), "today").is_err());
    }

    #[test]
    fn test_write_report_to_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_report(dir.path(), &finished_session(), &SurveyData::default()).unwrap();

        assert_eq!(path.file_name().unwrap(), "Hospitour_PDP_Ana_María_Silva.doc");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Personal Development Plan"));
    }
}
