//! Dashboard summary of strengths and focus areas, derived without any AI call.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{DigitalAudit, DigitalDimension, JiscLevel, Profile, SoftSkill, SoftSkillsAudit, SwotAnalysis};

/// Number of entries shown per list on the dashboard.
pub const DISPLAY_LIMIT: usize = 8;

const SWOT_POINTS: usize = 3;
const SWOT_POINT_MAX_CHARS: usize = 30;

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s*").expect("valid bullet regex"));
static CAPITAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Z])").expect("valid capital regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insights {
    pub strengths: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl Insights {
    pub fn for_display(&self) -> Insights {
        Insights {
            strengths: self.strengths.iter().take(DISPLAY_LIMIT).cloned().collect(),
            focus_areas: self.focus_areas.iter().take(DISPLAY_LIMIT).cloned().collect(),
        }
    }
}

/// Loose de-duplicating list: a candidate is dropped when it contains, or is
/// contained by, an entry already accepted.
#[derive(Default)]
struct Collector(Vec<String>);

impl Collector {
    fn push(&mut self, candidate: String) {
        if candidate.trim().is_empty() {
            return;
        }
        let duplicate = self
            .0
            .iter()
            .any(|existing| existing.contains(candidate.as_str()) || candidate.contains(existing.as_str()));
        if !duplicate {
            self.0.push(candidate);
        }
    }
}

pub fn derive_insights(
    profile: &Profile,
    digital: &DigitalAudit,
    soft: &SoftSkillsAudit,
    swot: &SwotAnalysis,
) -> Insights {
    let mut strengths = Collector::default();
    let mut focus = Collector::default();

    strengths.push(profile.mbti.clone());
    strengths.push(format!("{} Leader", profile.leadership_style));

    for skill in SoftSkill::ALL {
        let score = soft.get(skill);
        if score >= 4 {
            strengths.push(humanize(skill.field_name()));
        }
        if score <= 2 {
            focus.push(humanize(skill.field_name()));
        }
    }

    for custom in &soft.custom {
        if custom.score >= 4 {
            strengths.push(custom.label.clone());
        }
        if custom.score <= 3 {
            focus.push(custom.label.clone());
        }
    }

    for dim in DigitalDimension::ALL {
        match digital.get(dim) {
            JiscLevel::Proficient => strengths.push(format!("Digital {}", dim.name())),
            JiscLevel::Developing => focus.push(format!("Digital {}", dim.name())),
            JiscLevel::Capable => {}
        }
    }

    for point in swot_points(&swot.strengths) {
        strengths.push(point);
    }
    for point in swot_points(&swot.weaknesses) {
        focus.push(point);
    }

    Insights {
        strengths: strengths.0,
        focus_areas: focus.0,
    }
}

/// "decisionMaking" -> "Decision Making"
pub fn humanize(field_name: &str) -> String {
    let spaced = CAPITAL.replace_all(field_name, " $1");
    let mut chars = spaced.trim_start().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Up to three short statements from a newline-separated SWOT quadrant.
pub fn swot_points(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| BULLET.replace(line.trim_start(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(SWOT_POINTS)
        .map(|line| {
            if line.chars().count() > SWOT_POINT_MAX_CHARS {
                let head: String = line.chars().take(SWOT_POINT_MAX_CHARS).collect();
                format!("{}...", head)
            } else {
                line
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomSkill;

    fn all_capable() -> DigitalAudit {
        let mut digital = DigitalAudit::default();
        for dim in DigitalDimension::ALL {
            digital.set(dim, JiscLevel::Capable);
        }
        digital
    }

    fn soft(scores: [u8; 6]) -> SoftSkillsAudit {
        SoftSkillsAudit {
            organisation: scores[0],
            decision_making: scores[1],
            planning: scores[2],
            delegation: scores[3],
            motivation: scores[4],
            coaching: scores[5],
            custom: vec![],
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("decisionMaking"), "Decision Making");
        assert_eq!(humanize("organisation"), "Organisation");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_strengths_and_focus_from_soft_skills() {
        let insights = derive_insights(
            &Profile::default(),
            &all_capable(),
            &soft([5, 1, 3, 3, 3, 3]),
            &SwotAnalysis::default(),
        );

        assert!(insights.strengths.contains(&"Organisation".to_string()));
        assert!(insights.focus_areas.contains(&"Decision Making".to_string()));
        assert!(!insights.strengths.iter().any(|s| s.starts_with("Digital")));
        assert!(!insights.focus_areas.iter().any(|s| s.starts_with("Digital")));
    }

    #[test]
    fn test_profile_seeds_come_first() {
        let insights = derive_insights(
            &Profile::default(),
            &all_capable(),
            &soft([3; 6]),
            &SwotAnalysis::default(),
        );
        assert_eq!(insights.strengths, vec!["ENFP-T (Campaigner)", "Democratic Leader"]);
        assert!(insights.focus_areas.is_empty());
    }

    #[test]
    fn test_digital_levels() {
        let mut digital = all_capable();
        digital.set(DigitalDimension::Identity, JiscLevel::Proficient);
        digital.set(DigitalDimension::InformationLiteracy, JiscLevel::Developing);

        let insights = derive_insights(&Profile::default(), &digital, &soft([3; 6]), &SwotAnalysis::default());
        assert!(insights.strengths.contains(&"Digital Identity".to_string()));
        assert_eq!(insights.focus_areas, vec!["Digital Information Literacy"]);
    }

    #[test]
    fn test_custom_skill_thresholds() {
        let mut audit = soft([3; 6]);
        for (label, score) in [("Revenue Management", 4), ("Negotiation", 3)] {
            audit.custom.push(CustomSkill {
                id: label.to_lowercase(),
                label: label.to_string(),
                desc: String::new(),
                score,
                category: None,
            });
        }
        let insights = derive_insights(&Profile::default(), &all_capable(), &audit, &SwotAnalysis::default());
        assert!(insights.strengths.contains(&"Revenue Management".to_string()));
        assert_eq!(insights.focus_areas, vec!["Negotiation"]);
    }

    #[test]
    fn test_swot_points_extraction() {
        let text = "- Friendly\n\n* A very long statement about guest relations skills\n• Calm\n- Fourth point";
        assert_eq!(
            swot_points(text),
            vec!["Friendly", "A very long statement about gu...", "Calm"]
        );
        assert!(swot_points("").is_empty());
    }

    #[test]
    fn test_substring_deduplication() {
        let swot = SwotAnalysis {
            strengths: "- Organisation\n- Leader\n- Multilingual".to_string(),
            weaknesses: "- Decision".to_string(),
            ..Default::default()
        };
        let insights = derive_insights(&Profile::default(), &all_capable(), &soft([5, 1, 3, 3, 3, 3]), &swot);

        assert_eq!(
            insights.strengths,
            vec!["ENFP-T (Campaigner)", "Democratic Leader", "Organisation", "Multilingual"]
        );
        assert_eq!(insights.focus_areas, vec!["Decision Making"]);
    }

    #[test]
    fn test_empty_mbti_does_not_swallow_later_strengths() {
        let profile = Profile {
            mbti: String::new(),
            ..Default::default()
        };
        let insights = derive_insights(&profile, &all_capable(), &soft([5, 3, 3, 3, 3, 3]), &SwotAnalysis::default());
        assert_eq!(insights.strengths, vec!["Democratic Leader", "Organisation"]);
    }

    #[test]
    fn test_derivation_is_deterministic_and_display_is_capped() {
        let mut audit = soft([5; 6]);
        audit.custom.push(CustomSkill {
            id: "wine".to_string(),
            label: "Wine Knowledge".to_string(),
            desc: String::new(),
            score: 5,
            category: None,
        });
        let mut digital = all_capable();
        digital.set(DigitalDimension::Wellbeing, JiscLevel::Proficient);

        let first = derive_insights(&Profile::default(), &digital, &audit, &SwotAnalysis::default());
        let second = derive_insights(&Profile::default(), &digital, &audit, &SwotAnalysis::default());
        assert_eq!(first, second);

        assert_eq!(first.strengths.len(), 10);
        assert_eq!(first.for_display().strengths.len(), DISPLAY_LIMIT);
        assert_eq!(first.for_display().strengths, first.strengths[..DISPLAY_LIMIT].to_vec());
    }
}
