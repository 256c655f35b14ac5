use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const MBTI_TYPES: [&str; 32] = [
    // Analysts
    "INTJ-A (Architect)", "INTJ-T (Architect)",
    "INTP-A (Logician)", "INTP-T (Logician)",
    "ENTJ-A (Commander)", "ENTJ-T (Commander)",
    "ENTP-A (Debater)", "ENTP-T (Debater)",
    // Diplomats
    "INFJ-A (Advocate)", "INFJ-T (Advocate)",
    "INFP-A (Mediator)", "INFP-T (Mediator)",
    "ENFJ-A (Protagonist)", "ENFJ-T (Protagonist)",
    "ENFP-A (Campaigner)", "ENFP-T (Campaigner)",
    // Sentinels
    "ISTJ-A (Logistician)", "ISTJ-T (Logistician)",
    "ISFJ-A (Defender)", "ISFJ-T (Defender)",
    "ESTJ-A (Executive)", "ESTJ-T (Executive)",
    "ESFJ-A (Consul)", "ESFJ-T (Consul)",
    // Explorers
    "ISTP-A (Virtuoso)", "ISTP-T (Virtuoso)",
    "ISFP-A (Adventurer)", "ISFP-T (Adventurer)",
    "ESTP-A (Entrepreneur)", "ESTP-T (Entrepreneur)",
    "ESFP-A (Entertainer)", "ESFP-T (Entertainer)",
];

pub const LEADERSHIP_STYLES: [&str; 6] = [
    "Democratic",
    "Authoritative",
    "Coaching",
    "Pacesetting",
    "Affiliative",
    "Coercive",
];

/// Match free-form input against a fixed catalogue: exact (case-insensitive),
/// then prefix, then the closest Jaro-Winkler candidate above 0.85.
pub fn resolve_choice(input: &str, options: &[&'static str]) -> Option<&'static str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = options.iter().find(|o| o.to_lowercase() == needle) {
        return Some(*exact);
    }
    if let Some(prefix) = options.iter().find(|o| o.to_lowercase().starts_with(&needle)) {
        return Some(*prefix);
    }

    options
        .iter()
        .map(|o| (o, strsim::jaro_winkler(&o.to_lowercase(), &needle)))
        .filter(|(_, score)| *score >= 0.85)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(o, _)| *o)
}

// --- Wizard steps ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Profile,
    Digital,
    SoftSkills,
    Swot,
    Results,
    Survey,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Profile,
        Step::Digital,
        Step::SoftSkills,
        Step::Swot,
        Step::Results,
        Step::Survey,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::Profile => "Profile",
            Step::Digital => "Digital",
            Step::SoftSkills => "Soft Skills",
            Step::Swot => "SWOT",
            Step::Results => "PDP Worksheet",
            Step::Survey => "Survey",
        }
    }

    pub fn previous(self) -> Option<Step> {
        let idx = Step::ALL.iter().position(|s| *s == self)?;
        idx.checked_sub(1).map(|i| Step::ALL[i])
    }
}

// --- Profile ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub mbti: String,
    pub leadership_style: String,
    pub career_goal: String,
    pub career_reason: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            mbti: "ENFP-T (Campaigner)".to_string(),
            leadership_style: "Democratic".to_string(),
            career_goal: "Hotel General Manager".to_string(),
            career_reason: String::new(),
        }
    }
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.career_goal.trim().is_empty()
            && !self.career_reason.trim().is_empty()
    }

    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Mbti => &self.mbti,
            ProfileField::LeadershipStyle => &self.leadership_style,
            ProfileField::CareerGoal => &self.career_goal,
            ProfileField::CareerReason => &self.career_reason,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Mbti => self.mbti = value,
            ProfileField::LeadershipStyle => self.leadership_style = value,
            ProfileField::CareerGoal => self.career_goal = value,
            ProfileField::CareerReason => self.career_reason = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Mbti,
    LeadershipStyle,
    CareerGoal,
    CareerReason,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Name,
        ProfileField::Mbti,
        ProfileField::LeadershipStyle,
        ProfileField::CareerGoal,
        ProfileField::CareerReason,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Name => "Full Name",
            ProfileField::Mbti => "MBTI Personality Type",
            ProfileField::LeadershipStyle => "Leadership Style",
            ProfileField::CareerGoal => "5-Year Career Goal",
            ProfileField::CareerReason => "Why this goal?",
        }
    }

    /// Fields picked from a fixed catalogue rather than typed.
    pub fn choices(self) -> Option<&'static [&'static str]> {
        match self {
            ProfileField::Mbti => Some(&MBTI_TYPES),
            ProfileField::LeadershipStyle => Some(&LEADERSHIP_STYLES),
            _ => None,
        }
    }
}

// --- JISC digital capability ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JiscLevel {
    Developing,
    Capable,
    Proficient,
}

impl JiscLevel {
    pub const ALL: [JiscLevel; 3] = [JiscLevel::Developing, JiscLevel::Capable, JiscLevel::Proficient];

    pub fn as_str(self) -> &'static str {
        match self {
            JiscLevel::Developing => "Developing",
            JiscLevel::Capable => "Capable",
            JiscLevel::Proficient => "Proficient",
        }
    }

    pub fn raise(self) -> Self {
        match self {
            JiscLevel::Developing => JiscLevel::Capable,
            _ => JiscLevel::Proficient,
        }
    }

    pub fn lower(self) -> Self {
        match self {
            JiscLevel::Proficient => JiscLevel::Capable,
            _ => JiscLevel::Developing,
        }
    }
}

impl std::fmt::Display for JiscLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalAudit {
    pub digital_proficiency: JiscLevel,
    pub information_literacy: JiscLevel,
    pub digital_identity: JiscLevel,
    pub digital_productivity: JiscLevel,
    pub digital_collaboration: JiscLevel,
    pub digital_wellbeing: JiscLevel,
}

impl Default for DigitalAudit {
    fn default() -> Self {
        Self {
            digital_proficiency: JiscLevel::Capable,
            information_literacy: JiscLevel::Capable,
            digital_identity: JiscLevel::Developing,
            digital_productivity: JiscLevel::Proficient,
            digital_collaboration: JiscLevel::Capable,
            digital_wellbeing: JiscLevel::Developing,
        }
    }
}

impl DigitalAudit {
    pub fn get(&self, dim: DigitalDimension) -> JiscLevel {
        match dim {
            DigitalDimension::Proficiency => self.digital_proficiency,
            DigitalDimension::InformationLiteracy => self.information_literacy,
            DigitalDimension::Identity => self.digital_identity,
            DigitalDimension::Productivity => self.digital_productivity,
            DigitalDimension::Collaboration => self.digital_collaboration,
            DigitalDimension::Wellbeing => self.digital_wellbeing,
        }
    }

    pub fn set(&mut self, dim: DigitalDimension, level: JiscLevel) {
        let slot = match dim {
            DigitalDimension::Proficiency => &mut self.digital_proficiency,
            DigitalDimension::InformationLiteracy => &mut self.information_literacy,
            DigitalDimension::Identity => &mut self.digital_identity,
            DigitalDimension::Productivity => &mut self.digital_productivity,
            DigitalDimension::Collaboration => &mut self.digital_collaboration,
            DigitalDimension::Wellbeing => &mut self.digital_wellbeing,
        };
        *slot = level;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalDimension {
    Proficiency,
    InformationLiteracy,
    Identity,
    Productivity,
    Collaboration,
    Wellbeing,
}

impl DigitalDimension {
    pub const ALL: [DigitalDimension; 6] = [
        DigitalDimension::Proficiency,
        DigitalDimension::InformationLiteracy,
        DigitalDimension::Identity,
        DigitalDimension::Productivity,
        DigitalDimension::Collaboration,
        DigitalDimension::Wellbeing,
    ];

    /// Dimension name without the "Digital" prefix.
    pub fn name(self) -> &'static str {
        match self {
            DigitalDimension::Proficiency => "Proficiency",
            DigitalDimension::InformationLiteracy => "Information Literacy",
            DigitalDimension::Identity => "Identity",
            DigitalDimension::Productivity => "Productivity",
            DigitalDimension::Collaboration => "Collaboration",
            DigitalDimension::Wellbeing => "Wellbeing",
        }
    }

    /// Full JISC category name, as used in prompts and the report.
    pub fn label(self) -> &'static str {
        match self {
            DigitalDimension::Proficiency => "Digital Proficiency",
            DigitalDimension::InformationLiteracy => "Information Literacy",
            DigitalDimension::Identity => "Digital Identity",
            DigitalDimension::Productivity => "Digital Productivity",
            DigitalDimension::Collaboration => "Digital Collaboration",
            DigitalDimension::Wellbeing => "Digital Wellbeing",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DigitalDimension::Proficiency => "Using devices, applications and software confidently.",
            DigitalDimension::InformationLiteracy => "Finding, evaluating and managing information.",
            DigitalDimension::Identity => "Managing your online professional profile and reputation.",
            DigitalDimension::Productivity => "Using digital tools to get work done efficiently.",
            DigitalDimension::Collaboration => "Working with others in digital spaces.",
            DigitalDimension::Wellbeing => "Looking after your health in a digital world.",
        }
    }
}

// --- Soft skills ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Digital,
    #[serde(rename = "Soft Skill", alias = "SoftSkill")]
    SoftSkill,
}

impl SkillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Digital => "Digital",
            SkillCategory::SoftSkill => "Soft Skill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSkill {
    pub id: String,
    pub label: String,
    pub desc: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SkillCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftSkillsAudit {
    pub organisation: u8,
    pub decision_making: u8,
    pub planning: u8,
    pub delegation: u8,
    pub motivation: u8,
    pub coaching: u8,
    #[serde(default)]
    pub custom: Vec<CustomSkill>,
}

impl Default for SoftSkillsAudit {
    fn default() -> Self {
        Self {
            organisation: 3,
            decision_making: 3,
            planning: 3,
            delegation: 2,
            motivation: 3,
            coaching: 2,
            custom: Vec::new(),
        }
    }
}

pub fn clamp_score(score: i64) -> u8 {
    score.clamp(1, 5) as u8
}

impl SoftSkillsAudit {
    pub fn get(&self, skill: SoftSkill) -> u8 {
        match skill {
            SoftSkill::Organisation => self.organisation,
            SoftSkill::DecisionMaking => self.decision_making,
            SoftSkill::Planning => self.planning,
            SoftSkill::Delegation => self.delegation,
            SoftSkill::Motivation => self.motivation,
            SoftSkill::Coaching => self.coaching,
        }
    }

    pub fn set(&mut self, skill: SoftSkill, score: i64) {
        let slot = match skill {
            SoftSkill::Organisation => &mut self.organisation,
            SoftSkill::DecisionMaking => &mut self.decision_making,
            SoftSkill::Planning => &mut self.planning,
            SoftSkill::Delegation => &mut self.delegation,
            SoftSkill::Motivation => &mut self.motivation,
            SoftSkill::Coaching => &mut self.coaching,
        };
        *slot = clamp_score(score);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoftSkill {
    Organisation,
    DecisionMaking,
    Planning,
    Delegation,
    Motivation,
    Coaching,
}

impl SoftSkill {
    pub const ALL: [SoftSkill; 6] = [
        SoftSkill::Organisation,
        SoftSkill::DecisionMaking,
        SoftSkill::Planning,
        SoftSkill::Delegation,
        SoftSkill::Motivation,
        SoftSkill::Coaching,
    ];

    /// Name of the field in the stored record.
    pub fn field_name(self) -> &'static str {
        match self {
            SoftSkill::Organisation => "organisation",
            SoftSkill::DecisionMaking => "decisionMaking",
            SoftSkill::Planning => "planning",
            SoftSkill::Delegation => "delegation",
            SoftSkill::Motivation => "motivation",
            SoftSkill::Coaching => "coaching",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SoftSkill::Organisation => "Prioritising tasks and managing time effectively.",
            SoftSkill::DecisionMaking => "Selecting suitable solutions from options.",
            SoftSkill::Planning => "Objective setting and resource allocation.",
            SoftSkill::Delegation => "Matching tasks to staff and empowering them.",
            SoftSkill::Motivation => "Encouraging creativity and engendering trust.",
            SoftSkill::Coaching => "Listening skills and reinforcing positive behaviour.",
        }
    }
}

// --- SWOT ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwotAnalysis {
    pub strengths: String,
    pub weaknesses: String,
    pub opportunities: String,
    pub threats: String,
}

impl SwotAnalysis {
    pub fn get(&self, quadrant: SwotQuadrant) -> &str {
        match quadrant {
            SwotQuadrant::Strengths => &self.strengths,
            SwotQuadrant::Weaknesses => &self.weaknesses,
            SwotQuadrant::Opportunities => &self.opportunities,
            SwotQuadrant::Threats => &self.threats,
        }
    }

    pub fn get_mut(&mut self, quadrant: SwotQuadrant) -> &mut String {
        match quadrant {
            SwotQuadrant::Strengths => &mut self.strengths,
            SwotQuadrant::Weaknesses => &mut self.weaknesses,
            SwotQuadrant::Opportunities => &mut self.opportunities,
            SwotQuadrant::Threats => &mut self.threats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwotQuadrant {
    Strengths,
    Weaknesses,
    Opportunities,
    Threats,
}

impl SwotQuadrant {
    pub const ALL: [SwotQuadrant; 4] = [
        SwotQuadrant::Strengths,
        SwotQuadrant::Weaknesses,
        SwotQuadrant::Opportunities,
        SwotQuadrant::Threats,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SwotQuadrant::Strengths => "Strengths",
            SwotQuadrant::Weaknesses => "Weaknesses",
            SwotQuadrant::Opportunities => "Opportunities",
            SwotQuadrant::Threats => "Threats",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strengths" | "strength" => Some(SwotQuadrant::Strengths),
            "weaknesses" | "weakness" => Some(SwotQuadrant::Weaknesses),
            "opportunities" | "opportunity" => Some(SwotQuadrant::Opportunities),
            "threats" | "threat" => Some(SwotQuadrant::Threats),
            _ => None,
        }
    }
}

/// AI-proposed SWOT statement awaiting accept/reject. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwotSuggestion {
    pub category: SwotQuadrant,
    pub text: String,
}

// --- Goals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalType {
    Digital,
    #[serde(rename = "Soft Skill", alias = "SoftSkill")]
    SoftSkill,
    Strategic,
}

impl GoalType {
    pub const ALL: [GoalType; 3] = [GoalType::Digital, GoalType::SoftSkill, GoalType::Strategic];

    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Digital => "Digital",
            GoalType::SoftSkill => "Soft Skill",
            GoalType::Strategic => "Strategic",
        }
    }

    /// Lenient parse used for AI output and CLI input.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "digital" => Some(GoalType::Digital),
            "softskill" | "soft" => Some(GoalType::SoftSkill),
            "strategic" => Some(GoalType::Strategic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalFeedback {
    pub score: u8,
    pub is_smart: bool,
    pub critique: String,
    pub suggestions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartGoal {
    pub id: String,
    pub skill: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub activity: String,
    pub resources: String,
    pub success_criteria: String,
    pub target_date: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<GoalFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl SmartGoal {
    /// A user-added goal with the placeholder values shown in the worksheet.
    pub fn placeholder(id: String) -> Self {
        Self {
            id,
            skill: "New Objective".to_string(),
            goal_type: GoalType::SoftSkill,
            activity: String::new(),
            resources: String::new(),
            success_criteria: String::new(),
            target_date: "1 Month".to_string(),
            rationale: "Self-identified development need".to_string(),
            feedback: None,
            completed: Some(false),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }

    pub fn get(&self, field: GoalField) -> &str {
        match field {
            GoalField::Skill => &self.skill,
            GoalField::Type => self.goal_type.as_str(),
            GoalField::Activity => &self.activity,
            GoalField::Resources => &self.resources,
            GoalField::SuccessCriteria => &self.success_criteria,
            GoalField::TargetDate => &self.target_date,
            GoalField::Rationale => &self.rationale,
        }
    }

    pub fn set(&mut self, field: GoalField, value: String) -> Result<()> {
        match field {
            GoalField::Skill => self.skill = value,
            GoalField::Type => {
                self.goal_type = GoalType::parse(&value)
                    .ok_or_else(|| anyhow!("Unknown goal type '{}'. Use Digital, Soft Skill or Strategic", value))?;
            }
            GoalField::Activity => self.activity = value,
            GoalField::Resources => self.resources = value,
            GoalField::SuccessCriteria => self.success_criteria = value,
            GoalField::TargetDate => self.target_date = value,
            GoalField::Rationale => self.rationale = value,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Skill,
    Type,
    Activity,
    Resources,
    SuccessCriteria,
    TargetDate,
    Rationale,
}

impl GoalField {
    pub const ALL: [GoalField; 7] = [
        GoalField::Skill,
        GoalField::Type,
        GoalField::Activity,
        GoalField::Resources,
        GoalField::SuccessCriteria,
        GoalField::TargetDate,
        GoalField::Rationale,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GoalField::Skill => "Skill",
            GoalField::Type => "Type",
            GoalField::Activity => "Activity",
            GoalField::Resources => "Resources",
            GoalField::SuccessCriteria => "Success Criteria",
            GoalField::TargetDate => "Target Date",
            GoalField::Rationale => "Rationale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "skill" => Some(GoalField::Skill),
            "type" => Some(GoalField::Type),
            "activity" => Some(GoalField::Activity),
            "resources" => Some(GoalField::Resources),
            "successcriteria" | "criteria" => Some(GoalField::SuccessCriteria),
            "targetdate" | "target" | "date" => Some(GoalField::TargetDate),
            "rationale" => Some(GoalField::Rationale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdpResult {
    pub introduction: String,
    pub goals: Vec<SmartGoal>,
}

impl PdpResult {
    /// (completed, total, percentage)
    pub fn progress(&self) -> (usize, usize, f64) {
        let total = self.goals.len();
        let done = self.goals.iter().filter(|g| g.is_completed()).count();
        let pct = if total > 0 { done as f64 / total as f64 * 100.0 } else { 0.0 };
        (done, total, pct)
    }
}

// --- Survey ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Rating,
    YesNo,
    Text,
}

pub struct SurveyQuestion {
    pub label: &'static str,
    pub prompt: &'static str,
    pub kind: AnswerKind,
}

pub const SURVEY_QUESTIONS: [SurveyQuestion; 13] = [
    SurveyQuestion { label: "Easy to Start", prompt: "How easy was it to get started?", kind: AnswerKind::Rating },
    SurveyQuestion { label: "Clear Explanation", prompt: "Was the purpose of each step clearly explained?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Personalized", prompt: "Did the plan feel personalised to you?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Useful Skills", prompt: "How useful were the recommended skills?", kind: AnswerKind::Rating },
    SurveyQuestion { label: "Helpful SWOT", prompt: "Did the SWOT suggestions help you?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Clear Goals", prompt: "Were the generated goals clear?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Easy Progress", prompt: "How easy was it to track progress?", kind: AnswerKind::Rating },
    SurveyQuestion { label: "Motivated", prompt: "Do you feel motivated to act on your plan? Why?", kind: AnswerKind::Text },
    SurveyQuestion { label: "AI Feedback Helpful", prompt: "Was the AI feedback on your goals helpful?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Device Easy", prompt: "Was the tool easy to use on your device?", kind: AnswerKind::YesNo },
    SurveyQuestion { label: "Design Helpful", prompt: "How helpful was the layout and design?", kind: AnswerKind::Rating },
    SurveyQuestion { label: "Recommend", prompt: "Would you recommend this tool to a colleague?", kind: AnswerKind::Text },
    SurveyQuestion { label: "Comments", prompt: "Any other feedback?", kind: AnswerKind::Text },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyData {
    pub q1_easy_start: u8,
    pub q2_clear_explanation: String,
    pub q3_personalized: String,
    pub q4_useful_skills: u8,
    pub q5_helpful_swot: String,
    pub q6_clear_goals: String,
    pub q7_easy_progress: u8,
    pub q8_motivated: String,
    pub q9_ai_feedback_helpful: String,
    pub q10_device_easy: String,
    pub q11_design_helpful: u8,
    pub q12_recommend: String,
    pub q13_feedback: String,
}

impl Default for SurveyData {
    fn default() -> Self {
        Self {
            q1_easy_start: 3,
            q2_clear_explanation: "Yes".to_string(),
            q3_personalized: "Yes".to_string(),
            q4_useful_skills: 3,
            q5_helpful_swot: "Yes".to_string(),
            q6_clear_goals: "Yes".to_string(),
            q7_easy_progress: 3,
            q8_motivated: String::new(),
            q9_ai_feedback_helpful: "Yes".to_string(),
            q10_device_easy: "Yes".to_string(),
            q11_design_helpful: 3,
            q12_recommend: String::new(),
            q13_feedback: String::new(),
        }
    }
}

impl SurveyData {
    pub fn answer(&self, index: usize) -> String {
        match index {
            0 => self.q1_easy_start.to_string(),
            1 => self.q2_clear_explanation.clone(),
            2 => self.q3_personalized.clone(),
            3 => self.q4_useful_skills.to_string(),
            4 => self.q5_helpful_swot.clone(),
            5 => self.q6_clear_goals.clone(),
            6 => self.q7_easy_progress.to_string(),
            7 => self.q8_motivated.clone(),
            8 => self.q9_ai_feedback_helpful.clone(),
            9 => self.q10_device_easy.clone(),
            10 => self.q11_design_helpful.to_string(),
            11 => self.q12_recommend.clone(),
            12 => self.q13_feedback.clone(),
            _ => String::new(),
        }
    }

    /// Set the answer to question `index` (0-based), validating it against the
    /// question's kind.
    pub fn set_answer(&mut self, index: usize, raw: &str) -> Result<()> {
        if index >= SURVEY_QUESTIONS.len() {
            return Err(anyhow!("No survey question #{}", index + 1));
        }
        let raw = raw.trim();

        let rating = || -> Result<u8> {
            let n: u8 = raw
                .parse()
                .map_err(|_| anyhow!("'{}' is not a rating from 1 to 5", raw))?;
            if !(1..=5).contains(&n) {
                return Err(anyhow!("'{}' is not a rating from 1 to 5", raw));
            }
            Ok(n)
        };
        let yes_no = || -> Result<String> {
            match raw.to_lowercase().as_str() {
                "y" | "yes" => Ok("Yes".to_string()),
                "n" | "no" => Ok("No".to_string()),
                _ => Err(anyhow!("'{}' is not Yes or No", raw)),
            }
        };

        match index {
            0 => self.q1_easy_start = rating()?,
            1 => self.q2_clear_explanation = yes_no()?,
            2 => self.q3_personalized = yes_no()?,
            3 => self.q4_useful_skills = rating()?,
            4 => self.q5_helpful_swot = yes_no()?,
            5 => self.q6_clear_goals = yes_no()?,
            6 => self.q7_easy_progress = rating()?,
            7 => self.q8_motivated = raw.to_string(),
            8 => self.q9_ai_feedback_helpful = yes_no()?,
            9 => self.q10_device_easy = yes_no()?,
            10 => self.q11_design_helpful = rating()?,
            11 => self.q12_recommend = raw.to_string(),
            _ => self.q13_feedback = raw.to_string(),
        }
        Ok(())
    }
}

// --- Session aggregate ---

/// Everything that is persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub profile: Profile,
    pub digital_audit: DigitalAudit,
    pub soft_skills: SoftSkillsAudit,
    pub swot: SwotAnalysis,
    pub pdp_result: Option<PdpResult>,
    pub completed_steps: Vec<Step>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            digital_audit: DigitalAudit::default(),
            soft_skills: SoftSkillsAudit::default(),
            swot: SwotAnalysis::default(),
            pdp_result: None,
            completed_steps: vec![Step::Profile],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_completeness() {
        let mut profile = Profile::default();
        assert!(!profile.is_complete());

        profile.name = "Sam Carter".to_string();
        profile.career_reason = "I love hospitality".to_string();
        assert!(profile.is_complete());

        profile.career_goal = "   ".to_string();
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_step_serializes_lowercase() {
        let json = serde_json::to_string(&vec![Step::Profile, Step::SoftSkills, Step::Results]).unwrap();
        assert_eq!(json, r#"["profile","softskills","results"]"#);
        assert_eq!(Step::Digital.previous(), Some(Step::Profile));
        assert_eq!(Step::Profile.previous(), None);
    }

    #[test]
    fn test_goal_type_wire_format() {
        let goal = SmartGoal::placeholder("abc1234".to_string());
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["type"], "Soft Skill");
        assert_eq!(value["targetDate"], "1 Month");

        assert_eq!(GoalType::parse("soft skill"), Some(GoalType::SoftSkill));
        assert_eq!(GoalType::parse("STRATEGIC"), Some(GoalType::Strategic));
        assert_eq!(GoalType::parse("other"), None);
    }

    #[test]
    fn test_soft_skill_scores_are_clamped() {
        let mut soft = SoftSkillsAudit::default();
        soft.set(SoftSkill::Planning, 9);
        soft.set(SoftSkill::Coaching, 0);
        assert_eq!(soft.planning, 5);
        assert_eq!(soft.coaching, 1);
    }

    #[test]
    fn test_resolve_choice() {
        assert_eq!(resolve_choice("democratic", &LEADERSHIP_STYLES), Some("Democratic"));
        assert_eq!(resolve_choice("intj-t", &MBTI_TYPES), Some("INTJ-T (Architect)"));
        assert_eq!(resolve_choice("Pacesettng", &LEADERSHIP_STYLES), Some("Pacesetting"));
        assert_eq!(resolve_choice("zzz", &LEADERSHIP_STYLES), None);
    }

    #[test]
    fn test_survey_answers_are_validated() {
        let mut survey = SurveyData::default();
        survey.set_answer(0, "5").unwrap();
        survey.set_answer(1, "n").unwrap();
        survey.set_answer(12, "Great tool").unwrap();
        assert_eq!(survey.q1_easy_start, 5);
        assert_eq!(survey.q2_clear_explanation, "No");
        assert_eq!(survey.answer(12), "Great tool");

        assert!(survey.set_answer(3, "7").is_err());
        assert!(survey.set_answer(4, "maybe").is_err());
        assert!(survey.set_answer(13, "x").is_err());
    }

    #[test]
    fn test_pdp_progress() {
        let mut first = SmartGoal::placeholder("a".to_string());
        first.completed = Some(true);
        let pdp = PdpResult {
            introduction: String::new(),
            goals: vec![first, SmartGoal::placeholder("b".to_string())],
        };
        assert_eq!(pdp.progress(), (1, 2, 50.0));

        let empty = PdpResult { introduction: String::new(), goals: vec![] };
        assert_eq!(empty.progress(), (0, 0, 0.0));
    }
}
