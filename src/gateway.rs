//! The five AI operations the wizard relies on.
//!
//! Every operation except plan generation degrades to an empty or fixed
//! fallback value on failure. Plan generation returns the error so the wizard
//! can show it and keep the user on the SWOT step.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::ai::{self, AIProvider};
use crate::insights::humanize;
use crate::models::{
    CustomSkill, DigitalAudit, DigitalDimension, GoalFeedback, GoalType, PdpResult, Profile,
    Session, SkillCategory, SmartGoal, SoftSkill, SoftSkillsAudit, SwotQuadrant, SwotSuggestion,
};

pub const MAX_CAREER_SKILLS: usize = 4;

pub const PLAN_REVIEW_EMPTY: &str =
    "Great start on your objectives! Ensure they are specific and time-bound to stay on track.";
pub const PLAN_REVIEW_FAILED: &str =
    "Unable to generate feedback at this time. Focus on making your goals Specific and Measurable.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI credential not configured: {0}")]
    MissingCredential(String),

    #[error("AI request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("AI returned an empty response")]
    EmptyResponse,

    #[error("AI response could not be decoded: {0}")]
    Malformed(String),
}

pub fn goal_feedback_fallback() -> GoalFeedback {
    GoalFeedback {
        score: 0,
        is_smart: false,
        critique: "Error connecting to AI consultant.".to_string(),
        suggestions: "Please try again.".to_string(),
    }
}

/// A career-specific skill proposed for the soft-skills audit, before the
/// user rates it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDescriptor {
    pub id: String,
    pub label: String,
    pub desc: String,
    pub category: Option<SkillCategory>,
}

impl SkillDescriptor {
    pub fn into_custom_skill(self, score: u8) -> CustomSkill {
        CustomSkill {
            id: self.id,
            label: self.label,
            desc: self.desc,
            score,
            category: self.category,
        }
    }
}

pub struct Gateway {
    provider: std::result::Result<Box<dyn AIProvider>, String>,
}

impl Gateway {
    /// Resolve `model` and build its provider. An unknown model name is a
    /// configuration error; a missing credential is not, it is reported by
    /// each operation instead.
    pub fn from_model(model: &str) -> Result<Self> {
        let spec = ai::resolve_model(model)?;
        let provider = ai::create_provider(&spec).map_err(|e| {
            tracing::warn!(model = %spec.short_name, "AI provider unavailable: {:#}", e);
            format!("{:#}", e)
        });
        Ok(Self { provider })
    }

    pub fn with_provider(provider: Box<dyn AIProvider>) -> Self {
        Self { provider: Ok(provider) }
    }

    #[cfg(test)]
    pub fn unconfigured(reason: &str) -> Self {
        Self { provider: Err(reason.to_string()) }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.provider.as_ref().ok().map(|p| p.model_name())
    }

    fn ask(&self, prompt: &str, max_tokens: u32) -> std::result::Result<String, GatewayError> {
        let provider = self
            .provider
            .as_ref()
            .map_err(|reason| GatewayError::MissingCredential(reason.clone()))?;
        let text = provider.complete(prompt, max_tokens).map_err(GatewayError::Transport)?;
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(text)
    }

    // --- Career skills ---

    pub fn generate_career_skills(&self, career_goal: &str) -> Vec<SkillDescriptor> {
        match self.try_generate_career_skills(career_goal) {
            Ok(skills) => skills,
            Err(e) => {
                tracing::error!("Error generating skills: {}", e);
                Vec::new()
            }
        }
    }

    fn try_generate_career_skills(&self, career_goal: &str) -> std::result::Result<Vec<SkillDescriptor>, GatewayError> {
        let prompt = format!(
            "Career Goal: \"{career_goal}\".\n\
            Generate a list of exactly 4 critical skills:\n\
            1. 2 DIGITAL skills (Specific software, platforms, or technical analytics tools).\n\
            2. 2 SOFT skills (Exclude: Organisation, Decision Making, Planning, Delegation, Motivation, Coaching).\n\n\
            Keep descriptions concise (max 1 sentence).\n\n\
            Return ONLY a JSON array, no other text:\n\
            [{{ \"id\": \"snake_case\", \"label\": \"Title\", \"desc\": \"Short reason\", \"category\": \"Digital\" | \"Soft Skill\" }}]"
        );

        let raw: Vec<RawSkill> = decode_json(&self.ask(&prompt, 1024)?)?;

        let mut skills: Vec<SkillDescriptor> = Vec::new();
        for item in raw {
            let label = item.label.trim().to_string();
            if label.is_empty() {
                continue;
            }
            let mut id = if item.id.trim().is_empty() { slug(&label) } else { item.id.trim().to_string() };
            if skills.iter().any(|s| s.id == id) {
                id = format!("{}_{}", id, skills.len() + 1);
            }
            skills.push(SkillDescriptor {
                id,
                label,
                desc: item.desc.trim().to_string(),
                category: item.category.as_deref().and_then(parse_skill_category),
            });
            if skills.len() == MAX_CAREER_SKILLS {
                break;
            }
        }
        Ok(skills)
    }

    // --- SWOT suggestions ---

    pub fn generate_swot_suggestions(
        &self,
        profile: &Profile,
        digital: &DigitalAudit,
        soft: &SoftSkillsAudit,
    ) -> Vec<SwotSuggestion> {
        match self.try_generate_swot_suggestions(profile, digital, soft) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::error!("Error generating SWOT suggestions: {}", e);
                Vec::new()
            }
        }
    }

    fn try_generate_swot_suggestions(
        &self,
        profile: &Profile,
        digital: &DigitalAudit,
        soft: &SoftSkillsAudit,
    ) -> std::result::Result<Vec<SwotSuggestion>, GatewayError> {
        let scored = |keep: fn(u8) -> bool| -> String {
            SoftSkill::ALL
                .iter()
                .filter(|s| keep(soft.get(**s)))
                .map(|s| format!("- {}: {}", humanize(s.field_name()), soft.get(*s)))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Generate SWOT analysis suggestions based on the user's profile and audit results.\n\n\
            Profile: {mbti}, {style} Leader. Goal: {goal}.\n\n\
            Digital Audit Gaps (if any):\n\
            - Identity: {identity}\n\
            - Wellbeing: {wellbeing}\n\
            - Proficiency: {proficiency}\n\n\
            Soft Skills (Low scores):\n{low}\n\n\
            Soft Skills (High scores):\n{high}\n\n\
            Generate 2 suggestions for EACH quadrant (Strengths, Weaknesses, Opportunities, Threats).\n\
            'Opportunities' and 'Threats' should relate to the hospitality industry trends relevant to their goal.\n\n\
            Return ONLY a JSON array, no other text:\n\
            [{{ \"category\": \"strengths\" | \"weaknesses\" | \"opportunities\" | \"threats\", \"text\": \"...\" }}]",
            mbti = profile.mbti,
            style = profile.leadership_style,
            goal = profile.career_goal,
            identity = digital.get(DigitalDimension::Identity),
            wellbeing = digital.get(DigitalDimension::Wellbeing),
            proficiency = digital.get(DigitalDimension::Proficiency),
            low = scored(|v| v < 3),
            high = scored(|v| v > 3),
        );

        let raw: Vec<RawSuggestion> = decode_json(&self.ask(&prompt, 2048)?)?;

        Ok(raw
            .into_iter()
            .filter_map(|item| {
                let category = SwotQuadrant::parse(&item.category)?;
                let text = item.text.trim();
                (!text.is_empty()).then(|| SwotSuggestion { category, text: text.to_string() })
            })
            .collect())
    }

    // --- PDP generation ---

    /// The one operation whose failure reaches the caller.
    pub fn generate_pdp(&self, session: &Session) -> std::result::Result<PdpResult, GatewayError> {
        let prompt = pdp_prompt(session);
        let text = self.ask(&prompt, 8192).inspect_err(|e| tracing::error!("PDP generation failed: {}", e))?;
        let raw: RawPdp = decode_json(&text).inspect_err(|e| tracing::error!("PDP generation failed: {}", e))?;

        if raw.introduction.trim().is_empty() && raw.goals.is_empty() {
            tracing::error!("PDP generation returned neither an introduction nor goals");
            return Err(GatewayError::EmptyResponse);
        }

        Ok(PdpResult {
            introduction: raw.introduction.trim().to_string(),
            goals: raw.goals.into_iter().map(RawGoal::into_goal).collect(),
        })
    }

    // --- Goal evaluation ---

    pub fn evaluate_goal(&self, goal: &SmartGoal) -> GoalFeedback {
        match self.try_evaluate_goal(goal) {
            Ok(feedback) => feedback,
            Err(e) => {
                tracing::error!("Error evaluating goal: {}", e);
                goal_feedback_fallback()
            }
        }
    }

    fn try_evaluate_goal(&self, goal: &SmartGoal) -> std::result::Result<GoalFeedback, GatewayError> {
        let prompt = format!(
            "Evaluate the following Personal Development Objective against SMART criteria \
            (Specific, Measurable, Achievable, Realistic, Time-bound).\n\n\
            Goal Details:\n\
            - Skill to Improve: {}\n\
            - Planned Activity: {}\n\
            - Resources Needed: {}\n\
            - Success Criteria: {}\n\
            - Target Date: {}\n\n\
            Provide constructive feedback.\n\n\
            Return ONLY a JSON object, no other text:\n\
            {{ \"score\": <quality score 0-100>, \"isSmart\": true | false, \
            \"critique\": \"What is good or bad about this goal?\", \
            \"suggestions\": \"Specific improvements to make it SMARTer.\" }}",
            goal.skill, goal.activity, goal.resources, goal.success_criteria, goal.target_date
        );

        let raw: RawFeedback = decode_json(&self.ask(&prompt, 1024)?)?;
        Ok(GoalFeedback {
            score: raw.score.clamp(0.0, 100.0).round() as u8,
            is_smart: raw.is_smart,
            critique: raw.critique,
            suggestions: raw.suggestions,
        })
    }

    // --- Whole-plan review ---

    pub fn evaluate_action_plan(&self, goals: &[SmartGoal]) -> String {
        let summary = goals
            .iter()
            .enumerate()
            .map(|(i, g)| format!("{}. {}: {} (Due: {})", i + 1, g.skill, g.activity, g.target_date))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Act as a supportive Career Coach. Review the following Personal Development Objectives:\n\
            {summary}\n\n\
            Provide a single, concise paragraph (approx 50 words) of feedback.\n\
            1. Acknowledge the effort.\n\
            2. Comment on the overall quality (are they SMART?).\n\
            3. Suggest one general improvement tip to help the user achieve these goals.\n\n\
            Keep the tone encouraging and professional. Do not return JSON. Return plain text only."
        );

        match self.ask(&prompt, 512) {
            Ok(text) => text.trim().to_string(),
            Err(GatewayError::EmptyResponse) => PLAN_REVIEW_EMPTY.to_string(),
            Err(e) => {
                tracing::error!("Error evaluating action plan: {}", e);
                PLAN_REVIEW_FAILED.to_string()
            }
        }
    }
}

fn pdp_prompt(session: &Session) -> String {
    let Session { profile, digital_audit: digital, soft_skills: soft, swot, .. } = session;

    let custom_skills = soft
        .custom
        .iter()
        .map(|s| {
            format!(
                "- {} ({}): {}/5. Context: {}",
                s.label,
                s.category.map(SkillCategory::as_str).unwrap_or("Skill"),
                s.score,
                s.desc
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let digital_lines = DigitalDimension::ALL
        .iter()
        .map(|d| format!("- {}: {}", d.label(), digital.get(*d)))
        .collect::<Vec<_>>()
        .join("\n");

    let soft_lines = SoftSkill::ALL
        .iter()
        .map(|s| format!("- {}: {}", humanize(s.field_name()), soft.get(*s)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Act as a World-Class Hospitality & Tourism Career Consultant.\n\n\
        User Profile:\n\
        - Name: {name}\n\
        - Career Goal (5 Years): {goal}\n\
        - MBTI: {mbti}\n\
        - Leadership Style: {style}\n\n\
        JISC Digital Capability Audit (Developing/Capable/Proficient):\n{digital_lines}\n\n\
        Soft Skills Audit (1-5 Scale):\n{soft_lines}\n\n\
        Specialized Skills for Goal (and user self-rating):\n{custom_skills}\n\n\
        SWOT Analysis:\n\
        - Strengths: {strengths}\n\
        - Weaknesses: {weaknesses}\n\
        - Opportunities: {opportunities}\n\
        - Threats: {threats}\n\n\
        Task:\n\
        Develop a Personal Development Plan (PDP).\n\
        1. Write a short strategic introduction analyzing the \"Strategic Link\" between their personality, gaps, and SWOT.\n\
        2. Generate EXACTLY 5 SMART (Specific, Measurable, Achievable, Realistic, Time-bound) objectives.\n\n\
        CRITICAL INSTRUCTION:\n\
        At least 1-2 objectives MUST be based on the Digital Audit. When creating a Digital Objective, you MUST use \
        one of the specific JISC category names provided above (e.g., \"Information Literacy\", \"Digital Identity\") \
        as the 'skill' name.\n\n\
        Ensure the goals address the specific weaknesses identified in the audits that pose a risk based on the \
        'Threats' or block 'Opportunities'.\n\n\
        Return ONLY a JSON object, no other text:\n\
        {{ \"introduction\": \"...\", \"goals\": [{{ \"skill\": \"...\", \"type\": \"Digital\" | \"Soft Skill\" | \"Strategic\", \
        \"activity\": \"The Action Plan\", \"resources\": \"...\", \"successCriteria\": \"...\", \"targetDate\": \"...\", \
        \"rationale\": \"Link to SWOT/Audit\" }}] }}",
        name = profile.name,
        goal = profile.career_goal,
        mbti = profile.mbti,
        style = profile.leadership_style,
        strengths = swot.strengths,
        weaknesses = swot.weaknesses,
        opportunities = swot.opportunities,
        threats = swot.threats,
    )
}

// --- Decoding ---

/// Parse a model response as JSON of shape `T`. Tolerates Markdown code
/// fences and prose around the JSON value.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> std::result::Result<T, GatewayError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    // Prose may contain brackets of its own, so try every opening bracket
    // until one starts a value of the wanted shape.
    let mut first_error = None;
    for (start, _) in body.match_indices(['[', '{']) {
        match serde_json::Deserializer::from_str(&body[start..]).into_iter::<T>().next() {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert(e.to_string());
            }
            None => {}
        }
    }
    Err(GatewayError::Malformed(
        first_error.unwrap_or_else(|| "no JSON value in response".to_string()),
    ))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn slug(label: &str) -> String {
    let mut out = String::new();
    for word in label.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(&word.to_lowercase());
    }
    out
}

fn parse_skill_category(s: &str) -> Option<SkillCategory> {
    match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
        "digital" => Some(SkillCategory::Digital),
        "soft skill" | "softskill" | "soft" => Some(SkillCategory::SoftSkill),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    #[serde(default)]
    id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    category: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedback {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    is_smart: bool,
    #[serde(default)]
    critique: String,
    #[serde(default)]
    suggestions: String,
}

#[derive(Debug, Deserialize)]
struct RawPdp {
    #[serde(default)]
    introduction: String,
    #[serde(default)]
    goals: Vec<RawGoal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawGoal {
    skill: String,
    #[serde(rename = "type")]
    goal_type: String,
    activity: String,
    resources: String,
    success_criteria: String,
    target_date: String,
    rationale: String,
}

impl RawGoal {
    /// Ids are assigned by the wizard once the plan is accepted.
    fn into_goal(self) -> SmartGoal {
        SmartGoal {
            id: String::new(),
            skill: self.skill,
            goal_type: GoalType::parse(&self.goal_type).unwrap_or(GoalType::Strategic),
            activity: self.activity,
            resources: self.resources,
            success_criteria: self.success_criteria,
            target_date: self.target_date,
            rationale: self.rationale,
            feedback: None,
            completed: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Canned provider: answers every prompt with the same response.
    pub(crate) struct MockProvider {
        pub response: std::result::Result<String, String>,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        pub(crate) fn replying(text: &str) -> Self {
            Self { response: Ok(text.to_string()), calls: Arc::new(AtomicUsize::new(0)) }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self { response: Err(message.to_string()), calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl AIProvider for MockProvider {
        fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(|e| anyhow!(e))
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn gateway(text: &str) -> Gateway {
        Gateway::with_provider(Box::new(MockProvider::replying(text)))
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let gw = Gateway::unconfigured("GEMINI_API_KEY environment variable not set");

        assert!(gw.generate_career_skills("Hotel General Manager").is_empty());
        assert!(gw
            .generate_swot_suggestions(&Profile::default(), &DigitalAudit::default(), &SoftSkillsAudit::default())
            .is_empty());
        assert!(matches!(
            gw.generate_pdp(&Session::default()),
            Err(GatewayError::MissingCredential(_))
        ));
        assert_eq!(gw.evaluate_goal(&SmartGoal::placeholder("g".to_string())), goal_feedback_fallback());
        assert_eq!(gw.evaluate_action_plan(&[]), PLAN_REVIEW_FAILED);
        assert!(gw.model_name().is_none());
    }

    #[test]
    fn test_decode_json_handles_fences_and_prose() {
        let fenced = "```json\n[{\"category\": \"threats\", \"text\": \"Staff shortages\"}]\n```";
        let parsed: Vec<RawSuggestion> = decode_json(fenced).unwrap();
        assert_eq!(parsed[0].text, "Staff shortages");

        let chatty = "Here you go: {\"score\": 80} Hope that helps!";
        let parsed: RawFeedback = decode_json(chatty).unwrap();
        assert_eq!(parsed.score, 80.0);

        let bracketed = "Here is your plan [JSON]:\n{\"introduction\": \"Hi\", \"goals\": [{\"skill\": \"X\"}]}";
        let parsed: RawPdp = decode_json(bracketed).unwrap();
        assert_eq!(parsed.introduction, "Hi");
        assert_eq!(parsed.goals.len(), 1);

        assert!(matches!(decode_json::<RawPdp>("   "), Err(GatewayError::EmptyResponse)));
        assert!(matches!(decode_json::<RawPdp>("no json here"), Err(GatewayError::Malformed(_))));
        assert!(matches!(decode_json::<Vec<RawSkill>>("{\"a\": 1}"), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn test_career_skills_are_capped_and_normalized() {
        let gw = gateway(
            r#"[
                {"id": "pms", "label": "Opera PMS", "desc": "Property management", "category": "Digital"},
                {"label": "Revenue Analytics", "desc": "Pricing", "category": "digital"},
                {"id": "", "label": "", "desc": "dropped"},
                {"id": "pms", "label": "Conflict Resolution", "desc": "Guests", "category": "Soft Skill"},
                {"id": "eq", "label": "Emotional Intelligence", "desc": "Teams", "category": "Soft Skill"},
                {"id": "extra", "label": "Fifth Skill", "desc": "Too many"}
            ]"#,
        );
        let skills = gw.generate_career_skills("Hotel General Manager");

        assert_eq!(skills.len(), MAX_CAREER_SKILLS);
        assert_eq!(skills[0].category, Some(SkillCategory::Digital));
        assert_eq!(skills[1].id, "revenue_analytics");
        assert_eq!(skills[1].category, Some(SkillCategory::Digital));
        assert_eq!(skills[2].id, "pms_3");
        assert_eq!(skills[3].label, "Emotional Intelligence");
    }

    #[test]
    fn test_career_skills_degrade_on_transport_error() {
        let provider = MockProvider::failing("connection reset");
        let calls = provider.calls.clone();
        let gw = Gateway::with_provider(Box::new(provider));

        assert!(gw.generate_career_skills("Chef").is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_swot_suggestions_drop_unknown_categories() {
        let gw = gateway(
            r#"[
                {"category": "strengths", "text": "Warm guest rapport"},
                {"category": "Opportunities", "text": "Boutique hotel growth"},
                {"category": "feelings", "text": "Not a quadrant"},
                {"category": "threats", "text": "  "}
            ]"#,
        );
        let suggestions =
            gw.generate_swot_suggestions(&Profile::default(), &DigitalAudit::default(), &SoftSkillsAudit::default());

        assert_eq!(
            suggestions,
            vec![
                SwotSuggestion { category: SwotQuadrant::Strengths, text: "Warm guest rapport".to_string() },
                SwotSuggestion { category: SwotQuadrant::Opportunities, text: "Boutique hotel growth".to_string() },
            ]
        );
    }

    #[test]
    fn test_generate_pdp_parses_goals() {
        let gw = gateway(
            r#"{"introduction": "Your strategic link.", "goals": [
                {"skill": "Digital Identity", "type": "Digital", "activity": "Update LinkedIn",
                 "resources": "LinkedIn Learning", "successCriteria": "Profile complete",
                 "targetDate": "1 Month", "rationale": "Developing identity"},
                {"skill": "Delegation", "type": "Soft Skill", "activity": "Delegate 2 tasks weekly"}
            ]}"#,
        );
        let pdp = gw.generate_pdp(&Session::default()).unwrap();

        assert_eq!(pdp.introduction, "Your strategic link.");
        assert_eq!(pdp.goals.len(), 2);
        assert_eq!(pdp.goals[0].goal_type, GoalType::Digital);
        assert_eq!(pdp.goals[0].success_criteria, "Profile complete");
        assert_eq!(pdp.goals[1].goal_type, GoalType::SoftSkill);
        assert_eq!(pdp.goals[1].target_date, "");
    }

    #[test]
    fn test_generate_pdp_propagates_failures() {
        let gw = Gateway::with_provider(Box::new(MockProvider::failing("timeout")));
        assert!(matches!(gw.generate_pdp(&Session::default()), Err(GatewayError::Transport(_))));

        assert!(matches!(gateway("{}").generate_pdp(&Session::default()), Err(GatewayError::EmptyResponse)));
        assert!(matches!(gateway("not json").generate_pdp(&Session::default()), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn test_pdp_prompt_includes_session_data() {
        let mut session = Session::default();
        session.profile.name = "Priya".to_string();
        session.swot.threats = "Seasonal demand".to_string();
        let prompt = pdp_prompt(&session);

        assert!(prompt.contains("- Name: Priya"));
        assert!(prompt.contains("- Digital Identity: Developing"));
        assert!(prompt.contains("- Decision Making: 3"));
        assert!(prompt.contains("- Threats: Seasonal demand"));
    }

    #[test]
    fn test_evaluate_goal_clamps_score() {
        let gw = gateway(r#"{"score": 140.4, "isSmart": true, "critique": "Clear", "suggestions": "Add a date"}"#);
        let feedback = gw.evaluate_goal(&SmartGoal::placeholder("g".to_string()));
        assert_eq!(feedback.score, 100);
        assert!(feedback.is_smart);
        assert_eq!(feedback.suggestions, "Add a date");

        let feedback = gateway("garbage").evaluate_goal(&SmartGoal::placeholder("g".to_string()));
        assert_eq!(feedback, goal_feedback_fallback());
    }

    #[test]
    fn test_evaluate_action_plan_plain_text() {
        let text = gateway("  Solid plan. Add dates.  ").evaluate_action_plan(&[SmartGoal::placeholder("g".to_string())]);
        assert_eq!(text, "Solid plan. Add dates.");

        assert_eq!(gateway("   ").evaluate_action_plan(&[]), PLAN_REVIEW_EMPTY);
    }
}
