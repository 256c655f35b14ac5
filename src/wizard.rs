//! The wizard state machine.
//!
//! `Wizard` owns the session and the transient UI flags. Front ends feed it
//! `Event`s; it mutates itself and hands back the `Effect`s the runtime must
//! carry out (storage writes, AI calls, report export).

use rand::Rng;
use std::path::PathBuf;

use crate::gateway::SkillDescriptor;
use crate::insights::{derive_insights, Insights};
use crate::models::{
    DigitalAudit, DigitalDimension, GoalFeedback, GoalField, JiscLevel, PdpResult, Profile, ProfileField,
    Session, SmartGoal, SoftSkill, SoftSkillsAudit, Step, SurveyData, SwotQuadrant, SwotSuggestion,
    clamp_score,
};

/// Score given to career skills when they are first added to the audit.
pub const NEW_SKILL_SCORE: u8 = 3;

const GOAL_ID_LEN: usize = 7;
const GOAL_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Reset,
    DeleteGoal(String),
}

#[derive(Debug, Clone)]
pub enum Event {
    // Navigation
    Next,
    Back,
    JumpTo(Step),

    // Field edits
    SetProfile(ProfileField, String),
    SetDigital(DigitalDimension, JiscLevel),
    SetSoftSkill(SoftSkill, i64),
    SetCustomSkillScore { id: String, score: i64 },
    SetSwot(SwotQuadrant, String),

    // Career skill enrichment
    CareerSkillsLoaded { epoch: u64, career_goal: String, skills: Vec<SkillDescriptor> },

    // SWOT suggestions
    RequestSwotSuggestions,
    SwotSuggestionsLoaded(Vec<SwotSuggestion>),
    AcceptSuggestion(usize),
    RejectSuggestion(usize),

    // Plan generation
    GeneratePdp,
    PdpGenerated { epoch: u64, result: Result<PdpResult, String> },

    // Worksheet
    UpdateGoal { id: String, field: GoalField, value: String },
    ToggleGoalComplete(String),
    AddGoal,
    RequestDeleteGoal(String),
    RequestGoalEvaluation(String),
    GoalEvaluated { id: String, feedback: GoalFeedback },
    RequestPlanReview,
    PlanReviewed(String),

    // Survey and export
    SubmitSurvey(SurveyData),
    ReportWritten(PathBuf),
    ReportFailed(String),

    // Reset and confirmations
    RequestReset,
    Confirm,
    Cancel,

    StorageFailed(String),
    DismissMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the whole session snapshot to the store.
    Persist,
    ClearStorage,
    FetchCareerSkills {
        epoch: u64,
        career_goal: String,
    },
    FetchSwotSuggestions {
        profile: Profile,
        digital: DigitalAudit,
        soft: SoftSkillsAudit,
    },
    GeneratePdp {
        epoch: u64,
        session: Session,
    },
    EvaluateGoal(SmartGoal),
    ReviewPlan(Vec<SmartGoal>),
    ExportReport {
        session: Session,
        survey: SurveyData,
    },
}

#[derive(Debug, Clone)]
pub struct Wizard {
    pub session: Session,
    pub current_step: Step,
    pub generating: bool,
    pub loading_skills: bool,
    pub loading_suggestions: bool,
    pub analysing: bool,
    pub exporting: bool,
    pub evaluating: Vec<String>,
    pub suggestions: Vec<SwotSuggestion>,
    pub plan_review: Option<String>,
    pub pending_confirmation: Option<Confirmation>,
    pub survey: Option<SurveyData>,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Bumped whenever the visible step changes; views reset their scroll
    /// position when it moves.
    pub scroll_reset: u64,
    /// Bumped on reset. Career skills and plans requested under an older
    /// epoch are dropped when they arrive.
    pub epoch: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::resume(None)
    }
}

impl Wizard {
    /// Build the wizard from whatever was loaded at startup. A session with
    /// a finished plan resumes on the worksheet; anything else starts at the
    /// profile step.
    pub fn resume(saved: Option<Session>) -> Self {
        let mut session = saved.unwrap_or_default();
        if !session.completed_steps.contains(&Step::Profile) {
            session.completed_steps.insert(0, Step::Profile);
        }
        let current_step = if session.completed_steps.contains(&Step::Results) && session.pdp_result.is_some() {
            Step::Results
        } else {
            Step::Profile
        };

        Self {
            session,
            current_step,
            generating: false,
            loading_skills: false,
            loading_suggestions: false,
            analysing: false,
            exporting: false,
            evaluating: Vec::new(),
            suggestions: Vec::new(),
            plan_review: None,
            pending_confirmation: None,
            survey: None,
            error: None,
            notice: None,
            scroll_reset: 0,
            epoch: 0,
        }
    }

    pub fn can_visit(&self, step: Step) -> bool {
        step == self.current_step || self.session.completed_steps.contains(&step)
    }

    /// Strengths and focus areas as the dashboard shows them.
    pub fn insights(&self) -> Insights {
        let s = &self.session;
        derive_insights(&s.profile, &s.digital_audit, &s.soft_skills, &s.swot).for_display()
    }

    pub fn goals(&self) -> &[SmartGoal] {
        self.session.pdp_result.as_ref().map(|p| p.goals.as_slice()).unwrap_or(&[])
    }

    pub fn goal(&self, id: &str) -> Option<&SmartGoal> {
        self.goals().iter().find(|g| g.id == id)
    }

    fn goal_mut(&mut self, id: &str) -> Option<&mut SmartGoal> {
        self.session.pdp_result.as_mut()?.goals.iter_mut().find(|g| g.id == id)
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Next => self.next(),
            Event::Back => {
                if let Some(prev) = self.current_step.previous() {
                    self.show(prev);
                }
                vec![]
            }
            Event::JumpTo(step) => {
                if self.can_visit(step) {
                    self.show(step);
                }
                vec![]
            }

            Event::SetProfile(field, value) => {
                self.session.profile.set(field, value);
                vec![Effect::Persist]
            }
            Event::SetDigital(dim, level) => {
                self.session.digital_audit.set(dim, level);
                vec![Effect::Persist]
            }
            Event::SetSoftSkill(skill, score) => {
                self.session.soft_skills.set(skill, score);
                vec![Effect::Persist]
            }
            Event::SetCustomSkillScore { id, score } => {
                match self.session.soft_skills.custom.iter_mut().find(|s| s.id == id) {
                    Some(skill) => {
                        skill.score = clamp_score(score);
                        vec![Effect::Persist]
                    }
                    None => vec![],
                }
            }
            Event::SetSwot(quadrant, text) => {
                *self.session.swot.get_mut(quadrant) = text;
                vec![Effect::Persist]
            }

            Event::CareerSkillsLoaded { epoch, career_goal, skills } => {
                if epoch != self.epoch {
                    tracing::info!(career_goal = %career_goal, "Discarding career skills requested before a reset");
                    return vec![];
                }
                self.merge_career_skills(career_goal, skills)
            }

            Event::RequestSwotSuggestions => {
                if self.loading_suggestions {
                    return vec![];
                }
                self.loading_suggestions = true;
                vec![Effect::FetchSwotSuggestions {
                    profile: self.session.profile.clone(),
                    digital: self.session.digital_audit.clone(),
                    soft: self.session.soft_skills.clone(),
                }]
            }
            Event::SwotSuggestionsLoaded(suggestions) => {
                if !self.loading_suggestions {
                    return vec![];
                }
                self.loading_suggestions = false;
                if suggestions.is_empty() {
                    self.notice = Some("No suggestions available right now. Try again later.".to_string());
                }
                self.suggestions = suggestions;
                vec![]
            }
            Event::AcceptSuggestion(index) => {
                if index >= self.suggestions.len() {
                    return vec![];
                }
                let suggestion = self.suggestions.remove(index);
                let text = self.session.swot.get_mut(suggestion.category);
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str("- ");
                text.push_str(&suggestion.text);
                vec![Effect::Persist]
            }
            Event::RejectSuggestion(index) => {
                if index < self.suggestions.len() {
                    self.suggestions.remove(index);
                }
                vec![]
            }

            Event::GeneratePdp => self.generate_pdp(),
            Event::PdpGenerated { epoch, .. } if epoch != self.epoch || !self.generating => {
                tracing::info!(epoch, "Discarding a plan nobody is waiting for");
                vec![]
            }
            Event::PdpGenerated { result: Ok(pdp), .. } => self.accept_pdp(pdp),
            Event::PdpGenerated { result: Err(message), .. } => {
                self.generating = false;
                self.error = Some(if message.trim().is_empty() {
                    "Failed to generate PDP. Please try again.".to_string()
                } else {
                    format!("Failed to generate PDP: {}", message)
                });
                vec![]
            }

            Event::UpdateGoal { id, field, value } => {
                let Some(goal) = self.goal_mut(&id) else {
                    return vec![];
                };
                match goal.set(field, value) {
                    Ok(()) => vec![Effect::Persist],
                    Err(e) => {
                        self.error = Some(e.to_string());
                        vec![]
                    }
                }
            }
            Event::ToggleGoalComplete(id) => match self.goal_mut(&id) {
                Some(goal) => {
                    goal.completed = Some(!goal.is_completed());
                    vec![Effect::Persist]
                }
                None => vec![],
            },
            Event::AddGoal => {
                let id = new_goal_id(self.goals());
                match self.session.pdp_result.as_mut() {
                    Some(pdp) => {
                        pdp.goals.push(SmartGoal::placeholder(id));
                        vec![Effect::Persist]
                    }
                    None => {
                        self.error = Some("Generate a plan before adding objectives.".to_string());
                        vec![]
                    }
                }
            }
            Event::RequestDeleteGoal(id) => {
                if self.goal(&id).is_some() {
                    self.pending_confirmation = Some(Confirmation::DeleteGoal(id));
                }
                vec![]
            }
            Event::RequestGoalEvaluation(id) => {
                if self.evaluating.contains(&id) {
                    return vec![];
                }
                match self.goal(&id).cloned() {
                    Some(goal) => {
                        self.evaluating.push(id);
                        vec![Effect::EvaluateGoal(goal)]
                    }
                    None => vec![],
                }
            }
            Event::GoalEvaluated { id, feedback } => {
                self.evaluating.retain(|e| *e != id);
                match self.goal_mut(&id) {
                    Some(goal) => {
                        goal.feedback = Some(feedback);
                        vec![Effect::Persist]
                    }
                    None => {
                        tracing::info!(goal = %id, "Dropping feedback for a goal that no longer exists");
                        vec![]
                    }
                }
            }
            Event::RequestPlanReview => {
                if self.analysing || self.goals().is_empty() {
                    return vec![];
                }
                self.analysing = true;
                vec![Effect::ReviewPlan(self.goals().to_vec())]
            }
            Event::PlanReviewed(text) => {
                if !self.analysing {
                    return vec![];
                }
                self.analysing = false;
                self.plan_review = Some(text);
                vec![]
            }

            Event::SubmitSurvey(survey) => {
                if self.exporting {
                    return vec![];
                }
                self.exporting = true;
                self.survey = Some(survey.clone());
                vec![Effect::ExportReport { session: self.session.clone(), survey }]
            }
            Event::ReportWritten(path) => {
                self.exporting = false;
                self.notice = Some(format!("Report saved to {}", path.display()));
                vec![]
            }
            Event::ReportFailed(message) => {
                self.exporting = false;
                self.error = Some(format!("Could not write report: {}", message));
                vec![]
            }

            Event::RequestReset => {
                self.pending_confirmation = Some(Confirmation::Reset);
                vec![]
            }
            Event::Confirm => match self.pending_confirmation.take() {
                Some(Confirmation::Reset) => self.reset(),
                Some(Confirmation::DeleteGoal(id)) => match self.session.pdp_result.as_mut() {
                    Some(pdp) => {
                        pdp.goals.retain(|g| g.id != id);
                        vec![Effect::Persist]
                    }
                    None => vec![],
                },
                None => vec![],
            },
            Event::Cancel => {
                self.pending_confirmation = None;
                vec![]
            }

            Event::StorageFailed(message) => {
                self.error = Some(format!("Progress could not be saved: {}", message));
                vec![]
            }
            Event::DismissMessage => {
                self.error = None;
                self.notice = None;
                vec![]
            }
        }
    }

    fn show(&mut self, step: Step) {
        if self.current_step != step {
            self.current_step = step;
            self.scroll_reset += 1;
        }
    }

    fn advance(&mut self, next: Step) {
        if !self.session.completed_steps.contains(&next) {
            self.session.completed_steps.push(next);
        }
        self.current_step = next;
        self.scroll_reset += 1;
    }

    fn next(&mut self) -> Vec<Effect> {
        match self.current_step {
            Step::Profile => {
                if !self.session.profile.is_complete() {
                    self.error = Some("Please enter your name, career goal and the reason for it.".to_string());
                    return vec![];
                }
                self.error = None;
                self.advance(Step::Digital);

                let career_goal = self.session.profile.career_goal.trim().to_string();
                let mut effects = vec![Effect::Persist];
                if self.session.soft_skills.custom.is_empty() && !career_goal.is_empty() && !self.loading_skills {
                    self.loading_skills = true;
                    effects.push(Effect::FetchCareerSkills { epoch: self.epoch, career_goal });
                }
                effects
            }
            Step::Digital => {
                self.advance(Step::SoftSkills);
                vec![Effect::Persist]
            }
            Step::SoftSkills => {
                self.advance(Step::Swot);
                vec![Effect::Persist]
            }
            Step::Swot => self.generate_pdp(),
            Step::Results => {
                self.advance(Step::Survey);
                vec![Effect::Persist]
            }
            Step::Survey => vec![],
        }
    }

    fn merge_career_skills(&mut self, career_goal: String, skills: Vec<SkillDescriptor>) -> Vec<Effect> {
        self.loading_skills = false;
        if skills.is_empty() {
            return vec![];
        }
        if !self.session.soft_skills.custom.is_empty() || self.session.profile.career_goal.trim() != career_goal {
            tracing::info!(career_goal = %career_goal, "Discarding career skills for a stale request");
            return vec![];
        }
        self.session.soft_skills.custom =
            skills.into_iter().map(|s| s.into_custom_skill(NEW_SKILL_SCORE)).collect();
        vec![Effect::Persist]
    }

    fn generate_pdp(&mut self) -> Vec<Effect> {
        if self.generating {
            return vec![];
        }
        self.generating = true;
        self.error = None;
        vec![Effect::GeneratePdp {
            epoch: self.epoch,
            session: self.session.clone(),
        }]
    }

    fn accept_pdp(&mut self, mut pdp: PdpResult) -> Vec<Effect> {
        self.generating = false;
        let mut assigned: Vec<SmartGoal> = Vec::with_capacity(pdp.goals.len());
        for mut goal in pdp.goals.drain(..) {
            goal.id = new_goal_id(&assigned);
            goal.completed = Some(false);
            assigned.push(goal);
        }
        pdp.goals = assigned;

        self.session.pdp_result = Some(pdp);
        self.plan_review = None;
        self.evaluating.clear();
        self.advance(Step::Results);
        vec![Effect::Persist]
    }

    fn reset(&mut self) -> Vec<Effect> {
        let scroll_reset = self.scroll_reset + 1;
        let epoch = self.epoch + 1;
        *self = Wizard::resume(None);
        self.scroll_reset = scroll_reset;
        self.epoch = epoch;
        vec![Effect::ClearStorage, Effect::Persist]
    }
}

/// Random 7-character base-36 id that no goal in `existing` already uses.
pub fn new_goal_id(existing: &[SmartGoal]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: String = (0..GOAL_ID_LEN)
            .map(|_| GOAL_ID_ALPHABET[rng.gen_range(0..GOAL_ID_ALPHABET.len())] as char)
            .collect();
        if !existing.iter().any(|g| g.id == id) {
            return id;
        }
    }
}
