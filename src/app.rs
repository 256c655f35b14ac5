//! Runtime that carries out the wizard's effects.
//!
//! Storage writes happen inline on the calling thread. AI calls and report
//! export either run on worker threads, reporting back over a channel
//! (terminal UI), or inline (CLI commands).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::gateway::Gateway;
use crate::report;
use crate::store::Store;
use crate::wizard::{Effect, Event, Wizard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Background,
    Inline,
}

pub struct App {
    pub wizard: Wizard,
    store: Store,
    gateway: Arc<Gateway>,
    report_dir: PathBuf,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl App {
    pub fn new(store: Store, gateway: Gateway, report_dir: PathBuf) -> Self {
        let wizard = Wizard::resume(store.load_session());
        let (tx, rx) = mpsc::channel();
        Self {
            wizard,
            store,
            gateway: Arc::new(gateway),
            report_dir,
            tx,
            rx,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Dispatch from the terminal UI. Slow effects run on worker threads.
    pub fn dispatch(&mut self, event: Event) {
        self.run(event, Mode::Background);
    }

    /// Dispatch from a CLI command. Every effect has completed on return.
    pub fn dispatch_inline(&mut self, event: Event) {
        self.run(event, Mode::Inline);
    }

    /// Feed finished background results back into the wizard. Returns true
    /// if anything arrived.
    pub fn drain(&mut self) -> bool {
        let mut received = false;
        while let Ok(event) = self.rx.try_recv() {
            received = true;
            self.run(event, Mode::Background);
        }
        received
    }

    pub fn busy(&self) -> bool {
        let w = &self.wizard;
        w.generating || w.loading_skills || w.loading_suggestions || w.analysing || w.exporting || !w.evaluating.is_empty()
    }

    fn run(&mut self, event: Event, mode: Mode) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.wizard.dispatch(event) {
                match effect {
                    Effect::Persist => {
                        if let Err(e) = self.store.save_session(&self.wizard.session) {
                            tracing::error!("Failed to save session: {:#}", e);
                            queue.push_back(Event::StorageFailed(format!("{:#}", e)));
                        }
                    }
                    Effect::ClearStorage => {
                        if let Err(e) = self.store.clear_session() {
                            tracing::error!("Failed to clear saved session: {:#}", e);
                            queue.push_back(Event::StorageFailed(format!("{:#}", e)));
                        }
                    }
                    effect => match mode {
                        Mode::Inline => {
                            if let Some(result) = perform(&self.gateway, &self.report_dir, effect) {
                                queue.push_back(result);
                            }
                        }
                        Mode::Background => self.spawn(effect),
                    },
                }
            }
        }
    }

    fn spawn(&self, effect: Effect) {
        let gateway = Arc::clone(&self.gateway);
        let report_dir = self.report_dir.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            if let Some(result) = perform(&gateway, &report_dir, effect) {
                // The receiver only goes away when the UI has exited.
                let _ = tx.send(result);
            }
        });
    }
}

/// Execute one slow effect and turn its outcome into the event that reports
/// it. Storage effects are handled by `App` and yield nothing here.
pub fn perform(gateway: &Gateway, report_dir: &Path, effect: Effect) -> Option<Event> {
    match effect {
        Effect::Persist | Effect::ClearStorage => None,
        Effect::FetchCareerSkills { epoch, career_goal } => {
            tracing::info!(career_goal = %career_goal, "Fetching career skills");
            let skills = gateway.generate_career_skills(&career_goal);
            Some(Event::CareerSkillsLoaded { epoch, career_goal, skills })
        }
        Effect::FetchSwotSuggestions { profile, digital, soft } => {
            let suggestions = gateway.generate_swot_suggestions(&profile, &digital, &soft);
            Some(Event::SwotSuggestionsLoaded(suggestions))
        }
        Effect::GeneratePdp { epoch, session } => {
            tracing::info!(epoch, "Generating PDP");
            let result = gateway.generate_pdp(&session).map_err(|e| e.to_string());
            Some(Event::PdpGenerated { epoch, result })
        }
        Effect::EvaluateGoal(goal) => {
            let feedback = gateway.evaluate_goal(&goal);
            Some(Event::GoalEvaluated { id: goal.id, feedback })
        }
        Effect::ReviewPlan(goals) => Some(Event::PlanReviewed(gateway.evaluate_action_plan(&goals))),
        Effect::ExportReport { session, survey } => match report::write_report(report_dir, &session, &survey) {
            Ok(path) => Some(Event::ReportWritten(path)),
            Err(e) => {
                tracing::error!("Report export failed: {:#}", e);
                Some(Event::ReportFailed(format!("{:#}", e)))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::MockProvider;
    use crate::models::{ProfileField, Step, SurveyData};
    use std::time::Duration;

    const PLAN: &str = r#"{"introduction": "Lead with data.", "goals": [
        {"skill": "Information Literacy", "type": "Digital", "activity": "Complete a market research course"},
        {"skill": "Delegation", "type": "Soft Skill", "activity": "Delegate the weekly rota"}
    ]}"#;

    fn app_with(provider: MockProvider, report_dir: PathBuf) -> App {
        let store = Store::open_in_memory().unwrap();
        App::new(store, Gateway::with_provider(Box::new(provider)), report_dir)
    }

    fn walk_to_swot(app: &mut App) {
        app.dispatch_inline(Event::SetProfile(ProfileField::Name, "Sam Okafor".to_string()));
        app.dispatch_inline(Event::SetProfile(ProfileField::CareerReason, "Growth".to_string()));
        app.dispatch_inline(Event::Next);
        app.dispatch_inline(Event::Next);
        app.dispatch_inline(Event::Next);
        assert_eq!(app.wizard.current_step, Step::Swot);
    }

    #[test]
    fn test_every_change_is_persisted() {
        let mut app = app_with(MockProvider::replying("[]"), PathBuf::from("."));
        app.dispatch_inline(Event::SetProfile(ProfileField::Name, "Sam Okafor".to_string()));

        let saved = app.store().load_session().unwrap();
        assert_eq!(saved.profile.name, "Sam Okafor");
    }

    #[test]
    fn test_inline_generation_reaches_results() {
        let mut app = app_with(MockProvider::replying(PLAN), PathBuf::from("."));
        walk_to_swot(&mut app);
        app.dispatch_inline(Event::GeneratePdp);

        assert_eq!(app.wizard.current_step, Step::Results);
        assert!(!app.busy());
        let saved = app.store().load_session().unwrap();
        assert_eq!(saved.pdp_result.unwrap().goals.len(), 2);
        assert!(saved.completed_steps.contains(&Step::Results));
    }

    #[test]
    fn test_failed_generation_keeps_swot_step() {
        let mut app = app_with(MockProvider::failing("connection refused"), PathBuf::from("."));
        walk_to_swot(&mut app);
        app.dispatch_inline(Event::GeneratePdp);

        assert_eq!(app.wizard.current_step, Step::Swot);
        assert!(app.wizard.error.as_deref().is_some_and(|e| e.contains("connection refused")));
        assert!(app.store().load_session().unwrap().pdp_result.is_none());
    }

    #[test]
    fn test_background_results_are_drained() {
        let skills = r#"[{"id": "pms", "label": "Opera PMS", "desc": "Front office", "category": "Digital"}]"#;
        let mut app = app_with(MockProvider::replying(skills), PathBuf::from("."));
        app.dispatch(Event::SetProfile(ProfileField::Name, "Sam Okafor".to_string()));
        app.dispatch(Event::SetProfile(ProfileField::CareerReason, "Growth".to_string()));
        app.dispatch(Event::Next);
        assert!(app.busy());

        for _ in 0..200 {
            if app.drain() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(!app.busy());
        assert_eq!(app.wizard.session.soft_skills.custom.len(), 1);
        assert_eq!(app.store().load_session().unwrap().soft_skills.custom[0].label, "Opera PMS");
    }

    #[test]
    fn test_plan_finishing_after_reset_is_dropped() {
        let mut app = app_with(MockProvider::replying(PLAN), PathBuf::from("."));
        walk_to_swot(&mut app);
        app.dispatch(Event::GeneratePdp);
        app.dispatch(Event::RequestReset);
        app.dispatch(Event::Confirm);

        for _ in 0..200 {
            if app.drain() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(app.wizard.current_step, Step::Profile);
        assert!(app.wizard.session.pdp_result.is_none());
        let saved = app.store().load_session().unwrap();
        assert!(saved.pdp_result.is_none());
        assert_eq!(saved.completed_steps, vec![Step::Profile]);
    }

    #[test]
    fn test_survey_submission_writes_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app_with(MockProvider::replying(PLAN), dir.path().to_path_buf());
        walk_to_swot(&mut app);
        app.dispatch_inline(Event::GeneratePdp);
        app.dispatch_inline(Event::Next);
        app.dispatch_inline(Event::SubmitSurvey(SurveyData::default()));

        assert!(dir.path().join("Hospitour_PDP_Sam_Okafor.doc").exists());
        assert!(app.wizard.notice.is_some());
    }

    #[test]
    fn test_confirmed_reset_clears_store() {
        let mut app = app_with(MockProvider::replying(PLAN), PathBuf::from("."));
        walk_to_swot(&mut app);
        app.dispatch_inline(Event::RequestReset);
        app.dispatch_inline(Event::Confirm);

        let saved = app.store().load_session().unwrap();
        assert_eq!(saved.profile.name, "");
        assert_eq!(saved.completed_steps, vec![Step::Profile]);
    }
}
