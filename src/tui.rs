use anyhow::Result;
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::Duration;

use crate::app::App;
use crate::models::{
    AnswerKind, DigitalDimension, GoalField, GoalType, JiscLevel, ProfileField, SoftSkill, Step, SurveyData,
    SwotQuadrant, SURVEY_QUESTIONS,
};
use crate::insights::humanize;
use crate::wizard::{Confirmation, Event};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const TICK: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, PartialEq)]
enum EditTarget {
    Profile(ProfileField),
    Swot(SwotQuadrant),
    Goal { id: String, field: GoalField },
    Survey(usize),
}

struct Editor {
    target: EditTarget,
    buffer: String,
    multiline: bool,
}

struct UiState {
    cursor: usize,
    scroll: u16,
    seen_scroll_reset: u64,
    editing: Option<Editor>,
    survey: SurveyData,
    tick: usize,
}

impl UiState {
    fn new() -> Self {
        Self {
            cursor: 0,
            scroll: 0,
            seen_scroll_reset: 0,
            editing: None,
            survey: SurveyData::default(),
            tick: 0,
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }

    fn move_cursor(&mut self, delta: isize, rows: usize) {
        if rows == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, rows as isize - 1) as usize;
    }

    fn is_editing(&self, target: &EditTarget) -> bool {
        self.editing.as_ref().is_some_and(|e| e.target == *target)
    }
}

pub fn run_wizard(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    let mut ui = UiState::new();

    loop {
        app.drain();
        if ui.seen_scroll_reset != app.wizard.scroll_reset {
            ui.seen_scroll_reset = app.wizard.scroll_reset;
            ui.cursor = 0;
            ui.scroll = 0;
            ui.editing = None;
        }
        // Rows can disappear underneath the cursor (accepted suggestion, deleted goal).
        let rows = row_count(app);
        if ui.cursor >= rows {
            ui.cursor = rows.saturating_sub(1);
        }

        terminal.draw(|frame| draw(frame, app, &mut ui))?;

        if event::poll(TICK)? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(app, &mut ui, key) {
                    break;
                }
            }
        }
        ui.tick = ui.tick.wrapping_add(1);
    }
    Ok(())
}

fn row_count(app: &App) -> usize {
    let w = &app.wizard;
    match w.current_step {
        Step::Profile => ProfileField::ALL.len(),
        Step::Digital => DigitalDimension::ALL.len(),
        Step::SoftSkills => SoftSkill::ALL.len() + w.session.soft_skills.custom.len(),
        Step::Swot => SwotQuadrant::ALL.len() + w.suggestions.len(),
        Step::Results => w.goals().len() * GoalField::ALL.len(),
        Step::Survey => SURVEY_QUESTIONS.len(),
    }
}

// --- Input ---

/// Returns true when the user asked to quit.
fn handle_key(app: &mut App, ui: &mut UiState, key: KeyEvent) -> bool {
    if ui.editing.is_some() {
        handle_edit_key(app, ui, key);
        return false;
    }

    if app.wizard.pending_confirmation.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.dispatch(Event::Confirm),
            KeyCode::Char('n') | KeyCode::Esc => app.dispatch(Event::Cancel),
            _ => {}
        }
        return false;
    }

    let rows = row_count(app);
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => app.dispatch(Event::DismissMessage),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => ui.move_cursor(1, rows),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => ui.move_cursor(-1, rows),
        KeyCode::PageDown | KeyCode::Char('J') => ui.move_cursor(GoalField::ALL.len() as isize, rows),
        KeyCode::PageUp | KeyCode::Char('K') => ui.move_cursor(-(GoalField::ALL.len() as isize), rows),
        KeyCode::Char('n') => app.dispatch(Event::Next),
        KeyCode::Char('b') => app.dispatch(Event::Back),
        KeyCode::Char('R') => app.dispatch(Event::RequestReset),
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.dispatch(Event::JumpTo(Step::ALL[index]));
        }
        _ => handle_step_key(app, ui, key),
    }
    false
}

fn handle_edit_key(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    let Some(editor) = ui.editing.as_mut() else { return };
    match key.code {
        KeyCode::Esc => ui.editing = None,
        KeyCode::Enter if editor.multiline && key.modifiers.contains(KeyModifiers::ALT) => editor.buffer.push('\n'),
        KeyCode::Enter => {
            if let Some(editor) = ui.editing.take() {
                commit(app, ui, editor);
            }
        }
        KeyCode::Backspace => {
            editor.buffer.pop();
        }
        KeyCode::Char(c) => editor.buffer.push(c),
        _ => {}
    }
}

fn commit(app: &mut App, ui: &mut UiState, editor: Editor) {
    let value = if editor.multiline {
        editor.buffer.trim_end().to_string()
    } else {
        editor.buffer.trim().to_string()
    };
    match editor.target {
        EditTarget::Profile(field) => app.dispatch(Event::SetProfile(field, value)),
        EditTarget::Swot(quadrant) => app.dispatch(Event::SetSwot(quadrant, value)),
        EditTarget::Goal { id, field } => app.dispatch(Event::UpdateGoal { id, field, value }),
        EditTarget::Survey(index) => {
            if let Err(e) = ui.survey.set_answer(index, &value) {
                app.wizard.error = Some(e.to_string());
            }
        }
    }
}

fn start_edit(ui: &mut UiState, target: EditTarget, current: &str, multiline: bool) {
    ui.editing = Some(Editor {
        target,
        buffer: current.to_string(),
        multiline,
    });
}

fn cycle<'a>(options: &[&'a str], current: &str, forward: bool) -> &'a str {
    let pos = options.iter().position(|o| *o == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % options.len()
    } else {
        (pos + options.len() - 1) % options.len()
    };
    options[next]
}

fn handle_step_key(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    let left = matches!(key.code, KeyCode::Left | KeyCode::Char('h'));
    let right = matches!(key.code, KeyCode::Right | KeyCode::Char('l'));
    let enter = key.code == KeyCode::Enter;

    match app.wizard.current_step {
        Step::Profile => {
            let field = ProfileField::ALL[ui.cursor.min(ProfileField::ALL.len() - 1)];
            let current = app.wizard.session.profile.get(field).to_string();
            match field.choices() {
                Some(choices) if left || right || enter => {
                    let value = cycle(choices, &current, !left);
                    app.dispatch(Event::SetProfile(field, value.to_string()));
                }
                None if enter => start_edit(ui, EditTarget::Profile(field), &current, false),
                _ => {}
            }
        }
        Step::Digital => {
            let dim = DigitalDimension::ALL[ui.cursor.min(DigitalDimension::ALL.len() - 1)];
            let level = app.wizard.session.digital_audit.get(dim);
            if left {
                app.dispatch(Event::SetDigital(dim, level.lower()));
            } else if right {
                app.dispatch(Event::SetDigital(dim, level.raise()));
            }
        }
        Step::SoftSkills => {
            let delta = if left { -1 } else if right { 1 } else { return };
            if let Some(skill) = SoftSkill::ALL.get(ui.cursor) {
                let score = app.wizard.session.soft_skills.get(*skill) as i64;
                app.dispatch(Event::SetSoftSkill(*skill, score + delta));
            } else if let Some(custom) = app.wizard.session.soft_skills.custom.get(ui.cursor - SoftSkill::ALL.len()) {
                let event = Event::SetCustomSkillScore {
                    id: custom.id.clone(),
                    score: custom.score as i64 + delta,
                };
                app.dispatch(event);
            }
        }
        Step::Swot => {
            let quadrants = SwotQuadrant::ALL.len();
            match key.code {
                KeyCode::Char('g') => app.dispatch(Event::RequestSwotSuggestions),
                KeyCode::Char('a') if ui.cursor >= quadrants => app.dispatch(Event::AcceptSuggestion(ui.cursor - quadrants)),
                KeyCode::Char('x') if ui.cursor >= quadrants => app.dispatch(Event::RejectSuggestion(ui.cursor - quadrants)),
                KeyCode::Enter if ui.cursor < quadrants => {
                    let quadrant = SwotQuadrant::ALL[ui.cursor];
                    let current = app.wizard.session.swot.get(quadrant).to_string();
                    start_edit(ui, EditTarget::Swot(quadrant), &current, true);
                }
                _ => {}
            }
        }
        Step::Results => {
            if key.code == KeyCode::Char('+') {
                app.dispatch(Event::AddGoal);
                return;
            }
            if key.code == KeyCode::Char('v') {
                app.dispatch(Event::RequestPlanReview);
                return;
            }
            let fields = GoalField::ALL.len();
            let Some(goal) = app.wizard.goals().get(ui.cursor / fields).cloned() else { return };
            let field = GoalField::ALL[ui.cursor % fields];
            match key.code {
                KeyCode::Char('c') => app.dispatch(Event::ToggleGoalComplete(goal.id)),
                KeyCode::Char('d') => app.dispatch(Event::RequestDeleteGoal(goal.id)),
                KeyCode::Char('e') => app.dispatch(Event::RequestGoalEvaluation(goal.id)),
                _ if field == GoalField::Type && (left || right || enter) => {
                    let names: Vec<&str> = GoalType::ALL.iter().map(|t| t.as_str()).collect();
                    let value = cycle(&names, goal.goal_type.as_str(), !left);
                    app.dispatch(Event::UpdateGoal { id: goal.id, field, value: value.to_string() });
                }
                KeyCode::Enter => {
                    let current = goal.get(field).to_string();
                    start_edit(ui, EditTarget::Goal { id: goal.id, field }, &current, false);
                }
                _ => {}
            }
        }
        Step::Survey => {
            if key.code == KeyCode::Char('s') {
                app.dispatch(Event::SubmitSurvey(ui.survey.clone()));
                return;
            }
            let index = ui.cursor.min(SURVEY_QUESTIONS.len() - 1);
            let current = ui.survey.answer(index);
            match SURVEY_QUESTIONS[index].kind {
                AnswerKind::Rating if left || right => {
                    let n: i64 = current.parse().unwrap_or(3);
                    let n = (n + if left { -1 } else { 1 }).clamp(1, 5);
                    let _ = ui.survey.set_answer(index, &n.to_string());
                }
                AnswerKind::YesNo if left || right || enter => {
                    let flipped = if current == "Yes" { "No" } else { "Yes" };
                    let _ = ui.survey.set_answer(index, flipped);
                }
                AnswerKind::Text if enter => start_edit(ui, EditTarget::Survey(index), &current, false),
                _ => {}
            }
        }
    }
}

// --- Rendering ---

/// Lines of the step form plus the line the cursor sits on.
#[derive(Default)]
struct Form {
    lines: Vec<Line<'static>>,
    cursor_line: usize,
    width: usize,
}

impl Form {
    fn new(width: usize) -> Self {
        Self { width: width.max(20), ..Default::default() }
    }

    fn heading(&mut self, text: impl Into<String>) {
        self.lines.push(Line::from(Span::styled(
            text.into(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    fn hint(&mut self, text: impl Into<String>) {
        self.lines.push(Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray))));
    }

    fn blank(&mut self) {
        self.lines.push(Line::from(""));
    }

    fn row(&mut self, selected: bool, mut spans: Vec<Span<'static>>) {
        if selected {
            self.cursor_line = self.lines.len();
            spans.insert(0, Span::raw("> "));
            for span in spans.iter_mut() {
                span.style = span.style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
        } else {
            spans.insert(0, Span::raw("  "));
        }
        self.lines.push(Line::from(spans));
    }

    /// A labelled text value, wrapped under its label.
    fn text_field(&mut self, selected: bool, label: &str, value: &str, editing: Option<&str>) {
        self.row(selected, vec![Span::raw(label.to_string())]);
        let (text, style) = match editing {
            Some(buffer) => (format!("{}_", buffer), Style::default().fg(Color::Yellow)),
            None if value.is_empty() => ("(empty)".to_string(), Style::default().fg(Color::DarkGray)),
            None => (value.to_string(), Style::default()),
        };
        for paragraph in text.split('\n') {
            for line in textwrap::wrap(paragraph, self.width.saturating_sub(4)) {
                self.lines.push(Line::from(Span::styled(format!("    {}", line), style)));
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &App, ui: &mut UiState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Step indicator
    let indicator = Paragraph::new(step_indicator(app))
        .block(Block::default().borders(Borders::ALL).title(" Hospitour PDP "));
    frame.render_widget(indicator, outer[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(outer[1]);

    // Form
    let width = body[0].width.saturating_sub(2) as usize;
    let form = build_form(app, ui, width);
    let visible = body[0].height.saturating_sub(2) as usize;
    let cursor_line = form.cursor_line as u16;
    if cursor_line < ui.scroll {
        ui.scroll = cursor_line;
    } else if visible > 0 && form.cursor_line >= ui.scroll as usize + visible {
        ui.scroll = (form.cursor_line + 1 - visible) as u16;
    }
    let form_widget = Paragraph::new(Text::from(form.lines))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", app.wizard.current_step.label())))
        .wrap(Wrap { trim: false })
        .scroll((ui.scroll, 0));
    frame.render_widget(form_widget, body[0]);

    // Insights
    let side = Paragraph::new(build_insights(app))
        .block(Block::default().borders(Borders::ALL).title(" Insights "))
        .wrap(Wrap { trim: false });
    frame.render_widget(side, body[1]);

    frame.render_widget(Paragraph::new(status_line(app, ui)), outer[2]);

    let help = Paragraph::new(help_text(app, ui)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, outer[3]);
}

fn step_indicator(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, step) in Step::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *step == app.wizard.current_step {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else if app.wizard.session.completed_steps.contains(step) {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, step.label()), style));
    }
    Line::from(spans)
}

fn build_form(app: &App, ui: &UiState, width: usize) -> Form {
    let w = &app.wizard;
    let mut form = Form::new(width);

    match w.current_step {
        Step::Profile => {
            form.heading("Who are you?");
            form.hint("Tell us about your personality and ambitions.");
            form.blank();
            for (i, field) in ProfileField::ALL.iter().enumerate() {
                let value = w.session.profile.get(*field);
                if field.choices().is_some() {
                    form.row(
                        ui.cursor == i,
                        vec![
                            Span::raw(format!("{:<22}", field.label())),
                            Span::styled(format!("< {} >", value), Style::default().fg(Color::Cyan)),
                        ],
                    );
                } else {
                    let target = EditTarget::Profile(*field);
                    let editing = ui.editing.as_ref().filter(|e| e.target == target).map(|e| e.buffer.as_str());
                    form.text_field(ui.cursor == i, field.label(), value, editing);
                }
            }
        }
        Step::Digital => {
            form.heading("JISC Digital Capabilities");
            form.hint("Rate yourself on each of the six JISC dimensions.");
            form.blank();
            for (i, dim) in DigitalDimension::ALL.iter().enumerate() {
                let current = w.session.digital_audit.get(*dim);
                let mut spans = vec![Span::raw(format!("{:<24}", dim.label()))];
                for level in JiscLevel::ALL {
                    if level == current {
                        spans.push(Span::styled(
                            format!("[{}] ", level),
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ));
                    } else {
                        spans.push(Span::styled(format!(" {}  ", level), Style::default().fg(Color::DarkGray)));
                    }
                }
                form.row(ui.cursor == i, spans);
                form.hint(format!("    {}", dim.description()));
            }
        }
        Step::SoftSkills => {
            form.heading("Soft Skills Audit");
            form.hint("Score each skill from 1 (novice) to 5 (expert).");
            form.blank();
            for (i, skill) in SoftSkill::ALL.iter().enumerate() {
                let score = w.session.soft_skills.get(*skill);
                form.row(
                    ui.cursor == i,
                    vec![Span::raw(format!("{:<20}", humanize(skill.field_name()))), score_span(score)],
                );
                form.hint(format!("    {}", skill.description()));
            }
            form.blank();
            form.heading(format!("Skills for {}", w.session.profile.career_goal));
            if w.loading_skills {
                form.hint(format!("  {} Finding the skills your career goal needs...", ui.spinner()));
            } else if w.session.soft_skills.custom.is_empty() {
                form.hint("  No career-specific skills yet.");
            }
            for (j, custom) in w.session.soft_skills.custom.iter().enumerate() {
                let category = custom.category.map(|c| c.as_str()).unwrap_or("Skill");
                form.row(
                    ui.cursor == SoftSkill::ALL.len() + j,
                    vec![
                        Span::raw(format!("{:<20}", custom.label)),
                        score_span(custom.score),
                        Span::styled(format!("  {}", category), Style::default().fg(Color::Magenta)),
                    ],
                );
                if !custom.desc.is_empty() {
                    form.hint(format!("    {}", custom.desc));
                }
            }
        }
        Step::Swot => {
            form.heading("Strategic SWOT Analysis");
            form.hint("One point per line. Alt+Enter adds a new line while editing.");
            form.blank();
            for (i, quadrant) in SwotQuadrant::ALL.iter().enumerate() {
                let target = EditTarget::Swot(*quadrant);
                let editing = ui.editing.as_ref().filter(|e| e.target == target).map(|e| e.buffer.as_str());
                form.text_field(ui.cursor == i, quadrant.label(), w.session.swot.get(*quadrant), editing);
            }
            form.blank();
            form.heading("AI Suggestions");
            if w.loading_suggestions {
                form.hint(format!("  {} Asking the consultant...", ui.spinner()));
            } else if w.suggestions.is_empty() {
                form.hint("  Press g for suggestions based on your audits.");
            }
            for (j, suggestion) in w.suggestions.iter().enumerate() {
                form.row(
                    ui.cursor == SwotQuadrant::ALL.len() + j,
                    vec![
                        Span::styled(format!("[{}] ", suggestion.category.label()), Style::default().fg(Color::Cyan)),
                        Span::raw(suggestion.text.clone()),
                    ],
                );
            }
            if w.generating {
                form.blank();
                form.hint(format!("  {} Generating your development plan...", ui.spinner()));
            }
        }
        Step::Results => build_results(&mut form, app, ui),
        Step::Survey => {
            form.heading("Feedback Survey");
            form.hint("Your answers are included in the exported report.");
            form.blank();
            for (i, question) in SURVEY_QUESTIONS.iter().enumerate() {
                let answer = ui.survey.answer(i);
                let label = format!("Q{}. {}", i + 1, question.prompt);
                match question.kind {
                    AnswerKind::Rating => form.row(
                        ui.cursor == i,
                        vec![Span::raw(format!("{}  ", label)), Span::styled(format!("< {}/5 >", answer), Style::default().fg(Color::Cyan))],
                    ),
                    AnswerKind::YesNo => form.row(
                        ui.cursor == i,
                        vec![Span::raw(format!("{}  ", label)), Span::styled(format!("< {} >", answer), Style::default().fg(Color::Cyan))],
                    ),
                    AnswerKind::Text => {
                        let editing = ui.editing.as_ref().filter(|e| e.target == EditTarget::Survey(i)).map(|e| e.buffer.as_str());
                        form.text_field(ui.cursor == i, &label, &answer, editing);
                    }
                }
            }
            if w.exporting {
                form.blank();
                form.hint(format!("  {} Writing report...", ui.spinner()));
            }
        }
    }
    form
}

fn build_results(form: &mut Form, app: &App, ui: &UiState) {
    let w = &app.wizard;
    let Some(pdp) = &w.session.pdp_result else {
        form.hint("No plan yet. Complete the SWOT step and press n to generate one.");
        return;
    };

    form.heading("My Career Vision");
    for line in textwrap::wrap(&pdp.introduction, form.width) {
        form.lines.push(Line::from(Span::styled(
            line.into_owned(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    form.blank();

    let (done, total, pct) = pdp.progress();
    let filled = (pct / 5.0).round() as usize;
    form.lines.push(Line::from(vec![
        Span::raw("Progress "),
        Span::styled("#".repeat(filled), Style::default().fg(Color::Green)),
        Span::styled("-".repeat(20 - filled.min(20)), Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {}/{} ({:.0}%)", done, total, pct)),
    ]));
    form.blank();

    let fields = GoalField::ALL.len();
    for (g, goal) in pdp.goals.iter().enumerate() {
        let check = if goal.is_completed() { "[x]" } else { "[ ]" };
        form.lines.push(Line::from(vec![
            Span::styled(format!("{} ", check), Style::default().fg(Color::Green)),
            Span::styled(format!("{}. {}", g + 1, goal.skill), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  ({})", goal.goal_type.as_str()), Style::default().fg(Color::Magenta)),
        ]));
        for (f, field) in GoalField::ALL.iter().enumerate() {
            let target = EditTarget::Goal { id: goal.id.clone(), field: *field };
            let selected = ui.cursor == g * fields + f;
            if ui.is_editing(&target) {
                let buffer = ui.editing.as_ref().map(|e| e.buffer.as_str());
                form.text_field(selected, field.label(), goal.get(*field), buffer);
            } else {
                let value = goal.get(*field);
                let shown = if value.is_empty() { "(empty)".to_string() } else { truncate(value, form.width.saturating_sub(24)) };
                form.row(selected, vec![Span::raw(format!("  {:<18}", field.label())), Span::raw(shown)]);
            }
        }
        if w.evaluating.contains(&goal.id) {
            form.hint(format!("    {} Checking against SMART criteria...", ui.spinner()));
        } else if let Some(feedback) = &goal.feedback {
            let verdict = if feedback.is_smart { "SMART" } else { "Not yet SMART" };
            let color = if feedback.score >= 70 { Color::Green } else { Color::Yellow };
            form.lines.push(Line::from(Span::styled(
                format!("    AI Coach: {}/100, {}", feedback.score, verdict),
                Style::default().fg(color),
            )));
            for text in [&feedback.critique, &feedback.suggestions] {
                for line in textwrap::wrap(text, form.width.saturating_sub(6)) {
                    form.hint(format!("      {}", line));
                }
            }
        }
        form.blank();
    }

    form.heading("Coach's Review");
    if w.analysing {
        form.hint(format!("  {} Reviewing your objectives...", ui.spinner()));
    } else if let Some(review) = &w.plan_review {
        for line in textwrap::wrap(review, form.width) {
            form.lines.push(Line::from(line.into_owned()));
        }
    } else {
        form.hint("  Press v for feedback on the whole plan.");
    }
}

fn score_span(score: u8) -> Span<'static> {
    let filled = score.min(5) as usize;
    let color = match score {
        4..=5 => Color::Green,
        3 => Color::Yellow,
        _ => Color::Red,
    };
    Span::styled(
        format!("{}{} {}/5", "*".repeat(filled), ".".repeat(5 - filled), score),
        Style::default().fg(color),
    )
}

fn build_insights(app: &App) -> Text<'static> {
    let insights = app.wizard.insights();
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled("Strengths", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))));
    for s in insights.strengths {
        lines.push(Line::from(format!("  + {}", s)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Focus Areas", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))));
    if insights.focus_areas.is_empty() {
        lines.push(Line::from(Span::styled("  (none yet)", Style::default().fg(Color::DarkGray))));
    }
    for s in insights.focus_areas {
        lines.push(Line::from(format!("  - {}", s)));
    }
    lines.push(Line::from(""));

    let model = app.gateway().model_name().unwrap_or("not configured");
    lines.push(Line::from(Span::styled(format!("AI: {}", model), Style::default().fg(Color::DarkGray))));

    Text::from(lines)
}

fn status_line(app: &App, ui: &UiState) -> Line<'static> {
    let w = &app.wizard;
    if let Some(confirmation) = &w.pending_confirmation {
        let question = match confirmation {
            Confirmation::Reset => "Reset all progress? This cannot be undone. (y/n)",
            Confirmation::DeleteGoal(_) => "Delete this objective? (y/n)",
        };
        return Line::from(Span::styled(
            question,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(error) = &w.error {
        return Line::from(Span::styled(format!(" {}", error), Style::default().fg(Color::Red)));
    }
    if let Some(notice) = &w.notice {
        return Line::from(Span::styled(format!(" {}", notice), Style::default().fg(Color::Green)));
    }
    if app.busy() {
        return Line::from(format!(" {} Working...", ui.spinner()));
    }
    Line::from("")
}

fn help_text(app: &App, ui: &UiState) -> String {
    if let Some(editor) = &ui.editing {
        return if editor.multiline {
            " Enter:save  Alt+Enter:new line  Esc:cancel".to_string()
        } else {
            " Enter:save  Esc:cancel".to_string()
        };
    }
    let step = match app.wizard.current_step {
        Step::Profile => "Enter:edit  </>:choose  n:next",
        Step::Digital => "</>:level  n:next",
        Step::SoftSkills => "</>:score  n:next",
        Step::Swot => "Enter:edit  g:suggest  a/x:accept/reject  n:generate plan",
        Step::Results => "Enter:edit  c:complete  e:evaluate  +:add  d:delete  v:review  n:finish",
        Step::Survey => "</>:answer  Enter:edit  s:submit & export",
    };
    format!(" j/k:move  {}  b:back  1-6:jump  R:reset  q:quit", step)
}

fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() > max.max(4) || first_line.len() < s.len() {
        let head: String = first_line.chars().take(max.max(4).saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        first_line.to_string()
    }
}
