use crate::compare::{select_comparison_set, ComparisonSet, ValueView};
use crate::config::Config;
use crate::data::Dataset;
use crate::error::ScoringError;
use crate::map::{center_points, locality_markers, municipality_layer, regimes};
use crate::model::{Indicator, Metric, Regime, ScoredMunicipality};
use crate::scoring::Thresholds;
use crate::search::{filter_by_minimum_thresholds, rank};
use crate::tui::theme::ThemeColors;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Comparator,
    Map,
    Centers,
    Search,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Home, Tab::Comparator, Tab::Map, Tab::Centers, Tab::Search];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Comparator => "Comparator",
            Tab::Map => "Map",
            Tab::Centers => "Centers",
            Tab::Search => "Search",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Help,
}

pub struct App {
    pub dataset: Arc<Dataset>,
    pub config: Config,
    pub theme: ThemeColors,
    pub tab: Tab,
    pub table_state: ratatui::widgets::TableState,
    pub input_mode: InputMode,
    /// Name filter of the comparator list.
    pub filter: String,
    /// Names picked for comparison, in the order they were added.
    pub compared: Vec<String>,
    pub value_view: ValueView,
    pub metric: Metric,
    pub regime_index: usize,
    pub center_detail: bool,
    pub thresholds: Thresholds,
    pub threshold_focus: Indicator,
    pub flash_message: Option<(String, Instant)>,
    pub last_refresh: Instant,
    pub last_interaction: Instant,
    pub needs_refresh: bool,
    pub force_refresh: bool,
    pub is_loading: bool,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(dataset: Arc<Dataset>, config: Config, theme: ThemeColors) -> Self {
        let mut table_state = ratatui::widgets::TableState::default();
        if !dataset.municipalities.is_empty() {
            table_state.select(Some(0));
        }
        let thresholds = config.search;

        Self {
            dataset,
            config,
            theme,
            tab: Tab::Home,
            table_state,
            input_mode: InputMode::Normal,
            filter: String::new(),
            compared: Vec::new(),
            value_view: ValueView::Raw,
            metric: Metric::OpportunityIndex,
            regime_index: 0,
            center_detail: false,
            thresholds,
            threshold_focus: Indicator::Education,
            flash_message: None,
            last_refresh: Instant::now(),
            last_interaction: Instant::now(),
            needs_refresh: false,
            force_refresh: false,
            is_loading: false,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Every municipality, best opportunity index first.
    pub fn ranked(&self) -> Vec<&ScoredMunicipality> {
        let mut rows: Vec<&ScoredMunicipality> =
            self.dataset.municipalities.rows().iter().collect();
        rank(&mut rows);
        rows
    }

    /// Municipalities matching the comparator filter, alphabetically.
    pub fn comparator_rows(&self) -> Vec<&ScoredMunicipality> {
        let needle = self.filter.to_lowercase();
        let mut rows: Vec<&ScoredMunicipality> = self
            .dataset
            .municipalities
            .rows()
            .iter()
            .filter(|row| needle.is_empty() || row.name().to_lowercase().contains(&needle))
            .collect();
        rows.sort_by(|a, b| a.name().cmp(b.name()));
        rows
    }

    pub fn search_results(&self) -> Result<Vec<&ScoredMunicipality>, ScoringError> {
        filter_by_minimum_thresholds(self.dataset.municipalities.rows(), &self.thresholds)
    }

    pub fn comparison(&self) -> Result<ComparisonSet<'_>, ScoringError> {
        select_comparison_set(
            &self.dataset.municipalities,
            &self.compared,
            &self.config.comparison.options(),
        )
    }

    pub fn regimes(&self) -> Vec<Regime> {
        regimes(&self.dataset.centers)
    }

    pub fn current_regime(&self) -> Option<Regime> {
        let regimes = self.regimes();
        if regimes.is_empty() {
            return None;
        }
        regimes.get(self.regime_index % regimes.len()).cloned()
    }

    /// Number of rows in the table shown on the current tab.
    pub fn visible_len(&self) -> usize {
        match self.tab {
            Tab::Home => self.dataset.municipalities.len(),
            Tab::Comparator => self.comparator_rows().len(),
            Tab::Map => municipality_layer(&self.dataset.municipalities, self.metric).points.len(),
            Tab::Centers => match self.current_regime() {
                Some(regime) if self.center_detail => {
                    center_points(&self.dataset.centers, &regime).len()
                }
                Some(regime) => {
                    locality_markers(&self.dataset.centers, &regime, &self.config.legend).len()
                }
                None => 0,
            },
            Tab::Search => self.search_results().map(|r| r.len()).unwrap_or(0),
        }
    }

    pub fn next_row(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Select the first row, or nothing when the table is empty.
    fn reset_selection(&mut self) {
        if self.visible_len() == 0 {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    /// Keep the selection inside the table after its contents changed.
    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.table_state.select(None);
        } else if let Some(selected) = self.table_state.selected() {
            if selected >= len {
                self.table_state.select(Some(len - 1));
            }
        } else {
            self.table_state.select(Some(0));
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.reset_selection();
        }
    }

    pub fn next_tab(&mut self) {
        let next = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
        self.select_tab(next);
    }

    pub fn previous_tab(&mut self) {
        let len = Tab::ALL.len();
        let prev = Tab::ALL[(self.tab.index() + len - 1) % len];
        self.select_tab(prev);
    }

    /// Add or remove the highlighted comparator row from the comparison.
    pub fn toggle_compared(&mut self) {
        let name = match self
            .table_state
            .selected()
            .and_then(|i| self.comparator_rows().get(i).map(|row| row.name().to_string()))
        {
            Some(name) => name,
            None => return,
        };

        if let Some(pos) = self.compared.iter().position(|n| *n == name) {
            self.compared.remove(pos);
            self.show_flash(format!("Removed: {}", name));
            return;
        }

        let mut candidate = self.compared.clone();
        candidate.push(name.clone());
        let result = select_comparison_set(
            &self.dataset.municipalities,
            &candidate,
            &self.config.comparison.options(),
        );
        match result {
            Ok(_) => {
                self.compared = candidate;
                self.show_flash(format!("Added: {}", name));
            }
            Err(e) => self.show_flash(format!("Error: {}", e)),
        }
    }

    pub fn clear_compared(&mut self) {
        self.compared.clear();
        self.show_flash("Comparison cleared".to_string());
    }

    pub fn toggle_value_view(&mut self) {
        self.value_view = self.value_view.toggle();
    }

    pub fn cycle_metric(&mut self) {
        self.metric = self.metric.next();
        self.clamp_selection();
    }

    pub fn cycle_regime(&mut self) {
        let count = self.regimes().len();
        if count > 0 {
            self.regime_index = (self.regime_index + 1) % count;
        }
        self.reset_selection();
    }

    pub fn toggle_center_detail(&mut self) {
        self.center_detail = !self.center_detail;
        self.reset_selection();
    }

    pub fn focus_threshold(&mut self, indicator: Indicator) {
        self.threshold_focus = indicator;
    }

    /// Step size of the focused threshold.
    fn threshold_step(&self) -> f64 {
        match self.threshold_focus {
            Indicator::Education | Indicator::Housing => 0.5,
            Indicator::Employment => 10.0,
        }
    }

    /// Raise (`steps > 0`) or lower the focused threshold, never below zero.
    pub fn adjust_threshold(&mut self, steps: f64) {
        let current = self.thresholds.get(self.threshold_focus).unwrap_or(0.0);
        let value = (current + steps * self.threshold_step()).max(0.0);
        self.thresholds.set(self.threshold_focus, Some(value));
        self.clamp_selection();
    }

    pub fn clear_threshold(&mut self) {
        self.thresholds.set(self.threshold_focus, None);
        self.clamp_selection();
    }

    pub fn start_filter(&mut self) {
        if self.tab == Tab::Comparator {
            self.input_mode = InputMode::Filter;
        }
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.reset_selection();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.reset_selection();
    }

    pub fn confirm_filter(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn cancel_filter(&mut self) {
        self.filter.clear();
        self.input_mode = InputMode::Normal;
        self.reset_selection();
    }

    /// Show help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Dismiss help overlay
    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    /// Swap in a freshly loaded dataset.
    ///
    /// Compared names missing from the new data are dropped.
    pub fn update_dataset(&mut self, dataset: Arc<Dataset>) {
        self.dataset = dataset;
        let table = &self.dataset.municipalities;
        self.compared.retain(|name| table.get(name).is_some());
        self.clamp_selection();
        self.last_refresh = Instant::now();

        self.show_flash(format!(
            "Reloaded ({} municipalities, {} centers)",
            self.dataset.municipalities.len(),
            self.dataset.centers.len()
        ));
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EducationalCenterRecord, MunicipalityRecord};
    use crate::scoring::{MunicipalityTable, Weights};
    use chrono::Local;

    fn record(
        name: &str,
        population: u64,
        schools: u64,
        housing: u64,
        companies: u64,
    ) -> MunicipalityRecord {
        MunicipalityRecord {
            name: name.to_string(),
            population_total: population,
            school_count_total: schools,
            housing_offer_total: housing,
            company_count_total: companies,
            latitude: Some(39.0),
            longitude: Some(-0.5),
        }
    }

    fn center(name: &str, locality: &str, regime: Regime) -> EducationalCenterRecord {
        EducationalCenterRecord {
            name: name.to_string(),
            locality: locality.to_string(),
            regime,
            latitude: Some(38.7),
            longitude: Some(-0.47),
            kind: None,
        }
    }

    fn dataset(records: Vec<MunicipalityRecord>) -> Arc<Dataset> {
        Arc::new(Dataset {
            municipalities: MunicipalityTable::build(records, &Weights::default()).unwrap(),
            centers: vec![
                center("CEIP Sant Jordi", "Alcoi", Regime::Public),
                center("Col·legi Sant Roc", "Alcoi", Regime::SubsidizedPrivate),
            ],
            loaded_at: Local::now(),
            skipped_rows: 0,
        })
    }

    fn app() -> App {
        let data = dataset(vec![
            record("Elx", 235_000, 160, 1_500, 19_000),
            record("Alzira", 44_000, 30, 120, 2_900),
            record("Bocairent", 500, 2, 10, 50),
            record("Castelló", 170_000, 110, 900, 14_000),
        ]);
        App::new(data, Config::default(), ThemeColors::dark())
    }

    fn select_comparator_row(app: &mut App, name: &str) {
        let pos = app.comparator_rows().iter().position(|r| r.name() == name).unwrap();
        app.table_state.select(Some(pos));
    }

    #[test]
    fn test_ranked_puts_best_first() {
        let app = app();
        assert_eq!(app.ranked()[0].name(), "Bocairent");
    }

    #[test]
    fn test_tab_cycle_wraps() {
        let mut app = app();
        app.previous_tab();
        assert_eq!(app.tab, Tab::Search);
        app.next_tab();
        assert_eq!(app.tab, Tab::Home);
    }

    #[test]
    fn test_next_row_wraps() {
        let mut app = app();
        for _ in 0..4 {
            app.next_row();
        }
        assert_eq!(app.table_state.selected(), Some(0));
        app.previous_row();
        assert_eq!(app.table_state.selected(), Some(3));
    }

    #[test]
    fn test_comparator_filter_is_case_insensitive() {
        let mut app = app();
        app.select_tab(Tab::Comparator);
        app.start_filter();
        assert_eq!(app.input_mode, InputMode::Filter);
        for c in "ALZ".chars() {
            app.push_filter_char(c);
        }
        let names: Vec<&str> = app.comparator_rows().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Alzira"]);
        app.cancel_filter();
        assert_eq!(app.comparator_rows().len(), 4);
    }

    #[test]
    fn test_fourth_comparison_is_refused() {
        let mut app = app();
        app.select_tab(Tab::Comparator);
        for name in ["Alzira", "Bocairent", "Castelló", "Elx"] {
            select_comparator_row(&mut app, name);
            app.toggle_compared();
        }
        assert_eq!(app.compared, vec!["Alzira", "Bocairent", "Castelló"]);
        let (msg, _) = app.flash_message.clone().unwrap();
        assert!(msg.starts_with("Error: too many municipalities selected"));

        // Toggling again removes.
        select_comparator_row(&mut app, "Bocairent");
        app.toggle_compared();
        assert_eq!(app.compared, vec!["Alzira", "Castelló"]);
    }

    #[test]
    fn test_adjust_threshold_never_negative() {
        let mut app = app();
        app.focus_threshold(Indicator::Housing);
        app.adjust_threshold(-5.0);
        assert_eq!(app.thresholds.housing_per_1000, Some(0.0));
        app.adjust_threshold(2.0);
        assert_eq!(app.thresholds.housing_per_1000, Some(1.0));
        app.clear_threshold();
        assert_eq!(app.thresholds.housing_per_1000, None);
    }

    #[test]
    fn test_search_uses_configured_defaults() {
        let app = app();
        // Defaults: schools >= 1, housing >= 1, companies >= 100.
        let names: Vec<&str> = app.search_results().unwrap().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Bocairent"]);
    }

    #[test]
    fn test_update_dataset_drops_missing_compared() {
        let mut app = app();
        app.compared = vec!["Alzira".to_string(), "Elx".to_string()];
        app.update_dataset(dataset(vec![record("Alzira", 44_000, 30, 120, 2_900)]));
        assert_eq!(app.compared, vec!["Alzira"]);
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn test_cycle_regime_wraps() {
        let mut app = app();
        assert_eq!(app.current_regime(), Some(Regime::Public));
        app.cycle_regime();
        assert_eq!(app.current_regime(), Some(Regime::SubsidizedPrivate));
        app.cycle_regime();
        assert_eq!(app.current_regime(), Some(Regime::Public));
    }
}
