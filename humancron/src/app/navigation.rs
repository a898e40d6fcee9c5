//! Selection and filtering in the workflow selector

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::sync::Arc;

use humancron_sdk::Workflow;

use super::*;

impl App {
    /// Indices into the loaded workflows that match the filter, best match first
    pub fn visible_workflows(&self) -> Vec<usize> {
        let workflows = self.session.workflows();
        if self.filter.is_empty() {
            return (0..workflows.len()).collect();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, usize)> = workflows
            .iter()
            .enumerate()
            .filter_map(|(i, workflow)| {
                let by_name = matcher.fuzzy_match(&workflow.name, &self.filter);
                let by_description = matcher.fuzzy_match(&workflow.description, &self.filter);
                by_name.max(by_description).map(|score| (score, i))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, i)| i).collect()
    }

    pub fn selected_workflow(&self) -> Option<&Arc<Workflow>> {
        let index = *self.visible_workflows().get(self.selected)?;
        self.session.workflows().get(index)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible_workflows().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn start_filtering(&mut self) {
        self.is_filtering = true;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.selected = 0;
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.selected = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.is_filtering = false;
        self.selected = 0;
    }

    /// Keep the selection inside the visible list
    pub fn clamp_selection(&mut self) {
        let len = self.visible_workflows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
