use crate::{
    config::Config,
    engine::{Evaluator, PracticeDatabase},
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Evaluator,
    pub practice: PracticeDatabase,
    pub config: Config,
}

impl AppState {
    pub fn new(practice: PracticeDatabase, config: Config) -> Self {
        Self {
            evaluator: Evaluator::new(config.execution_limits()),
            practice,
            config,
        }
    }
}

impl FromRef<AppState> for Evaluator {
    fn from_ref(state: &AppState) -> Self {
        state.evaluator.clone()
    }
}

impl FromRef<AppState> for PracticeDatabase {
    fn from_ref(state: &AppState) -> Self {
        state.practice.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
