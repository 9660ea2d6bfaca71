//! Process-wide registry of named integer constants.
//!
//! The registry is built lazily on first access and never changes
//! afterwards, so it can be shared freely between threads.

use crate::config::flags::{
    EMULATE_BLMVM, NLCG_DAI_YUAN, NLCG_DEFAULT, NLCG_FLETCHER, NLCG_FLETCHER_REEVES,
    NLCG_HAGER_ZHANG, NLCG_HESTENES_STIEFEL, NLCG_LIU_STOREY, NLCG_PERRY_SHANNO,
    NLCG_POLAK_RIBIERE_POLYAK, NLCG_POWELL, NLCG_SHANNO_PHUA,
};
use crate::optimization::task::Task;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Immutable table of named constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constants {
    values: BTreeMap<&'static str, i64>,
}

impl Constants {
    fn build() -> Self {
        let entries: [(&'static str, i64); 17] = [
            ("TASK_ERROR", i64::from(Task::Error.code())),
            (
                "TASK_COMPUTE_FG",
                i64::from(Task::ComputeObjectiveAndGradient.code()),
            ),
            ("TASK_NEW_X", i64::from(Task::NewPoint.code())),
            ("TASK_FINAL_X", i64::from(Task::FinalPoint.code())),
            ("TASK_WARNING", i64::from(Task::Warning.code())),
            ("NLCG_FLETCHER_REEVES", i64::from(NLCG_FLETCHER_REEVES)),
            ("NLCG_HESTENES_STIEFEL", i64::from(NLCG_HESTENES_STIEFEL)),
            ("NLCG_POLAK_RIBIERE_POLYAK", i64::from(NLCG_POLAK_RIBIERE_POLYAK)),
            ("NLCG_FLETCHER", i64::from(NLCG_FLETCHER)),
            ("NLCG_LIU_STOREY", i64::from(NLCG_LIU_STOREY)),
            ("NLCG_DAI_YUAN", i64::from(NLCG_DAI_YUAN)),
            ("NLCG_PERRY_SHANNO", i64::from(NLCG_PERRY_SHANNO)),
            ("NLCG_HAGER_ZHANG", i64::from(NLCG_HAGER_ZHANG)),
            ("NLCG_POWELL", i64::from(NLCG_POWELL)),
            ("NLCG_SHANNO_PHUA", i64::from(NLCG_SHANNO_PHUA)),
            ("NLCG_DEFAULT", i64::from(NLCG_DEFAULT)),
            ("EMULATE_BLMVM", i64::from(EMULATE_BLMVM)),
        ];
        Self {
            values: entries.into_iter().collect(),
        }
    }

    /// Value of the constant `name`.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// All constants, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.values.iter().map(|(&name, &value)| (name, value))
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

static CONSTANTS: Lazy<Constants> = Lazy::new(Constants::build);

/// Global constants registry.
pub fn constants() -> &'static Constants {
    &CONSTANTS
}
