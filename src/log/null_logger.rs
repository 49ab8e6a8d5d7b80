//! Backend used when the `logging` feature is off. Messages are discarded, but the level filter
//! is still applied so disabled `log` macros cost nothing.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
