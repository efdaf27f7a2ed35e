/// Event information reported by the FMU after initialization and every event update.
///
/// FMI 1.0 `fmiEventInfo` and FMI 2.0 `fmi2EventInfo` are both folded into this record.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct EventInfo {
    /// The event iteration has not converged yet (FMI 1.0 `!iterationConverged`, FMI 2.0
    /// `newDiscreteStatesNeeded`).
    pub discrete_states_need_update: bool,
    /// The FMU requests to stop the simulation.
    pub terminate_simulation: bool,
    /// At least one continuous state was re-initialized by the event.
    pub values_of_continuous_states_changed: bool,
    /// The nominal values of the states have changed (FMI 2.0 only).
    pub nominals_of_continuous_states_changed: bool,
    /// The value references of the states have changed (FMI 1.0 only).
    pub state_value_references_changed: bool,
    /// Absolute time of the next time event, if the model declares one.
    pub next_event_time: Option<f64>,
}

impl EventInfo {
    /// Reset all flags to their default state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn upcoming_time_event(&self) -> bool {
        self.next_event_time.is_some()
    }

    #[cfg(feature = "fmi1")]
    pub(crate) fn update_from_fmi1(&mut self, info: &fmivis_sys::fmi1::fmiEventInfo) {
        self.discrete_states_need_update = info.iterationConverged == 0;
        self.terminate_simulation = info.terminateSimulation != 0;
        self.values_of_continuous_states_changed = info.stateValuesChanged != 0;
        self.nominals_of_continuous_states_changed = false;
        self.state_value_references_changed = info.stateValueReferencesChanged != 0;
        self.next_event_time = (info.upcomingTimeEvent != 0).then_some(info.nextEventTime);
    }

    #[cfg(feature = "fmi2")]
    pub(crate) fn update_from_fmi2(&mut self, info: &fmivis_sys::fmi2::fmi2EventInfo) {
        self.discrete_states_need_update = info.newDiscreteStatesNeeded != 0;
        self.terminate_simulation = info.terminateSimulation != 0;
        self.values_of_continuous_states_changed = info.valuesOfContinuousStatesChanged != 0;
        self.nominals_of_continuous_states_changed = info.nominalsOfContinuousStatesChanged != 0;
        self.state_value_references_changed = false;
        self.next_event_time = (info.nextEventTimeDefined != 0).then_some(info.nextEventTime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "fmi1")]
    #[test]
    fn test_fmi1_event_info() {
        let raw = fmivis_sys::fmi1::fmiEventInfo {
            iterationConverged: 1,
            upcomingTimeEvent: 1,
            nextEventTime: 0.5,
            ..Default::default()
        };
        let mut info = EventInfo::default();
        info.update_from_fmi1(&raw);
        assert!(!info.discrete_states_need_update);
        assert_eq!(info.next_event_time, Some(0.5));

        info.update_from_fmi1(&fmivis_sys::fmi1::fmiEventInfo::default());
        assert!(info.discrete_states_need_update);
        assert!(!info.upcoming_time_event());
    }

    #[cfg(feature = "fmi2")]
    #[test]
    fn test_fmi2_event_info() {
        let raw = fmivis_sys::fmi2::fmi2EventInfo {
            terminateSimulation: 1,
            nextEventTimeDefined: 0,
            nextEventTime: 3.0,
            ..Default::default()
        };
        let mut info = EventInfo::default();
        info.update_from_fmi2(&raw);
        assert!(info.terminate_simulation);
        assert_eq!(info.next_event_time, None);
    }
}
