//! Stepping the integration driver against scripted models.

mod common;

use common::{settings, MockFmu};
use float_cmp::assert_approx_eq;
use fmivis::{
    driver::{DriverState, IntegrationDriver},
    settings::StatusPolicy,
    Error, FmiError, Status,
};
use rstest::rstest;

fn initialized(fmu: MockFmu, start: f64, stop: f64, h: f64) -> IntegrationDriver<MockFmu> {
    let mut driver = IntegrationDriver::new();
    driver.load(fmu, settings(start, stop, h));
    driver.initialize().unwrap();
    driver
}

#[test_log::test]
fn test_fixed_steps_without_events() {
    let mut driver = initialized(MockFmu::pendulum(), 0.0, 100.0, 0.001);
    assert_eq!(driver.state(), DriverState::Initialized);

    let mut t = 0.0;
    for _ in 0..1000 {
        t = driver.simulate_step(t).unwrap();
    }
    assert_approx_eq!(f64, t, 1.0, epsilon = 1e-9);
    assert_eq!(driver.state(), DriverState::Stepping);

    let data = driver.fmu_data();
    assert_eq!(data.n_states, 2);
    assert_eq!(data.n_event_indicators, 0);
    assert_eq!(data.status, Status::OK);
    assert_approx_eq!(f64, data.states[0], 1.0, epsilon = 1e-9);
    assert_eq!(data.derivatives[0], 1.0);

    let stats = driver.stats();
    assert_eq!(stats.num_steps, 1000);
    assert_eq!(stats.num_time_events + stats.num_state_events, 0);
    assert_eq!(driver.fmu().unwrap().count("event_update"), 0);
}

#[test_log::test]
fn test_time_event_clamps_step() {
    let fmu = MockFmu {
        states: vec![0.0],
        time_events: vec![0.5],
        ..MockFmu::new("timer")
    };
    let mut driver = initialized(fmu, 0.45, 1.0, 0.1);
    assert_eq!(driver.event_info().next_event_time, Some(0.5));

    let t = driver.simulate_step(0.45).unwrap();
    assert_eq!(t, 0.5);
    assert_eq!(driver.fmu().unwrap().count("event_update"), 0);
    let calls_before = driver.fmu().unwrap().calls.len();

    let t = driver.simulate_step(t).unwrap();
    assert_approx_eq!(f64, t, 0.6, ulps = 2);

    let names = driver.fmu().unwrap().call_names();
    let calls = &names[calls_before..];
    let event = calls.iter().position(|c| *c == "event_update").unwrap();
    let derivatives = calls.iter().position(|c| *c == "get_derivatives").unwrap();
    assert!(event < derivatives);
    assert_eq!(calls[event + 1], "get_continuous_states");

    assert_eq!(driver.stats().num_time_events, 1);
    assert_eq!(driver.event_info().next_event_time, None);
}

#[test_log::test]
fn test_state_event_refreshes_indicators() {
    let fmu = MockFmu {
        event_indicators: Box::new(|_, x| vec![x[0] - 2.55]),
        ..MockFmu::crossing()
    };
    let mut driver = initialized(fmu, 0.0, 5.0, 0.1);
    assert_eq!(&*driver.buffers().event_indicators_prev, &[-2.55]);

    let mut t = 0.0;
    while t < 5.0 {
        t = driver.simulate_step(t).unwrap();
        let buffers = driver.buffers();
        assert_eq!(buffers.event_indicators, buffers.event_indicators_prev);
    }
    assert_eq!(t, 5.0);
    assert_eq!(driver.stats().num_state_events, 1);
    assert_eq!(driver.fmu().unwrap().count("event_update"), 1);
}

#[test_log::test]
fn test_step_event_requests_event_update() {
    let fmu = MockFmu {
        step_event: true,
        ..MockFmu::pendulum()
    };
    let mut driver = initialized(fmu, 0.0, 1.0, 0.1);

    let t = driver.simulate_step(0.0).unwrap();
    assert!(driver.settings().call_event_update);
    assert_eq!(driver.fmu().unwrap().count("event_update"), 0);

    driver.simulate_step(t).unwrap();
    assert_eq!(driver.fmu().unwrap().count("event_update"), 1);
    assert_eq!(driver.stats().num_step_events, 1);
}

#[rstest]
#[case(0.0, 1.0, 0.3)]
#[case(0.0, 1.0, 0.01)]
#[case(0.2, 0.25, 0.1)]
#[case(-1.0, 2.0, 0.7)]
fn test_time_is_monotonic_and_bounded(#[case] start: f64, #[case] stop: f64, #[case] h: f64) {
    let mut driver = initialized(MockFmu::pendulum(), start, stop, h);
    let mut t = start;
    for _ in 0..1000 {
        let next = driver.simulate_step(t).unwrap();
        assert!(next >= t);
        assert!(next <= stop);
        if next == t {
            break;
        }
        t = next;
    }
    assert_eq!(t, stop);
    // Further steps do not move past the end
    assert_eq!(driver.simulate_step(t).unwrap(), stop);
}

#[test]
fn test_lands_exactly_on_end() {
    let mut driver = initialized(MockFmu::pendulum(), 0.0, 1.0, 0.1);
    let eps = 1e-3;
    assert_eq!(driver.simulate_step(1.0 - eps).unwrap(), 1.0);
}

#[test_log::test]
fn test_tolerant_policy_keeps_stepping() {
    let fmu = MockFmu {
        derivatives_status: Status::Error,
        ..MockFmu::pendulum()
    };
    let mut driver = initialized(fmu, 0.0, 1.0, 0.1);

    let t = driver.simulate_step(0.0).unwrap();
    let t = driver.simulate_step(t).unwrap();
    assert_approx_eq!(f64, t, 0.2, ulps = 2);

    let stats = driver.stats();
    assert_eq!(stats.num_soft_errors, 2);
    assert_eq!(stats.last_error, Some(FmiError::Error));
}

#[test_log::test]
fn test_strict_policy_propagates() {
    let fmu = MockFmu {
        derivatives_status: Status::Discard,
        ..MockFmu::pendulum()
    };
    let mut driver = IntegrationDriver::new();
    let mut settings = settings(0.0, 1.0, 0.1);
    settings.status_policy = StatusPolicy::Strict;
    driver.load(fmu, settings);
    driver.initialize().unwrap();

    let err = driver.simulate_step(0.0).unwrap_err();
    assert!(
        matches!(
            err,
            Error::Fmi {
                call: "get derivatives",
                source: FmiError::Discard
            }
        ),
        "{err:?}"
    );
    assert_eq!(driver.fmu_data().status, Status::Discard);
}

#[test_log::test]
fn test_terminate_request() {
    let fmu = MockFmu {
        terminate_at: Some(0.25),
        ..MockFmu::pendulum()
    };
    let mut driver = initialized(fmu, 0.0, 1.0, 0.1);

    let mut t = 0.0;
    while driver.state() != DriverState::Terminated {
        t = driver.simulate_step(t).unwrap();
        assert!(t < 1.0);
    }
    assert_eq!(driver.fmu().unwrap().count("terminate"), 1);

    let steps = driver.stats().num_steps;
    assert_eq!(driver.simulate_step(t).unwrap(), t);
    assert_eq!(driver.stats().num_steps, steps);
    assert!(driver.terminate().is_ok());
    assert_eq!(driver.fmu().unwrap().count("terminate"), 1);
}

#[test]
fn test_terminate_during_initialization() {
    let fmu = MockFmu {
        terminate_at: Some(0.0),
        ..MockFmu::pendulum()
    };
    let mut driver = initialized(fmu, 0.0, 1.0, 0.1);
    assert_eq!(driver.state(), DriverState::Terminated);
    assert_eq!(driver.simulate_step(0.0).unwrap(), 0.0);
}

#[test]
fn test_step_before_initialize() {
    let mut driver = IntegrationDriver::new();
    driver.load(MockFmu::pendulum(), settings(0.0, 1.0, 0.1));
    assert_eq!(driver.state(), DriverState::Loaded);
    assert!(matches!(
        driver.simulate_step(0.0),
        Err(Error::InvalidState {
            state: DriverState::Loaded,
            ..
        })
    ));
}

#[test]
fn test_initialize_twice() {
    let mut driver = initialized(MockFmu::pendulum(), 0.0, 1.0, 0.1);
    assert!(matches!(
        driver.initialize(),
        Err(Error::InvalidState {
            operation: "initialize",
            state: DriverState::Initialized
        })
    ));
    assert_eq!(driver.fmu().unwrap().count("initialize"), 1);
}

#[test]
fn test_unload() {
    let mut driver = initialized(MockFmu::pendulum(), 0.0, 1.0, 0.1);
    driver.unload();
    assert_eq!(driver.state(), DriverState::Unloaded);
    assert!(driver.fmu().is_none());
    assert_eq!(driver.fmu_data().n_states, 0);
}

#[test]
fn test_reload_resets_driver() {
    let mut driver = initialized(MockFmu::pendulum(), 0.0, 1.0, 0.1);
    driver.simulate_step(0.0).unwrap();

    driver.load(MockFmu::crossing(), settings(0.0, 2.0, 0.5));
    assert_eq!(driver.state(), DriverState::Loaded);
    assert_eq!(driver.stats().num_steps, 0);
    assert_eq!(driver.fmu().unwrap().name, "crossing");
    assert!(!driver.fmu().unwrap().instantiated);

    driver.initialize().unwrap();
    assert_eq!(driver.fmu_data().n_event_indicators, 1);
}
