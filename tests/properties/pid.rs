//! Property tests for the PID controller and action mapping.

use proptest::prelude::*;

use thermowatch::{ControlAction, Pid};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: With a purely proportional controller, the output sign
    /// follows the error sign.
    #[test]
    fn property_proportional_sign_follows_error(
        kp in 0.1f64..10.0,
        setpoint in 30.0f64..40.0,
        measured in 30.0f64..40.0,
        timestamp in any::<u32>(),
    ) {
        let mut pid = Pid::new(kp, 0.0, 0.0);
        let output = pid.update(setpoint, measured, u64::from(timestamp));
        if measured < setpoint {
            prop_assert!(output > 0.0);
        } else if measured > setpoint {
            prop_assert!(output < 0.0);
        } else {
            prop_assert_eq!(output, 0.0);
        }
    }

    /// PROPERTY: The controller never panics on arbitrary timestamp
    /// sequences, including stalled and backwards clocks.
    #[test]
    fn property_update_handles_arbitrary_timestamps(
        timestamps in proptest::collection::vec(any::<u64>(), 1..16),
        measured in 30.0f64..40.0,
    ) {
        let mut pid = Pid::new(1.0, 0.5, 0.2);
        for ts in timestamps {
            let output = pid.update(37.0, measured, ts);
            prop_assert!(output.is_finite());
        }
    }

    /// PROPERTY: Heating drive is never negative, and the fan only runs
    /// when the reading exceeds the setpoint by more than the margin.
    #[test]
    fn property_action_mapping(
        output in -100.0f64..100.0,
        measured in 30.0f64..40.0,
        setpoint in 30.0f64..40.0,
        margin in 0.0f64..2.0,
    ) {
        let action = ControlAction::from_output(output, measured, setpoint, margin);
        prop_assert!(action.heating >= 0.0);
        prop_assert_eq!(action.cooling, measured > setpoint + margin);
        if output > 0.0 {
            prop_assert_eq!(action.heating, output);
        } else {
            prop_assert_eq!(action.heating, 0.0);
        }
    }
}
