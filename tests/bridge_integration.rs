// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests driving the bridge against the in-memory network.

use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use wiz_bridge::batch::{run_batch, toggle_intent};
use wiz_bridge::mock::{MockCall, MockDevice, MockNetwork};
use wiz_bridge::{
    Bridge, BridgeConfig, Brightness, Error, LightCommand, Operation, PilotState, PowerState,
    RgbColor, SceneId,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ip(last: u8) -> IpAddr {
    IpAddr::from([192, 168, 1, last])
}

fn config() -> BridgeConfig {
    BridgeConfig::new()
        .with_wait_time(Duration::from_millis(10))
        .with_command_timeout(Duration::from_secs(2))
        .with_shutdown_timeout(Duration::from_secs(2))
}

fn start(network: &MockNetwork) -> Bridge<MockNetwork> {
    init_logging();
    Bridge::start(network.clone(), config()).unwrap()
}

fn addresses(lights: &[wiz_bridge::DeviceSnapshot]) -> Vec<IpAddr> {
    lights.iter().map(wiz_bridge::DeviceSnapshot::address).collect()
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[test]
    fn snapshots_sorted_regardless_of_reply_order() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(30)))
            .with_device(MockDevice::new(ip(10)))
            .with_device(MockDevice::new(ip(20)));
        let bridge = start(&network);

        let lights = bridge.discover().unwrap();

        assert_eq!(addresses(&lights), vec![ip(10), ip(20), ip(30)]);
        bridge.shutdown();
    }

    #[test]
    fn unreachable_light_is_dropped_and_closed() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_device(MockDevice::new(ip(2)))
            .with_device(MockDevice::new(ip(3)));
        let bridge = start(&network);

        let lights = bridge.discover().unwrap();
        assert_eq!(addresses(&lights), vec![ip(1), ip(2), ip(3)]);

        network.remove(ip(2));
        let lights = bridge.discover().unwrap();

        assert_eq!(addresses(&lights), vec![ip(1), ip(3)]);
        assert_eq!(network.closed_addresses(), vec![ip(2)]);
        assert_eq!(bridge.registered_addresses().unwrap(), vec![ip(1), ip(3)]);
        bridge.shutdown();
    }

    #[test]
    fn repeated_discovery_reuses_handles() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)).with_identity("a8bb50000001"))
            .with_device(MockDevice::new(ip(2)));
        let bridge = start(&network);

        let first = bridge.discover().unwrap();
        let second = bridge.discover().unwrap();

        assert_eq!(first, second);
        assert_eq!(network.connect_count(), 2);
        assert!(network.closed_addresses().is_empty());
        bridge.shutdown();
    }

    #[test]
    fn identity_survives_conflicting_reports() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)).with_identity("a8bb50000001"));
        let bridge = start(&network);
        bridge.discover().unwrap();

        network.add(
            MockDevice::new(ip(1))
                .with_identity("a8bb5000beef")
                .with_reported_identity("a8bb5000beef"),
        );
        let lights = bridge.discover().unwrap();

        assert_eq!(lights[0].label(), "a8bb50000001");
        bridge.shutdown();
    }

    #[test]
    fn failing_query_still_lists_light() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)).with_query_error())
            .with_device(MockDevice::new(ip(2)));
        let bridge = start(&network);

        let lights = bridge.discover().unwrap();

        assert_eq!(lights.len(), 2);
        assert_eq!(lights[0].last_error(), Some("no reply after 1000 ms"));
        assert_eq!(lights[0].power(), None);
        assert_eq!(lights[1].last_error(), None);
        assert_eq!(lights[1].power(), Some(PowerState::Off));
        bridge.shutdown();
    }

    #[test]
    fn sweep_failure_is_reported() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        network.set_discovery_error(Some("broadcast not permitted"));
        let bridge = start(&network);

        let err = bridge.discover().unwrap_err();
        assert!(matches!(err, Error::Discovery(_)));
        assert!(bridge.registered_addresses().unwrap().is_empty());
        bridge.shutdown();
    }

    #[test]
    fn slow_sweep_times_out() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_discovery_delay(Duration::from_millis(400));
        init_logging();
        let bridge = Bridge::start(
            network.clone(),
            config()
                .with_wait_time(Duration::ZERO)
                .with_discovery_grace(Duration::from_millis(50))
                .with_min_discovery_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = bridge.discover().unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                operation: Operation::Discover,
                ..
            }
        ));

        // The sweep finishes in the background and still populates the registry
        thread::sleep(Duration::from_millis(600));
        assert_eq!(bridge.registered_addresses().unwrap(), vec![ip(1)]);
        bridge.shutdown();
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[test]
    fn set_power_reports_device_state() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();

        let update = bridge.set_power(ip(1), true).unwrap();
        assert!(update.apply(&mut lights[0]));
        assert!(lights[0].is_on());

        let update = bridge.set_power(ip(1), false).unwrap();
        update.apply(&mut lights[0]);
        assert_eq!(lights[0].power(), Some(PowerState::Off));
        assert_eq!(
            network.calls()[1..],
            [
                MockCall::TurnOn(ip(1), None),
                MockCall::Query(ip(1)),
                MockCall::TurnOff(ip(1)),
                MockCall::Query(ip(1)),
            ]
        );
        bridge.shutdown();
    }

    #[test]
    fn power_without_readback_uses_intent() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)).with_silent_query());
        let bridge = start(&network);
        bridge.discover().unwrap();

        let update = bridge.set_power(ip(1), true).unwrap();

        assert_eq!(update.power(), Some(PowerState::On));
        assert!(update.is_success());
        bridge.shutdown();
    }

    #[test]
    fn brightness_color_and_preset() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        let bridge = start(&network);
        bridge.discover().unwrap();

        let update = bridge.set_brightness(ip(1), Brightness::new(200).unwrap()).unwrap();
        assert_eq!(update.brightness(), Some(Brightness::from(200)));
        assert_eq!(update.power(), Some(PowerState::On));

        let update = bridge.set_color(ip(1), RgbColor::new(255, 64, 0)).unwrap();
        assert_eq!(update.color(), Some(RgbColor::new(255, 64, 0)));

        let scene = SceneId::new(6).unwrap();
        let update = bridge.set_preset(ip(1), scene).unwrap();
        assert_eq!(update.scene(), Some(scene));

        assert!(network
            .calls()
            .contains(&MockCall::TurnOn(ip(1), Some(LightCommand::scene(scene)))));
        bridge.shutdown();
    }

    #[test]
    fn color_after_preset_clears_scene() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();

        let scene = SceneId::new(5).unwrap();
        bridge.set_preset(ip(1), scene).unwrap().apply(&mut lights[0]);
        assert_eq!(lights[0].scene(), Some(scene));

        let update = bridge.set_color(ip(1), RgbColor::new(255, 0, 0)).unwrap();
        assert!(update.clears_scene());
        update.apply(&mut lights[0]);

        assert_eq!(lights[0].scene(), None);
        assert_eq!(lights[0].color(), Some(RgbColor::new(255, 0, 0)));
        bridge.shutdown();
    }

    #[test]
    fn out_of_range_brightness_rejected_before_bridge() {
        assert!(Brightness::new(400).is_err());
    }

    #[test]
    fn rejected_command_is_error_only() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)).rejecting_commands());
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();
        let before = lights[0].clone();

        let update = bridge.set_color(ip(1), RgbColor::new(1, 2, 3)).unwrap();
        update.apply(&mut lights[0]);

        assert_eq!(lights[0].last_error(), Some("command rejected: mock light refused"));
        assert_eq!(lights[0].power(), before.power());
        assert_eq!(lights[0].brightness(), before.brightness());

        // A later success clears the error
        bridge.refresh(ip(1)).unwrap().apply(&mut lights[0]);
        assert_eq!(lights[0].last_error(), None);
        bridge.shutdown();
    }

    #[test]
    fn refresh_learns_identity() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();
        assert_eq!(lights[0].identity(), None);

        network.add(
            MockDevice::new(ip(1))
                .with_pilot(PilotState::new().with_state(true))
                .with_reported_identity("A8BB50000001"),
        );
        bridge.refresh(ip(1)).unwrap().apply(&mut lights[0]);

        assert_eq!(lights[0].label(), "a8bb50000001");
        assert!(lights[0].is_on());
        bridge.shutdown();
    }
}

// ============================================================================
// Timeouts
// ============================================================================

mod timeouts {
    use super::*;

    #[test]
    fn slow_command_times_out_without_corrupting_registry() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_device(MockDevice::new(ip(2)));
        init_logging();
        let bridge = Bridge::start(
            network.clone(),
            config().with_command_timeout(Duration::from_millis(100)),
        )
        .unwrap();
        bridge.discover().unwrap();

        network.add(MockDevice::new(ip(1)).with_delay(Duration::from_millis(300)));
        let err = bridge.set_power(ip(1), true).unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                operation: Operation::SetPower,
                ..
            }
        ));

        // Other lights keep working while the slow command is in flight
        let update = bridge.set_power(ip(2), true).unwrap();
        assert!(update.is_success());

        // The late command still lands on the device
        thread::sleep(Duration::from_millis(800));
        assert_eq!(network.pilot(ip(1)).unwrap().state, Some(true));

        assert_eq!(bridge.registered_addresses().unwrap(), vec![ip(1), ip(2)]);
        let lights = bridge.discover().unwrap();
        assert_eq!(addresses(&lights), vec![ip(1), ip(2)]);
        assert_eq!(network.connect_count(), 2);
        bridge.shutdown();
    }

    #[test]
    fn panicking_work_is_abandoned() {
        let bridge = start(&MockNetwork::new());

        let err = bridge
            .call_and_wait(Operation::Task, Duration::from_secs(2), |_| async {
                if true {
                    panic!("unit of work failed");
                }
            })
            .unwrap_err();
        assert!(matches!(err, Error::Abandoned(Operation::Task)));

        // The worker loop survives
        assert!(bridge.registered_addresses().unwrap().is_empty());
        bridge.shutdown();
    }
}

// ============================================================================
// Batches
// ============================================================================

mod batches {
    use super::*;

    #[test]
    fn batch_over_bridge_counts_failures() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_device(MockDevice::new(ip(2)).rejecting_commands())
            .with_device(MockDevice::new(ip(3)))
            .with_device(MockDevice::new(ip(4)).with_identity("a8bb50000004"));
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();

        network.remove(ip(4));
        let turn_on = toggle_intent(&lights);
        assert!(turn_on);

        let outcome = run_batch(&mut lights, |light| bridge.set_power(light.address(), turn_on));

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.total(), 4);
        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(failed, vec!["192.168.1.2", "a8bb50000004"]);
        assert_eq!(
            outcome.failures[1].message,
            "device at 192.168.1.4 is unreachable"
        );
        assert!(lights[0].is_on());
        assert!(lights[2].is_on());
        assert!(!lights[1].is_on());
        bridge.shutdown();
    }

    #[test]
    fn batch_after_shutdown_fails_every_target() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_device(MockDevice::new(ip(2)));
        let bridge = start(&network);
        let mut lights = bridge.discover().unwrap();
        bridge.shutdown();

        let outcome = run_batch(&mut lights, |light| bridge.refresh(light.address()));

        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome
            .failures
            .iter()
            .all(|f| f.message == "bridge has been shut down"));
        assert!(lights.iter().all(|light| light.last_error().is_none()));
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn shutdown_closes_handles_once() {
        let network = MockNetwork::new()
            .with_device(MockDevice::new(ip(1)))
            .with_device(MockDevice::new(ip(2)).with_close_error());
        let bridge = start(&network);
        bridge.discover().unwrap();

        let report = bridge.shutdown();
        assert_eq!(report.handles_closed, 1);
        assert_eq!(report.close_failures, 1);
        assert!(report.worker_joined);

        let again = bridge.shutdown();
        assert_eq!(again.handles_closed, 0);
        assert_eq!(network.closed_addresses(), vec![ip(1), ip(2)]);
    }

    #[test]
    fn sweep_finishing_during_shutdown_opens_nothing() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        init_logging();
        let bridge = Bridge::start(
            network.clone(),
            config()
                .with_min_discovery_timeout(Duration::from_millis(100))
                .with_discovery_grace(Duration::ZERO),
        )
        .unwrap();
        bridge.discover().unwrap();

        // The next sweep outlives its budget and ends while ip(1) is closing
        network.add(MockDevice::new(ip(1)).with_delay(Duration::from_millis(600)));
        network.add(MockDevice::new(ip(2)));
        network.set_discovery_delay(Duration::from_millis(400));
        assert!(matches!(
            bridge.discover(),
            Err(Error::Timeout {
                operation: Operation::Discover,
                ..
            })
        ));

        let report = bridge.shutdown();

        assert_eq!(report.handles_closed, 1);
        assert!(report.worker_joined);
        assert_eq!(network.connect_count(), 1);
        assert_eq!(network.closed_addresses(), vec![ip(1)]);
    }

    #[test]
    fn calls_after_shutdown_fail_fast() {
        let bridge = start(&MockNetwork::new());
        bridge.shutdown();

        assert!(matches!(bridge.discover(), Err(Error::ShutDown)));
        assert!(matches!(bridge.refresh(ip(1)), Err(Error::ShutDown)));
        assert!(matches!(
            bridge.submit(Operation::Task, |_| async {}),
            Err(Error::ShutDown)
        ));
    }

    #[test]
    fn blocked_worker_is_detached() {
        let network = MockNetwork::new().with_device(MockDevice::new(ip(1)));
        init_logging();
        let bridge = Bridge::start(
            network.clone(),
            config().with_shutdown_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        bridge.discover().unwrap();

        // Block the worker thread past both shutdown phases
        let _busy = bridge
            .submit(Operation::Task, |_| async {
                thread::sleep(Duration::from_millis(300));
            })
            .unwrap();

        let report = bridge.shutdown();

        assert!(bridge.is_shut_down());
        assert_eq!(report.handles_closed, 0);
        assert!(!report.worker_joined);
    }
}
